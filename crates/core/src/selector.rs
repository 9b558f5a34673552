//! Shipping method selection for a package.
//!
//! Each product may restrict the method instances it ships with. The union of
//! the restrictions of every product in the package decides which candidate
//! rates survive. If the restriction would leave no rate at all, the candidate
//! rates are returned unfiltered so checkout is never blocked.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metadata::ProductShippingMetadata;
use crate::types::{CandidateRate, CartLine, MethodInstanceId};

/// How a rate list was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFilterOutcome {
    /// No product in the package restricts methods.
    Unrestricted,
    /// Rates were narrowed to the allowed methods.
    Restricted,
    /// The restriction matched no rate; the candidate list was kept as is.
    FallbackUnfiltered,
}

/// Rates to show, and how they were chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSelection {
    pub rates: Vec<CandidateRate>,
    pub outcome: RateFilterOutcome,
}

/// Union of the allowed methods of every product in the package.
///
/// Lines whose product has no restriction contribute nothing. Blank IDs are
/// dropped.
pub fn allowed_method_set<M>(cart_lines: &[CartLine], metadata: &M) -> HashSet<MethodInstanceId>
where
    M: ProductShippingMetadata + ?Sized,
{
    cart_lines
        .iter()
        .flat_map(|line| metadata.allowed_method_ids(line.product_id))
        .filter(|id| !id.is_blank())
        .collect()
}

/// Filter candidate rates by the methods the package's products allow.
///
/// Kept rates stay in their original order. See [`evaluate_rates`] for the
/// outcome as well.
#[must_use]
pub fn filter_rates<M>(
    cart_lines: &[CartLine],
    candidate_rates: Vec<CandidateRate>,
    metadata: &M,
) -> Vec<CandidateRate>
where
    M: ProductShippingMetadata + ?Sized,
{
    evaluate_rates(cart_lines, candidate_rates, metadata).rates
}

/// Filter candidate rates and report which branch decided the result.
#[must_use]
pub fn evaluate_rates<M>(
    cart_lines: &[CartLine],
    mut candidate_rates: Vec<CandidateRate>,
    metadata: &M,
) -> RateSelection
where
    M: ProductShippingMetadata + ?Sized,
{
    let allowed = allowed_method_set(cart_lines, metadata);
    if allowed.is_empty() {
        return RateSelection {
            rates: candidate_rates,
            outcome: RateFilterOutcome::Unrestricted,
        };
    }

    let is_allowed = |rate: &CandidateRate| allowed.contains(rate.instance_id());

    if !candidate_rates.iter().any(is_allowed) {
        warn!(
            allowed = allowed.len(),
            candidates = candidate_rates.len(),
            "no candidate rate matches the product restrictions, keeping all rates"
        );
        return RateSelection {
            rates: candidate_rates,
            outcome: RateFilterOutcome::FallbackUnfiltered,
        };
    }

    let before = candidate_rates.len();
    candidate_rates.retain(is_allowed);
    debug!(
        allowed = allowed.len(),
        kept = candidate_rates.len(),
        dropped = before - candidate_rates.len(),
        "filtered package rates"
    );

    RateSelection {
        rates: candidate_rates,
        outcome: RateFilterOutcome::Restricted,
    }
}
