//! Offline evaluation of a shipping scenario.
//!
//! # Usage
//!
//! ```bash
//! psm-cli evaluate scenarios/pickup.yaml
//! ```
//!
//! # Scenario Format
//!
//! ```yaml
//! products:
//!   10:
//!     allowed_methods: ["local_pickup:1"]
//!     pickup_addresses:
//!       "local_pickup:1": 123 Main St
//! cart:
//!   - product_id: 10
//! rates:
//!   - { rate_key: "flat_rate:2", instance_id: "flat_rate:2", cost: "5.00" }
//!   - { rate_key: "local_pickup:1", instance_id: "local_pickup:1" }
//! order:            # optional, defaults to the cart's products
//!   - product_id: 10
//! email: customer_completed_order   # optional
//! plain_text: true                  # optional
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use product_shipping_core::{
    CandidateRate, CartLine, EmailFormat, EmailKind, InMemoryMetadata, OrderLineItem,
    RateFilterOutcome, evaluate_rates, pickup_block_for_email, resolve_pickup_addresses,
};

/// Errors that can occur while evaluating a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("Failed to read scenario: {0}")]
    Read(#[from] std::io::Error),

    /// The scenario is not valid YAML or has the wrong shape.
    #[error("Invalid scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The report could not be encoded.
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// The email block failed to render.
    #[error("Failed to render email block: {0}")]
    Render(String),
}

/// A cart, its candidate rates, and the product metadata to apply.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub products: InMemoryMetadata,
    #[serde(default)]
    pub cart: Vec<CartLine>,
    #[serde(default)]
    pub rates: Vec<CandidateRate>,
    #[serde(default)]
    pub order: Option<Vec<OrderLineItem>>,
    #[serde(default)]
    pub email: Option<EmailKind>,
    #[serde(default)]
    pub plain_text: bool,
}

/// What the rules decide for a scenario.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub outcome: RateFilterOutcome,
    pub rates: Vec<CandidateRate>,
    pub pickup_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_block: Option<String>,
}

impl Scenario {
    /// Parse a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Parse` if the YAML is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Run the rate filter and the pickup address resolver.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Render` if the email block fails to render.
    pub fn evaluate(self) -> Result<ScenarioReport, ScenarioError> {
        let selection = evaluate_rates(&self.cart, self.rates, &self.products);

        let order = self.order.unwrap_or_else(|| {
            self.cart
                .iter()
                .map(|line| OrderLineItem::from(line.product_id))
                .collect()
        });
        let pickup_addresses = resolve_pickup_addresses(&order, &self.products);

        let email_block = match &self.email {
            Some(kind) => pickup_block_for_email(
                kind,
                EmailFormat::from_plain_text(self.plain_text),
                pickup_addresses.clone(),
            )
            .map_err(|e| ScenarioError::Render(e.to_string()))?,
            None => None,
        };

        Ok(ScenarioReport {
            outcome: selection.outcome,
            rates: selection.rates,
            pickup_addresses,
            email_block,
        })
    }
}

/// Evaluate a scenario file and print the report as JSON.
///
/// # Errors
///
/// Returns `ScenarioError` if the file cannot be read, parsed, or evaluated.
pub fn run(path: &Path) -> Result<(), ScenarioError> {
    let yaml = std::fs::read_to_string(path)?;
    let report = Scenario::from_yaml(&yaml)?.evaluate()?;

    tracing::info!(
        outcome = ?report.outcome,
        rates = report.rates.len(),
        addresses = report.pickup_addresses.len(),
        "scenario evaluated"
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
