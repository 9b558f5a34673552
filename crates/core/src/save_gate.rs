//! Gate in front of admin metadata saves.
//!
//! A save writes product metadata only when it comes from a real form
//! submission, carries a valid save token, and targets a product. Anything
//! else is a silent no-op, never an error.

use core::fmt;

use serde::{Deserialize, Serialize};

/// What triggered the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTrigger {
    /// An administrator submitted the edit form.
    UserSubmission,
    /// A background autosave.
    Autosave,
}

/// The kind of record being saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTarget {
    Product,
    /// Any other record type, by its host type name.
    Other(String),
}

impl SaveTarget {
    /// Host type name of products.
    pub const PRODUCT_POST_TYPE: &'static str = "product";

    /// Map a host record type name.
    #[must_use]
    pub fn from_post_type(post_type: &str) -> Self {
        if post_type == Self::PRODUCT_POST_TYPE {
            Self::Product
        } else {
            Self::Other(post_type.to_owned())
        }
    }
}

/// Result of checking the submitted save token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCheck {
    Missing,
    Invalid,
    Valid,
}

/// Why a save was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Autosave,
    MissingToken,
    InvalidToken,
    NotAProduct,
}

impl SkipReason {
    /// Stable snake case name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Autosave => "autosave",
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::NotAProduct => "not_a_product",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a save may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveDecision {
    Proceed,
    Skip(SkipReason),
}

impl SaveDecision {
    /// Returns `true` for [`SaveDecision::Proceed`].
    #[must_use]
    pub const fn is_proceed(self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Decide whether a save may write metadata.
///
/// Checks run in order: autosave, then the token, then the record type. The
/// first failing check is reported.
#[must_use]
pub const fn evaluate_save(
    trigger: SaveTrigger,
    target: &SaveTarget,
    token: TokenCheck,
) -> SaveDecision {
    if matches!(trigger, SaveTrigger::Autosave) {
        return SaveDecision::Skip(SkipReason::Autosave);
    }

    match token {
        TokenCheck::Missing => return SaveDecision::Skip(SkipReason::MissingToken),
        TokenCheck::Invalid => return SaveDecision::Skip(SkipReason::InvalidToken),
        TokenCheck::Valid => {}
    }

    if !matches!(target, SaveTarget::Product) {
        return SaveDecision::Skip(SkipReason::NotAProduct);
    }

    SaveDecision::Proceed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_product_submission_proceeds() {
        let decision = evaluate_save(
            SaveTrigger::UserSubmission,
            &SaveTarget::Product,
            TokenCheck::Valid,
        );
        assert!(decision.is_proceed());
    }

    #[test]
    fn test_autosave_is_checked_first() {
        let decision = evaluate_save(
            SaveTrigger::Autosave,
            &SaveTarget::Other("page".to_string()),
            TokenCheck::Missing,
        );
        assert_eq!(decision, SaveDecision::Skip(SkipReason::Autosave));
    }

    #[test]
    fn test_token_checked_before_target() {
        let target = SaveTarget::from_post_type("page");
        assert_eq!(
            evaluate_save(SaveTrigger::UserSubmission, &target, TokenCheck::Missing),
            SaveDecision::Skip(SkipReason::MissingToken)
        );
        assert_eq!(
            evaluate_save(SaveTrigger::UserSubmission, &target, TokenCheck::Invalid),
            SaveDecision::Skip(SkipReason::InvalidToken)
        );
        assert_eq!(
            evaluate_save(SaveTrigger::UserSubmission, &target, TokenCheck::Valid),
            SaveDecision::Skip(SkipReason::NotAProduct)
        );
    }

    #[test]
    fn test_from_post_type() {
        assert_eq!(SaveTarget::from_post_type("product"), SaveTarget::Product);
        assert_eq!(
            SaveTarget::from_post_type("shop_order"),
            SaveTarget::Other("shop_order".to_string())
        );
    }

    #[test]
    fn test_skip_reason_serializes_snake_case() {
        for reason in [
            SkipReason::Autosave,
            SkipReason::MissingToken,
            SkipReason::InvalidToken,
            SkipReason::NotAProduct,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, reason.as_str());
            assert_eq!(reason.to_string(), reason.as_str());
        }
    }
}
