//! Transactional email kinds.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The kind of transactional email being rendered, keyed by the host's email ID.
///
/// Unknown IDs are kept verbatim so they can be logged.
///
/// ```
/// use product_shipping_core::EmailKind;
///
/// assert_eq!(EmailKind::from_id("customer_completed_order"), EmailKind::CustomerCompletedOrder);
/// assert!(!EmailKind::from_id("new_order").shows_pickup_addresses());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmailKind {
    /// Sent to the customer when the order is completed.
    CustomerCompletedOrder,
    /// Sent to the customer when payment is received and the order is processing.
    CustomerProcessingOrder,
    /// Any other email (admin notifications, refunds, invoices, ...).
    Other(String),
}

impl EmailKind {
    /// Host email ID for the completed order email.
    pub const COMPLETED_ORDER_ID: &'static str = "customer_completed_order";
    /// Host email ID for the processing order email.
    pub const PROCESSING_ORDER_ID: &'static str = "customer_processing_order";

    /// Parse a host email ID.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id {
            Self::COMPLETED_ORDER_ID => Self::CustomerCompletedOrder,
            Self::PROCESSING_ORDER_ID => Self::CustomerProcessingOrder,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The host email ID.
    #[must_use]
    pub fn as_id(&self) -> &str {
        match self {
            Self::CustomerCompletedOrder => Self::COMPLETED_ORDER_ID,
            Self::CustomerProcessingOrder => Self::PROCESSING_ORDER_ID,
            Self::Other(id) => id,
        }
    }

    /// Whether the pickup address block belongs in this email.
    #[must_use]
    pub const fn shows_pickup_addresses(&self) -> bool {
        matches!(
            self,
            Self::CustomerCompletedOrder | Self::CustomerProcessingOrder
        )
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

impl From<String> for EmailKind {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<EmailKind> for String {
    fn from(kind: EmailKind) -> Self {
        kind.as_id().to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_order_emails_show_addresses() {
        assert!(EmailKind::CustomerCompletedOrder.shows_pickup_addresses());
        assert!(EmailKind::CustomerProcessingOrder.shows_pickup_addresses());
    }

    #[test]
    fn test_other_emails_do_not_show_addresses() {
        for id in ["new_order", "customer_invoice", "customer_refunded_order", ""] {
            let kind = EmailKind::from_id(id);
            assert!(!kind.shows_pickup_addresses(), "{id} should not show addresses");
            assert_eq!(kind.as_id(), id);
        }
    }

    #[test]
    fn test_deserialize_from_host_id() {
        let kind: EmailKind = serde_json::from_str(r#""customer_processing_order""#).unwrap();
        assert_eq!(kind, EmailKind::CustomerProcessingOrder);
        assert_eq!(kind.to_string(), "customer_processing_order");
    }
}
