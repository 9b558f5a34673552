//! Pickup address block appended after the order table of customer emails.

use askama::Template;

use crate::types::EmailKind;

const HEADING: &str = "Pickup Addresses:";

/// Output format of the email being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailFormat {
    PlainText,
    Html,
}

impl EmailFormat {
    /// Map the host's plain text flag.
    #[must_use]
    pub const fn from_plain_text(plain_text: bool) -> Self {
        if plain_text { Self::PlainText } else { Self::Html }
    }
}

#[derive(Template)]
#[template(path = "email/pickup_addresses.html")]
struct PickupAddressesHtml<'a> {
    addresses: &'a [String],
}

/// Resolved pickup addresses, ready to render into an email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupAddressBlock {
    addresses: Vec<String>,
}

impl PickupAddressBlock {
    #[must_use]
    pub const fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }

    #[must_use]
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Plain text rendering. Empty when there are no addresses.
    #[must_use]
    pub fn render_plain(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = format!("\n\n{HEADING}\n\n");
        for address in &self.addresses {
            out.push_str(address);
            out.push_str("\n\n");
        }
        out
    }

    /// HTML rendering with escaped addresses. Empty when there are no addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_html(&self) -> Result<String, askama::Error> {
        if self.is_empty() {
            return Ok(String::new());
        }

        PickupAddressesHtml {
            addresses: &self.addresses,
        }
        .render()
    }

    /// Render in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTML template fails to render.
    pub fn render(&self, format: EmailFormat) -> Result<String, askama::Error> {
        match format {
            EmailFormat::PlainText => Ok(self.render_plain()),
            EmailFormat::Html => self.render_html(),
        }
    }
}

/// Render the block for an email, if it belongs in it.
///
/// Returns `Ok(None)` for email kinds that do not show pickup addresses and for
/// orders without any.
///
/// # Errors
///
/// Returns an error if the HTML template fails to render.
pub fn pickup_block_for_email(
    kind: &EmailKind,
    format: EmailFormat,
    addresses: Vec<String>,
) -> Result<Option<String>, askama::Error> {
    if !kind.shows_pickup_addresses() || addresses.is_empty() {
        return Ok(None);
    }

    PickupAddressBlock::new(addresses).render(format).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn block(addresses: &[&str]) -> PickupAddressBlock {
        PickupAddressBlock::new(addresses.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_render_plain() {
        let text = block(&["123 Main St", "9 Quay Lane"]).render_plain();
        assert_eq!(
            text,
            "\n\nPickup Addresses:\n\n123 Main St\n\n9 Quay Lane\n\n"
        );
    }

    #[test]
    fn test_render_html() {
        let html = block(&["123 Main St", "9 Quay Lane"]).render_html().unwrap();
        assert!(html.starts_with("<br><h2>Pickup Addresses:</h2>"));
        assert!(html.contains("<p>123 Main St</p><p>9 Quay Lane</p>"));
    }

    #[test]
    fn test_render_html_escapes_addresses() {
        let html = block(&["<script>alert(1)</script>"]).render_html().unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_block_renders_nothing() {
        let empty = PickupAddressBlock::default();
        assert_eq!(empty.render_plain(), "");
        assert_eq!(empty.render_html().unwrap(), "");
    }

    #[test]
    fn test_block_only_for_customer_order_emails() {
        let addresses = vec!["123 Main St".to_string()];

        let processing = pickup_block_for_email(
            &EmailKind::CustomerProcessingOrder,
            EmailFormat::PlainText,
            addresses.clone(),
        )
        .unwrap();
        assert_eq!(
            processing.as_deref(),
            Some("\n\nPickup Addresses:\n\n123 Main St\n\n")
        );

        let admin = pickup_block_for_email(
            &EmailKind::from_id("new_order"),
            EmailFormat::Html,
            addresses,
        )
        .unwrap();
        assert_eq!(admin, None);
    }

    #[test]
    fn test_no_block_without_addresses() {
        let block = pickup_block_for_email(
            &EmailKind::CustomerCompletedOrder,
            EmailFormat::Html,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(block, None);
    }
}
