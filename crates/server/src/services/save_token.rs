//! Signed tokens guarding admin product saves.
//!
//! A token is `<issued_unix_secs>.<hex hmac-sha256>`, signed over the save
//! action and the product it was issued for. It is handed out with the
//! product edit data and must come back with the save.

use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use product_shipping_core::{ProductId, TokenCheck};

/// Action name bound into every signature.
const SAVE_ACTION: &str = "psm_save_shipping_methods_meta";

/// Tolerated clock skew for tokens issued "in the future".
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Errors from save token verification.
#[derive(Debug, Error)]
pub enum SaveTokenError {
    #[error("malformed save token")]
    Malformed,
    #[error("save token signature mismatch")]
    BadSignature,
    #[error("save token expired")]
    Expired,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Issues and verifies save tokens.
///
/// Implements `Debug` manually to redact the signing key.
#[derive(Clone)]
pub struct SaveTokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for SaveTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveTokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SaveTokenSigner {
    /// Create a signer.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for a product, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `SaveTokenError::InvalidKey` if the HMAC cannot be keyed.
    pub fn issue(&self, product_id: ProductId) -> Result<String, SaveTokenError> {
        self.issue_at(product_id, now_unix_secs())
    }

    /// Issue a token for a product with an explicit issue time.
    ///
    /// # Errors
    ///
    /// Returns `SaveTokenError::InvalidKey` if the HMAC cannot be keyed.
    pub fn issue_at(&self, product_id: ProductId, issued: i64) -> Result<String, SaveTokenError> {
        let signature = self.sign(product_id, issued)?;
        Ok(format!("{issued}.{signature}"))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, signed for another
    /// product, or outside its validity window.
    pub fn verify(&self, product_id: ProductId, token: &str) -> Result<(), SaveTokenError> {
        self.verify_at(product_id, token, now_unix_secs())
    }

    /// Verify a token against an explicit current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, signed for another
    /// product, or outside its validity window.
    pub fn verify_at(
        &self,
        product_id: ProductId,
        token: &str,
        now: i64,
    ) -> Result<(), SaveTokenError> {
        let (issued, signature) = token.split_once('.').ok_or(SaveTokenError::Malformed)?;
        let issued: i64 = issued.parse().map_err(|_| SaveTokenError::Malformed)?;

        let expected = self.sign(product_id, issued)?;
        if !constant_time_compare(&expected, signature) {
            return Err(SaveTokenError::BadSignature);
        }

        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let age = now.saturating_sub(issued);
        if age > ttl || age < -MAX_CLOCK_SKEW_SECS {
            return Err(SaveTokenError::Expired);
        }

        Ok(())
    }

    /// Classify the token submitted with a save.
    #[must_use]
    pub fn check(&self, product_id: ProductId, token: Option<&str>) -> TokenCheck {
        match token.map(str::trim) {
            None | Some("") => TokenCheck::Missing,
            Some(token) => match self.verify(product_id, token) {
                Ok(()) => TokenCheck::Valid,
                Err(e) => {
                    debug!(%product_id, error = %e, "rejected save token");
                    TokenCheck::Invalid
                }
            },
        }
    }

    fn sign(&self, product_id: ProductId, issued: i64) -> Result<String, SaveTokenError> {
        let message = format!("{SAVE_ACTION}:{product_id}:{issued}");

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| SaveTokenError::InvalidKey(e.to_string()))?;
        mac.update(message.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn now_unix_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_790_000_000;

    fn signer() -> SaveTokenSigner {
        SaveTokenSigner::new(
            SecretString::from("kQ9#vT2!mZ7@pL4$wX8^rB1&nC6*hJ3%"),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_issued_token_verifies() {
        let token = signer().issue_at(ProductId::new(42), NOW).unwrap();
        assert!(token.starts_with("1790000000."));
        assert!(signer().verify_at(ProductId::new(42), &token, NOW + 60).is_ok());
    }

    #[test]
    fn test_token_bound_to_product() {
        let token = signer().issue_at(ProductId::new(42), NOW).unwrap();
        let result = signer().verify_at(ProductId::new(43), &token, NOW);
        assert!(matches!(result, Err(SaveTokenError::BadSignature)));
    }

    #[test]
    fn test_token_bound_to_key() {
        let token = signer().issue_at(ProductId::new(42), NOW).unwrap();
        let other = SaveTokenSigner::new(
            SecretString::from("Zx8&Wq3^Lm6!Pt1@Rv5#Kb9$Nd2%Hs7*"),
            Duration::from_secs(3600),
        );
        assert!(other.verify_at(ProductId::new(42), &token, NOW).is_err());
    }

    #[test]
    fn test_tampered_issue_time_is_rejected() {
        let token = signer().issue_at(ProductId::new(42), NOW).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{signature}", NOW + 1000);
        assert!(matches!(
            signer().verify_at(ProductId::new(42), &forged, NOW + 1000),
            Err(SaveTokenError::BadSignature)
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = signer().issue_at(ProductId::new(42), NOW).unwrap();
        assert!(matches!(
            signer().verify_at(ProductId::new(42), &token, NOW + 3601),
            Err(SaveTokenError::Expired)
        ));
    }

    #[test]
    fn test_future_token_within_skew() {
        let token = signer().issue_at(ProductId::new(42), NOW + 120).unwrap();
        assert!(signer().verify_at(ProductId::new(42), &token, NOW).is_ok());

        let token = signer().issue_at(ProductId::new(42), NOW + 600).unwrap();
        assert!(signer().verify_at(ProductId::new(42), &token, NOW).is_err());
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "12345", "notanumber.deadbeef"] {
            assert!(matches!(
                signer().verify_at(ProductId::new(1), token, NOW),
                Err(SaveTokenError::Malformed)
            ));
        }
    }

    #[test]
    fn test_check_classifies_tokens() {
        let signer = signer();
        let product = ProductId::new(7);
        let token = signer.issue(product).unwrap();

        assert_eq!(signer.check(product, None), TokenCheck::Missing);
        assert_eq!(signer.check(product, Some("  ")), TokenCheck::Missing);
        assert_eq!(signer.check(product, Some("1.abc")), TokenCheck::Invalid);
        assert_eq!(signer.check(product, Some(&token)), TokenCheck::Valid);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug_output = format!("{:?}", signer());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kQ9#"));
    }
}
