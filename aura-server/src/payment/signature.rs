//! Gateway signature verification
//!
//! The gateway signs its payment confirmations with
//! `HMAC-SHA256(secret, "{order_id}|{payment_id}")`, hex encoded. This check
//! is the sole trust boundary of the online payment path: no order is ever
//! finalized without it passing. The expected signature never leaves this
//! module.

use ring::hmac;

/// Verifier over the gateway key secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: hmac::Key,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        }
    }

    /// Verify a supplied hex signature against the recomputed MAC.
    /// Constant-time comparison via `ring::hmac::verify`.
    pub fn verify(&self, order_id: &str, payment_id: &str, supplied_hex: &str) -> bool {
        let message = Self::message(order_id, payment_id);
        let Ok(supplied) = hex::decode(supplied_hex.trim()) else {
            return false;
        };
        hmac::verify(&self.key, message.as_bytes(), &supplied).is_ok()
    }

    /// Compute the hex signature for a (order, payment) pair. This is what
    /// the gateway does on its side; exposed for tests and sandbox tooling.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let message = Self::message(order_id, payment_id);
        let tag = hmac::sign(&self.key, message.as_bytes());
        hex::encode(tag.as_ref())
    }

    fn message(order_id: &str, payment_id: &str) -> String {
        format!("{}|{}", order_id.trim(), payment_id.trim())
    }
}
