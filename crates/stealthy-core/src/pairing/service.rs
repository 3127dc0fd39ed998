//! Signed deep-link construction for device pairing.
//!
//! The link carries a versioned payload (`"{v}.{token}.{exp}"`) signed
//! with HMAC-SHA256 under the per-install secret, encoded base64url
//! without padding. The signature must be correct whenever present;
//! callers fall back to an unsigned link when the secret is unavailable.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use url::Url;

use crate::error::{Result, StealthyError};
use crate::secret::SecretStore;

use super::token::PairingToken;

type HmacSha256 = Hmac<Sha256>;

/// URL scheme of the pairing deep link.
pub const PAIRING_SCHEME: &str = "stealthyai";

/// Host component of the pairing deep link.
pub const PAIRING_HOST: &str = "pair";

/// Version tag embedded in the signed payload and the `v` query item.
pub const PAIRING_VERSION: u32 = 1;

/// Token generation and deep-link signing for the pairing flow.
pub trait PairingService: Send + Sync {
    /// Produces a fresh random token valid for `ttl` from now.
    fn generate_token(&self, ttl: Duration) -> PairingToken;

    /// Builds the signed deep link for a token.
    fn deep_link(&self, token: &PairingToken) -> Result<Url>;

    /// Constant-time check of a signature over a payload.
    fn verify(&self, signature: &[u8], payload: &[u8], secret: &[u8]) -> bool;
}

/// [`PairingService`] signing links with HMAC-SHA256 under the secret
/// held by a [`SecretStore`].
pub struct HmacPairingService {
    secrets: Arc<dyn SecretStore>,
}

impl HmacPairingService {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }
}

impl PairingService for HmacPairingService {
    fn generate_token(&self, ttl: Duration) -> PairingToken {
        PairingToken::new(ttl)
    }

    fn deep_link(&self, token: &PairingToken) -> Result<Url> {
        let secret = self.secrets.get_or_create()?;

        let payload = signing_payload(token);
        let mut mac = HmacSha256::new_from_slice(&secret)
            .map_err(|e| StealthyError::pairing(format!("invalid secret: {e}")))?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let mut url = Url::parse(&format!("{PAIRING_SCHEME}://{PAIRING_HOST}"))
            .map_err(|e| StealthyError::pairing(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("v", &PAIRING_VERSION.to_string())
            .append_pair("token", &token.uuid.to_string())
            .append_pair("exp", &token.expires_at.timestamp().to_string())
            .append_pair("sig", &signature);

        Ok(url)
    }

    fn verify(&self, signature: &[u8], payload: &[u8], secret: &[u8]) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    }
}

/// The string that gets signed: `"{version}.{token}.{exp}"`.
pub fn signing_payload(token: &PairingToken) -> String {
    format!(
        "{}.{}.{}",
        PAIRING_VERSION,
        token.uuid,
        token.expires_at.timestamp()
    )
}

/// Unsigned fallback link used when the secret store is unavailable.
pub fn unsigned_deep_link(token: &PairingToken) -> Option<Url> {
    Url::parse(&format!("{PAIRING_SCHEME}://{PAIRING_HOST}/{}", token.uuid)).ok()
}
