//! Ephemeral pairing token.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// A short-lived identifier authorizing a companion-device linking flow.
///
/// Never persisted; regenerated per pairing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingToken {
    pub uuid: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl PairingToken {
    /// Creates a fresh random token valid for `ttl` from now.
    pub fn new(ttl: Duration) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock, for simulated time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
