//! Device-pairing token lifecycle and signed deep links.

pub mod service;
pub mod token;

pub use service::{
    HmacPairingService, PairingService, signing_payload, unsigned_deep_link, PAIRING_HOST,
    PAIRING_SCHEME, PAIRING_VERSION,
};
pub use token::PairingToken;
