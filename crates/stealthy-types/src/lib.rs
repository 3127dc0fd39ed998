//! Shared value types for the Stealthy application.
//!
//! These are the leaf types every other crate builds on: message roles,
//! messages, flag colors, and the pin state. Pure data with serde
//! encode/decode and construction helpers, no store behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single chat message.
///
/// The id is immutable once created. Content grows only while the store
/// streams a simulated assistant reply into it; messages are never
/// deleted individually, only with their conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub role: MessageRole,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time.
    pub fn new(content: impl Into<String>, role: MessageRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }
}

/// User-assignable highlight colors, shared by flags and icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Teal,
    Purple,
    Gray,
}

/// Pin state of a conversation.
///
/// A single tagged value instead of separate `isPinned`/`pinnedAt`
/// fields, so a pinned conversation always carries its pin time and the
/// two can never diverge. The wire format keeps the legacy field pair
/// for compatibility with existing archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PinWire", into = "PinWire")]
pub enum Pin {
    #[default]
    Unpinned,
    Pinned { at: DateTime<Utc> },
}

impl Pin {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Pin::Pinned { .. })
    }

    pub fn pinned_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Pin::Unpinned => None,
            Pin::Pinned { at } => Some(*at),
        }
    }

    /// Flips the pin state, stamping the pin time on the way in.
    pub fn toggled(self) -> Self {
        match self {
            Pin::Unpinned => Pin::Pinned { at: Utc::now() },
            Pin::Pinned { .. } => Pin::Unpinned,
        }
    }
}

/// Legacy wire representation: two independently encoded fields.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinWire {
    #[serde(default)]
    is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pinned_at: Option<DateTime<Utc>>,
}

impl From<PinWire> for Pin {
    fn from(wire: PinWire) -> Self {
        match (wire.is_pinned, wire.pinned_at) {
            (false, _) => Pin::Unpinned,
            (true, Some(at)) => Pin::Pinned { at },
            // Divergent legacy data: a pinned flag without a timestamp.
            // Keep the pin with a deterministic epoch time so it sorts
            // last among pinned items.
            (true, None) => Pin::Pinned {
                at: DateTime::UNIX_EPOCH,
            },
        }
    }
}

impl From<Pin> for PinWire {
    fn from(pin: Pin) -> Self {
        match pin {
            Pin::Unpinned => PinWire {
                is_pinned: false,
                pinned_at: None,
            },
            Pin::Pinned { at } => PinWire {
                is_pinned: true,
                pinned_at: Some(at),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_wire_names() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(
            serde_json::from_str::<MessageRole>("\"system\"").unwrap(),
            MessageRole::System
        );
    }

    #[test]
    fn test_flag_color_wire_names() {
        assert_eq!(serde_json::to_string(&FlagColor::Teal).unwrap(), "\"teal\"");
        assert_eq!(
            serde_json::from_str::<FlagColor>("\"orange\"").unwrap(),
            FlagColor::Orange
        );
    }

    #[test]
    fn test_message_round_trip() {
        let message = Message::new("Hello", MessageRole::User);

        let json = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn test_pin_round_trip() {
        let pin = Pin::Pinned { at: Utc::now() };

        let json = serde_json::to_string(&pin).unwrap();
        let decoded: Pin = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, pin);
        assert!(json.contains("\"isPinned\":true"));
        assert!(json.contains("pinnedAt"));
    }

    #[test]
    fn test_unpinned_omits_timestamp() {
        let json = serde_json::to_string(&Pin::Unpinned).unwrap();
        assert_eq!(json, "{\"isPinned\":false}");
    }

    #[test]
    fn test_pin_decodes_missing_fields_as_unpinned() {
        let decoded: Pin = serde_json::from_str("{}").unwrap();
        assert_eq!(decoded, Pin::Unpinned);
    }

    #[test]
    fn test_pin_reconciles_divergent_legacy_pair() {
        // Pinned flag without a timestamp keeps the pin at the epoch.
        let decoded: Pin = serde_json::from_str("{\"isPinned\":true}").unwrap();
        assert_eq!(
            decoded,
            Pin::Pinned {
                at: DateTime::UNIX_EPOCH
            }
        );

        // A stray timestamp on an unpinned conversation is ignored.
        let decoded: Pin =
            serde_json::from_str("{\"isPinned\":false,\"pinnedAt\":\"2024-01-01T00:00:00Z\"}")
                .unwrap();
        assert_eq!(decoded, Pin::Unpinned);
    }

    #[test]
    fn test_pin_double_toggle_restores_unpinned() {
        let pin = Pin::Unpinned;
        let toggled = pin.toggled();

        assert!(toggled.is_pinned());
        assert!(toggled.pinned_at().is_some());
        assert_eq!(toggled.toggled(), Pin::Unpinned);
    }
}
