use serde::{Deserialize, Serialize};

/// Interaction state of a card message. `None` is the only state a card is
/// created in; `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardInteractionState {
    #[default]
    None,
    Confirmed,
    Cancelled,
}

impl CardInteractionState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CardInteractionState::None => "none",
            CardInteractionState::Confirmed => "confirmed",
            CardInteractionState::Cancelled => "cancelled",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(CardInteractionState::None),
            "confirmed" => Some(CardInteractionState::Confirmed),
            "cancelled" => Some(CardInteractionState::Cancelled),
            _ => None,
        }
    }
}

/// Type-specific message payload. Matching is exhaustive at render and
/// mutation sites, so adding a variant is a compile-time event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text {
        content: String,
    },
    Image {
        image_url: String,
    },
    Card {
        text: String,
        button_text: String,
        #[serde(default)]
        interaction_state: CardInteractionState,
    },
}

impl MessageBody {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            MessageBody::Text { .. } => "text",
            MessageBody::Image { .. } => "image",
            MessageBody::Card { .. } => "card",
        }
    }
}

/// A stored message. Ids are assigned by the store and monotonic.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub timestamp: i64,
    pub is_read: bool,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// A message about to be inserted; also the shape of seed-asset entries.
#[derive(Debug, Deserialize, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(flatten)]
    pub body: MessageBody,
}
