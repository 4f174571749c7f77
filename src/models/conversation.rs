use serde::Serialize;

use super::message::Message;
use super::user::User;

/// Derived view pairing a user with their latest message and unread count.
/// Never persisted; recomputed on every query.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Conversation {
    pub user: User,
    pub latest_message: Option<Message>,
    pub unread_count: i64,
}

impl Conversation {
    /// Sort key for recency ordering; conversations with no message sort
    /// as timestamp 0, i.e. last.
    pub fn latest_timestamp(&self) -> i64 {
        self.latest_message.as_ref().map(|m| m.timestamp).unwrap_or(0)
    }
}
