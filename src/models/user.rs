use serde::{Deserialize, Serialize};

/// A followed user. Seeded at first run, mutated through the remark / pin /
/// follow setters, never deleted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub avatar_url: String,
    #[serde(default)]
    pub authentication_label_id: i64,
    #[serde(default)]
    pub is_mutual: bool,
    #[serde(default)]
    pub is_special_follow: bool,
    #[serde(default)]
    pub custom_remark: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub last_message_timestamp: Option<i64>,
    #[serde(default)]
    pub follow_timestamp: Option<i64>,
}

/// Ordering for the following list. Switching modes means building a new
/// pager, which restarts the stream at page 1.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Special follows first, then stable id order.
    Comprehensive,
    /// Most recently followed first, then stable id order.
    TimeOrder,
}
