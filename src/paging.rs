//! Cursor-based paging over the store and the mock following feed.
//!
//! Cursors are plain values: callers own the `PageRequest` they send and
//! the prev/next keys they get back. There is no hidden paging cache.

use std::sync::Arc;
use std::time::Duration;

use crate::conversations;
use crate::db::Database;
use crate::error::Error;
use crate::models::{Conversation, SortMode, User};
use crate::users;

/// Simulated network latency of the mock following feed.
const MOCK_NETWORK_DELAY: Duration = Duration::from_millis(300);
const MOCK_USER_COUNT: i64 = 1000;

/// A page request: `key` is `None` on first load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub key: Option<u32>,
    pub size: u32,
}

impl PageRequest {
    pub fn first(size: u32) -> Self {
        Self { key: None, size }
    }

    pub fn page(key: u32, size: u32) -> Self {
        Self {
            key: Some(key),
            size,
        }
    }
}

/// One loaded slice plus the keys on either side. `prev_key` is `None` on
/// the first page; `next_key` is `None` once a load comes back empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev_key: Option<u32>,
    pub next_key: Option<u32>,
}

/// Pages of assembled conversations, 0-based, ordered pinned-then-recency.
pub struct ConversationPager {
    db: Arc<Database>,
}

impl ConversationPager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn load(&self, request: PageRequest) -> Result<Page<Conversation>, Error> {
        let page = request.key.unwrap_or(0);
        let offset = i64::from(page) * i64::from(request.size);

        let items = self
            .load_items(i64::from(request.size), offset)
            .map_err(|e| Error::PageLoad(Box::new(e)))?;

        Ok(Page {
            prev_key: page.checked_sub(1),
            next_key: if items.is_empty() { None } else { Some(page + 1) },
            items,
        })
    }

    fn load_items(&self, limit: i64, offset: i64) -> Result<Vec<Conversation>, Error> {
        let page_users = users::page_by_recency(&self.db, limit, offset)?;
        conversations::assemble_page(&self.db, page_users)
    }
}

/// Pages of the local following list, 1-based. The sort mode is fixed per
/// pager; switching modes means building a new pager, which restarts the
/// stream at page 1.
pub struct FollowingPager {
    db: Arc<Database>,
    mode: SortMode,
}

impl FollowingPager {
    pub fn new(db: Arc<Database>, mode: SortMode) -> Self {
        Self { db, mode }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn load(&self, request: PageRequest) -> Result<Page<User>, Error> {
        let page = request.key.unwrap_or(1).max(1);
        let offset = i64::from(page - 1) * i64::from(request.size);

        let items = users::following_page(&self.db, self.mode, i64::from(request.size), offset)
            .map_err(|e| Error::PageLoad(Box::new(e)))?;

        Ok(Page {
            prev_key: if page == 1 { None } else { Some(page - 1) },
            next_key: if items.is_empty() { None } else { Some(page + 1) },
            items,
        })
    }
}

/// In-memory stand-in for the following API: a fixed generated dataset
/// served in 1-based pages behind a simulated network delay.
pub struct MockFollowingSource {
    all_users: Vec<User>,
    delay: Duration,
}

impl MockFollowingSource {
    pub fn new() -> Self {
        Self::with_count(MOCK_USER_COUNT)
    }

    pub fn with_count(count: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let all_users = (1..=count)
            .map(|i| User {
                id: i,
                nickname: format!("User {i}"),
                avatar_url: format!("https://picsum.photos/seed/{i}/64/64"),
                authentication_label_id: 0,
                is_mutual: i % 5 == 0,
                is_special_follow: i % 50 == 0,
                custom_remark: (i % 30 == 0).then(|| format!("My friend {i}")),
                is_pinned: false,
                last_message_timestamp: None,
                // Earlier ids followed earlier, five minutes apart
                follow_timestamp: Some(now - (count - i) * 1000 * 60 * 5),
            })
            .collect();
        Self {
            all_users,
            delay: MOCK_NETWORK_DELAY,
        }
    }

    /// Shorten the simulated latency, mainly for tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn load(&self, request: PageRequest) -> Result<Page<User>, Error> {
        tokio::time::sleep(self.delay).await;

        let page = request.key.unwrap_or(1).max(1);
        let start = (page as usize - 1) * request.size as usize;
        let items: Vec<User> = if start >= self.all_users.len() {
            Vec::new()
        } else {
            let end = (start + request.size as usize).min(self.all_users.len());
            self.all_users[start..end].to_vec()
        };

        Ok(Page {
            prev_key: if page == 1 { None } else { Some(page - 1) },
            next_key: if items.is_empty() { None } else { Some(page + 1) },
            items,
        })
    }
}

impl Default for MockFollowingSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Loaded pages plus the caller's anchor position, used to pick the key to
/// resume from after invalidation.
pub struct PagingState<T> {
    pages: Vec<Page<T>>,
    anchor: Option<usize>,
}

impl<T> PagingState<T> {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            anchor: None,
        }
    }

    pub fn push(&mut self, page: Page<T>) {
        self.pages.push(page);
    }

    /// Record the index of the last-rendered item across all loaded pages.
    pub fn set_anchor(&mut self, position: usize) {
        self.anchor = Some(position);
    }

    /// Key to reload from so the refreshed stream is centered on the
    /// anchor: the anchored page's prev key plus one, falling back to its
    /// next key minus one.
    pub fn refresh_key(&self) -> Option<u32> {
        let anchor = self.anchor?;
        let page = self.closest_page_to_position(anchor)?;
        page.prev_key
            .map(|k| k + 1)
            .or_else(|| page.next_key.map(|k| k.saturating_sub(1)))
    }

    fn closest_page_to_position(&self, position: usize) -> Option<&Page<T>> {
        let mut seen = 0;
        for page in &self.pages {
            seen += page.items.len();
            if position < seen {
                return Some(page);
            }
        }
        self.pages.last()
    }
}

impl<T> Default for PagingState<T> {
    fn default() -> Self {
        Self::new()
    }
}
