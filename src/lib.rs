//! Data core for a demo chat/following app: an embedded store, offset
//! cursor paging, conversation assembly, search aggregation, a synthetic
//! inbound-message loop, and a retrying avatar fetcher.

pub mod avatar;
pub mod conversations;
mod db;
pub mod dispatcher;
mod error;
pub mod messages;
pub mod models;
pub mod paging;
pub mod search;
pub mod seed;
pub mod users;

pub use db::Database;
pub use error::Error;
