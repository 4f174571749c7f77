//! First-run seeding from a JSON asset.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::Error;
use crate::messages;
use crate::models::{NewMessage, User};
use crate::users;

/// Shape of the seed asset: `{ "users": [...], "messages": [...] }`.
#[derive(Debug, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub messages: Vec<NewMessage>,
}

/// Seed the store from a JSON asset file. An unreadable or malformed asset
/// is logged and skipped; the app continues with an empty store.
pub fn initialize_from_file(db: &Database, path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(json) => initialize(db, &json),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "seed asset unreadable, starting with empty store");
        }
    }
}

/// Seed the store from a JSON string if both tables are still empty.
pub fn initialize(db: &Database, json: &str) {
    match try_initialize(db, json) {
        Ok(true) => info!("store seeded from initial data"),
        Ok(false) => debug!("store already populated, seed skipped"),
        Err(e) => warn!(error = %e, "seed data rejected, starting with empty store"),
    }
}

fn try_initialize(db: &Database, json: &str) -> Result<bool, Error> {
    let mut conn = db.conn()?;
    let user_count: i64 = conn.query_row("SELECT COUNT(id) FROM users", [], |row| row.get(0))?;
    let message_count: i64 =
        conn.query_row("SELECT COUNT(id) FROM messages", [], |row| row.get(0))?;
    if user_count != 0 || message_count != 0 {
        return Ok(false);
    }

    let data: SeedData =
        serde_json::from_str(json).map_err(|e| Error::SeedData(e.to_string()))?;

    // Users, messages and the backfill commit or roll back together; a bad
    // message row cannot leave a users-only store behind.
    let tx = conn.transaction()?;
    users::insert_users_conn(&tx, &data.users)?;
    for message in &data.messages {
        messages::insert_message_inner(&tx, message)?;
    }
    messages::backfill_last_message_timestamps(&tx)?;
    tx.commit()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageBody;

    const SEED: &str = r#"{
        "users": [
            {"id": 1, "nickname": "Ann", "avatar_url": "https://example.com/a.jpg"},
            {"id": 2, "nickname": "Ben", "avatar_url": "https://example.com/b.jpg",
             "is_special_follow": true, "custom_remark": "VIP"}
        ],
        "messages": [
            {"sender_id": 1, "timestamp": 100, "type": "text", "content": "hello"},
            {"sender_id": 1, "timestamp": 200, "type": "image", "image_url": "https://example.com/p.jpg"},
            {"sender_id": 2, "timestamp": 150, "type": "card", "text": "Invite", "button_text": "Join"}
        ]
    }"#;

    #[test]
    fn seeds_empty_store_and_backfills_timestamps() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db, SEED);

        assert_eq!(users::count_users(&db).unwrap(), 2);
        assert_eq!(messages::count_messages(&db).unwrap(), 3);

        let ann = users::user_by_id(&db, 1).unwrap().unwrap();
        assert_eq!(ann.last_message_timestamp, Some(200));
        let ben = users::user_by_id(&db, 2).unwrap().unwrap();
        assert_eq!(ben.last_message_timestamp, Some(150));
        assert!(ben.is_special_follow);
    }

    #[test]
    fn seed_is_skipped_when_store_is_populated() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db, SEED);
        // Second run must not duplicate anything
        initialize(&db, SEED);

        assert_eq!(users::count_users(&db).unwrap(), 2);
        assert_eq!(messages::count_messages(&db).unwrap(), 3);
    }

    #[test]
    fn malformed_seed_leaves_store_empty_without_error() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db, "{not json");

        assert_eq!(users::count_users(&db).unwrap(), 0);
        assert_eq!(messages::count_messages(&db).unwrap(), 0);
    }

    #[test]
    fn unknown_message_type_is_rejected_as_seed_error() {
        let db = Database::open_in_memory().unwrap();
        let bad = r#"{"users": [], "messages": [
            {"sender_id": 1, "timestamp": 1, "type": "sticker"}
        ]}"#;
        initialize(&db, bad);
        assert_eq!(messages::count_messages(&db).unwrap(), 0);
    }

    #[test]
    fn seed_with_unknown_sender_leaves_store_empty() {
        let db = Database::open_in_memory().unwrap();
        let bad = r#"{
            "users": [{"id": 1, "nickname": "Ann", "avatar_url": "https://example.com/a.jpg"}],
            "messages": [{"sender_id": 99, "timestamp": 1, "type": "text", "content": "hi"}]
        }"#;
        initialize(&db, bad);

        // The FK failure on the message rolls the seeded users back out too
        assert_eq!(users::count_users(&db).unwrap(), 0);
        assert_eq!(messages::count_messages(&db).unwrap(), 0);
    }

    #[test]
    fn card_seed_round_trips_through_store() {
        let db = Database::open_in_memory().unwrap();
        initialize(&db, SEED);

        let latest = messages::latest_message_for_user(&db, 2).unwrap().unwrap();
        match latest.body {
            MessageBody::Card { text, .. } => assert_eq!(text, "Invite"),
            other => panic!("expected card, got {other:?}"),
        }
    }
}
