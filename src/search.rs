//! Search aggregation across user fields and message content.

use tracing::warn;

use crate::conversations;
use crate::db::Database;
use crate::error::Error;
use crate::messages;
use crate::models::input::{SearchInput, ValidateExt};
use crate::models::Conversation;
use crate::users;

/// Search conversations by user nickname/remark or message text/card text.
///
/// A blank query yields an empty result, not the full set. Failures are
/// degraded to "no results" with a warning; search errors are never shown
/// to the user distinctly.
pub fn search_conversations(db: &Database, query: &str) -> Vec<Conversation> {
    match try_search(db, query) {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "search failed, returning no results");
            Vec::new()
        }
    }
}

fn try_search(db: &Database, query: &str) -> Result<Vec<Conversation>, Error> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    SearchInput {
        query: query.to_string(),
    }
    .validate_input()?;

    // Union of the two predicates, deduplicated by user id. Message hits
    // come back newest first, which keeps the first-seen order stable.
    let mut user_ids: Vec<i64> = Vec::new();
    for message in messages::search_messages(db, query)? {
        if !user_ids.contains(&message.sender_id) {
            user_ids.push(message.sender_id);
        }
    }
    for id in users::search_user_ids(db, query)? {
        if !user_ids.contains(&id) {
            user_ids.push(id);
        }
    }

    let mut hits = conversations::conversations_for_ids(db, &user_ids)?;
    hits.sort_by(|a, b| b.latest_timestamp().cmp(&a.latest_timestamp()));
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageBody, NewMessage, User};

    fn user(id: i64, nickname: &str, remark: Option<&str>) -> User {
        User {
            id,
            nickname: nickname.to_string(),
            avatar_url: String::new(),
            authentication_label_id: 0,
            is_mutual: false,
            is_special_follow: false,
            custom_remark: remark.map(str::to_string),
            is_pinned: false,
            last_message_timestamp: None,
            follow_timestamp: None,
        }
    }

    fn text(sender_id: i64, timestamp: i64, content: &str) -> NewMessage {
        NewMessage {
            sender_id,
            timestamp,
            is_read: false,
            body: MessageBody::Text {
                content: content.to_string(),
            },
        }
    }

    #[test]
    fn blank_query_returns_empty_not_everything() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(&db, &[user(1, "Ann", None)]).unwrap();

        assert!(search_conversations(&db, "").is_empty());
        assert!(search_conversations(&db, "   ").is_empty());
    }

    #[test]
    fn matches_remark_and_message_content_once_per_user() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(
            &db,
            &[
                user(1, "Ann", None),
                user(2, "Ben", Some("VIP")),
                user(3, "Cleo", None),
            ],
        )
        .unwrap();
        messages::insert_message(&db, &text(3, 100, "VIP offer for you")).unwrap();

        let hits = search_conversations(&db, "VIP");
        let ids: Vec<i64> = hits.iter().map(|c| c.user.id).collect();
        // user 3 has the more recent latest message (user 2 has none)
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn user_matching_both_predicates_appears_once() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(&db, &[user(1, "Ann", Some("VIP friend"))]).unwrap();
        messages::insert_message(&db, &text(1, 10, "VIP invite")).unwrap();
        messages::insert_message(&db, &text(1, 20, "another VIP invite")).unwrap();

        let hits = search_conversations(&db, "VIP");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user.id, 1);
        assert_eq!(hits[0].latest_timestamp(), 20);
    }

    #[test]
    fn results_are_sorted_by_latest_message_desc() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(
            &db,
            &[
                user(1, "match one", None),
                user(2, "match two", None),
                user(3, "match three", None),
            ],
        )
        .unwrap();
        messages::insert_message(&db, &text(1, 100, "hi")).unwrap();
        messages::insert_message(&db, &text(2, 300, "hi")).unwrap();
        // user 3 has no message, sorts last

        let hits = search_conversations(&db, "match");
        let ids: Vec<i64> = hits.iter().map(|c| c.user.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn match_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(&db, &[user(1, "Treasure Hunter", None)]).unwrap();

        let hits = search_conversations(&db, "treasure");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn no_match_returns_empty() {
        let db = Database::open_in_memory().unwrap();
        users::insert_users(&db, &[user(1, "Ann", None)]).unwrap();
        assert!(search_conversations(&db, "zzz").is_empty());
    }
}
