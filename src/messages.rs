//! Message queries, the transactional insert, and card-state transitions.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::Database;
use crate::error::Error;
use crate::models::{CardInteractionState, Message, MessageBody, NewMessage};

const MESSAGE_COLUMNS: &str = "id, sender_id, timestamp, is_read, message_type, text_content, \
     image_url, card_text, card_button_text, card_interaction_state";

pub(crate) fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let kind: String = row.get(4)?;
    let body = match kind.as_str() {
        "text" => MessageBody::Text {
            content: row.get(5)?,
        },
        "image" => MessageBody::Image {
            image_url: row.get(6)?,
        },
        "card" => {
            let state: String = row.get(9)?;
            MessageBody::Card {
                text: row.get(7)?,
                button_text: row.get(8)?,
                interaction_state: CardInteractionState::parse(&state).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        9,
                        rusqlite::types::Type::Text,
                        format!("unknown card state: {state}").into(),
                    )
                })?,
            }
        }
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown message type: {other}").into(),
            ))
        }
    };
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        timestamp: row.get(2)?,
        is_read: row.get::<_, i64>(3)? != 0,
        body,
    })
}

pub(crate) fn insert_message_inner(conn: &Connection, new: &NewMessage) -> Result<i64, Error> {
    let (text_content, image_url, card_text, card_button_text, card_state) = match &new.body {
        MessageBody::Text { content } => (Some(content.as_str()), None, None, None, None),
        MessageBody::Image { image_url } => (None, Some(image_url.as_str()), None, None, None),
        MessageBody::Card {
            text,
            button_text,
            interaction_state,
        } => (
            None,
            None,
            Some(text.as_str()),
            Some(button_text.as_str()),
            Some(interaction_state.as_str()),
        ),
    };
    conn.execute(
        "INSERT INTO messages (sender_id, timestamp, is_read, message_type, text_content, \
         image_url, card_text, card_button_text, card_interaction_state) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, COALESCE(?9, 'none'))",
        params![
            new.sender_id,
            new.timestamp,
            new.is_read,
            new.body.kind(),
            text_content,
            image_url,
            card_text,
            card_button_text,
            card_state,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a message and bump the sender's last-message timestamp in one
/// transaction. Readers never observe one half of the pair.
pub fn insert_message(db: &Database, new: &NewMessage) -> Result<Message, Error> {
    let mut conn = db.conn()?;
    let tx = conn.transaction()?;
    let id = insert_message_inner(&tx, new)?;
    tx.execute(
        "UPDATE users SET last_message_timestamp = ?1 WHERE id = ?2",
        params![new.timestamp, new.sender_id],
    )?;
    tx.commit()?;

    debug!(message_id = id, sender_id = new.sender_id, "message inserted");
    Ok(Message {
        id,
        sender_id: new.sender_id,
        timestamp: new.timestamp,
        is_read: new.is_read,
        body: new.body.clone(),
    })
}

/// Backfill last-message timestamps once a batch of rows is in.
pub(crate) fn backfill_last_message_timestamps(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET last_message_timestamp = \
           (SELECT MAX(timestamp) FROM messages WHERE sender_id = users.id) \
         WHERE EXISTS (SELECT 1 FROM messages WHERE sender_id = users.id)",
        [],
    )?;
    Ok(())
}

pub(crate) fn latest_for_user_conn(
    conn: &Connection,
    user_id: i64,
) -> rusqlite::Result<Option<Message>> {
    conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sender_id = ?1 \
             ORDER BY timestamp DESC LIMIT 1"
        ),
        [user_id],
        map_message,
    )
    .optional()
}

pub(crate) fn unread_count_conn(conn: &Connection, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(id) FROM messages WHERE sender_id = ?1 AND is_read = 0",
        [user_id],
        |row| row.get(0),
    )
}

pub fn latest_message_for_user(db: &Database, user_id: i64) -> Result<Option<Message>, Error> {
    let conn = db.conn()?;
    Ok(latest_for_user_conn(&conn, user_id)?)
}

pub fn unread_count_for_user(db: &Database, user_id: i64) -> Result<i64, Error> {
    let conn = db.conn()?;
    Ok(unread_count_conn(&conn, user_id)?)
}

/// Full thread for one user, oldest first.
pub fn messages_for_user(db: &Database, user_id: i64) -> Result<Vec<Message>, Error> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sender_id = ?1 ORDER BY timestamp ASC"
    ))?;
    let messages = stmt
        .query_map([user_id], map_message)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

/// Mark every message from this user read. Idempotent.
pub fn mark_messages_read(db: &Database, user_id: i64) -> Result<(), Error> {
    let conn = db.conn()?;
    conn.execute(
        "UPDATE messages SET is_read = 1 WHERE sender_id = ?1",
        [user_id],
    )?;
    Ok(())
}

pub fn count_messages(db: &Database) -> Result<i64, Error> {
    let conn = db.conn()?;
    let count = conn.query_row("SELECT COUNT(id) FROM messages", [], |row| row.get(0))?;
    Ok(count)
}

/// Messages whose text or card text contains the query, newest first.
pub fn search_messages(db: &Database, query: &str) -> Result<Vec<Message>, Error> {
    let pattern = format!("%{}%", query);
    let conn = db.conn()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages \
         WHERE text_content LIKE ?1 OR card_text LIKE ?1 \
         ORDER BY timestamp DESC"
    ))?;
    let messages = stmt
        .query_map([&pattern], map_message)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

/// Apply a card interaction. Transitions are one-way from `None`:
/// re-applying the current terminal state is a no-op, crossing between
/// terminal states is rejected and leaves the row unchanged.
pub fn set_card_state(
    db: &Database,
    message_id: i64,
    to: CardInteractionState,
) -> Result<(), Error> {
    let mut conn = db.conn()?;
    let tx = conn.transaction()?;

    let (kind, current): (String, String) = tx.query_row(
        "SELECT message_type, card_interaction_state FROM messages WHERE id = ?1",
        [message_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if kind != "card" {
        return Err(Error::InvalidInput(format!(
            "message {message_id} is not a card"
        )));
    }
    let from = CardInteractionState::parse(&current).ok_or_else(|| {
        Error::InvalidInput(format!("message {message_id} has unknown card state {current}"))
    })?;

    if from == to {
        return Ok(());
    }
    if from != CardInteractionState::None {
        return Err(Error::InvalidCardTransition { from, to });
    }

    tx.execute(
        "UPDATE messages SET card_interaction_state = ?1 WHERE id = ?2",
        params![to.as_str(), message_id],
    )?;
    tx.commit()?;
    Ok(())
}
