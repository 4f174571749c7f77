//! Conversation assembly: one user joined with their latest message and
//! unread count.

use rusqlite::Connection;

use crate::db::Database;
use crate::error::Error;
use crate::messages;
use crate::models::input::{SendMessageInput, ValidateExt};
use crate::models::{Conversation, Message, MessageBody, NewMessage, User};
use crate::users;

fn assemble_conn(conn: &Connection, user: User) -> rusqlite::Result<Conversation> {
    let latest_message = messages::latest_for_user_conn(conn, user.id)?;
    let unread_count = messages::unread_count_conn(conn, user.id)?;
    Ok(Conversation {
        user,
        latest_message,
        unread_count,
    })
}

pub fn assemble(db: &Database, user: User) -> Result<Conversation, Error> {
    let conn = db.conn()?;
    Ok(assemble_conn(&conn, user)?)
}

/// Assemble a whole page of users under a single connection lock, rather
/// than locking per row.
pub fn assemble_page(db: &Database, users: Vec<User>) -> Result<Vec<Conversation>, Error> {
    let conn = db.conn()?;
    let conversations = users
        .into_iter()
        .map(|user| assemble_conn(&conn, user))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(conversations)
}

/// Assemble conversations for a set of user ids under a single connection
/// lock. Ids with no user row are skipped; input order is preserved.
pub fn conversations_for_ids(db: &Database, user_ids: &[i64]) -> Result<Vec<Conversation>, Error> {
    let conn = db.conn()?;
    let mut conversations = Vec::with_capacity(user_ids.len());
    for &id in user_ids {
        if let Some(user) = users::user_by_id_conn(&conn, id)? {
            conversations.push(assemble_conn(&conn, user)?);
        }
    }
    Ok(conversations)
}

pub fn conversation_for_user(db: &Database, user_id: i64) -> Result<Option<Conversation>, Error> {
    let conn = db.conn()?;
    match users::user_by_id_conn(&conn, user_id)? {
        Some(user) => Ok(Some(assemble_conn(&conn, user)?)),
        None => Ok(None),
    }
}

/// Full chat thread for one user, oldest first.
pub fn chat_messages(db: &Database, user_id: i64) -> Result<Vec<Message>, Error> {
    messages::messages_for_user(db, user_id)
}

/// Opening a chat marks the whole thread read. Idempotent.
pub fn mark_read(db: &Database, user_id: i64) -> Result<(), Error> {
    messages::mark_messages_read(db, user_id)
}

/// Send a text message into a chat. The author is looking at the thread,
/// so the message is stored already read.
pub fn send_message(db: &Database, input: SendMessageInput) -> Result<Message, Error> {
    input.validate_input()?;
    let new = NewMessage {
        sender_id: input.sender_id,
        timestamp: chrono::Utc::now().timestamp_millis(),
        is_read: true,
        body: MessageBody::Text {
            content: input.content,
        },
    };
    messages::insert_message(db, &new)
}
