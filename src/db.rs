use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::Error;

/// The embedded store. A single connection behind a mutex gives the
/// single-writer discipline the dispatcher relies on; WAL mode lets page
/// loads read while the dispatcher writes.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        create_schema(&conn)?;

        info!(path = %path.display(), "database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests and demos. No WAL; a memory database has
    /// no journal file to share.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }
}

fn create_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "
        -- Followed users; never deleted in this scope
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            nickname TEXT NOT NULL,
            avatar_url TEXT NOT NULL,
            authentication_label_id INTEGER NOT NULL DEFAULT 0,
            is_mutual INTEGER NOT NULL DEFAULT 0,
            is_special_follow INTEGER NOT NULL DEFAULT 0,
            custom_remark TEXT,
            is_pinned INTEGER NOT NULL DEFAULT 0,
            last_message_timestamp INTEGER,
            follow_timestamp INTEGER
        );

        -- Messages; mutated only for read flag and card state
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL REFERENCES users(id),
            timestamp INTEGER NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            message_type TEXT CHECK(message_type IN ('text', 'image', 'card')) NOT NULL,
            text_content TEXT,
            image_url TEXT,
            card_text TEXT,
            card_button_text TEXT,
            card_interaction_state TEXT NOT NULL DEFAULT 'none'
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender_id ON messages(sender_id);
        CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
        CREATE INDEX IF NOT EXISTS idx_users_follow_timestamp ON users(follow_timestamp);
        ",
    )?;
    Ok(())
}
