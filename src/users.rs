//! User queries and the follow/pin/remark setter surface.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::Database;
use crate::error::Error;
use crate::models::input::{RemarkInput, ValidateExt};
use crate::models::{SortMode, User};

const USER_COLUMNS: &str = "id, nickname, avatar_url, authentication_label_id, is_mutual, \
     is_special_follow, custom_remark, is_pinned, last_message_timestamp, follow_timestamp";

pub(crate) fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        nickname: row.get(1)?,
        avatar_url: row.get(2)?,
        authentication_label_id: row.get(3)?,
        is_mutual: row.get::<_, i64>(4)? != 0,
        is_special_follow: row.get::<_, i64>(5)? != 0,
        custom_remark: row.get(6)?,
        is_pinned: row.get::<_, i64>(7)? != 0,
        last_message_timestamp: row.get(8)?,
        follow_timestamp: row.get(9)?,
    })
}

pub(crate) fn user_by_id_conn(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [user_id],
        map_user,
    )
    .optional()
}

pub fn user_by_id(db: &Database, user_id: i64) -> Result<Option<User>, Error> {
    let conn = db.conn()?;
    Ok(user_by_id_conn(&conn, user_id)?)
}

pub fn all_user_ids(db: &Database) -> Result<Vec<i64>, Error> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id ASC")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

pub fn count_users(db: &Database) -> Result<i64, Error> {
    let conn = db.conn()?;
    let count = conn.query_row("SELECT COUNT(id) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

/// One offset window of the conversation ordering: pinned first, then most
/// recent activity. NULL activity sorts last under DESC.
pub fn page_by_recency(db: &Database, limit: i64, offset: i64) -> Result<Vec<User>, Error> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         ORDER BY is_pinned DESC, last_message_timestamp DESC
         LIMIT ?1 OFFSET ?2",
    ))?;
    let users = stmt
        .query_map(params![limit, offset], map_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

/// One offset window of the following list in the given sort mode.
pub fn following_page(
    db: &Database,
    mode: SortMode,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, Error> {
    let order_by = match mode {
        SortMode::Comprehensive => "is_special_follow DESC, id ASC",
        SortMode::TimeOrder => "follow_timestamp DESC, id ASC",
    };
    let conn = db.conn()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY {order_by} LIMIT ?1 OFFSET ?2",
    ))?;
    let users = stmt
        .query_map(params![limit, offset], map_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

/// Ids of users whose nickname or remark contains the query,
/// case-insensitively for ASCII.
pub fn search_user_ids(db: &Database, query: &str) -> Result<Vec<i64>, Error> {
    let pattern = format!("%{}%", query);
    let conn = db.conn()?;
    let mut stmt =
        conn.prepare("SELECT id FROM users WHERE nickname LIKE ?1 OR custom_remark LIKE ?1")?;
    let ids = stmt
        .query_map([&pattern], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

pub fn update_remark(db: &Database, user_id: i64, remark: Option<&str>) -> Result<(), Error> {
    let input = RemarkInput {
        user_id,
        remark: remark.map(str::to_string),
    };
    input.validate_input()?;

    let conn = db.conn()?;
    conn.execute(
        "UPDATE users SET custom_remark = ?1 WHERE id = ?2",
        params![input.remark, user_id],
    )?;
    Ok(())
}

pub fn set_pinned(db: &Database, user_id: i64, is_pinned: bool) -> Result<(), Error> {
    let conn = db.conn()?;
    conn.execute(
        "UPDATE users SET is_pinned = ?1 WHERE id = ?2",
        params![is_pinned, user_id],
    )?;
    Ok(())
}

pub fn set_special_follow(db: &Database, user_id: i64, is_special: bool) -> Result<(), Error> {
    let conn = db.conn()?;
    conn.execute(
        "UPDATE users SET is_special_follow = ?1 WHERE id = ?2",
        params![is_special, user_id],
    )?;
    Ok(())
}

pub fn follow(db: &Database, user_id: i64) -> Result<(), Error> {
    let now = chrono::Utc::now().timestamp_millis();
    let conn = db.conn()?;
    conn.execute(
        "UPDATE users SET follow_timestamp = ?1 WHERE id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

pub fn unfollow(db: &Database, user_id: i64) -> Result<(), Error> {
    let conn = db.conn()?;
    conn.execute(
        "UPDATE users SET follow_timestamp = NULL WHERE id = ?1",
        [user_id],
    )?;
    Ok(())
}

/// Bulk insert for seeding. Replaces on id collision so reseeding a partial
/// dataset is safe.
pub fn insert_users(db: &Database, users: &[User]) -> Result<(), Error> {
    let mut conn = db.conn()?;
    let tx = conn.transaction()?;
    insert_users_conn(&tx, users)?;
    tx.commit()?;
    Ok(())
}

pub(crate) fn insert_users_conn(conn: &Connection, users: &[User]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO users (id, nickname, avatar_url, authentication_label_id, \
         is_mutual, is_special_follow, custom_remark, is_pinned, last_message_timestamp, \
         follow_timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for user in users {
        stmt.execute(params![
            user.id,
            user.nickname,
            user.avatar_url,
            user.authentication_label_id,
            user.is_mutual,
            user.is_special_follow,
            user.custom_remark,
            user.is_pinned,
            user.last_message_timestamp,
            user.follow_timestamp,
        ])?;
    }
    Ok(())
}
