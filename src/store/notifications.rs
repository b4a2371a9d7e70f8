use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub seen: bool,
    pub created_at: String,
}

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        seen: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn push(conn: &Connection, user_id: &str, message: &str) -> Result<Notification, StoreError> {
    if message.trim().is_empty() {
        return Err(StoreError::invalid("message must not be empty"));
    }
    if super::users::find_by_id(conn, user_id)?.is_none() {
        return Err(StoreError::NotFound("user"));
    }
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        message: message.to_string(),
        seen: false,
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO notifications(id, user_id, message, seen, created_at)
         VALUES(?, ?, ?, 0, ?)",
        (
            &notification.id,
            &notification.user_id,
            &notification.message,
            &notification.created_at,
        ),
    )?;
    Ok(notification)
}

pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Notification>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, seen, created_at FROM notifications
         WHERE user_id = ?
         ORDER BY created_at DESC",
    )?;
    let notifications = stmt
        .query_map([user_id], notification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notifications)
}

pub fn unseen_count(conn: &Connection, user_id: &str) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND seen = 0",
        [user_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn mark_seen(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("UPDATE notifications SET seen = 1 WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound("notification"));
    }
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM notifications WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound("notification"));
    }
    Ok(())
}
