use crate::error::{is_unique_violation, StoreError};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub matricule: String,
    pub role: String,
    pub level: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        matricule: row.get(2)?,
        role: row.get(3)?,
        level: row.get(4)?,
        created_at: row.get(5)?,
        password_hash: row.get(6)?,
    })
}

const USER_COLUMNS: &str = "id, name, matricule, role, level, created_at, password_hash";

pub fn insert(conn: &Connection, user: &User) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users(id, name, matricule, role, level, created_at, password_hash)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &user.id,
            &user.name,
            &user.matricule,
            &user.role,
            &user.level,
            &user.created_at,
            &user.password_hash,
        ),
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::conflict("matricule already used")
        } else {
            StoreError::Db(e)
        }
    })?;
    Ok(())
}

pub fn find_by_matricule(conn: &Connection, matricule: &str) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE matricule = ?"),
            [matricule],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Role recorded in the registration allowlist for this matricule, if any.
pub fn allowlist_role(conn: &Connection, matricule: &str) -> Result<Option<String>, StoreError> {
    let role = conn
        .query_row(
            "SELECT role FROM valid_matricules WHERE matricule = ?",
            [matricule],
            |r| r.get(0),
        )
        .optional()?;
    Ok(role)
}
