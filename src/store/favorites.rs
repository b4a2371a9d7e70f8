use crate::error::{is_unique_violation, StoreError};
use crate::store::courses::Course;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCourse {
    pub course: Course,
    pub favorited_at: String,
}

fn favorite_from_row(row: &Row) -> rusqlite::Result<FavoriteCourse> {
    Ok(FavoriteCourse {
        course: Course {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            comment: row.get(3)?,
            attachment_path: row.get(4)?,
            teacher_id: row.get(5)?,
            target_level: row.get(6)?,
            created_at: row.get(7)?,
        },
        favorited_at: row.get(8)?,
    })
}

/// Favoriting is idempotent at the storage level: the composite primary key
/// turns a duplicate add into a typed conflict.
pub fn add(conn: &Connection, student_id: &str, course_id: &str) -> Result<(), StoreError> {
    if super::courses::get(conn, course_id)?.is_none() {
        return Err(StoreError::NotFound("course"));
    }
    conn.execute(
        "INSERT INTO favorite_courses(student_id, course_id, created_at) VALUES(?, ?, ?)",
        (student_id, course_id, now_rfc3339()),
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::conflict("course is already a favorite")
        } else {
            StoreError::Db(e)
        }
    })?;
    Ok(())
}

pub fn remove(conn: &Connection, student_id: &str, course_id: &str) -> Result<(), StoreError> {
    let changed = conn.execute(
        "DELETE FROM favorite_courses WHERE student_id = ? AND course_id = ?",
        [student_id, course_id],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("favorite"));
    }
    Ok(())
}

pub fn is_favorite(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
) -> Result<bool, StoreError> {
    let row: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM favorite_courses WHERE student_id = ? AND course_id = ?",
            [student_id, course_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(row.is_some())
}

pub fn list_by_student(
    conn: &Connection,
    student_id: &str,
) -> Result<Vec<FavoriteCourse>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.title, c.description, c.comment, c.attachment_path,
                c.teacher_id, c.target_level, c.created_at, f.created_at
         FROM favorite_courses f
         JOIN courses c ON c.id = f.course_id
         WHERE f.student_id = ?
         ORDER BY f.created_at DESC",
    )?;
    let favorites = stmt
        .query_map([student_id], favorite_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(favorites)
}
