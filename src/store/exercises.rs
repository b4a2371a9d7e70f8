use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub course_id: String,
    pub teacher_id: String,
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub target_level: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct ExerciseDraft {
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub target_level: Option<String>,
}

fn exercise_from_row(row: &Row) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        course_id: row.get(1)?,
        teacher_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        comment: row.get(5)?,
        attachment_path: row.get(6)?,
        target_level: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const EXERCISE_COLUMNS: &str = "id, course_id, teacher_id, title, description, comment,
     attachment_path, target_level, created_at";

pub fn create(
    conn: &Connection,
    course_id: &str,
    teacher_id: &str,
    draft: &ExerciseDraft,
) -> Result<Exercise, StoreError> {
    if super::courses::get(conn, course_id)?.is_none() {
        return Err(StoreError::NotFound("course"));
    }
    let exercise = Exercise {
        id: Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        teacher_id: teacher_id.to_string(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        comment: draft.comment.clone(),
        attachment_path: draft.attachment_path.clone(),
        target_level: draft.target_level.clone(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO exercises(id, course_id, teacher_id, title, description, comment,
                               attachment_path, target_level, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &exercise.id,
            &exercise.course_id,
            &exercise.teacher_id,
            &exercise.title,
            &exercise.description,
            &exercise.comment,
            &exercise.attachment_path,
            &exercise.target_level,
            &exercise.created_at,
        ),
    )?;
    Ok(exercise)
}

pub fn update(conn: &Connection, id: &str, draft: &ExerciseDraft) -> Result<Exercise, StoreError> {
    let changed = conn.execute(
        "UPDATE exercises
         SET title = ?, description = ?, comment = ?, attachment_path = ?, target_level = ?
         WHERE id = ?",
        (
            &draft.title,
            &draft.description,
            &draft.comment,
            &draft.attachment_path,
            &draft.target_level,
            id,
        ),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("exercise"));
    }
    get(conn, id)?.ok_or(StoreError::NotFound("exercise"))
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Exercise>, StoreError> {
    let exercise = conn
        .query_row(
            &format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ?"),
            [id],
            exercise_from_row,
        )
        .optional()?;
    Ok(exercise)
}

pub fn list_by_course(conn: &Connection, course_id: &str) -> Result<Vec<Exercise>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises
         WHERE course_id = ?
         ORDER BY created_at DESC"
    ))?;
    let exercises = stmt
        .query_map([course_id], exercise_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(exercises)
}

pub fn delete(conn: &Connection, id: &str) -> Result<(), StoreError> {
    if get(conn, id)?.is_none() {
        return Err(StoreError::NotFound("exercise"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM exercise_submissions WHERE exercise_id = ?",
        [id],
    )?;
    tx.execute("DELETE FROM exercises WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(())
}
