use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

/// Graded practical work ("TP"): an exercise with a deadline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticalWork {
    pub id: String,
    pub course_id: String,
    pub teacher_id: String,
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub target_level: Option<String>,
    pub deadline: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct PracticalWorkDraft {
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub target_level: Option<String>,
    pub deadline: Option<String>,
}

fn practical_work_from_row(row: &Row) -> rusqlite::Result<PracticalWork> {
    Ok(PracticalWork {
        id: row.get(0)?,
        course_id: row.get(1)?,
        teacher_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        comment: row.get(5)?,
        attachment_path: row.get(6)?,
        target_level: row.get(7)?,
        deadline: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const PW_COLUMNS: &str = "id, course_id, teacher_id, title, description, comment,
     attachment_path, target_level, deadline, created_at";

pub fn create(
    conn: &Connection,
    course_id: &str,
    teacher_id: &str,
    draft: &PracticalWorkDraft,
) -> Result<PracticalWork, StoreError> {
    if super::courses::get(conn, course_id)?.is_none() {
        return Err(StoreError::NotFound("course"));
    }
    let pw = PracticalWork {
        id: Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        teacher_id: teacher_id.to_string(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        comment: draft.comment.clone(),
        attachment_path: draft.attachment_path.clone(),
        target_level: draft.target_level.clone(),
        deadline: draft.deadline.clone(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO practical_works(id, course_id, teacher_id, title, description, comment,
                                     attachment_path, target_level, deadline, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &pw.id,
            &pw.course_id,
            &pw.teacher_id,
            &pw.title,
            &pw.description,
            &pw.comment,
            &pw.attachment_path,
            &pw.target_level,
            &pw.deadline,
            &pw.created_at,
        ),
    )?;
    Ok(pw)
}

pub fn update(
    conn: &Connection,
    id: &str,
    draft: &PracticalWorkDraft,
) -> Result<PracticalWork, StoreError> {
    let changed = conn.execute(
        "UPDATE practical_works
         SET title = ?, description = ?, comment = ?, attachment_path = ?,
             target_level = ?, deadline = ?
         WHERE id = ?",
        (
            &draft.title,
            &draft.description,
            &draft.comment,
            &draft.attachment_path,
            &draft.target_level,
            &draft.deadline,
            id,
        ),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("practical work"));
    }
    get(conn, id)?.ok_or(StoreError::NotFound("practical work"))
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<PracticalWork>, StoreError> {
    let pw = conn
        .query_row(
            &format!("SELECT {PW_COLUMNS} FROM practical_works WHERE id = ?"),
            [id],
            practical_work_from_row,
        )
        .optional()?;
    Ok(pw)
}

pub fn list_by_course(
    conn: &Connection,
    course_id: &str,
) -> Result<Vec<PracticalWork>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PW_COLUMNS} FROM practical_works
         WHERE course_id = ?
         ORDER BY created_at DESC"
    ))?;
    let works = stmt
        .query_map([course_id], practical_work_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(works)
}

pub fn delete(conn: &Connection, id: &str) -> Result<(), StoreError> {
    if get(conn, id)?.is_none() {
        return Err(StoreError::NotFound("practical work"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM practical_work_submissions WHERE practical_work_id = ?",
        [id],
    )?;
    tx.execute("DELETE FROM practical_works WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(())
}
