use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub teacher_id: String,
    pub target_level: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub attachment_path: Option<String>,
    pub target_level: Option<String>,
}

fn course_from_row(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        comment: row.get(3)?,
        attachment_path: row.get(4)?,
        teacher_id: row.get(5)?,
        target_level: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const COURSE_COLUMNS: &str =
    "id, title, description, comment, attachment_path, teacher_id, target_level, created_at";

pub fn create(
    conn: &Connection,
    teacher_id: &str,
    draft: &CourseDraft,
) -> Result<Course, StoreError> {
    let course = Course {
        id: Uuid::new_v4().to_string(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        comment: draft.comment.clone(),
        attachment_path: draft.attachment_path.clone(),
        teacher_id: teacher_id.to_string(),
        target_level: draft.target_level.clone(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO courses(id, title, description, comment, attachment_path,
                             teacher_id, target_level, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &course.id,
            &course.title,
            &course.description,
            &course.comment,
            &course.attachment_path,
            &course.teacher_id,
            &course.target_level,
            &course.created_at,
        ),
    )?;
    Ok(course)
}

pub fn update(conn: &Connection, id: &str, draft: &CourseDraft) -> Result<Course, StoreError> {
    let changed = conn.execute(
        "UPDATE courses
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
        return Err(StoreError::NotFound("course"));
    }
    get(conn, id)?.ok_or(StoreError::NotFound("course"))
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Course>, StoreError> {
    let course = conn
        .query_row(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"),
            [id],
            course_from_row,
        )
        .optional()?;
    Ok(course)
}

pub fn list_by_teacher(conn: &Connection, teacher_id: &str) -> Result<Vec<Course>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE teacher_id = ?
         ORDER BY created_at DESC"
    ))?;
    let courses = stmt
        .query_map([teacher_id], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

/// Courses visible to a student: their level plus level-agnostic ones.
pub fn list_for_level(conn: &Connection, level: &str) -> Result<Vec<Course>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE target_level IS NULL OR target_level = ?
         ORDER BY created_at DESC"
    ))?;
    let courses = stmt
        .query_map([level], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

/// Deletes a course and every dependent row in dependency order inside one
/// transaction. The schema has no ON DELETE CASCADE; leaving orphans behind
/// is not acceptable either.
pub fn delete(conn: &Connection, id: &str) -> Result<(), StoreError> {
    if get(conn, id)?.is_none() {
        return Err(StoreError::NotFound("course"));
    }

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "DELETE FROM student_answers
         WHERE quiz_result_id IN (
           SELECT qr.id
           FROM quiz_results qr
           JOIN quizzes q ON q.id = qr.quiz_id
           WHERE q.course_id = ?
         )",
        [id],
    )?;
    tx.execute(
        "DELETE FROM quiz_results
         WHERE quiz_id IN (SELECT id FROM quizzes WHERE course_id = ?)",
        [id],
    )?;
    tx.execute(
        "DELETE FROM answers
         WHERE question_id IN (
           SELECT qu.id
           FROM questions qu
           JOIN quizzes q ON q.id = qu.quiz_id
           WHERE q.course_id = ?
         )",
        [id],
    )?;
    tx.execute(
        "DELETE FROM questions
         WHERE quiz_id IN (SELECT id FROM quizzes WHERE course_id = ?)",
        [id],
    )?;
    tx.execute("DELETE FROM quizzes WHERE course_id = ?", [id])?;

    tx.execute(
        "DELETE FROM exercise_submissions
         WHERE exercise_id IN (SELECT id FROM exercises WHERE course_id = ?)",
        [id],
    )?;
    tx.execute("DELETE FROM exercises WHERE course_id = ?", [id])?;

    tx.execute(
        "DELETE FROM practical_work_submissions
         WHERE practical_work_id IN (SELECT id FROM practical_works WHERE course_id = ?)",
        [id],
    )?;
    tx.execute("DELETE FROM practical_works WHERE course_id = ?", [id])?;

    tx.execute("DELETE FROM favorite_courses WHERE course_id = ?", [id])?;
    tx.execute("DELETE FROM courses WHERE id = ?", [id])?;

    tx.commit()?;
    Ok(())
}
