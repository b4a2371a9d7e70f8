use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

/// A student's hand-in for an exercise or a practical work. Resubmission is
/// allowed; listings put the newest attempt first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Copy)]
pub enum AssignmentKind {
    Exercise,
    PracticalWork,
}

impl AssignmentKind {
    fn table(self) -> &'static str {
        match self {
            Self::Exercise => "exercise_submissions",
            Self::PracticalWork => "practical_work_submissions",
        }
    }

    fn fk_column(self) -> &'static str {
        match self {
            Self::Exercise => "exercise_id",
            Self::PracticalWork => "practical_work_id",
        }
    }

    fn parent_table(self) -> &'static str {
        match self {
            Self::Exercise => "exercises",
            Self::PracticalWork => "practical_works",
        }
    }

    fn parent_label(self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::PracticalWork => "practical work",
        }
    }
}

fn submission_from_row(row: &Row) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        assignment_id: row.get(1)?,
        student_id: row.get(2)?,
        content: row.get(3)?,
        file_path: row.get(4)?,
        submitted_at: row.get(5)?,
    })
}

pub fn submit(
    conn: &Connection,
    kind: AssignmentKind,
    assignment_id: &str,
    student_id: &str,
    content: Option<&str>,
    file_path: Option<&str>,
) -> Result<Submission, StoreError> {
    if content.map_or(true, |c| c.trim().is_empty()) && file_path.is_none() {
        return Err(StoreError::invalid(
            "a submission needs content or an attached file",
        ));
    }

    let parent: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?", kind.parent_table()),
            [assignment_id],
            |r| r.get(0),
        )
        .optional()?;
    if parent.is_none() {
        return Err(StoreError::NotFound(kind.parent_label()));
    }

    let submission = Submission {
        id: Uuid::new_v4().to_string(),
        assignment_id: assignment_id.to_string(),
        student_id: student_id.to_string(),
        content: content.map(str::to_string),
        file_path: file_path.map(str::to_string),
        submitted_at: now_rfc3339(),
    };
    conn.execute(
        &format!(
            "INSERT INTO {}(id, {}, student_id, content, file_path, submitted_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            kind.table(),
            kind.fk_column()
        ),
        (
            &submission.id,
            &submission.assignment_id,
            &submission.student_id,
            &submission.content,
            &submission.file_path,
            &submission.submitted_at,
        ),
    )?;
    Ok(submission)
}

pub fn list_by_assignment(
    conn: &Connection,
    kind: AssignmentKind,
    assignment_id: &str,
) -> Result<Vec<Submission>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {}, student_id, content, file_path, submitted_at
         FROM {}
         WHERE {} = ?
         ORDER BY submitted_at DESC",
        kind.fk_column(),
        kind.table(),
        kind.fk_column()
    ))?;
    let submissions = stmt
        .query_map([assignment_id], submission_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(submissions)
}

pub fn list_by_student(
    conn: &Connection,
    kind: AssignmentKind,
    student_id: &str,
) -> Result<Vec<Submission>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {}, student_id, content, file_path, submitted_at
         FROM {}
         WHERE student_id = ?
         ORDER BY submitted_at DESC",
        kind.fk_column(),
        kind.table()
    ))?;
    let submissions = stmt
        .query_map([student_id], submission_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(submissions)
}
