pub mod courses;
pub mod exercises;
pub mod favorites;
pub mod notifications;
pub mod practical_works;
pub mod quizzes;
pub mod results;
pub mod submissions;
pub mod users;

/// Creation/submission timestamps are stored as RFC 3339 UTC text, which
/// sorts correctly with plain `ORDER BY ... DESC`.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
