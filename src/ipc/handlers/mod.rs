pub mod auth;
pub mod backup;
pub mod core;
pub mod courses;
pub mod exercises;
pub mod favorites;
pub mod notifications;
pub mod practical_works;
pub mod quizzes;
pub mod stats;
