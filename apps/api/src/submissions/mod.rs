// Submission intake: form validation, upload storage, persistence, and the
// HTTP handlers that run generation for each new submission.

pub mod handlers;
pub mod repository;
pub mod uploads;
pub mod validation;
