pub mod submission;

pub use submission::{SubmissionRow, SubmissionStatus};
