//! Application summary generation: orchestrates the full PDF pipeline.
//!
//! Flow: read attachment → compose (title, three sections, merge) →
//!       serialize → store → read back and verify → return path.
//!
//! Composition is CPU-bound and runs on the blocking pool. Every step that can
//! fail is reported as a single `GenerationError`; problems with the uploaded
//! document are not errors here, they are rendered into the summary instead.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::layout::PageConfig;
use crate::models::SubmissionRow;
use crate::render::{embed, Composer};
use crate::storage::DocumentStore;

pub const SUMMARY_TITLE: &str = "Application Summary";

const APPLICATION_DATE_FORMAT: &str = "%B %-d, %Y, %I:%M %p";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("PDF serialization failed: {0}")]
    Serialization(#[from] lopdf::Error),

    #[error("Generated PDF is empty")]
    EmptyOutput,

    #[error("Failed to write generated PDF: {0}")]
    Storage(#[source] io::Error),

    #[error("PDF file verification failed: {0}")]
    Verification(String),

    #[error("PDF composition task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The uploaded document as read from storage, before any parsing.
pub struct Attachment {
    pub path: String,
    pub bytes: io::Result<Vec<u8>>,
}

/// File name of the generated summary for a submission.
pub fn summary_file_name(submission: &SubmissionRow) -> String {
    format!("application-{}.pdf", submission.id)
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Generates the summary PDF for `submission`, stores it, and returns its path.
///
/// The returned path has been read back from `store` and is known to be non-empty.
pub async fn generate_summary(
    submission: &SubmissionRow,
    store: &dyn DocumentStore,
    config: PageConfig,
) -> Result<PathBuf, GenerationError> {
    info!(submission_id = %submission.id, "Generating application summary");

    let attachment = match &submission.uploaded_file_path {
        Some(path) => Some(Attachment {
            path: path.clone(),
            bytes: store.get(Path::new(path)).await,
        }),
        None => None,
    };

    let owned = submission.clone();
    let bytes =
        tokio::task::spawn_blocking(move || compose_summary(&owned, attachment, &config)).await??;
    if bytes.is_empty() {
        return Err(GenerationError::EmptyOutput);
    }

    let path = store
        .put(&summary_file_name(submission), &bytes)
        .await
        .map_err(GenerationError::Storage)?;

    let written = store
        .get(&path)
        .await
        .map_err(|e| GenerationError::Verification(e.to_string()))?;
    if written.is_empty() {
        return Err(GenerationError::Verification(
            "Saved PDF file is empty".to_string(),
        ));
    }

    info!(
        submission_id = %submission.id,
        bytes = written.len(),
        path = %path.display(),
        "Application summary stored"
    );
    Ok(path)
}

/// Lays out the summary and serializes it. Pure apart from logging.
pub fn compose_summary(
    submission: &SubmissionRow,
    attachment: Option<Attachment>,
    config: &PageConfig,
) -> Result<Vec<u8>, GenerationError> {
    let mut composer = Composer::new(*config);

    composer.add_title(SUMMARY_TITLE);
    composer.add_section("Applicant Information", &applicant_info(submission));
    composer.add_section("Current Job Description", &submission.job_description);
    composer.add_section("Uploaded Document", &document_info(submission));

    if let Some(attachment) = attachment {
        let outcome = embed(&mut composer, &attachment.path, attachment.bytes);
        debug!(submission_id = %submission.id, outcome = ?outcome, "Attachment processed");
    }

    let dropped = composer
        .blocks()
        .iter()
        .filter(|b| !b.drawn && !b.text.trim().is_empty())
        .count();
    if dropped > 0 {
        warn!(submission_id = %submission.id, dropped, "Some lines could not be drawn");
    }

    let pages = composer.page_count();
    let bytes = composer.finish()?;
    debug!(submission_id = %submission.id, pages, bytes = bytes.len(), "Summary composed");
    Ok(bytes)
}

fn applicant_info(submission: &SubmissionRow) -> String {
    let phone = submission
        .phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("Not provided");

    [
        format!("Name: {} {}", submission.first_name, submission.last_name),
        format!("Email: {}", submission.email),
        format!("Phone: {phone}"),
        format!(
            "Application Date: {}",
            submission.created_at.format(APPLICATION_DATE_FORMAT)
        ),
        format!("Status: {}", submission.status),
    ]
    .join("\n")
}

fn document_info(submission: &SubmissionRow) -> String {
    match &submission.uploaded_file_name {
        Some(name) => format!("Uploaded File: {name}\nFile processed and attached to this PDF."),
        None => "No document uploaded".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
