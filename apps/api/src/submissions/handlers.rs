//! Axum route handlers for the Submission API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generate_summary;
use crate::models::{SubmissionRow, SubmissionStatus};
use crate::state::AppState;
use crate::submissions::repository::{
    get_submission, insert_submission, mark_completed, mark_failed,
};
use crate::submissions::uploads::{save_upload, validate_upload, UploadedFile};
use crate::submissions::validation::{describe_errors, validate_form, ApplicationForm};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub submission_id: Uuid,
    pub pdf_url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/submit
///
/// Validates the form and upload, records the submission, and generates its
/// summary PDF before responding.
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let (form, file) = read_submission_form(multipart).await?;

    let application =
        validate_form(form).map_err(|errors| AppError::Validation(describe_errors(&errors)))?;
    let file = file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    validate_upload(&file, state.config.max_upload_bytes)?;

    let upload_path = save_upload(&state.config.upload_dir, &file).await?;
    let upload_path_str = upload_path.to_string_lossy();

    let submission =
        match insert_submission(&state.db, &application, &upload_path_str, &file.file_name).await {
            Ok(submission) => submission,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&upload_path).await {
                    warn!(path = %upload_path.display(), error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e);
            }
        };
    info!(submission_id = %submission.id, "Submission recorded");

    let pdf_path =
        match generate_summary(&submission, state.store.as_ref(), state.page_config).await {
            Ok(path) => path,
            Err(e) => {
                error!(submission_id = %submission.id, error = %e, "Summary generation failed");
                mark_failed(&state.db, submission.id).await?;
                return Err(AppError::Generation(format!("PDF generation failed: {e}")));
            }
        };

    mark_completed(&state.db, submission.id, &pdf_path.to_string_lossy()).await?;

    Ok(Json(SubmitResponse {
        success: true,
        submission_id: submission.id,
        pdf_url: format!("/api/pdf/{}", submission.id),
    }))
}

/// GET /api/pdf/:id
///
/// Streams the generated summary once it is ready.
pub async fn handle_get_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid submission ID".to_string()))?;

    let submission = get_submission(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    match submission.status() {
        SubmissionStatus::Processing => {
            return Err(AppError::Pending(
                "PDF is still being generated. Please try again in a moment.".to_string(),
            ))
        }
        SubmissionStatus::Failed => {
            return Err(AppError::Generation(
                "PDF generation failed. Please contact support.".to_string(),
            ))
        }
        SubmissionStatus::Pending | SubmissionStatus::Completed => {}
    }

    let pdf_path = submission
        .generated_pdf_path
        .as_deref()
        .ok_or_else(|| AppError::NotFound("PDF not available".to_string()))?;

    let bytes = state
        .store
        .get(std::path::Path::new(pdf_path))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound("PDF file not found on server".to_string()),
            _ => AppError::Storage(e.to_string()),
        })?;
    if bytes.is_empty() {
        return Err(AppError::Generation("PDF file is empty".to_string()));
    }

    pdf_response(&submission, bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_submission_form(
    mut multipart: Multipart,
) -> Result<(ApplicationForm, Option<UploadedFile>), AppError> {
    let mut form = ApplicationForm::default();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            // Browsers send an empty part when no file was chosen.
            if !file_name.is_empty() {
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?;
        match name.as_str() {
            "firstName" => form.first_name = value,
            "lastName" => form.last_name = value,
            "email" => form.email = value,
            "phone" => form.phone = Some(value),
            "jobDescription" => form.job_description = value,
            _ => {}
        }
    }

    Ok((form, file))
}

fn pdf_response(submission: &SubmissionRow, bytes: Vec<u8>) -> Result<Response, AppError> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_file_name(&submission.first_name, &submission.last_name)
    );
    let last_modified = submission
        .created_at
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
        (header::CONTENT_DISPOSITION, header_value(&disposition)?),
        (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
        (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600")),
        (header::LAST_MODIFIED, header_value(&last_modified)?),
    ];

    Ok((StatusCode::OK, headers, bytes).into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|e| AppError::Internal(e.into()))
}

/// `application-<first>-<last>.pdf` with anything but ASCII alphanumerics replaced by `_`.
fn download_file_name(first_name: &str, last_name: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    };
    format!("application-{}-{}.pdf", clean(first_name), clean(last_name))
}
