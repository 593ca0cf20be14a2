//! Uploaded document validation and storage.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

const ALLOWED_CONTENT_TYPE: &str = "application/pdf";
const ALLOWED_EXTENSION: &str = "pdf";
const MAX_BASE_NAME_CHARS: usize = 50;

/// A file part received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub fn validate_upload(file: &UploadedFile, max_bytes: usize) -> Result<(), AppError> {
    if file.bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File size exceeds {}MB limit",
            max_bytes / (1024 * 1024)
        )));
    }

    if file.content_type.as_deref() != Some(ALLOWED_CONTENT_TYPE) {
        return Err(AppError::Validation("Only PDF files are allowed".to_string()));
    }

    let has_pdf_extension = Path::new(&file.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION));
    if !has_pdf_extension {
        return Err(AppError::Validation("Only PDF files are allowed".to_string()));
    }

    Ok(())
}

/// Builds a collision-resistant storage name that keeps a readable hint of the original.
///
/// Shape: `<unix millis>-<16 hex>-<base name>.<ext>`, with the base name cut to
/// 50 characters and anything outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn safe_file_name(original: &str, unix_millis: i64) -> String {
    let path = Path::new(original);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let base: String = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASE_NAME_CHARS)
        .collect();
    let random = Uuid::new_v4().simple().to_string();

    format!("{unix_millis}-{}-{base}{extension}", &random[..16])
}

/// Writes the upload into `dir` and returns its final path.
///
/// Bytes go to a temp file in the same directory first and are renamed into
/// place, so a reader never observes a partially written upload.
pub async fn save_upload(dir: &Path, file: &UploadedFile) -> Result<PathBuf, AppError> {
    let dir = dir.to_path_buf();
    let target = dir.join(safe_file_name(
        &file.file_name,
        chrono::Utc::now().timestamp_millis(),
    ));
    let bytes = file.bytes.clone();

    let path = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&dir)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    })
    .await
    .map_err(|e| AppError::Storage(format!("upload task failed: {e}")))?
    .map_err(|e| AppError::Storage(format!("Failed to upload file: {e}")))?;

    info!(path = %path.display(), bytes = file.bytes.len(), "Stored upload");
    Ok(path)
}
