use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of `user_submissions`. This is also the input to PDF generation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_description: String,
    pub uploaded_file_path: Option<String>,
    pub uploaded_file_name: Option<String>,
    pub generated_pdf_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRow {
    /// Parsed `status` column. Unknown values read as `Pending`.
    pub fn status(&self) -> SubmissionStatus {
        self.status.parse().unwrap_or(SubmissionStatus::Pending)
    }
}

/// Lifecycle of a submission's generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "processing" => Ok(SubmissionStatus::Processing),
            "completed" => Ok(SubmissionStatus::Completed),
            "failed" => Ok(SubmissionStatus::Failed),
            other => Err(format!("unknown submission status '{other}'")),
        }
    }
}

#[cfg(test)]
pub fn sample_submission() -> SubmissionRow {
    use chrono::TimeZone;

    let created_at = Utc
        .with_ymd_and_hms(2024, 3, 5, 14, 7, 0)
        .single()
        .unwrap_or_else(Utc::now);
    SubmissionRow {
        id: Uuid::new_v4(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        job_description: "Senior engineer with 5 years experience".to_string(),
        uploaded_file_path: None,
        uploaded_file_name: None,
        generated_pdf_path: None,
        status: SubmissionStatus::Processing.as_str().to_string(),
        created_at,
        updated_at: created_at,
    }
}
