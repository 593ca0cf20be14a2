//! `user_submissions` persistence.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{SubmissionRow, SubmissionStatus};
use crate::submissions::validation::ValidApplication;

/// Inserts a validated application with status `processing`.
///
/// A second submission for the same email is a conflict.
pub async fn insert_submission(
    pool: &PgPool,
    application: &ValidApplication,
    uploaded_file_path: &str,
    uploaded_file_name: &str,
) -> Result<SubmissionRow, AppError> {
    sqlx::query_as::<_, SubmissionRow>(
        r#"
        INSERT INTO user_submissions
            (first_name, last_name, email, phone, job_description,
             uploaded_file_path, uploaded_file_name, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&application.first_name)
    .bind(&application.last_name)
    .bind(&application.email)
    .bind(&application.phone)
    .bind(&application.job_description)
    .bind(uploaded_file_path)
    .bind(uploaded_file_name)
    .bind(SubmissionStatus::Processing.as_str())
    .fetch_one(pool)
    .await
    .map_err(map_insert_error)
}

pub async fn get_submission(pool: &PgPool, id: Uuid) -> Result<Option<SubmissionRow>, AppError> {
    Ok(
        sqlx::query_as::<_, SubmissionRow>("SELECT * FROM user_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn mark_completed(pool: &PgPool, id: Uuid, pdf_path: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE user_submissions
        SET generated_pdf_path = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(pdf_path)
    .bind(SubmissionStatus::Completed.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_failed(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE user_submissions SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(SubmissionStatus::Failed.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

fn map_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("A submission with this email already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
