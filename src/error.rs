use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::validation::ValidationIssue, config::Environment, response::ApiResponse};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid or missing input field.")]
    Validation(Vec<ValidationIssue>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Duplicate field: {}. These field values must be unique.", .fields.join(","))]
    Duplicate { fields: Vec<String> },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let field = db_err
                    .constraint()
                    .map(constraint_field)
                    .unwrap_or_else(|| "unknown".to_string());
                return AppError::Duplicate { fields: vec![field] };
            }
        }
        AppError::Internal(anyhow::Error::new(err).context("database error"))
    }
}

/// `users_email_key` -> `email`
fn constraint_field(constraint: &str) -> String {
    let trimmed = constraint
        .strip_prefix("users_")
        .unwrap_or(constraint)
        .trim_end_matches("_key")
        .trim_end_matches("_idx");
    trimmed.to_string()
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_envelope(self, env: Environment) -> ApiResponse {
        let status = self.status();
        match self {
            Self::Validation(issues) => {
                ApiResponse::new(false, status, "Invalid or missing input field.", None).with_data(issues)
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                match env {
                    Environment::Development => ApiResponse::new(
                        false,
                        status,
                        e.to_string(),
                        Some(json!({ "error": format!("{e:?}") })),
                    ),
                    Environment::Production => {
                        ApiResponse::new(false, status, "Internal server error.", None)
                    }
                }
            }
            other => {
                let message = other.to_string();
                ApiResponse::new(false, status, message, None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_envelope(Environment::current()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
