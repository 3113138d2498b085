use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use domain::models::TransitionError;
use domain::services::{MissingCredentials, SyncWindowError};
use persistence::db::{is_foreign_key_violation, is_unique_violation};
use persistence::external::ExternalDbError;
use shared::crypto::CryptoError;
use shared::jwt::JwtError;
use shared::password::PasswordError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::response::{ApiResponse, FieldError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Validation failure with per-field details.
    #[error("Validation error: {} field(s) invalid", .0.len())]
    InvalidFields(Vec<FieldError>),

    /// Carries the number of seconds until the client may retry.
    #[error("Rate limited")]
    RateLimited(u64),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A company database could not be reached or rejected the operation.
    #[error("Bad gateway: {0}")]
    BadGateway(String),
}

impl ApiError {
    /// A single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidFields(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) | ApiError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            ApiError::RateLimited(secs) => Some(*secs),
            _ => None,
        };

        let (message, errors) = match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg) => (msg, Vec::new()),
            ApiError::Validation(msg) => (msg, Vec::new()),
            ApiError::InvalidFields(errors) => {
                let message = match errors.as_slice() {
                    [single] => single.message.clone(),
                    _ => format!("{} validation errors", errors.len()),
                };
                (message, errors)
            }
            ApiError::RateLimited(_) => (
                "Too many requests. Please try again later.".to_string(),
                Vec::new(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), Vec::new())
            }
        };

        let mut response = ApiResponse::failure(status, message, errors).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return ApiError::Conflict("Resource already exists".into());
        }
        if is_foreign_key_violation(&err) {
            return ApiError::Conflict(
                "Operation conflicts with related records (missing reference or record in use)"
                    .into(),
            );
        }
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database is busy, try again".into())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_field_errors("", &errors, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::InvalidFields(details)
    }
}

/// Flattens nested validation errors into `parent.child` field paths.
fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", path, e.code));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::Conflict(err.to_string())
    }
}

impl From<SyncWindowError> for ApiError {
    fn from(err: SyncWindowError) -> Self {
        ApiError::field(err.field(), err.to_string())
    }
}

impl From<MissingCredentials> for ApiError {
    fn from(err: MissingCredentials) -> Self {
        ApiError::field("credentials", err.to_string())
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(format!("Credential encryption error: {}", err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password error: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::Unauthorized("Session has expired".into()),
            JwtError::EncodingError(_) | JwtError::InvalidKey(_) => {
                ApiError::Internal(format!("Token error: {}", err))
            }
            _ => ApiError::Unauthorized("Invalid or expired token".into()),
        }
    }
}

impl From<ExternalDbError> for ApiError {
    fn from(err: ExternalDbError) -> Self {
        match err {
            ExternalDbError::Timeout(_) => ApiError::ServiceUnavailable(format!(
                "Company database did not respond: {}",
                err
            )),
            _ => ApiError::BadGateway(format!("Company database error: {}", err)),
        }
    }
}
