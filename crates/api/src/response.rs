//! JSON response envelope.
//!
//! Every endpoint answers with
//! `{ "success": bool, "message": string, "data": T | null, "errors": [...] }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A field-level error reported in `errors[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Vec<FieldError>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with data.
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, "OK", Some(data))
    }

    /// 201 with the created resource.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            errors: Vec::new(),
            status,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl ApiResponse<()> {
    /// 200 without data.
    pub fn done(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }

    /// Failure envelope used by [`crate::error::ApiError`].
    pub fn failure(status: StatusCode, message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok(json!({"id": 1}))).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "OK", "data": {"id": 1}, "errors": []})
        );
    }

    #[test]
    fn test_done_has_null_data() {
        let response = ApiResponse::done("Logged out");
        assert_eq!(response.status, StatusCode::OK);
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(body["message"], "Logged out");
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created(json!({"id": 2}), "Company created");
        assert_eq!(response.into_response().status(), StatusCode::CREATED);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let response = ApiResponse::failure(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            vec![FieldError::new("name", "Name must not be blank")],
        );
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(response.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
