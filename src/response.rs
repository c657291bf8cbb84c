use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Uniform JSON envelope returned by every route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn new(success: bool, status: StatusCode, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success,
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(true, StatusCode::OK, message, None)
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self::new(true, StatusCode::CREATED, message, None)
    }

    /// Attaches a payload. Serialization failures degrade to `null`.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        self.data = match serde_json::to_value(data) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(error = %e, "response payload serialization failed");
                None
            }
        };
        self
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_camel_case_keys() {
        let body = serde_json::to_value(ApiResponse::created("done")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["message"], "done");
        assert!(body["data"].is_null());
    }

    #[test]
    fn http_status_follows_envelope() {
        let res = ApiResponse::new(false, StatusCode::CONFLICT, "taken", None).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
