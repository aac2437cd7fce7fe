use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;

mod metrics;

pub use metrics::{gather, http_error_metrics_layer};

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub code: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound { code: &'static str },
    MethodNotAllowed,
    Unprocessable { code: &'static str, message: Option<String> },
    Unauthorized { code: &'static str, message: String },
    Forbidden { code: &'static str, message: String },
    Internal { message: Option<String> },
}

impl ApiError {
    pub fn not_found() -> Self { Self::NotFound { code: "not_found" } }
    pub fn method_not_allowed() -> Self { Self::MethodNotAllowed }
    pub fn unprocessable() -> Self { Self::Unprocessable { code: "unprocessable", message: None } }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: Some(e.to_string()) } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound { code }
            | ApiError::Unprocessable { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. } => code,
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.status(), self.code())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        // Internal details stay in the logs; clients get the generic message.
        let message = match self {
            ApiError::NotFound { .. } => "resource not found".to_string(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Unprocessable { message, .. } => message.unwrap_or_else(|| "unprocessable".to_string()),
            ApiError::Unauthorized { message, .. } | ApiError::Forbidden { message, .. } => message,
            ApiError::Internal { .. } => "internal server error".to_string(),
        };
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
            code: Some(error_code.to_string()),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
