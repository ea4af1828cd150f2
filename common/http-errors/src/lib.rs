use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Wire shape of every error response: a single generic `error` string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    Unauthorized { code: &'static str, message: &'static str },
    Forbidden { code: &'static str, message: &'static str },
    NotFound { code: &'static str, message: String },
    Conflict { code: &'static str, message: String },
    Internal { code: &'static str },
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self { Self::BadRequest { code, message: message.into() } }
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self { Self::NotFound { code, message: message.into() } }
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self { Self::Conflict { code, message: message.into() } }
    pub fn internal() -> Self { Self::Internal { code: "internal_error" } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. }
            | ApiError::Internal { code } => code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let error = match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized { message, .. } => message.to_string(),
            ApiError::Forbidden { message, .. } => message.to_string(),
            ApiError::NotFound { message, .. } => message,
            ApiError::Conflict { message, .. } => message,
            // Internal detail stays in the logs.
            ApiError::Internal { .. } => "internal server error".to_string(),
        };
        let mut resp = (status, Json(ErrorBody { error })).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
