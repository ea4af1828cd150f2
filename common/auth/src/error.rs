use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way the auth layer can refuse. The `Display` text is operator detail
/// for logs; clients only ever see the generic envelope from `ApiError`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("key configuration error: {0}")]
    Configuration(String),
    #[error("authorization header missing")]
    MissingHeader,
    #[error("authorization header malformed")]
    MalformedHeader,
    #[error("token signature invalid: {0}")]
    InvalidSignature(String),
    #[error("token expired")]
    Expired,
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("access level {level:?} does not satisfy required level {required}")]
    InsufficientPrivilege { level: Option<u8>, required: u8 },
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Stable reason code recorded in logs and the `X-Error-Code` header.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "key_configuration",
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::InvalidClaim(_, _) => "invalid_claim",
            AuthError::InsufficientPrivilege { .. } => "insufficient_privilege",
            AuthError::Signing(_) => "signing_error",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidSignature(value.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        let code = value.reason_code();
        match value {
            AuthError::MissingHeader => ApiError::Unauthorized {
                code,
                message: "missing authorization header",
            },
            AuthError::MalformedHeader => ApiError::Unauthorized {
                code,
                message: "invalid authorization header",
            },
            AuthError::InvalidSignature(_) | AuthError::Expired | AuthError::InvalidClaim(_, _) => {
                ApiError::Unauthorized {
                    code,
                    message: "not authorized",
                }
            }
            AuthError::InsufficientPrivilege { .. } => ApiError::Forbidden {
                code,
                message: "admin access required",
            },
            AuthError::Configuration(_) | AuthError::Signing(_) => ApiError::Internal { code },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
