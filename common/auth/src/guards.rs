use crate::access::AccessLevel;
use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// Allow only callers whose verified level is at least as privileged as
/// `required`. Absent claims are a privilege failure, not an authentication
/// failure: by the time a gate runs, verification has already happened.
pub fn ensure_access_level(claims: Option<&Claims>, required: AccessLevel) -> AuthResult<&Claims> {
    match claims {
        Some(claims) if claims.access_level.satisfies(required) => Ok(claims),
        Some(claims) => Err(AuthError::InsufficientPrivilege {
            level: Some(claims.access_level.value()),
            required: required.value(),
        }),
        None => Err(AuthError::InsufficientPrivilege {
            level: None,
            required: required.value(),
        }),
    }
}

pub fn require_admin(claims: Option<&Claims>) -> AuthResult<&Claims> {
    ensure_access_level(claims, AccessLevel::ADMIN)
}
