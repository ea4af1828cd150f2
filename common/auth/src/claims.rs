use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::access::AccessLevel;
use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified JWT claims.
///
/// Only `TokenVerifier` builds these from untrusted input, and only after the
/// signature and expiry checks pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Claims {
    pub subject: String,
    pub access_level: AccessLevel,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub issuer: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.access_level.is_admin()
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    access_level: u8,
}

impl Claims {
    /// Decode a payload whose signature has already been checked.
    pub(crate) fn from_payload(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value)
            .map_err(|err| AuthError::InvalidClaim("payload", err.to_string()))?;
        Self::from_repr(repr)
    }

    fn from_repr(value: ClaimsRepr) -> AuthResult<Self> {
        if value.sub.trim().is_empty() {
            return Err(AuthError::InvalidClaim("sub", value.sub));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;
        let issued_at = Utc
            .timestamp_opt(value.iat, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("iat", value.iat.to_string()))?;

        Ok(Self {
            subject: value.sub,
            access_level: AccessLevel::new(value.access_level),
            expires_at,
            issued_at,
            issuer: value.iss,
        })
    }
}
