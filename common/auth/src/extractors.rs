use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::verifier::TokenVerifier;

/// Claims attached to a request by the verification stage. Only this crate
/// can construct one, so anything found in the extensions has passed
/// signature and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(Claims);

impl VerifiedClaims {
    pub(crate) fn new(claims: Claims) -> Self {
        Self(claims)
    }

    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

/// Handler-facing view of the verified caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl AuthContext {
    pub fn subject(&self) -> &str {
        &self.claims.subject
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(verified) = parts.extensions.get::<VerifiedClaims>() {
            return Ok(Self {
                claims: verified.claims().clone(),
            });
        }

        // Route mounted outside a verified pipeline; check the header here.
        let verifier = Arc::<TokenVerifier>::from_ref(state);
        let claims = verifier.verify_header(parts.headers.get(AUTHORIZATION))?;
        Ok(Self { claims })
    }
}

/// Accept exactly `Bearer <token>`: one scheme word, one token, nothing else.
pub(crate) fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    if raw.trim().is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token.to_owned()),
        _ => Err(AuthError::MalformedHeader),
    }
}
