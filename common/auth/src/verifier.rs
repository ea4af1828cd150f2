use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::Utc;
use jsonwebtoken::{decode, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::extractors::parse_bearer;
use crate::keys::{KeyMaterial, SIGNING_ALGORITHM};

/// Validates bearer tokens against the process's public key. Holds no
/// mutable state, so one instance is shared by every request.
#[derive(Clone, Debug)]
pub struct TokenVerifier {
    config: JwtConfig,
    keys: Arc<KeyMaterial>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: JwtConfig, keys: Arc<KeyMaterial>) -> Self {
        // Only RS256 is listed, so HS256/none tokens fail before any key is used.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.set_audience(&[config.audience.clone()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = config.leeway_seconds.into();

        Self {
            config,
            keys,
            validation,
        }
    }

    /// Resolve a raw `Authorization` header into verified claims.
    pub fn verify_header(&self, header: Option<&HeaderValue>) -> AuthResult<Claims> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let token = parse_bearer(header)?;
        self.verify(&token)
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let token_data = decode::<Value>(token, self.keys.verifying_key(), &self.validation)?;
        let claims = Claims::from_payload(token_data.claims)?;

        // jsonwebtoken still accepts exp == now; expiry is exclusive here.
        if claims.expires_at.timestamp() + i64::from(self.config.leeway_seconds) <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        debug!(subject = %claims.subject, access_level = %claims.access_level, "verified JWT successfully");
        Ok(claims)
    }
}
