use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use axum::http::HeaderValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use common_auth::{AccessLevel, AuthError, AuthResult, KeyMaterial, SIGNING_ALGORITHM};
use jsonwebtoken::{encode, Header};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use tracing::debug;

use crate::config::RefreshCookieConfig;

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_seconds: i64,
}

/// Mints RS256 access tokens with the process's private key.
#[derive(Clone)]
pub struct TokenSigner {
    keys: Arc<KeyMaterial>,
    config: TokenConfig,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
    pub token_type: &'static str,
}

#[derive(Serialize)]
struct AccessClaims<'a> {
    sub: &'a str,
    iss: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
    access_level: u8,
}

impl TokenSigner {
    pub fn new(keys: Arc<KeyMaterial>, config: TokenConfig) -> Self {
        Self { keys, config }
    }

    pub fn issue(&self, subject: &str, level: AccessLevel) -> AuthResult<IssuedToken> {
        self.issue_at(subject, level, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        level: AccessLevel,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedToken> {
        let signing_key = self
            .keys
            .signing_key()
            .ok_or_else(|| AuthError::Signing("no private key loaded".to_string()))?;

        let expires_at = Duration::try_seconds(self.config.access_ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::Signing(format!(
                    "access ttl of {}s is out of range",
                    self.config.access_ttl_seconds
                ))
            })?;
        let claims = AccessClaims {
            sub: subject,
            iss: &self.config.issuer,
            aud: &self.config.audience,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            access_level: level.value(),
        };

        let access_token = encode(&Header::new(SIGNING_ALGORITHM), &claims, signing_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        debug!(subject, access_level = %level, expires_at = %expires_at, "issued access token");
        Ok(IssuedToken {
            access_token,
            expires_at,
            expires_in: self.config.access_ttl_seconds,
            token_type: "Bearer",
        })
    }
}

/// 32 bytes from the OS RNG, URL-safe base64 without padding.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn refresh_cookie(
    config: &RefreshCookieConfig,
    value: &str,
    now: DateTime<Utc>,
) -> Result<HeaderValue> {
    if config.ttl_seconds <= 0 {
        return Err(anyhow!("refresh cookie ttl must be positive, got {}", config.ttl_seconds));
    }
    let expires = Duration::try_seconds(config.ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| anyhow!("refresh cookie ttl of {}s is out of range", config.ttl_seconds))?;
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; Expires={}; HttpOnly",
        config.name,
        value,
        config.ttl_seconds,
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; SameSite=");
    cookie.push_str(config.same_site.as_str());
    HeaderValue::from_str(&cookie).context("refresh cookie is not a valid header value")
}
