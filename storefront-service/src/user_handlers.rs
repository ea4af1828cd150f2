use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use common_auth::{AccessLevel, AuthContext};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::credentials::{NewCredential, StoreError};
use crate::tokens::{generate_refresh_token, refresh_cookie};
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let invalid = || ApiError::bad_request("invalid_registration", "invalid data, please check again");

    let Json(request) = payload.map_err(|_| invalid())?;
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();
    if username.is_empty() || email.is_empty() || !email.contains('@') || request.password.is_empty() {
        state.metrics.registration("invalid");
        return Err(invalid());
    }

    let password_hash = state.hasher.spawn_hash(request.password).await.map_err(|err| {
        error!(error = %err, "failed to hash password");
        state.metrics.registration("error");
        ApiError::internal()
    })?;

    let record = state
        .store
        .insert(NewCredential {
            username,
            email,
            password_hash,
            access_level: AccessLevel::CUSTOMER,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate(_) => {
                state.metrics.registration("duplicate");
                ApiError::conflict("duplicate_account", "could not create account")
            }
            other => {
                error!(error = %other, "failed to store credential");
                state.metrics.registration("error");
                ApiError::internal()
            }
        })?;

    state.metrics.registration("created");
    info!(user_id = record.id, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "account created successfully".to_string(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub access_token_expires_at: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized {
        code: "invalid_credentials",
        message: "invalid credentials",
    }
}

pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let missing = || ApiError::bad_request("invalid_login", "bad request, all fields are required");

    let Json(LoginRequest { email, password }) = payload.map_err(|_| missing())?;
    if email.trim().is_empty() || password.is_empty() {
        state.metrics.login_attempt("invalid_request");
        return Err(missing());
    }

    let record = match state.store.hash_for(&email).await {
        Ok(record) => record,
        Err(StoreError::NotFound) => {
            state.metrics.login_attempt("unknown_email");
            return Err(invalid_credentials());
        }
        Err(err) => {
            error!(error = %err, "credential lookup failed");
            state.metrics.login_attempt("error");
            return Err(ApiError::internal());
        }
    };

    if !state
        .hasher
        .spawn_verify(password, record.password_hash.clone())
        .await
    {
        warn!(user_id = record.id, "password mismatch");
        state.metrics.login_attempt("bad_password");
        return Err(invalid_credentials());
    }

    let issued = state
        .token_signer
        .issue(&record.id.to_string(), record.access_level)
        .map_err(|err| {
            error!(user_id = record.id, error = %err, "failed to issue access token");
            state.metrics.login_attempt("error");
            ApiError::from(err)
        })?;

    let cookie = refresh_cookie(&state.config.refresh_cookie, &generate_refresh_token(), Utc::now())
        .map_err(|err| {
            error!(error = %err, "failed to build refresh cookie");
            ApiError::internal()
        })?;

    state.metrics.login_attempt("success");
    info!(user_id = record.id, access_level = %record.access_level, "login succeeded");

    let body = LoginResponse {
        access_token: issued.access_token,
        token_type: issued.token_type.to_string(),
        expires_in: issued.expires_in,
        access_token_expires_at: issued.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    let mut response = (StatusCode::OK, Json(body)).into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmI {
    pub subject: String,
    pub access_level: AccessLevel,
    pub is_admin: bool,
    pub expires_at: String,
}

pub async fn whoami(auth: AuthContext) -> Json<WhoAmI> {
    let claims = auth.into_claims();
    Json(WhoAmI {
        is_admin: claims.is_admin(),
        expires_at: claims.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        subject: claims.subject,
        access_level: claims.access_level,
    })
}
