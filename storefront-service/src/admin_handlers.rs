use axum::{
    extract::{Path, State},
    Json,
};
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use tracing::{error, info};

use crate::credentials::{CredentialRecord, StoreError};
use crate::user_handlers::MessageResponse;
use crate::AppState;

fn parse_user_id(raw: &str) -> ApiResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::bad_request("invalid_user_id", "invalid user id")),
    }
}

fn store_failure(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("user_not_found", "user id does not exist"),
        other => {
            error!(error = %other, "credential store failure");
            ApiError::internal()
        }
    }
}

fn parse_positive(raw: &str, code: &'static str, message: &'static str) -> ApiResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ApiError::bad_request(code, message)),
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub message: String,
    pub users: Vec<CredentialRecord>,
}

/// `GET /api/admin/listusers/:limit/:page`, pages numbered from 1.
pub async fn list_users(
    State(state): State<AppState>,
    Path((raw_limit, raw_page)): Path<(String, String)>,
) -> ApiResult<Json<UserPage>> {
    let limit = parse_positive(&raw_limit, "invalid_limit", "invalid limit")?;
    let page = parse_positive(&raw_page, "invalid_page", "invalid page number")?;
    let offset = (page - 1).saturating_mul(limit);

    let users = state.store.list(limit, offset).await.map_err(store_failure)?;
    info!(limit, page, returned = users.len(), "users listed");
    Ok(Json(UserPage {
        message: "request successful".to_string(),
        users,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<CredentialRecord>> {
    let id = parse_user_id(&raw_id)?;
    let record = state.store.get(id).await.map_err(store_failure)?;
    Ok(Json(record))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_user_id(&raw_id)?;
    state.store.delete(id).await.map_err(store_failure)?;

    info!(user_id = id, deleted_by = %auth.subject(), "user deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "user deleted successfully".to_string(),
    }))
}
