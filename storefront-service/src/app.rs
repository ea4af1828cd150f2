use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use common_auth::{RequestPipeline, TokenVerifier};
use common_http_errors::ApiError;
use tracing::error;

use crate::admin_handlers::{delete_user, get_user, list_users};
use crate::config::ServiceConfig;
use crate::credentials::{CredentialHasher, CredentialStore};
use crate::metrics::{http_error_metrics, AuthMetrics};
use crate::tokens::TokenSigner;
use crate::user_handlers::{login_user, register_user, whoami};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub hasher: Arc<CredentialHasher>,
    pub verifier: Arc<TokenVerifier>,
    pub token_signer: Arc<TokenSigner>,
    pub config: Arc<ServiceConfig>,
    pub metrics: Arc<AuthMetrics>,
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            ApiError::internal().into_response()
        }
    }
}

/// Public routes log only; member routes require any valid token; admin
/// routes additionally require an admin-equivalent access level.
pub fn build_router(state: AppState) -> Router {
    let public = RequestPipeline::new(
        Router::new()
            .route("/api/register", post(register_user))
            .route("/api/login", post(login_user)),
    )
    .build();

    let members = RequestPipeline::new(Router::new().route("/api/me", get(whoami)))
        .verify_tokens(state.verifier.clone())
        .build();

    let admin = RequestPipeline::new(
        Router::new()
            .route("/api/admin/users/:id", get(get_user).delete(delete_user))
            .route("/api/admin/listusers/:limit/:page", get(list_users)),
    )
    .verify_tokens(state.verifier.clone())
    .require_admin()
    .build();

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .merge(public)
        .merge(members)
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            http_error_metrics,
        ))
        .with_state(state)
}
