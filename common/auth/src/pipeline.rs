//! Ordered middleware composition for protected routes.
//!
//! Stage order is fixed by construction: logging wraps token verification,
//! which wraps the access gate, which wraps the handler. The gate can only
//! be requested on a pipeline that has already been given a verifier.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::access::AccessLevel;
use crate::error::AuthError;
use crate::extractors::VerifiedClaims;
use crate::guards::ensure_access_level;
use crate::verifier::TokenVerifier;

/// Marker: no token verification configured.
pub struct Open;

/// Marker: bearer tokens are verified before the inner stages run.
pub struct Verified {
    verifier: Arc<TokenVerifier>,
    required: Option<AccessLevel>,
}

pub struct RequestPipeline<S, Stage = Open> {
    routes: Router<S>,
    stage: Stage,
    _state: PhantomData<fn() -> S>,
}

impl<S> RequestPipeline<S, Open>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(routes: Router<S>) -> Self {
        Self {
            routes,
            stage: Open,
            _state: PhantomData,
        }
    }

    pub fn verify_tokens(self, verifier: Arc<TokenVerifier>) -> RequestPipeline<S, Verified> {
        RequestPipeline {
            routes: self.routes,
            stage: Verified {
                verifier,
                required: None,
            },
            _state: PhantomData,
        }
    }

    /// Logging only.
    pub fn build(self) -> Router<S> {
        self.routes.layer(middleware::from_fn(log_requests))
    }
}

impl<S> RequestPipeline<S, Verified>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn require_admin(self) -> Self {
        self.require_level(AccessLevel::ADMIN)
    }

    pub fn require_level(mut self, level: AccessLevel) -> Self {
        self.stage.required = Some(level);
        self
    }

    pub fn build(self) -> Router<S> {
        let Verified { verifier, required } = self.stage;
        let mut routes = self.routes;

        // Each route_layer wraps the previous one, so the gate goes on first.
        if let Some(required) = required {
            routes = routes.route_layer(middleware::from_fn_with_state(required, gate_access));
        }
        routes
            .route_layer(middleware::from_fn_with_state(verifier, verify_bearer))
            .layer(middleware::from_fn(log_requests))
    }
}

/// Records method, path, status and elapsed time around the inner chain.
/// Never alters the response.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let remote_addr = remote_addr(&req);
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        %remote_addr,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

async fn verify_bearer(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Response {
    match verifier.verify_header(req.headers().get(AUTHORIZATION)) {
        Ok(claims) => {
            req.extensions_mut().insert(VerifiedClaims::new(claims));
            next.run(req).await
        }
        Err(err) => reject(&req, err),
    }
}

async fn gate_access(State(required): State<AccessLevel>, req: Request, next: Next) -> Response {
    let claims = req.extensions().get::<VerifiedClaims>().map(VerifiedClaims::claims);
    let decision = ensure_access_level(claims, required).map(|_| ());
    match decision {
        Ok(()) => next.run(req).await,
        Err(err) => reject(&req, err),
    }
}

fn reject(req: &Request, err: AuthError) -> Response {
    warn!(
        reason = err.reason_code(),
        detail = %err,
        method = %req.method(),
        path = %req.uri().path(),
        remote_addr = %remote_addr(req),
        at = %Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "request rejected by auth pipeline"
    );
    err.into_response()
}

fn remote_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
