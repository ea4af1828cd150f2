#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common_auth::{AccessLevel, JwtConfig, KeyMaterial, TokenVerifier};
use once_cell::sync::Lazy;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::Value;
use storefront_service::config::{RefreshCookieConfig, ServiceConfig};
use storefront_service::credentials::{
    CredentialHasher, CredentialStore, InMemoryCredentialStore, NewCredential,
};
use storefront_service::metrics::AuthMetrics;
use storefront_service::tokens::TokenSigner;
use storefront_service::{build_router, AppState};
use tower::ServiceExt;

pub const ISSUER: &str = "storefront-test";
pub const AUDIENCE: &str = "storefront-test-api";

pub const CUSTOMER_EMAIL: &str = "a@b.com";
pub const CUSTOMER_PASSWORD: &str = "correct";
pub const ADMIN_EMAIL: &str = "admin@b.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";

pub struct Pems {
    pub private_pem: String,
    pub public_pem: String,
}

pub static PEMS: Lazy<Pems> = Lazy::new(|| {
    let mut rng = rand_core::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    Pems {
        private_pem: private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("private pem")
            .to_string(),
        public_pem: private_key
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("public pem"),
    }
});

pub fn keys() -> Arc<KeyMaterial> {
    Arc::new(
        KeyMaterial::from_pem(PEMS.private_pem.as_bytes(), PEMS.public_pem.as_bytes())
            .expect("key material"),
    )
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        private_key_path: PathBuf::from("unused"),
        public_key_path: PathBuf::from("unused"),
        jwt_issuer: ISSUER.to_string(),
        jwt_audience: AUDIENCE.to_string(),
        jwt_leeway_seconds: 0,
        access_ttl_seconds: 3600,
        refresh_cookie: RefreshCookieConfig::default(),
        bootstrap_admin: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub customer_id: u64,
    pub admin_id: u64,
}

pub async fn spawn_app() -> TestApp {
    let config = Arc::new(test_config());
    let keys = keys();
    let hasher = Arc::new(CredentialHasher::new().expect("hasher"));
    let store = InMemoryCredentialStore::new();

    let customer = store
        .insert(NewCredential {
            username: "shopper".into(),
            email: CUSTOMER_EMAIL.into(),
            password_hash: hasher.hash(CUSTOMER_PASSWORD).expect("hash"),
            access_level: AccessLevel::CUSTOMER,
        })
        .await
        .expect("seed customer");
    let admin = store
        .insert(NewCredential {
            username: "admin".into(),
            email: ADMIN_EMAIL.into(),
            password_hash: hasher.hash(ADMIN_PASSWORD).expect("hash"),
            access_level: AccessLevel::SUPER_ADMIN,
        })
        .await
        .expect("seed admin");

    let state = AppState {
        store: Arc::new(store) as Arc<dyn CredentialStore>,
        hasher,
        verifier: Arc::new(TokenVerifier::new(config.jwt_config(), keys.clone())),
        token_signer: Arc::new(TokenSigner::new(keys, config.token_config())),
        config,
        metrics: Arc::new(AuthMetrics::new().expect("metrics")),
    };

    TestApp {
        router: build_router(state.clone()),
        state,
        customer_id: customer.id,
        admin_id: admin.id,
    }
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(JwtConfig::new(ISSUER, AUDIENCE), keys())
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        let request = Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn get_with_token(&self, path: &str, token: Option<&str>) -> Response {
        let mut builder = Request::get(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).expect("request")).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/api/login",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
