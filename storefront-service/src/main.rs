use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use common_auth::{AccessLevel, KeyMaterial, TokenVerifier};
use storefront_service::config::{load_service_config, ServiceConfig};
use storefront_service::credentials::{
    CredentialHasher, CredentialStore, InMemoryCredentialStore, NewCredential,
};
use storefront_service::metrics::AuthMetrics;
use storefront_service::tokens::TokenSigner;
use storefront_service::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn seed_admin(
    config: &ServiceConfig,
    store: &dyn CredentialStore,
    hasher: &CredentialHasher,
) -> Result<()> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };

    let password_hash = hasher
        .hash(&admin.password)
        .context("Failed to hash bootstrap admin password")?;
    let record = store
        .insert(NewCredential {
            username: "admin".to_string(),
            email: admin.email.clone(),
            password_hash,
            access_level: AccessLevel::SUPER_ADMIN,
        })
        .await
        .context("Failed to seed bootstrap admin")?;
    info!(user_id = record.id, email = %record.email, "seeded bootstrap admin");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Arc::new(load_service_config()?);
    let keys = Arc::new(
        KeyMaterial::load(&config.private_key_path, &config.public_key_path)
            .context("Failed to load signing keys")?,
    );

    let verifier = Arc::new(TokenVerifier::new(config.jwt_config(), keys.clone()));
    let token_signer = Arc::new(TokenSigner::new(keys, config.token_config()));
    let hasher = Arc::new(CredentialHasher::new().context("Failed to configure password hashing")?);
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    seed_admin(&config, store.as_ref(), &hasher).await?;

    let state = AppState {
        store,
        hasher,
        verifier,
        token_signer,
        config: config.clone(),
        metrics: Arc::new(AuthMetrics::new()?),
    };

    let app = build_router(state);
    let addr = config.socket_addr()?;
    info!(%addr, issuer = %config.jwt_issuer, "starting storefront-service");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
