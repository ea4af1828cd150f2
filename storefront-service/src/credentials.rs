use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_auth::AccessLevel;
use rand_core::OsRng;
use serde::Serialize;
use thiserror::Error;

// argon2id, 12 MiB / 3 passes / 1 lane.
const MEMORY_COST_KIB: u32 = 12 * 1024;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("invalid hashing parameters: {0}")]
    Params(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Salted one-way password digests in PHC string format.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new() -> Result<Self, CredentialError> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .map_err(|err| CredentialError::Params(err.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Fresh random salt per call, so equal passwords never share a digest.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        if plaintext.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }

        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hash(err.to_string()))
    }

    /// Recompute with the salt and cost embedded in `digest`. Malformed
    /// digests are a mismatch, not an error.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// `hash` on the blocking pool, keeping argon2 off the async workers.
    pub async fn spawn_hash(&self, plaintext: String) -> Result<String, CredentialError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|err| CredentialError::Hash(err.to_string()))?
    }

    /// `verify` on the blocking pool. A task that fails to complete is a mismatch.
    pub async fn spawn_verify(&self, plaintext: String, digest: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub access_level: AccessLevel,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential not found")]
    NotFound,
    #[error("email '{0}' already registered")]
    Duplicate(String),
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Storage seam for user credentials. The login flow only needs
/// `hash_for`; the rest backs registration and the admin routes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn hash_for(&self, email: &str) -> Result<CredentialRecord, StoreError>;
    async fn insert(&self, credential: NewCredential) -> Result<CredentialRecord, StoreError>;
    async fn get(&self, id: u64) -> Result<CredentialRecord, StoreError>;
    async fn delete(&self, id: u64) -> Result<(), StoreError>;
    /// Records ordered by id; an offset past the end yields an empty page.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<CredentialRecord>, StoreError>;
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    records: BTreeMap<u64, CredentialRecord>,
    by_email: HashMap<String, u64>,
}

#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn hash_for(&self, email: &str) -> Result<CredentialRecord, StoreError> {
        let guard = self.inner.read().map_err(poisoned)?;
        guard
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| guard.records.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, credential: NewCredential) -> Result<CredentialRecord, StoreError> {
        let email = normalize_email(&credential.email);
        let mut guard = self.inner.write().map_err(poisoned)?;
        if guard.by_email.contains_key(&email) {
            return Err(StoreError::Duplicate(email));
        }

        guard.next_id += 1;
        let id = guard.next_id;
        let now = Utc::now();
        let record = CredentialRecord {
            id,
            username: credential.username,
            email: email.clone(),
            password_hash: credential.password_hash,
            access_level: credential.access_level,
            created_at: now,
            updated_at: now,
        };
        guard.by_email.insert(email, id);
        guard.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: u64) -> Result<CredentialRecord, StoreError> {
        let guard = self.inner.read().map_err(poisoned)?;
        guard.records.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let record = guard.records.remove(&id).ok_or(StoreError::NotFound)?;
        guard.by_email.remove(&record.email);
        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<CredentialRecord>, StoreError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard
            .records
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
