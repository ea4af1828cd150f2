use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuthError, AuthResult};

/// The only signing algorithm this service issues or accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Process-wide RSA keypair. Built once at startup and shared read-only
/// behind an `Arc`; there is no mutation API.
pub struct KeyMaterial {
    signing: Option<EncodingKey>,
    verifying: DecodingKey,
}

impl KeyMaterial {
    /// Read both PEM files. Any missing, unreadable, non-RSA or mismatched key
    /// is a configuration error.
    pub fn load(private_path: impl AsRef<Path>, public_path: impl AsRef<Path>) -> AuthResult<Self> {
        let private_pem = read_pem(private_path.as_ref(), "private")?;
        let public_pem = read_pem(public_path.as_ref(), "public")?;
        let keys = Self::from_pem(&private_pem, &public_pem)?;
        info!(
            private_key = %private_path.as_ref().display(),
            public_key = %public_path.as_ref().display(),
            "loaded signing key material"
        );
        Ok(keys)
    }

    /// Read only the public key, for processes that verify but never issue.
    pub fn load_public(public_path: impl AsRef<Path>) -> AuthResult<Self> {
        let public_pem = read_pem(public_path.as_ref(), "public")?;
        Self::verification_only(&public_pem)
    }

    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> AuthResult<Self> {
        let signing = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|err| AuthError::Configuration(format!("failed to parse private key: {err}")))?;
        let verifying = parse_public(public_pem)?;
        ensure_pair(&signing, &verifying)?;
        Ok(Self {
            signing: Some(signing),
            verifying,
        })
    }

    pub fn verification_only(public_pem: &[u8]) -> AuthResult<Self> {
        Ok(Self {
            signing: None,
            verifying: parse_public(public_pem)?,
        })
    }

    pub fn signing_key(&self) -> Option<&EncodingKey> {
        self.signing.as_ref()
    }

    pub fn verifying_key(&self) -> &DecodingKey {
        &self.verifying
    }

    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("can_sign", &self.can_sign())
            .field("keys", &"***redacted***")
            .finish()
    }
}

fn read_pem(path: &Path, kind: &str) -> AuthResult<Vec<u8>> {
    fs::read(path).map_err(|err| {
        AuthError::Configuration(format!("failed to read {kind} key at {}: {err}", path.display()))
    })
}

fn parse_public(pem: &[u8]) -> AuthResult<DecodingKey> {
    DecodingKey::from_rsa_pem(pem)
        .map_err(|err| AuthError::Configuration(format!("failed to parse public key: {err}")))
}

#[derive(Serialize, Deserialize)]
struct Probe {
    sub: String,
    exp: i64,
}

// Sign and verify a throwaway token so a swapped or mismatched pair fails at
// startup instead of on the first login.
fn ensure_pair(signing: &EncodingKey, verifying: &DecodingKey) -> AuthResult<()> {
    let probe = Probe {
        sub: "key-probe".to_string(),
        exp: (Utc::now() + Duration::minutes(1)).timestamp(),
    };
    let token = encode(&Header::new(SIGNING_ALGORITHM), &probe, signing)
        .map_err(|err| AuthError::Configuration(format!("private key cannot sign: {err}")))?;

    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.validate_aud = false;
    decode::<Probe>(&token, verifying, &validation)
        .map(|_| ())
        .map_err(|err| {
            AuthError::Configuration(format!("public key does not match private key: {err}"))
        })
}
