//! Throwaway RSA keypairs shared by the unit tests. Generation is slow, so
//! each pair is minted once per test binary.
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use serde_json::json;
use std::sync::Arc;

use crate::keys::{KeyMaterial, SIGNING_ALGORITHM};

pub(crate) struct TestPair {
    pub private_pem: String,
    pub public_pem: String,
}

fn generate() -> TestPair {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("private pem")
        .to_string();
    let public_pem = private_key
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("public pem");
    TestPair {
        private_pem,
        public_pem,
    }
}

static PRIMARY: Lazy<TestPair> = Lazy::new(generate);
static OTHER: Lazy<TestPair> = Lazy::new(generate);

pub(crate) fn primary_pair() -> &'static TestPair {
    &PRIMARY
}

pub(crate) fn other_pair() -> &'static TestPair {
    &OTHER
}

pub(crate) fn primary_keys() -> Arc<KeyMaterial> {
    let pair = primary_pair();
    Arc::new(
        KeyMaterial::from_pem(pair.private_pem.as_bytes(), pair.public_pem.as_bytes())
            .expect("key material"),
    )
}

pub(crate) const ISSUER: &str = "test-issuer";
pub(crate) const AUDIENCE: &str = "test-audience";

/// Sign an arbitrary claim window with the primary private key.
pub(crate) fn mint(subject: &str, access_level: u8, iat: i64, exp: i64) -> String {
    mint_with(&primary_pair().private_pem, subject, access_level, iat, exp)
}

pub(crate) fn mint_with(private_pem: &str, subject: &str, access_level: u8, iat: i64, exp: i64) -> String {
    let claims = json!({
        "sub": subject,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": iat,
        "exp": exp,
        "access_level": access_level,
    });
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");
    encode(&Header::new(SIGNING_ALGORITHM), &claims, &key).expect("sign token")
}
