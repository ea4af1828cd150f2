use std::sync::Arc;

use chrono::Utc;
use common_auth::{JwtConfig, KeyMaterial, TokenVerifier, SIGNING_ALGORITHM};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use serde_json::json;

pub const ISSUER: &str = "test-issuer";
pub const AUDIENCE: &str = "test-audience";

pub struct Pems {
    pub private_pem: String,
    pub public_pem: String,
}

static PEMS: Lazy<Pems> = Lazy::new(|| {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    Pems {
        private_pem: private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem")
            .to_string(),
        public_pem: private_key
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("public pem"),
    }
});

pub fn verifier() -> Arc<TokenVerifier> {
    let keys = KeyMaterial::verification_only(PEMS.public_pem.as_bytes()).expect("public key");
    Arc::new(TokenVerifier::new(JwtConfig::new(ISSUER, AUDIENCE), Arc::new(keys)))
}

pub fn token(subject: &str, access_level: u8, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": subject,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + ttl_seconds,
        "access_level": access_level,
    });
    let key = EncodingKey::from_rsa_pem(PEMS.private_pem.as_bytes()).expect("encoding key");
    encode(&Header::new(SIGNING_ALGORITHM), &claims, &key).expect("sign token")
}
