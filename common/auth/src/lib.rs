pub mod access;
pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod keys;
pub mod pipeline;
pub mod verifier;

#[cfg(test)]
mod test_keys;

pub use access::AccessLevel;
pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult};
pub use extractors::{AuthContext, VerifiedClaims};
pub use guards::{ensure_access_level, require_admin};
pub use keys::{KeyMaterial, SIGNING_ALGORITHM};
pub use pipeline::{log_requests, Open, RequestPipeline, Verified};
pub use verifier::TokenVerifier;
