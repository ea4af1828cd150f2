use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use common_auth::JwtConfig;

use crate::tokens::TokenConfig;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 72 * 60 * 60;
pub const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookieSameSite::Lax => "Lax",
            CookieSameSite::Strict => "Strict",
            CookieSameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshCookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub ttl_seconds: i64,
}

impl Default for RefreshCookieConfig {
    fn default() -> Self {
        Self {
            name: "refresh_token".to_string(),
            secure: true,
            same_site: CookieSameSite::Strict,
            ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
        }
    }
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"***redacted***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_leeway_seconds: u32,
    pub access_ttl_seconds: i64,
    pub refresh_cookie: RefreshCookieConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServiceConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_issuer.clone(), self.jwt_audience.clone())
            .with_leeway(self.jwt_leeway_seconds)
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
            access_ttl_seconds: self.access_ttl_seconds,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = parse_from_env::<u16>("PORT")?.unwrap_or(5050);

    let private_key_path = env::var("AUTH_PRIVATE_KEY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./private_key.pem"));
    let public_key_path = env::var("AUTH_PUBLIC_KEY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./public_key.pem"));

    let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "storefront".to_string());
    let jwt_audience = env::var("JWT_AUDIENCE").unwrap_or_else(|_| "storefront-api".to_string());
    let jwt_leeway_seconds = parse_from_env::<u32>("JWT_LEEWAY_SECONDS")?.unwrap_or(0);
    let access_ttl_seconds = validate_ttl(
        "AUTH_ACCESS_TTL_SECONDS",
        parse_from_env::<i64>("AUTH_ACCESS_TTL_SECONDS")?.unwrap_or(DEFAULT_ACCESS_TTL_SECONDS),
    )?;

    let defaults = RefreshCookieConfig::default();
    let refresh_cookie = RefreshCookieConfig {
        name: env::var("AUTH_REFRESH_COOKIE_NAME")
            .ok()
            .and_then(|value| normalize_optional(&value))
            .unwrap_or(defaults.name),
        secure: bool_from_env("AUTH_REFRESH_COOKIE_SECURE").unwrap_or(defaults.secure),
        same_site: env::var("AUTH_REFRESH_COOKIE_SAMESITE")
            .ok()
            .map(|value| parse_same_site(&value))
            .transpose()
            .context("Failed to parse AUTH_REFRESH_COOKIE_SAMESITE")?
            .unwrap_or(defaults.same_site),
        ttl_seconds: validate_ttl(
            "AUTH_REFRESH_TTL_SECONDS",
            parse_from_env::<i64>("AUTH_REFRESH_TTL_SECONDS")?.unwrap_or(defaults.ttl_seconds),
        )?,
    };

    let bootstrap_admin = match (
        env::var("AUTH_BOOTSTRAP_ADMIN_EMAIL").ok().and_then(|v| normalize_optional(&v)),
        env::var("AUTH_BOOTSTRAP_ADMIN_PASSWORD").ok().and_then(|v| normalize_optional(&v)),
    ) {
        (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
        (None, None) => None,
        _ => {
            return Err(anyhow!(
                "AUTH_BOOTSTRAP_ADMIN_EMAIL and AUTH_BOOTSTRAP_ADMIN_PASSWORD must be set together"
            ))
        }
    };

    Ok(ServiceConfig {
        host,
        port,
        private_key_path,
        public_key_path,
        jwt_issuer,
        jwt_audience,
        jwt_leeway_seconds,
        access_ttl_seconds,
        refresh_cookie,
        bootstrap_admin,
    })
}

fn parse_from_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("Invalid {key} '{value}': {err}")),
        Err(_) => Ok(None),
    }
}

fn validate_ttl(key: &str, seconds: i64) -> Result<i64> {
    if !(1..=MAX_TTL_SECONDS).contains(&seconds) {
        return Err(anyhow!(
            "{key} must be between 1 and {MAX_TTL_SECONDS} seconds, got {seconds}"
        ));
    }
    Ok(seconds)
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_same_site(value: &str) -> Result<CookieSameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(CookieSameSite::Lax),
        "strict" => Ok(CookieSameSite::Strict),
        "none" => Ok(CookieSameSite::None),
        other => Err(anyhow!(
            "Unsupported cookie same-site policy '{other}'. Use Lax, Strict, or None."
        )),
    }
}
