/*
 * Responsibility
 * - Load environment variables (user pool, region, client id, required role, ...)
 * - Validate them (startup fails when something required is missing)
 * - Derive the expected issuer from the user-pool components
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REQUIRED_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// How token signatures are checked before claims are trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureMode {
    /// Claims are decoded without any signature check.
    Skip,
    /// Signatures are checked against a JWKS document on disk.
    Jwks { path: PathBuf },
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub user_pool_id: String,
    pub region: String,
    // Expected `aud` of id tokens; access tokens are never checked against it.
    pub client_id: Option<String>,
    pub required_role: String,
    pub signature_mode: SignatureMode,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let user_pool_id = required(&lookup, "USER_POOL_ID")?;
        let region = required(&lookup, "REGION")?;

        let client_id = lookup("CLIENT_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let required_role = lookup("REQUIRED_ROLE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_REQUIRED_ROLE.to_string());

        let signature_mode = match lookup("SIGNATURE_VERIFICATION")
            .unwrap_or_else(|| "skip".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "skip" | "none" => SignatureMode::Skip,
            "jwks" => SignatureMode::Jwks {
                path: PathBuf::from(required(&lookup, "JWKS_PATH")?),
            },
            _ => return Err(ConfigError::Invalid("SIGNATURE_VERIFICATION")),
        };

        let request_timeout =
            Duration::from_secs(parsed_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);

        let request_body_limit_bytes = parsed_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 64 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            user_pool_id,
            region,
            client_id,
            required_role,
            signature_mode,
            request_timeout,
            request_body_limit_bytes,
        })
    }

    /// `https://cognito-idp.{region}.amazonaws.com/{user_pool_id}`
    pub fn expected_issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(key))
}

// Unset falls back to `default`; set but unparsable is an error.
fn parsed_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
