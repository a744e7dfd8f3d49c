use std::{env, fmt};

use crate::{error::ConfigError, models::SeedUser};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_API_ROOT: &str = "/api";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/api/auth";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers and the gate read it through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the log output format.
    pub env: Env,
    // Shared HS256 key used to sign and verify every credential.
    pub jwt_secret: SigningSecret,
    pub port: u16,
    // Every path under this root is protected unless it falls under a public prefix.
    pub api_root: String,
    pub public_prefixes: Vec<String>,
    // Accounts loaded into the in-memory user directory at startup.
    pub seed_users: Vec<SeedUser>,
}

/// Env
///
/// Defines the runtime context: pretty logs for local work, JSON logs in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// SigningSecret
///
/// A non-empty signing key. The only way to obtain one is through `SigningSecret::new`,
/// so holding a value proves the startup check already ran.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Never print key material, even in debug logs.
impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(**redacted**)")
    }
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup, so tests need not touch
    /// the process environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: SigningSecret("super-secure-test-secret-value-local".to_string()),
            port: DEFAULT_PORT,
            api_root: DEFAULT_API_ROOT.to_string(),
            public_prefixes: vec![DEFAULT_PUBLIC_PREFIX.to_string()],
            seed_users: Vec::new(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Fails fast: a missing or
    /// blank `JWT_SECRET` is an error in every environment, there is no fallback key.
    pub fn load() -> Result<Self, ConfigError> {
        // 1. Runtime environment
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        // 2. Signing secret
        // Mandatory everywhere. `SigningSecret::new` rejects blank values.
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let jwt_secret = SigningSecret::new(jwt_secret)?;

        // 3. Listener port
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        // 4. Route classification
        // Fixed for the life of the process; the gate never re-reads it.
        let api_root = env::var("API_ROOT")
            .ok()
            .map(|root| root.trim().to_string())
            .filter(|root| !root.is_empty())
            .unwrap_or_else(|| DEFAULT_API_ROOT.to_string());

        let public_prefixes = match env::var("PUBLIC_ROUTE_PREFIXES") {
            Ok(raw) => parse_prefix_list(&raw),
            Err(_) => vec![DEFAULT_PUBLIC_PREFIX.to_string()],
        };

        // 5. Seed accounts for the in-memory user directory
        let seed_users = match env::var("AUTH_USERS") {
            Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
            _ => Vec::new(),
        };

        Ok(Self {
            env,
            jwt_secret,
            port,
            api_root,
            public_prefixes,
            seed_users,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}
