use crate::logger::{LogConfig, LogFormat};
use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Secret shipped in `settings/dev.toml`. Refused in `prod`.
pub const DEV_SIGNING_SECRET: &str = "turnstile-dev-signing-secret-change-me";

const MIN_PROD_SECRET_LEN: usize = 32;

/// Access tokens are short-lived; anything past a day is a misconfiguration.
pub const MAX_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub env: Env,
    pub auth: Auth,
    pub http: Http,
    #[serde(default)]
    pub log: Log,
    pub store: Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Local,
    Dev,
    Prod,
}

#[derive(Deserialize)]
pub struct Auth {
    #[serde(default)]
    pub signing_secret: String,
    pub access_ttl_secs: u64,
    pub store_timeout_ms: u64,
    pub entropy_timeout_ms: u64,
}

impl Auth {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn entropy_timeout(&self) -> Duration {
        Duration::from_millis(self.entropy_timeout_ms)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("signing_secret", &"**redacted**")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("entropy_timeout_ms", &self.entropy_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    /// Deadline for a whole request, store calls and hashing included.
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Http {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
    pub format: Option<LogFormat>,
}

impl Log {
    pub fn effective_filter(&self, env: Env) -> String {
        match (&self.filter, env) {
            (Some(filter), _) => filter.clone(),
            (None, Env::Local | Env::Dev) => "debug".to_string(),
            (None, Env::Prod) => "info".to_string(),
        }
    }

    /// Text on a workstation, JSON wherever logs are shipped.
    pub fn effective_format(&self, env: Env) -> LogFormat {
        match (self.format, env) {
            (Some(format), _) => format,
            (None, Env::Local) => LogFormat::Text,
            (None, Env::Dev | Env::Prod) => LogFormat::Json,
        }
    }

    pub fn config(&self, env: Env) -> LogConfig {
        LogConfig {
            filter: self.effective_filter(env),
            format: self.effective_format(env),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    pub redis_dsn: Option<String>,
    pub key_prefix: String,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let secret = &self.auth.signing_secret;
        if secret.is_empty() {
            bail!("auth.signing_secret is empty; set TURNSTILE__AUTH__SIGNING_SECRET");
        }
        if self.env == Env::Prod {
            if secret == DEV_SIGNING_SECRET {
                bail!("auth.signing_secret is the development default");
            }
            if secret.len() < MIN_PROD_SECRET_LEN {
                bail!(
                    "auth.signing_secret must be at least {} bytes in prod",
                    MIN_PROD_SECRET_LEN
                );
            }
        }
        if self.auth.access_ttl_secs == 0 {
            bail!("auth.access_ttl_secs must be positive");
        }
        if self.auth.access_ttl_secs > MAX_ACCESS_TTL_SECS {
            bail!(
                "auth.access_ttl_secs must not exceed {} seconds",
                MAX_ACCESS_TTL_SECS
            );
        }
        if self.http.timeout_ms == 0 {
            bail!("http.timeout_ms must be positive");
        }
        if self.auth.store_timeout_ms == 0 || self.auth.entropy_timeout_ms == 0 {
            bail!("auth timeouts must be positive");
        }
        if self.store.backend == "redis" && self.store.redis_dsn.is_none() {
            bail!("store.redis_dsn is required for the redis backend");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// File settings, overridden by `TURNSTILE__SECTION__KEY` environment variables.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("TURNSTILE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
