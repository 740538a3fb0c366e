//! Environment-driven application configuration.
//!
//! Required variables abort startup with a descriptive error naming every
//! missing one. Database pool tuning may additionally come from an optional
//! `config.toml` (path via `CONFIG_PATH`).

use std::{env, fmt, str::FromStr};

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;

const REQUIRED_ENV_VARS: &[&str] = &["DATABASE_URL", "APP_ENV", "PORT"];

static CURRENT_ENV: OnceCell<RunEnv> = OnceCell::new();

/// Runtime mode, from `APP_ENV`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnv {
    Development,
    Production,
    Test,
}

impl RunEnv {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn is_test(self) -> bool {
        self == Self::Test
    }

    /// Record the active runtime mode once at startup. Later calls are
    /// ignored, so tests may pin the mode before the server boots.
    pub fn init(mode: RunEnv) {
        let _ = CURRENT_ENV.set(mode);
    }

    /// The mode recorded by [`RunEnv::init`], falling back to `APP_ENV`
    /// and then to development.
    pub fn current() -> RunEnv {
        *CURRENT_ENV.get_or_init(|| {
            env::var("APP_ENV")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RunEnv::Development)
        })
    }
}

impl FromStr for RunEnv {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(anyhow!(
                "APP_ENV must be one of development, production, test (got {other:?})"
            )),
        }
    }
}

impl fmt::Display for RunEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: RunEnv,
    pub port: u16,
    pub api_version: String,
    pub log_level: String,
    /// Origins allowed by CORS when running in production.
    pub allowed_origins: Vec<String>,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            sqlx_logging: false,
        }
    }
}

impl AppConfig {
    /// Read and validate configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|name| env::var(name).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect();
        for name in &missing {
            eprintln!("Warning: environment variable {name} is not set");
        }
        if !missing.is_empty() {
            return Err(anyhow!(
                "missing required environment variables: {}",
                missing.join(", ")
            ));
        }

        let env_mode: RunEnv = env::var("APP_ENV")?.parse()?;
        let port = env::var("PORT")?
            .trim()
            .parse::<u16>()
            .map_err(|_| anyhow!("PORT must be a number in 0..=65535"))?;

        let mut database = load_pool_tuning().unwrap_or_default();
        database.url = env::var("DATABASE_URL")?;
        database.validate()?;

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if env_mode.is_production() && allowed_origins.is_empty() {
            eprintln!(
                "Warning: ALLOWED_ORIGINS is empty; cross-origin requests will be rejected"
            );
        }

        Ok(Self {
            env: env_mode,
            port,
            api_version: env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            allowed_origins,
            database,
        })
    }
}

impl DatabaseConfig {
    /// Minimal config for tools and tests that only need `DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = load_pool_tuning().unwrap_or_default();
        cfg.url = env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL is not set"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!(
                "database url is empty; provide the DATABASE_URL environment variable"
            ));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!(
                "database url must start with postgresql:// or postgres://"
            ));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

/// Optional `[database]` pool tuning from `CONFIG_PATH` / `config.toml`.
/// The URL itself always comes from the environment.
fn load_pool_tuning() -> Option<DatabaseConfig> {
    #[derive(Deserialize, Default)]
    struct FileConfig {
        #[serde(default)]
        database: Option<DatabaseConfig>,
    }

    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str::<FileConfig>(&content).ok()?.database
}
