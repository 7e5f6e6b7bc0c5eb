use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// When false every request runs as the anonymous actor and no token is checked.
    pub required: bool,
    pub jwt_secret: Option<String>,
    pub token_expiry_minutes: i64,
    pub bcrypt_cost: u32,
    /// Whether `POST /auth/register` may create agents. Unset means only when
    /// authentication is disabled.
    pub allow_agent_registration: Option<bool>,
}

impl AuthConfig {
    /// Returns the signing secret if one is configured and non-blank.
    pub fn signing_secret(&self) -> Option<&str> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn agent_registration_allowed(&self) -> bool {
        self.allow_agent_registration.unwrap_or(!self.required)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    pub allow_origins: String,
    pub max_age: u32,
}

impl CorsConfig {
    pub fn origins(&self) -> Option<Vec<String>> {
        if self.allow_origins.trim() == "*" {
            return None;
        }
        Some(
            self.allow_origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults(Config::builder())?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_AUTH__JWT_SECRET=...` would set `Settings.auth.jwt_secret`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// In-memory database, cheap password hashing and a fixed signing secret.
    /// Environment variables are not consulted.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?
            .set_override("environment", "test")?
            .set_override("database.url", "sqlite::memory:")?
            .set_override("database.max_connections", 1)?
            .set_override("auth.jwt_secret", "test-secret-key")?
            .set_override("auth.bcrypt_cost", 4)?
            .set_override("auth.allow_agent_registration", true)?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.url", "sqlite://app.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("auth.required", true)?
            .set_default("auth.token_expiry_minutes", 60)?
            .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
            .set_default("cors.allow_origins", "*")?
            .set_default("cors.max_age", 3600)
    }

    /// Rejects configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.required && self.auth.signing_secret().is_none() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set when auth.required is true".into(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::Message("server.workers must be at least 1".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.auth.token_expiry_minutes <= 0 {
            return Err(ConfigError::Message(
                "auth.token_expiry_minutes must be positive".into(),
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Message(
                "auth.bcrypt_cost must be between 4 and 31".into(),
            ));
        }
        Ok(())
    }
}
