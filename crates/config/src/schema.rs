use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ConfigError;

pub const CURRENT_CONFIG_VERSION: &str = "v1";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    pub host: String,
    pub port: u16,
    /// Falls back to a SQLite file in the asset directory when unset.
    #[serde(alias = "databaseUrl")]
    pub database_url: Option<String>,
    #[serde(alias = "maxDbConnections")]
    pub max_db_connections: u32,
    #[serde(alias = "pollIntervalSecs")]
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        if self.host.trim().is_empty() {
            self.host = DEFAULT_HOST.to_string();
        }
        if matches!(self.database_url.as_deref(), Some(url) if url.trim().is_empty()) {
            self.database_url = None;
        }
        if self.max_db_connections == 0 {
            tracing::warn!("max_db_connections must be at least 1, resetting to default");
            self.max_db_connections = DEFAULT_MAX_DB_CONNECTIONS;
        }
        if self.poll_interval_secs == 0 {
            tracing::warn!("poll_interval_secs must be at least 1, resetting to default");
            self.poll_interval_secs = DEFAULT_POLL_INTERVAL_SECS;
        }
        self
    }

    /// Applies `HOST`, `BACKEND_PORT` (or `PORT`), `DATABASE_URL`,
    /// `BOARD_MAX_DB_CONNECTIONS` and `BOARD_POLL_INTERVAL_SECS` on top of the file.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("BACKEND_PORT").or_else(|| lookup("PORT")) {
            self.port = parse_number("port", &port)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(max) = lookup("BOARD_MAX_DB_CONNECTIONS") {
            self.max_db_connections = parse_number("BOARD_MAX_DB_CONNECTIONS", &max)?;
        }
        if let Some(secs) = lookup("BOARD_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_number("BOARD_POLL_INTERVAL_SECS", &secs)?;
        }
        Ok(self.normalized())
    }
}

/// What the server publishes to clients at `GET /api/info`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
pub struct ServerInfo {
    pub version: String,
    /// How often clients should poll a board they have open.
    pub poll_interval_secs: u64,
}

impl ServerInfo {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl From<&Config> for ServerInfo {
    fn from(config: &Config) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            poll_interval_secs: config.poll_interval_secs,
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::ValidationError(format!("{name} is not a valid number: {raw}")))
}
