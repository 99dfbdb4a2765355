//! Server configuration.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `SYNC_KEY` is unset or empty.
    #[error("SYNC_KEY must be set to a non-empty shared secret")]
    MissingSecret,

    /// `ROWSYNC_BIND` is not a valid socket address.
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

/// Configuration for the sync endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Shared secret every request must present.
    pub sync_key: String,
    /// Table used when a request names none.
    pub default_table: String,
    /// Schema used when a request names none.
    pub default_schema: String,
}

impl ServerConfig {
    /// Creates a configuration with the given secret and the standard
    /// defaults (bind `127.0.0.1:8080`, table `items`, schema `public`).
    pub fn new(sync_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            sync_key: sync_key.into(),
            default_table: "items".to_string(),
            default_schema: "public".to_string(),
        }
    }

    /// Sets the bind address.
    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the default table.
    #[must_use]
    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = table.into();
        self
    }

    /// Sets the default schema.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Loads configuration from the environment.
    ///
    /// `SYNC_KEY` is required; `ROWSYNC_BIND`, `ROWSYNC_TABLE` and
    /// `ROWSYNC_SCHEMA` override the defaults when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when `SYNC_KEY` is unset or
    /// empty, [`ConfigError::InvalidBindAddr`] when `ROWSYNC_BIND` does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let sync_key = std::env::var("SYNC_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let mut config = Self::new(sync_key);

        if let Ok(bind) = std::env::var("ROWSYNC_BIND") {
            config.bind_addr = bind
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(bind))?;
        }
        if let Ok(table) = std::env::var("ROWSYNC_TABLE") {
            config.default_table = table;
        }
        if let Ok(schema) = std::env::var("ROWSYNC_SCHEMA") {
            config.default_schema = schema;
        }

        Ok(config)
    }
}
