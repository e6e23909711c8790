//! Process configuration read from the environment.
//!
//! | Variable                    | Default        |
//! |-----------------------------|----------------|
//! | `DB_HOST`                   | required       |
//! | `DB_USER`                   | required       |
//! | `DB_PASSWORD`               | required       |
//! | `DB_DATABASE`               | required       |
//! | `DB_PORT`                   | `5432`         |
//! | `DB_SCHEMA`                 | `public`       |
//! | `DB_POOL_SIZE`              | `8`            |
//! | `DB_CONNECT_TIMEOUT_SECS`   | `10`           |
//! | `DB_STATEMENT_TIMEOUT_SECS` | `30` (0 = off) |
//! | `API_HOST`                  | `0.0.0.0`      |
//! | `API_PORT`                  | `4000`         |
//! | `UPLOAD_DIR`                | `./uploads`    |
//! | `MAX_UPLOAD_BYTES`          | 50 MiB         |
//! | `LOG_DIR`                   | platform data dir |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::GatewayError;
use crate::logging;
use crate::models::{ConnectionConfig, ConnectionOptions};
use crate::services::uploads::DEFAULT_MAX_UPLOAD_BYTES;

/// Default HTTP port.
pub const DEFAULT_API_PORT: u16 = 4000;

/// Everything the gateway needs to start.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Database connection settings (no password).
    pub connection: ConnectionConfig,
    /// Database password.
    pub password: String,
    /// Listen address.
    pub api_host: String,
    /// Listen port.
    pub api_port: u16,
    /// Directory for uploaded files.
    pub upload_dir: PathBuf,
    /// Upload size cap in bytes.
    pub max_upload_bytes: u64,
    /// Directory for log files.
    pub log_dir: PathBuf,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("connection", &self.connection)
            .field("password", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("api_port", &self.api_port)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl GatewayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    /// Values are trimmed, except `DB_PASSWORD`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| GatewayError::config(format!("{key} must be set")))
        };

        let defaults = ConnectionOptions::default();
        let statement_timeout: u32 = parse_or(
            &get,
            "DB_STATEMENT_TIMEOUT_SECS",
            defaults.statement_timeout_secs.unwrap_or(0),
        )?;

        let connection = ConnectionConfig {
            host: required("DB_HOST")?,
            port: parse_or(&get, "DB_PORT", 5432)?,
            database: required("DB_DATABASE")?,
            username: required("DB_USER")?,
            schema: get("DB_SCHEMA").unwrap_or_else(|| "public".to_string()),
            options: ConnectionOptions {
                connect_timeout_secs: parse_or(
                    &get,
                    "DB_CONNECT_TIMEOUT_SECS",
                    defaults.connect_timeout_secs,
                )?,
                statement_timeout_secs: (statement_timeout > 0).then_some(statement_timeout),
                pool_size: parse_or(&get, "DB_POOL_SIZE", defaults.pool_size)?,
                application_name: defaults.application_name,
            },
        };
        connection.validate().map_err(GatewayError::config)?;

        let config = Self {
            connection,
            // Whitespace is part of the secret
            password: lookup("DB_PASSWORD")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| GatewayError::config("DB_PASSWORD must be set"))?,
            api_host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&get, "API_PORT", DEFAULT_API_PORT)?,
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| "./uploads".into()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or_else(logging::log_dir),
        };

        if config.max_upload_bytes == 0 {
            return Err(GatewayError::config("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        Ok(config)
    }

    /// `host:port` the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, GatewayError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| GatewayError::config(format!("{key} has an invalid value: {raw:?}"))),
    }
}
