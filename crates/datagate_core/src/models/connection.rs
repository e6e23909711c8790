//! Connection configuration and pool status models.

use serde::{Deserialize, Serialize};

/// Additional connection options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Connection timeout in seconds
    pub connect_timeout_secs: u32,
    /// Statement timeout in seconds (None = no timeout)
    pub statement_timeout_secs: Option<u32>,
    /// Maximum number of pooled connections
    pub pool_size: usize,
    /// Application name sent to PostgreSQL
    pub application_name: String,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            statement_timeout_secs: Some(30),
            pool_size: 8,
            application_name: "datagate".to_string(),
        }
    }
}

/// Configuration for the gateway's database connection.
///
/// The password is passed separately to the pool and never stored here, so this
/// struct is safe to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    pub host: String,
    /// Server port (default 5432)
    pub port: u16,
    /// Database name (1-63 chars)
    pub database: String,
    /// Login username
    pub username: String,
    /// Schema whose tables are exposed (default "public")
    pub schema: String,
    /// Additional options
    pub options: ConnectionOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration with required fields.
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 5432,
            database: database.into(),
            username: username.into(),
            schema: "public".to_string(),
            options: ConnectionOptions::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host is required".to_string());
        }
        if self.database.is_empty() || self.database.len() > 63 {
            return Err("Database name must be 1-63 characters".to_string());
        }
        if self.username.is_empty() {
            return Err("Username is required".to_string());
        }
        if self.schema.is_empty() {
            return Err("Schema is required".to_string());
        }
        if self.options.pool_size == 0 {
            return Err("Pool size must be at least 1".to_string());
        }
        Ok(())
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!("postgresql://{}@{}:{}/{}", self.username, self.host, self.port, self.database)
    }

    /// Startup options passed to every pooled connection.
    pub fn startup_options(&self) -> Option<String> {
        self.options
            .statement_timeout_secs
            .filter(|secs| *secs > 0)
            .map(|secs| format!("-c statement_timeout={}", u64::from(secs) * 1000))
    }
}

/// Connection pool status.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStatus {
    /// Maximum pool capacity
    pub max_size: usize,
    /// Current connections (idle + active)
    pub size: usize,
    /// Idle connections (can be negative during contention)
    pub available: isize,
    /// Tasks waiting for connections
    pub waiting: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new("localhost", "portal", "portal_ro");
        assert_eq!(config.port, 5432);
        assert_eq!(config.schema, "public");
        assert!(config.validate().is_ok());
        assert_eq!(config.display_url(), "postgresql://portal_ro@localhost:5432/portal");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut config = ConnectionConfig::new("", "portal", "user");
        assert!(config.validate().is_err());

        config.host = "db".to_string();
        config.database = "x".repeat(64);
        assert!(config.validate().is_err());

        config.database = "portal".to_string();
        config.options.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_startup_options_statement_timeout() {
        let mut config = ConnectionConfig::new("db", "portal", "user");
        assert_eq!(config.startup_options().as_deref(), Some("-c statement_timeout=30000"));

        config.options.statement_timeout_secs = Some(0);
        assert_eq!(config.startup_options(), None);

        config.options.statement_timeout_secs = None;
        assert_eq!(config.startup_options(), None);
    }
}
