use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    pub reference_path: PathBuf,
    pub admin: Option<AdminCredentials>,
    pub login_attempts: u32,
    pub login_window: Duration,
}

/// Account created at startup if its username is free.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = var("TRADEPOST_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("TRADEPOST_LISTEN_ADDR", "must be a valid socket address")
            })?;

        let db_path = var("TRADEPOST_DB_PATH")
            .unwrap_or_else(|| "./tradepost.redb".to_string())
            .into();

        let reference_path = var("TRADEPOST_REFERENCE_PATH")
            .unwrap_or_else(|| "reference.json".to_string())
            .into();

        let admin = match (
            var("TRADEPOST_ADMIN_USERNAME").filter(|s| !s.is_empty()),
            var("TRADEPOST_ADMIN_PASSWORD").filter(|s| !s.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TRADEPOST_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("TRADEPOST_ADMIN_USERNAME")),
        };

        let login_attempts = match var("TRADEPOST_LOGIN_ATTEMPTS") {
            Some(s) => s.parse::<u32>().ok().filter(|n| *n > 0).ok_or(ConfigError::Invalid(
                "TRADEPOST_LOGIN_ATTEMPTS",
                "must be a positive integer",
            ))?,
            None => 10,
        };

        Ok(Config {
            listen_addr,
            db_path,
            reference_path,
            admin,
            login_attempts,
            login_window: Duration::from_secs(60),
        })
    }

    /// Create a test configuration.
    pub fn for_testing() -> Self {
        Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_path: PathBuf::from("/tmp/tradepost-test.redb"),
            reference_path: PathBuf::from("reference.json"),
            admin: None,
            login_attempts: 10,
            login_window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
