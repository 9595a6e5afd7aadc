//! Runtime configuration read from the environment (and `.env` when present).

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL. Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 10,
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port) => port.parse::<u16>().with_context(|| format!("invalid PORT: {}", port))?,
            None => defaults.port,
        };
        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n
                .parse::<u32>()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS: {}", n))?,
            None => defaults.database_max_connections,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections,
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
