use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// When unset the server runs against the in-memory store.
    pub database_url: Option<String>,
    pub bind_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
