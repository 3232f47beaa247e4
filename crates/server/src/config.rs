//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port the API listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the model artifact bundle
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Allowed CORS origins: `*` or a comma-separated list
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_port() -> u16 {
    8000
}

fn default_artifact_dir() -> String {
    "./model".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ML_SERVER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            port: default_port(),
            artifact_dir: default_artifact_dir(),
            cors_origins: default_cors_origins(),
        }))
    }
}
