use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;

/// Server settings loaded from server.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Name shown on system chat lines.
    pub bot_name: String,
    /// Directory served under /static.
    pub static_dir: String,
    /// Capacity of the lobby's command and event channels.
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bot_name: "ChatBoot".to_string(),
            static_dir: "static".to_string(),
            event_buffer: 256,
        }
    }
}

/// Resolves a path relative to the config directory.
fn config_path(sub: &str) -> PathBuf {
    let base = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    Path::new(&base).join(sub)
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Initialize config directory with defaults if missing.
pub fn init() -> Result<(), ConfigError> {
    let base = config_path("");
    if !base.exists() {
        fs::create_dir_all(&base).map_err(|e| io_error(&base, e))?;
    }

    let server_path = config_path("server.json");
    if !server_path.exists() {
        write_default(&server_path)?;
        tracing::info!("Wrote default config to {}", server_path.display());
    }

    Ok(())
}

fn write_default(path: &Path) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(&ServerConfig::default()).map_err(|source| {
        ConfigError::Parse {
            path: path.display().to_string(),
            source,
        }
    })?;
    fs::write(path, data).map_err(|e| io_error(path, e))
}

/// Load the server configuration.
pub fn load_server_config() -> Result<ServerConfig, ConfigError> {
    read_server_config(&config_path("server.json"))
}

fn read_server_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    parse_server_config(&data).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn parse_server_config(data: &str) -> Result<ServerConfig, serde_json::Error> {
    serde_json::from_str(data)
}

/// Port to listen on, from `PORT` or the default.
pub fn listen_port() -> Result<u16, ConfigError> {
    parse_port(std::env::var("PORT").ok().as_deref())
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw.to_string())),
    }
}
