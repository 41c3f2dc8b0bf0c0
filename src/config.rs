use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CalcError;

/// Runtime settings shared by the server and the terminal front end.
///
/// Values come from three layers, later ones winning: built-in defaults, an
/// optional JSON file, then `CALCWEB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend the client sends calculations to
    pub base_url: String,

    /// Maximum number of entries kept in the calculation history
    pub history_capacity: usize,

    /// Interface the server binds to
    pub bind_host: String,

    /// First port the server tries
    pub start_port: u16,

    /// How many consecutive ports are probed before giving up
    pub max_port_attempts: u16,

    /// Pause between two port probes
    pub port_retry_delay_ms: u64,

    /// Directory mounted under `/static`
    pub static_dir: PathBuf,

    /// Per-request timeout for the HTTP client
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:8000".to_string(),
            history_capacity: 10,
            bind_host: "0.0.0.0".to_string(),
            start_port: 8000,
            max_port_attempts: 100,
            port_retry_delay_ms: 1000,
            static_dir: PathBuf::from("static"),
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Read a JSON config file. Keys missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CalcError> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&str>) -> Result<Self, CalcError> {
        let mut config = match path {
            Some(p) => Config::from_file(p)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `CALCWEB_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), CalcError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CALCWEB_BASE_URL") {
            self.base_url = url;
        }
        if let Some(cap) = lookup("CALCWEB_HISTORY") {
            self.history_capacity = cap
                .trim()
                .parse()
                .map_err(|_| CalcError::Config(format!("CALCWEB_HISTORY='{}'", cap)))?;
        }
        if let Some(host) = lookup("CALCWEB_HOST") {
            self.bind_host = host;
        }
        if let Some(port) = lookup("CALCWEB_PORT") {
            self.start_port = port
                .trim()
                .parse()
                .map_err(|_| CalcError::Config(format!("CALCWEB_PORT='{}'", port)))?;
        }
        if let Some(dir) = lookup("CALCWEB_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        if self.history_capacity == 0 {
            return Err(CalcError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_port_attempts == 0 {
            return Err(CalcError::Config(
                "max_port_attempts must be at least 1".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(CalcError::Config("base_url is empty".to_string()));
        }
        Ok(())
    }
}
