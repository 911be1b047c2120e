//! Configuration management
//! This module handles the loading and parsing of configuration files
//! and environment variables for the application.
//! Usage:
//! ```rust
//! use mailtext::config::Settings;
//! // fn main() {
//! //     let cfg = Settings::new().expect("config");
//! //     println!("{:?}", cfg.server.port);
//! // }
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::{env, fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub batch: BatchSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl ServerSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    /// Column read when an upload does not name one.
    pub default_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

const DEFAULT_CONFIG: &str = include_str!("../Config.toml");

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Same layering as [`Settings::new`], with `path` replacing the file
    /// looked up next to the executable.
    pub fn with_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Built-in defaults only, ignoring files and the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. built-in default config
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // 2. external config file, explicit or next to the executable
        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Ok(exe_path) = env::current_exe() {
                    if let Some(dir) = exe_path.parent() {
                        let external = dir.join("Config.toml");
                        if fs::metadata(&external).is_ok() {
                            builder = builder.add_source(File::from(external).required(false));
                        }
                    }
                }
            }
        }

        // 3. environment variables, e.g. APP__SERVER__PORT=8080
        builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
