//! Configuration module for the namedb server.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line interface for namedb
#[derive(Parser, Debug)]
#[command(name = "namedb")]
#[command(author = "namedb authors")]
#[command(version = "0.1.0")]
#[command(about = "A networked name-set server with a line-delimited text protocol", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the server, accepting TCP connections
    Serve(ServeArgs),
    /// Connect to a running server and issue commands interactively
    Client(ClientArgs),
}

/// Command-line arguments for the server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:5000)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Path to the database file (one name per line)
    #[arg(long)]
    pub db_file: Option<PathBuf>,

    /// Path to the append-only audit log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads (defaults to number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the interactive client
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Address of the server to connect to
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    pub server: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Number of worker threads
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            workers: None,
        }
    }
}

/// Storage-related configuration
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Database file holding the persisted set, one name per line
    #[serde(default = "default_db_file")]
    pub db_file: PathBuf,
    /// Append-only audit log file
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
            log_file: default_log_file(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_db_file() -> PathBuf {
    PathBuf::from("database.txt")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub db_file: PathBuf,
    pub log_file: PathBuf,
    pub workers: Option<usize>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load(args: &ServeArgs) -> Result<Self, ConfigError> {
        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = args.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        // Merge CLI args with TOML config (CLI takes precedence)
        Ok(Config {
            listen: args.listen.clone().unwrap_or(toml_config.server.listen),
            db_file: args.db_file.clone().unwrap_or(toml_config.storage.db_file),
            log_file: args
                .log_file
                .clone()
                .unwrap_or(toml_config.storage.log_file),
            workers: args.workers.or(toml_config.server.workers),
            log_level: if args.log_level != "info" {
                args.log_level.clone()
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
