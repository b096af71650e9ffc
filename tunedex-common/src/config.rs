//! Configuration loading and setting resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument or `TUNEDEX_*` environment variable (both arrive through clap)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default directory scanned and served when nothing else is configured
pub const DEFAULT_MUSIC_DIR: &str = ".";

/// Default SQLite catalog file
pub const DEFAULT_DATABASE: &str = "media.db";

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 12345;

/// Public URL prefix the scanned tree is served under
pub const DEFAULT_STATIC_PREFIX: &str = "/static/";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every key is optional; a missing key falls through to the compiled default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub music_dir: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Maximum number of files processed in parallel during a scan
    pub concurrency: Option<usize>,
    pub static_prefix: Option<String>,
    /// Follow symbolic links while scanning
    pub follow_links: Option<bool>,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    ///
    /// Fails with [`Error::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file the service should use
    ///
    /// An explicitly requested file must exist. Without one, the platform default location is
    /// tried and a missing file degrades to defaults. The caller logs the returned
    /// [`ConfigSource`] once tracing is installed.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) => Ok((Self::default(), ConfigSource::Missing(path))),
            None => Ok((Self::default(), ConfigSource::NoConfigDir)),
        }
    }
}

/// Where [`TomlConfig::discover`] found its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// No file at the default location; compiled defaults in use
    Missing(PathBuf),
    /// Platform config directory unknown; compiled defaults in use
    NoConfigDir,
}

impl ConfigSource {
    /// True when compiled defaults stand in for a config file
    pub fn uses_defaults(&self) -> bool {
        !matches!(self, ConfigSource::File(_))
    }

    /// Report the outcome; missing files are warnings
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config file: {}", path.display()),
            ConfigSource::Missing(path) => {
                warn!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using defaults")
            }
        }
    }
}

/// Platform config file location (`~/.config/tunedex/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunedex").join("config.toml"))
}

/// Settings supplied on the command line (or via environment variables)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub music_dir: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub concurrency: Option<usize>,
}

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub music_dir: PathBuf,
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    /// `None` lets the ingest pool pick a default from the CPU count
    pub concurrency: Option<usize>,
    pub static_prefix: String,
    pub follow_links: bool,
    pub log_level: String,
}

impl Settings {
    /// Merge CLI overrides over the TOML file over compiled defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Result<Self> {
        let concurrency = cli.concurrency.or(toml.concurrency);
        if concurrency == Some(0) {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }

        Ok(Self {
            music_dir: cli
                .music_dir
                .or(toml.music_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MUSIC_DIR)),
            database: cli
                .database
                .or(toml.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            host: cli
                .host
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            concurrency,
            static_prefix: toml
                .static_prefix
                .unwrap_or_else(|| DEFAULT_STATIC_PREFIX.to_string()),
            follow_links: toml.follow_links.unwrap_or(false),
            log_level: toml.logging.level,
        })
    }
}
