//! # tunedex common library
//!
//! Shared code for the tunedex service:
//! - Error and result types
//! - TOML configuration loading and setting resolution

pub mod config;
pub mod error;

pub use config::{ConfigSource, LoggingConfig, Settings, TomlConfig};
pub use error::{Error, Result};
