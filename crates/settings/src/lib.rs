//! MixCraft Settings
//!
//! Node configuration management.
//!
//! ## Features
//!
//! - Relay role and ticket pricing
//! - NAT probe timeouts and candidate servers
//! - Settlement redemption threshold
//! - JSON config file storage
//!
//! ## Usage
//!
//! ```no_run
//! use mixcraft_settings::Settings;
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.relay.enabled = true;
//! settings.save()?;
//! # Ok::<(), mixcraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{NatSettings, RelaySettings, SettlementSettings, Settings};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Config directory: `$MIXCRAFT_CONFIG_DIR`, else `~/.mixcraft`
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("MIXCRAFT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mixcraft")
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
