//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Relay role settings
    #[serde(default)]
    pub relay: RelaySettings,

    /// NAT probe settings
    #[serde(default)]
    pub nat: NatSettings,

    /// Settlement settings
    #[serde(default)]
    pub settlement: SettlementSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.clone());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.clone());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Relay role settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Forward traffic for other peers (requires a signing key)
    #[serde(default)]
    pub enabled: bool,

    /// Keyfile path
    #[serde(default)]
    pub keyfile: Option<String>,

    /// Token amount asked per relayed hop
    #[serde(default = "default_ticket_amount")]
    pub ticket_amount: u64,
}

fn default_ticket_amount() -> u64 {
    10
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            keyfile: None,
            ticket_amount: default_ticket_amount(),
        }
    }
}

/// NAT probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatSettings {
    /// UDP probe timeout in milliseconds
    #[serde(default = "default_udp_timeout_ms")]
    pub udp_timeout_ms: u64,

    /// TCP probe timeout in milliseconds
    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,

    /// Candidate servers reachable over UDP; empty means the built-in list
    #[serde(default)]
    pub udp_stun_servers: Vec<String>,

    /// Candidate servers accepting STUN over TCP; empty means the built-in
    /// list
    #[serde(default)]
    pub tcp_stun_servers: Vec<String>,
}

fn default_udp_timeout_ms() -> u64 {
    700
}

fn default_tcp_timeout_ms() -> u64 {
    1200
}

impl Default for NatSettings {
    fn default() -> Self {
        Self {
            udp_timeout_ms: default_udp_timeout_ms(),
            tcp_timeout_ms: default_tcp_timeout_ms(),
            udp_stun_servers: Vec::new(),
            tcp_stun_servers: Vec::new(),
        }
    }
}

/// Settlement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSettings {
    /// Aggregate token total above which ticket redemption is worthwhile
    #[serde(default = "default_redeem_threshold")]
    pub redeem_threshold: u64,
}

fn default_redeem_threshold() -> u64 {
    100
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            redeem_threshold: default_redeem_threshold(),
        }
    }
}
