//! Registry configuration.

use std::path::{Path, PathBuf};

use pharmtrust_ledger::DEFAULT_CONFIRMATION_ROUNDS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What to do when a unit serial is issued twice within one batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SerialPolicy {
    /// Fail before minting
    #[default]
    Reject,
    /// Mint anyway and point the serial at the new asset
    Overwrite,
}

/// Values used when a create request omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchDefaults {
    pub total_units: u64,
    pub expiry_date: String,
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            total_units: 1000,
            expiry_date: "2027-08".to_string(),
        }
    }
}

/// Medicine registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Artifact document location
    pub store_path: PathBuf,
    /// Account that creates, and holds every role of, minted assets
    pub creator_address: String,
    /// Rounds to wait for a mint to confirm
    pub confirmation_rounds: u64,
    /// Prefix of off-chain metadata URLs
    pub metadata_base_url: String,
    pub serial_policy: SerialPolicy,
    pub defaults: BatchDefaults,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("artifacts.json"),
            creator_address: "PHARMTRUSTCREATOR".to_string(),
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
            metadata_base_url: "ipfs://QmYourCIDHere".to_string(),
            serial_policy: SerialPolicy::Reject,
            defaults: BatchDefaults::default(),
        }
    }
}

impl RegistryConfig {
    /// Default configuration storing its document at `store_path`.
    pub fn with_store_path<P: AsRef<Path>>(store_path: P) -> Self {
        Self {
            store_path: store_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.creator_address.trim().is_empty() {
            return Err(ConfigError::Invalid("creator_address is empty".into()));
        }
        if self.confirmation_rounds == 0 {
            return Err(ConfigError::Invalid(
                "confirmation_rounds must be positive".into(),
            ));
        }
        if self.defaults.total_units == 0 {
            return Err(ConfigError::Invalid(
                "defaults.total_units must be positive".into(),
            ));
        }
        if !crate::models::is_valid_expiry(&self.defaults.expiry_date) {
            return Err(ConfigError::Invalid(format!(
                "defaults.expiry_date '{}' must be YYYY-MM or YYYY-MM-DD",
                self.defaults.expiry_date
            )));
        }
        Ok(())
    }
}
