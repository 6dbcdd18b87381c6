//! Configuration management with validation and defaults
//!
//! Loaded from TOML, then overridden from `CROUPIER_*` environment variables.

use crate::errors::{ConfigurationError, RouletteResult};
use crate::games::types::Coins;
use crate::ledger::LedgerPolicy;
use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};

/// Top-level table configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouletteConfig {
    pub table: TableConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// How bets are resolved
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// Bets accumulate and are settled together when the round closes
    Batched,
    /// Every bet gets its own spin
    Immediate,
}

impl TableMode {
    /// Batched tables register players on join; immediate tables seed on first use.
    pub fn ledger_policy(&self) -> LedgerPolicy {
        match self {
            TableMode::Batched => LedgerPolicy::RegisteredOnly,
            TableMode::Immediate => LedgerPolicy::AutoSeed,
        }
    }
}

impl std::str::FromStr for TableMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batched" => Ok(TableMode::Batched),
            "immediate" => Ok(TableMode::Immediate),
            other => Err(format!("unknown table mode '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub mode: TableMode,
    pub starting_balance: Coins,
    pub minimum_bet: Coins,
    pub round_interval_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            mode: TableMode::Batched,
            starting_balance: 100,
            minimum_bet: 1,
            round_interval_secs: 120,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    RocksDb,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StorageBackend::Json),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON file path, or RocksDB directory
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: "users_data.json".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl RouletteConfig {
    /// Single-player table, one spin per bet
    pub fn immediate() -> Self {
        Self {
            table: TableConfig {
                mode: TableMode::Immediate,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// In-memory table with a short round, for tests
    pub fn testing() -> Self {
        Self {
            table: TableConfig {
                round_interval_secs: 1,
                ..Default::default()
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: String::new(),
            },
            monitoring: MonitoringConfig {
                log_level: "debug".to_string(),
            },
        }
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.table.round_interval_secs)
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> RouletteResult<()> {
        if self.table.minimum_bet < 1 {
            return Err(ConfigurationError::InvalidValue {
                field: "table.minimum_bet".to_string(),
                value: self.table.minimum_bet.to_string(),
                reason: "Minimum bet must be at least 1".to_string(),
            }
            .into());
        }

        if self.table.starting_balance < 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "table.starting_balance".to_string(),
                value: self.table.starting_balance.to_string(),
                reason: "Starting balance cannot be negative".to_string(),
            }
            .into());
        }

        if self.table.round_interval_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "table.round_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "Round interval must be > 0".to_string(),
            }
            .into());
        }

        if self.storage.backend != StorageBackend::Memory && self.storage.path.is_empty() {
            return Err(ConfigurationError::MissingRequired("storage.path".to_string()).into());
        }

        Ok(())
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> RouletteResult<RouletteConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            RouletteConfig::default()
        };

        apply_env_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> RouletteResult<RouletteConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    /// Save configuration to file
    pub fn save(&self, config: &RouletteConfig, path: &str) -> RouletteResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: String, reason: &str) -> RouletteResult<T> {
    raw.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: key.to_string(),
            value: raw,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Apply `CROUPIER_*` overrides read through `lookup`
fn apply_env_overrides<F>(config: &mut RouletteConfig, lookup: F) -> RouletteResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = lookup("CROUPIER_MODE") {
        config.table.mode = parse_var("CROUPIER_MODE", mode, "Expected 'batched' or 'immediate'")?;
    }
    if let Some(balance) = lookup("CROUPIER_STARTING_BALANCE") {
        config.table.starting_balance =
            parse_var("CROUPIER_STARTING_BALANCE", balance, "Invalid coin amount")?;
    }
    if let Some(secs) = lookup("CROUPIER_ROUND_INTERVAL_SECS") {
        config.table.round_interval_secs =
            parse_var("CROUPIER_ROUND_INTERVAL_SECS", secs, "Invalid number of seconds")?;
    }
    if let Some(backend) = lookup("CROUPIER_STORAGE_BACKEND") {
        config.storage.backend = parse_var(
            "CROUPIER_STORAGE_BACKEND",
            backend,
            "Expected 'json', 'rocksdb' or 'memory'",
        )?;
    }
    if let Some(path) = lookup("CROUPIER_STORAGE_PATH") {
        config.storage.path = path;
    }
    if let Some(level) = lookup("CROUPIER_LOG_LEVEL") {
        config.monitoring.log_level = level;
    }
    Ok(())
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> RouletteResult<()> {
    ConfigLoader::new().save(&RouletteConfig::default(), path)
}
