//! Error types for the roulette table
//!
//! Caller-facing bet errors carry everything a front end needs to render a
//! message. Storage and configuration errors are kept apart so callers can
//! tell a rejected bet from a failed write.

use crate::config::TableMode;
use crate::games::types::Coins;

/// Root error type for all table operations
#[derive(Debug, thiserror::Error)]
pub enum RouletteError {
    /// Bet rejected because of caller input or balance state
    #[error(transparent)]
    Bet(#[from] BetError),

    /// Balance persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A spin produced a number outside the wheel
    #[error("Outcome {0} is not on the wheel (0-36)")]
    InvalidOutcome(u8),

    /// Operation belongs to the other table mode
    #[error("{operation} is not available in {mode:?} mode")]
    ModeMismatch {
        operation: &'static str,
        mode: TableMode,
    },
}

/// Errors raised while validating or applying a single bet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BetError {
    #[error("The color '{color}' you have chosen is not valid. Please choose a color from the available range: {}.", allowed.join(", "))]
    InvalidColor { color: String, allowed: Vec<String> },

    #[error("The number '{number}' you have selected is not valid. Please choose a number between 0 and 36.")]
    InvalidNumber { number: i64 },

    #[error("The minimal bet is '{minimum}' coin")]
    BelowMinimumBet { minimum: Coins },

    #[error("Player's balance {balance} coins is not enough to bet {bet} coins")]
    InsufficientFunds { balance: Coins, bet: Coins },

    #[error("The bet amount {amount} must be a positive number of coins")]
    NonPositiveAmount { amount: Coins },

    #[error("A bet of {stake} coins could win more than the table can pay out")]
    PayoutOverflow { stake: Coins },

    #[error("Amount {amount} must not be negative")]
    NegativeAmount { amount: Coins },

    #[error("Adding {amount} coins to a balance of {balance} exceeds the coin limit")]
    BalanceOverflow { balance: Coins, amount: Coins },
}

/// Storage system errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

/// Configuration and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {0}")]
    MissingRequired(String),
}

impl RouletteError {
    /// True for the caller-facing kinds that reject a single bet
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            RouletteError::Bet(
                BetError::InvalidColor { .. }
                    | BetError::InvalidNumber { .. }
                    | BetError::BelowMinimumBet { .. }
                    | BetError::InsufficientFunds { .. }
                    | BetError::NonPositiveAmount { .. }
                    | BetError::PayoutOverflow { .. }
            )
        )
    }

    /// The bet error, if this is one
    pub fn as_bet_error(&self) -> Option<&BetError> {
        match self {
            RouletteError::Bet(e) => Some(e),
            _ => None,
        }
    }
}

// External error conversions
impl From<std::io::Error> for RouletteError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => {
                RouletteError::Storage(StorageError::ReadFailed(e.to_string()))
            }
            _ => RouletteError::Storage(StorageError::WriteFailed(e.to_string())),
        }
    }
}

impl From<serde_json::Error> for RouletteError {
    fn from(e: serde_json::Error) -> Self {
        RouletteError::Storage(StorageError::CorruptedData(e.to_string()))
    }
}

impl From<rocksdb::Error> for RouletteError {
    fn from(e: rocksdb::Error) -> Self {
        RouletteError::Storage(StorageError::WriteFailed(e.to_string()))
    }
}

// Convenience type alias for Results
pub type RouletteResult<T> = Result<T, RouletteError>;
