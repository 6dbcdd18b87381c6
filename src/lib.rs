//! Croupier - multiplayer roulette table
//!
//! Betting and settlement engine behind a chat roulette game. Players hold
//! a persisted coin balance, bet on a number or a color, and are paid from a
//! fixed table when the wheel is spun, either per bet or once per round.

pub mod commands;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod scheduler;
pub mod storage;

pub use config::{RouletteConfig, TableMode};
pub use errors::{BetError, RouletteError, RouletteResult};
pub use games::{Bet, Color, Player, PlayerBetResult, RouletteEngine, RoundSettlement};
pub use ledger::{Ledger, LedgerPolicy};
pub use scheduler::{RoundScheduler, RoundSchedulerHandle};
pub use storage::{BalanceStore, JsonFileStore, MemoryStore, RocksDbStore};
