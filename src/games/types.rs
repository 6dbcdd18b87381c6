use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::BetError;

/// Coin amounts. Signed so that non-positive stakes can be represented and rejected.
pub type Coins = i64;

/// Pocket colors on the wheel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    /// House color of the zero pocket; no color bet matches it
    Green,
}

impl Color {
    /// Colors a player may bet on
    pub const BETTABLE: [Color; 2] = [Color::Red, Color::Black];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Black => "black",
            Color::Green => "green",
        }
    }

    /// Parse a color bet, case-insensitively. Only red and black are accepted.
    pub fn parse_bet(raw: &str) -> Result<Self, BetError> {
        let lowered = raw.trim().to_lowercase();
        Self::BETTABLE
            .iter()
            .copied()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| BetError::InvalidColor {
                color: raw.to_string(),
                allowed: Self::BETTABLE.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    /// Unique identifier (chat user id)
    pub id: String,
    /// Display name
    pub name: String,
    /// Where to route messages for this player; passed through untouched
    pub channel_id: u64,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, channel_id: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channel_id,
        }
    }
}

/// What a bet is placed on, as submitted by the player.
///
/// Raw values are kept so the validator can report exactly what was
/// offered; a bet is always on a color or a number, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BetTarget {
    Color(String),
    Number(i64),
}

/// A bet target that has passed validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidatedTarget {
    Color(Color),
    Number(u8),
}

/// A single wager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bet {
    pub player: Player,
    pub target: BetTarget,
    pub amount: Coins,
}

impl Bet {
    pub fn on_color(player: Player, color: impl Into<String>, amount: Coins) -> Self {
        Self {
            player,
            target: BetTarget::Color(color.into()),
            amount,
        }
    }

    pub fn on_number(player: Player, number: i64, amount: Coins) -> Self {
        Self {
            player,
            target: BetTarget::Number(number),
            amount,
        }
    }
}

/// A number on the wheel together with its color
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpinOutcome {
    pub number: u8,
    pub color: Color,
}

impl fmt::Display for SpinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.color)
    }
}

/// Acknowledgement for a bet queued in the current round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetReceipt {
    pub bet_id: String,
    pub player_id: String,
    pub stake: Coins,
    /// Balance after the stake was taken
    pub balance: Coins,
}

/// Result of a bet resolved on its own spin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpinResult {
    pub outcome: SpinOutcome,
    pub prize: Coins,
    pub balance: Coins,
}

/// Per-player totals for one settled round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerBetResult {
    pub player: Player,
    /// Sum of prizes across all of the player's bets in the round
    pub prize: Coins,
    /// Balance after the last credit of the round
    pub balance: Coins,
}

impl fmt::Display for PlayerBetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} prize: {} balance: {}",
            self.player.name, self.prize, self.balance
        )
    }
}

/// Everything the front end needs to announce a finished round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSettlement {
    pub round: u64,
    pub outcome: SpinOutcome,
    pub results: Vec<PlayerBetResult>,
    pub settled_at: chrono::DateTime<chrono::Utc>,
}
