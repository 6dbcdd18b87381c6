//! Fixed payout table.
//!
//! Multipliers are applied to the stake and include it: a winning color bet
//! of 10 pays 20, a winning straight number bet of 10 pays 360.

use crate::errors::BetError;
use crate::games::types::{Coins, SpinOutcome, ValidatedTarget};

/// Multiplier for a matching color bet
pub const COLOR_MULTIPLIER: Coins = 2;
/// Multiplier for a matching single-number bet
pub const NUMBER_MULTIPLIER: Coins = 36;

pub struct PayoutTable;

impl PayoutTable {
    /// Color bets win when the pocket color matches. Zero is green and matches nothing.
    pub fn color_payout(target: &ValidatedTarget, outcome: &SpinOutcome) -> Coins {
        match target {
            ValidatedTarget::Color(color) if *color == outcome.color => COLOR_MULTIPLIER,
            _ => 0,
        }
    }

    pub fn number_payout(target: &ValidatedTarget, outcome: &SpinOutcome) -> Coins {
        match target {
            ValidatedTarget::Number(n) if *n == outcome.number => NUMBER_MULTIPLIER,
            _ => 0,
        }
    }

    pub fn multiplier(target: &ValidatedTarget, outcome: &SpinOutcome) -> Coins {
        match target {
            ValidatedTarget::Color(_) => Self::color_payout(target, outcome),
            ValidatedTarget::Number(_) => Self::number_payout(target, outcome),
        }
    }

    /// Multiplier the target pays when it wins
    pub fn winning_multiplier(target: &ValidatedTarget) -> Coins {
        match target {
            ValidatedTarget::Color(_) => COLOR_MULTIPLIER,
            ValidatedTarget::Number(_) => NUMBER_MULTIPLIER,
        }
    }

    /// Largest prize the bet can win
    pub fn max_prize(target: &ValidatedTarget, stake: Coins) -> Result<Coins, BetError> {
        stake
            .checked_mul(Self::winning_multiplier(target))
            .ok_or(BetError::PayoutOverflow { stake })
    }

    /// Prize for a stake on a validated target
    pub fn prize_for(
        target: &ValidatedTarget,
        stake: Coins,
        outcome: &SpinOutcome,
    ) -> Result<Coins, BetError> {
        stake
            .checked_mul(Self::multiplier(target, outcome))
            .ok_or(BetError::PayoutOverflow { stake })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::Color;
    use crate::games::wheel::outcome_of;

    #[test]
    fn test_straight_number_pays_36x() {
        let outcome = outcome_of(17).unwrap();
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Number(17), 10, &outcome).unwrap(), 360);
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Number(16), 10, &outcome).unwrap(), 0);
    }

    #[test]
    fn test_color_pays_2x() {
        let outcome = outcome_of(1).unwrap();
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Color(Color::Red), 10, &outcome).unwrap(), 20);
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Color(Color::Black), 10, &outcome).unwrap(), 0);
    }

    #[test]
    fn test_zero_beats_every_color_bet() {
        let zero = outcome_of(0).unwrap();
        for color in Color::BETTABLE {
            assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Color(color), 50, &zero).unwrap(), 0);
        }
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Number(0), 5, &zero).unwrap(), 180);
    }

    #[test]
    fn test_number_bet_ignores_color_match() {
        // 3 and 1 are both red; a number bet only cares about the number.
        let outcome = outcome_of(3).unwrap();
        assert_eq!(PayoutTable::number_payout(&ValidatedTarget::Number(1), &outcome), 0);
        assert_eq!(PayoutTable::color_payout(&ValidatedTarget::Number(3), &outcome), 0);
    }

    #[test]
    fn test_oversized_stake_reports_overflow() {
        let zero = outcome_of(0).unwrap();
        let stake = i64::MAX / 2;
        assert_eq!(
            PayoutTable::prize_for(&ValidatedTarget::Number(0), stake, &zero),
            Err(BetError::PayoutOverflow { stake })
        );
        // A losing bet pays nothing whatever the stake.
        assert_eq!(PayoutTable::prize_for(&ValidatedTarget::Number(1), stake, &zero), Ok(0));
        assert_eq!(
            PayoutTable::max_prize(&ValidatedTarget::Color(Color::Red), stake),
            Ok(stake * 2)
        );
    }
}
