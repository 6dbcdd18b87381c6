use crate::errors::BetError;
use crate::games::payout::PayoutTable;
use crate::games::types::{Bet, BetTarget, Coins, Color, ValidatedTarget};
use crate::games::wheel::MAX_NUMBER;
use crate::ledger::Ledger;

/// Checks a proposed bet before any money moves.
///
/// Order is fixed and the first failure wins: target legality, minimum
/// stake, funds, then payout headroom. Nothing here mutates the ledger.
#[derive(Clone, Debug)]
pub struct BetValidator {
    minimum_bet: Coins,
}

impl Default for BetValidator {
    fn default() -> Self {
        Self { minimum_bet: 1 }
    }
}

impl BetValidator {
    pub fn new(minimum_bet: Coins) -> Self {
        Self { minimum_bet }
    }

    pub fn minimum_bet(&self) -> Coins {
        self.minimum_bet
    }

    /// Resolve the raw target into a legal color or number
    pub fn check_target(&self, target: &BetTarget) -> Result<ValidatedTarget, BetError> {
        match target {
            BetTarget::Color(raw) => Color::parse_bet(raw).map(ValidatedTarget::Color),
            BetTarget::Number(n) => match u8::try_from(*n) {
                Ok(number) if number <= MAX_NUMBER => Ok(ValidatedTarget::Number(number)),
                _ => Err(BetError::InvalidNumber { number: *n }),
            },
        }
    }

    pub fn check_stake(&self, amount: Coins) -> Result<(), BetError> {
        if amount < self.minimum_bet || amount <= 0 {
            return Err(BetError::BelowMinimumBet {
                minimum: self.minimum_bet,
            });
        }
        Ok(())
    }

    pub fn check_funds(&self, balance: Coins, amount: Coins) -> Result<(), BetError> {
        if balance < amount {
            return Err(BetError::InsufficientFunds {
                balance,
                bet: amount,
            });
        }
        Ok(())
    }

    /// The player's balance must still fit in `Coins` if this bet and every
    /// prize in `exposure` are won. Call only after `check_funds` passed.
    pub fn check_payout(
        &self,
        target: &ValidatedTarget,
        balance: Coins,
        amount: Coins,
        exposure: Coins,
    ) -> Result<(), BetError> {
        PayoutTable::max_prize(target, amount)?
            .checked_add(exposure)
            .and_then(|prizes| prizes.checked_add(balance - amount))
            .map(|_| ())
            .ok_or(BetError::PayoutOverflow { stake: amount })
    }

    /// Run every check against the player's current balance
    pub fn validate(&self, bet: &Bet, ledger: &Ledger) -> Result<ValidatedTarget, BetError> {
        self.validate_with_exposure(bet, ledger, 0)
    }

    /// Like `validate`, counting `exposure` coins of prizes the player could
    /// still collect from bets already queued
    pub fn validate_with_exposure(
        &self,
        bet: &Bet,
        ledger: &Ledger,
        exposure: Coins,
    ) -> Result<ValidatedTarget, BetError> {
        let target = self.check_target(&bet.target)?;
        self.check_stake(bet.amount)?;
        let balance = ledger.balance_of(&bet.player.id);
        self.check_funds(balance, bet.amount)?;
        self.check_payout(&target, balance, bet.amount, exposure)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::Player;
    use crate::ledger::LedgerPolicy;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn ledger(balance: Coins) -> Ledger {
        let store = Arc::new(MemoryStore::with_balances([("p", balance)]));
        Ledger::open(store, LedgerPolicy::RegisteredOnly, 100).unwrap()
    }

    fn player() -> Player {
        Player::new("p", "pat", 1)
    }

    #[test]
    fn test_valid_bets() {
        let v = BetValidator::default();
        let l = ledger(100);
        assert_eq!(
            v.validate(&Bet::on_color(player(), "Red", 10), &l).unwrap(),
            ValidatedTarget::Color(Color::Red)
        );
        assert_eq!(
            v.validate(&Bet::on_number(player(), 0, 100), &l).unwrap(),
            ValidatedTarget::Number(0)
        );
        assert_eq!(
            v.validate(&Bet::on_number(player(), 36, 1), &l).unwrap(),
            ValidatedTarget::Number(36)
        );
    }

    #[test]
    fn test_invalid_targets() {
        let v = BetValidator::default();
        let l = ledger(100);
        for number in [-1, 37, 300] {
            assert_eq!(
                v.validate(&Bet::on_number(player(), number, 10), &l),
                Err(BetError::InvalidNumber { number })
            );
        }
        assert!(matches!(
            v.validate(&Bet::on_color(player(), "purple", 10), &l),
            Err(BetError::InvalidColor { ref color, .. }) if color == "purple"
        ));
    }

    #[test]
    fn test_stake_below_minimum() {
        let v = BetValidator::default();
        let l = ledger(100);
        for amount in [0, -5] {
            assert_eq!(
                v.validate(&Bet::on_color(player(), "black", amount), &l),
                Err(BetError::BelowMinimumBet { minimum: 1 })
            );
        }
        let strict = BetValidator::new(5);
        assert_eq!(
            strict.validate(&Bet::on_color(player(), "black", 4), &l),
            Err(BetError::BelowMinimumBet { minimum: 5 })
        );
    }

    #[test]
    fn test_insufficient_funds() {
        let v = BetValidator::default();
        assert_eq!(
            v.validate(&Bet::on_number(player(), 3, 10), &ledger(5)),
            Err(BetError::InsufficientFunds { balance: 5, bet: 10 })
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let v = BetValidator::default();
        let l = ledger(5);
        // Bad color, bad stake and no funds: the color is reported.
        assert!(matches!(
            v.validate(&Bet::on_color(player(), "green", -10), &l),
            Err(BetError::InvalidColor { .. })
        ));
        // Bad stake and no funds: the stake is reported.
        assert_eq!(
            v.validate(&Bet::on_number(player(), 7, 0), &ledger(0)),
            Err(BetError::BelowMinimumBet { minimum: 1 })
        );
    }

    #[test]
    fn test_payout_headroom() {
        let v = BetValidator::default();
        let rich = i64::MAX / 2;
        let l = ledger(rich);
        assert_eq!(
            v.validate(&Bet::on_number(player(), 0, rich), &l),
            Err(BetError::PayoutOverflow { stake: rich })
        );
        // Doubling fits, so a color bet of the whole balance is fine.
        assert!(v.validate(&Bet::on_color(player(), "red", rich), &l).is_ok());

        let modest = ledger(1_000);
        let target = ValidatedTarget::Number(7);
        assert!(v.check_payout(&target, 1_000, 10, 0).is_ok());
        assert_eq!(
            v.check_payout(&target, 1_000, 10, i64::MAX - 100),
            Err(BetError::PayoutOverflow { stake: 10 })
        );
        assert!(v
            .validate_with_exposure(&Bet::on_number(player(), 7, 10), &modest, i64::MAX - 100)
            .is_err());
    }
}
