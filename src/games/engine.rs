//! Roulette table engine
//!
//! Batched rounds are the main mode: bets are validated and staked as they
//! arrive, then a single spin settles the whole round. Immediate mode is a
//! round of one bet resolved on the spot.

use crate::config::{RouletteConfig, TableMode};
use crate::errors::{BetError, RouletteError, RouletteResult};
use crate::games::payout::PayoutTable;
use crate::games::types::{
    Bet, BetReceipt, Coins, PlayerBetResult, RoundSettlement, SpinOutcome, SpinResult,
    ValidatedTarget,
};
use crate::games::validator::BetValidator;
use crate::games::wheel::{outcome_of, Spin};
use crate::ledger::Ledger;
use crate::storage::BalanceStore;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};
use uuid::Uuid;

/// A staked bet waiting for the round to close
#[derive(Debug, Clone)]
struct PendingBet {
    bet_id: String,
    bet: Bet,
    target: ValidatedTarget,
}

pub struct RouletteEngine {
    mode: TableMode,
    ledger: Arc<Ledger>,
    validator: BetValidator,
    wheel: Arc<dyn Spin>,
    pending: Mutex<Vec<PendingBet>>,
    rounds: AtomicU64,
}

impl RouletteEngine {
    pub fn new(
        mode: TableMode,
        ledger: Arc<Ledger>,
        validator: BetValidator,
        wheel: Arc<dyn Spin>,
    ) -> Self {
        Self {
            mode,
            ledger,
            validator,
            wheel,
            pending: Mutex::new(Vec::new()),
            rounds: AtomicU64::new(0),
        }
    }

    /// Build an engine and its ledger from configuration
    pub fn from_config(
        config: &RouletteConfig,
        store: Arc<dyn BalanceStore>,
        wheel: Arc<dyn Spin>,
    ) -> RouletteResult<Self> {
        let ledger = Ledger::open(
            store,
            config.table.mode.ledger_policy(),
            config.table.starting_balance,
        )?;
        Ok(Self::new(
            config.table.mode,
            Arc::new(ledger),
            BetValidator::new(config.table.minimum_bet),
            wheel,
        ))
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn balance_of(&self, player_id: &str) -> Coins {
        self.ledger.balance_of(player_id)
    }

    pub fn register_players<I, S>(&self, ids: I) -> RouletteResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ledger.register_players(ids)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<PendingBet>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_mode(&self, mode: TableMode, operation: &'static str) -> RouletteResult<()> {
        if self.mode != mode {
            return Err(RouletteError::ModeMismatch {
                operation,
                mode: self.mode,
            });
        }
        Ok(())
    }

    fn spin(&self) -> RouletteResult<SpinOutcome> {
        outcome_of(self.wheel.spin())
    }

    /// Validate a bet against the player's balance and the prizes their
    /// queued bets could still collect. Callers must hold the pending lock.
    fn validate(&self, bet: &Bet, pending: &[PendingBet]) -> RouletteResult<ValidatedTarget> {
        let checked = pending
            .iter()
            .filter(|p| p.bet.player.id == bet.player.id)
            .try_fold(0, |total: Coins, p| -> Result<Coins, BetError> {
                let prize = PayoutTable::max_prize(&p.target, p.bet.amount)?;
                total
                    .checked_add(prize)
                    .ok_or(BetError::PayoutOverflow { stake: bet.amount })
            })
            .and_then(|exposure| self.validator.validate_with_exposure(bet, &self.ledger, exposure));

        checked.map_err(|e| {
            tracing::debug!(player_id = %bet.player.id, stake = bet.amount, error = %e, "Bet rejected");
            RouletteError::from(e)
        })
    }

    /// Resolve one bet on its own spin.
    ///
    /// The stake and the prize are written together, so a failed save
    /// leaves the balance as it was before the bet.
    pub fn place_bet_and_resolve(&self, bet: Bet) -> RouletteResult<SpinResult> {
        self.require_mode(TableMode::Immediate, "place_bet_and_resolve")?;
        // Serialize bets so a player's stakes never interleave.
        let pending = self.lock_pending();
        let target = self.validate(&bet, &pending)?;

        let outcome = self.spin()?;
        let prize = PayoutTable::prize_for(&target, bet.amount, &outcome)?;
        let balance = self
            .ledger
            .settle_wager(&bet.player.id, bet.amount, prize)
            .map_err(|e| {
                tracing::error!(
                    player_id = %bet.player.id,
                    stake = bet.amount,
                    prize,
                    outcome = outcome.number,
                    error = %e,
                    "Failed to settle bet"
                );
                e
            })?;

        tracing::info!(
            player_id = %bet.player.id,
            stake = bet.amount,
            outcome = outcome.number,
            color = %outcome.color,
            prize,
            balance,
            "Bet resolved"
        );
        Ok(SpinResult {
            outcome,
            prize,
            balance,
        })
    }

    /// Stake a bet and queue it for the current round
    pub fn place_bet(&self, bet: Bet) -> RouletteResult<BetReceipt> {
        self.require_mode(TableMode::Batched, "place_bet")?;
        let mut pending = self.lock_pending();
        let target = self.validate(&bet, &pending)?;
        // The ledger re-checks funds under its own lock.
        let balance = self.ledger.debit(&bet.player.id, bet.amount)?;

        let receipt = BetReceipt {
            bet_id: Uuid::new_v4().to_string(),
            player_id: bet.player.id.clone(),
            stake: bet.amount,
            balance,
        };
        tracing::debug!(
            player_id = %receipt.player_id,
            bet_id = %receipt.bet_id,
            stake = receipt.stake,
            "Bet queued"
        );
        pending.push(PendingBet {
            bet_id: receipt.bet_id.clone(),
            bet,
            target,
        });
        Ok(receipt)
    }

    /// Spin once and settle every queued bet against that outcome.
    ///
    /// The queue is taken whole and stays locked until the round is paid,
    /// so bets placed meanwhile wait for the next round. If settling fails
    /// the taken bets go back on the queue and the error is returned.
    pub fn close_round_and_settle(&self) -> RouletteResult<RoundSettlement> {
        self.require_mode(TableMode::Batched, "close_round_and_settle")?;
        let mut pending = self.lock_pending();
        let bets = std::mem::take(&mut *pending);

        match self.settle(&bets) {
            Ok(settlement) => Ok(settlement),
            Err(e) => {
                tracing::error!(
                    bets = bets.len(),
                    error = %e,
                    "Round settlement failed, bets returned to the queue"
                );
                *pending = bets;
                Err(e)
            }
        }
    }

    fn settle(&self, bets: &[PendingBet]) -> RouletteResult<RoundSettlement> {
        let outcome = self.spin()?;

        let credits = bets
            .iter()
            .map(|p| -> RouletteResult<(String, Coins)> {
                let prize = PayoutTable::prize_for(&p.target, p.bet.amount, &outcome)?;
                Ok((p.bet.player.id.clone(), prize))
            })
            .collect::<RouletteResult<Vec<_>>>()?;

        let balances = if credits.is_empty() {
            Vec::new()
        } else {
            self.ledger.credit_many(&credits)?
        };

        let mut results: Vec<PlayerBetResult> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (pending, (credit, (_, balance))) in bets.iter().zip(credits.iter().zip(balances)) {
            let prize = credit.1;
            match index.get(&pending.bet.player.id) {
                Some(&i) => {
                    results[i].prize += prize;
                    results[i].balance = balance;
                }
                None => {
                    index.insert(pending.bet.player.id.clone(), results.len());
                    results.push(PlayerBetResult {
                        player: pending.bet.player.clone(),
                        prize,
                        balance,
                    });
                }
            }
            tracing::trace!(bet_id = %pending.bet_id, prize, "Bet settled");
        }

        let round = self.rounds.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            round,
            outcome = outcome.number,
            color = %outcome.color,
            bets = bets.len(),
            players = results.len(),
            paid = credits.iter().map(|(_, prize)| prize).sum::<Coins>(),
            "Round settled"
        );

        Ok(RoundSettlement {
            round,
            outcome,
            results,
            settled_at: chrono::Utc::now(),
        })
    }

    /// Number of bets waiting for the round to close
    pub fn pending_bets(&self) -> usize {
        self.lock_pending().len()
    }

    /// Bets a player has queued in the current round
    pub fn pending_for(&self, player_id: &str) -> Vec<Bet> {
        self.lock_pending()
            .iter()
            .filter(|p| p.bet.player.id == player_id)
            .map(|p| p.bet.clone())
            .collect()
    }

    /// Rounds settled so far
    pub fn round(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }
}
