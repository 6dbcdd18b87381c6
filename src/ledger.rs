//! Player balance ledger
//!
//! The ledger is the only owner of balance state. Every mutation runs under
//! one lock, is persisted through the store, and is committed to memory only
//! after the save succeeded.

use crate::errors::{BetError, RouletteResult};
use crate::games::types::Coins;
use crate::storage::{BalanceStore, Balances};
use std::sync::{Arc, Mutex, MutexGuard};

/// How the ledger treats players it has never seen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerPolicy {
    /// Unknown players read as the starting balance and are seeded on first mutation
    AutoSeed,
    /// Unknown players read as zero until registered
    RegisteredOnly,
}

pub struct Ledger {
    balances: Mutex<Balances>,
    store: Arc<dyn BalanceStore>,
    policy: LedgerPolicy,
    starting_balance: Coins,
}

impl Ledger {
    /// Load balances from `store`. A store with no data starts an empty ledger.
    pub fn open(
        store: Arc<dyn BalanceStore>,
        policy: LedgerPolicy,
        starting_balance: Coins,
    ) -> RouletteResult<Self> {
        let balances = store.load_balances()?;
        log::info!(
            "Ledger opened with {} players ({:?}, starting balance {})",
            balances.len(),
            policy,
            starting_balance
        );
        Ok(Self {
            balances: Mutex::new(balances),
            store,
            policy,
            starting_balance,
        })
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    pub fn starting_balance(&self) -> Coins {
        self.starting_balance
    }

    fn lock(&self) -> MutexGuard<'_, Balances> {
        self.balances.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn unseeded_balance(&self) -> Coins {
        match self.policy {
            LedgerPolicy::AutoSeed => self.starting_balance,
            LedgerPolicy::RegisteredOnly => 0,
        }
    }

    fn add(balance: Coins, amount: Coins) -> RouletteResult<Coins> {
        balance
            .checked_add(amount)
            .ok_or_else(|| BetError::BalanceOverflow { balance, amount }.into())
    }

    fn read(&self, balances: &Balances, player_id: &str) -> Coins {
        balances
            .get(player_id)
            .copied()
            .unwrap_or_else(|| self.unseeded_balance())
    }

    /// Current balance of a player
    pub fn balance_of(&self, player_id: &str) -> Coins {
        let balances = self.lock();
        self.read(&balances, player_id)
    }

    /// Copy of every known balance
    pub fn snapshot(&self) -> Balances {
        self.lock().clone()
    }

    /// Apply `mutate` to a working copy, persist it, then commit.
    ///
    /// On any error, including a failed save, memory is left untouched.
    fn transact<T, F>(&self, mutate: F) -> RouletteResult<T>
    where
        F: FnOnce(&mut Balances) -> RouletteResult<T>,
    {
        let mut balances = self.lock();
        let mut working = balances.clone();
        let value = mutate(&mut working)?;
        if let Err(e) = self.store.save_balances(&working) {
            log::error!("Balance save failed, mutation discarded: {}", e);
            return Err(e);
        }
        *balances = working;
        Ok(value)
    }

    /// Seed new identifiers at the starting balance. Existing players are untouched.
    ///
    /// Returns how many players were added.
    pub fn register_players<I, S>(&self, ids: I) -> RouletteResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let starting = self.starting_balance;
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let added = self.transact(|balances| {
            let mut added = 0;
            for id in ids {
                balances.entry(id).or_insert_with(|| {
                    added += 1;
                    starting
                });
            }
            Ok(added)
        })?;
        if added > 0 {
            log::info!("Registered {} new players", added);
        }
        Ok(added)
    }

    /// Add `amount` to a player's balance and return the new balance
    pub fn credit(&self, player_id: &str, amount: Coins) -> RouletteResult<Coins> {
        if amount < 0 {
            return Err(BetError::NegativeAmount { amount }.into());
        }
        let unseeded = self.unseeded_balance();
        let balance = self.transact(|balances| {
            let entry = balances.entry(player_id.to_string()).or_insert(unseeded);
            *entry = Self::add(*entry, amount)?;
            Ok(*entry)
        })?;
        log::debug!("Credited {} to {} (balance {})", amount, player_id, balance);
        Ok(balance)
    }

    /// Credit several players in one mutation and one save.
    ///
    /// Returns the resulting balance of every player touched, in input order.
    pub fn credit_many(&self, credits: &[(String, Coins)]) -> RouletteResult<Vec<(String, Coins)>> {
        if let Some((_, amount)) = credits.iter().find(|(_, amount)| *amount < 0) {
            return Err(BetError::NegativeAmount { amount: *amount }.into());
        }
        let unseeded = self.unseeded_balance();
        self.transact(|balances| {
            let mut after = Vec::with_capacity(credits.len());
            for (id, amount) in credits {
                let entry = balances.entry(id.clone()).or_insert(unseeded);
                *entry = Self::add(*entry, *amount)?;
                after.push((id.clone(), *entry));
            }
            Ok(after)
        })
    }

    /// Take `amount` from a player's balance and return the new balance.
    ///
    /// Funds are checked under the same lock as the write, so two debits
    /// against one player can never both pass on a stale balance.
    pub fn debit(&self, player_id: &str, amount: Coins) -> RouletteResult<Coins> {
        if amount <= 0 {
            return Err(BetError::NonPositiveAmount { amount }.into());
        }
        let unseeded = self.unseeded_balance();
        let balance = self.transact(|balances| {
            let entry = balances.entry(player_id.to_string()).or_insert(unseeded);
            if *entry < amount {
                return Err(BetError::InsufficientFunds {
                    balance: *entry,
                    bet: amount,
                }
                .into());
            }
            *entry -= amount;
            Ok(*entry)
        })?;
        log::debug!("Debited {} from {} (balance {})", amount, player_id, balance);
        Ok(balance)
    }

    /// Take `stake` and pay `prize` in a single write.
    ///
    /// Either both movements are saved or neither is.
    pub fn settle_wager(&self, player_id: &str, stake: Coins, prize: Coins) -> RouletteResult<Coins> {
        if stake <= 0 {
            return Err(BetError::NonPositiveAmount { amount: stake }.into());
        }
        if prize < 0 {
            return Err(BetError::NegativeAmount { amount: prize }.into());
        }
        let unseeded = self.unseeded_balance();
        let balance = self.transact(|balances| {
            let entry = balances.entry(player_id.to_string()).or_insert(unseeded);
            if *entry < stake {
                return Err(BetError::InsufficientFunds {
                    balance: *entry,
                    bet: stake,
                }
                .into());
            }
            *entry = Self::add(*entry - stake, prize)?;
            Ok(*entry)
        })?;
        log::debug!(
            "Settled wager of {} for {} with prize {} (balance {})",
            stake,
            player_id,
            prize,
            balance
        );
        Ok(balance)
    }
}
