//! Timer that closes batched rounds.
//!
//! Every tick settles the current round and forwards the settlement to the
//! front end, which notifies each player's channel.

use crate::games::engine::RouletteEngine;
use crate::games::types::RoundSettlement;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

pub struct RoundScheduler;

/// Running round loop
pub struct RoundSchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RoundScheduler {
    /// Close a round every `interval` until shut down or the receiver is dropped.
    ///
    /// The first round closes one full interval after spawning.
    pub fn spawn(
        engine: Arc<RouletteEngine>,
        interval: Duration,
        sink: mpsc::Sender<RoundSettlement>,
    ) -> RoundSchedulerHandle {
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = interval.as_secs_f64(), "Round scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                // Settlement touches the disk; keep it off the async workers.
                let worker = engine.clone();
                let settled = tokio::task::spawn_blocking(move || worker.close_round_and_settle()).await;

                match settled {
                    Ok(Ok(settlement)) => {
                        if sink.send(settlement).await.is_err() {
                            tracing::warn!("Settlement receiver dropped, stopping round scheduler");
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "Failed to settle round");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Settlement task panicked");
                    }
                }
            }

            tracing::info!("Round scheduler stopped");
        });

        RoundSchedulerHandle { shutdown, task }
    }
}

impl RoundSchedulerHandle {
    /// Stop the loop and wait for the in-flight round, if any, to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Round scheduler task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableMode;
    use crate::games::types::{Bet, Player};
    use crate::games::validator::BetValidator;
    use crate::games::wheel::FixedWheel;
    use crate::ledger::Ledger;
    use crate::storage::MemoryStore;

    fn engine() -> Arc<RouletteEngine> {
        let ledger = Ledger::open(
            Arc::new(MemoryStore::new()),
            TableMode::Batched.ledger_policy(),
            100,
        )
        .unwrap();
        Arc::new(RouletteEngine::new(
            TableMode::Batched,
            Arc::new(ledger),
            BetValidator::default(),
            Arc::new(FixedWheel::always(1)),
        ))
    }

    #[tokio::test]
    async fn test_scheduler_settles_rounds() {
        let engine = engine();
        engine.register_players(["p"]).unwrap();
        engine
            .place_bet(Bet::on_color(Player::new("p", "pat", 9), "red", 10))
            .unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let handle = RoundScheduler::spawn(engine.clone(), Duration::from_millis(20), tx);

        let settlement = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("round should close")
            .expect("channel open");
        assert_eq!(settlement.round, 1);
        assert_eq!(settlement.results.len(), 1);
        assert_eq!(settlement.results[0].player.channel_id, 9);
        assert_eq!(settlement.results[0].balance, 110);

        handle.shutdown().await;
        assert_eq!(engine.pending_bets(), 0);
    }

    #[tokio::test]
    async fn test_scheduler_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = RoundScheduler::spawn(engine(), Duration::from_millis(10), tx);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler should stop");
    }
}
