//! Balances survive restarts through the file-backed stores

use croupier::{
    config::{RouletteConfig, StorageBackend, StorageConfig, TableMode},
    games::{Bet, FixedWheel, Player, RouletteEngine},
    storage::{open_store, BalanceStore},
};
use std::sync::Arc;
use tempfile::TempDir;

fn config(backend: StorageBackend, path: String) -> RouletteConfig {
    RouletteConfig {
        storage: StorageConfig { backend, path },
        ..RouletteConfig::default()
    }
}

fn run_round_then_restart(config: RouletteConfig) {
    let alice = Player::new("alice", "Alice", 1);
    {
        let store = open_store(&config.storage).expect("store opens");
        let engine =
            RouletteEngine::from_config(&config, store, Arc::new(FixedWheel::always(1))).unwrap();
        engine.register_players(["alice", "bob"]).unwrap();
        engine.place_bet(Bet::on_color(alice.clone(), "red", 25)).unwrap();
        // Staked but unsettled bets are already durable.
        assert_eq!(engine.balance_of("alice"), 75);
        engine.close_round_and_settle().unwrap();
        assert_eq!(engine.balance_of("alice"), 125);
    }

    let store = open_store(&config.storage).expect("store reopens");
    let engine =
        RouletteEngine::from_config(&config, store, Arc::new(FixedWheel::always(2))).unwrap();
    assert_eq!(engine.balance_of("alice"), 125);
    assert_eq!(engine.balance_of("bob"), 100);

    // Registering again after a restart keeps the won coins.
    engine.register_players(["alice"]).unwrap();
    assert_eq!(engine.balance_of("alice"), 125);
}

#[test]
fn json_store_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users_data.json");
    run_round_then_restart(config(StorageBackend::Json, path.to_string_lossy().to_string()));
}

#[test]
fn rocksdb_store_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("balances");
    run_round_then_restart(config(StorageBackend::RocksDb, path.to_string_lossy().to_string()));
}

#[test]
fn immediate_table_seeds_new_players_on_first_bet() {
    let dir = TempDir::new().unwrap();
    let mut config = config(
        StorageBackend::Json,
        dir.path().join("users_data.json").to_string_lossy().to_string(),
    );
    config.table.mode = TableMode::Immediate;

    let store = open_store(&config.storage).unwrap();
    let engine =
        RouletteEngine::from_config(&config, store, Arc::new(FixedWheel::always(5))).unwrap();
    assert_eq!(engine.balance_of("newcomer"), 100);
    let result = engine
        .place_bet_and_resolve(Bet::on_number(Player::new("newcomer", "N", 0), 17, 10))
        .unwrap();
    assert_eq!(result.balance, 90);

    let reopened = open_store(&config.storage).unwrap().load_balances().unwrap();
    assert_eq!(reopened.get("newcomer"), Some(&90));
}

#[test]
fn unreadable_balance_file_stops_the_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users_data.json");
    std::fs::write(&path, br#"{"alice": 5000, "bob": 700,"#).unwrap();
    let config = config(StorageBackend::Json, path.to_string_lossy().to_string());

    let store = open_store(&config.storage).unwrap();
    let opened = RouletteEngine::from_config(&config, store, Arc::new(FixedWheel::always(1)));
    assert!(opened.is_err());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"{"alice": 5000, "bob": 700,"#
    );
}
