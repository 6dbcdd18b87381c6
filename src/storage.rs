//! Balance persistence adapters
//!
//! The ledger only ever loads the whole mapping once and saves the whole
//! mapping after every mutation, so adapters deal in complete snapshots.

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{RouletteError, RouletteResult, StorageError};
use crate::games::types::Coins;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

/// Player identifier -> balance
pub type Balances = HashMap<String, Coins>;

const BALANCE_PREFIX: &[u8] = b"balance:";

/// Durable key-value storage for player balances
pub trait BalanceStore: Send + Sync {
    /// Load every stored balance. An empty map means no prior data.
    fn load_balances(&self) -> RouletteResult<Balances>;

    /// Replace the stored mapping with `balances`
    fn save_balances(&self, balances: &Balances) -> RouletteResult<()>;
}

/// Build the adapter selected in configuration
pub fn open_store(config: &StorageConfig) -> RouletteResult<Arc<dyn BalanceStore>> {
    let store: Arc<dyn BalanceStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.path)),
        StorageBackend::RocksDb => Arc::new(RocksDbStore::open(&config.path)?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    log::info!("Opened {:?} balance store at {}", config.backend, config.path);
    Ok(store)
}

/// Single JSON object file, `{"player_id": balance, ...}`
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BalanceStore for JsonFileStore {
    fn load_balances(&self) -> RouletteResult<Balances> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No balance file at {}, starting empty", self.path.display());
                return Ok(Balances::new());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice::<Balances>(&bytes).map_err(|e| {
            log::error!("Balance file {} could not be decoded: {}", self.path.display(), e);
            RouletteError::Storage(StorageError::CorruptedData(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })
    }

    fn save_balances(&self, balances: &Balances) -> RouletteResult<()> {
        let bytes = serde_json::to_vec(balances).map_err(|e| {
            StorageError::WriteFailed(format!("Failed to encode balances: {}", e))
        })?;

        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to move {} into place: {}",
                tmp.display(),
                e
            ))
        })?;

        log::debug!("Saved {} balances to {}", balances.len(), self.path.display());
        Ok(())
    }
}

/// RocksDB-backed store, one key per player
pub struct RocksDbStore {
    db: DB,
}

impl RocksDbStore {
    pub fn open<P: AsRef<Path>>(path: P) -> RouletteResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path.as_ref()).map_err(|e| {
            StorageError::DatabaseOpenFailed(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self { db })
    }
}

fn balance_key(player_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(BALANCE_PREFIX.len() + player_id.len());
    key.extend_from_slice(BALANCE_PREFIX);
    key.extend_from_slice(player_id.as_bytes());
    key
}

impl BalanceStore for RocksDbStore {
    fn load_balances(&self) -> RouletteResult<Balances> {
        let mut balances = Balances::new();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) =
                item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            let Some(id) = key.strip_prefix(BALANCE_PREFIX) else {
                continue;
            };
            let id = String::from_utf8(id.to_vec()).map_err(|e| {
                StorageError::CorruptedData(format!("Invalid player id bytes: {}", e))
            })?;
            let raw: [u8; 8] = value.as_ref().try_into().map_err(|_| {
                StorageError::CorruptedData(format!("Invalid balance bytes for {}", id))
            })?;
            balances.insert(id, Coins::from_le_bytes(raw));
        }
        Ok(balances)
    }

    fn save_balances(&self, balances: &Balances) -> RouletteResult<()> {
        let mut batch = WriteBatch::default();
        for (id, balance) in balances {
            batch.put(balance_key(id), balance.to_le_bytes());
        }
        self.db.write(batch).map_err(RouletteError::from)
    }
}

/// In-memory store for tests and throwaway tables
#[derive(Default)]
pub struct MemoryStore {
    balances: Mutex<Balances>,
    fail_saves: AtomicBool,
    saves: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with balances, as if loaded from an earlier run
    pub fn with_balances<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coins)>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut balances = store.balances.lock().unwrap_or_else(|e| e.into_inner());
            for (id, balance) in entries {
                balances.insert(id.into(), balance);
            }
        }
        store
    }

    /// Make every subsequent save fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// What a fresh load would return right now
    pub fn stored(&self) -> Balances {
        self.balances.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl BalanceStore for MemoryStore {
    fn load_balances(&self) -> RouletteResult<Balances> {
        Ok(self.stored())
    }

    fn save_balances(&self, balances: &Balances) -> RouletteResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("memory store configured to fail".to_string()).into());
        }
        *self.balances.lock().unwrap_or_else(|e| e.into_inner()) = balances.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Ledger, LedgerPolicy};
    use tempfile::TempDir;

    fn sample() -> Balances {
        let mut balances = Balances::new();
        balances.insert("alice".to_string(), 100);
        balances.insert("bob".to_string(), 0);
        balances
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("users_data.json"));
        assert!(store.load_balances().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("users_data.json"));
        store.save_balances(&sample()).unwrap();
        assert_eq!(store.load_balances().unwrap(), sample());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_json_store_garbage_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users_data.json");
        fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_balances(),
            Err(RouletteError::Storage(StorageError::CorruptedData(_)))
        ));
    }

    #[test]
    fn test_truncated_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users_data.json");
        let truncated: &[u8] = br#"{"alice": 5000, "bob": 700,"#;
        fs::write(&path, truncated).unwrap();

        let store: Arc<dyn BalanceStore> = Arc::new(JsonFileStore::new(&path));
        assert!(Ledger::open(store, LedgerPolicy::RegisteredOnly, 100).is_err());
        assert_eq!(fs::read(&path).unwrap(), truncated);
    }

    #[test]
    fn test_json_store_reads_plain_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users_data.json");
        fs::write(&path, br#"{"123": 90, "456": 450}"#).unwrap();
        let balances = JsonFileStore::new(&path).load_balances().unwrap();
        assert_eq!(balances.get("123"), Some(&90));
        assert_eq!(balances.get("456"), Some(&450));
    }

    #[test]
    fn test_rocksdb_store_round_trip() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            assert!(store.load_balances().unwrap().is_empty());
            store.save_balances(&sample()).unwrap();
        }
        let reopened = RocksDbStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load_balances().unwrap(), sample());
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryStore::with_balances([("alice", 10)]);
        store.fail_saves(true);
        assert!(store.save_balances(&sample()).is_err());
        assert_eq!(store.stored().get("alice"), Some(&10));
        assert_eq!(store.save_count(), 0);

        store.fail_saves(false);
        store.save_balances(&sample()).unwrap();
        assert_eq!(store.save_count(), 1);
    }
}
