//! Snapshot storage for the wallet and mining state.
//!
//! Each key holds an envelope `{version, checksum, payload}` where the checksum
//! is the blake3 hex digest of the compact payload JSON. Loading replaces state
//! wholesale. Unversioned blobs written by the legacy layout (version 0) are
//! migrated field by field, with absent fields taken from the fresh-session
//! defaults; any newer version is refused. Negative or non-finite balances,
//! holdings and mining figures from either path are clamped to zero.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::mining::MiningCapacity;
use crate::wallet::{Nft, NftTrait, Wallet};

pub const WALLET_KEY: &str = "mine_casino_wallet";
pub const STATS_KEY: &str = "mine_casino_stats";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage io failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checksum mismatch for {key}")]
    Checksum { key: String },
    #[error("snapshot {key} has unsupported version {found}")]
    UnsupportedVersion { key: String, found: u64 },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory. Writes go to a temporary
/// sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    payload: Value,
}

fn checksum(payload: &Value) -> String {
    blake3::hash(payload.to_string().as_bytes())
        .to_hex()
        .to_string()
}

fn seal<T: Serialize>(value: &T) -> Result<String, PersistError> {
    let payload = serde_json::to_value(value)?;
    let envelope = Envelope {
        version: SNAPSHOT_VERSION,
        checksum: checksum(&payload),
        payload,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

enum Opened {
    Current(Value),
    Legacy(Map<String, Value>),
}

fn open(key: &str, raw: &str) -> Result<Opened, PersistError> {
    let mut doc: Map<String, Value> = serde_json::from_str(raw)?;
    let Some(version) = doc.get("version").cloned() else {
        return Ok(Opened::Legacy(doc));
    };
    let found = version.as_u64().unwrap_or(u64::MAX);
    if found != u64::from(SNAPSHOT_VERSION) {
        return Err(PersistError::UnsupportedVersion {
            key: key.to_string(),
            found,
        });
    }
    let payload = doc.remove("payload").unwrap_or(Value::Null);
    let stored = doc.get("checksum").and_then(Value::as_str).unwrap_or_default();
    if stored != checksum(&payload) {
        return Err(PersistError::Checksum {
            key: key.to_string(),
        });
    }
    Ok(Opened::Current(payload))
}

/// State restored at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub wallet: Wallet,
    pub mining: MiningCapacity,
    /// True when at least one key was read in the legacy layout.
    pub migrated: bool,
}

pub fn save_state(
    store: &mut dyn KeyValueStore,
    wallet: &Wallet,
    mining: &MiningCapacity,
) -> Result<(), PersistError> {
    store.set(WALLET_KEY, &seal(wallet)?)?;
    store.set(STATS_KEY, &seal(mining)?)?;
    info!(
        cash = wallet.cash_balance,
        plans = mining.purchased_plans.len(),
        "state saved"
    );
    Ok(())
}

/// Reads both keys. A missing key yields the fresh-session default for that
/// half; a corrupt one is an error and nothing is restored.
pub fn load_state(store: &dyn KeyValueStore) -> Result<Restored, PersistError> {
    let mut migrated = false;

    let mut wallet = match store.get(WALLET_KEY)? {
        None => Wallet::genesis(),
        Some(raw) => match open(WALLET_KEY, &raw)? {
            Opened::Current(payload) => serde_json::from_value(payload)?,
            Opened::Legacy(doc) => {
                migrated = true;
                migrate_wallet(&doc)
            }
        },
    };
    clamp_wallet(&mut wallet);

    let mut mining = match store.get(STATS_KEY)? {
        None => MiningCapacity::default(),
        Some(raw) => match open(STATS_KEY, &raw)? {
            Opened::Current(payload) => serde_json::from_value(payload)?,
            Opened::Legacy(doc) => {
                migrated = true;
                migrate_stats(&doc)
            }
        },
    };
    clamp_mining(&mut mining);

    if migrated {
        warn!("legacy snapshot migrated; it will be rewritten on next save");
    }
    info!(cash = wallet.cash_balance, migrated, "state loaded");
    Ok(Restored {
        wallet,
        mining,
        migrated,
    })
}

fn clamp_amount(value: &mut f64, field: &str) {
    if !value.is_finite() || *value < 0.0 {
        warn!(field, value = *value, "restored amount out of range, clamped to zero");
        *value = 0.0;
    }
}

fn clamp_wallet(wallet: &mut Wallet) {
    clamp_amount(&mut wallet.cash_balance, "cash");
    for (symbol, qty) in wallet.assets.iter_mut() {
        clamp_amount(qty, symbol);
    }
}

fn clamp_mining(mining: &mut MiningCapacity) {
    clamp_amount(&mut mining.cpu_hashrate, "cpu_hashrate");
    clamp_amount(&mut mining.gpu_hashrate, "gpu_hashrate");
    clamp_amount(&mut mining.total_mined, "total_mined");
}

fn number(doc: &Map<String, Value>, key: &str) -> Option<f64> {
    doc.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn boolean(doc: &Map<String, Value>, key: &str) -> Option<bool> {
    doc.get(key).and_then(Value::as_bool)
}

fn text(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn migrate_wallet(doc: &Map<String, Value>) -> Wallet {
    let mut wallet = Wallet::genesis();
    if let Some(cash) = number(doc, "balanceUSD") {
        wallet.cash_balance = cash;
    }
    if let Some(assets) = doc.get("assets").and_then(Value::as_object) {
        wallet.assets = assets
            .iter()
            .filter_map(|(symbol, qty)| qty.as_f64().map(|q| (symbol.clone(), q)))
            .collect();
    }
    if let Some(nfts) = doc.get("nfts").and_then(Value::as_array) {
        wallet.nfts = nfts
            .iter()
            .filter_map(Value::as_object)
            .filter_map(migrate_nft)
            .collect();
    }
    wallet.address = text(doc, "address").filter(|a| !a.is_empty());
    wallet
}

fn migrate_nft(doc: &Map<String, Value>) -> Option<Nft> {
    let traits = doc
        .get("traits")
        .and_then(Value::as_array)
        .map(|traits| {
            traits
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|t| {
                    Some(NftTrait {
                        kind: text(t, "type")?,
                        value: text(t, "value")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(Nft {
        id: text(doc, "id")?,
        name: text(doc, "name")?,
        description: text(doc, "description").unwrap_or_default(),
        image_url: text(doc, "imageUrl").unwrap_or_default(),
        traits,
    })
}

fn migrate_stats(doc: &Map<String, Value>) -> MiningCapacity {
    let defaults = MiningCapacity::default();
    MiningCapacity {
        cpu_enabled: boolean(doc, "cpuEnabled").unwrap_or(defaults.cpu_enabled),
        cpu_hashrate: number(doc, "cpuHashrate").unwrap_or(defaults.cpu_hashrate),
        gpu_enabled: boolean(doc, "gpuEnabled").unwrap_or(defaults.gpu_enabled),
        gpu_hashrate: number(doc, "gpuHashrate").unwrap_or(defaults.gpu_hashrate),
        total_mined: number(doc, "totalMined").unwrap_or(defaults.total_mined),
        purchased_plans: doc
            .get("purchasedPlans")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.purchased_plans),
    }
}
