use std::fs;

use minecasino::ledger::{Transaction, Vault};
use minecasino::mining::MiningCapacity;
use minecasino::persist::{
    FileStore, KeyValueStore, PersistError, STATS_KEY, WALLET_KEY, load_state, save_state,
};
use minecasino::wallet::Wallet;
use tempfile::TempDir;

fn busy_vault() -> Vault {
    let mut vault = Vault::default();
    vault
        .apply_transaction(Transaction::buy("SOL", 3.333_333_333_3, 485.999_999_99))
        .unwrap();
    vault
        .apply_transaction(Transaction::hardware_purchase("datacenter_node", 400.0))
        .unwrap();
    vault
        .apply_transaction(Transaction::hardware_purchase("datacenter_node", 400.0))
        .unwrap();
    vault.apply_transaction(Transaction::mining_reward(0.000_012_345_678_9)).unwrap();
    vault.connect("0x52908400098527886e0f7030069857d2e4169ee7");
    vault
}

#[test]
fn file_store_round_trips_the_vault() {
    let temp = TempDir::new().unwrap();
    let vault = busy_vault();
    {
        let mut store = FileStore::open(temp.path().join("data")).unwrap();
        save_state(&mut store, vault.wallet(), vault.mining()).unwrap();
    }
    assert!(temp.path().join("data").join(format!("{WALLET_KEY}.json")).exists());
    assert!(!temp.path().join("data").join(format!("{WALLET_KEY}.json.tmp")).exists());

    let store = FileStore::open(temp.path().join("data")).unwrap();
    let restored = load_state(&store).unwrap();
    assert!(!restored.migrated);
    assert_eq!(&restored.wallet, vault.wallet());
    assert_eq!(&restored.mining, vault.mining());
    assert_eq!(restored.mining.owned("datacenter_node"), 2);
}

#[test]
fn legacy_wallet_is_migrated_then_rewritten() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    let legacy_wallet = r#"{
        "balanceUSD": 1234.5,
        "assets": { "BTC": 0.25, "DOT": 40 },
        "nfts": [
            {
                "id": "nft-9",
                "name": "Cyber Pickaxe",
                "description": "Mines harder",
                "imageUrl": "https://picsum.photos/400/400",
                "traits": [{ "type": "Rarity", "value": "Epic" }]
            },
            { "name": "missing id is dropped" }
        ],
        "address": "0xabc"
    }"#;
    let legacy_stats = r#"{ "gpuEnabled": true, "gpuHashrate": 8700.5, "purchasedPlans": ["asic_pro"] }"#;
    store.set(WALLET_KEY, legacy_wallet).unwrap();
    store.set(STATS_KEY, legacy_stats).unwrap();

    let restored = load_state(&store).unwrap();
    assert!(restored.migrated);
    let wallet = &restored.wallet;
    assert_eq!(wallet.cash_balance, 1234.5);
    assert_eq!(wallet.quantity("BTC"), 0.25);
    assert_eq!(wallet.quantity("DOT"), 40.0);
    assert_eq!(wallet.quantity("ETH"), 0.0);
    assert_eq!(wallet.nfts.len(), 1);
    assert_eq!(wallet.nfts[0].image_url, "https://picsum.photos/400/400");
    assert_eq!(wallet.nfts[0].traits[0].kind, "Rarity");
    assert_eq!(wallet.address.as_deref(), Some("0xabc"));
    assert!(restored.mining.gpu_enabled);
    assert!(!restored.mining.cpu_enabled);
    assert_eq!(restored.mining.purchased_plans, vec!["asic_pro".to_string()]);

    save_state(&mut store, &restored.wallet, &restored.mining).unwrap();
    let again = load_state(&store).unwrap();
    assert!(!again.migrated);
    assert_eq!(again.wallet, restored.wallet);
    assert_eq!(again.mining, restored.mining);
}

#[test]
fn legacy_debts_are_clamped_to_zero() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    store
        .set(WALLET_KEY, r#"{ "balanceUSD": -500.0, "assets": { "BTC": -2.0, "ETH": 1.5 } }"#)
        .unwrap();
    store
        .set(STATS_KEY, r#"{ "totalMined": -0.3, "gpuHashrate": -10 }"#)
        .unwrap();

    let restored = load_state(&store).unwrap();
    assert!(restored.migrated);
    assert_eq!(restored.wallet.cash_balance, 0.0);
    assert_eq!(restored.wallet.quantity("BTC"), 0.0);
    assert_eq!(restored.wallet.quantity("ETH"), 1.5);
    assert_eq!(restored.mining.total_mined, 0.0);
    assert_eq!(restored.mining.gpu_hashrate, 0.0);

    let mut vault = Vault::new(restored.wallet, restored.mining);
    assert!(vault.apply_transaction(Transaction::withdraw(1.0)).is_err());
    assert!(vault.apply_transaction(Transaction::sell("BTC", 1.0, 60_000.0)).is_err());
}

#[test]
fn current_snapshot_with_negative_cash_is_clamped() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    let mut wallet = Wallet::with_cash(-75.0);
    wallet.credit_asset("SOL", 3.0);
    wallet.assets.insert("DOT".to_string(), -4.0);
    save_state(&mut store, &wallet, &MiningCapacity::default()).unwrap();

    let restored = load_state(&store).unwrap();
    assert!(!restored.migrated);
    assert_eq!(restored.wallet.cash_balance, 0.0);
    assert_eq!(restored.wallet.quantity("DOT"), 0.0);
    assert_eq!(restored.wallet.quantity("SOL"), 3.0);
}

#[test]
fn edited_snapshot_is_refused() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    save_state(&mut store, &Wallet::with_cash(10.0), &MiningCapacity::default()).unwrap();

    let path = temp.path().join(format!("{WALLET_KEY}.json"));
    let raw = fs::read_to_string(&path).unwrap();
    fs::write(&path, raw.replace("10.0", "10000000.0")).unwrap();

    let err = load_state(&store).unwrap_err();
    assert!(matches!(err, PersistError::Checksum { ref key } if key == WALLET_KEY), "{err}");
}

#[test]
fn half_written_store_keeps_the_other_half_default() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    let vault = busy_vault();
    save_state(&mut store, vault.wallet(), vault.mining()).unwrap();
    store.remove(STATS_KEY).unwrap();
    store.remove(STATS_KEY).unwrap();

    let restored = load_state(&store).unwrap();
    assert_eq!(&restored.wallet, vault.wallet());
    assert_eq!(restored.mining, MiningCapacity::default());
}

#[test]
fn garbage_is_a_json_error() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path()).unwrap();
    store.set(STATS_KEY, "{not json").unwrap();
    assert!(matches!(load_state(&store), Err(PersistError::Json(_))));
}
