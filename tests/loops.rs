use std::sync::mpsc;
use std::time::Duration;

use minecasino::ledger::{TransactionKind, Vault};
use minecasino::market::{Market, PriceDriftLoop};
use minecasino::mining::{AccrualLoop, AccrualRates, MiningCapacity};
use minecasino::rng::seeded;
use minecasino::schedule::{Interval, TickSource};
use minecasino::wallet::Wallet;
use proptest::prelude::*;

fn rig_with(plans: &[&str]) -> Vault {
    let mining = MiningCapacity {
        purchased_plans: plans.iter().map(|p| p.to_string()).collect(),
        ..MiningCapacity::default()
    };
    Vault::new(Wallet::with_cash(0.0), mining)
}

proptest! {
    #[test]
    fn chunking_does_not_change_the_tick_count(
        period_ms in 1u64..5_000,
        steps in prop::collection::vec(0u64..2_000, 1..200),
    ) {
        let mut chunked = Interval::new(Duration::from_millis(period_ms));
        chunked.start();
        let fired: u32 = steps
            .iter()
            .map(|ms| chunked.advance(Duration::from_millis(*ms)))
            .sum();

        let mut whole = Interval::new(Duration::from_millis(period_ms));
        whole.start();
        let total: u64 = steps.iter().sum();
        prop_assert_eq!(fired, whole.advance(Duration::from_millis(total)));
        prop_assert_eq!(u64::from(fired), total / period_ms);
    }
}

#[test]
fn plan_yield_is_credited_once_per_period() {
    let mut vault = rig_with(&["quantum_nexus", "asic_pro"]);
    let mut accrual = AccrualLoop::new(Duration::from_secs(3), AccrualRates::default());
    let mut rng = seeded("plan-yield");
    accrual.start();

    let mut mined = 0.0;
    for _ in 0..45 {
        mined += accrual.advance(Duration::from_millis(200), &mut vault, &mut rng);
    }

    // 3.25 MH/s at 0.000005 BTC per MH/s per tick, three ticks
    let per_tick = 3.25 * 0.000_005;
    assert!((mined - 3.0 * per_tick).abs() < 1e-15);
    assert!((vault.wallet().quantity("BTC") - mined).abs() < 1e-15);
    assert!((vault.mining().total_mined - mined).abs() < 1e-15);
    assert_eq!(vault.log().len(), 3);
    assert!(vault.log().iter().all(|tx| tx.kind == TransactionKind::MiningReward));
}

#[test]
fn restart_waits_a_full_period() {
    let mut vault = rig_with(&["asic_pro"]);
    let mut accrual = AccrualLoop::default();
    let mut rng = seeded("restart");
    accrual.start();
    assert_eq!(accrual.advance(Duration::from_millis(2_900), &mut vault, &mut rng), 0.0);
    accrual.stop();
    accrual.start();
    assert_eq!(accrual.advance(Duration::from_millis(200), &mut vault, &mut rng), 0.0);
    assert!(vault.log().is_empty());
    assert!(accrual.advance(Duration::from_millis(2_800), &mut vault, &mut rng) > 0.0);
}

#[test]
fn idle_rig_logs_nothing() {
    let mut vault = rig_with(&[]);
    let mut accrual = AccrualLoop::default();
    let mut rng = seeded("idle");
    accrual.start();
    assert_eq!(accrual.advance(Duration::from_secs(300), &mut vault, &mut rng), 0.0);
    assert!(vault.log().is_empty());
}

#[test]
fn drift_loop_moves_every_asset_per_tick() {
    let mut market = Market::default();
    let mut drift = PriceDriftLoop::new(Duration::from_secs(5));
    let mut rng = seeded("drift");

    assert_eq!(drift.advance(Duration::from_secs(60), &mut market, &mut rng), 0);
    assert_eq!(market, Market::default());

    drift.start();
    assert_eq!(drift.advance(Duration::from_secs(12), &mut market, &mut rng), 2);
    for (moved, seed) in market.assets().iter().zip(Market::default().assets()) {
        assert_ne!(moved.price, seed.price, "{}", moved.symbol);
        let ratio = moved.price / seed.price;
        assert!(ratio > 0.9989_f64.powi(2) && ratio < 1.0011_f64.powi(2));
        assert!(moved.high_24h >= moved.price && moved.low_24h <= moved.price);
    }

    drift.stop();
    let frozen = market.clone();
    assert_eq!(drift.advance(Duration::from_secs(60), &mut market, &mut rng), 0);
    assert_eq!(market, frozen);
}

#[test]
fn tick_source_drives_a_virtual_interval() {
    let (tx, rx) = mpsc::channel();
    let mut source = TickSource::spawn(Duration::from_millis(2), tx, |dt| dt);
    let mut interval = Interval::new(Duration::from_millis(10));
    interval.start();

    let mut fired = 0;
    while fired == 0 {
        let dt = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        fired += interval.advance(dt);
    }
    source.stop();
    assert!(fired >= 1);
}
