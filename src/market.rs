//! Displayed asset prices, their random drift, and trade quoting at the live
//! price. Nothing here touches a wallet.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::ledger::Transaction;
use crate::schedule::Interval;
use crate::wallet::Wallet;

const HISTORY_LEN: usize = 256;
/// Taken off the output leg of every swap.
pub const SWAP_FEE: f64 = 0.005;
/// Price moves at most this fraction per drift tick.
pub const PRICE_DRIFT: f64 = 0.001;
/// 24h change moves at most this many percentage points per drift tick.
pub const CHANGE_DRIFT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub market_cap: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub last_delta: f64,
    pub history: VecDeque<f64>,
}

impl Asset {
    fn new(
        id: &str,
        name: &str,
        symbol: &str,
        price: f64,
        change_24h: f64,
        market_cap: f64,
        range: (f64, f64),
    ) -> Self {
        let mut history = VecDeque::new();
        history.push_back(price);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            price,
            change_24h,
            market_cap,
            low_24h: range.0,
            high_24h: range.1,
            last_delta: 0.0,
            history,
        }
    }

    fn apply_drift(&mut self, price_factor: f64, change_delta: f64) {
        let new_price = self.price * (1.0 + price_factor);
        self.last_delta = new_price - self.price;
        self.price = new_price;
        self.change_24h += change_delta;
        self.high_24h = self.high_24h.max(new_price);
        self.low_24h = self.low_24h.min(new_price);
        self.history.push_back(new_price);
        while self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    assets: Vec<Asset>,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            assets: vec![
                Asset::new("bitcoin", "Bitcoin", "BTC", 64_230.50, 2.5, 1.26e12, (63_100.20, 65_400.00)),
                Asset::new("ethereum", "Ethereum", "ETH", 3_450.20, -1.2, 4.15e11, (3_410.00, 3_580.50)),
                Asset::new("solana", "Solana", "SOL", 145.80, 5.4, 6.5e10, (138.50, 152.00)),
                Asset::new("cardano", "Cardano", "ADA", 0.45, 0.8, 1.6e10, (0.44, 0.47)),
                Asset::new("polkadot", "Polkadot", "DOT", 7.20, -2.1, 1.05e10, (7.05, 7.55)),
            ],
        }
    }
}

/// One tick's perturbation: a multiplicative price factor and an additive
/// change to the 24h figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub price_factor: f64,
    pub change_delta: f64,
}

pub fn sample_drift<R: Rng + ?Sized>(rng: &mut R) -> Drift {
    Drift {
        price_factor: Uniform::new(-PRICE_DRIFT, PRICE_DRIFT).sample(rng),
        change_delta: Uniform::new(-CHANGE_DRIFT, CHANGE_DRIFT).sample(rng),
    }
}

impl Market {
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, symbol: &str) -> CoreResult<&Asset> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| CoreError::UnknownAsset(symbol.to_string()))
    }

    pub fn price(&self, symbol: &str) -> CoreResult<f64> {
        self.asset(symbol).map(|a| a.price)
    }

    /// Perturbs every tracked asset once.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for asset in self.assets.iter_mut() {
            let drift = sample_drift(rng);
            asset.apply_drift(drift.price_factor, drift.change_delta);
        }
    }

    pub fn quote_buy(&self, symbol: &str, amount: f64) -> CoreResult<Transaction> {
        let asset = self.asset(symbol)?;
        check_amount(amount)?;
        Ok(Transaction::buy(&asset.symbol, amount, asset.price * amount))
    }

    pub fn quote_sell(&self, symbol: &str, amount: f64) -> CoreResult<Transaction> {
        let asset = self.asset(symbol)?;
        check_amount(amount)?;
        Ok(Transaction::sell(&asset.symbol, amount, asset.price * amount))
    }

    /// Output is fixed at quote time; settlement does not look at later prices.
    pub fn quote_swap(&self, from: &str, to: &str, amount: f64) -> CoreResult<Transaction> {
        let from = self.asset(from)?;
        let to = self.asset(to)?;
        check_amount(amount)?;
        if from.symbol == to.symbol {
            return Err(CoreError::InvalidTransaction(format!(
                "cannot swap {} into itself",
                from.symbol
            )));
        }
        let output = amount * (from.price / to.price) * (1.0 - SWAP_FEE);
        Ok(Transaction::swap(
            &from.symbol,
            amount,
            &to.symbol,
            output,
            amount * from.price,
        ))
    }

    /// Cash plus holdings at live prices; untracked symbols count zero.
    pub fn portfolio_value(&self, wallet: &Wallet) -> f64 {
        let holdings: f64 = wallet
            .assets
            .iter()
            .filter_map(|(symbol, qty)| self.price(symbol).ok().map(|p| p * qty))
            .sum();
        wallet.cash_balance + holdings
    }
}

fn check_amount(amount: f64) -> CoreResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::InvalidTransaction(format!(
            "trade amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

pub const DRIFT_PERIOD: Duration = Duration::from_secs(5);

/// Owns the drift timer. Only ever touches the [`Market`] it is handed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDriftLoop {
    interval: Interval,
}

impl PriceDriftLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Interval::new(period),
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_running()
    }

    pub fn start(&mut self) {
        info!(period_ms = self.interval.period().as_millis() as u64, "price drift loop started");
        self.interval.start();
    }

    pub fn stop(&mut self) {
        info!("price drift loop stopped");
        self.interval.stop();
    }

    /// Applies every drift tick that fell inside `dt`; returns how many ran.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: Duration, market: &mut Market, rng: &mut R) -> u32 {
        let ticks = self.interval.advance(dt);
        for _ in 0..ticks {
            market.drift(rng);
        }
        ticks
    }
}

impl Default for PriceDriftLoop {
    fn default() -> Self {
        Self::new(DRIFT_PERIOD)
    }
}

pub fn format_price_delta(delta: f64) -> String {
    if delta.abs() < 0.005 {
        "±0.00".to_string()
    } else if delta >= 0.0 {
        format!("+{:.2}", delta)
    } else {
        format!("{:.2}", delta)
    }
}
