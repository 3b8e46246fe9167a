//! Transactions and the vault they are applied to.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use nanoid::nanoid;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::games::GameRound;
use crate::mining::{self, AccrualRates, MINED_ASSET, MiningCapacity};
use crate::wallet::{BALANCE_EPSILON, CASH, Wallet};

pub const LOG_CAPACITY: usize = 50;

const NANO_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Deposit,
    Withdraw,
    HardwarePurchase,
    Swap,
    GameSettlement,
    MiningReward,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::HardwarePurchase => "HARDWARE_PURCHASE",
            TransactionKind::Swap => "SWAP",
            TransactionKind::GameSettlement => "GAME_SETTLEMENT",
            TransactionKind::MiningReward => "MINING_REWARD",
        })
    }
}

/// An immutable ledger record. `primary_asset` carries the plan id for
/// hardware purchases and the game slug for settlements, where `amount` is the
/// stake and `usd_value` the payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub primary_asset: String,
    pub amount: f64,
    pub usd_value: f64,
    pub timestamp: DateTime<Utc>,
    pub secondary_asset: Option<String>,
    pub secondary_amount: Option<f64>,
}

impl Transaction {
    fn new(kind: TransactionKind, primary_asset: &str, amount: f64, usd_value: f64) -> Self {
        Self {
            id: nanoid!(9, NANO_ALPHABET),
            kind,
            primary_asset: primary_asset.to_string(),
            amount,
            usd_value,
            timestamp: Utc::now(),
            secondary_asset: None,
            secondary_amount: None,
        }
    }

    pub fn buy(symbol: &str, amount: f64, usd_value: f64) -> Self {
        Self::new(TransactionKind::Buy, symbol, amount, usd_value)
    }

    pub fn sell(symbol: &str, amount: f64, usd_value: f64) -> Self {
        Self::new(TransactionKind::Sell, symbol, amount, usd_value)
    }

    pub fn deposit(usd_value: f64) -> Self {
        Self::new(TransactionKind::Deposit, CASH, usd_value, usd_value)
    }

    pub fn withdraw(usd_value: f64) -> Self {
        Self::new(TransactionKind::Withdraw, CASH, usd_value, usd_value)
    }

    pub fn hardware_purchase(plan_id: &str, cost: f64) -> Self {
        Self::new(TransactionKind::HardwarePurchase, plan_id, 1.0, cost)
    }

    pub fn swap(from: &str, amount: f64, to: &str, to_amount: f64, usd_value: f64) -> Self {
        let mut tx = Self::new(TransactionKind::Swap, from, amount, usd_value);
        tx.secondary_asset = Some(to.to_string());
        tx.secondary_amount = Some(to_amount);
        tx
    }

    pub fn mining_reward(amount: f64) -> Self {
        Self::new(TransactionKind::MiningReward, MINED_ASSET, amount, 0.0)
    }

    /// Consumes the round so it can only ever be settled once.
    pub fn game_settlement(round: GameRound) -> Self {
        Self::new(
            TransactionKind::GameSettlement,
            round.game().slug(),
            round.stake(),
            round.payout(),
        )
    }

    fn validate(&self) -> CoreResult<()> {
        let amounts = [Some(self.amount), Some(self.usd_value), self.secondary_amount];
        if amounts
            .iter()
            .flatten()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(CoreError::InvalidTransaction(format!(
                "{} {} carries a negative or non-finite amount",
                self.kind, self.id
            )));
        }
        if self.primary_asset.trim().is_empty() {
            return Err(CoreError::InvalidTransaction(format!(
                "{} {} has no primary asset",
                self.kind, self.id
            )));
        }
        if self.kind == TransactionKind::Swap
            && (self.secondary_asset.is_none() || self.secondary_amount.is_none())
        {
            return Err(CoreError::InvalidTransaction(format!(
                "swap {} is missing its destination leg",
                self.id
            )));
        }
        Ok(())
    }
}

/// Most-recent-first history, oldest entries evicted past capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLog {
    entries: VecDeque<Transaction>,
    capacity: usize,
}

impl TransactionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, tx: Transaction) {
        self.entries.push_front(tx);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Transaction> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|tx| tx.id == id)
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

/// Cash reserved for one round from the moment the bet is placed until the
/// round settles. Redeemed by [`Vault::settle_round`] or
/// [`Vault::release_hold`], each of which consumes it.
#[derive(Debug, PartialEq)]
#[must_use = "held cash stays reserved until the hold is settled or released"]
pub struct StakeHold {
    stake: f64,
}

impl StakeHold {
    pub fn stake(&self) -> f64 {
        self.stake
    }
}

/// Wallet and mining state behind a single mutation entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Vault {
    wallet: Wallet,
    mining: MiningCapacity,
    log: TransactionLog,
    held: f64,
}

impl Vault {
    pub fn new(wallet: Wallet, mining: MiningCapacity) -> Self {
        Self {
            wallet,
            mining,
            log: TransactionLog::default(),
            held: 0.0,
        }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn mining(&self) -> &MiningCapacity {
        &self.mining
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Cash reserved by open rounds.
    pub fn held(&self) -> f64 {
        self.held
    }

    /// Cash that trades, withdrawals and new stakes may spend.
    pub fn free_cash(&self) -> f64 {
        (self.wallet.cash_balance - self.held).max(0.0)
    }

    /// The wallet with every held stake already lost. Snapshots store this,
    /// so a session cut off mid-round still pays for the bet.
    pub fn committed_wallet(&self) -> Wallet {
        let mut wallet = self.wallet.clone();
        wallet.cash_balance = self.free_cash();
        wallet
    }

    /// Toggles and address changes do not move balances, so they bypass the log.
    pub fn mining_mut(&mut self) -> &mut MiningCapacity {
        &mut self.mining
    }

    pub fn connect(&mut self, address: impl Into<String>) {
        self.wallet.connect(address);
    }

    pub fn disconnect(&mut self) -> Option<String> {
        self.wallet.disconnect()
    }

    /// Stake check a caller runs before dealing a round.
    pub fn check_stake(&self, stake: f64) -> CoreResult<()> {
        crate::games::validate_stake(stake)?;
        if self.check_free_cash(stake).is_err() {
            return Err(CoreError::InvalidStake(format!(
                "stake {stake:.2} exceeds cash balance {:.2}",
                self.free_cash()
            )));
        }
        Ok(())
    }

    /// Places a bet: reserves `stake` out of free cash until the round settles.
    pub fn hold_stake(&mut self, stake: f64) -> CoreResult<StakeHold> {
        self.check_stake(stake)?;
        self.held += stake;
        debug!(stake, held = self.held, "stake held");
        Ok(StakeHold { stake })
    }

    /// Returns a hold's cash without settling anything.
    pub fn release_hold(&mut self, hold: StakeHold) {
        self.held = (self.held - hold.stake).max(0.0);
        debug!(stake = hold.stake, held = self.held, "stake released");
    }

    fn check_free_cash(&self, amount: f64) -> CoreResult<()> {
        let free = self.free_cash();
        if free + BALANCE_EPSILON < amount {
            return Err(CoreError::insufficient(CASH, amount, free));
        }
        Ok(())
    }

    /// Applies `tx` and records it, or rejects it and changes nothing.
    pub fn apply_transaction(&mut self, tx: Transaction) -> CoreResult<&Transaction> {
        if let Err(err) = tx.validate().and_then(|_| self.settle(&tx)) {
            warn!(id = %tx.id, kind = %tx.kind, error = %err, "transaction rejected");
            return Err(err);
        }
        info!(
            id = %tx.id,
            kind = %tx.kind,
            asset = %tx.primary_asset,
            amount = tx.amount,
            usd = tx.usd_value,
            "transaction applied"
        );
        self.log.push(tx);
        self.log
            .latest()
            .ok_or_else(|| CoreError::InvalidTransaction("log rejected entry".to_string()))
    }

    /// Settles a round against the hold taken when its bet was placed. The
    /// hold is spent either way.
    pub fn settle_round(&mut self, hold: StakeHold, round: GameRound) -> CoreResult<&Transaction> {
        let held = hold.stake;
        self.release_hold(hold);
        if (round.stake() - held).abs() > BALANCE_EPSILON {
            let err = CoreError::InvalidStake(format!(
                "round stake {:.2} does not match the {held:.2} held for it",
                round.stake()
            ));
            warn!(game = %round.game(), error = %err, "settlement rejected");
            return Err(err);
        }
        self.apply_transaction(Transaction::game_settlement(round))
    }

    /// Runs one accrual tick and credits the yield. Returns the mined amount,
    /// or `None` when the rig produced nothing.
    pub fn accrue<R: Rng + ?Sized>(&mut self, rates: &AccrualRates, rng: &mut R) -> Option<f64> {
        let earned = mining::accrual_amount(&self.mining, rates, rng);
        if earned <= 0.0 {
            return None;
        }
        self.apply_transaction(Transaction::mining_reward(earned))
            .ok()
            .map(|tx| tx.amount)
    }

    fn settle(&mut self, tx: &Transaction) -> CoreResult<()> {
        if matches!(
            tx.kind,
            TransactionKind::Buy | TransactionKind::Withdraw | TransactionKind::HardwarePurchase
        ) {
            self.check_free_cash(tx.usd_value)?;
        }
        if tx.kind == TransactionKind::GameSettlement {
            self.check_stake(tx.amount)?;
        }
        let wallet = &mut self.wallet;
        match tx.kind {
            TransactionKind::Buy => {
                wallet.debit_cash(tx.usd_value)?;
                wallet.credit_asset(&tx.primary_asset, tx.amount);
            }
            TransactionKind::Sell => {
                wallet.debit_asset(&tx.primary_asset, tx.amount)?;
                wallet.credit_cash(tx.usd_value);
            }
            TransactionKind::Deposit => wallet.credit_cash(tx.usd_value),
            TransactionKind::Withdraw => wallet.debit_cash(tx.usd_value)?,
            TransactionKind::HardwarePurchase => {
                if mining::find_plan(&tx.primary_asset).is_none() {
                    return Err(CoreError::UnknownAsset(tx.primary_asset.clone()));
                }
                wallet.debit_cash(tx.usd_value)?;
                self.mining.purchased_plans.push(tx.primary_asset.clone());
            }
            TransactionKind::Swap => {
                let (Some(to), Some(to_amount)) = (&tx.secondary_asset, tx.secondary_amount)
                else {
                    return Err(CoreError::InvalidTransaction(tx.id.clone()));
                };
                wallet.debit_asset(&tx.primary_asset, tx.amount)?;
                wallet.credit_asset(to, to_amount);
            }
            TransactionKind::GameSettlement => {
                wallet.debit_cash(tx.amount)?;
                wallet.credit_cash(tx.usd_value);
            }
            TransactionKind::MiningReward => {
                wallet.credit_asset(&tx.primary_asset, tx.amount);
                self.mining.total_mined += tx.amount;
            }
        }
        Ok(())
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self::new(Wallet::genesis(), MiningCapacity::default())
    }
}
