//! One player's running session: the vault, the market, both background
//! loops and the random source, advanced together on a single thread.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tracing::info;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::games::{EdgePolicy, GameId, GameParams, GameRound, OutcomeDetail};
use crate::ledger::{StakeHold, Transaction, Vault};
use crate::market::{Market, PriceDriftLoop};
use crate::mining::{self, AccrualLoop, AccrualRates};
use crate::rng;
use crate::wallet;

const RECENT_WINS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Win {
    pub game: GameId,
    pub payout: f64,
    pub at: DateTime<Utc>,
}

/// What the background loops did during one [`Session::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub mined: f64,
    pub drift_ticks: u32,
}

pub struct Session {
    vault: Vault,
    market: Market,
    edge: EdgePolicy,
    accrual: AccrualLoop,
    drift: PriceDriftLoop,
    rng: StdRng,
    recent_wins: VecDeque<Win>,
}

impl Session {
    pub fn new(vault: Vault, config: &Config) -> CoreResult<Self> {
        let edge = EdgePolicy::house(config.reversal_probability)?;
        let rng = match &config.seed {
            Some(phrase) => rng::seeded(phrase),
            None => rng::from_entropy(),
        };
        Ok(Self {
            vault,
            market: Market::default(),
            edge,
            accrual: AccrualLoop::new(config.accrual_period, AccrualRates::default()),
            drift: PriceDriftLoop::new(config.drift_period),
            rng,
            recent_wins: VecDeque::with_capacity(RECENT_WINS),
        })
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn edge(&self) -> &EdgePolicy {
        &self.edge
    }

    pub fn recent_wins(&self) -> impl Iterator<Item = &Win> {
        self.recent_wins.iter()
    }

    /// Randomness for interactive tables that draw between player actions.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn loops_running(&self) -> bool {
        self.accrual.is_running() && self.drift.is_running()
    }

    pub fn start(&mut self) {
        self.accrual.start();
        self.drift.start();
    }

    /// Halts both loops. Pending partial periods are discarded.
    pub fn stop(&mut self) {
        self.accrual.stop();
        self.drift.stop();
    }

    pub fn advance(&mut self, dt: Duration) -> TickReport {
        TickReport {
            mined: self.accrual.advance(dt, &mut self.vault, &mut self.rng),
            drift_ticks: self.drift.advance(dt, &mut self.market, &mut self.rng),
        }
    }

    pub fn portfolio_value(&self) -> f64 {
        self.market.portfolio_value(self.vault.wallet())
    }

    /// Reserves the stake for a table whose outcome unfolds over several
    /// player actions.
    pub fn place_bet(&mut self, stake: f64) -> CoreResult<StakeHold> {
        self.vault.hold_stake(stake)
    }

    /// Drops a bet that never reached a round.
    pub fn cancel_bet(&mut self, hold: StakeHold) {
        self.vault.release_hold(hold);
    }

    /// Places the bet and resolves the round without settling it.
    pub fn deal(&mut self, params: &GameParams, stake: f64) -> CoreResult<(StakeHold, GameRound)> {
        let hold = self.vault.hold_stake(stake)?;
        match GameRound::play(params, stake, &self.edge, &mut self.rng) {
            Ok(round) => Ok((hold, round)),
            Err(err) => {
                self.vault.release_hold(hold);
                Err(err)
            }
        }
    }

    /// Closes an interactive table whose raw payout is already known.
    pub fn close_table(
        &mut self,
        game: GameId,
        stake: f64,
        raw_payout: f64,
        detail: OutcomeDetail,
    ) -> CoreResult<GameRound> {
        GameRound::from_outcome(game, stake, raw_payout, detail, &self.edge, &mut self.rng)
    }

    pub fn settle(&mut self, hold: StakeHold, round: GameRound) -> CoreResult<&Transaction> {
        let game = round.game();
        let payout = round.payout();
        let tx = self.vault.settle_round(hold, round)?;
        if payout > 0.0 {
            self.recent_wins.push_front(Win {
                game,
                payout,
                at: tx.timestamp,
            });
            while self.recent_wins.len() > RECENT_WINS {
                self.recent_wins.pop_back();
            }
        }
        Ok(tx)
    }

    pub fn play(&mut self, params: &GameParams, stake: f64) -> CoreResult<&Transaction> {
        let (hold, round) = self.deal(params, stake)?;
        self.settle(hold, round)
    }

    pub fn buy(&mut self, symbol: &str, amount: f64) -> CoreResult<&Transaction> {
        let tx = self.market.quote_buy(symbol, amount)?;
        self.vault.apply_transaction(tx)
    }

    /// Buys as much of `symbol` as `usd` pays for at the live price.
    pub fn buy_value(&mut self, symbol: &str, usd: f64) -> CoreResult<&Transaction> {
        let price = self.market.price(symbol)?;
        self.buy(symbol, usd / price)
    }

    pub fn sell(&mut self, symbol: &str, amount: f64) -> CoreResult<&Transaction> {
        let tx = self.market.quote_sell(symbol, amount)?;
        self.vault.apply_transaction(tx)
    }

    pub fn sell_value(&mut self, symbol: &str, usd: f64) -> CoreResult<&Transaction> {
        let price = self.market.price(symbol)?;
        self.sell(symbol, usd / price)
    }

    pub fn swap(&mut self, from: &str, to: &str, amount: f64) -> CoreResult<&Transaction> {
        let tx = self.market.quote_swap(from, to, amount)?;
        self.vault.apply_transaction(tx)
    }

    pub fn deposit(&mut self, usd: f64) -> CoreResult<&Transaction> {
        self.vault.apply_transaction(Transaction::deposit(usd))
    }

    pub fn withdraw(&mut self, usd: f64) -> CoreResult<&Transaction> {
        self.vault.apply_transaction(Transaction::withdraw(usd))
    }

    pub fn purchase_plan(&mut self, plan_id: &str) -> CoreResult<&Transaction> {
        let plan = mining::find_plan(plan_id)
            .ok_or_else(|| CoreError::UnknownAsset(plan_id.to_string()))?;
        self.vault
            .apply_transaction(Transaction::hardware_purchase(plan.id, plan.cost))
    }

    pub fn toggle_cpu(&mut self) -> bool {
        let on = self.vault.mining_mut().toggle_cpu(&mut self.rng);
        info!(on, "cpu miner toggled");
        on
    }

    pub fn toggle_gpu(&mut self) -> bool {
        let on = self.vault.mining_mut().toggle_gpu(&mut self.rng);
        info!(on, "gpu miner toggled");
        on
    }

    /// Connects a mock address, or disconnects if one is already stored.
    /// Returns the address now attached.
    pub fn toggle_wallet_connection(&mut self) -> Option<&str> {
        if let Some(old) = self.vault.disconnect() {
            info!(address = %old, "wallet disconnected");
            return None;
        }
        let address = wallet::mock_address(&mut self.rng);
        info!(address = %address, "wallet connected");
        self.vault.connect(address);
        self.vault.wallet().address.as_deref()
    }
}
