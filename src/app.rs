use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use minecasino::config::Config;
use minecasino::error::CoreResult;
use minecasino::games::baccarat::{BaccaratCall, DrawRule};
use minecasino::games::blackjack::{BlackjackParams, BlackjackTable};
use minecasino::games::crash::{CrashFlight, CrashParams, CrashRun};
use minecasino::games::dice::{DiceParams, MAX_TARGET, MIN_TARGET};
use minecasino::games::slots::{SlotParams, SlotTheme, ThemeId};
use minecasino::games::wheel::WheelParams;
use minecasino::games::{
    GameId, GameParams, GameRound, OutcomeDetail, baccarat::BaccaratParams, scratch::CELLS,
    scratch::ScratchParams,
};
use minecasino::ledger::{StakeHold, Transaction, TransactionKind, Vault};
use minecasino::mining::PLANS;
use minecasino::oracle;
use minecasino::persist::{self, FileStore, KeyValueStore};
use minecasino::schedule::Interval;
use minecasino::session::Session;

const MAX_MESSAGES: usize = 5;
const STAKES: [f64; 8] = [1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 500.0, 1000.0];
const TRADE_USD: f64 = 100.0;
const BULK_USD: f64 = 1000.0;
const CASH_MOVE_USD: f64 = 1000.0;
const SWAP_SHARE: f64 = 0.25;
const AUTOSAVE_PERIOD: Duration = Duration::from_secs(30);
const CRASH_LAUNCH_DELAY: Duration = Duration::from_millis(800);
const CRASH_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneFocus {
    Casino,
    Market,
    Mining,
    Ledger,
}

impl PaneFocus {
    fn next(self) -> Self {
        match self {
            PaneFocus::Casino => PaneFocus::Market,
            PaneFocus::Market => PaneFocus::Mining,
            PaneFocus::Mining => PaneFocus::Ledger,
            PaneFocus::Ledger => PaneFocus::Casino,
        }
    }

    fn prev(self) -> Self {
        match self {
            PaneFocus::Casino => PaneFocus::Ledger,
            PaneFocus::Market => PaneFocus::Casino,
            PaneFocus::Mining => PaneFocus::Market,
            PaneFocus::Ledger => PaneFocus::Mining,
        }
    }
}

fn reveal_delay(game: GameId) -> Duration {
    match game {
        GameId::Wheel => Duration::from_millis(5000),
        _ => Duration::from_millis(1500),
    }
}

// Every variant owns the hold taken for its stake.
#[derive(Debug)]
pub enum LiveTable {
    Pending {
        hold: StakeHold,
        round: GameRound,
        remaining: Duration,
    },
    Crash {
        hold: StakeHold,
        flight: CrashFlight,
        countdown: Duration,
        step_acc: Duration,
    },
    Blackjack { hold: StakeHold, table: BlackjackTable },
    Scratch { hold: StakeHold, round: GameRound },
}

#[derive(Debug)]
pub struct CasinoState {
    pub selected: usize,
    pub stake_idx: usize,
    pub dice_target: u32,
    pub baccarat: BaccaratParams,
    pub theme: ThemeId,
    pub table: Option<LiveTable>,
    pub last_result: Option<String>,
}

impl Default for CasinoState {
    fn default() -> Self {
        Self {
            selected: 0,
            stake_idx: 2,
            dice_target: DiceParams::default().target,
            baccarat: BaccaratParams::default(),
            theme: ThemeId::NeonMatrix,
            table: None,
            last_result: None,
        }
    }
}

impl CasinoState {
    pub fn game(&self) -> GameId {
        GameId::ALL[self.selected % GameId::ALL.len()]
    }

    pub fn stake(&self) -> f64 {
        STAKES[self.stake_idx]
    }

    fn params(&self) -> GameParams {
        match self.game() {
            GameId::Dice => GameParams::Dice(DiceParams {
                target: self.dice_target,
            }),
            GameId::Crash => GameParams::Crash(CrashParams::default()),
            GameId::Slots => GameParams::Slots(SlotParams {
                theme: SlotTheme::builtin(self.theme),
            }),
            GameId::Wheel => GameParams::Wheel(WheelParams::default()),
            GameId::Baccarat => GameParams::Baccarat(self.baccarat),
            GameId::Blackjack => GameParams::Blackjack(BlackjackParams::default()),
            GameId::Scratch => GameParams::Scratch(ScratchParams),
            GameId::Mines => GameParams::Mines,
        }
    }

    fn select_next(&mut self) {
        self.selected = (self.selected + 1) % GameId::ALL.len();
    }

    fn select_previous(&mut self) {
        if self.selected == 0 {
            self.selected = GameId::ALL.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn raise_stake(&mut self) {
        self.stake_idx = (self.stake_idx + 1).min(STAKES.len() - 1);
    }

    fn lower_stake(&mut self) {
        self.stake_idx = self.stake_idx.saturating_sub(1);
    }

    fn adjust(&mut self, up: bool) {
        match self.game() {
            GameId::Dice => {
                self.dice_target = if up {
                    (self.dice_target + 1).min(MAX_TARGET)
                } else {
                    self.dice_target.saturating_sub(1).max(MIN_TARGET)
                };
            }
            GameId::Baccarat => {
                self.baccarat.call = match (self.baccarat.call, up) {
                    (BaccaratCall::Player, true) | (BaccaratCall::Tie, false) => BaccaratCall::Banker,
                    (BaccaratCall::Banker, true) | (BaccaratCall::Player, false) => BaccaratCall::Tie,
                    (BaccaratCall::Tie, true) | (BaccaratCall::Banker, false) => BaccaratCall::Player,
                };
            }
            GameId::Slots => {
                let idx = ThemeId::ALL
                    .iter()
                    .position(|t| *t == self.theme)
                    .unwrap_or(0);
                let len = ThemeId::ALL.len();
                let next = if up { (idx + 1) % len } else { (idx + len - 1) % len };
                self.theme = ThemeId::ALL[next];
            }
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct ListPane {
    pub selected: usize,
}

impl ListPane {
    fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    fn select_previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        if self.selected == 0 {
            self.selected = len - 1;
        } else {
            self.selected -= 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct LedgerState {
    pub scroll: usize,
}

pub struct App {
    pub focus: PaneFocus,
    pub should_quit: bool,
    pub session: Session,
    pub casino: CasinoState,
    pub market: ListPane,
    pub mining: ListPane,
    pub ledger: LedgerState,
    pub messages: VecDeque<String>,
    store: Box<dyn KeyValueStore>,
    autosave: Interval,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.data_dir)
            .with_context(|| format!("opening data dir {}", config.data_dir.display()))?;
        Self::with_store(config, Box::new(store))
    }

    pub fn with_store(config: &Config, store: Box<dyn KeyValueStore>) -> Result<Self> {
        let restored = persist::load_state(store.as_ref()).context("loading saved vault")?;
        let mut session = Session::new(Vault::new(restored.wallet, restored.mining), config)?;
        session.start();
        let mut autosave = Interval::new(AUTOSAVE_PERIOD);
        autosave.start();

        let mut app = Self {
            focus: PaneFocus::Casino,
            should_quit: false,
            session,
            casino: CasinoState::default(),
            market: ListPane::default(),
            mining: ListPane::default(),
            ledger: LedgerState::default(),
            messages: VecDeque::new(),
            store,
            autosave,
        };
        if restored.migrated {
            app.push_message("Legacy save migrated to the current format");
        }
        Ok(app)
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.session.advance(dt);
        self.advance_table(dt);
        if self.autosave.advance(dt) > 0 {
            self.save();
        }
    }

    // open stakes are saved as already spent
    pub fn save(&mut self) {
        let vault = self.session.vault();
        let wallet = vault.committed_wallet();
        if let Err(err) = persist::save_state(self.store.as_mut(), &wallet, vault.mining()) {
            warn!(error = %err, "save failed");
            self.push_message(format!("Save failed: {}", err));
        }
    }

    pub fn shutdown(&mut self) {
        self.session.stop();
        self.autosave.stop();
        self.save();
    }

    fn push_message(&mut self, msg: impl Into<String>) {
        self.messages.push_front(msg.into());
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_back();
        }
    }

    fn report(&mut self, outcome: CoreResult<String>) {
        match outcome {
            Ok(msg) => self.push_message(msg),
            Err(err) => self.push_message(format!("Rejected: {}", err)),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Char('q' | 'Q')) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
            }
            _ => match self.focus {
                PaneFocus::Casino => self.handle_casino_input(key),
                PaneFocus::Market => self.handle_market_input(key),
                PaneFocus::Mining => self.handle_mining_input(key),
                PaneFocus::Ledger => self.handle_ledger_input(key),
            },
        }
    }

    fn handle_casino_input(&mut self, key: KeyEvent) {
        let idle = self.casino.table.is_none();
        match key.code {
            KeyCode::Up if idle => self.casino.select_previous(),
            KeyCode::Down if idle => self.casino.select_next(),
            KeyCode::Left if idle => self.casino.lower_stake(),
            KeyCode::Right if idle => self.casino.raise_stake(),
            KeyCode::Char('[') if idle => self.casino.adjust(false),
            KeyCode::Char(']') if idle => self.casino.adjust(true),
            KeyCode::Char('r') if idle && self.casino.game() == GameId::Baccarat => {
                self.casino.baccarat.rule = match self.casino.baccarat.rule {
                    DrawRule::TwoCard => DrawRule::Tableau,
                    DrawRule::Tableau => DrawRule::TwoCard,
                };
            }
            KeyCode::Enter if idle => self.open_table(),
            KeyCode::Enter => self.table_action(),
            KeyCode::Char('s') => self.stand(),
            KeyCode::Char('a') => self.reveal_all(),
            _ => {}
        }
    }

    fn open_table(&mut self) {
        let game = self.casino.game();
        let stake = self.casino.stake();
        let opened = match game {
            GameId::Crash => self.session.place_bet(stake).map(|hold| {
                let flight = CrashFlight::launch(self.session.rng_mut());
                LiveTable::Crash {
                    hold,
                    flight,
                    countdown: CRASH_LAUNCH_DELAY,
                    step_acc: Duration::ZERO,
                }
            }),
            GameId::Blackjack => self.session.place_bet(stake).map(|hold| {
                let table = BlackjackTable::deal(self.session.rng_mut());
                LiveTable::Blackjack { hold, table }
            }),
            GameId::Scratch => self
                .session
                .deal(&self.casino.params(), stake)
                .map(|(hold, round)| LiveTable::Scratch { hold, round }),
            _ => self
                .session
                .deal(&self.casino.params(), stake)
                .map(|(hold, round)| LiveTable::Pending {
                    hold,
                    remaining: reveal_delay(game),
                    round,
                }),
        };
        match opened {
            Ok(table) => {
                self.casino.table = Some(table);
                self.casino.last_result = None;
            }
            Err(err) => self.push_message(format!("{}: {}", game.title(), err)),
        }
    }

    fn table_action(&mut self) {
        let Some(table) = self.casino.table.as_mut() else {
            return;
        };
        match table {
            LiveTable::Crash { flight, countdown, .. } if countdown.is_zero() => {
                flight.cash_out();
            }
            LiveTable::Blackjack { table, .. } => {
                table.hit(self.session.rng_mut());
            }
            LiveTable::Scratch { round, .. } => {
                if let Some(card) = round.scratch_card_mut() {
                    if let Some(idx) = (0..CELLS).find(|i| !card.is_revealed(*i)) {
                        card.reveal(idx);
                    }
                }
            }
            _ => {}
        }
        self.close_if_finished();
    }

    fn stand(&mut self) {
        if let Some(LiveTable::Blackjack { table, .. }) = self.casino.table.as_mut() {
            table.stand(self.session.rng_mut());
        }
        self.close_if_finished();
    }

    fn reveal_all(&mut self) {
        if let Some(LiveTable::Scratch { round, .. }) = self.casino.table.as_mut() {
            if let Some(card) = round.scratch_card_mut() {
                card.reveal_all();
            }
        }
        self.close_if_finished();
    }

    fn advance_table(&mut self, dt: Duration) {
        match self.casino.table.as_mut() {
            Some(LiveTable::Pending { remaining, .. }) => {
                *remaining = remaining.saturating_sub(dt);
            }
            Some(LiveTable::Crash {
                flight,
                countdown,
                step_acc,
                ..
            }) => {
                if !countdown.is_zero() {
                    *countdown = countdown.saturating_sub(dt);
                    if countdown.is_zero() {
                        flight.step();
                    }
                } else {
                    *step_acc += dt;
                    while *step_acc >= CRASH_STEP && flight.is_flying() {
                        *step_acc -= CRASH_STEP;
                        flight.step();
                    }
                }
            }
            _ => return,
        }
        self.close_if_finished();
    }

    fn close_if_finished(&mut self) {
        let finished = match &self.casino.table {
            Some(LiveTable::Pending { remaining, .. }) => remaining.is_zero(),
            Some(LiveTable::Crash { flight, .. }) => !flight.is_flying(),
            Some(LiveTable::Blackjack { table, .. }) => table.is_finished(),
            Some(LiveTable::Scratch { round, .. }) => match &round.settlement().detail {
                OutcomeDetail::Scratch(card) => card.fully_revealed(),
                _ => true,
            },
            None => false,
        };
        if !finished {
            return;
        }
        let Some(table) = self.casino.table.take() else {
            return;
        };
        let (hold, round) = match table {
            LiveTable::Pending { hold, round, .. } | LiveTable::Scratch { hold, round } => {
                (hold, Ok(round))
            }
            LiveTable::Crash { hold, flight, .. } => {
                let stake = hold.stake();
                let run = flight.finish().unwrap_or(CrashRun {
                    crash_point: flight.multiplier(),
                    cashed_out_at: None,
                });
                let round = self.session.close_table(
                    GameId::Crash,
                    stake,
                    run.payout(stake),
                    OutcomeDetail::Crash(run),
                );
                (hold, round)
            }
            LiveTable::Blackjack { hold, table } => {
                let stake = hold.stake();
                let raw = table.result().map(|r| r.multiplier()).unwrap_or(0.0) * stake;
                let round = self.session.close_table(
                    GameId::Blackjack,
                    stake,
                    raw,
                    OutcomeDetail::Blackjack(table),
                );
                (hold, round)
            }
        };
        self.settle(hold, round);
    }

    fn settle(&mut self, hold: StakeHold, round: CoreResult<GameRound>) {
        let round = match round {
            Ok(round) => round,
            Err(err) => {
                self.session.cancel_bet(hold);
                self.push_message(format!("Round void: {}", err));
                return;
            }
        };
        let game = round.game();
        let mut line = format!("{}: {}", game.title(), round.settlement().detail.summary());
        if round.settlement().reversed {
            line.push_str(" (house reversal)");
        }
        let outcome = self
            .session
            .settle(hold, round)
            .map(|tx| format!("{} | paid ${:.2} on ${:.2}", line, tx.usd_value, tx.amount));
        if let Ok(msg) = &outcome {
            self.casino.last_result = Some(msg.clone());
        }
        self.report(outcome);
    }

    fn selected_symbol(&self) -> Option<String> {
        self.session
            .market()
            .assets()
            .get(self.market.selected)
            .map(|a| a.symbol.clone())
    }

    fn handle_market_input(&mut self, key: KeyEvent) {
        let len = self.session.market().assets().len();
        let Some(symbol) = self.selected_symbol() else {
            return;
        };
        let outcome = match key.code {
            KeyCode::Up => {
                self.market.select_previous(len);
                return;
            }
            KeyCode::Down => {
                self.market.select_next(len);
                return;
            }
            KeyCode::Right => self.session.buy_value(&symbol, TRADE_USD).map(describe),
            KeyCode::Left => self.session.sell_value(&symbol, TRADE_USD).map(describe),
            KeyCode::Char('b') => self.session.buy_value(&symbol, BULK_USD).map(describe),
            KeyCode::Char('m') => self.session.sell_value(&symbol, BULK_USD).map(describe),
            KeyCode::Char('s') => {
                let target = self.session.market().assets()[(self.market.selected + 1) % len]
                    .symbol
                    .clone();
                let amount = self.session.vault().wallet().quantity(&symbol) * SWAP_SHARE;
                self.session.swap(&symbol, &target, amount).map(describe)
            }
            KeyCode::Char('d') => self.session.deposit(CASH_MOVE_USD).map(describe),
            KeyCode::Char('w') => self.session.withdraw(CASH_MOVE_USD).map(describe),
            KeyCode::Char('x') => Ok(match self.session.toggle_wallet_connection() {
                Some(address) => format!("Wallet connected: {}", address),
                None => "Wallet disconnected".to_string(),
            }),
            KeyCode::Char('o') => {
                let context = oracle::build_context(
                    self.session.vault().wallet(),
                    self.session.market(),
                    &format!("How is my {} position doing?", symbol),
                );
                Ok(format!("Oracle context: {}", context.replace('\n', " ")))
            }
            _ => return,
        };
        self.report(outcome);
    }

    fn handle_mining_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.mining.select_previous(PLANS.len()),
            KeyCode::Down => self.mining.select_next(PLANS.len()),
            KeyCode::Enter => {
                let plan = PLANS[self.mining.selected % PLANS.len()];
                let outcome = self
                    .session
                    .purchase_plan(plan.id)
                    .map(|tx| format!("Deployed {} for ${:.2}", plan.name, tx.usd_value));
                self.report(outcome);
            }
            KeyCode::Char('c') => {
                let on = self.session.toggle_cpu();
                self.push_message(format!("CPU miner {}", if on { "online" } else { "offline" }));
            }
            KeyCode::Char('g') => {
                let on = self.session.toggle_gpu();
                self.push_message(format!("GPU miner {}", if on { "online" } else { "offline" }));
            }
            _ => {}
        }
    }

    fn handle_ledger_input(&mut self, key: KeyEvent) {
        let len = self.session.vault().log().len();
        match key.code {
            KeyCode::Up => self.ledger.scroll = self.ledger.scroll.saturating_sub(1),
            KeyCode::Down => {
                if self.ledger.scroll + 1 < len {
                    self.ledger.scroll += 1;
                }
            }
            _ => {}
        }
    }
}

fn describe(tx: &Transaction) -> String {
    match tx.kind {
        TransactionKind::Buy => format!(
            "Bought {:.6} {} for ${:.2}",
            tx.amount, tx.primary_asset, tx.usd_value
        ),
        TransactionKind::Sell => format!(
            "Sold {:.6} {} for ${:.2}",
            tx.amount, tx.primary_asset, tx.usd_value
        ),
        TransactionKind::Swap => format!(
            "Swapped {:.6} {} into {:.6} {}",
            tx.amount,
            tx.primary_asset,
            tx.secondary_amount.unwrap_or(0.0),
            tx.secondary_asset.as_deref().unwrap_or("?")
        ),
        TransactionKind::Deposit => format!("Deposited ${:.2}", tx.usd_value),
        TransactionKind::Withdraw => format!("Withdrew ${:.2}", tx.usd_value),
        _ => format!("{} {}", tx.kind, tx.id),
    }
}

pub fn local_time(at: DateTime<Utc>) -> DateTime<Local> {
    at.with_timezone(&Local)
}

pub fn format_hashrate(hashes_per_sec: f64) -> String {
    const UNITS: [&str; 5] = ["H/s", "kH/s", "MH/s", "GH/s", "TH/s"];
    let mut value = hashes_per_sec;
    let mut idx = 0usize;
    while value >= 1000.0 && idx + 1 < UNITS.len() {
        value /= 1000.0;
        idx += 1;
    }
    format!("{:.2} {}", value, UNITS[idx])
}

pub fn format_duration(duration: Duration) -> String {
    format!("{}.{}s", duration.as_secs(), duration.subsec_millis() / 100)
}
