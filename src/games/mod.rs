//! Outcome engine: one resolver per game, a shared stake check and a
//! configurable reversal layer applied after the raw payout is known.
//!
//! Draw order inside a round is fixed (the game's own draws first, then at
//! most one reversal coin), so a [`ScriptedSource`](crate::rng::ScriptedSource)
//! replays a round exactly.

pub mod baccarat;
pub mod blackjack;
pub mod cards;
pub mod crash;
pub mod dice;
pub mod scratch;
pub mod slots;
pub mod wheel;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::rng::RandomSource;

use self::baccarat::{BaccaratCoup, BaccaratParams};
use self::blackjack::{BlackjackParams, BlackjackTable};
use self::crash::{CrashParams, CrashRun};
use self::dice::{DiceParams, DiceRoll};
use self::scratch::{ScratchCard, ScratchParams};
use self::slots::{SlotParams, SlotSpin};
use self::wheel::{WheelParams, WheelSpin};

/// Default chance that the reversal coin zeroes a winning round.
pub const DEFAULT_REVERSAL_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameId {
    Dice,
    Crash,
    Slots,
    Wheel,
    Baccarat,
    Blackjack,
    Scratch,
    Mines,
}

impl GameId {
    pub const ALL: [GameId; 8] = [
        GameId::Dice,
        GameId::Crash,
        GameId::Slots,
        GameId::Wheel,
        GameId::Baccarat,
        GameId::Blackjack,
        GameId::Scratch,
        GameId::Mines,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            GameId::Dice => "dice",
            GameId::Crash => "crash",
            GameId::Slots => "slots",
            GameId::Wheel => "wheel",
            GameId::Baccarat => "baccarat",
            GameId::Blackjack => "blackjack",
            GameId::Scratch => "scratch",
            GameId::Mines => "mines",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameId::Dice => "HODL Dice",
            GameId::Crash => "Rocket Crash",
            GameId::Slots => "Pokies & Slots",
            GameId::Wheel => "Mega Vault Wheel",
            GameId::Baccarat => "Baccarat Node",
            GameId::Blackjack => "Satoshi 21",
            GameId::Scratch => "Satoshi Scratchers",
            GameId::Mines => "Blockchain Mines",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for GameId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        GameId::ALL
            .iter()
            .copied()
            .find(|id| id.slug() == needle)
            .ok_or_else(|| CoreError::UnknownGame(s.to_string()))
    }
}

/// Typed parameters for each game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameParams {
    Dice(DiceParams),
    Crash(CrashParams),
    Slots(SlotParams),
    Wheel(WheelParams),
    Baccarat(BaccaratParams),
    Blackjack(BlackjackParams),
    Scratch(ScratchParams),
    Mines,
}

impl GameParams {
    pub fn game_id(&self) -> GameId {
        match self {
            GameParams::Dice(_) => GameId::Dice,
            GameParams::Crash(_) => GameId::Crash,
            GameParams::Slots(_) => GameId::Slots,
            GameParams::Wheel(_) => GameId::Wheel,
            GameParams::Baccarat(_) => GameId::Baccarat,
            GameParams::Blackjack(_) => GameId::Blackjack,
            GameParams::Scratch(_) => GameId::Scratch,
            GameParams::Mines => GameId::Mines,
        }
    }

    pub fn default_for(game: GameId) -> Self {
        match game {
            GameId::Dice => GameParams::Dice(DiceParams::default()),
            GameId::Crash => GameParams::Crash(CrashParams::default()),
            GameId::Slots => GameParams::Slots(SlotParams::default()),
            GameId::Wheel => GameParams::Wheel(WheelParams::default()),
            GameId::Baccarat => GameParams::Baccarat(BaccaratParams::default()),
            GameId::Blackjack => GameParams::Blackjack(BlackjackParams::default()),
            GameId::Scratch => GameParams::Scratch(ScratchParams),
            GameId::Mines => GameParams::Mines,
        }
    }
}

/// Secondary coin flip that can zero a positive raw payout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalRule {
    pub probability: f64,
}

impl ReversalRule {
    pub fn new(probability: f64) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(CoreError::InvalidEdge(format!(
                "reversal probability {probability} outside [0, 1]"
            )));
        }
        Ok(Self { probability })
    }
}

/// Per-game house-edge layer. Games without a rule pay their raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePolicy {
    reversals: BTreeMap<GameId, ReversalRule>,
}

impl EdgePolicy {
    /// No reversal anywhere; every game pays its raw table.
    pub fn fair() -> Self {
        Self {
            reversals: BTreeMap::new(),
        }
    }

    /// Reversal on slots, wheel and scratch cards at the given probability.
    pub fn house(probability: f64) -> CoreResult<Self> {
        let rule = ReversalRule::new(probability)?;
        let reversals = [GameId::Slots, GameId::Wheel, GameId::Scratch]
            .into_iter()
            .map(|game| (game, rule))
            .collect();
        Ok(Self { reversals })
    }

    pub fn with_reversal(mut self, game: GameId, rule: ReversalRule) -> Self {
        self.reversals.insert(game, rule);
        self
    }

    pub fn without_reversal(mut self, game: GameId) -> Self {
        self.reversals.remove(&game);
        self
    }

    pub fn reversal_for(&self, game: GameId) -> Option<ReversalRule> {
        self.reversals.get(&game).copied()
    }
}

impl Default for EdgePolicy {
    fn default() -> Self {
        let rule = ReversalRule {
            probability: DEFAULT_REVERSAL_PROBABILITY,
        };
        Self::fair()
            .with_reversal(GameId::Slots, rule)
            .with_reversal(GameId::Wheel, rule)
            .with_reversal(GameId::Scratch, rule)
    }
}

/// What was drawn in a round.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeDetail {
    Dice(DiceRoll),
    Crash(CrashRun),
    Slots(SlotSpin),
    Wheel(WheelSpin),
    Baccarat(BaccaratCoup),
    Blackjack(BlackjackTable),
    Scratch(ScratchCard),
}

impl OutcomeDetail {
    pub fn summary(&self) -> String {
        match self {
            OutcomeDetail::Dice(roll) => format!("rolled {} vs > {}", roll.roll, roll.target),
            OutcomeDetail::Crash(run) => match run.cashed_out_at {
                Some(at) => format!("cashed out {:.2}x, crashed {:.2}x", at, run.crash_point),
                None => format!("crashed at {:.2}x", run.crash_point),
            },
            OutcomeDetail::Slots(spin) => format!("{} winning row(s)", spin.wins.len()),
            OutcomeDetail::Wheel(spin) => {
                format!("segment {} ({}x)", spin.segment, spin.multiplier)
            }
            OutcomeDetail::Baccarat(coup) => format!(
                "player {} / banker {}: {}",
                coup.player_value, coup.banker_value, coup.winner
            ),
            OutcomeDetail::Blackjack(table) => match table.result() {
                Some(result) => format!(
                    "{} ({} vs {})",
                    result,
                    table.player_value(),
                    table.dealer_value()
                ),
                None => "in play".to_string(),
            },
            OutcomeDetail::Scratch(card) => format!("{} matching group(s)", card.groups().len()),
        }
    }
}

/// The resolved result of a wager, before it touches any wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub raw_payout: f64,
    pub payout: f64,
    pub reversed: bool,
    pub detail: OutcomeDetail,
}

/// A single wager threaded from bet placement to settlement. Consumed when it
/// is turned into a ledger transaction, and neither cloneable nor buildable
/// outside this crate, so one deal settles at most once.
///
/// ```compile_fail
/// fn settle_twice(round: minecasino::GameRound) {
///     let copy = round.clone();
///     drop((copy, round));
/// }
/// ```
///
/// ```compile_fail
/// use minecasino::games::{GameId, GameRound};
///
/// fn forge(round: &GameRound) -> GameRound {
///     GameRound { game: GameId::Dice, stake: 1.0, settlement: round.settlement().clone() }
/// }
/// ```
#[derive(Debug, PartialEq)]
pub struct GameRound {
    game: GameId,
    stake: f64,
    settlement: Settlement,
}

impl GameRound {
    pub fn play<R: RandomSource + ?Sized>(
        params: &GameParams,
        stake: f64,
        edge: &EdgePolicy,
        rng: &mut R,
    ) -> CoreResult<Self> {
        let settlement = resolve_round(params, stake, edge, rng)?;
        Ok(Self {
            game: params.game_id(),
            stake,
            settlement,
        })
    }

    /// Wraps an outcome produced outside `resolve_round` (interactive tables),
    /// applying the same edge layer.
    pub fn from_outcome<R: RandomSource + ?Sized>(
        game: GameId,
        stake: f64,
        raw_payout: f64,
        detail: OutcomeDetail,
        edge: &EdgePolicy,
        rng: &mut R,
    ) -> CoreResult<Self> {
        validate_stake(stake)?;
        let settlement = apply_edge(game, raw_payout, detail, edge, rng);
        Ok(Self {
            game,
            stake,
            settlement,
        })
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn stake(&self) -> f64 {
        self.stake
    }

    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    /// The card of a scratch round, so cells can be revealed before settling.
    /// The payout is fixed when the round is dealt.
    pub fn scratch_card_mut(&mut self) -> Option<&mut ScratchCard> {
        match &mut self.settlement.detail {
            OutcomeDetail::Scratch(card) => Some(card),
            _ => None,
        }
    }

    pub fn raw_multiplier(&self) -> f64 {
        self.settlement.raw_payout / self.stake
    }

    pub fn payout(&self) -> f64 {
        self.settlement.payout
    }

    pub fn is_win(&self) -> bool {
        self.settlement.payout > 0.0
    }
}

pub fn validate_stake(stake: f64) -> CoreResult<()> {
    if !stake.is_finite() || stake <= 0.0 {
        return Err(CoreError::InvalidStake(format!(
            "stake must be a finite positive amount, got {stake}"
        )));
    }
    Ok(())
}

/// Resolves one wager. Pure apart from the draws taken from `rng`; the
/// returned payout is never negative.
pub fn resolve_round<R: RandomSource + ?Sized>(
    params: &GameParams,
    stake: f64,
    edge: &EdgePolicy,
    rng: &mut R,
) -> CoreResult<Settlement> {
    validate_stake(stake)?;
    let game = params.game_id();
    let (raw_payout, detail) = match params {
        GameParams::Dice(p) => {
            let roll = dice::roll(p, rng)?;
            (roll.payout(stake), OutcomeDetail::Dice(roll))
        }
        GameParams::Crash(p) => {
            let run = crash::run(p, rng)?;
            (run.payout(stake), OutcomeDetail::Crash(run))
        }
        GameParams::Slots(p) => {
            let spin = slots::spin(&p.theme, rng);
            (spin.payout(&p.theme, stake), OutcomeDetail::Slots(spin))
        }
        GameParams::Wheel(p) => {
            let spin = wheel::spin(p, rng);
            (spin.multiplier * stake, OutcomeDetail::Wheel(spin))
        }
        GameParams::Baccarat(p) => {
            let coup = baccarat::deal(p.rule, rng);
            (coup.multiplier_for(p.call) * stake, OutcomeDetail::Baccarat(coup))
        }
        GameParams::Blackjack(p) => {
            let table = blackjack::play_out(p, rng)?;
            let multiplier = table.result().map(|r| r.multiplier()).unwrap_or(0.0);
            (multiplier * stake, OutcomeDetail::Blackjack(table))
        }
        GameParams::Scratch(_) => {
            let card = ScratchCard::draw(rng);
            (card.payout(stake), OutcomeDetail::Scratch(card))
        }
        GameParams::Mines => return Err(CoreError::Unavailable(GameId::Mines)),
    };

    Ok(apply_edge(game, raw_payout, detail, edge, rng))
}

fn apply_edge<R: RandomSource + ?Sized>(
    game: GameId,
    raw_payout: f64,
    detail: OutcomeDetail,
    edge: &EdgePolicy,
    rng: &mut R,
) -> Settlement {
    let raw_payout = raw_payout.max(0.0);
    let mut payout = raw_payout;
    let mut reversed = false;
    if raw_payout > 0.0 {
        if let Some(rule) = edge.reversal_for(game) {
            if rng.next_float() < rule.probability {
                payout = 0.0;
                reversed = true;
            }
        }
    }
    debug!(%game, raw_payout, payout, reversed, "round resolved");
    Settlement {
        raw_payout,
        payout,
        reversed,
        detail,
    }
}
