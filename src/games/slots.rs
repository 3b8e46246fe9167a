//! Five-reel, three-row slots with themed symbol tables.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::games::GameId;
use crate::rng::{RandomSource, pick_index};

pub const REELS: usize = 5;
pub const ROWS: usize = 3;
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeId {
    NeonMatrix,
    SweetCrypto,
    GatesOfSatoshi,
    GoldRush,
}

impl ThemeId {
    pub const ALL: [ThemeId; 4] = [
        ThemeId::NeonMatrix,
        ThemeId::SweetCrypto,
        ThemeId::GatesOfSatoshi,
        ThemeId::GoldRush,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSymbol {
    pub glyph: String,
    pub multiplier: f64,
}

/// A validated symbol table. Cells on the grid are indices into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTheme {
    name: String,
    symbols: Vec<SlotSymbol>,
}

impl SlotTheme {
    pub fn new(name: impl Into<String>, table: &[(&str, f64)]) -> CoreResult<Self> {
        if table.is_empty() {
            return Err(CoreError::params(GameId::Slots, "theme has no symbols"));
        }
        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(table.len());
        for (glyph, multiplier) in table {
            if !seen.insert(*glyph) {
                return Err(CoreError::params(
                    GameId::Slots,
                    format!("symbol {glyph} listed twice"),
                ));
            }
            if !multiplier.is_finite() || *multiplier <= 0.0 {
                return Err(CoreError::params(
                    GameId::Slots,
                    format!("symbol {glyph} has multiplier {multiplier}"),
                ));
            }
            symbols.push(SlotSymbol {
                glyph: glyph.to_string(),
                multiplier: *multiplier,
            });
        }
        Ok(Self {
            name: name.into(),
            symbols,
        })
    }

    pub fn builtin(id: ThemeId) -> Self {
        let (name, table): (&str, &[(&str, f64)]) = match id {
            ThemeId::NeonMatrix => (
                "Neon Matrix",
                &[
                    ("🍒", 1.2),
                    ("🍋", 2.0),
                    ("🔔", 4.0),
                    ("💎", 8.0),
                    ("7️⃣", 15.0),
                    ("🎰", 30.0),
                    ("⭐", 60.0),
                ],
            ),
            ThemeId::SweetCrypto => (
                "Sweet Crypto",
                &[
                    ("🍭", 4.0),
                    ("🧁", 8.0),
                    ("🍦", 12.0),
                    ("🍩", 20.0),
                    ("🍬", 30.0),
                    ("🍫", 45.0),
                    ("🍨", 75.0),
                    ("💎", 250.0),
                ],
            ),
            ThemeId::GatesOfSatoshi => (
                "Gates of Satoshi",
                &[
                    ("⚡", 3.0),
                    ("🏛️", 10.0),
                    ("🔱", 15.0),
                    ("🦉", 25.0),
                    ("⚖️", 40.0),
                    ("🏺", 60.0),
                    ("👑", 120.0),
                    ("💎", 500.0),
                ],
            ),
            ThemeId::GoldRush => (
                "Aristocrat Gold Rush",
                &[
                    ("💰", 1.5),
                    ("⛏️", 5.0),
                    ("🤠", 8.0),
                    ("🐎", 12.0),
                    ("🌵", 20.0),
                    ("🍺", 30.0),
                    ("🧨", 80.0),
                    ("💎", 150.0),
                ],
            ),
        };
        let symbols = table
            .iter()
            .map(|(glyph, multiplier)| SlotSymbol {
                glyph: glyph.to_string(),
                multiplier: *multiplier,
            })
            .collect();
        Self {
            name: name.to_string(),
            symbols,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[SlotSymbol] {
        &self.symbols
    }

    pub fn multiplier(&self, symbol: usize) -> f64 {
        self.symbols.get(symbol).map(|s| s.multiplier).unwrap_or(0.0)
    }

    pub fn glyph(&self, symbol: usize) -> &str {
        self.symbols.get(symbol).map(|s| s.glyph.as_str()).unwrap_or("?")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotParams {
    pub theme: SlotTheme,
}

impl Default for SlotParams {
    fn default() -> Self {
        Self {
            theme: SlotTheme::builtin(ThemeId::NeonMatrix),
        }
    }
}

/// `cells[reel][row]`, each an index into the theme's symbol table.
pub type SlotGrid = [[usize; ROWS]; REELS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWin {
    pub row: usize,
    pub symbol: usize,
    pub run: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpin {
    pub grid: SlotGrid,
    pub wins: Vec<RowWin>,
}

impl SlotSpin {
    pub fn payout(&self, theme: &SlotTheme, stake: f64) -> f64 {
        self.wins
            .iter()
            .map(|win| stake * theme.multiplier(win.symbol))
            .sum()
    }

    /// `(reel, row)` of every cell that is part of a paying run.
    pub fn winning_cells(&self) -> Vec<(usize, usize)> {
        self.wins
            .iter()
            .flat_map(|win| (0..win.run).map(move |reel| (reel, win.row)))
            .collect()
    }
}

/// Fills the grid reel by reel, top to bottom, then scores every row.
pub fn spin<R: RandomSource + ?Sized>(theme: &SlotTheme, rng: &mut R) -> SlotSpin {
    let mut grid = [[0usize; ROWS]; REELS];
    for reel in grid.iter_mut() {
        for cell in reel.iter_mut() {
            *cell = pick_index(rng, theme.symbols.len());
        }
    }
    let wins = score(&grid);
    SlotSpin { grid, wins }
}

/// A row pays when its left-aligned run of identical symbols is at least
/// [`MIN_RUN`] long.
pub fn score(grid: &SlotGrid) -> Vec<RowWin> {
    (0..ROWS)
        .filter_map(|row| {
            let symbol = grid[0][row];
            let run = 1 + (1..REELS)
                .take_while(|reel| grid[*reel][row] == symbol)
                .count();
            (run >= MIN_RUN).then_some(RowWin { row, symbol, run })
        })
        .collect()
}
