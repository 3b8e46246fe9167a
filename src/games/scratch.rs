use crate::rng::{RandomSource, weighted_index};

pub const CELLS: usize = 9;
pub const MIN_MATCH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchSymbol {
    Diamond,
    MoneyBag,
    Fire,
    Star,
    Dud,
}

impl ScratchSymbol {
    pub fn value(self) -> f64 {
        match self {
            ScratchSymbol::Diamond => 10.0,
            ScratchSymbol::MoneyBag => 5.0,
            ScratchSymbol::Fire => 2.0,
            ScratchSymbol::Star => 50.0,
            ScratchSymbol::Dud => 0.0,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ScratchSymbol::Diamond => "💎",
            ScratchSymbol::MoneyBag => "💰",
            ScratchSymbol::Fire => "🔥",
            ScratchSymbol::Star => "⭐",
            ScratchSymbol::Dud => "💩",
        }
    }
}

/// Seven slots on the ticket press, three of them duds.
pub const TABLE: [(ScratchSymbol, u32); 5] = [
    (ScratchSymbol::Diamond, 1),
    (ScratchSymbol::MoneyBag, 1),
    (ScratchSymbol::Fire, 1),
    (ScratchSymbol::Star, 1),
    (ScratchSymbol::Dud, 3),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScratchParams;

/// A printed ticket. The outcome is fixed when it is drawn; revealing cells
/// only changes what the player has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchCard {
    cells: [ScratchSymbol; CELLS],
    revealed: [bool; CELLS],
}

impl ScratchCard {
    pub fn draw<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let weights: Vec<u32> = TABLE.iter().map(|(_, w)| *w).collect();
        let mut cells = [ScratchSymbol::Dud; CELLS];
        for cell in cells.iter_mut() {
            *cell = TABLE[weighted_index(rng, &weights)].0;
        }
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: [ScratchSymbol; CELLS]) -> Self {
        Self {
            cells,
            revealed: [false; CELLS],
        }
    }

    pub fn cells(&self) -> &[ScratchSymbol; CELLS] {
        &self.cells
    }

    pub fn is_revealed(&self, idx: usize) -> bool {
        self.revealed.get(idx).copied().unwrap_or(false)
    }

    /// Returns false for an out-of-range or already scratched cell.
    pub fn reveal(&mut self, idx: usize) -> bool {
        match self.revealed.get_mut(idx) {
            Some(seen) if !*seen => {
                *seen = true;
                true
            }
            _ => false,
        }
    }

    pub fn reveal_all(&mut self) {
        self.revealed = [true; CELLS];
    }

    pub fn fully_revealed(&self) -> bool {
        self.revealed.iter().all(|r| *r)
    }

    /// Paying symbols seen at least [`MIN_MATCH`] times, with their counts.
    pub fn groups(&self) -> Vec<(ScratchSymbol, usize)> {
        TABLE
            .iter()
            .map(|(symbol, _)| *symbol)
            .filter(|symbol| symbol.value() > 0.0)
            .filter_map(|symbol| {
                let count = self.cells.iter().filter(|c| **c == symbol).count();
                (count >= MIN_MATCH).then_some((symbol, count))
            })
            .collect()
    }

    pub fn payout(&self, stake: f64) -> f64 {
        self.groups()
            .iter()
            .map(|(symbol, _)| stake * symbol.value())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ScratchSymbol::*;

    #[test]
    fn three_of_a_kind_pays_once_per_symbol() {
        let card = ScratchCard::from_cells([Fire, Fire, Dud, Fire, Star, Dud, Fire, Dud, Star]);
        assert_eq!(card.groups(), vec![(Fire, 4)]);
        assert_eq!(card.payout(100.0), 200.0);
    }

    #[test]
    fn groups_add_up() {
        let card = ScratchCard::from_cells([
            Star, Star, Star, Diamond, Diamond, Diamond, Dud, Dud, Dud,
        ]);
        assert_eq!(card.payout(10.0), 10.0 * 10.0 + 10.0 * 50.0);
    }

    #[test]
    fn duds_never_pay() {
        let card = ScratchCard::from_cells([Dud; CELLS]);
        assert!(card.groups().is_empty());
        assert_eq!(card.payout(10.0), 0.0);
    }

    #[test]
    fn reveal_tracks_each_cell_once() {
        let mut card = ScratchCard::from_cells([Dud; CELLS]);
        assert!(card.reveal(4));
        assert!(!card.reveal(4));
        assert!(!card.reveal(CELLS));
        assert!(card.is_revealed(4));
        assert!(!card.fully_revealed());
        card.reveal_all();
        assert!(card.fully_revealed());
    }

    #[test]
    fn draw_follows_weights() {
        let draws: Vec<f64> = (0..CELLS).map(|i| if i % 2 == 0 { 0.99 } else { 0.0 }).collect();
        let mut src = crate::rng::ScriptedSource::new(draws);
        let card = ScratchCard::draw(&mut src);
        assert_eq!(card.cells()[0], Dud);
        assert_eq!(card.cells()[1], Diamond);
    }
}
