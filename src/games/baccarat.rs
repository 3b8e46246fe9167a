use std::fmt;

use crate::games::cards::{Card, baccarat_total};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaccaratCall {
    Player,
    Banker,
    Tie,
}

impl fmt::Display for BaccaratCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BaccaratCall::Player => "PLAYER",
            BaccaratCall::Banker => "BANKER",
            BaccaratCall::Tie => "TIE",
        })
    }
}

/// How many cards each side receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawRule {
    /// Two cards each, no third card.
    #[default]
    TwoCard,
    /// Punto banco third-card tableau.
    Tableau,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaccaratParams {
    pub call: BaccaratCall,
    pub rule: DrawRule,
}

impl Default for BaccaratParams {
    fn default() -> Self {
        Self {
            call: BaccaratCall::Player,
            rule: DrawRule::TwoCard,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaccaratCoup {
    pub player: Vec<Card>,
    pub banker: Vec<Card>,
    pub player_value: u32,
    pub banker_value: u32,
    pub winner: BaccaratCall,
}

impl BaccaratCoup {
    /// 9x on a called tie, 2x on a called side, nothing otherwise.
    pub fn multiplier_for(&self, call: BaccaratCall) -> f64 {
        if call != self.winner {
            return 0.0;
        }
        match call {
            BaccaratCall::Tie => 9.0,
            BaccaratCall::Player | BaccaratCall::Banker => 2.0,
        }
    }
}

pub fn deal<R: RandomSource + ?Sized>(rule: DrawRule, rng: &mut R) -> BaccaratCoup {
    let mut player = vec![Card::draw(rng), Card::draw(rng)];
    let mut banker = vec![Card::draw(rng), Card::draw(rng)];

    if rule == DrawRule::Tableau {
        apply_tableau(&mut player, &mut banker, rng);
    }

    let player_value = baccarat_total(&player);
    let banker_value = baccarat_total(&banker);
    let winner = if player_value > banker_value {
        BaccaratCall::Player
    } else if banker_value > player_value {
        BaccaratCall::Banker
    } else {
        BaccaratCall::Tie
    };

    BaccaratCoup {
        player,
        banker,
        player_value,
        banker_value,
        winner,
    }
}

fn apply_tableau<R: RandomSource + ?Sized>(
    player: &mut Vec<Card>,
    banker: &mut Vec<Card>,
    rng: &mut R,
) {
    let player_total = baccarat_total(player);
    let banker_total = baccarat_total(banker);
    if player_total >= 8 || banker_total >= 8 {
        return;
    }

    let player_third = if player_total <= 5 {
        let card = Card::draw(rng);
        player.push(card);
        Some(card.rank.baccarat_points())
    } else {
        None
    };

    let banker_draws = match player_third {
        None => banker_total <= 5,
        Some(third) => match banker_total {
            0..=2 => true,
            3 => third != 8,
            4 => (2..=7).contains(&third),
            5 => (4..=7).contains(&third),
            6 => (6..=7).contains(&third),
            _ => false,
        },
    };
    if banker_draws {
        banker.push(Card::draw(rng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::cards::{Rank, Suit};
    use crate::rng::ScriptedSource;

    /// Draws that produce `rank` with a heart suit.
    fn draws_for(ranks: &[Rank]) -> Vec<f64> {
        ranks
            .iter()
            .flat_map(|rank| {
                let idx = Rank::ALL.iter().position(|r| r == rank).unwrap_or(0);
                [0.0, (idx as f64 + 0.5) / 13.0]
            })
            .collect()
    }

    #[test]
    fn higher_total_wins() {
        let mut src = ScriptedSource::new(draws_for(&[
            Rank::Four,
            Rank::Four,
            Rank::King,
            Rank::Seven,
        ]));
        let coup = deal(DrawRule::TwoCard, &mut src);
        assert_eq!(coup.player_value, 8);
        assert_eq!(coup.banker_value, 7);
        assert_eq!(coup.winner, BaccaratCall::Player);
        assert_eq!(coup.multiplier_for(BaccaratCall::Player), 2.0);
        assert_eq!(coup.multiplier_for(BaccaratCall::Tie), 0.0);
        assert_eq!(coup.player[0].suit, Suit::Hearts);
    }

    #[test]
    fn equal_totals_tie_and_pay_nine() {
        let mut src = ScriptedSource::new(draws_for(&[
            Rank::Ten,
            Rank::Five,
            Rank::Two,
            Rank::Three,
        ]));
        let coup = deal(DrawRule::TwoCard, &mut src);
        assert_eq!(coup.winner, BaccaratCall::Tie);
        assert_eq!(coup.multiplier_for(BaccaratCall::Tie), 9.0);
        assert_eq!(coup.multiplier_for(BaccaratCall::Banker), 0.0);
    }

    #[test]
    fn tableau_natural_stops_drawing() {
        let mut src = ScriptedSource::new(draws_for(&[
            Rank::Nine,
            Rank::King,
            Rank::Two,
            Rank::Two,
        ]));
        let coup = deal(DrawRule::Tableau, &mut src);
        assert_eq!(coup.player.len(), 2);
        assert_eq!(coup.banker.len(), 2);
        assert_eq!(coup.winner, BaccaratCall::Player);
    }

    #[test]
    fn tableau_banker_three_stands_on_player_eight() {
        // player 2+3=5 draws an 8; banker 3 stands against a third-card 8
        let mut src = ScriptedSource::new(draws_for(&[
            Rank::Two,
            Rank::Three,
            Rank::Ace,
            Rank::Two,
            Rank::Eight,
        ]));
        let coup = deal(DrawRule::Tableau, &mut src);
        assert_eq!(coup.player.len(), 3);
        assert_eq!(coup.banker.len(), 2);
        assert_eq!(coup.player_value, 3);
        assert_eq!(coup.banker_value, 3);
        assert_eq!(coup.winner, BaccaratCall::Tie);
    }

    #[test]
    fn tableau_banker_draws_when_player_stands_low() {
        // player 6 stands, banker 4 draws
        let mut src = ScriptedSource::new(draws_for(&[
            Rank::Three,
            Rank::Three,
            Rank::Two,
            Rank::Two,
            Rank::Five,
        ]));
        let coup = deal(DrawRule::Tableau, &mut src);
        assert_eq!(coup.player.len(), 2);
        assert_eq!(coup.banker.len(), 3);
        assert_eq!(coup.banker_value, 9);
        assert_eq!(coup.winner, BaccaratCall::Banker);
    }
}
