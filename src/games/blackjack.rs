use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::games::GameId;
use crate::games::cards::{Card, blackjack_total};
use crate::rng::RandomSource;

/// Dealer keeps drawing while under this total, soft or hard.
pub const DEALER_STANDS_ON: u32 = 17;

/// Fixed player policy for one-call resolution: hit while under `stand_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackjackParams {
    pub stand_on: u32,
}

impl Default for BlackjackParams {
    fn default() -> Self {
        Self {
            stand_on: DEALER_STANDS_ON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackjackResult {
    PlayerBust,
    DealerBust,
    PlayerWins,
    DealerWins,
    Push,
}

impl BlackjackResult {
    /// Wins pay 2x, a push hands the stake back.
    pub fn multiplier(self) -> f64 {
        match self {
            BlackjackResult::PlayerWins | BlackjackResult::DealerBust => 2.0,
            BlackjackResult::Push => 1.0,
            BlackjackResult::PlayerBust | BlackjackResult::DealerWins => 0.0,
        }
    }
}

impl fmt::Display for BlackjackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlackjackResult::PlayerBust => "Bust! House wins",
            BlackjackResult::DealerBust => "Dealer bust, you win",
            BlackjackResult::PlayerWins => "You win",
            BlackjackResult::DealerWins => "House wins",
            BlackjackResult::Push => "Push, stake returned",
        })
    }
}

/// One hand of blackjack against the dealer. The dealer's second card stays
/// hidden until the player stands.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackjackTable {
    player: Vec<Card>,
    dealer: Vec<Card>,
    result: Option<BlackjackResult>,
}

impl BlackjackTable {
    /// Player, player, dealer up, dealer hole.
    pub fn deal<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let player = vec![Card::draw(rng), Card::draw(rng)];
        let dealer = vec![Card::draw(rng), Card::draw(rng)];
        Self {
            player,
            dealer,
            result: None,
        }
    }

    pub fn player(&self) -> &[Card] {
        &self.player
    }

    /// Only the up card while the hand is live.
    pub fn dealer_visible(&self) -> &[Card] {
        if self.result.is_some() {
            &self.dealer
        } else {
            &self.dealer[..1]
        }
    }

    pub fn player_value(&self) -> u32 {
        blackjack_total(&self.player)
    }

    pub fn dealer_value(&self) -> u32 {
        blackjack_total(self.dealer_visible())
    }

    pub fn result(&self) -> Option<BlackjackResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn hit<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<BlackjackResult> {
        if self.result.is_none() {
            self.player.push(Card::draw(rng));
            if self.player_value() > 21 {
                self.result = Some(BlackjackResult::PlayerBust);
            }
        }
        self.result
    }

    pub fn stand<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> BlackjackResult {
        if let Some(result) = self.result {
            return result;
        }
        while blackjack_total(&self.dealer) < DEALER_STANDS_ON {
            self.dealer.push(Card::draw(rng));
        }
        let player = self.player_value();
        let dealer = blackjack_total(&self.dealer);
        let result = if dealer > 21 {
            BlackjackResult::DealerBust
        } else if player > dealer {
            BlackjackResult::PlayerWins
        } else if player == dealer {
            BlackjackResult::Push
        } else {
            BlackjackResult::DealerWins
        };
        self.result = Some(result);
        result
    }
}

/// Plays a whole hand with the fixed policy in `params`.
pub fn play_out<R: RandomSource + ?Sized>(
    params: &BlackjackParams,
    rng: &mut R,
) -> CoreResult<BlackjackTable> {
    if !(2..=21).contains(&params.stand_on) {
        return Err(CoreError::params(
            GameId::Blackjack,
            format!("stand_on {} outside 2..=21", params.stand_on),
        ));
    }
    let mut table = BlackjackTable::deal(rng);
    while !table.is_finished() && table.player_value() < params.stand_on {
        table.hit(rng);
    }
    table.stand(rng);
    Ok(table)
}
