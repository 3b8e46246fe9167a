use std::fmt;

use crate::rng::{RandomSource, pick_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub fn glyph(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    fn pips(self) -> u32 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 1,
        }
    }

    /// Tens and faces count 0, ace 1.
    pub fn baccarat_points(self) -> u32 {
        self.pips() % 10
    }

    /// Faces count 10, ace 11 (demoted later by [`blackjack_total`]).
    pub fn blackjack_points(self) -> u32 {
        match self {
            Rank::Ace => 11,
            other => other.pips(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Draws from an infinite shoe: suit first, then rank.
    pub fn draw<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let suit = Suit::ALL[pick_index(rng, Suit::ALL.len())];
        let rank = Rank::ALL[pick_index(rng, Rank::ALL.len())];
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.glyph())
    }
}

pub fn baccarat_total(hand: &[Card]) -> u32 {
    hand.iter().map(|c| c.rank.baccarat_points()).sum::<u32>() % 10
}

/// Best blackjack total: each ace drops from 11 to 1 while the hand is over 21.
pub fn blackjack_total(hand: &[Card]) -> u32 {
    let mut total: u32 = hand.iter().map(|c| c.rank.blackjack_points()).sum();
    let mut aces = hand.iter().filter(|c| c.rank == Rank::Ace).count();
    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    total
}

pub fn format_hand(hand: &[Card]) -> String {
    hand.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
