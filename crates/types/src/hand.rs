// cspell:ignore AKQJT AKQJ
use crate::card::Card;
use crate::rank::Rank;
use crate::suit::Suit;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandError {
    #[error("a hand holds exactly 13 cards, found {0}")]
    WrongCardCount(usize),
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("invalid rank character '{0}'")]
    InvalidRank(char),
    #[error("expected 4 suits separated by '.', found {0}")]
    WrongSuitCount(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// No singletons, no voids, max one doubleton (4-3-3-3, 4-4-3-2, 5-3-3-2)
    Balanced,
    /// One singleton OR two doubletons, no voids (5-4-2-2, 6-3-2-2)
    SemiBalanced,
    /// Everything else (contains singletons/voids beyond SemiBalanced)
    Unbalanced,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Balanced => "balanced",
            Shape::SemiBalanced => "semi_balanced",
            Shape::Unbalanced => "unbalanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Distribution {
    pub spades: u8,
    pub hearts: u8,
    pub diamonds: u8,
    pub clubs: u8,
}

impl Distribution {
    pub fn length(&self, suit: Suit) -> u8 {
        match suit {
            Suit::Spades => self.spades,
            Suit::Hearts => self.hearts,
            Suit::Diamonds => self.diamonds,
            Suit::Clubs => self.clubs,
        }
    }

    fn set_length(&mut self, suit: Suit, length: u8) {
        match suit {
            Suit::Spades => self.spades = length,
            Suit::Hearts => self.hearts = length,
            Suit::Diamonds => self.diamonds = length,
            Suit::Clubs => self.clubs = length,
        }
    }

    /// Lengths from longest to shortest, e.g. `[5, 4, 3, 1]`.
    pub fn sorted_lengths(&self) -> [u8; 4] {
        let mut d = [self.spades, self.hearts, self.diamonds, self.clubs];
        d.sort_by(|a, b| b.cmp(a));
        d
    }

    fn shape(&self) -> Shape {
        let sorted_lengths = self.sorted_lengths();
        let longest = sorted_lengths[0];
        let doubleton_count = sorted_lengths.iter().filter(|&&l| l == 2).count();
        let singleton_count = sorted_lengths.iter().filter(|&&l| l == 1).count();
        let void_count = sorted_lengths.iter().filter(|&&l| l == 0).count();

        if singleton_count == 0 && void_count == 0 && doubleton_count <= 1 {
            Shape::Balanced
        } else if longest <= 6 && void_count == 0 && (singleton_count == 1 || doubleton_count == 2)
        {
            Shape::SemiBalanced
        } else {
            Shape::Unbalanced
        }
    }
}

/// A validated 13-card hand. Cards are kept sorted (spades first, high
/// cards first) and the counts every bidding decision needs are computed
/// once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hand {
    cards: Vec<Card>,
    hcp: u8,
    distribution: Distribution,
    shape: Shape,
    stoppers: [bool; 4],
}

impl Hand {
    pub fn new(mut cards: Vec<Card>) -> Result<Self, HandError> {
        if cards.len() != 13 {
            return Err(HandError::WrongCardCount(cards.len()));
        }
        let mut seen = [false; 52];
        for card in &cards {
            let idx = card.deck_index();
            if seen[idx] {
                return Err(HandError::DuplicateCard(*card));
            }
            seen[idx] = true;
        }
        cards.sort_by(|a, b| b.suit.cmp(&a.suit).then(b.rank.cmp(&a.rank)));

        let hcp = cards.iter().map(|c| c.rank.hcp()).sum();
        let mut distribution = Distribution::default();
        for suit in Suit::ALL {
            let length = cards.iter().filter(|c| c.suit == suit).count() as u8;
            distribution.set_length(suit, length);
        }
        let shape = distribution.shape();
        let stoppers = Suit::ALL.map(|suit| Self::stops(&cards, suit, distribution.length(suit)));

        Ok(Self {
            cards,
            hcp,
            distribution,
            shape,
            stoppers,
        })
    }

    /// Parse a hand string in the format "Clubs.Diamonds.Hearts.Spades".
    pub fn parse(s: &str) -> Result<Self, HandError> {
        crate::io::hand_parser::parse_hand(s, &Suit::ALL)
    }

    /// Parse a PBN hand string, "Spades.Hearts.Diamonds.Clubs".
    pub fn from_pbn(s: &str) -> Result<Self, HandError> {
        crate::io::hand_parser::parse_hand(s, &Suit::PBN_ORDER)
    }

    pub fn to_pbn(&self) -> String {
        Suit::PBN_ORDER
            .iter()
            .map(|&suit| {
                self.cards_in(suit)
                    .map(|c| c.rank.to_char())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cards_in(&self, suit: Suit) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |c| c.suit == suit)
    }

    pub fn has_card(&self, suit: Suit, rank: Rank) -> bool {
        self.cards.contains(&Card::new(suit, rank))
    }

    pub fn hcp(&self) -> u8 {
        self.hcp
    }

    pub fn length(&self, suit: Suit) -> u8 {
        self.distribution.length(suit)
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns true if the hand is balanced (4-3-3-3, 4-4-3-2, 5-3-3-2)
    pub fn is_balanced(&self) -> bool {
        matches!(self.shape, Shape::Balanced)
    }

    /// A, Kx, Qxx or Jxxx.
    pub fn has_stopper(&self, suit: Suit) -> bool {
        self.stoppers[suit.idx()]
    }

    pub fn stopper_count(&self) -> u8 {
        self.stoppers.iter().filter(|&&s| s).count() as u8
    }

    fn stops(cards: &[Card], suit: Suit, length: u8) -> bool {
        let holds = |rank| cards.contains(&Card::new(suit, rank));
        holds(Rank::Ace)
            || (holds(Rank::King) && length >= 2)
            || (holds(Rank::Queen) && length >= 3)
            || (holds(Rank::Jack) && length >= 4)
    }

    /// Starting points: HCP plus one for every card past the fourth in a suit.
    /// With a trump suit, dummy points instead: HCP plus shortness (void 5,
    /// singleton 3, doubleton 1).
    pub fn points(&self, trump: Option<Suit>) -> u8 {
        let extra: u8 = match trump {
            Some(t) => Suit::ALL
                .iter()
                .filter(|&&s| s != t)
                .map(|&s| match self.length(s) {
                    0 => 5,
                    1 => 3,
                    2 => 1,
                    _ => 0,
                })
                .sum(),
            None => Suit::ALL
                .iter()
                .map(|&s| self.length(s).saturating_sub(4))
                .sum(),
        };
        self.hcp + extra
    }

    pub fn aces(&self) -> u8 {
        self.cards.iter().filter(|c| c.rank == Rank::Ace).count() as u8
    }

    /// Controls: ace = 2, king = 1.
    pub fn controls(&self) -> u8 {
        self.cards
            .iter()
            .map(|c| match c.rank {
                Rank::Ace => 2,
                Rank::King => 1,
                _ => 0,
            })
            .sum()
    }

    /// HCP plus the lengths of the two longest suits.
    pub fn rule_of_twenty(&self) -> bool {
        let lengths = self.distribution.sorted_lengths();
        self.hcp + lengths[0] + lengths[1] >= 20
    }

    /// HCP plus spade length, for fourth-seat openings.
    pub fn rule_of_fifteen(&self) -> bool {
        self.hcp + self.length(Suit::Spades) >= 15
    }

    /// Returns the longest suit, preferring the higher-ranking suit on ties.
    pub fn longest_suit(&self) -> Suit {
        let mut longest = Suit::Spades;
        for suit in Suit::PBN_ORDER {
            if self.length(suit) > self.length(longest) {
                longest = suit;
            }
        }
        longest
    }

    /// Count how many of the top N honors (A, K, Q, J, T) the hand holds in a suit.
    ///
    /// `top_honors(suit, 3)` counts honors among {A, K, Q}.
    /// `top_honors(suit, 5)` counts honors among {A, K, Q, J, T}.
    pub fn top_honors(&self, suit: Suit, n: u8) -> u8 {
        const HONOR_RANKS: [Rank; 5] = [Rank::Ace, Rank::King, Rank::Queen, Rank::Jack, Rank::Ten];
        let top_n = &HONOR_RANKS[..(n as usize).min(HONOR_RANKS.len())];
        self.cards_in(suit)
            .filter(|c| top_n.contains(&c.rank))
            .count() as u8
    }

    /// Two of the top three or three of the top five honors.
    pub fn is_good_suit(&self, suit: Suit) -> bool {
        self.top_honors(suit, 3) >= 2 || self.top_honors(suit, 5) >= 3
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pbn())
    }
}

impl TryFrom<String> for Hand {
    type Error = HandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Hand::from_pbn(&value)
    }
}

impl From<Hand> for String {
    fn from(hand: Hand) -> Self {
        hand.to_pbn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pbn(s: &str) -> Hand {
        Hand::from_pbn(s).unwrap()
    }

    #[test]
    fn test_hcp_calculation() {
        assert_eq!(pbn("J96.KQJ53.KJ.KQ6").hcp(), 16);
        assert_eq!(pbn("K65.9872.T52.643").hcp(), 3);
        assert_eq!(pbn("AKQJ.AKQ.AKQ.AKQ").hcp(), 37);
    }

    #[test]
    fn test_parse_orders_agree() {
        // C.D.H.S and S.H.D.C spellings of the same hand.
        let classic = Hand::parse("643.T52.9872.K65").unwrap();
        let pbn_hand = pbn("K65.9872.T52.643");
        assert_eq!(classic, pbn_hand);
        assert_eq!(pbn_hand.to_pbn(), "K65.9872.T52.643");
    }

    #[test]
    fn test_rejects_wrong_card_count() {
        assert_eq!(
            Hand::from_pbn("K65.9872.T52.64"),
            Err(HandError::WrongCardCount(12))
        );
        assert_eq!(
            Hand::from_pbn("AK65.9872.T52.643"),
            Err(HandError::WrongCardCount(14))
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = Hand::from_pbn("KK5.9872.T52.643").unwrap_err();
        assert_eq!(err, HandError::DuplicateCard(Card::new(Suit::Spades, Rank::King)));
    }

    #[test]
    fn test_rejects_bad_format() {
        assert_eq!(
            Hand::from_pbn("K65.9872.T52"),
            Err(HandError::WrongSuitCount(3))
        );
        assert_eq!(
            Hand::from_pbn("K65.9872.T52.64Z"),
            Err(HandError::InvalidRank('Z'))
        );
    }

    #[test]
    fn test_distribution() {
        let dist = pbn("AK.Q.JT98765.432").distribution();
        assert_eq!(dist.spades, 2);
        assert_eq!(dist.hearts, 1);
        assert_eq!(dist.diamonds, 7);
        assert_eq!(dist.clubs, 3);
        assert_eq!(dist.sorted_lengths(), [7, 3, 2, 1]);
    }

    #[test]
    fn test_balanced_shapes() {
        assert_eq!(pbn("AKQ2.AK2.AK2.AK2").shape(), Shape::Balanced);
        assert_eq!(pbn("AKQ2.AK32.A32.A2").shape(), Shape::Balanced);
        assert_eq!(pbn("AKQ32.K32.A32.A2").shape(), Shape::Balanced);
    }

    #[test]
    fn test_semi_balanced_shapes() {
        // 5-4-2-2
        assert_eq!(pbn("AKQ32.K432.A2.A2").shape(), Shape::SemiBalanced);
        // 6-3-2-2
        assert_eq!(pbn("AKQ432.K32.A2.A2").shape(), Shape::SemiBalanced);
        // 5-4-3-1
        assert_eq!(pbn("AKQ32.K432.A32.2").shape(), Shape::SemiBalanced);
    }

    #[test]
    fn test_unbalanced_shapes() {
        // 5-4-4-0
        assert_eq!(pbn("AKQ32.K432.A432.").shape(), Shape::Unbalanced);
        // 7-3-2-1
        assert_eq!(pbn("AKQ5432.K32.A2.2").shape(), Shape::Unbalanced);
    }

    #[test]
    fn test_stopper_holdings() {
        let hand = pbn("A32.K3.Q43.J5432");
        assert!(hand.has_stopper(Suit::Spades));
        assert!(hand.has_stopper(Suit::Hearts));
        assert!(hand.has_stopper(Suit::Diamonds));
        assert!(hand.has_stopper(Suit::Clubs));
        assert_eq!(hand.stopper_count(), 4);

        let thin = pbn("K.Q2.J32.AT98765");
        assert!(!thin.has_stopper(Suit::Spades));
        assert!(!thin.has_stopper(Suit::Hearts));
        assert!(!thin.has_stopper(Suit::Diamonds));
        assert!(thin.has_stopper(Suit::Clubs));
    }

    #[test]
    fn test_points() {
        let hand = pbn("AKJ32.Q5432.2.32");
        assert_eq!(hand.hcp(), 10);
        assert_eq!(hand.points(None), 12);
        assert_eq!(hand.points(Some(Suit::Spades)), 14);
    }

    #[test]
    fn test_rule_of_twenty_and_fifteen() {
        assert!(pbn("AKJ32.Q5432.2.32").rule_of_twenty());
        assert!(!pbn("AJ32.Q543.K32.32").rule_of_twenty());
        assert!(pbn("AKJ32.Q543.32.32").rule_of_fifteen());
    }

    #[test]
    fn test_longest_suit_prefers_higher_rank() {
        assert_eq!(pbn("AKQJT.AKQJT.2.32").longest_suit(), Suit::Spades);
        assert_eq!(pbn("2.AKQJT.32.AKQJT").longest_suit(), Suit::Hearts);
        assert_eq!(pbn("2.32.AKQJT98.AKQ").longest_suit(), Suit::Diamonds);
    }

    #[test]
    fn test_top_honors() {
        let hand = pbn("KJT42.AQ753.2.32");
        assert_eq!(hand.top_honors(Suit::Hearts, 3), 2);
        assert_eq!(hand.top_honors(Suit::Spades, 3), 1);
        assert_eq!(hand.top_honors(Suit::Spades, 5), 3);
        assert_eq!(hand.top_honors(Suit::Clubs, 5), 0);
        assert!(hand.is_good_suit(Suit::Hearts));
        assert!(hand.is_good_suit(Suit::Spades));
        assert!(!hand.is_good_suit(Suit::Clubs));
    }

    #[test]
    fn test_controls_and_aces() {
        let hand = pbn("AK2.A32.K32.5432");
        assert_eq!(hand.aces(), 2);
        assert_eq!(hand.controls(), 6);
    }

    #[test]
    fn test_serde_uses_pbn() {
        let hand: Hand = serde_yaml::from_str("K65.9872.T52.643").unwrap();
        assert_eq!(hand.hcp(), 3);
        let text = serde_yaml::to_string(&hand).unwrap();
        assert_eq!(text.trim(), "K65.9872.T52.643");
    }
}
