use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    /// Suits in ascending rank order.
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Suits in the order a PBN hand lists them (spades first).
    pub const PBN_ORDER: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn idx(self) -> usize {
        match self {
            Suit::Clubs => 0,
            Suit::Diamonds => 1,
            Suit::Hearts => 2,
            Suit::Spades => 3,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Suit::Clubs),
            'D' => Some(Suit::Diamonds),
            'H' => Some(Suit::Hearts),
            'S' => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Plural English name, as used in explanations ("hearts").
    pub fn name(self) -> &'static str {
        match self {
            Suit::Clubs => "clubs",
            Suit::Diamonds => "diamonds",
            Suit::Hearts => "hearts",
            Suit::Spades => "spades",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }

    pub fn is_major(self) -> bool {
        matches!(self, Suit::Hearts | Suit::Spades)
    }

    pub fn is_minor(self) -> bool {
        matches!(self, Suit::Clubs | Suit::Diamonds)
    }

    /// The other suit of the same kind (hearts <-> spades, clubs <-> diamonds).
    pub fn sibling(self) -> Suit {
        match self {
            Suit::Clubs => Suit::Diamonds,
            Suit::Diamonds => Suit::Clubs,
            Suit::Hearts => Suit::Spades,
            Suit::Spades => Suit::Hearts,
        }
    }
}

impl FromStr for Suit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "clubs" => Ok(Suit::Clubs),
            "d" | "diamonds" => Ok(Suit::Diamonds),
            "h" | "hearts" => Ok(Suit::Hearts),
            "s" | "spades" => Ok(Suit::Spades),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suit_parsing() {
        assert_eq!(Suit::from_char('S'), Some(Suit::Spades));
        assert_eq!(Suit::from_char('h'), Some(Suit::Hearts));
        assert_eq!(Suit::from_char('X'), None);
        assert_eq!("hearts".parse::<Suit>(), Ok(Suit::Hearts));
        assert_eq!("D".parse::<Suit>(), Ok(Suit::Diamonds));
        assert!("none".parse::<Suit>().is_err());
    }

    #[test]
    fn test_suit_order_and_siblings() {
        assert!(Suit::Spades > Suit::Hearts);
        assert!(Suit::Diamonds > Suit::Clubs);
        assert_eq!(Suit::Hearts.sibling(), Suit::Spades);
        assert_eq!(Suit::Clubs.sibling(), Suit::Diamonds);
        for suit in Suit::ALL {
            assert_eq!(Suit::ALL[suit.idx()], suit);
        }
    }
}
