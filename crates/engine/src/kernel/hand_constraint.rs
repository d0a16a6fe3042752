// cspell:ignore Jxxx
//! Facts a call reveals about the caller's hand

use serde::{Deserialize, Serialize};
use types::{Hand, Shape, Suit};

/// A single promise made by a call, checkable against a concrete hand and
/// foldable into a [`HandModel`](super::HandModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandConstraint {
    /// Minimum high card points
    MinHcp(u8),
    /// Maximum high card points
    MaxHcp(u8),
    /// Minimum length in a specific suit
    MinLength(Suit, u8),
    /// Maximum length in a specific suit
    MaxLength(Suit, u8),
    /// Maximum unbalancedness allowed
    MaxUnbalancedness(Shape),
    /// Must have a stopper in the given suit (A, Kx, Qxx, or Jxxx)
    StopperIn(Suit),
}

impl HandConstraint {
    /// Check whether a hand satisfies this constraint.
    pub fn check(&self, hand: &Hand) -> bool {
        match *self {
            HandConstraint::MinHcp(hcp) => hand.hcp() >= hcp,
            HandConstraint::MaxHcp(hcp) => hand.hcp() <= hcp,
            HandConstraint::MinLength(suit, len) => hand.length(suit) >= len,
            HandConstraint::MaxLength(suit, len) => hand.length(suit) <= len,
            HandConstraint::MaxUnbalancedness(max_shape) => hand.shape() <= max_shape,
            HandConstraint::StopperIn(suit) => hand.has_stopper(suit),
        }
    }

    /// HCP window shorthand used throughout the interpreter.
    pub fn hcp(min: u8, max: u8) -> [HandConstraint; 2] {
        [HandConstraint::MinHcp(min), HandConstraint::MaxHcp(max)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_hcp_and_length() {
        let hand = Hand::from_pbn("AKJ32.Q5432.2.32").unwrap();
        assert!(HandConstraint::MinHcp(10).check(&hand));
        assert!(!HandConstraint::MaxHcp(9).check(&hand));
        assert!(HandConstraint::MinLength(Suit::Spades, 5).check(&hand));
        assert!(!HandConstraint::MinLength(Suit::Clubs, 3).check(&hand));
        assert!(HandConstraint::MaxLength(Suit::Diamonds, 1).check(&hand));
    }

    #[test]
    fn test_check_shape_and_stopper() {
        let hand = Hand::from_pbn("K87.Q65.J32.J984").unwrap();
        assert!(HandConstraint::MaxUnbalancedness(Shape::Balanced).check(&hand));
        assert!(HandConstraint::StopperIn(Suit::Spades).check(&hand));
        assert!(!HandConstraint::StopperIn(Suit::Diamonds).check(&hand));
    }
}
