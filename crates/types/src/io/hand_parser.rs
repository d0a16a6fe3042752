use crate::card::Card;
use crate::hand::{Hand, HandError};
use crate::rank::Rank;
use crate::suit::Suit;

/// Parses a dotted hand string whose suits appear in `suit_order`.
///
/// `Hand::parse` passes C.D.H.S (the ascending order used by the older SAYC
/// test vectors); `Hand::from_pbn` passes S.H.D.C. A `-` marks a void.
pub fn parse_hand(s: &str, suit_order: &[Suit; 4]) -> Result<Hand, HandError> {
    let suits: Vec<&str> = s.trim().split('.').collect();
    if suits.len() != suit_order.len() {
        return Err(HandError::WrongSuitCount(suits.len()));
    }
    let mut cards = Vec::with_capacity(13);
    for (&suit, suit_str) in suit_order.iter().zip(suits) {
        for c in suit_str.chars().filter(|&c| c != '-') {
            let rank = Rank::from_char(c).ok_or(HandError::InvalidRank(c))?;
            cards.push(Card { suit, rank });
        }
    }
    Hand::new(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_marker() {
        let hand = parse_hand("AKQJT98765432.-.-.-", &Suit::PBN_ORDER).unwrap();
        assert_eq!(hand.length(Suit::Spades), 13);
        assert_eq!(hand.length(Suit::Clubs), 0);
    }

    #[test]
    fn test_suit_order_is_respected() {
        let hand = parse_hand("AKQJT98765432...", &Suit::ALL).unwrap();
        assert_eq!(hand.length(Suit::Clubs), 13);
    }
}
