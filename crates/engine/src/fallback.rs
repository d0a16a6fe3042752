//! Point-count heuristic for auctions no rule covers
//!
//! Heuristics are consulted in order and the first one that produces a
//! legal call wins. When none applies the answer is Pass, so the fallback
//! never comes back empty.

use crate::features::{Feature, FeatureSet};
use types::{Auction, Call, Strain, Suit};

/// The heuristic's call and a one-line reason for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCall {
    pub call: Call,
    pub explanation: String,
}

/// Highest level the heuristic will bid on its own initiative.
const MAX_LEVEL: u8 = 4;

pub struct FallbackBidder;

impl FallbackBidder {
    pub fn propose(features: &FeatureSet, auction: &Auction) -> FallbackCall {
        let heuristics: &[&dyn Heuristic] = &[
            &OpenTheBidding,
            &SupportPartner,
            &BidLongSuit,
            &BidNotrump,
        ];
        heuristics
            .iter()
            .find_map(|h| h.propose(features, auction))
            .unwrap_or_else(|| FallbackCall {
                call: Call::Pass,
                explanation: format!(
                    "{} HCP, nothing worth showing",
                    features.number(Feature::Hcp)
                ),
            })
    }
}

/// A single rule of thumb. Returns `None` when it does not apply or its
/// call is not legal here.
trait Heuristic {
    fn propose(&self, features: &FeatureSet, auction: &Auction) -> Option<FallbackCall>;
}

/// The cheapest legal bid in `strain`, if it is not too high.
fn cheapest(auction: &Auction, strain: Strain, extra: u8) -> Option<Call> {
    let level = auction.minimum_bid_in(strain)?.level()? + extra;
    let call = Call::bid(level.min(7), strain);
    (level <= MAX_LEVEL && auction.is_legal(call)).then_some(call)
}

fn length_of(features: &FeatureSet, suit: Suit) -> i32 {
    let feature = match suit {
        Suit::Clubs => Feature::LenClubs,
        Suit::Diamonds => Feature::LenDiamonds,
        Suit::Hearts => Feature::LenHearts,
        Suit::Spades => Feature::LenSpades,
    };
    features.number(feature)
}

struct OpenTheBidding;

impl Heuristic for OpenTheBidding {
    fn propose(&self, features: &FeatureSet, auction: &Auction) -> Option<FallbackCall> {
        if features.call(Feature::OpeningBid).is_some() {
            return None;
        }
        let hcp = features.number(Feature::Hcp);
        if hcp < 12 && !features.flag(Feature::RuleOfTwenty) {
            return None;
        }
        if (15..=17).contains(&hcp) && features.flag(Feature::IsBalanced) {
            return Some(FallbackCall {
                call: cheapest(auction, Strain::NoTrump, 0)?,
                explanation: format!("{} HCP, balanced", hcp),
            });
        }
        let suit = match features.suit(Feature::LongestSuit) {
            Some(suit) if features.number(Feature::LongestLength) >= 5 => suit,
            _ => features.suit(Feature::BetterMinor)?,
        };
        Some(FallbackCall {
            call: cheapest(auction, Strain::from_suit(suit), 0)?,
            explanation: format!(
                "{} HCP, opening in {} ({} cards)",
                hcp,
                suit.name(),
                length_of(features, suit)
            ),
        })
    }
}

struct SupportPartner;

impl Heuristic for SupportPartner {
    fn propose(&self, features: &FeatureSet, auction: &Auction) -> Option<FallbackCall> {
        let suit = features.suit(Feature::PartnerSuit)?;
        let support = features.number(Feature::SupportForPartner);
        let hcp = features.number(Feature::Hcp);
        if support < 3 || hcp < 6 {
            return None;
        }
        let strain = Strain::from_suit(suit);
        // Extra values jump once; fall back to the cheapest raise if the
        // jump would go too high.
        let call = if hcp >= 11 && support >= 4 {
            cheapest(auction, strain, 1).or_else(|| cheapest(auction, strain, 0))?
        } else {
            cheapest(auction, strain, 0)?
        };
        Some(FallbackCall {
            call,
            explanation: format!("{} HCP with {} {}", hcp, support, suit.name()),
        })
    }
}

struct BidLongSuit;

impl Heuristic for BidLongSuit {
    fn propose(&self, features: &FeatureSet, auction: &Auction) -> Option<FallbackCall> {
        let hcp = features.number(Feature::Hcp);
        let length = features.number(Feature::LongestLength);
        if hcp < 8 || length < 5 {
            return None;
        }
        let suit = features.suit(Feature::LongestSuit)?;
        Some(FallbackCall {
            call: cheapest(auction, Strain::from_suit(suit), 0)?,
            explanation: format!("{} HCP with {} {}", hcp, length, suit.name()),
        })
    }
}

struct BidNotrump;

impl Heuristic for BidNotrump {
    fn propose(&self, features: &FeatureSet, auction: &Auction) -> Option<FallbackCall> {
        let hcp = features.number(Feature::Hcp);
        if hcp < 10 || !features.flag(Feature::IsBalanced) {
            return None;
        }
        let call = cheapest(auction, Strain::NoTrump, 0)?;
        // Notrump above the three-level is a slam try, not a heuristic.
        if call.level()? > 3 {
            return None;
        }
        Some(FallbackCall {
            call,
            explanation: format!("{} HCP, balanced", hcp),
        })
    }
}
