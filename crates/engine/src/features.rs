//! The closed catalog of named features rules may test

use crate::kernel::ForcingLevel;
use serde::{Serialize, Serializer};
use std::fmt;
use types::{Call, Shape, Suit};

/// Auction phase, classified from the feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    Response,
    Overcall,
    Advance,
    OpenerRebid,
    ResponderRebid,
    Competitive,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Opening,
        Phase::Response,
        Phase::Overcall,
        Phase::Advance,
        Phase::OpenerRebid,
        Phase::ResponderRebid,
        Phase::Competitive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Response => "response",
            Phase::Overcall => "overcall",
            Phase::Advance => "advance",
            Phase::OpenerRebid => "opener_rebid",
            Phase::ResponderRebid => "responder_rebid",
            Phase::Competitive => "competitive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Number,
    Flag,
    Suit,
    Call,
    Phase,
    Forcing,
    Shape,
}

impl FeatureKind {
    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Number => "number",
            FeatureKind::Flag => "flag",
            FeatureKind::Suit => "suit",
            FeatureKind::Call => "call",
            FeatureKind::Phase => "phase",
            FeatureKind::Forcing => "forcing level",
            FeatureKind::Shape => "shape",
        }
    }
}

/// A feature's value. Absent concepts are `Suit(None)` / `Call(None)` / 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Number(i32),
    Flag(bool),
    Suit(Option<Suit>),
    Call(Option<Call>),
    Phase(Phase),
    Forcing(ForcingLevel),
    Shape(Shape),
}

impl Value {
    pub fn kind(&self) -> FeatureKind {
        match self {
            Value::Number(_) => FeatureKind::Number,
            Value::Flag(_) => FeatureKind::Flag,
            Value::Suit(_) => FeatureKind::Suit,
            Value::Call(_) => FeatureKind::Call,
            Value::Phase(_) => FeatureKind::Phase,
            Value::Forcing(_) => FeatureKind::Forcing,
            Value::Shape(_) => FeatureKind::Shape,
        }
    }

    pub fn as_number(&self) -> Option<i32> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Flag(b) => write!(f, "{}", b),
            Value::Suit(Some(suit)) => f.write_str(suit.name()),
            Value::Call(Some(call)) => write!(f, "{}", call),
            Value::Suit(None) | Value::Call(None) => f.write_str("none"),
            Value::Phase(phase) => f.write_str(phase.name()),
            Value::Forcing(level) => f.write_str(level.name()),
            Value::Shape(shape) => f.write_str(shape.name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_i32(*n),
            Value::Flag(b) => serializer.serialize_bool(*b),
            Value::Suit(None) | Value::Call(None) => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

macro_rules! features {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal : $kind:ident ),* $(,)?) => {
        /// Every feature the extractor produces, one variant per YAML name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Feature {
            $( $(#[$doc])* $variant ),*
        }

        impl Feature {
            pub const ALL: &'static [Feature] = &[ $( Feature::$variant ),* ];

            pub fn name(self) -> &'static str {
                match self {
                    $( Feature::$variant => $name ),*
                }
            }

            pub fn kind(self) -> FeatureKind {
                match self {
                    $( Feature::$variant => FeatureKind::$kind ),*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Feature::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

features! {
    // Hand
    Hcp => "hcp": Number,
    /// Length points, or dummy points once partner's suit is supported
    TotalPoints => "total_points": Number,
    LenClubs => "len_clubs": Number,
    LenDiamonds => "len_diamonds": Number,
    LenHearts => "len_hearts": Number,
    LenSpades => "len_spades": Number,
    /// Ties go to the higher-ranking suit
    LongestSuit => "longest_suit": Suit,
    LongestLength => "longest_length": Number,
    /// Longest other suit with at least four cards
    SecondSuit => "second_suit": Suit,
    SecondLength => "second_length": Number,
    /// Spades when both majors have five or more, hearts otherwise on ties
    LongestMajor => "longest_major": Suit,
    LongestMajorLength => "longest_major_length": Number,
    /// Clubs with 3-3 in the minors, diamonds with 4-4
    BetterMinor => "better_minor": Suit,
    Shape => "shape": Shape,
    IsBalanced => "is_balanced": Flag,
    Stoppers => "stoppers": Number,
    RuleOfTwenty => "rule_of_twenty": Flag,
    RuleOfFifteen => "rule_of_fifteen": Flag,
    /// Two of the top three or three of the top five in the longest suit
    GoodSuit => "good_suit": Flag,
    /// Aces plus the king of the agreed suit
    KeycardsHeld => "keycards_held": Number,
    TrumpQueen => "trump_queen": Flag,
    Controls => "controls": Number,
    /// Longest suit neither partner nor the opponents have shown
    BestNewSuit => "best_new_suit": Suit,
    BestNewSuitLength => "best_new_suit_length": Number,
    BestNewMajor => "best_new_major": Suit,

    // Auction and partnership
    Phase => "phase": Phase,
    /// 1 for the dealer through 4 for the last seat
    Seat => "seat": Number,
    Vulnerable => "vulnerable": Flag,
    OpponentsVulnerable => "opponents_vulnerable": Flag,
    IsContested => "is_contested": Flag,
    Interference => "interference": Flag,
    RhoPassed => "rho_passed": Flag,
    /// RHO's last call was a contract bid
    RhoBid => "rho_bid": Flag,
    ForcingLevel => "forcing_level": Forcing,
    GameForcing => "game_forcing": Flag,
    /// The last contract bid is at or above game in its strain
    GameReached => "game_reached": Flag,
    OpeningBid => "opening_bid": Call,
    PartnerOpening => "partner_opening": Call,
    MyOpening => "my_opening": Call,
    PartnerLastBid => "partner_last_bid": Call,
    MyLastBid => "my_last_bid": Call,
    LastBid => "last_bid": Call,
    LastBidLevel => "last_bid_level": Number,
    LastBidNotrump => "last_bid_notrump": Flag,
    RhoCall => "rho_call": Call,
    IHaveActed => "i_have_acted": Flag,
    PartnerHasActed => "partner_has_acted": Flag,
    /// Partner's latest shown suit, transfers included
    PartnerSuit => "partner_suit": Suit,
    MySuit => "my_suit": Suit,
    MySuitLength => "my_suit_length": Number,
    SupportForPartner => "support_for_partner": Number,
    AgreedSuit => "agreed_suit": Suit,
    /// Own length plus partner's promised length in partner's suit
    FitLength => "fit_length": Number,
    OppSuit => "opp_suit": Suit,
    OppSuitLength => "opp_suit_length": Number,
    /// Every suit the opponents have bid is stopped; true when there is none
    OppSuitStopped => "opp_suit_stopped": Flag,
    TakeoutShape => "takeout_shape": Flag,
    /// Shortest holding among majors nobody has bid, 0 when both are bid
    UnbidMajorLength => "unbid_major_length": Number,
    PartnerMinHcp => "partner_min_hcp": Number,
    PartnerMaxHcp => "partner_max_hcp": Number,
    PartnerEstHcp => "partner_est_hcp": Number,
    CombinedMinHcp => "combined_min_hcp": Number,
    CombinedEstHcp => "combined_est_hcp": Number,
    CombinedEstPoints => "combined_est_points": Number,
    PartnerPreempted => "partner_preempted": Flag,
    PreemptInProgress => "preempt_in_progress": Flag,
    /// Partner's latest action was a takeout double
    PartnerDoubled => "partner_doubled": Flag,
    /// Partner asked for keycards and is waiting for the reply
    KeycardAskPending => "keycard_ask_pending": Flag,
    /// I asked for keycards and partner has replied
    KeycardsShown => "keycards_shown": Flag,
    PartnerKeycards => "partner_keycards": Number,
    KeycardsTotal => "keycards_total": Number,
    MyBidCount => "my_bid_count": Number,
    PartnerBidCount => "partner_bid_count": Number,
    PassedHand => "passed_hand": Flag,
    PartnerPassedHand => "partner_passed_hand": Flag,
    /// Suit partner just transferred to, while the completion is due
    TransferSuit => "transfer_suit": Suit,
    /// My transfer was just completed by partner
    TransferCompleted => "transfer_completed": Flag,
    StaymanAsked => "stayman_asked": Flag,
    /// Bidding the second suit now would be a reverse
    SecondSuitReverse => "second_suit_reverse": Flag,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete assignment of values to the catalog.
///
/// Only the extractor can build one, so holding a `FeatureSet` means every
/// feature has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    values: Vec<Value>,
}

impl FeatureSet {
    pub(crate) fn from_fn(mut value_of: impl FnMut(Feature) -> Value) -> Self {
        let values = Feature::ALL.iter().map(|&feature| value_of(feature)).collect();
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> Value {
        self.values[feature as usize]
    }

    pub fn number(&self, feature: Feature) -> i32 {
        self.get(feature).as_number().unwrap_or(0)
    }

    pub fn flag(&self, feature: Feature) -> bool {
        matches!(self.get(feature), Value::Flag(true))
    }

    pub fn suit(&self, feature: Feature) -> Option<Suit> {
        match self.get(feature) {
            Value::Suit(suit) => suit,
            _ => None,
        }
    }

    pub fn call(&self, feature: Feature) -> Option<Call> {
        match self.get(feature) {
            Value::Call(call) => call,
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.get(Feature::Phase) {
            Value::Phase(phase) => phase,
            _ => Phase::Opening,
        }
    }

    pub fn forcing_level(&self) -> ForcingLevel {
        match self.get(Feature::ForcingLevel) {
            Value::Forcing(level) => level,
            _ => ForcingLevel::NonForcing,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, Value)> + '_ {
        Feature::ALL.iter().copied().zip(self.values.iter().copied())
    }

    /// Copy with one value replaced.
    #[cfg(test)]
    pub(crate) fn with(&self, feature: Feature, value: Value) -> Self {
        let mut next = self.clone();
        next.values[feature as usize] = value;
        next
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(feature, value)| (feature.name(), value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for &feature in Feature::ALL {
            assert!(seen.insert(feature.name()), "duplicate {}", feature.name());
            assert_eq!(Feature::from_name(feature.name()), Some(feature));
        }
        assert_eq!(Feature::from_name("no_such_feature"), None);
    }

    #[test]
    fn test_discriminants_index_all() {
        for (i, &feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature as usize, i);
        }
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(16).to_string(), "16");
        assert_eq!(Value::Suit(Some(Suit::Hearts)).to_string(), "hearts");
        assert_eq!(Value::Suit(None).to_string(), "none");
        assert_eq!(Value::Phase(Phase::OpenerRebid).to_string(), "opener_rebid");
    }

    #[test]
    fn test_phase_names() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_name(phase.name()), Some(phase));
        }
    }

    #[test]
    fn test_feature_set_accessors() {
        let set = FeatureSet::from_fn(|feature| match feature.kind() {
            FeatureKind::Number => Value::Number(3),
            FeatureKind::Flag => Value::Flag(true),
            FeatureKind::Suit => Value::Suit(Some(Suit::Spades)),
            FeatureKind::Call => Value::Call(None),
            FeatureKind::Phase => Value::Phase(Phase::Advance),
            FeatureKind::Forcing => Value::Forcing(ForcingLevel::Invitational),
            FeatureKind::Shape => Value::Shape(Shape::Balanced),
        });
        assert_eq!(set.number(Feature::Hcp), 3);
        assert!(set.flag(Feature::IsBalanced));
        assert_eq!(set.suit(Feature::PartnerSuit), Some(Suit::Spades));
        assert_eq!(set.call(Feature::OpeningBid), None);
        assert_eq!(set.phase(), Phase::Advance);
        assert_eq!(set.forcing_level(), ForcingLevel::Invitational);
        let changed = set.with(Feature::Hcp, Value::Number(12));
        assert_eq!(changed.number(Feature::Hcp), 12);
        assert_eq!(set.number(Feature::Hcp), 3);
    }
}
