//! Semantic meaning of calls

use crate::kernel::HandConstraint;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::Suit;

/// How strongly a partnership's last call obliges the other partner to bid.
/// Ordered so that `max` picks the stronger obligation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ForcingLevel {
    #[default]
    NonForcing,
    Invitational,
    Forcing,
}

impl ForcingLevel {
    pub fn name(self) -> &'static str {
        match self {
            ForcingLevel::NonForcing => "non_forcing",
            ForcingLevel::Invitational => "invitational",
            ForcingLevel::Forcing => "forcing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "non_forcing" | "nf" => Some(ForcingLevel::NonForcing),
            "invitational" | "inv" => Some(ForcingLevel::Invitational),
            "forcing" | "f" => Some(ForcingLevel::Forcing),
            _ => None,
        }
    }
}

impl fmt::Display for ForcingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The agreement a call was read under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    Natural,
    Pass,
    OneOfASuit,
    NotrumpOpening,
    StrongTwoClubs,
    WeakTwo,
    Preempt,
    Stayman,
    StaymanReply,
    StaymanDenial,
    JacobyTransfer,
    TransferCompletion,
    SuperAccept,
    WaitingResponse,
    PositiveResponse,
    FeatureAsk,
    SingleRaise,
    LimitRaise,
    PreemptiveRaise,
    CuebidRaise,
    JacobyTwoNotrump,
    JacobyRebid,
    JumpShift,
    NewSuit,
    NotrumpResponse,
    Reverse,
    Rebid,
    JumpRebid,
    NotrumpRebid,
    Overcall,
    WeakJumpOvercall,
    NotrumpOvercall,
    UnusualNotrump,
    MichaelsCuebid,
    TakeoutDouble,
    NegativeDouble,
    PenaltyDouble,
    Redouble,
    Advance,
    KeycardAsk,
    KeycardReply,
    KingAsk,
    KeycardSignoff,
    QuantitativeNotrump,
}

impl Convention {
    pub fn name(self) -> &'static str {
        match self {
            Convention::Natural => "natural",
            Convention::Pass => "pass",
            Convention::OneOfASuit => "one of a suit",
            Convention::NotrumpOpening => "notrump opening",
            Convention::StrongTwoClubs => "strong 2C",
            Convention::WeakTwo => "weak two",
            Convention::Preempt => "preempt",
            Convention::Stayman => "Stayman",
            Convention::StaymanReply => "Stayman reply",
            Convention::StaymanDenial => "Stayman denial",
            Convention::JacobyTransfer => "Jacoby transfer",
            Convention::TransferCompletion => "transfer completion",
            Convention::SuperAccept => "transfer super-accept",
            Convention::WaitingResponse => "waiting response",
            Convention::PositiveResponse => "positive response",
            Convention::FeatureAsk => "feature ask",
            Convention::SingleRaise => "single raise",
            Convention::LimitRaise => "limit raise",
            Convention::PreemptiveRaise => "preemptive raise",
            Convention::CuebidRaise => "cue-bid raise",
            Convention::JacobyTwoNotrump => "Jacoby 2NT",
            Convention::JacobyRebid => "Jacoby 2NT rebid",
            Convention::JumpShift => "jump shift",
            Convention::NewSuit => "new suit",
            Convention::NotrumpResponse => "notrump response",
            Convention::Reverse => "reverse",
            Convention::Rebid => "rebid",
            Convention::JumpRebid => "jump rebid",
            Convention::NotrumpRebid => "notrump rebid",
            Convention::Overcall => "overcall",
            Convention::WeakJumpOvercall => "weak jump overcall",
            Convention::NotrumpOvercall => "1NT overcall",
            Convention::UnusualNotrump => "unusual notrump",
            Convention::MichaelsCuebid => "Michaels cue-bid",
            Convention::TakeoutDouble => "takeout double",
            Convention::NegativeDouble => "negative double",
            Convention::PenaltyDouble => "penalty double",
            Convention::Redouble => "redouble",
            Convention::Advance => "advance",
            Convention::KeycardAsk => "Roman Key Card Blackwood",
            Convention::KeycardReply => "keycard reply",
            Convention::KingAsk => "king ask",
            Convention::KeycardSignoff => "sign-off after keycards",
            Convention::QuantitativeNotrump => "quantitative 4NT",
        }
    }

    /// Calls whose strain says nothing about the caller's holding there.
    pub fn is_artificial(self) -> bool {
        matches!(
            self,
            Convention::StrongTwoClubs
                | Convention::Stayman
                | Convention::StaymanDenial
                | Convention::JacobyTransfer
                | Convention::WaitingResponse
                | Convention::FeatureAsk
                | Convention::CuebidRaise
                | Convention::JacobyTwoNotrump
                | Convention::JacobyRebid
                | Convention::UnusualNotrump
                | Convention::MichaelsCuebid
                | Convention::KeycardAsk
                | Convention::KeycardReply
                | Convention::KingAsk
                | Convention::QuantitativeNotrump
        )
    }

    /// Answers whose level is dictated by the question, not by strength.
    pub fn is_structured_reply(self) -> bool {
        matches!(
            self,
            Convention::TransferCompletion
                | Convention::SuperAccept
                | Convention::StaymanReply
                | Convention::StaymanDenial
                | Convention::WaitingResponse
                | Convention::KeycardReply
                | Convention::KeycardSignoff
        )
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partnership bookkeeping a call sets in motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Preempt,
    GameForce,
    StaymanAsk,
    TransferTo(Suit),
    KeycardAsk,
    /// Keycards shown by a 1430 reply, reading the lower count.
    KeycardReply(u8),
}

/// Semantic meaning of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSemantics {
    pub convention: Convention,
    /// What this call shows about the caller's hand
    pub shows: Vec<HandConstraint>,
    /// Forcing status the call establishes; `None` leaves the side's
    /// current status in place.
    pub forcing: Option<ForcingLevel>,
    /// Suit the call names as a suit the caller actually holds
    pub natural_suit: Option<Suit>,
    /// Suit the call promises, naturally or by convention
    pub shown_suit: Option<Suit>,
    /// Suit the call explicitly agrees as trumps
    pub agrees: Option<Suit>,
    pub effect: Option<Effect>,
}

impl CallSemantics {
    pub fn new(convention: Convention) -> Self {
        Self {
            convention,
            shows: Vec::new(),
            forcing: None,
            natural_suit: None,
            shown_suit: None,
            agrees: None,
            effect: None,
        }
    }

    /// A natural call in `suit`: holds it, shows it.
    pub fn natural(convention: Convention, suit: Suit) -> Self {
        let mut semantics = Self::new(convention);
        semantics.natural_suit = Some(suit);
        semantics.shown_suit = Some(suit);
        semantics
    }

    pub fn show(mut self, constraint: HandConstraint) -> Self {
        self.shows.push(constraint);
        self
    }

    pub fn show_all(mut self, constraints: impl IntoIterator<Item = HandConstraint>) -> Self {
        self.shows.extend(constraints);
        self
    }

    pub fn forcing(mut self, level: ForcingLevel) -> Self {
        self.forcing = Some(level);
        self
    }

    pub fn shown_suit(mut self, suit: Suit) -> Self {
        self.shown_suit = Some(suit);
        self
    }

    pub fn agrees(mut self, suit: Suit) -> Self {
        self.agrees = Some(suit);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn is_artificial(&self) -> bool {
        self.convention.is_artificial()
    }
}
