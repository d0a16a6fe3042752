//! SAYC bidding decision engine
//!
//! A decision reads the auction into an [`AuctionState`], extracts a
//! [`features::FeatureSet`] for the hand on turn, asks a [`Bidder`] for a
//! call and passes that call through the [`validation`] layer. The result
//! is always a legal call with an explanation.

pub mod bidder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod features;
pub mod kernel;
pub mod matcher;
pub mod result;
pub mod rules;
pub mod schema;
pub mod trace;
pub mod validation;

pub use bidder::{Bidder, Proposal, ReferenceBidder, SchemaBidder};
pub use config::{BidderKind, ConfigError, EngineConfig, Thresholds};
pub use error::EngineError;
pub use features::{Feature, FeatureSet, Phase};
pub use kernel::{AuctionState, ForcingLevel};
pub use result::{Adjustment, AdjustmentKind, Confidence, DecisionResult, DecisionSource};
pub use rules::{RuleStore, RuleStoreError};
pub use trace::{DecisionTrace, RuleOutcome, RuleStep};

use extractor::FeatureExtractor;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use types::{Auction, Board, Call, Card, Hand, HandError, Position, Rank, Suit, Vulnerability};
use validation::{Validation, ValidationContext, Validator};

static DEFAULT_STORE: Lazy<Result<Arc<RuleStore>, RuleStoreError>> =
    Lazy::new(|| RuleStore::embedded().map(Arc::new));

/// The built-in SAYC rules, compiled once per process.
pub fn default_store() -> Result<Arc<RuleStore>, RuleStoreError> {
    DEFAULT_STORE.clone()
}

/// One "what do I bid?" question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    pub hand: Hand,
    pub auction: Auction,
    pub seat: Position,
    pub vulnerability: Vulnerability,
}

impl BidRequest {
    /// A request for whoever is on turn.
    pub fn new(hand: Hand, auction: Auction, vulnerability: Vulnerability) -> Self {
        let seat = auction.current_player();
        Self {
            hand,
            auction,
            seat,
            vulnerability,
        }
    }

    /// Build a request from a PBN hand and space-separated calls.
    pub fn parse(
        hand: &str,
        dealer: Position,
        calls: &str,
        vulnerability: Vulnerability,
    ) -> Result<Self, EngineError> {
        let hand = Hand::from_pbn(hand)?;
        let auction = Auction::parse(dealer, calls)?;
        Ok(Self::new(hand, auction, vulnerability))
    }
}

/// Everything one decision produced, before it is split into a result or
/// a trace.
struct Decision {
    features: FeatureSet,
    proposal: Proposal,
    validation: Validation,
    result: DecisionResult,
}

/// Immutable once built; share it across threads freely.
pub struct Engine {
    bidder: Box<dyn Bidder>,
    validator: Validator,
    config: EngineConfig,
}

impl Engine {
    /// An engine with the given configuration, loading `extra_rules` next
    /// to the built-in modules when it is set.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.thresholds.validate()?;
        let store = match &config.extra_rules {
            Some(dir) => Arc::new(RuleStore::embedded_with_dir(dir)?),
            None => default_store()?,
        };
        Ok(Self::with_store(store, config))
    }

    /// Default configuration and the built-in rules.
    pub fn sayc() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    pub fn with_store(store: Arc<RuleStore>, config: EngineConfig) -> Self {
        let bidder: Box<dyn Bidder> = match config.bidder {
            BidderKind::Schema => Box::new(SchemaBidder::new(store)),
            BidderKind::Reference => Box::new(ReferenceBidder),
        };
        Self {
            bidder,
            validator: Validator::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bidder_name(&self) -> &'static str {
        self.bidder.name()
    }

    pub fn decide(&self, request: &BidRequest) -> Result<DecisionResult, EngineError> {
        Ok(self.run(request, None)?.result)
    }

    pub fn decide_with_trace(&self, request: &BidRequest) -> Result<DecisionTrace, EngineError> {
        let mut steps = Vec::new();
        let decision = self.run(request, Some(&mut steps))?;
        Ok(DecisionTrace {
            phase: decision.result.phase,
            features: decision.features,
            rules: steps,
            fallback: decision.proposal.fallback,
            proposed: decision.proposal.call,
            declared_forcing: decision.proposal.forcing,
            validation: decision.validation.adjustments,
            result: decision.result,
        })
    }

    /// Bid a whole board from the dealer until the auction ends.
    pub fn bid_board(&self, board: &Board) -> Result<Auction, EngineError> {
        let mut auction = Auction::new(board.dealer);
        while !auction.is_finished() {
            let seat = auction.current_player();
            let hand = board
                .get_hand(seat)
                .ok_or(EngineError::MissingHand(seat))?;
            let request = BidRequest {
                hand: hand.clone(),
                auction: auction.clone(),
                seat,
                vulnerability: board.vulnerability,
            };
            let result = self.decide(&request)?;
            auction.try_add_call(result.call)?;
        }
        Ok(auction)
    }

    fn run(
        &self,
        request: &BidRequest,
        steps: Option<&mut Vec<RuleStep>>,
    ) -> Result<Decision, EngineError> {
        let state = AuctionState::from_auction(&request.auction, request.vulnerability)?;
        if state.is_finished() {
            return Err(EngineError::AuctionFinished);
        }
        let on_turn = state.turn();
        if request.seat != on_turn {
            return Err(EngineError::NotOnTurn {
                seat: request.seat,
                on_turn,
            });
        }

        let features = FeatureExtractor::extract(&request.hand, &state, request.seat);
        let proposal = self.bidder.propose(&features, state.auction(), steps);
        let ctx = ValidationContext {
            state: &state,
            features: &features,
            seat: request.seat,
            thresholds: self.config.thresholds,
        };
        let validation = self.validator.validate(proposal.call, &ctx);

        let confidence = match (&proposal.source, validation.adjustments.is_empty()) {
            (_, false) => Confidence::Low,
            (DecisionSource::Rule { .. }, true) => Confidence::High,
            (DecisionSource::Fallback, true) => Confidence::Medium,
        };
        let forcing = proposal.forcing.filter(|_| validation.call == proposal.call);
        let result = DecisionResult {
            call: validation.call,
            explanation: annotate(&proposal.explanation, &validation.adjustments),
            source: proposal.source.clone(),
            adjustments: validation.adjustments.clone(),
            confidence,
            forcing,
            phase: features.phase(),
        };
        Ok(Decision {
            features,
            proposal,
            validation,
            result,
        })
    }
}

fn annotate(explanation: &str, adjustments: &[Adjustment]) -> String {
    let notes: Vec<String> = adjustments
        .iter()
        .map(|a| {
            if a.changed_call() {
                format!("{} changed to {}: {}", a.original, a.call, a.reason)
            } else {
                format!("doubtful: {}", a.reason)
            }
        })
        .collect();
    if notes.is_empty() {
        explanation.to_string()
    } else {
        format!("{} [{}]", explanation, notes.join("; "))
    }
}

/// Deal a board with dealer and vulnerability following the board number.
pub fn generate_random_board(
    board_number: u32,
    rng: &mut impl rand::Rng,
) -> Result<Board, HandError> {
    use rand::seq::SliceRandom;

    let mut deck = Vec::with_capacity(52);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(suit, rank));
        }
    }
    deck.shuffle(rng);

    let mut hands = HashMap::new();
    let positions = [
        Position::North,
        Position::East,
        Position::South,
        Position::West,
    ];
    for (position, chunk) in positions.into_iter().zip(deck.chunks(13)) {
        hands.insert(position, Hand::new(chunk.to_vec())?);
    }

    Ok(Board::new(
        Position::dealer_from_board_number(board_number),
        Vulnerability::from_board_number(board_number),
        hands,
    ))
}

/// Calls in auction order, rendered the way the rules write them.
pub fn render_calls(calls: &[Call]) -> String {
    calls
        .iter()
        .map(|call| call.render())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn call(text: &str) -> Call {
        text.parse().unwrap()
    }

    fn decide(pbn: &str, dealer: Position, calls: &str) -> DecisionResult {
        let engine = Engine::sayc().unwrap();
        let request = BidRequest::parse(pbn, dealer, calls, Vulnerability::None).unwrap();
        engine.decide(&request).unwrap()
    }

    #[test]
    fn test_weak_responder_passes_over_double() {
        let result = decide("K65.9872.T52.643", Position::North, "1S X");
        assert_eq!(result.call, Call::Pass);
        assert_eq!(result.phase, Phase::Response);
    }

    #[test]
    fn test_keycard_signoff_stays_below_slam() {
        let result = decide(
            "J96.KQJ53.KJ.KQ6",
            Position::North,
            "1N P 2D P 2H P 4H P 4N P 5D P",
        );
        assert_ne!(result.call, call("6H"));
        assert!(result.call.level().map_or(true, |level| level < 6));
    }

    #[test]
    fn test_raise_over_double_never_reaches_game() {
        let result = decide("K87.Q65.J32.J984", Position::North, "2H X");
        assert!(result.call == Call::Pass || result.call == call("3H"));
    }

    #[test]
    fn test_opening_rule_is_high_confidence() {
        let result = decide("AQ3.KJ2.Q987.A32", Position::North, "");
        assert_eq!(result.call, call("1N"));
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.forcing, None);
        assert!(!result.was_adjusted());
    }

    #[test]
    fn test_strong_two_clubs_is_forcing() {
        let result = decide("AKQ32.AKQ2.AK2.2", Position::North, "");
        assert_eq!(result.call, call("2C"));
        assert_eq!(result.forcing, Some(ForcingLevel::Forcing));
    }

    #[test]
    fn test_opener_rebid_after_two_clubs_keeps_side_forced() {
        let result = decide("AKQ32.AKQ2.AK2.2", Position::North, "2C P 2D P");
        assert_eq!(result.call, call("2S"));
        assert_eq!(result.forcing, Some(ForcingLevel::Forcing));
        let auction = Auction::parse(Position::North, "2C P 2D P 2S").unwrap();
        let state = AuctionState::from_auction(&auction, Vulnerability::None).unwrap();
        assert_eq!(state.forcing_for(types::Partnership::NS), ForcingLevel::Forcing);
    }

    #[test]
    fn test_forcing_comes_from_the_matched_rule() {
        let engine = Engine::sayc().unwrap();
        let request =
            BidRequest::parse("AKQ32.AKQ2.AK2.2", Position::North, "", Vulnerability::None)
                .unwrap();
        let trace = engine.decide_with_trace(&request).unwrap();
        assert_eq!(trace.declared_forcing, Some(ForcingLevel::Forcing));
        assert_eq!(trace.result.forcing, trace.declared_forcing);
        let fallback = Engine::new(EngineConfig {
            bidder: BidderKind::Reference,
            ..EngineConfig::default()
        })
        .unwrap();
        assert_eq!(fallback.decide(&request).unwrap().forcing, None);
    }

    #[test]
    fn test_rejects_wrong_seat() {
        let engine = Engine::sayc().unwrap();
        let mut request =
            BidRequest::parse("K65.9872.T52.643", Position::North, "1S", Vulnerability::None)
                .unwrap();
        request.seat = Position::West;
        let err = engine.decide(&request).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotOnTurn {
                seat: Position::West,
                on_turn: Position::East
            }
        ));
    }

    #[test]
    fn test_rejects_finished_auction() {
        let engine = Engine::sayc().unwrap();
        let request =
            BidRequest::parse("K65.9872.T52.643", Position::North, "P P P P", Vulnerability::None)
                .unwrap();
        assert!(matches!(
            engine.decide(&request),
            Err(EngineError::AuctionFinished)
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = BidRequest::parse("K65.9872", Position::North, "", Vulnerability::None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Hand(_)));
        let err = BidRequest::parse(
            "K65.9872.T52.643",
            Position::North,
            "1S 1C",
            Vulnerability::None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Auction(_)));
    }

    #[test]
    fn test_reference_bidder_is_medium_confidence() {
        let config = EngineConfig {
            bidder: BidderKind::Reference,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        assert_eq!(engine.bidder_name(), "reference");
        let request =
            BidRequest::parse("AQ3.KJ982.Q98.32", Position::North, "", Vulnerability::None)
                .unwrap();
        let result = engine.decide(&request).unwrap();
        assert_eq!(result.source, DecisionSource::Fallback);
        assert_eq!(result.call, call("1H"));
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn test_trace_records_matched_rule() {
        let engine = Engine::sayc().unwrap();
        let request =
            BidRequest::parse("AQ3.KJ2.Q987.A32", Position::North, "", Vulnerability::None)
                .unwrap();
        let trace = engine.decide_with_trace(&request).unwrap();
        assert_eq!(trace.phase, Phase::Opening);
        assert_eq!(trace.proposed, call("1N"));
        assert!(trace.fallback.is_none());
        assert_eq!(trace.matched_rule().map(|s| s.rule.as_str()), Some("open_1nt"));
        assert_eq!(trace.result, engine.decide(&request).unwrap());
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["result"]["call"], "1N");
        assert_eq!(json["features"]["hcp"], 16);
    }

    #[test]
    fn test_annotate_adjustments() {
        let adjustments = vec![Adjustment {
            kind: AdjustmentKind::Slam,
            original: call("6S"),
            call: call("5S"),
            reason: "not enough".into(),
        }];
        assert_eq!(
            annotate("keycards", &adjustments),
            "keycards [6S changed to 5S: not enough]"
        );
        assert_eq!(annotate("keycards", &[]), "keycards");
    }

    #[test]
    fn test_generate_random_board_deals_the_deck() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = generate_random_board(1, &mut rng).unwrap();
        assert_eq!(board.hands.len(), 4);
        let total: usize = board.hands.values().map(|h| h.cards().len()).sum();
        assert_eq!(total, 52);
        assert_eq!(board.dealer, Position::North);
        assert_eq!(board.vulnerability, Vulnerability::None);
    }

    #[test]
    fn test_bid_board_reaches_the_end() {
        let engine = Engine::sayc().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let board = generate_random_board(3, &mut rng).unwrap();
        let auction = engine.bid_board(&board).unwrap();
        assert!(auction.is_finished());
        assert_eq!(auction.dealer, Position::South);
    }
}
