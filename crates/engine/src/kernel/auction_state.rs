//! Auction state tracking
//!
//! The state is always rebuilt by folding the call history from an empty
//! auction, so two requests with the same history read it identically.

use crate::kernel::{
    CallInterpreter, CallSemantics, Convention, Effect, ForcingLevel, HandModel,
};
use serde::{Deserialize, Serialize};
use types::{Auction, AuctionError, Call, Partnership, Position, Suit, Vulnerability};

/// Conventional bookkeeping a partnership carries from call to call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipFlags {
    /// The partnership is committed to game.
    pub game_forcing: bool,
    /// One partner has preempted.
    pub preempt_in_progress: bool,
    /// The last call by this side asked for a four-card major.
    pub stayman_asked: bool,
    /// The last call by this side was a transfer to this suit.
    pub transfer_to: Option<Suit>,
    /// Who asked for keycards, if anyone has.
    pub keycard_asker: Option<Position>,
    /// The keycard ask has not been answered yet.
    pub keycard_ask_pending: bool,
    /// Keycards shown by the reply, reading the lower count.
    pub keycards_shown: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    pub forcing: ForcingLevel,
    pub agreed_suit: Option<Suit>,
    pub flags: PartnershipFlags,
}

/// One call of the history together with how the table read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedCall {
    pub position: Position,
    pub call: Call,
    pub convention: Convention,
    /// The calling side's forcing status after this call
    pub forcing: ForcingLevel,
    /// What the caller's hand model looked like after this call
    pub shows: String,
}

/// Everything derivable from the call history alone.
///
/// Models are stored in flat arrays indexed by `Position::idx()` and
/// `Partnership::idx()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    auction: Auction,
    vulnerability: Vulnerability,
    hands: [HandModel; 4],
    shown_suits: [Vec<Suit>; 4],
    natural_suits: [Vec<Suit>; 4],
    sides: [SideState; 2],
    history: Vec<InterpretedCall>,
}

impl AuctionState {
    pub fn new(dealer: Position, vulnerability: Vulnerability) -> Self {
        Self {
            auction: Auction::new(dealer),
            vulnerability,
            hands: Default::default(),
            shown_suits: Default::default(),
            natural_suits: Default::default(),
            sides: Default::default(),
            history: Vec::new(),
        }
    }

    /// Validate `auction` and fold its calls from scratch.
    pub fn from_auction(
        auction: &Auction,
        vulnerability: Vulnerability,
    ) -> Result<Self, AuctionError> {
        Auction::check_calls(&auction.calls)?;
        let mut state = Self::new(auction.dealer, vulnerability);
        for &call in &auction.calls {
            state.record(call);
        }
        Ok(state)
    }

    /// The state after one more call by the player on turn.
    pub fn with_call(&self, call: Call) -> Result<Self, AuctionError> {
        if !self.auction.is_legal(call) {
            return Err(AuctionError::IllegalCall {
                index: self.auction.calls.len(),
                call,
            });
        }
        let mut next = self.clone();
        next.record(call);
        Ok(next)
    }

    /// How the player on turn's `call` would be read.
    pub fn interpret(&self, call: Call) -> CallSemantics {
        CallInterpreter::interpret(self, self.turn(), call)
    }

    fn record(&mut self, call: Call) {
        let position = self.auction.current_player();
        let semantics = CallInterpreter::interpret(self, position, call);
        self.apply(position, call, semantics);
    }

    fn apply(&mut self, position: Position, call: Call, semantics: CallSemantics) {
        let seat = position.idx();
        for constraint in &semantics.shows {
            self.hands[seat].apply_constraint(*constraint);
        }
        if let Some(suit) = semantics.shown_suit {
            push_unique(&mut self.shown_suits[seat], suit);
        }

        let side = &mut self.sides[position.partnership().idx()];
        if let Some(suit) = semantics.natural_suit {
            push_unique(&mut self.natural_suits[seat], suit);
            if self.natural_suits[position.partner().idx()].contains(&suit) {
                side.agreed_suit = Some(suit);
            }
        }
        if let Some(suit) = semantics.agrees {
            side.agreed_suit = Some(suit);
        }

        // Asks and transfers only bind the very next call of the side.
        side.flags.stayman_asked = false;
        side.flags.transfer_to = None;
        if side.flags.keycard_asker != Some(position) {
            side.flags.keycard_ask_pending = false;
        }
        match semantics.effect {
            Some(Effect::Preempt) => side.flags.preempt_in_progress = true,
            Some(Effect::GameForce) => side.flags.game_forcing = true,
            Some(Effect::StaymanAsk) => side.flags.stayman_asked = true,
            Some(Effect::TransferTo(suit)) => side.flags.transfer_to = Some(suit),
            Some(Effect::KeycardAsk) => {
                side.flags.keycard_asker = Some(position);
                side.flags.keycard_ask_pending = true;
                side.flags.keycards_shown = None;
            }
            Some(Effect::KeycardReply(count)) => side.flags.keycards_shown = Some(count),
            None => {}
        }

        side.forcing = if side.flags.game_forcing && call.is_bid() && !call.is_game_or_higher() {
            ForcingLevel::Forcing
        } else {
            semantics.forcing.unwrap_or(side.forcing)
        };

        self.history.push(InterpretedCall {
            position,
            call,
            convention: semantics.convention,
            forcing: side.forcing,
            shows: self.hands[seat].to_string(),
        });
        self.auction.add_call(call);
    }

    pub fn auction(&self) -> &Auction {
        &self.auction
    }

    pub fn vulnerability(&self) -> Vulnerability {
        self.vulnerability
    }

    /// The player whose call is next.
    pub fn turn(&self) -> Position {
        self.auction.current_player()
    }

    pub fn is_finished(&self) -> bool {
        self.auction.is_finished()
    }

    pub fn hand_model(&self, position: Position) -> &HandModel {
        &self.hands[position.idx()]
    }

    /// Suits `position` has promised, in the order they were shown.
    pub fn shown_suits(&self, position: Position) -> &[Suit] {
        &self.shown_suits[position.idx()]
    }

    /// Suits `position` has bid naturally, in the order they were bid.
    pub fn natural_suits(&self, position: Position) -> &[Suit] {
        &self.natural_suits[position.idx()]
    }

    pub fn side(&self, partnership: Partnership) -> &SideState {
        &self.sides[partnership.idx()]
    }

    pub fn forcing_for(&self, partnership: Partnership) -> ForcingLevel {
        self.side(partnership).forcing
    }

    pub fn agreed_suit(&self, partnership: Partnership) -> Option<Suit> {
        self.side(partnership).agreed_suit
    }

    pub fn history(&self) -> &[InterpretedCall] {
        &self.history
    }

    /// How `position`'s most recent call was read.
    pub fn last_reading(&self, position: Position) -> Option<&InterpretedCall> {
        self.history.iter().rev().find(|c| c.position == position)
    }

    /// `position`'s first call other than Pass.
    pub fn first_action(&self, position: Position) -> Option<&InterpretedCall> {
        self.history
            .iter()
            .find(|c| c.position == position && !c.call.is_pass())
    }

    /// `position`'s latest call other than Pass.
    pub fn last_action(&self, position: Position) -> Option<&InterpretedCall> {
        self.history
            .iter()
            .rev()
            .find(|c| c.position == position && !c.call.is_pass())
    }

    /// `position`'s latest action was a double for takeout.
    pub fn doubled_for_takeout(&self, position: Position) -> bool {
        self.last_action(position)
            .is_some_and(|c| c.convention == Convention::TakeoutDouble)
    }

    /// The opening bid and who made it.
    pub fn opening(&self) -> Option<(Position, Call)> {
        self.auction
            .iter()
            .find(|(_, call)| call.is_bid())
            .map(|(position, call)| (position, *call))
    }

    pub fn first_bid_by(&self, position: Position) -> Option<Call> {
        self.auction.calls_by(position).find(|c| c.is_bid())
    }

    pub fn last_bid_by(&self, position: Position) -> Option<Call> {
        self.auction.calls_by(position).filter(|c| c.is_bid()).last()
    }

    /// Whether the opponents of `partnership` have made any call but Pass.
    pub fn contested(&self, partnership: Partnership) -> bool {
        self.auction
            .iter()
            .any(|(pos, call)| pos.partnership() != partnership && !call.is_pass())
    }

    /// An opponent has called other than Pass since `partnership` last did.
    pub fn interference(&self, partnership: Partnership) -> bool {
        self.auction
            .iter()
            .filter(|(_, call)| !call.is_pass())
            .last()
            .is_some_and(|(pos, _)| pos.partnership() != partnership)
    }

    /// Suits the opponents of `partnership` have bid naturally.
    pub fn opponent_suits(&self, partnership: Partnership) -> Vec<Suit> {
        let mut suits = Vec::new();
        for reading in &self.history {
            if reading.position.partnership() == partnership {
                continue;
            }
            if let Some(suit) = reading.call.suit() {
                if self.natural_suits(reading.position).contains(&suit) {
                    push_unique(&mut suits, suit);
                }
            }
        }
        suits
    }

    /// How many levels above the cheapest legal bid in its strain `call` is.
    pub fn jump_size(&self, call: Call) -> u8 {
        match (call, call.strain().and_then(|s| self.auction.minimum_bid_in(s))) {
            (Call::Bid { level, .. }, Some(Call::Bid { level: min, .. })) => {
                level.saturating_sub(min)
            }
            _ => 0,
        }
    }
}

fn push_unique(suits: &mut Vec<Suit>, suit: Suit) {
    if !suits.contains(&suit) {
        suits.push(suit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dealer: Position, calls: &str) -> AuctionState {
        let auction = Auction::parse(dealer, calls).unwrap();
        AuctionState::from_auction(&auction, Vulnerability::None).unwrap()
    }

    #[test]
    fn test_empty_auction() {
        let state = AuctionState::new(Position::East, Vulnerability::Both);
        assert_eq!(state.turn(), Position::East);
        assert_eq!(state.opening(), None);
        assert_eq!(state.forcing_for(Partnership::NS), ForcingLevel::NonForcing);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_rejects_illegal_history() {
        let auction = Auction {
            dealer: Position::North,
            calls: vec![Call::bid(1, types::Strain::Spades), Call::bid(1, types::Strain::Hearts)],
        };
        let err = AuctionState::from_auction(&auction, Vulnerability::None).unwrap_err();
        assert!(matches!(err, AuctionError::IllegalCall { index: 1, .. }));
    }

    #[test]
    fn test_opening_shows_strength_and_length() {
        let state = state(Position::North, "1S");
        let model = state.hand_model(Position::North);
        assert_eq!(model.min_hcp, Some(11));
        assert_eq!(model.min_length(Suit::Spades), 5);
        assert_eq!(state.shown_suits(Position::North), &[Suit::Spades]);
        assert_eq!(state.turn(), Position::East);
    }

    #[test]
    fn test_transfer_sequence_agrees_hearts() {
        let state = state(Position::North, "1N P 2D P 2H P 4H P");
        assert_eq!(state.agreed_suit(Partnership::NS), Some(Suit::Hearts));
        assert_eq!(state.shown_suits(Position::South), &[Suit::Hearts]);
        let conventions: Vec<_> = state.history().iter().map(|c| c.convention).collect();
        assert_eq!(conventions[2], Convention::JacobyTransfer);
        assert_eq!(conventions[4], Convention::TransferCompletion);
    }

    #[test]
    fn test_keycard_reply_is_recorded() {
        let state = state(Position::North, "1N P 2D P 2H P 4H P 4N P 5D P");
        let flags = &state.side(Partnership::NS).flags;
        assert_eq!(flags.keycard_asker, Some(Position::North));
        assert_eq!(flags.keycards_shown, Some(0));
        assert!(!flags.keycard_ask_pending);
        assert_eq!(state.forcing_for(Partnership::NS), ForcingLevel::Forcing);
    }

    #[test]
    fn test_stayman_flag_lasts_one_call() {
        let asked = state(Position::North, "1N P 2C P");
        assert!(asked.side(Partnership::NS).flags.stayman_asked);
        let answered = state(Position::North, "1N P 2C P 2H P");
        assert!(!answered.side(Partnership::NS).flags.stayman_asked);
    }

    #[test]
    fn test_new_suit_response_is_forcing_and_pass_releases() {
        let state = state(Position::North, "1D P 1S");
        assert_eq!(state.forcing_for(Partnership::NS), ForcingLevel::Forcing);
        let after = state.with_call(Call::Pass).unwrap();
        assert_eq!(after.forcing_for(Partnership::NS), ForcingLevel::Forcing);
        assert_eq!(after.forcing_for(Partnership::EW), ForcingLevel::NonForcing);
    }

    #[test]
    fn test_interference_and_opponent_suits() {
        let state = state(Position::North, "1H 2C");
        assert!(state.interference(Partnership::NS));
        assert!(!state.interference(Partnership::EW));
        assert!(state.contested(Partnership::NS));
        assert_eq!(state.opponent_suits(Partnership::NS), vec![Suit::Clubs]);
        assert_eq!(state.opponent_suits(Partnership::EW), vec![Suit::Hearts]);
    }

    #[test]
    fn test_interference_clears_when_we_bid_again() {
        let state = state(Position::North, "1H 2C 2H P");
        assert!(!state.interference(Partnership::NS));
        assert!(state.interference(Partnership::EW));
    }

    #[test]
    fn test_doubled_for_takeout_reads_latest_action() {
        let state = state(Position::North, "1S X 2S P P");
        assert!(state.doubled_for_takeout(Position::East));
        assert_eq!(
            state.last_action(Position::East).map(|c| c.call),
            Some(Call::Double)
        );
        assert!(!state.doubled_for_takeout(Position::West));

        let penalty = self::state(Position::North, "1N X");
        assert!(!penalty.doubled_for_takeout(Position::East));
    }

    #[test]
    fn test_two_club_sequence_stays_forced() {
        let state = state(Position::North, "2C P 2D P 2S");
        assert_eq!(state.forcing_for(Partnership::NS), ForcingLevel::Forcing);
    }

    #[test]
    fn test_preempt_flag() {
        let state = state(Position::North, "2H X");
        assert!(state.side(Partnership::NS).flags.preempt_in_progress);
        assert_eq!(
            state.first_action(Position::East).map(|c| c.convention),
            Some(Convention::TakeoutDouble)
        );
    }

    #[test]
    fn test_with_call_rejects_illegal_call() {
        let state = state(Position::North, "2H");
        assert!(state.with_call(Call::bid(1, types::Strain::Spades)).is_err());
        assert!(state.with_call(Call::Redouble).is_err());
    }

    #[test]
    fn test_jump_size() {
        let state = state(Position::North, "1D P");
        assert_eq!(state.jump_size(Call::bid(1, types::Strain::Spades)), 0);
        assert_eq!(state.jump_size(Call::bid(2, types::Strain::Spades)), 1);
        assert_eq!(state.jump_size(Call::bid(3, types::Strain::Diamonds)), 1);
        assert_eq!(state.jump_size(Call::Pass), 0);
    }

    #[test]
    fn test_rebuild_matches_incremental() {
        let full = state(Position::West, "1C P 1H P 2H");
        let step = state(Position::West, "1C P 1H P")
            .with_call(Call::bid(2, types::Strain::Hearts))
            .unwrap();
        assert_eq!(full, step);
    }
}
