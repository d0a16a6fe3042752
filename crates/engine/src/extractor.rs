//! Feature extraction
//!
//! Turns a hand and the state of the auction into a complete `FeatureSet`.
//! Everything is computed up front from the hand and `AuctionState`; rules
//! only ever see the finished set.

use crate::features::{Feature, FeatureSet, Phase, Value};
use crate::kernel::{AuctionState, Convention};
use types::{Call, Hand, Partnership, Position, Rank, Strain, Suit};

pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Features for `me`, who must be the player on turn in `state`.
    pub fn extract(hand: &Hand, state: &AuctionState, me: Position) -> FeatureSet {
        let context = Context::new(hand, state, me);
        FeatureSet::from_fn(|feature| context.value(feature))
    }
}

/// Intermediate facts shared by several features.
struct Context<'a> {
    hand: &'a Hand,
    state: &'a AuctionState,
    me: Position,
    partner: Position,
    side: Partnership,
    partner_suit: Option<Suit>,
    agreed_suit: Option<Suit>,
    opp_suits: Vec<Suit>,
    partner_est: i32,
    phase: Phase,
}

impl<'a> Context<'a> {
    fn new(hand: &'a Hand, state: &'a AuctionState, me: Position) -> Self {
        let partner = me.partner();
        let side = me.partnership();
        let partner_suit = state.shown_suits(partner).last().copied();
        let agreed_suit = state.agreed_suit(side);
        let opp_suits = state.opponent_suits(side);
        let partner_est = partner_estimate(hand, state, partner);
        let phase = classify_phase(state, me);
        Self {
            hand,
            state,
            me,
            partner,
            side,
            partner_suit,
            agreed_suit,
            opp_suits,
            partner_est,
            phase,
        }
    }

    fn value(&self, feature: Feature) -> Value {
        use Feature as F;
        let hand = self.hand;
        let auction = self.state.auction();
        let flags = &self.state.side(self.side).flags;
        match feature {
            F::Hcp => num(hand.hcp()),
            F::TotalPoints => num(self.total_points()),
            F::LenClubs => num(hand.length(Suit::Clubs)),
            F::LenDiamonds => num(hand.length(Suit::Diamonds)),
            F::LenHearts => num(hand.length(Suit::Hearts)),
            F::LenSpades => num(hand.length(Suit::Spades)),
            F::LongestSuit => Value::Suit(Some(hand.longest_suit())),
            F::LongestLength => num(hand.length(hand.longest_suit())),
            F::SecondSuit => Value::Suit(self.second_suit()),
            F::SecondLength => num(self.second_suit().map_or(0, |s| hand.length(s))),
            F::LongestMajor => Value::Suit(Some(self.longest_major())),
            F::LongestMajorLength => num(hand.length(self.longest_major())),
            F::BetterMinor => Value::Suit(Some(self.better_minor())),
            F::Shape => Value::Shape(hand.shape()),
            F::IsBalanced => Value::Flag(hand.is_balanced()),
            F::Stoppers => num(hand.stopper_count()),
            F::RuleOfTwenty => Value::Flag(hand.rule_of_twenty()),
            F::RuleOfFifteen => Value::Flag(hand.rule_of_fifteen()),
            F::GoodSuit => Value::Flag(hand.is_good_suit(hand.longest_suit())),
            F::KeycardsHeld => num(self.keycards_held()),
            F::TrumpQueen => Value::Flag(
                self.trump_suit()
                    .is_some_and(|suit| hand.has_card(suit, Rank::Queen)),
            ),
            F::Controls => num(hand.controls()),
            F::BestNewSuit => Value::Suit(self.best_new_suit(&Suit::ALL)),
            F::BestNewSuitLength => {
                num(self.best_new_suit(&Suit::ALL).map_or(0, |s| hand.length(s)))
            }
            F::BestNewMajor => Value::Suit(self.best_new_suit(&[Suit::Hearts, Suit::Spades])),

            F::Phase => Value::Phase(self.phase),
            F::Seat => num(self.me.seat_from(auction.dealer)),
            F::Vulnerable => Value::Flag(self.state.vulnerability().is_vulnerable(self.me)),
            F::OpponentsVulnerable => {
                Value::Flag(self.state.vulnerability().opponents_vulnerable(self.me))
            }
            F::IsContested => Value::Flag(self.state.contested(self.side)),
            F::Interference => Value::Flag(self.state.interference(self.side)),
            F::RhoPassed => Value::Flag(self.rho_call().is_some_and(|c| c.is_pass())),
            F::RhoBid => Value::Flag(self.rho_call().is_some_and(|c| c.is_bid())),
            F::ForcingLevel => Value::Forcing(self.state.forcing_for(self.side)),
            F::GameForcing => Value::Flag(flags.game_forcing),
            F::GameReached => Value::Flag(self.last_bid().is_some_and(|c| c.is_game_or_higher())),
            F::OpeningBid => Value::Call(self.state.opening().map(|(_, call)| call)),
            F::PartnerOpening => Value::Call(self.opening_by(self.partner)),
            F::MyOpening => Value::Call(self.opening_by(self.me)),
            F::PartnerLastBid => Value::Call(self.state.last_bid_by(self.partner)),
            F::MyLastBid => Value::Call(self.state.last_bid_by(self.me)),
            F::LastBid => Value::Call(self.last_bid()),
            F::LastBidLevel => num(self.last_bid().and_then(|c| c.level()).unwrap_or(0)),
            F::LastBidNotrump => Value::Flag(
                self.last_bid()
                    .is_some_and(|c| c.strain() == Some(Strain::NoTrump)),
            ),
            F::RhoCall => Value::Call(self.rho_call()),
            F::IHaveActed => Value::Flag(auction.player_has_acted(self.me)),
            F::PartnerHasActed => Value::Flag(auction.player_has_acted(self.partner)),
            F::PartnerSuit => Value::Suit(self.partner_suit),
            F::MySuit => Value::Suit(self.my_suit()),
            F::MySuitLength => num(self.my_suit().map_or(0, |s| hand.length(s))),
            F::SupportForPartner => num(self.support()),
            F::AgreedSuit => Value::Suit(self.agreed_suit),
            F::FitLength => num(self.fit_length()),
            F::OppSuit => Value::Suit(self.opp_suits.last().copied()),
            F::OppSuitLength => num(self.opp_suits.last().map_or(0, |&s| hand.length(s))),
            F::OppSuitStopped => {
                Value::Flag(self.opp_suits.iter().all(|&s| hand.has_stopper(s)))
            }
            F::TakeoutShape => Value::Flag(self.takeout_shape()),
            F::UnbidMajorLength => num(self.unbid_major_length()),
            F::PartnerMinHcp => Value::Number(self.partner_model_min()),
            F::PartnerMaxHcp => {
                num(self.state.hand_model(self.partner).max_hcp.unwrap_or(37))
            }
            F::PartnerEstHcp => Value::Number(self.partner_est),
            F::CombinedMinHcp => Value::Number(i32::from(hand.hcp()) + self.partner_model_min()),
            F::CombinedEstHcp => Value::Number(i32::from(hand.hcp()) + self.partner_est),
            F::CombinedEstPoints => {
                Value::Number(i32::from(self.total_points()) + self.partner_est)
            }
            F::PartnerPreempted => Value::Flag(self.partner_preempted()),
            F::PreemptInProgress => Value::Flag(flags.preempt_in_progress),
            F::PartnerDoubled => Value::Flag(self.state.doubled_for_takeout(self.partner)),
            F::KeycardAskPending => Value::Flag(
                flags.keycard_ask_pending && flags.keycard_asker == Some(self.partner),
            ),
            F::KeycardsShown => Value::Flag(self.partner_keycards().is_some()),
            F::PartnerKeycards => num(self.partner_keycards().unwrap_or(0)),
            F::KeycardsTotal => {
                num(self.keycards_held() + self.partner_keycards().unwrap_or(0))
            }
            F::MyBidCount => num(bid_count(auction, self.me)),
            F::PartnerBidCount => num(bid_count(auction, self.partner)),
            F::PassedHand => Value::Flag(passed_hand(self.state, self.me)),
            F::PartnerPassedHand => Value::Flag(passed_hand(self.state, self.partner)),
            F::TransferSuit => Value::Suit(flags.transfer_to),
            F::TransferCompleted => Value::Flag(self.transfer_completed()),
            F::StaymanAsked => Value::Flag(flags.stayman_asked),
            F::SecondSuitReverse => Value::Flag(self.second_suit_reverse()),
        }
    }

    fn rho_call(&self) -> Option<Call> {
        self.state.auction().last_call_by(self.me.rho())
    }

    fn last_bid(&self) -> Option<Call> {
        self.state.auction().last_bid().map(|(_, call)| *call)
    }

    fn opening_by(&self, position: Position) -> Option<Call> {
        self.state
            .opening()
            .filter(|(opener, _)| *opener == position)
            .map(|(_, call)| call)
    }

    fn my_suit(&self) -> Option<Suit> {
        self.state.natural_suits(self.me).first().copied()
    }

    fn support(&self) -> u8 {
        self.partner_suit.map_or(0, |s| self.hand.length(s))
    }

    fn fit_length(&self) -> u8 {
        self.partner_suit.map_or(0, |s| {
            self.hand.length(s) + self.state.hand_model(self.partner).min_length(s)
        })
    }

    /// The suit we would play in: the agreed suit, else partner's suit when
    /// we hold three of it.
    fn trump_suit(&self) -> Option<Suit> {
        self.agreed_suit
            .or(self.partner_suit.filter(|&s| self.hand.length(s) >= 3))
    }

    fn total_points(&self) -> u8 {
        match self.trump_suit() {
            Some(trump) if self.hand.length(trump) >= 3 => {
                let support = self.hand.points(Some(trump));
                support.max(self.hand.points(None))
            }
            _ => self.hand.points(None),
        }
    }

    fn keycards_held(&self) -> u8 {
        let king = self
            .trump_suit()
            .is_some_and(|suit| self.hand.has_card(suit, Rank::King));
        self.hand.aces() + u8::from(king)
    }

    /// Partner's keycard reply to my ask.
    fn partner_keycards(&self) -> Option<u8> {
        let flags = &self.state.side(self.side).flags;
        if flags.keycard_asker == Some(self.me) {
            flags.keycards_shown
        } else {
            None
        }
    }

    /// Best four-card-or-longer suit besides the one I have bid, or besides
    /// my longest suit before I have bid. Suits partner or the opponents
    /// have shown are never a second suit.
    fn second_suit(&self) -> Option<Suit> {
        let anchor = self.my_suit().unwrap_or_else(|| self.hand.longest_suit());
        let taken = |s: &Suit| {
            self.opp_suits.contains(s)
                || self.state.shown_suits(self.partner).contains(s)
                || self.state.natural_suits(self.partner).contains(s)
        };
        Suit::PBN_ORDER
            .into_iter()
            .filter(|&s| s != anchor && !taken(&s) && self.hand.length(s) >= 4)
            .fold(None, |best: Option<Suit>, suit| match best {
                Some(b) if self.hand.length(b) >= self.hand.length(suit) => Some(b),
                _ => Some(suit),
            })
    }

    fn longest_major(&self) -> Suit {
        let (hearts, spades) = (self.hand.length(Suit::Hearts), self.hand.length(Suit::Spades));
        if spades > hearts || (spades == hearts && spades >= 5) {
            Suit::Spades
        } else {
            Suit::Hearts
        }
    }

    fn better_minor(&self) -> Suit {
        let (clubs, diamonds) = (self.hand.length(Suit::Clubs), self.hand.length(Suit::Diamonds));
        if clubs > diamonds || (clubs == diamonds && clubs <= 3) {
            Suit::Clubs
        } else {
            Suit::Diamonds
        }
    }

    fn bid_suits(&self) -> Vec<Suit> {
        let mut suits: Vec<Suit> = self.opp_suits.clone();
        for position in [self.me, self.partner] {
            suits.extend_from_slice(self.state.shown_suits(position));
            suits.extend_from_slice(self.state.natural_suits(position));
        }
        suits
    }

    /// Longest four-card-or-longer suit nobody has bid. Four-card suits are
    /// bid up the line, longer ones from the top.
    fn best_new_suit(&self, candidates: &[Suit]) -> Option<Suit> {
        let taken = self.bid_suits();
        let mut best: Option<Suit> = None;
        for &suit in candidates.iter().filter(|s| !taken.contains(s)) {
            let length = self.hand.length(suit);
            if length < 4 {
                continue;
            }
            best = match best {
                None => Some(suit),
                Some(b) => {
                    let best_length = self.hand.length(b);
                    if length > best_length || (length == best_length && length >= 5) {
                        Some(suit)
                    } else {
                        Some(b)
                    }
                }
            };
        }
        best
    }

    fn takeout_shape(&self) -> bool {
        if self.opp_suits.is_empty() {
            return false;
        }
        Suit::ALL.iter().all(|&suit| {
            let length = self.hand.length(suit);
            if self.opp_suits.contains(&suit) {
                length <= 2
            } else {
                length >= 3
            }
        })
    }

    fn unbid_major_length(&self) -> u8 {
        let taken = self.bid_suits();
        [Suit::Hearts, Suit::Spades]
            .into_iter()
            .filter(|s| !taken.contains(s))
            .map(|s| self.hand.length(s))
            .min()
            .unwrap_or(0)
    }

    fn partner_model_min(&self) -> i32 {
        i32::from(self.state.hand_model(self.partner).min_hcp.unwrap_or(0))
    }

    fn partner_preempted(&self) -> bool {
        self.state.first_action(self.partner).is_some_and(|r| {
            matches!(r.convention, Convention::WeakTwo | Convention::Preempt)
        })
    }

    fn transfer_completed(&self) -> bool {
        let mine = self.state.last_reading(self.me).map(|r| r.convention);
        let theirs = self.state.last_reading(self.partner).map(|r| r.convention);
        mine == Some(Convention::JacobyTransfer)
            && matches!(
                theirs,
                Some(Convention::TransferCompletion | Convention::SuperAccept)
            )
    }

    /// Showing the second suit now means a reverse: I opened one of a
    /// suit, the second suit outranks it, and its cheapest bid is at the
    /// two level.
    fn second_suit_reverse(&self) -> bool {
        let opened_one_of = self
            .opening_by(self.me)
            .filter(|c| c.level() == Some(1))
            .and_then(|c| c.suit());
        let (Some(first), Some(second)) = (opened_one_of, self.second_suit()) else {
            return false;
        };
        second > first
            && self
                .state
                .auction()
                .minimum_bid_in(Strain::from_suit(second))
                .and_then(|c| c.level())
                == Some(2)
    }
}

fn num(n: u8) -> Value {
    Value::Number(i32::from(n))
}

fn bid_count(auction: &types::Auction, position: Position) -> u8 {
    auction.calls_by(position).filter(|c| c.is_bid()).count() as u8
}

/// `position` passed when it could have opened.
fn passed_hand(state: &AuctionState, position: Position) -> bool {
    for (caller, call) in state.auction().iter() {
        if call.is_bid() {
            return false;
        }
        if caller == position {
            return call.is_pass();
        }
    }
    false
}

/// What we expect partner to hold. Partners who have said nothing get an
/// even share of the missing points; a passed hand is capped below an
/// opening.
fn partner_estimate(hand: &Hand, state: &AuctionState, partner: Position) -> i32 {
    let unseen = 40 - i32::from(hand.hcp());
    let estimate = state
        .hand_model(partner)
        .estimate_hcp()
        .map(i32::from)
        .unwrap_or(unseen / 3);
    let estimate = if passed_hand(state, partner) && !state.auction().player_has_acted(partner) {
        estimate.min(11)
    } else {
        estimate
    };
    estimate.clamp(0, unseen)
}

/// Which stage of the auction the player on turn is in.
pub fn classify_phase(state: &AuctionState, me: Position) -> Phase {
    let auction = state.auction();
    let Some((opener, _)) = state.opening() else {
        return Phase::Opening;
    };
    let acted = auction.player_has_acted(me);
    if opener == me {
        Phase::OpenerRebid
    } else if opener == me.partner() {
        if acted {
            Phase::ResponderRebid
        } else {
            Phase::Response
        }
    } else if acted {
        Phase::Competitive
    } else if auction.player_has_acted(me.partner()) {
        Phase::Advance
    } else {
        Phase::Overcall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ForcingLevel;
    use types::{Auction, Vulnerability};

    fn features(pbn: &str, dealer: Position, calls: &str) -> FeatureSet {
        let hand = Hand::from_pbn(pbn).unwrap();
        let auction = Auction::parse(dealer, calls).unwrap();
        let state = AuctionState::from_auction(&auction, Vulnerability::None).unwrap();
        let me = state.turn();
        FeatureExtractor::extract(&hand, &state, me)
    }

    #[test]
    fn test_every_feature_has_a_value_of_its_kind() {
        let set = features("AKQ2.KJ3.Q84.J92", Position::North, "");
        for (feature, value) in set.iter() {
            assert_eq!(value.kind(), feature.kind(), "{}", feature);
        }
    }

    #[test]
    fn test_hand_features() {
        let set = features("AKQ2.KJ3.Q84.J92", Position::North, "");
        assert_eq!(set.number(Feature::Hcp), 16);
        assert!(set.flag(Feature::IsBalanced));
        assert_eq!(set.suit(Feature::LongestSuit), Some(Suit::Spades));
        assert_eq!(set.suit(Feature::BetterMinor), Some(Suit::Clubs));
        assert_eq!(set.number(Feature::Stoppers), 3);
        assert_eq!(set.phase(), Phase::Opening);
        assert_eq!(set.number(Feature::Seat), 1);
        assert_eq!(set.suit(Feature::PartnerSuit), None);
        assert_eq!(set.number(Feature::SupportForPartner), 0);
        assert_eq!(set.number(Feature::PartnerKeycards), 0);
        assert!(set.flag(Feature::OppSuitStopped));
    }

    #[test]
    fn test_minor_and_major_preferences() {
        let four_four = features("AK32.Q.KJ32.Q432", Position::North, "");
        assert_eq!(four_four.suit(Feature::BetterMinor), Some(Suit::Diamonds));
        let five_five = features("AKJ32.KQ432.3.32", Position::North, "");
        assert_eq!(five_five.suit(Feature::LongestMajor), Some(Suit::Spades));
        assert_eq!(five_five.suit(Feature::SecondSuit), Some(Suit::Hearts));
        let four_majors = features("AK32.QJ32.K3.432", Position::North, "");
        assert_eq!(four_majors.suit(Feature::LongestMajor), Some(Suit::Hearts));
    }

    #[test]
    fn test_response_to_takeout_double() {
        let set = features("K65.9872.T52.643", Position::North, "1S X");
        assert_eq!(set.phase(), Phase::Response);
        assert_eq!(set.suit(Feature::PartnerSuit), Some(Suit::Spades));
        assert_eq!(set.number(Feature::SupportForPartner), 3);
        assert!(set.flag(Feature::IsContested));
        assert!(set.flag(Feature::Interference));
        assert!(!set.flag(Feature::RhoPassed));
        assert_eq!(set.call(Feature::PartnerOpening), Some(Call::bid(1, Strain::Spades)));
        assert_eq!(set.number(Feature::PartnerMinHcp), 11);
        assert_eq!(set.number(Feature::FitLength), 8);
    }

    #[test]
    fn test_phases() {
        assert_eq!(features("AK32.Q5.KJ32.Q32", Position::North, "1C").phase(), Phase::Overcall);
        assert_eq!(
            features("AK32.Q5.KJ32.Q32", Position::North, "1C 1H P").phase(),
            Phase::Advance
        );
        assert_eq!(
            features("AK32.Q5.KJ32.Q32", Position::North, "1C P 1H P").phase(),
            Phase::OpenerRebid
        );
        assert_eq!(
            features("AK32.Q5.KJ32.Q32", Position::North, "1C P 1H P 1S P").phase(),
            Phase::ResponderRebid
        );
        assert_eq!(
            features("AK32.Q5.KJ32.Q32", Position::North, "1C 1H 2C 2H P").phase(),
            Phase::Competitive
        );
    }

    #[test]
    fn test_weak_two_partner_features() {
        let set = features("K87.Q65.J32.J984", Position::North, "2H X");
        assert_eq!(set.phase(), Phase::Response);
        assert!(set.flag(Feature::PartnerPreempted));
        assert!(set.flag(Feature::PreemptInProgress));
        assert_eq!(set.suit(Feature::PartnerSuit), Some(Suit::Hearts));
        assert_eq!(set.number(Feature::PartnerMaxHcp), 10);
        assert!(set.number(Feature::CombinedEstHcp) < 20);
    }

    #[test]
    fn test_keycard_reply_features() {
        let set = features(
            "J96.KQJ53.KJ.KQ6",
            Position::North,
            "1N P 2D P 2H P 4H P 4N P 5D P",
        );
        assert_eq!(set.suit(Feature::AgreedSuit), Some(Suit::Hearts));
        assert!(set.flag(Feature::KeycardsShown));
        assert_eq!(set.number(Feature::PartnerKeycards), 0);
        assert_eq!(set.number(Feature::KeycardsHeld), 1);
        assert_eq!(set.number(Feature::KeycardsTotal), 1);
        assert!(!set.flag(Feature::KeycardAskPending));
        assert_eq!(set.forcing_level(), ForcingLevel::Forcing);
    }

    #[test]
    fn test_transfer_features() {
        let opener = features("AQ3.K32.KJ32.Q32", Position::North, "1N P 2D P");
        assert_eq!(opener.suit(Feature::TransferSuit), Some(Suit::Hearts));
        assert_eq!(opener.suit(Feature::PartnerSuit), Some(Suit::Hearts));

        let responder = features("32.KJ8532.Q32.32", Position::North, "1N P 2D P 2H P");
        assert!(responder.flag(Feature::TransferCompleted));
        assert_eq!(responder.suit(Feature::TransferSuit), None);
    }

    #[test]
    fn test_passed_hand() {
        let set = features("K32.Q32.J432.432", Position::North, "P P 1S P");
        assert!(set.flag(Feature::PassedHand));
        assert!(!set.flag(Feature::PartnerPassedHand));
        let responder = features("K32.Q32.J432.432", Position::North, "P 1H P");
        assert!(!responder.flag(Feature::PassedHand));
    }

    #[test]
    fn test_reverse_detection() {
        let set = features("AK32.5.AKJ32.Q32", Position::North, "1D P 1N P");
        assert_eq!(set.suit(Feature::MySuit), Some(Suit::Diamonds));
        assert_eq!(set.suit(Feature::SecondSuit), Some(Suit::Spades));
        assert!(set.flag(Feature::SecondSuitReverse));
    }

    #[test]
    fn test_second_suit_skips_opponent_suits() {
        let set = features("A2.AKJ2.3.AKJ432", Position::North, "1C 2H P P");
        assert_eq!(set.suit(Feature::MySuit), Some(Suit::Clubs));
        assert_eq!(set.suit(Feature::SecondSuit), None);
        assert!(!set.flag(Feature::SecondSuitReverse));
    }

    #[test]
    fn test_no_reverse_at_the_three_level() {
        let set = features("K2.AKJ2.3.AKJ432", Position::North, "1C P 1S 2S");
        assert_eq!(set.suit(Feature::SecondSuit), Some(Suit::Hearts));
        assert!(!set.flag(Feature::SecondSuitReverse));
    }

    #[test]
    fn test_double_and_notrump_context() {
        let advancer = features("KJ832.Q54.J32.32", Position::North, "1D X P");
        assert!(advancer.flag(Feature::PartnerDoubled));
        assert!(!advancer.flag(Feature::LastBidNotrump));
        assert!(!advancer.flag(Feature::Interference));

        let after_penalty = features("KJ832.Q54.J32.32", Position::North, "1N X P");
        assert!(!after_penalty.flag(Feature::PartnerDoubled));
        assert!(after_penalty.flag(Feature::LastBidNotrump));

        let responder = features("KJ832.Q54.J32.32", Position::North, "1D 1N");
        assert!(responder.flag(Feature::LastBidNotrump));
        assert!(responder.flag(Feature::Interference));
    }

    #[test]
    fn test_best_new_suit_up_the_line() {
        let set = features("KJ32.Q432.32.K32", Position::North, "1C P");
        assert_eq!(set.suit(Feature::BestNewSuit), Some(Suit::Hearts));
        assert_eq!(set.suit(Feature::BestNewMajor), Some(Suit::Hearts));
        let longer = features("KJ532.Q5432.2.32", Position::North, "1C P");
        assert_eq!(longer.suit(Feature::BestNewSuit), Some(Suit::Spades));
    }
}
