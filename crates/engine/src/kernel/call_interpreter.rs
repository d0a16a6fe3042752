//! Reading calls under Standard American Yellow Card agreements

use crate::kernel::HandConstraint::{MaxHcp, MaxLength, MaxUnbalancedness, MinHcp, MinLength};
use crate::kernel::{AuctionState, CallSemantics, Convention, Effect, ForcingLevel, HandConstraint};
use types::{Auction, Call, Position, Shape, Strain, Suit};

use ForcingLevel::{Forcing, Invitational, NonForcing};

/// Assigns a meaning to every call, given the history before it.
pub struct CallInterpreter;

impl CallInterpreter {
    pub fn interpret(state: &AuctionState, position: Position, call: Call) -> CallSemantics {
        let reader = Reader {
            state,
            me: position,
        };
        match call {
            Call::Pass => reader.pass(),
            Call::Double => reader.double(),
            Call::Redouble => CallSemantics::new(Convention::Redouble)
                .show(MinHcp(10))
                .forcing(NonForcing),
            Call::Bid { level, strain } => reader.bid(level, strain),
        }
    }
}

struct Reader<'a> {
    state: &'a AuctionState,
    me: Position,
}

fn balanced() -> HandConstraint {
    MaxUnbalancedness(Shape::Balanced)
}

fn hcp(min: u8, max: u8) -> [HandConstraint; 2] {
    HandConstraint::hcp(min, max)
}

impl Reader<'_> {
    fn partner(&self) -> Position {
        self.me.partner()
    }

    fn auction(&self) -> &Auction {
        self.state.auction()
    }

    fn flags(&self) -> &crate::kernel::PartnershipFlags {
        &self.state.side(self.me.partnership()).flags
    }

    fn agreed_suit(&self) -> Option<Suit> {
        self.state.agreed_suit(self.me.partnership())
    }

    fn has_acted(&self, position: Position) -> bool {
        self.auction().player_has_acted(position)
    }

    fn interference(&self) -> bool {
        self.state.interference(self.me.partnership())
    }

    fn opponent_suits(&self) -> Vec<Suit> {
        self.state.opponent_suits(self.me.partnership())
    }

    fn partner_suit(&self) -> Option<Suit> {
        self.state.shown_suits(self.partner()).last().copied()
    }

    fn my_suit(&self) -> Option<Suit> {
        self.state.shown_suits(self.me).first().copied()
    }

    fn jump(&self, level: u8, strain: Strain) -> u8 {
        self.state.jump_size(Call::bid(level, strain))
    }

    fn natural(&self, level: u8, strain: Strain) -> CallSemantics {
        match strain.to_suit() {
            Some(suit) => CallSemantics::natural(Convention::Natural, suit)
                .show(MinLength(suit, if level >= 3 { 5 } else { 4 })),
            None => CallSemantics::new(Convention::Natural),
        }
    }

    fn pass(&self) -> CallSemantics {
        let semantics = CallSemantics::new(Convention::Pass).forcing(NonForcing);
        match self.state.opening() {
            None => semantics.show(MaxHcp(11)),
            Some((opener, opening)) if opener == self.partner() && !self.has_acted(self.me) => {
                match opening {
                    Call::Bid {
                        level: 1,
                        strain: Strain::NoTrump,
                    } => semantics.show(MaxHcp(7)),
                    Call::Bid { level: 1, .. } if !self.interference() => {
                        semantics.show(MaxHcp(5))
                    }
                    _ => semantics,
                }
            }
            _ => semantics,
        }
    }

    fn double(&self) -> CallSemantics {
        let penalty = CallSemantics::new(Convention::PenaltyDouble).forcing(NonForcing);
        let (Some((opener, _)), Some((_, &last))) = (self.state.opening(), self.auction().last_bid())
        else {
            return penalty;
        };
        let (Some(level), Some(strain)) = (last.level(), last.strain()) else {
            return penalty;
        };

        if opener == self.partner() {
            if self.has_acted(self.me) || strain == Strain::NoTrump || level > 3 {
                return penalty;
            }
            let unbid_majors: Vec<Suit> = [Suit::Hearts, Suit::Spades]
                .into_iter()
                .filter(|s| {
                    !self.state.shown_suits(self.partner()).contains(s)
                        && !self.opponent_suits().contains(s)
                })
                .collect();
            let mut semantics = CallSemantics::new(Convention::NegativeDouble)
                .show(MinHcp(6))
                .forcing(Forcing);
            if let [major] = unbid_majors.as_slice() {
                semantics = semantics.show(MinLength(*major, 4));
            }
            return semantics;
        }

        if opener.partnership() == self.me.partnership() {
            return penalty;
        }
        let partner_doubled = self.state.doubled_for_takeout(self.partner());
        let our_side_bid = self.auction().partnership_has_bid(self.me.partnership());
        if strain == Strain::NoTrump {
            return penalty.show(MinHcp(15));
        }
        if our_side_bid || partner_doubled || level > 4 {
            return penalty;
        }
        CallSemantics::new(Convention::TakeoutDouble)
            .show(MinHcp(12))
            .forcing(Forcing)
    }

    fn bid(&self, level: u8, strain: Strain) -> CallSemantics {
        if let Some(semantics) = self.slam_convention(level, strain) {
            return semantics;
        }
        let semantics = match self.state.opening() {
            None => self.opening_bid(level, strain),
            Some((opener, _)) if opener == self.me => self.opener_rebid(level, strain),
            Some((opener, opening)) if opener == self.partner() => {
                if self.has_acted(self.me) {
                    self.responder_rebid(level, strain)
                } else {
                    self.response(opening, level, strain)
                }
            }
            Some(_) if self.has_acted(self.me) => self.competitive(level, strain),
            Some(_) if self.has_acted(self.partner()) => self.advance(level, strain),
            Some(_) => self.overcall(level, strain),
        };
        // Natural bids at game or above end the partnership's obligations.
        if !semantics.is_artificial() && Call::bid(level, strain).is_game_or_higher() {
            semantics.forcing(NonForcing)
        } else {
            semantics
        }
    }

    fn slam_convention(&self, level: u8, strain: Strain) -> Option<CallSemantics> {
        let flags = self.flags();
        if flags.keycard_ask_pending
            && flags.keycard_asker == Some(self.partner())
            && level == 5
            && strain != Strain::NoTrump
        {
            // 1430 responses: 5C one or four, 5D zero or three, 5H two
            // without the trump queen, 5S two with it.
            let keycards = match strain {
                Strain::Clubs => 1,
                Strain::Diamonds => 0,
                _ => 2,
            };
            return Some(
                CallSemantics::new(Convention::KeycardReply)
                    .forcing(Forcing)
                    .effect(Effect::KeycardReply(keycards)),
            );
        }

        if level == 4 && strain == Strain::NoTrump && !flags.keycard_ask_pending {
            if let Some(trump) = self.agreed_suit() {
                return Some(self.keycard_ask(trump));
            }
            let partner_bid_notrump = self
                .state
                .last_bid_by(self.partner())
                .is_some_and(|c| c.strain() == Some(Strain::NoTrump));
            if partner_bid_notrump || self.partner_suit().is_none() {
                return Some(
                    CallSemantics::new(Convention::QuantitativeNotrump).forcing(Invitational),
                );
            }
            return self.partner_suit().map(|trump| self.keycard_ask(trump));
        }

        if flags.keycards_shown.is_some() && flags.keycard_asker == Some(self.me) && level == 5 {
            if strain == Strain::NoTrump {
                return Some(CallSemantics::new(Convention::KingAsk).forcing(Forcing));
            }
            let trump = self.agreed_suit()?;
            if strain == Strain::from(trump) {
                return Some(
                    CallSemantics::natural(Convention::KeycardSignoff, trump).forcing(NonForcing),
                );
            }
        }
        None
    }

    fn keycard_ask(&self, trump: Suit) -> CallSemantics {
        CallSemantics::new(Convention::KeycardAsk)
            .agrees(trump)
            .forcing(Forcing)
            .effect(Effect::KeycardAsk)
    }

    fn opening_bid(&self, level: u8, strain: Strain) -> CallSemantics {
        let Some(suit) = strain.to_suit() else {
            let range = match level {
                1 => hcp(15, 17),
                2 => hcp(20, 21),
                3 => hcp(25, 27),
                _ => return self.natural(level, strain),
            };
            return CallSemantics::new(Convention::NotrumpOpening)
                .show_all(range)
                .show(balanced())
                .forcing(NonForcing);
        };
        match (level, suit) {
            (1, _) => CallSemantics::natural(Convention::OneOfASuit, suit)
                .show_all(hcp(11, 21))
                .show(MinLength(suit, if suit.is_major() { 5 } else { 3 }))
                .forcing(NonForcing),
            (2, Suit::Clubs) => CallSemantics::new(Convention::StrongTwoClubs)
                .show(MinHcp(22))
                .forcing(Forcing),
            (2, _) => CallSemantics::natural(Convention::WeakTwo, suit)
                .show_all(hcp(5, 10))
                .show(MinLength(suit, 6))
                .forcing(NonForcing)
                .effect(Effect::Preempt),
            (3, _) => CallSemantics::natural(Convention::Preempt, suit)
                .show(MaxHcp(10))
                .show(MinLength(suit, 7))
                .forcing(NonForcing)
                .effect(Effect::Preempt),
            (4 | 5, _) => CallSemantics::natural(Convention::Preempt, suit)
                .show(MaxHcp(12))
                .show(MinLength(suit, level + 3))
                .forcing(NonForcing)
                .effect(Effect::Preempt),
            _ => self.natural(level, strain),
        }
    }

    fn response(&self, opening: Call, level: u8, strain: Strain) -> CallSemantics {
        let Call::Bid {
            level: opening_level,
            strain: opening_strain,
        } = opening
        else {
            return self.natural(level, strain);
        };
        match (opening_level, opening_strain.to_suit()) {
            (1 | 2, None) if !self.interference() => {
                self.over_notrump(level, strain, opening_level + 1)
            }
            (2, Some(Suit::Clubs)) => self.over_two_clubs(level, strain),
            (_, Some(suit)) if self.flags().preempt_in_progress => {
                self.over_preempt(level, strain, suit, opening_level)
            }
            (1, Some(suit)) => self.over_one_of_a_suit(level, strain, suit),
            _ => self.natural(level, strain),
        }
    }

    /// Responses to 1NT (`base` 2) and 2NT (`base` 3).
    fn over_notrump(&self, level: u8, strain: Strain, base: u8) -> CallSemantics {
        let stayman_minimum = if base == 2 { 8 } else { 4 };
        match (level, strain) {
            (l, Strain::Clubs) if l == base => CallSemantics::new(Convention::Stayman)
                .show(MinHcp(stayman_minimum))
                .forcing(Forcing)
                .effect(Effect::StaymanAsk),
            (l, Strain::Diamonds) if l == base => self.transfer(Suit::Hearts, 5),
            (l, Strain::Hearts) if l == base => self.transfer(Suit::Spades, 5),
            (2, Strain::Spades) if base == 2 => self.transfer(Suit::Clubs, 6).show(MaxHcp(7)),
            (2, Strain::NoTrump) => CallSemantics::new(Convention::NotrumpResponse)
                .show_all(hcp(8, 9))
                .show(MaxUnbalancedness(Shape::SemiBalanced))
                .forcing(Invitational),
            (3, Strain::NoTrump) => CallSemantics::new(Convention::NotrumpResponse)
                .show_all(if base == 2 { hcp(10, 15) } else { hcp(4, 10) })
                .forcing(NonForcing),
            (3, Strain::Hearts | Strain::Spades) if base == 2 => {
                let suit = strain.to_suit().unwrap_or(Suit::Spades);
                CallSemantics::natural(Convention::NewSuit, suit)
                    .show(MinHcp(10))
                    .show(MinLength(suit, 5))
                    .forcing(Forcing)
            }
            (3, Strain::Clubs | Strain::Diamonds) if base == 2 => {
                let suit = strain.to_suit().unwrap_or(Suit::Clubs);
                CallSemantics::natural(Convention::Natural, suit)
                    .show(MinLength(suit, 6))
                    .forcing(Invitational)
            }
            (4, Strain::Hearts | Strain::Spades) => {
                let suit = strain.to_suit().unwrap_or(Suit::Spades);
                CallSemantics::natural(Convention::Natural, suit)
                    .show(MinLength(suit, 6))
                    .forcing(NonForcing)
            }
            _ => self.natural(level, strain),
        }
    }

    fn transfer(&self, target: Suit, length: u8) -> CallSemantics {
        CallSemantics::new(Convention::JacobyTransfer)
            .shown_suit(target)
            .show(MinLength(target, length))
            .forcing(Forcing)
            .effect(Effect::TransferTo(target))
    }

    fn over_two_clubs(&self, level: u8, strain: Strain) -> CallSemantics {
        match (level, strain.to_suit()) {
            (2, Some(Suit::Diamonds)) => {
                CallSemantics::new(Convention::WaitingResponse).forcing(Forcing)
            }
            (2 | 3, Some(suit)) => CallSemantics::natural(Convention::PositiveResponse, suit)
                .show(MinHcp(8))
                .show(MinLength(suit, 5))
                .forcing(Forcing)
                .effect(Effect::GameForce),
            (2, None) => CallSemantics::new(Convention::PositiveResponse)
                .show(MinHcp(8))
                .show(balanced())
                .forcing(Forcing)
                .effect(Effect::GameForce),
            _ => self.natural(level, strain),
        }
    }

    fn over_preempt(
        &self,
        level: u8,
        strain: Strain,
        preempt_suit: Suit,
        preempt_level: u8,
    ) -> CallSemantics {
        match strain.to_suit() {
            Some(suit) if suit == preempt_suit => {
                CallSemantics::natural(Convention::PreemptiveRaise, suit)
                    .show(MinLength(suit, if level >= 4 { 3 } else { 2 }))
                    .forcing(NonForcing)
            }
            None if level == 2 && preempt_level == 2 => CallSemantics::new(Convention::FeatureAsk)
                .show(MinHcp(15))
                .forcing(Forcing),
            None => CallSemantics::new(Convention::NotrumpResponse)
                .show(MinHcp(15))
                .forcing(NonForcing),
            Some(suit) => CallSemantics::natural(Convention::NewSuit, suit)
                .show(MinHcp(14))
                .show(MinLength(suit, 5))
                .forcing(Forcing),
        }
    }

    fn over_one_of_a_suit(&self, level: u8, strain: Strain, opened: Suit) -> CallSemantics {
        let jump = self.jump(level, strain);
        let interference = self.interference();
        let Some(suit) = strain.to_suit() else {
            return match level {
                1 => CallSemantics::new(Convention::NotrumpResponse)
                    .show_all(hcp(6, 10))
                    .forcing(NonForcing),
                2 if opened.is_major() && !interference => {
                    CallSemantics::new(Convention::JacobyTwoNotrump)
                        .shown_suit(opened)
                        .agrees(opened)
                        .show(MinHcp(13))
                        .show(MinLength(opened, 4))
                        .forcing(Forcing)
                        .effect(Effect::GameForce)
                }
                2 if interference => CallSemantics::new(Convention::NotrumpResponse)
                    .show_all(hcp(11, 12))
                    .forcing(Invitational),
                2 => CallSemantics::new(Convention::NotrumpResponse)
                    .show_all(hcp(13, 15))
                    .show(balanced())
                    .forcing(Forcing)
                    .effect(Effect::GameForce),
                3 => CallSemantics::new(Convention::NotrumpResponse)
                    .show_all(hcp(15, 17))
                    .show(balanced())
                    .forcing(NonForcing),
                _ => self.natural(level, strain),
            };
        };

        if suit == opened {
            let support = if opened.is_major() { 3 } else { 4 };
            return match jump {
                0 => CallSemantics::natural(Convention::SingleRaise, suit)
                    .show_all(hcp(6, 10))
                    .show(MinLength(suit, support))
                    .forcing(NonForcing),
                1 if level <= 3 => CallSemantics::natural(Convention::LimitRaise, suit)
                    .show_all(hcp(10, 12))
                    .show(MinLength(suit, support + 1))
                    .forcing(Invitational),
                _ => CallSemantics::natural(Convention::PreemptiveRaise, suit)
                    .show(MaxHcp(9))
                    .show(MinLength(suit, 5))
                    .forcing(NonForcing),
            };
        }

        if self.opponent_suits().contains(&suit) {
            return CallSemantics::new(Convention::CuebidRaise)
                .shown_suit(opened)
                .agrees(opened)
                .show(MinHcp(10))
                .show(MinLength(opened, 3))
                .forcing(Forcing);
        }

        match (jump, interference) {
            (0, _) if level == 1 => CallSemantics::natural(Convention::NewSuit, suit)
                .show(MinHcp(6))
                .show(MinLength(suit, 4))
                .forcing(Forcing),
            (0, _) => CallSemantics::natural(Convention::NewSuit, suit)
                .show(MinHcp(10))
                .show(MinLength(suit, if suit == Suit::Hearts { 5 } else { 4 }))
                .forcing(Forcing),
            (_, false) => CallSemantics::natural(Convention::JumpShift, suit)
                .show(MinHcp(19))
                .show(MinLength(suit, 5))
                .forcing(Forcing)
                .effect(Effect::GameForce),
            (_, true) => CallSemantics::natural(Convention::Natural, suit)
                .show(MaxHcp(9))
                .show(MinLength(suit, 6))
                .forcing(NonForcing),
        }
    }

    fn opener_rebid(&self, level: u8, strain: Strain) -> CallSemantics {
        let flags = self.flags();
        let jump = self.jump(level, strain);

        if let Some(target) = flags.transfer_to {
            if strain == Strain::from(target) {
                return if jump == 0 {
                    CallSemantics::natural(Convention::TransferCompletion, target)
                        .show(MinLength(target, 2))
                        .forcing(NonForcing)
                } else {
                    CallSemantics::natural(Convention::SuperAccept, target)
                        .show(MinHcp(17))
                        .show(MinLength(target, 4))
                        .forcing(Invitational)
                };
            }
        }

        if flags.stayman_asked && jump == 0 {
            match strain {
                Strain::Diamonds => {
                    return CallSemantics::new(Convention::StaymanDenial)
                        .show(MaxLength(Suit::Hearts, 3))
                        .show(MaxLength(Suit::Spades, 3))
                        .forcing(NonForcing);
                }
                Strain::Hearts => {
                    return CallSemantics::natural(Convention::StaymanReply, Suit::Hearts)
                        .show(MinLength(Suit::Hearts, 4))
                        .forcing(NonForcing);
                }
                Strain::Spades => {
                    return CallSemantics::natural(Convention::StaymanReply, Suit::Spades)
                        .show(MinLength(Suit::Spades, 4))
                        .show(MaxLength(Suit::Hearts, 3))
                        .forcing(NonForcing);
                }
                _ => {}
            }
        }

        if self.rebidding_after(Convention::StrongTwoClubs) {
            return self.strong_two_club_rebid(level, strain);
        }
        let partner_last = self.state.last_reading(self.partner()).map(|c| c.convention);
        if partner_last == Some(Convention::JacobyTwoNotrump) {
            if let Some(semantics) = self.jacoby_rebid(level, strain) {
                return semantics;
            }
        }

        let Some(suit) = strain.to_suit() else {
            return match (level, jump) {
                (1, _) | (2, 0) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(12, 14))
                    .show(balanced())
                    .forcing(NonForcing),
                (2, _) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(18, 19))
                    .show(balanced())
                    .forcing(Invitational),
                _ => self.natural(level, strain),
            };
        };

        if let Some(semantics) = self.fit_rebid(level, suit, jump) {
            return semantics;
        }

        if Some(suit) == self.my_suit() {
            return if jump == 0 {
                CallSemantics::natural(Convention::Rebid, suit)
                    .show(MinLength(suit, 6))
                    .show(MaxHcp(15))
                    .forcing(NonForcing)
            } else {
                CallSemantics::natural(Convention::JumpRebid, suit)
                    .show_all(hcp(16, 18))
                    .show(MinLength(suit, 6))
                    .forcing(Invitational)
            };
        }

        if Some(suit) == self.partner_suit() {
            return match jump {
                0 => CallSemantics::natural(Convention::SingleRaise, suit)
                    .show_all(hcp(12, 15))
                    .show(MinLength(suit, 4))
                    .forcing(NonForcing),
                1 => CallSemantics::natural(Convention::LimitRaise, suit)
                    .show_all(hcp(16, 18))
                    .show(MinLength(suit, 4))
                    .forcing(Invitational),
                _ => CallSemantics::natural(Convention::Natural, suit)
                    .show(MinLength(suit, 4))
                    .forcing(NonForcing),
            };
        }

        let opened_one_of = self
            .state
            .first_bid_by(self.me)
            .filter(|c| c.level() == Some(1))
            .and_then(|c| c.suit());
        match (jump, opened_one_of) {
            (0, Some(first)) if level == 2 && suit > first => {
                CallSemantics::natural(Convention::Reverse, suit)
                    .show(MinHcp(17))
                    .show(MinLength(suit, 4))
                    .forcing(Forcing)
            }
            (0, _) => CallSemantics::natural(Convention::NewSuit, suit)
                .show(MinLength(suit, 4))
                .forcing(NonForcing),
            _ => CallSemantics::natural(Convention::JumpShift, suit)
                .show(MinHcp(19))
                .show(MinLength(suit, 4))
                .forcing(Forcing)
                .effect(Effect::GameForce),
        }
    }

    /// My first action was `opening` and this is my second bid.
    fn rebidding_after(&self, opening: Convention) -> bool {
        self.state
            .first_action(self.me)
            .is_some_and(|c| c.convention == opening)
            && self.auction().calls_by(self.me).filter(|c| c.is_bid()).count() == 1
    }

    /// After 2C every suit below game is forcing; notrump shows the big
    /// balanced ranges.
    fn strong_two_club_rebid(&self, level: u8, strain: Strain) -> CallSemantics {
        let Some(suit) = strain.to_suit() else {
            let range = match level {
                2 => hcp(22, 24),
                3 => hcp(25, 27),
                _ => return self.natural(level, strain),
            };
            return CallSemantics::new(Convention::NotrumpRebid)
                .show_all(range)
                .show(balanced())
                .forcing(NonForcing);
        };
        if Some(suit) == self.partner_suit() {
            return CallSemantics::natural(Convention::SingleRaise, suit)
                .show(MinHcp(22))
                .show(MinLength(suit, 3))
                .forcing(Forcing);
        }
        CallSemantics::natural(Convention::Rebid, suit)
            .show(MinHcp(22))
            .show(MinLength(suit, 5))
            .forcing(Forcing)
    }

    /// Opener's answers to Jacoby 2NT: a new suit at the three level is
    /// shortness, 3NT is 15-17 without one, both forcing.
    fn jacoby_rebid(&self, level: u8, strain: Strain) -> Option<CallSemantics> {
        let trump = self.agreed_suit()?;
        match (level, strain.to_suit()) {
            (3, None) => Some(
                CallSemantics::new(Convention::JacobyRebid)
                    .show_all(hcp(15, 17))
                    .forcing(Forcing),
            ),
            (3, Some(suit)) if suit != trump => Some(
                CallSemantics::new(Convention::JacobyRebid)
                    .show(MaxLength(suit, 1))
                    .forcing(Forcing),
            ),
            (3, Some(_)) => Some(
                CallSemantics::natural(Convention::Rebid, trump)
                    .show(MinHcp(18))
                    .forcing(Forcing),
            ),
            _ => None,
        }
    }

    /// Bidding an agreed suit again below game is an invitation.
    fn fit_rebid(&self, level: u8, suit: Suit, jump: u8) -> Option<CallSemantics> {
        if self.agreed_suit() != Some(suit) || level >= Strain::from(suit).game_level() {
            return None;
        }
        let convention = if jump == 0 {
            Convention::Rebid
        } else {
            Convention::JumpRebid
        };
        Some(CallSemantics::natural(convention, suit).forcing(Invitational))
    }

    fn responder_rebid(&self, level: u8, strain: Strain) -> CallSemantics {
        let jump = self.jump(level, strain);
        let transfer_completed = self
            .state
            .last_reading(self.partner())
            .is_some_and(|c| c.convention == Convention::TransferCompletion);

        let Some(suit) = strain.to_suit() else {
            return match (level, transfer_completed) {
                (1, _) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(6, 10))
                    .forcing(NonForcing),
                (2, true) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(8, 9))
                    .forcing(Invitational),
                (2, false) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(11, 12))
                    .forcing(Invitational),
                (3, true) => CallSemantics::new(Convention::NotrumpRebid)
                    .show_all(hcp(10, 15))
                    .forcing(NonForcing),
                _ => self.natural(level, strain),
            };
        };

        if transfer_completed && Some(suit) == self.my_suit() {
            return CallSemantics::natural(Convention::Rebid, suit)
                .show(MinLength(suit, 6))
                .forcing(if level == 3 { Invitational } else { NonForcing });
        }

        if let Some(semantics) = self.fit_rebid(level, suit, jump) {
            return semantics;
        }

        if Some(suit) == self.partner_suit() {
            // Raising a notrump opener's suit below game invites.
            let over_notrump = self
                .state
                .opening()
                .is_some_and(|(_, call)| call.strain() == Some(Strain::NoTrump));
            let forcing = if jump == 0 && !over_notrump {
                NonForcing
            } else {
                Invitational
            };
            return CallSemantics::natural(Convention::SingleRaise, suit)
                .show(MinLength(suit, if over_notrump { 4 } else { 3 }))
                .forcing(forcing);
        }

        if Some(suit) == self.my_suit() {
            return if jump == 0 {
                CallSemantics::natural(Convention::Rebid, suit)
                    .show(MinLength(suit, 5))
                    .forcing(NonForcing)
            } else {
                CallSemantics::natural(Convention::JumpRebid, suit)
                    .show(MinLength(suit, 6))
                    .forcing(Invitational)
            };
        }

        CallSemantics::natural(Convention::NewSuit, suit)
            .show(MinLength(suit, 4))
            .forcing(Forcing)
    }

    fn overcall(&self, level: u8, strain: Strain) -> CallSemantics {
        let jump = self.jump(level, strain);
        let opponent_suits = self.opponent_suits();
        let Some(suit) = strain.to_suit() else {
            if jump == 0 && level <= 2 {
                return opponent_suits.iter().fold(
                    CallSemantics::new(Convention::NotrumpOvercall)
                        .show_all(hcp(15, 18))
                        .show(balanced())
                        .forcing(NonForcing),
                    |semantics, &s| semantics.show(HandConstraint::StopperIn(s)),
                );
            }
            if level == 2 {
                return CallSemantics::new(Convention::UnusualNotrump)
                    .show(MinLength(Suit::Clubs, 5))
                    .show(MinLength(Suit::Diamonds, 5))
                    .forcing(Forcing);
            }
            return self.natural(level, strain);
        };

        if opponent_suits.contains(&suit) {
            let semantics = CallSemantics::new(Convention::MichaelsCuebid).forcing(Forcing);
            return if suit.is_minor() {
                semantics
                    .show(MinLength(Suit::Hearts, 5))
                    .show(MinLength(Suit::Spades, 5))
            } else {
                semantics.show(MinLength(suit.sibling(), 5))
            };
        }

        if jump >= 1 {
            return CallSemantics::natural(Convention::WeakJumpOvercall, suit)
                .show_all(hcp(5, 10))
                .show(MinLength(suit, 6))
                .forcing(NonForcing)
                .effect(Effect::Preempt);
        }

        let range = if level == 1 { hcp(8, 16) } else { hcp(10, 16) };
        CallSemantics::natural(Convention::Overcall, suit)
            .show_all(range)
            .show(MinLength(suit, 5))
            .forcing(NonForcing)
    }

    fn advance(&self, level: u8, strain: Strain) -> CallSemantics {
        let jump = self.jump(level, strain);
        let partner_doubled = self.state.doubled_for_takeout(self.partner());

        let Some(suit) = strain.to_suit() else {
            let range = match (jump, partner_doubled) {
                (0, true) => hcp(6, 10),
                (0, false) => hcp(8, 11),
                _ => hcp(11, 12),
            };
            let forcing = if jump == 0 { NonForcing } else { Invitational };
            return CallSemantics::new(Convention::Advance)
                .show_all(range)
                .forcing(forcing);
        };

        if self.opponent_suits().contains(&suit) {
            let semantics = CallSemantics::new(Convention::CuebidRaise).forcing(Forcing);
            return match self.partner_suit() {
                Some(overcall) if !partner_doubled => semantics
                    .agrees(overcall)
                    .shown_suit(overcall)
                    .show(MinHcp(10))
                    .show(MinLength(overcall, 3)),
                _ => semantics.show(MinHcp(12)),
            };
        }

        if !partner_doubled && Some(suit) == self.partner_suit() {
            return if jump == 0 {
                CallSemantics::natural(Convention::SingleRaise, suit)
                    .show_all(hcp(6, 10))
                    .show(MinLength(suit, 3))
                    .forcing(NonForcing)
            } else {
                CallSemantics::natural(Convention::PreemptiveRaise, suit)
                    .show(MaxHcp(9))
                    .show(MinLength(suit, 4))
                    .forcing(NonForcing)
            };
        }

        let semantics = CallSemantics::natural(Convention::Advance, suit);
        match (partner_doubled, jump) {
            (true, 0) => semantics
                .show(MaxHcp(8))
                .show(MinLength(suit, 4))
                .forcing(NonForcing),
            (true, _) => semantics
                .show_all(hcp(9, 11))
                .show(MinLength(suit, 4))
                .forcing(Invitational),
            (false, _) => semantics.show(MinLength(suit, 5)).forcing(NonForcing),
        }
    }

    fn competitive(&self, level: u8, strain: Strain) -> CallSemantics {
        match strain.to_suit() {
            Some(suit) if Some(suit) == self.partner_suit() => {
                CallSemantics::natural(Convention::Natural, suit)
                    .show(MinLength(suit, 3))
                    .forcing(NonForcing)
            }
            Some(suit) if self.opponent_suits().contains(&suit) => {
                CallSemantics::new(Convention::CuebidRaise).forcing(Forcing)
            }
            _ => self.natural(level, strain).forcing(NonForcing),
        }
    }
}
