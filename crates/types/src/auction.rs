use crate::board::{Partnership, Position};
use crate::call::{Call, ParseCallError};
use crate::contract::{Contract, DoubleStatus};
use crate::strain::Strain;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("call {index} ({call}) is not a legal continuation")]
    IllegalCall { index: usize, call: Call },
    #[error("call {index} ({call}) was made after the auction ended")]
    CallAfterEnd { index: usize, call: Call },
    #[error("call {index} was attributed to {found}, but {expected} was on turn")]
    OutOfTurn {
        index: usize,
        expected: Position,
        found: Position,
    },
    #[error(transparent)]
    Parse(#[from] ParseCallError),
}

/// Dealer plus the calls made so far. Seats are implied by rotation from
/// the dealer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Auction {
    pub dealer: Position,
    pub calls: Vec<Call>,
}

impl Auction {
    pub fn new(dealer: Position) -> Self {
        Self {
            dealer,
            calls: Vec::new(),
        }
    }

    /// Build a checked auction from a list of calls.
    pub fn try_from_calls(dealer: Position, calls: Vec<Call>) -> Result<Self, AuctionError> {
        Self::check_calls(&calls)?;
        Ok(Self { dealer, calls })
    }

    /// Build a checked auction from `(call, seat)` pairs, rejecting any
    /// pair whose seat does not match the rotation from `dealer`.
    pub fn from_history(
        dealer: Position,
        history: &[(Call, Position)],
    ) -> Result<Self, AuctionError> {
        let mut expected = dealer;
        for (index, &(_, found)) in history.iter().enumerate() {
            if found != expected {
                return Err(AuctionError::OutOfTurn {
                    index,
                    expected,
                    found,
                });
            }
            expected = expected.next();
        }
        let calls = history.iter().map(|&(call, _)| call).collect();
        Self::try_from_calls(dealer, calls)
    }

    /// Parse and check space-separated calls like "1S X".
    pub fn parse(dealer: Position, calls: &str) -> Result<Self, AuctionError> {
        let calls = calls
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(str::parse::<Call>)
            .collect::<Result<Vec<Call>, _>>()?;
        Self::try_from_calls(dealer, calls)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &Call)> {
        let mut p = self.dealer;
        self.calls.iter().map(move |call| {
            let pos = p;
            p = p.next();
            (pos, call)
        })
    }

    /// Append a call without checking it. Use this for calls that already
    /// came out of `legal_calls`.
    pub fn add_call(&mut self, call: Call) {
        self.calls.push(call);
    }

    /// Append a call if it is a legal continuation.
    pub fn try_add_call(&mut self, call: Call) -> Result<(), AuctionError> {
        let index = self.calls.len();
        if self.is_finished() {
            return Err(AuctionError::CallAfterEnd { index, call });
        }
        if !self.is_legal(call) {
            return Err(AuctionError::IllegalCall { index, call });
        }
        self.calls.push(call);
        Ok(())
    }

    pub fn current_player(&self) -> Position {
        let mut p = self.dealer;
        for _ in 0..self.calls.len() % 4 {
            p = p.next();
        }
        p
    }

    pub fn current_contract(&self) -> Option<Contract> {
        let mut last_bid = None;
        let mut double_status = DoubleStatus::Undoubled;

        // First player to have bid each strain for each side, indexed by
        // partnership then strain.
        let mut first_bidders: [[Option<Position>; 5]; 2] = [[None; 5]; 2];

        for (position, call) in self.iter() {
            match call {
                Call::Bid { level, strain } => {
                    let side_index = position.partnership().idx();
                    let declarer = *first_bidders[side_index][strain.idx()].get_or_insert(position);
                    last_bid = Some((*level, *strain, declarer));
                    double_status = DoubleStatus::Undoubled;
                }
                Call::Double => double_status = DoubleStatus::Doubled,
                Call::Redouble => double_status = DoubleStatus::Redoubled,
                Call::Pass => {}
            }
        }

        last_bid.map(|(level, strain, declarer)| Contract {
            level,
            strain,
            double_status,
            declarer,
        })
    }

    pub fn is_finished(&self) -> bool {
        Self::is_finished_at(&self.calls, self.calls.len())
    }

    /// Returns the last bid (not pass/double/redouble) and who made it.
    pub fn last_bid(&self) -> Option<(Position, &Call)> {
        self.iter().filter(|(_, call)| call.is_bid()).last()
    }

    /// Returns the minimum legal bid for the given strain.
    pub fn minimum_bid_in(&self, strain: Strain) -> Option<Call> {
        if self.is_finished() {
            return None;
        }
        let Some((_, last_call)) = self.last_bid() else {
            return Some(Call::bid(1, strain));
        };
        let (level, last_strain) = (last_call.level()?, last_call.strain()?);
        let min_level = if strain > last_strain { level } else { level + 1 };
        (min_level <= 7).then(|| Call::bid(min_level, strain))
    }

    /// Returns the index of the last call made by the given position.
    pub fn last_call_index_for_position(&self, position: Position) -> Option<usize> {
        let num_calls = self.calls.len();
        let first_call_idx = (position.idx() + 4 - self.dealer.idx()) % 4;

        if num_calls <= first_call_idx {
            return None;
        }

        let k = (num_calls - first_call_idx - 1) / 4;
        Some(first_call_idx + 4 * k)
    }

    pub fn last_call_by(&self, position: Position) -> Option<Call> {
        self.last_call_index_for_position(position)
            .map(|idx| self.calls[idx])
    }

    /// Every call made by `position`, in order.
    pub fn calls_by(&self, position: Position) -> impl Iterator<Item = Call> + '_ {
        self.iter()
            .filter(move |(pos, _)| *pos == position)
            .map(|(_, call)| *call)
    }

    /// Returns true if a player has made any non-Pass call (bid, double, or redouble).
    pub fn player_has_acted(&self, player: Position) -> bool {
        self.calls_by(player).any(|call| !call.is_pass())
    }

    /// Returns true if a partnership has made at least one bid (not pass/double/redouble).
    pub fn partnership_has_bid(&self, partnership: Partnership) -> bool {
        self.iter()
            .any(|(pos, call)| pos.partnership() == partnership && call.is_bid())
    }

    pub fn final_contract(&self) -> Option<Contract> {
        if self.is_finished() {
            self.current_contract()
        } else {
            None
        }
    }

    pub fn is_legal(&self, call: Call) -> bool {
        let mut test = self.calls.clone();
        test.push(call);
        Self::check_calls(&test).is_ok()
    }

    /// Walk the calls and report the first one that breaks the laws of
    /// bidding: insufficient bids, doubles of partner or of nothing,
    /// redoubles without an opposing double, or anything after the end.
    pub fn check_calls(calls: &[Call]) -> Result<(), AuctionError> {
        let mut last_bid: Option<(u8, Strain)> = None;
        let mut last_bid_index = None;
        let mut last_double_index = None;
        let mut is_redoubled = false;

        for (index, &call) in calls.iter().enumerate() {
            if index > 0 && Self::is_finished_at(calls, index) {
                return Err(AuctionError::CallAfterEnd { index, call });
            }
            let illegal = AuctionError::IllegalCall { index, call };

            match call {
                Call::Pass => {}
                Call::Bid { level, strain } => {
                    if !(1..=7).contains(&level) {
                        return Err(illegal);
                    }
                    if let Some((last_level, last_strain)) = last_bid {
                        if (level, strain) <= (last_level, last_strain) {
                            return Err(illegal);
                        }
                    }
                    last_bid = Some((level, strain));
                    last_bid_index = Some(index);
                    last_double_index = None;
                    is_redoubled = false;
                }
                Call::Double => {
                    let Some(bid_index) = last_bid_index else {
                        return Err(illegal);
                    };
                    if last_double_index.is_some() || is_redoubled || (index - bid_index) % 2 == 0 {
                        return Err(illegal);
                    }
                    last_double_index = Some(index);
                }
                Call::Redouble => {
                    let Some(double_index) = last_double_index else {
                        return Err(illegal);
                    };
                    if is_redoubled || (index - double_index) % 2 == 0 {
                        return Err(illegal);
                    }
                    is_redoubled = true;
                    last_double_index = None;
                }
            }
        }
        Ok(())
    }

    /// Return all calls that would be legal as the next call in this auction.
    pub fn legal_calls(&self) -> Vec<Call> {
        if self.is_finished() {
            return Vec::new();
        }

        let mut result = vec![Call::Pass];
        for level in 1..=7u8 {
            for &strain in &Strain::ALL {
                let call = Call::bid(level, strain);
                if self.is_legal(call) {
                    result.push(call);
                }
            }
        }
        for call in [Call::Double, Call::Redouble] {
            if self.is_legal(call) {
                result.push(call);
            }
        }
        result
    }

    fn is_finished_at(calls: &[Call], len: usize) -> bool {
        if len < 4 {
            return false;
        }
        let prefix = &calls[..len];
        if prefix.iter().all(|c| c.is_pass()) {
            return true;
        }
        prefix[len - 3..].iter().all(|c| c.is_pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Auction {
        fn bid(&mut self, call: &str) {
            self.try_add_call(call.parse().unwrap()).unwrap();
        }

        fn bids(&mut self, calls: &str) {
            calls.split_whitespace().for_each(|call| self.bid(call));
        }

        fn bidding(dealer: Position, calls: &str) -> Self {
            Auction::parse(dealer, calls).unwrap()
        }
    }

    #[test]
    fn test_auction_finished() {
        let mut auction = Auction::new(Position::North);
        auction.bids("1S P P");
        assert!(!auction.is_finished());
        auction.bid("P");
        assert!(auction.is_finished());
    }

    #[test]
    fn test_final_contract() {
        let mut auction = Auction::new(Position::North);
        auction.bid("1C");
        assert_eq!(auction.final_contract(), None);
        auction.bids("P P P");
        assert_eq!(
            auction.final_contract(),
            Some(Contract {
                level: 1,
                strain: Strain::Clubs,
                double_status: DoubleStatus::Undoubled,
                declarer: Position::North,
            })
        );
    }

    #[test]
    fn test_current_player() {
        let mut auction = Auction::new(Position::West);
        assert_eq!(auction.current_player(), Position::West);
        auction.bids("P P P");
        assert_eq!(auction.current_player(), Position::South);
    }

    #[test]
    fn test_declarer_logic() {
        // East was the first to bid clubs for EW.
        let mut auction = Auction::bidding(Position::North, "P 1C P 2C");
        assert_eq!(
            auction.current_contract().map(|c| c.declarer),
            Some(Position::East)
        );

        auction.bids("2D P 3D X");
        let contract = auction.current_contract().unwrap();
        assert_eq!(contract.declarer, Position::North);
        assert_eq!(contract.double_status, DoubleStatus::Doubled);
    }

    #[test]
    fn test_minimum_bid_in() {
        let mut auction = Auction::new(Position::North);
        assert_eq!(
            auction.minimum_bid_in(Strain::Clubs),
            Some(Call::bid(1, Strain::Clubs))
        );

        auction.bid("1D");
        assert_eq!(
            auction.minimum_bid_in(Strain::Clubs),
            Some(Call::bid(2, Strain::Clubs))
        );
        assert_eq!(
            auction.minimum_bid_in(Strain::Hearts),
            Some(Call::bid(1, Strain::Hearts))
        );
        assert_eq!(
            auction.minimum_bid_in(Strain::Diamonds),
            Some(Call::bid(2, Strain::Diamonds))
        );

        auction.bids("7N");
        assert_eq!(auction.minimum_bid_in(Strain::Spades), None);
    }

    #[test]
    fn test_last_bid_skips_doubles() {
        let mut auction = Auction::bidding(Position::North, "1C P 1S");
        assert_eq!(auction.last_bid().map(|(p, _)| p), Some(Position::South));
        auction.bid("X");
        assert_eq!(auction.last_bid().map(|(p, _)| p), Some(Position::South));
    }

    #[test]
    fn test_calls_by_and_last_call_by() {
        let auction = Auction::bidding(Position::North, "1C P 1S P 2S");
        let north: Vec<Call> = auction.calls_by(Position::North).collect();
        assert_eq!(north, vec![Call::bid(1, Strain::Clubs), Call::bid(2, Strain::Spades)]);
        assert_eq!(auction.last_call_by(Position::East), Some(Call::Pass));
        assert_eq!(auction.last_call_by(Position::South), Some(Call::bid(1, Strain::Spades)));

        let fresh = Auction::new(Position::East);
        assert_eq!(fresh.last_call_by(Position::North), None);
    }

    #[test]
    fn test_player_has_acted() {
        let auction = Auction::bidding(Position::North, "1C X");
        assert!(auction.player_has_acted(Position::North));
        assert!(auction.player_has_acted(Position::East));
        assert!(!auction.player_has_acted(Position::South));

        let auction = Auction::bidding(Position::North, "P P");
        assert!(!auction.player_has_acted(Position::North));
    }

    #[test]
    fn test_partnership_has_bid() {
        let auction = Auction::bidding(Position::North, "1C X");
        assert!(auction.partnership_has_bid(Partnership::NS));
        assert!(!auction.partnership_has_bid(Partnership::EW));
    }

    #[test]
    fn test_check_reports_first_bad_call() {
        let calls = vec![Call::bid(1, Strain::Diamonds), Call::bid(1, Strain::Clubs)];
        assert_eq!(
            Auction::check_calls(&calls),
            Err(AuctionError::IllegalCall {
                index: 1,
                call: Call::bid(1, Strain::Clubs)
            })
        );
    }

    #[test]
    fn test_double_of_partner_is_illegal() {
        assert!(Auction::bidding(Position::North, "1C").is_legal(Call::Double));
        assert!(!Auction::bidding(Position::North, "1C P").is_legal(Call::Double));
    }

    #[test]
    fn test_redouble_rules() {
        assert!(Auction::bidding(Position::North, "1C X").is_legal(Call::Redouble));
        // Redoubling partner's double is not allowed.
        assert!(!Auction::bidding(Position::North, "1C X P").is_legal(Call::Redouble));
    }

    #[test]
    fn test_calls_after_end_are_rejected() {
        let calls = vec![Call::Pass, Call::Pass, Call::Pass, Call::Pass, Call::bid(1, Strain::Clubs)];
        assert_eq!(
            Auction::check_calls(&calls),
            Err(AuctionError::CallAfterEnd {
                index: 4,
                call: Call::bid(1, Strain::Clubs)
            })
        );
    }

    #[test]
    fn test_try_add_call() {
        let mut auction = Auction::bidding(Position::North, "1H");
        assert!(auction.try_add_call(Call::bid(1, Strain::Spades)).is_ok());
        assert_eq!(
            auction.try_add_call(Call::bid(1, Strain::Hearts)),
            Err(AuctionError::IllegalCall {
                index: 2,
                call: Call::bid(1, Strain::Hearts)
            })
        );
        assert_eq!(auction.calls.len(), 2);
    }

    #[test]
    fn test_from_history_checks_rotation() {
        let history = [
            (Call::bid(1, Strain::Spades), Position::North),
            (Call::Double, Position::East),
        ];
        let auction = Auction::from_history(Position::North, &history).unwrap();
        assert_eq!(auction.current_player(), Position::South);

        let skipped = [
            (Call::bid(1, Strain::Spades), Position::North),
            (Call::Double, Position::South),
        ];
        assert_eq!(
            Auction::from_history(Position::North, &skipped),
            Err(AuctionError::OutOfTurn {
                index: 1,
                expected: Position::East,
                found: Position::South
            })
        );
    }

    #[test]
    fn test_parse_reports_bad_tokens() {
        assert!(Auction::parse(Position::North, "1S X").is_ok());
        assert!(Auction::parse(Position::North, "1S,P,2S").is_ok());
        assert!(matches!(
            Auction::parse(Position::North, "1S 9Q"),
            Err(AuctionError::Parse(_))
        ));
        assert!(matches!(
            Auction::parse(Position::North, "2S 1S"),
            Err(AuctionError::IllegalCall { index: 1, .. })
        ));
    }

    #[test]
    fn test_legal_calls_empty_auction() {
        let calls = Auction::new(Position::North).legal_calls();
        // Pass + 35 bids (7 levels × 5 strains) = 36
        assert_eq!(calls.len(), 36);
        assert_eq!(calls[0], Call::Pass);
        assert_eq!(calls[1], Call::bid(1, Strain::Clubs));
    }

    #[test]
    fn test_legal_calls_after_bid() {
        let calls = Auction::bidding(Position::North, "1H").legal_calls();
        assert!(calls.contains(&Call::Pass));
        assert!(calls.contains(&Call::Double));
        assert!(!calls.contains(&Call::Redouble));
        assert!(!calls.contains(&Call::bid(1, Strain::Clubs)));
        assert!(calls.contains(&Call::bid(1, Strain::Spades)));
    }

    #[test]
    fn test_legal_calls_finished_auction() {
        let auction = Auction::bidding(Position::North, "P P P P");
        assert!(auction.legal_calls().is_empty());
    }

    #[test]
    fn test_last_call_index_for_position() {
        let mut auction = Auction::new(Position::East);
        assert_eq!(auction.last_call_index_for_position(Position::East), None);
        auction.bids("1C P 1S P 2S");
        assert_eq!(auction.last_call_index_for_position(Position::East), Some(4));
        assert_eq!(auction.last_call_index_for_position(Position::South), Some(1));
        assert_eq!(auction.last_call_index_for_position(Position::West), Some(2));
        assert_eq!(auction.last_call_index_for_position(Position::North), Some(3));
    }
}
