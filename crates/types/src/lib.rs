//! Card, hand and auction model shared by the bidding engine and its tools.

pub mod auction;
pub mod board;
pub mod call;
pub mod card;
pub mod contract;
pub mod hand;
pub mod io;
pub mod rank;
pub mod strain;
pub mod suit;

pub use auction::{Auction, AuctionError};
pub use board::{Board, Partnership, Position, Vulnerability};
pub use call::{Call, ParseCallError};
pub use card::Card;
pub use contract::Contract;
pub use hand::{Distribution, Hand, HandError, Shape};
pub use rank::Rank;
pub use strain::Strain;
pub use suit::Suit;
