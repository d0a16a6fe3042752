use crate::config::ConfigError;
use crate::rules::RuleStoreError;
use thiserror::Error;
use types::{AuctionError, HandError, Position};

/// Why the engine could not decide. Only malformed input or a broken
/// configuration end up here; a decision itself never fails.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid hand: {0}")]
    Hand(#[from] HandError),
    #[error("invalid auction: {0}")]
    Auction(#[from] AuctionError),
    #[error("{seat} asked for a call but {on_turn} is on turn")]
    NotOnTurn { seat: Position, on_turn: Position },
    #[error("the auction is over")]
    AuctionFinished,
    #[error("the board has no hand for {0}")]
    MissingHand(Position),
    #[error("rule store: {0}")]
    RuleStore(#[from] RuleStoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
