//! Kernel
//!
//! The auction-reading half of the engine: what each call promised, which
//! suit a partnership has agreed, and whether the side on turn is forced.

pub mod auction_state;
pub mod call_interpreter;
pub mod call_semantics;
pub mod hand_constraint;
pub mod hand_model;
pub mod point_ranges;

pub use auction_state::{AuctionState, InterpretedCall, PartnershipFlags, SideState};
pub use call_interpreter::CallInterpreter;
pub use call_semantics::{CallSemantics, Convention, Effect, ForcingLevel};
pub use hand_constraint::HandConstraint;
pub use hand_model::HandModel;
pub use point_ranges::PointRanges;
