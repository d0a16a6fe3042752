//! Sanity layer between a bidder's proposal and the table
//!
//! Legality is checked first and again last, so whatever the guards do the
//! final call is one the auction accepts. Guards in between may replace the
//! call or keep it with lowered confidence; a guard's replacement is checked
//! again by the same guard until it settles.

mod guards;

pub use guards::{ForcingGuard, SlamGuard, StrengthGuard};

use crate::config::Thresholds;
use crate::features::FeatureSet;
use crate::kernel::AuctionState;
use crate::result::{Adjustment, AdjustmentKind};
use types::{Call, Position};

/// Everything a guard may look at.
pub struct ValidationContext<'a> {
    pub state: &'a AuctionState,
    pub features: &'a FeatureSet,
    pub seat: Position,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Keep the call, but it deserves less trust.
    Doubtful(String),
    Replace { call: Call, reason: String },
}

/// An appropriateness check on a legal call.
pub trait Guard: Send + Sync {
    fn kind(&self) -> AdjustmentKind;
    fn check(&self, call: Call, ctx: &ValidationContext<'_>) -> Verdict;
}

/// The validated call and every adjustment made on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub call: Call,
    pub adjustments: Vec<Adjustment>,
}

// One step per level is always enough to settle.
const MAX_STEPS: usize = 8;

pub struct Validator {
    guards: Vec<Box<dyn Guard>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SlamGuard),
            Box::new(StrengthGuard),
            Box::new(ForcingGuard),
        ])
    }
}

impl Validator {
    pub fn new(guards: Vec<Box<dyn Guard>>) -> Self {
        Self { guards }
    }

    pub fn validate(&self, proposed: Call, ctx: &ValidationContext<'_>) -> Validation {
        let mut adjustments = Vec::new();
        let mut call = legal_or_pass(proposed, ctx, &mut adjustments);

        for guard in &self.guards {
            for _ in 0..MAX_STEPS {
                match guard.check(call, ctx) {
                    Verdict::Accept => break,
                    Verdict::Doubtful(reason) => {
                        record(&mut adjustments, guard.kind(), call, call, reason);
                        break;
                    }
                    Verdict::Replace { call: next, reason } => {
                        record(&mut adjustments, guard.kind(), call, next, reason);
                        if next == call {
                            break;
                        }
                        call = next;
                    }
                }
            }
        }

        let call = legal_or_pass(call, ctx, &mut adjustments);
        Validation { call, adjustments }
    }
}

fn legal_or_pass(
    call: Call,
    ctx: &ValidationContext<'_>,
    adjustments: &mut Vec<Adjustment>,
) -> Call {
    if ctx.state.auction().is_legal(call) {
        return call;
    }
    let reason = format!("{} is not a legal call here", call);
    record(adjustments, AdjustmentKind::Illegal, call, Call::Pass, reason);
    Call::Pass
}

fn record(
    adjustments: &mut Vec<Adjustment>,
    kind: AdjustmentKind,
    original: Call,
    call: Call,
    reason: String,
) {
    tracing::info!(
        target: "engine::decision",
        kind = ?kind,
        original = %original,
        call = %call,
        reason = %reason,
        "validation adjusted proposal"
    );
    adjustments.push(Adjustment {
        kind,
        original,
        call,
        reason,
    });
}
