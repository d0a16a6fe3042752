//! What a decision hands back to the caller

use crate::features::Phase;
use crate::kernel::ForcingLevel;
use serde::Serialize;
use std::fmt;
use types::Call;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Where the proposed call came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionSource {
    Rule { id: String, module: String },
    Fallback,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionSource::Rule { id, module } => write!(f, "{}/{}", module, id),
            DecisionSource::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Illegal,
    Slam,
    Strength,
    Forcing,
}

/// One change, or one reservation, the validation layer recorded.
///
/// `call == original` means the proposal was kept with lowered confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub original: Call,
    pub call: Call,
    pub reason: String,
}

impl Adjustment {
    pub fn changed_call(&self) -> bool {
        self.original != self.call
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionResult {
    pub call: Call,
    pub explanation: String,
    pub source: DecisionSource,
    pub adjustments: Vec<Adjustment>,
    pub confidence: Confidence,
    /// Forcing side effect declared by the rule that chose the call. `None`
    /// for fallback calls and for calls validation replaced.
    pub forcing: Option<ForcingLevel>,
    pub phase: Phase,
}

impl DecisionResult {
    pub fn was_adjusted(&self) -> bool {
        self.adjustments.iter().any(Adjustment::changed_call)
    }
}

impl fmt::Display for DecisionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {:?} confidence): {}",
            self.call.render(),
            self.source,
            self.confidence,
            self.explanation
        )
    }
}
