//! Step-by-step record of one decision
use crate::features::{FeatureSet, Phase};
use crate::kernel::ForcingLevel;
use crate::result::{Adjustment, DecisionResult};
use serde::Serialize;
use types::Call;

/// A detailed trace of the decision process
#[derive(Debug, Clone, Serialize)]
pub struct DecisionTrace {
    pub phase: Phase,
    /// Every feature the rules saw
    pub features: FeatureSet,
    /// Rules in the order they were tried, up to and including the match
    pub rules: Vec<RuleStep>,
    /// The heuristic's call, when it was consulted
    pub fallback: Option<Call>,
    /// The call handed to validation
    pub proposed: Call,
    /// Forcing status the matched rule declared, if any
    pub declared_forcing: Option<ForcingLevel>,
    pub validation: Vec<Adjustment>,
    pub result: DecisionResult,
}

/// A single rule the matcher looked at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStep {
    pub rule: String,
    pub module: String,
    pub priority: i32,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    ConditionFalse,
    /// Conditions held, but the bid did not exist or was not legal here
    TemplateUnresolved,
    Matched { call: Call },
}

impl DecisionTrace {
    pub fn matched_rule(&self) -> Option<&RuleStep> {
        self.rules
            .iter()
            .find(|step| matches!(step.outcome, RuleOutcome::Matched { .. }))
    }
}
