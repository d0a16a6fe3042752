//! The two bidders a decision can start from
//!
//! Both hand back a `Proposal`; the validation layer sits behind either.

use crate::fallback::FallbackBidder;
use crate::features::FeatureSet;
use crate::kernel::ForcingLevel;
use crate::matcher::RuleMatcher;
use crate::result::DecisionSource;
use crate::rules::RuleStore;
use crate::trace::RuleStep;
use std::sync::Arc;
use types::{Auction, Call};

/// A call before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub call: Call,
    pub explanation: String,
    pub source: DecisionSource,
    /// Forcing status the matched rule declares
    pub forcing: Option<ForcingLevel>,
    /// Set when the heuristic was consulted
    pub fallback: Option<Call>,
}

impl Proposal {
    fn from_fallback(features: &FeatureSet, auction: &Auction) -> Self {
        let fallback = FallbackBidder::propose(features, auction);
        tracing::info!(
            target: "engine::decision",
            phase = %features.phase(),
            call = %fallback.call,
            "no rule matched, using fallback"
        );
        Self {
            call: fallback.call,
            explanation: fallback.explanation,
            source: DecisionSource::Fallback,
            forcing: None,
            fallback: Some(fallback.call),
        }
    }
}

pub trait Bidder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose a call; when `steps` is given, every rule considered is
    /// recorded there.
    fn propose(
        &self,
        features: &FeatureSet,
        auction: &Auction,
        steps: Option<&mut Vec<RuleStep>>,
    ) -> Proposal;
}

/// Rule store first, heuristic when no rule matches.
pub struct SchemaBidder {
    store: Arc<RuleStore>,
}

impl SchemaBidder {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

impl Bidder for SchemaBidder {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn propose(
        &self,
        features: &FeatureSet,
        auction: &Auction,
        steps: Option<&mut Vec<RuleStep>>,
    ) -> Proposal {
        let found = match steps {
            Some(steps) => RuleMatcher::find_with_trace(&self.store, features, auction, steps),
            None => RuleMatcher::find(&self.store, features, auction),
        };
        let Some(found) = found else {
            return Proposal::from_fallback(features, auction);
        };
        tracing::debug!(
            target: "engine::decision",
            rule = %found.rule.id,
            phase = %features.phase(),
            call = %found.call,
            "rule matched"
        );
        Proposal {
            call: found.call,
            explanation: found.rule.explanation.render(features, found.call),
            source: DecisionSource::Rule {
                id: found.rule.id.clone(),
                module: found.rule.module.clone(),
            },
            forcing: found.rule.forcing,
            fallback: None,
        }
    }
}

/// The point-count heuristic on its own, for comparison runs.
pub struct ReferenceBidder;

impl Bidder for ReferenceBidder {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn propose(
        &self,
        features: &FeatureSet,
        auction: &Auction,
        _steps: Option<&mut Vec<RuleStep>>,
    ) -> Proposal {
        Proposal::from_fallback(features, auction)
    }
}
