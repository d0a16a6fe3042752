//! First-match rule selection
//!
//! Candidates come from the store already sorted by descending priority,
//! and priorities are unique within a phase, so the first rule whose
//! conditions hold and whose bid resolves is the only possible answer.

use crate::features::FeatureSet;
use crate::rules::{Rule, RuleStore};
use crate::trace::{RuleOutcome, RuleStep};
use types::{Auction, Call};

/// A rule that fired, with its bid resolved against the auction.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub rule: &'a Rule,
    pub call: Call,
}

pub struct RuleMatcher;

impl RuleMatcher {
    pub fn find<'a>(
        store: &'a RuleStore,
        features: &FeatureSet,
        auction: &Auction,
    ) -> Option<Match<'a>> {
        Self::search(store, features, auction, |_| {})
    }

    /// Like `find`, recording every rule it looks at.
    pub fn find_with_trace<'a>(
        store: &'a RuleStore,
        features: &FeatureSet,
        auction: &Auction,
        steps: &mut Vec<RuleStep>,
    ) -> Option<Match<'a>> {
        Self::search(store, features, auction, |step| steps.push(step))
    }

    fn search<'a>(
        store: &'a RuleStore,
        features: &FeatureSet,
        auction: &Auction,
        mut record: impl FnMut(RuleStep),
    ) -> Option<Match<'a>> {
        let phase = features.phase();
        for rule in store.candidates(phase) {
            let (outcome, found) = if !rule.condition.eval(features) {
                (RuleOutcome::ConditionFalse, None)
            } else {
                match rule.bid.resolve(features, auction) {
                    Some(call) => (RuleOutcome::Matched { call }, Some(Match { rule, call })),
                    None => (RuleOutcome::TemplateUnresolved, None),
                }
            };
            record(RuleStep {
                rule: rule.id.clone(),
                module: rule.module.clone(),
                priority: rule.priority,
                outcome,
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::FeatureExtractor;
    use crate::kernel::AuctionState;
    use types::{Hand, Position, Vulnerability};

    const MODULE: &str = "
module: test
phases: [opening]
rules:
  - id: strong
    priority: 30
    when:
      - { type: range, feature: hcp, min: 20 }
    bid: '2C'
    explain: strong
  - id: balanced
    priority: 20
    when:
      - { type: eq, feature: is_balanced, value: true }
    bid: '1N'
    explain: balanced
  - id: anything
    priority: 10
    when:
      - { type: range, feature: hcp, min: 0 }
    bid: '1C'
    explain: anything
";

    fn features(pbn: &str) -> (FeatureSet, Auction) {
        let hand = Hand::from_pbn(pbn).unwrap();
        let auction = Auction::new(Position::North);
        let state = AuctionState::from_auction(&auction, Vulnerability::None).unwrap();
        (FeatureExtractor::extract(&hand, &state, Position::North), auction)
    }

    #[test]
    fn test_higher_priority_wins() {
        let store = RuleStore::from_modules([("test.yaml", MODULE)]).unwrap();
        // Balanced and 23 HCP: both `strong` and `balanced` hold.
        let (features, auction) = features("AK32.AK2.AQ2.K32");
        let found = RuleMatcher::find(&store, &features, &auction).unwrap();
        assert_eq!(found.rule.id, "strong");
        assert_eq!(found.call, "2C".parse().unwrap());
    }

    #[test]
    fn test_trace_stops_at_match() {
        let store = RuleStore::from_modules([("test.yaml", MODULE)]).unwrap();
        let (features, auction) = features("K32.Q32.J432.432");
        let mut steps = Vec::new();
        let found = RuleMatcher::find_with_trace(&store, &features, &auction, &mut steps).unwrap();
        assert_eq!(found.rule.id, "balanced");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].outcome, RuleOutcome::ConditionFalse);
        assert_eq!(
            steps[1].outcome,
            RuleOutcome::Matched {
                call: "1N".parse().unwrap()
            }
        );
    }

    #[test]
    fn test_unresolved_template_falls_through() {
        let module = "
module: test
phases: [response]
rules:
  - id: raise
    priority: 20
    when:
      - { type: range, feature: hcp, min: 0 }
    bid: { level: cheapest, strain: partner_suit }
    explain: raise
  - id: fallback_pass
    priority: 10
    when:
      - { type: range, feature: hcp, min: 0 }
    bid: P
    explain: pass
";
        let store = RuleStore::from_modules([("test.yaml", module)]).unwrap();
        let hand = Hand::from_pbn("K32.Q32.J432.432").unwrap();
        // Partner opened 1N, so there is no partner suit to raise.
        let auction = Auction::parse(Position::North, "1N P").unwrap();
        let state = AuctionState::from_auction(&auction, Vulnerability::None).unwrap();
        let features = FeatureExtractor::extract(&hand, &state, Position::South);
        let mut steps = Vec::new();
        let found = RuleMatcher::find_with_trace(&store, &features, &auction, &mut steps).unwrap();
        assert_eq!(found.rule.id, "fallback_pass");
        assert_eq!(steps[0].outcome, RuleOutcome::TemplateUnresolved);
    }

    #[test]
    fn test_no_candidates_is_none() {
        let store = RuleStore::empty();
        let (features, auction) = features("K32.Q32.J432.432");
        assert!(RuleMatcher::find(&store, &features, &auction).is_none());
    }
}
