use engine::{BidRequest, DecisionSource, Engine};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use types::{Call, Position, Vulnerability};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    hand: String,
    #[serde(default)]
    calls: String,
    #[serde(default = "default_dealer")]
    dealer: String,
    #[serde(default = "default_vul")]
    vul: String,
    expect: Option<Call>,
    #[serde(default)]
    one_of: Vec<Call>,
    #[serde(default)]
    never: Vec<Call>,
    rule: Option<String>,
}

fn default_dealer() -> String {
    "N".to_string()
}

fn default_vul() -> String {
    "none".to_string()
}

impl Scenario {
    fn label(&self) -> String {
        if self.calls.is_empty() {
            format!("{} opening", self.hand)
        } else {
            format!("{} after '{}'", self.hand, self.calls)
        }
    }

    /// Every mismatch between what the engine did and what was expected.
    fn check(&self, engine: &Engine) -> Vec<String> {
        let dealer: Position = match self.dealer.parse() {
            Ok(dealer) => dealer,
            Err(()) => return vec![format!("bad dealer '{}'", self.dealer)],
        };
        let vul: Vulnerability = match self.vul.parse() {
            Ok(vul) => vul,
            Err(()) => return vec![format!("bad vulnerability '{}'", self.vul)],
        };
        let request = match BidRequest::parse(&self.hand, dealer, &self.calls, vul) {
            Ok(request) => request,
            Err(e) => return vec![format!("bad scenario: {}", e)],
        };
        let result = match engine.decide(&request) {
            Ok(result) => result,
            Err(e) => return vec![format!("engine error: {}", e)],
        };

        let mut problems = Vec::new();
        if let Some(expected) = self.expect {
            if result.call != expected {
                problems.push(format!("expected {}, got {}", expected, result));
            }
        }
        if !self.one_of.is_empty() && !self.one_of.contains(&result.call) {
            let allowed: Vec<String> = self.one_of.iter().map(|call| call.render()).collect();
            problems.push(format!(
                "expected one of [{}], got {}",
                allowed.join(", "),
                result
            ));
        }
        if self.never.contains(&result.call) {
            problems.push(format!("{} is never right here", result));
        }
        if let Some(rule) = &self.rule {
            match &result.source {
                DecisionSource::Rule { id, .. } if id == rule => {}
                other => problems.push(format!("expected rule {}, got {}", rule, other)),
            }
        }
        problems
    }
}

#[test]
fn run_sayc_scenarios() {
    let path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/bidding/sayc_scenarios.yaml");
    let content = fs::read_to_string(&path).expect("Failed to read scenarios");
    let suites: IndexMap<String, Vec<Scenario>> =
        serde_yaml::from_str(&content).expect("Failed to parse scenarios");
    let engine = Engine::sayc().expect("built-in rules load");

    let mut total = 0;
    let mut failures = Vec::new();
    for (suite, scenarios) in &suites {
        for scenario in scenarios {
            total += 1;
            for problem in scenario.check(&engine) {
                failures.push(format!("[{}] {}: {}", suite, scenario.label(), problem));
            }
        }
    }

    assert!(total > 0, "no scenarios found in {}", path.display());
    if !failures.is_empty() {
        panic!(
            "{} scenario failure(s) out of {}:\n{}",
            failures.len(),
            total,
            failures.join("\n")
        );
    }
}
