//! The compiled, priority-sorted rule store

use crate::features::Phase;
use crate::kernel::ForcingLevel;
use crate::rules::{BidTemplate, Condition, Explanation};
use crate::schema::ModuleDef;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Authoring errors, all caught while the store is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleStoreError {
    #[error("{origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("could not read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("module '{0}' is defined twice")]
    DuplicateModule(String),
    #[error("rule id '{0}' is used twice")]
    DuplicateId(String),
    #[error("rules '{first}' and '{second}' share priority {priority} in phase {phase}")]
    PriorityCollision {
        first: String,
        second: String,
        priority: i32,
        phase: Phase,
    },
    #[error("rule '{id}' can never fire: {reason}")]
    Unreachable { id: String, reason: String },
    #[error("rule '{id}' names unknown feature '{name}'")]
    UnknownFeature { id: String, name: String },
    #[error("rule '{id}' has unknown placeholder '{{{name}}}' in its explanation")]
    UnknownPlaceholder { id: String, name: String },
    #[error("rule '{id}': {feature} is a {expected} feature, got {found}")]
    TypeMismatch {
        id: String,
        feature: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("rule '{id}' uses {feature} as a strain, but it is not a suit")]
    NonSuitStrain { id: String, feature: &'static str },
    #[error("rule '{id}' has an invalid level: {level}")]
    InvalidLevel { id: String, level: String },
    #[error("rule '{id}' bids '{text}', which is not a call")]
    InvalidCall { id: String, text: String },
    #[error("rule '{id}' serves {phase}, which module '{module}' does not")]
    PhaseOutsideModule {
        id: String,
        phase: Phase,
        module: String,
    },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub module: String,
    pub priority: i32,
    pub phases: Vec<Phase>,
    pub condition: Condition,
    pub bid: BidTemplate,
    pub explanation: Explanation,
    pub forcing: Option<ForcingLevel>,
}

impl Rule {
    pub fn serves(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    /// Fires whenever it is considered.
    fn is_catch_all(&self) -> bool {
        self.condition.is_always() && self.bid.is_pass()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleModule {
    pub name: String,
    pub phases: Vec<Phase>,
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    modules: Vec<RuleModule>,
    /// Sorted by descending priority
    rules: Vec<Rule>,
}

impl RuleStore {
    /// A store with no rules: every decision goes to the fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and compile `(origin, yaml)` pairs, one module per pair.
    pub fn from_modules<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, RuleStoreError> {
        let defs = sources
            .into_iter()
            .map(|(origin, text)| parse_module(origin, text))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_defs(defs)
    }

    /// The built-in SAYC modules.
    pub fn embedded() -> Result<Self, RuleStoreError> {
        Self::from_modules(super::SAYC_MODULES)
    }

    /// The built-in modules plus every `*.yaml` file in `dir`.
    pub fn embedded_with_dir(dir: &Path) -> Result<Self, RuleStoreError> {
        let mut defs = super::SAYC_MODULES
            .iter()
            .map(|(origin, text)| parse_module(origin, text))
            .collect::<Result<Vec<_>, _>>()?;
        defs.extend(read_dir(dir)?);
        Self::from_defs(defs)
    }

    /// Only the `*.yaml` modules in `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self, RuleStoreError> {
        Self::from_defs(read_dir(dir)?)
    }

    pub fn from_defs(defs: Vec<ModuleDef>) -> Result<Self, RuleStoreError> {
        let mut modules = Vec::new();
        let mut rules = Vec::new();
        let mut ids = HashSet::new();

        for def in defs {
            if modules.iter().any(|m: &RuleModule| m.name == def.module) {
                return Err(RuleStoreError::DuplicateModule(def.module));
            }
            for rule in &def.rules {
                if !ids.insert(rule.id.clone()) {
                    return Err(RuleStoreError::DuplicateId(rule.id.clone()));
                }
                let phases = if rule.phases.is_empty() {
                    def.phases.clone()
                } else {
                    rule.phases.clone()
                };
                if let Some(&phase) = phases.iter().find(|p| !def.phases.contains(p)) {
                    return Err(RuleStoreError::PhaseOutsideModule {
                        id: rule.id.clone(),
                        phase,
                        module: def.module.clone(),
                    });
                }
                let condition = Condition::compile_all(&rule.id, &rule.when)?;
                if let Some(reason) = condition.contradiction() {
                    return Err(RuleStoreError::Unreachable {
                        id: rule.id.clone(),
                        reason,
                    });
                }
                rules.push(Rule {
                    id: rule.id.clone(),
                    module: def.module.clone(),
                    priority: rule.priority,
                    phases,
                    condition,
                    bid: BidTemplate::compile(&rule.id, &rule.bid)?,
                    explanation: Explanation::compile(&rule.id, &rule.explain)?,
                    forcing: rule.forcing,
                });
            }
            modules.push(RuleModule {
                name: def.module,
                phases: def.phases,
            });
        }

        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        check_priorities(&rules)?;
        check_shadowing(&rules)?;
        Ok(Self { modules, rules })
    }

    /// Rules serving `phase`, highest priority first.
    pub fn candidates(&self, phase: Phase) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(move |rule| rule.serves(phase))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn modules(&self) -> &[RuleModule] {
        &self.modules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_module(origin: &str, text: &str) -> Result<ModuleDef, RuleStoreError> {
    serde_yaml::from_str(text).map_err(|e| RuleStoreError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

fn read_dir(dir: &Path) -> Result<Vec<ModuleDef>, RuleStoreError> {
    let io_error = |path: &Path, e: std::io::Error| RuleStoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
            parse_module(&path.display().to_string(), &text)
        })
        .collect()
}

fn check_priorities(rules: &[Rule]) -> Result<(), RuleStoreError> {
    let mut by_priority: BTreeMap<i32, Vec<&Rule>> = BTreeMap::new();
    for rule in rules {
        by_priority.entry(rule.priority).or_default().push(rule);
    }
    for (priority, group) in by_priority {
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                if let Some(&phase) = first.phases.iter().find(|p| second.serves(**p)) {
                    return Err(RuleStoreError::PriorityCollision {
                        first: first.id.clone(),
                        second: second.id.clone(),
                        priority,
                        phase,
                    });
                }
            }
        }
    }
    Ok(())
}

/// A rule is dead when, in every phase it serves, a higher-priority rule
/// passes unconditionally.
fn check_shadowing(rules: &[Rule]) -> Result<(), RuleStoreError> {
    for rule in rules {
        let shadows: Vec<&Rule> = rule
            .phases
            .iter()
            .filter_map(|&phase| {
                rules.iter().find(|other| {
                    other.priority > rule.priority && other.serves(phase) && other.is_catch_all()
                })
            })
            .collect();
        if !rule.phases.is_empty() && shadows.len() == rule.phases.len() {
            return Err(RuleStoreError::Unreachable {
                id: rule.id.clone(),
                reason: format!("shadowed by unconditional rule '{}'", shadows[0].id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENINGS: &str = "
module: openings
phases: [opening]
rules:
  - id: open_1nt
    priority: 180
    when:
      - {type: range, feature: hcp, min: 15, max: 17}
      - {type: eq, feature: is_balanced, value: true}
    bid: 1N
    explain: '{hcp} HCP, balanced'
  - id: pass_weak
    priority: 110
    when:
      - {type: range, feature: hcp, max: 11}
    bid: P
    explain: too weak to open
";

    #[test]
    fn test_embedded_store_loads() {
        let store = RuleStore::embedded().unwrap();
        assert!(store.len() > 50);
        assert_eq!(store.modules().len(), 7);
        let priorities: Vec<i32> = store.rules().iter().map(|r| r.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_store_sorted_and_scoped() {
        let store = RuleStore::from_modules([("openings.yaml", OPENINGS)]).unwrap();
        let ids: Vec<&str> = store.candidates(Phase::Opening).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["open_1nt", "pass_weak"]);
        assert_eq!(store.candidates(Phase::Response).count(), 0);
        assert_eq!(store.get("open_1nt").map(|r| r.module.as_str()), Some("openings"));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = RuleStore::from_modules([("broken.yaml", "module: [")]).unwrap_err();
        assert!(matches!(err, RuleStoreError::Parse { ref origin, .. } if origin == "broken.yaml"));
    }

    #[test]
    fn test_duplicate_ids_and_modules() {
        let err = RuleStore::from_modules([("a", OPENINGS), ("b", OPENINGS)]).unwrap_err();
        assert!(matches!(err, RuleStoreError::DuplicateModule(_)));

        let twice = "
module: m
phases: [opening]
rules:
  - {id: same, priority: 2, bid: P, explain: a, when: [{type: range, feature: hcp, max: 5}]}
  - {id: same, priority: 1, bid: P, explain: b, when: [{type: range, feature: hcp, max: 5}]}
";
        let err = RuleStore::from_modules([("m", twice)]).unwrap_err();
        assert_eq!(err, RuleStoreError::DuplicateId("same".into()));
    }

    #[test]
    fn test_priority_collision_within_phase() {
        let colliding = "
module: m
phases: [opening, response]
rules:
  - {id: a, priority: 5, bid: 1N, explain: a}
  - {id: b, priority: 5, bid: 2N, explain: b, phases: [response]}
";
        let err = RuleStore::from_modules([("m", colliding)]).unwrap_err();
        assert!(matches!(
            err,
            RuleStoreError::PriorityCollision { priority: 5, phase: Phase::Response, .. }
        ));

        let disjoint = "
module: m
phases: [opening, response]
rules:
  - {id: a, priority: 5, bid: 1N, explain: a, phases: [opening]}
  - {id: b, priority: 5, bid: 2N, explain: b, phases: [response]}
";
        assert!(RuleStore::from_modules([("m", disjoint)]).is_ok());
    }

    #[test]
    fn test_unreachable_rules() {
        let contradictory = "
module: m
phases: [opening]
rules:
  - id: never
    priority: 1
    when:
      - {type: range, feature: hcp, min: 20}
      - {type: range, feature: hcp, max: 10}
    bid: 1N
    explain: never
";
        let err = RuleStore::from_modules([("m", contradictory)]).unwrap_err();
        assert!(matches!(err, RuleStoreError::Unreachable { ref id, .. } if id == "never"));

        let shadowed = "
module: m
phases: [opening]
rules:
  - {id: always_pass, priority: 9, bid: P, explain: pass}
  - {id: hidden, priority: 1, bid: 1C, explain: club}
";
        let err = RuleStore::from_modules([("m", shadowed)]).unwrap_err();
        assert!(matches!(err, RuleStoreError::Unreachable { ref id, .. } if id == "hidden"));
    }

    #[test]
    fn test_rule_phase_outside_module() {
        let yaml = "
module: m
phases: [opening]
rules:
  - {id: a, priority: 1, bid: P, explain: a, phases: [advance]}
";
        let err = RuleStore::from_modules([("m", yaml)]).unwrap_err();
        assert!(matches!(err, RuleStoreError::PhaseOutsideModule { .. }));
    }

    #[test]
    fn test_empty_store() {
        let store = RuleStore::empty();
        assert!(store.is_empty());
        assert_eq!(store.candidates(Phase::Opening).count(), 0);
    }
}
