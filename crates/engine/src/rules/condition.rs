//! Compiled rule conditions

use crate::features::{Feature, FeatureKind, FeatureSet, Phase, Value};
use crate::kernel::ForcingLevel;
use crate::rules::RuleStoreError;
use crate::schema::{ConditionDef, Literal};
use std::collections::BTreeMap;
use std::fmt;
use types::{Call, Shape, Suit};

/// A condition tree over named features. Evaluation short-circuits and
/// cannot fail: every feature and literal was checked at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    Eq(Feature, Value),
    Ne(Feature, Value),
    Range {
        feature: Feature,
        min: Option<i32>,
        max: Option<i32>,
    },
    OneOf(Feature, Vec<Value>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn eval(&self, features: &FeatureSet) -> bool {
        match self {
            Condition::Always => true,
            Condition::Eq(feature, value) => features.get(*feature) == *value,
            Condition::Ne(feature, value) => features.get(*feature) != *value,
            Condition::Range { feature, min, max } => {
                let n = features.number(*feature);
                min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
            }
            Condition::OneOf(feature, values) => values.contains(&features.get(*feature)),
            Condition::All(conditions) => conditions.iter().all(|c| c.eval(features)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.eval(features)),
        }
    }

    pub fn is_always(&self) -> bool {
        match self {
            Condition::Always => true,
            Condition::All(conditions) => conditions.iter().all(Condition::is_always),
            _ => false,
        }
    }

    /// Build the condition for a rule's `when` list.
    pub fn compile_all(rule: &str, defs: &[ConditionDef]) -> Result<Self, RuleStoreError> {
        let mut conditions = defs
            .iter()
            .map(|def| Self::compile(rule, def))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match conditions.len() {
            0 => Condition::Always,
            1 => conditions.remove(0),
            _ => Condition::All(conditions),
        })
    }

    pub fn compile(rule: &str, def: &ConditionDef) -> Result<Self, RuleStoreError> {
        Ok(match def {
            ConditionDef::Always => Condition::Always,
            ConditionDef::Eq { feature, value } => {
                let feature = lookup(rule, feature)?;
                Condition::Eq(feature, literal_value(rule, feature, value)?)
            }
            ConditionDef::Ne { feature, value } => {
                let feature = lookup(rule, feature)?;
                Condition::Ne(feature, literal_value(rule, feature, value)?)
            }
            ConditionDef::Range { feature, min, max } => {
                let feature = lookup(rule, feature)?;
                if feature.kind() != FeatureKind::Number {
                    return Err(RuleStoreError::TypeMismatch {
                        id: rule.to_string(),
                        feature: feature.name(),
                        expected: feature.kind().name(),
                        found: "a numeric range".to_string(),
                    });
                }
                Condition::Range {
                    feature,
                    min: *min,
                    max: *max,
                }
            }
            ConditionDef::OneOf { feature, values } => {
                let feature = lookup(rule, feature)?;
                let values = values
                    .iter()
                    .map(|v| literal_value(rule, feature, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::OneOf(feature, values)
            }
            ConditionDef::All { of } => Condition::All(
                of.iter()
                    .map(|c| Self::compile(rule, c))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionDef::Any { of } => Condition::Any(
                of.iter()
                    .map(|c| Self::compile(rule, c))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Why no feature set can satisfy this condition, if that is the case.
    pub fn contradiction(&self) -> Option<String> {
        match self {
            Condition::Always | Condition::Eq(..) | Condition::Ne(..) => None,
            Condition::Range { feature, min, max } => match (min, max) {
                (Some(min), Some(max)) if min > max => {
                    Some(format!("range {}..={} on {} is empty", min, max, feature))
                }
                _ => None,
            },
            Condition::OneOf(feature, values) if values.is_empty() => {
                Some(format!("one_of on {} lists no values", feature))
            }
            Condition::OneOf(..) => None,
            Condition::Any(conditions) if conditions.is_empty() => {
                Some("any has no alternatives".to_string())
            }
            Condition::Any(conditions) => {
                let reasons: Vec<String> =
                    conditions.iter().filter_map(Condition::contradiction).collect();
                (reasons.len() == conditions.len()).then(|| reasons.join("; "))
            }
            Condition::All(conditions) => all_contradiction(conditions),
        }
    }
}

fn flatten<'a>(conditions: &'a [Condition], leaves: &mut Vec<&'a Condition>) {
    for condition in conditions {
        match condition {
            Condition::All(inner) => flatten(inner, leaves),
            other => leaves.push(other),
        }
    }
}

fn all_contradiction(conditions: &[Condition]) -> Option<String> {
    let mut leaves = Vec::new();
    flatten(conditions, &mut leaves);
    if let Some(reason) = leaves.iter().find_map(|c| c.contradiction()) {
        return Some(reason);
    }

    let mut by_feature: BTreeMap<Feature, Vec<&Condition>> = BTreeMap::new();
    for leaf in leaves {
        let feature = match leaf {
            Condition::Eq(f, _) | Condition::Ne(f, _) | Condition::OneOf(f, _) => *f,
            Condition::Range { feature, .. } => *feature,
            _ => continue,
        };
        by_feature.entry(feature).or_default().push(leaf);
    }

    by_feature.into_iter().find_map(|(feature, leaves)| {
        feature_is_contradictory(&leaves)
            .then(|| format!("conditions on {} contradict each other", feature))
    })
}

fn feature_is_contradictory(leaves: &[&Condition]) -> bool {
    let mut allowed: Option<Vec<Value>> = None;
    let mut excluded = Vec::new();
    let (mut lo, mut hi) = (i32::MIN, i32::MAX);
    for leaf in leaves {
        match leaf {
            Condition::Eq(_, value) => restrict(&mut allowed, std::slice::from_ref(value)),
            Condition::OneOf(_, values) => restrict(&mut allowed, values),
            Condition::Ne(_, value) => excluded.push(*value),
            Condition::Range { min, max, .. } => {
                lo = lo.max(min.unwrap_or(i32::MIN));
                hi = hi.min(max.unwrap_or(i32::MAX));
            }
            _ => {}
        }
    }
    if lo > hi {
        return true;
    }
    match allowed {
        Some(values) => !values.iter().any(|value| {
            !excluded.contains(value)
                && value.as_number().map_or(true, |n| n >= lo && n <= hi)
        }),
        None => lo == hi && excluded.contains(&Value::Number(lo)),
    }
}

fn restrict(allowed: &mut Option<Vec<Value>>, values: &[Value]) {
    *allowed = Some(match allowed.take() {
        None => values.to_vec(),
        Some(current) => current.into_iter().filter(|v| values.contains(v)).collect(),
    });
}

fn lookup(rule: &str, name: &str) -> Result<Feature, RuleStoreError> {
    Feature::from_name(name).ok_or_else(|| RuleStoreError::UnknownFeature {
        id: rule.to_string(),
        name: name.to_string(),
    })
}

/// Check a YAML literal against the kind of the feature it is compared with.
pub fn literal_value(rule: &str, feature: Feature, literal: &Literal) -> Result<Value, RuleStoreError> {
    let value = match (feature.kind(), literal) {
        (FeatureKind::Number, Literal::Number(n)) => i32::try_from(*n).ok().map(Value::Number),
        (FeatureKind::Flag, Literal::Flag(b)) => Some(Value::Flag(*b)),
        (FeatureKind::Suit, Literal::Text(text)) if text == "none" => Some(Value::Suit(None)),
        (FeatureKind::Suit, Literal::Text(text)) => {
            text.parse::<Suit>().ok().map(|s| Value::Suit(Some(s)))
        }
        (FeatureKind::Call, Literal::Text(text)) if text == "none" => Some(Value::Call(None)),
        (FeatureKind::Call, Literal::Text(text)) => {
            text.parse::<Call>().ok().map(|c| Value::Call(Some(c)))
        }
        (FeatureKind::Phase, Literal::Text(text)) => Phase::from_name(text).map(Value::Phase),
        (FeatureKind::Forcing, Literal::Text(text)) => {
            ForcingLevel::from_name(text).map(Value::Forcing)
        }
        (FeatureKind::Shape, Literal::Text(text)) => match text.as_str() {
            "balanced" => Some(Value::Shape(Shape::Balanced)),
            "semi_balanced" => Some(Value::Shape(Shape::SemiBalanced)),
            "unbalanced" => Some(Value::Shape(Shape::Unbalanced)),
            _ => None,
        },
        _ => None,
    };
    value.ok_or_else(|| RuleStoreError::TypeMismatch {
        id: rule.to_string(),
        feature: feature.name(),
        expected: feature.kind().name(),
        found: literal.to_string(),
    })
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => f.write_str("always"),
            Condition::Eq(feature, value) => write!(f, "{} = {}", feature, value),
            Condition::Ne(feature, value) => write!(f, "{} != {}", feature, value),
            Condition::Range { feature, min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "{} in {}..={}", feature, min, max),
                (Some(min), None) => write!(f, "{} >= {}", feature, min),
                (None, Some(max)) => write!(f, "{} <= {}", feature, max),
                (None, None) => write!(f, "{} is any number", feature),
            },
            Condition::OneOf(feature, values) => {
                let values: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "{} in [{}]", feature, values.join(", "))
            }
            Condition::All(conditions) => join(f, conditions, " and "),
            Condition::Any(conditions) => join(f, conditions, " or "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    let parts: Vec<String> = conditions
        .iter()
        .map(|c| match c {
            Condition::All(_) | Condition::Any(_) => format!("({})", c),
            _ => c.to_string(),
        })
        .collect();
    f.write_str(&parts.join(sep))
}
