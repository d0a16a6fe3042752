//! YAML shape of a rule module, as authored. `rules::store` compiles these
//! records into typed rules and rejects the ones that cannot work.

use crate::features::Phase;
use crate::kernel::ForcingLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleDef {
    pub module: String,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub id: String,
    pub priority: i32,
    /// Narrows the module's phases for this rule
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Conditions that must all hold; empty means always
    #[serde(default)]
    pub when: Vec<ConditionDef>,
    pub bid: BidDef,
    pub explain: String,
    #[serde(default)]
    pub forcing: Option<ForcingLevel>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDef {
    Always,
    Eq {
        feature: String,
        value: Literal,
    },
    Ne {
        feature: String,
        value: Literal,
    },
    Range {
        feature: String,
        #[serde(default)]
        min: Option<i32>,
        #[serde(default)]
        max: Option<i32>,
    },
    OneOf {
        feature: String,
        values: Vec<Literal>,
    },
    All {
        of: Vec<ConditionDef>,
    },
    Any {
        of: Vec<ConditionDef>,
    },
}

/// A comparison value before it is checked against the feature's kind.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Flag(b) => write!(f, "{}", b),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

/// `"1N"`, or a level and strain resolved at decision time.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum BidDef {
    Call(String),
    Pattern {
        level: LevelDef,
        strain: String,
        #[serde(default)]
        max_level: Option<u8>,
    },
}

/// `1`..`7`, `cheapest`, `jump` or `game`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum LevelDef {
    Fixed(i64),
    Named(String),
}
