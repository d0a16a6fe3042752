//! Bid and explanation templates

use crate::features::{Feature, FeatureKind, FeatureSet};
use crate::rules::RuleStoreError;
use crate::schema::{BidDef, LevelDef};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use types::{Auction, Call, Strain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Fixed(u8),
    /// The lowest legal level in the strain
    Cheapest,
    /// One above the lowest legal level
    Jump,
    /// Game in the strain, if the auction is not already past it
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrainSpec {
    Literal(Strain),
    Feature(Feature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidTemplate {
    Literal(Call),
    Pattern {
        level: Level,
        strain: StrainSpec,
        max_level: Option<u8>,
    },
}

impl BidTemplate {
    pub fn compile(rule: &str, def: &BidDef) -> Result<Self, RuleStoreError> {
        match def {
            BidDef::Call(text) => text
                .parse::<Call>()
                .map(BidTemplate::Literal)
                .map_err(|_| RuleStoreError::InvalidCall {
                    id: rule.to_string(),
                    text: text.clone(),
                }),
            BidDef::Pattern {
                level,
                strain,
                max_level,
            } => {
                let invalid_level = |text: String| RuleStoreError::InvalidLevel {
                    id: rule.to_string(),
                    level: text,
                };
                let level = match level {
                    LevelDef::Fixed(n @ 1..=7) => Level::Fixed(*n as u8),
                    LevelDef::Fixed(n) => return Err(invalid_level(n.to_string())),
                    LevelDef::Named(name) => match name.as_str() {
                        "cheapest" => Level::Cheapest,
                        "jump" => Level::Jump,
                        "game" => Level::Game,
                        _ => return Err(invalid_level(name.clone())),
                    },
                };
                if let Some(max) = max_level {
                    if !(1..=7).contains(max) {
                        return Err(invalid_level(format!("max_level {}", max)));
                    }
                }
                Ok(BidTemplate::Pattern {
                    level,
                    strain: compile_strain(rule, strain)?,
                    max_level: *max_level,
                })
            }
        }
    }

    /// The concrete call, or `None` when the template does not apply to
    /// this auction: an absent suit, an illegal call, or a level out of
    /// bounds.
    pub fn resolve(&self, features: &FeatureSet, auction: &Auction) -> Option<Call> {
        let call = match *self {
            BidTemplate::Literal(call) => call,
            BidTemplate::Pattern {
                level,
                strain,
                max_level,
            } => {
                let strain = match strain {
                    StrainSpec::Literal(strain) => strain,
                    StrainSpec::Feature(feature) => Strain::from_suit(features.suit(feature)?),
                };
                let cheapest = auction.minimum_bid_in(strain)?.level()?;
                let level = match level {
                    Level::Fixed(n) => n,
                    Level::Cheapest => cheapest,
                    Level::Jump => cheapest + 1,
                    Level::Game if cheapest > strain.game_level() => return None,
                    Level::Game => strain.game_level(),
                };
                if level > 7 || max_level.is_some_and(|max| level > max) {
                    return None;
                }
                Call::bid(level, strain)
            }
        };
        auction.is_legal(call).then_some(call)
    }

    /// A literal Pass: always resolves.
    pub fn is_pass(&self) -> bool {
        matches!(self, BidTemplate::Literal(Call::Pass))
    }
}

fn compile_strain(rule: &str, text: &str) -> Result<StrainSpec, RuleStoreError> {
    if let Ok(strain) = text.parse::<Strain>() {
        return Ok(StrainSpec::Literal(strain));
    }
    match Feature::from_name(text) {
        Some(feature) if feature.kind() == FeatureKind::Suit => Ok(StrainSpec::Feature(feature)),
        Some(feature) => Err(RuleStoreError::NonSuitStrain {
            id: rule.to_string(),
            feature: feature.name(),
        }),
        None => Err(RuleStoreError::UnknownFeature {
            id: rule.to_string(),
            name: text.to_string(),
        }),
    }
}

impl fmt::Display for BidTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidTemplate::Literal(call) => write!(f, "{}", call),
            BidTemplate::Pattern {
                level,
                strain,
                max_level,
            } => {
                let level = match level {
                    Level::Fixed(n) => n.to_string(),
                    Level::Cheapest => "cheapest".to_string(),
                    Level::Jump => "jump".to_string(),
                    Level::Game => "game".to_string(),
                };
                let strain = match strain {
                    StrainSpec::Literal(strain) => strain.name().to_string(),
                    StrainSpec::Feature(feature) => feature.name().to_string(),
                };
                write!(f, "{} {}", level, strain)?;
                if let Some(max) = max_level {
                    write!(f, " (at most {})", max)?;
                }
                Ok(())
            }
        }
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Feature(Feature),
    Call,
}

/// Explanation text with `{feature}` and `{call}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    segments: Vec<Segment>,
}

impl Explanation {
    pub fn compile(rule: &str, text: &str) -> Result<Self, RuleStoreError> {
        let mut segments = Vec::new();
        let mut rest = 0;
        for captures in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > rest {
                segments.push(Segment::Text(text[rest..whole.start()].to_string()));
            }
            let segment = match name.as_str() {
                "call" => Segment::Call,
                other => Segment::Feature(Feature::from_name(other).ok_or_else(|| {
                    RuleStoreError::UnknownPlaceholder {
                        id: rule.to_string(),
                        name: other.to_string(),
                    }
                })?),
            };
            segments.push(segment);
            rest = whole.end();
        }
        if rest < text.len() {
            segments.push(Segment::Text(text[rest..].to_string()));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, features: &FeatureSet, call: Call) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Feature(feature) => out.push_str(&features.get(*feature).to_string()),
                Segment::Call => out.push_str(&call.render()),
            }
        }
        out
    }
}
