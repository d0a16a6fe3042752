use crate::strain::Strain;
use crate::suit::Suit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One entry of an auction. Contract bids order by (level, strain); the
/// derived ordering also puts every bid after Pass, Double and Redouble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Call {
    Pass,
    Double,
    Redouble,
    Bid { level: u8, strain: Strain },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse call '{0}'")]
pub struct ParseCallError(pub String);

impl Call {
    pub fn bid(level: u8, strain: Strain) -> Self {
        Call::Bid { level, strain }
    }

    pub fn is_bid(&self) -> bool {
        matches!(self, Call::Bid { .. })
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Call::Pass)
    }

    /// Returns the level of this call, if it's a bid.
    pub fn level(&self) -> Option<u8> {
        match self {
            Call::Bid { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Returns the strain of this call, if it's a bid.
    pub fn strain(&self) -> Option<Strain> {
        match self {
            Call::Bid { strain, .. } => Some(*strain),
            _ => None,
        }
    }

    /// Returns the suit of this call, if it's a suited bid.
    pub fn suit(&self) -> Option<Suit> {
        self.strain().and_then(|s| s.to_suit())
    }

    /// Whether this bid reaches game in its strain.
    pub fn is_game_or_higher(&self) -> bool {
        match self {
            Call::Bid { level, strain } => *level >= strain.game_level(),
            _ => false,
        }
    }

    /// The same strain one level lower, if there is one.
    pub fn one_level_lower(&self) -> Option<Call> {
        match self {
            Call::Bid { level, strain } if *level > 1 => Some(Call::bid(level - 1, *strain)),
            _ => None,
        }
    }

    pub fn render(self) -> String {
        match self {
            Call::Pass => "P".to_string(),
            Call::Double => "X".to_string(),
            Call::Redouble => "XX".to_string(),
            Call::Bid { level, strain } => format!("{}{}", level, strain.to_char()),
        }
    }
}

impl FromStr for Call {
    type Err = ParseCallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "P" | "PASS" => return Ok(Call::Pass),
            "X" | "DBL" | "DOUBLE" => return Ok(Call::Double),
            "XX" | "RDBL" | "REDOUBLE" => return Ok(Call::Redouble),
            _ => {}
        }
        let err = || ParseCallError(s.to_string());
        let mut chars = upper.chars();
        let level = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(err)? as u8;
        if !(1..=7).contains(&level) {
            return Err(err());
        }
        let strain: Strain = chars.as_str().parse().map_err(|_| err())?;
        Ok(Call::Bid { level, strain })
    }
}

impl TryFrom<String> for Call {
    type Error = ParseCallError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Call> for String {
    fn from(call: Call) -> Self {
        call.render()
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
