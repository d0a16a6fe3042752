//! What the table knows about one seat's hand

use crate::kernel::HandConstraint;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::{Shape, Suit};

/// Inferred profile of a seat's hand, narrowed by every call it makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandModel {
    /// Minimum length shown in each suit, indexed by `Suit::idx()`
    min_lengths: [u8; 4],
    /// Maximum length allowed in each suit, indexed by `Suit::idx()`
    max_lengths: [u8; 4],
    /// Minimum HCP shown, if any
    pub min_hcp: Option<u8>,
    /// Maximum HCP shown, if any
    pub max_hcp: Option<u8>,
    /// Maximum unbalancedness allowed (max shape)
    pub max_shape: Option<Shape>,
}

impl Default for HandModel {
    fn default() -> Self {
        Self {
            min_lengths: [0; 4],
            max_lengths: [13; 4],
            min_hcp: None,
            max_hcp: None,
            max_shape: None,
        }
    }
}

impl HandModel {
    pub fn apply_constraint(&mut self, constraint: HandConstraint) {
        match constraint {
            HandConstraint::MinHcp(hcp) => self.min_hcp = Some(update_min(self.min_hcp, hcp)),
            HandConstraint::MaxHcp(hcp) => self.max_hcp = Some(update_max(self.max_hcp, hcp)),
            HandConstraint::MinLength(suit, len) => {
                let slot = &mut self.min_lengths[suit.idx()];
                *slot = (*slot).max(len);
            }
            HandConstraint::MaxLength(suit, len) => {
                let slot = &mut self.max_lengths[suit.idx()];
                *slot = (*slot).min(len);
            }
            HandConstraint::MaxUnbalancedness(shape) => {
                self.max_shape = Some(self.max_shape.map_or(shape, |s| s.min(shape)));
            }
            // Stoppers are a promise about honors, not about shape or strength.
            HandConstraint::StopperIn(_) => {}
        }
        // A later, narrower call wins over an earlier, looser one.
        if let (Some(min), Some(max)) = (self.min_hcp, self.max_hcp) {
            if min > max {
                self.max_hcp = Some(min);
            }
        }
    }

    pub fn min_length(&self, suit: Suit) -> u8 {
        self.min_lengths[suit.idx()]
    }

    pub fn max_length(&self, suit: Suit) -> u8 {
        self.max_lengths[suit.idx()]
    }

    /// Point estimate of the seat's HCP: the midpoint of a known range, a
    /// little above a bare minimum, two thirds of a bare maximum.
    pub fn estimate_hcp(&self) -> Option<u8> {
        match (self.min_hcp, self.max_hcp) {
            (Some(min), Some(max)) => Some((min + max) / 2),
            (Some(min), None) => Some((min + 3).min(37)),
            (None, Some(max)) => Some(max * 2 / 3),
            (None, None) => None,
        }
    }
}

impl fmt::Display for HandModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        let hcp_str = match (self.min_hcp, self.max_hcp) {
            (None, None) => "? hcp".to_string(),
            (Some(min), None) => format!("{}+ hcp", min),
            (None, Some(max)) => format!("0-{} hcp", max),
            (Some(min), Some(max)) if min == max => format!("{} hcp", min),
            (Some(min), Some(max)) => format!("{}-{} hcp", min, max),
        };
        parts.push(hcp_str);

        let suit_str = Suit::PBN_ORDER
            .iter()
            .filter_map(|&suit| {
                let symbol = suit.symbol();
                match (self.min_length(suit), self.max_length(suit)) {
                    (0, 13) => None,
                    (m, 13) => Some(format!("{}+{}", m, symbol)),
                    (0, m) => Some(format!("0-{}{}", m, symbol)),
                    (min, max) if min == max => Some(format!("{}{}", min, symbol)),
                    (min, max) => Some(format!("{}-{}{}", min, max, symbol)),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        if !suit_str.is_empty() {
            parts.push(suit_str);
        }
        if let Some(shape) = self.max_shape {
            parts.push(shape.name().to_string());
        }

        write!(f, "{}", parts.join(", "))
    }
}

/// Update minimum value, taking the maximum of current and new
fn update_min(current: Option<u8>, new: u8) -> u8 {
    current.map(|c| c.max(new)).unwrap_or(new)
}

/// Update maximum value, taking the minimum of current and new
fn update_max(current: Option<u8>, new: u8) -> u8 {
    current.map(|c| c.min(new)).unwrap_or(new)
}
