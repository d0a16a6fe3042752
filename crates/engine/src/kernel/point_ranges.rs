//! Combined-strength tables for contract levels

use types::{Call, Strain};

/// Point requirements a partnership should hold before contracting for a
/// given number of tricks.
pub struct PointRanges;

impl PointRanges {
    pub const GAME_THRESHOLD: u8 = 25;
    pub const SLAM_THRESHOLD: u8 = 33;
    pub const GRAND_SLAM_THRESHOLD: u8 = 37;

    /// Minimum combined points for a suited contract at `level`.
    ///
    /// - Level 1: 16 points
    /// - Level 2: 19 points
    /// - Level 3: 22 points
    /// - Level 4: 25 points
    /// - Level 5: 28 points
    /// - Level 6: 33 points
    /// - Level 7: 37 points
    pub fn min_points_for_suited_bid(level: u8) -> u8 {
        match level {
            1 => 16,
            2 => 19,
            3 => 22,
            4 => 25,
            5 => 28,
            6 => Self::SLAM_THRESHOLD,
            7 => Self::GRAND_SLAM_THRESHOLD,
            _ => 40,
        }
    }

    /// Minimum combined points for a notrump contract at `level`.
    pub fn min_points_for_nt_bid(level: u8) -> u8 {
        match level {
            1 => 19,
            2 => 22,
            3 => 25,
            4 => 28,
            5 => 30,
            6 => Self::SLAM_THRESHOLD,
            7 => Self::GRAND_SLAM_THRESHOLD,
            _ => 40,
        }
    }

    /// Requirement for a contract bid; `None` for Pass, Double and Redouble.
    pub fn min_points_for(call: Call) -> Option<u8> {
        match call {
            Call::Bid {
                level,
                strain: Strain::NoTrump,
            } => Some(Self::min_points_for_nt_bid(level)),
            Call::Bid { level, .. } => Some(Self::min_points_for_suited_bid(level)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suited_bid_points() {
        assert_eq!(PointRanges::min_points_for_suited_bid(1), 16);
        assert_eq!(PointRanges::min_points_for_suited_bid(2), 19);
        assert_eq!(PointRanges::min_points_for_suited_bid(4), 25);
        assert_eq!(PointRanges::min_points_for_suited_bid(7), 37);
    }

    #[test]
    fn test_nt_bid_points() {
        assert_eq!(PointRanges::min_points_for_nt_bid(1), 19);
        assert_eq!(PointRanges::min_points_for_nt_bid(3), 25);
        assert_eq!(PointRanges::min_points_for_nt_bid(5), 30);
    }

    #[test]
    fn test_min_points_for_call() {
        assert_eq!(PointRanges::min_points_for(Call::bid(3, Strain::NoTrump)), Some(25));
        assert_eq!(PointRanges::min_points_for(Call::bid(4, Strain::Hearts)), Some(25));
        assert_eq!(PointRanges::min_points_for(Call::Pass), None);
        assert_eq!(PointRanges::min_points_for(Call::Double), None);
    }
}
