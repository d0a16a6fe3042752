use super::{Guard, ValidationContext, Verdict};
use crate::features::Feature;
use crate::kernel::{ForcingLevel, PointRanges};
use crate::result::AdjustmentKind;
use types::{Call, Strain, Suit};

/// The same strain one level down if the auction allows it, else Pass.
fn one_level_down(call: Call, ctx: &ValidationContext<'_>) -> Call {
    call.one_level_lower()
        .filter(|&lower| ctx.state.auction().is_legal(lower))
        .unwrap_or(Call::Pass)
}

fn own_length(ctx: &ValidationContext<'_>, suit: Suit) -> i32 {
    let feature = match suit {
        Suit::Clubs => Feature::LenClubs,
        Suit::Diamonds => Feature::LenDiamonds,
        Suit::Hearts => Feature::LenHearts,
        Suit::Spades => Feature::LenSpades,
    };
    ctx.features.number(feature)
}

/// Refuses slams the partnership is not strong enough for.
pub struct SlamGuard;

impl Guard for SlamGuard {
    fn kind(&self) -> AdjustmentKind {
        AdjustmentKind::Slam
    }

    fn check(&self, call: Call, ctx: &ValidationContext<'_>) -> Verdict {
        let (needed, name) = match call.level() {
            Some(7) => (ctx.thresholds.grand_slam, "grand slam"),
            Some(6) => (ctx.thresholds.small_slam, "small slam"),
            _ => return Verdict::Accept,
        };
        let estimate = ctx.features.number(Feature::CombinedEstHcp);
        if estimate >= i32::from(needed) {
            return Verdict::Accept;
        }
        Verdict::Replace {
            call: one_level_down(call, ctx),
            reason: format!(
                "combined ~{} HCP is short of the {} a {} needs",
                estimate, needed, name
            ),
        }
    }
}

/// Compares the level of a contract bid with the points the partnership
/// is thought to hold.
pub struct StrengthGuard;

impl StrengthGuard {
    fn exempt(call: Call, level: u8, strain: Strain, ctx: &ValidationContext<'_>) -> bool {
        let convention = ctx.state.interpret(call).convention;
        if convention.is_artificial() || convention.is_structured_reply() {
            return true;
        }
        let features = ctx.features;
        let level = i32::from(level);
        if let Some(suit) = strain.to_suit() {
            // Law of Total Tricks
            if features.suit(Feature::PartnerSuit) == Some(suit)
                && level <= features.number(Feature::FitLength) - 6
            {
                return true;
            }
            if level <= 4 && own_length(ctx, suit) >= level + 4 {
                return true;
            }
        }
        let partnership = ctx.seat.partnership();
        let auction = ctx.state.auction();
        let side_high = auction
            .iter()
            .filter(|(position, _)| partnership.contains(*position))
            .filter_map(|(_, call)| call.level())
            .max()
            .map_or(0, i32::from);
        if level <= side_high {
            return true;
        }
        features.forcing_level() == ForcingLevel::Forcing
            && auction.minimum_bid_in(strain) == Some(call)
    }
}

impl Guard for StrengthGuard {
    fn kind(&self) -> AdjustmentKind {
        AdjustmentKind::Strength
    }

    fn check(&self, call: Call, ctx: &ValidationContext<'_>) -> Verdict {
        let Call::Bid { level, strain } = call else {
            return Verdict::Accept;
        };
        let Some(required) = PointRanges::min_points_for(call) else {
            return Verdict::Accept;
        };
        if Self::exempt(call, level, strain, ctx) {
            return Verdict::Accept;
        }
        let estimate = ctx.features.number(Feature::CombinedEstPoints);
        let shortfall = i32::from(required) - estimate;
        let tolerance = i32::from(ctx.thresholds.strength_tolerance);
        let margin = i32::from(ctx.thresholds.downgrade_margin);
        let reason = format!(
            "{} wants {} combined points, estimate is {}",
            call, required, estimate
        );
        if shortfall <= tolerance {
            Verdict::Accept
        } else if shortfall <= tolerance + margin {
            Verdict::Doubtful(reason)
        } else {
            Verdict::Replace {
                call: one_level_down(call, ctx),
                reason,
            }
        }
    }
}

/// Keeps the auction open when partner's last call forces us to bid.
pub struct ForcingGuard;

impl ForcingGuard {
    fn forced(ctx: &ValidationContext<'_>) -> bool {
        let partner_forced = ctx
            .state
            .last_reading(ctx.seat.partner())
            .is_some_and(|reading| {
                !reading.call.is_pass() && reading.forcing == ForcingLevel::Forcing
            });
        partner_forced
            && ctx.features.flag(Feature::RhoPassed)
            && ctx.features.forcing_level() == ForcingLevel::Forcing
    }
}

impl Guard for ForcingGuard {
    fn kind(&self) -> AdjustmentKind {
        AdjustmentKind::Forcing
    }

    fn check(&self, call: Call, ctx: &ValidationContext<'_>) -> Verdict {
        if !call.is_pass() || !Self::forced(ctx) {
            return Verdict::Accept;
        }
        let features = ctx.features;
        let auction = ctx.state.auction();
        let cheapest = |strain: Strain| {
            auction
                .minimum_bid_in(strain)
                .filter(|bid| bid.level().is_some_and(|level| level < 6))
        };

        let support = features
            .suit(Feature::PartnerSuit)
            .filter(|_| features.number(Feature::SupportForPartner) >= 3)
            .and_then(|suit| cheapest(Strain::from_suit(suit)));
        let notrump = || {
            features
                .flag(Feature::IsBalanced)
                .then(|| cheapest(Strain::NoTrump))
                .flatten()
        };
        let longest = || {
            features
                .suit(Feature::LongestSuit)
                .and_then(|suit| cheapest(Strain::from_suit(suit)))
        };

        match support.or_else(notrump).or_else(longest) {
            Some(bid) => Verdict::Replace {
                call: bid,
                reason: "partner's last call is forcing".to_string(),
            },
            None => Verdict::Accept,
        }
    }
}
