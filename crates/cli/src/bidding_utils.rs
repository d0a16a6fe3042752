use anyhow::{anyhow, Context, Result};
use engine::{DecisionTrace, RuleOutcome};
use std::collections::HashMap;
use std::fmt::Write;
use tracing_subscriber::EnvFilter;
use types::{Auction, Hand, Position, Suit, Vulnerability};

/// Send engine logs to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn parse_position(s: &str) -> Result<Position> {
    s.parse()
        .map_err(|()| anyhow!("unknown seat '{}' (expected N, E, S or W)", s))
}

pub fn parse_vulnerability(s: &str) -> Result<Vulnerability> {
    s.parse()
        .map_err(|()| anyhow!("unknown vulnerability '{}' (expected none, ns, ew or both)", s))
}

pub fn parse_auction(dealer: Position, calls: &str) -> Result<Auction> {
    Auction::parse(dealer, calls).with_context(|| format!("invalid auction '{}'", calls))
}

pub fn get_hand_suits(hand: &Hand) -> Vec<String> {
    let mut suits = Vec::new();
    for suit in [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs] {
        let cards: String = hand.cards_in(suit).map(|c| c.rank.to_char()).collect();
        suits.push(format!(
            "{}: {}",
            suit.to_char(),
            if cards.is_empty() { "-" } else { &cards }
        ));
    }
    suits
}

pub fn format_hands_table(hands: &HashMap<Position, Hand>) -> String {
    let mut out = String::new();
    let suits_of = |pos: Position| {
        hands
            .get(&pos)
            .map(get_hand_suits)
            .unwrap_or_else(|| vec!["-".to_string(); 4])
    };
    let (n, e, s, w) = (
        suits_of(Position::North),
        suits_of(Position::East),
        suits_of(Position::South),
        suits_of(Position::West),
    );

    let indent = "        ";
    let _ = writeln!(out, "{}North", indent);
    for line in &n {
        let _ = writeln!(out, "{}{}", indent, line);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{:<20} East", "West");
    for (west, east) in w.iter().zip(&e) {
        let _ = writeln!(out, "{:<20} {}", west, east);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}South", indent);
    for line in &s {
        let _ = writeln!(out, "{}{}", indent, line);
    }
    out
}

pub fn format_row(idx: usize, pos: char, call: &str, rule: &str, desc: &str) -> String {
    format!(
        "{:<3} | {:<3} | {:<5} | {:<25} | {}",
        idx, pos, call, rule, desc
    )
}

pub fn format_table_header() -> String {
    format!(
        "{:<3} | {:<3} | {:<5} | {:<25} | Description\n{:-<3}-+-{:-<3}-+-{:-<5}-+-{:-<25}-+-{:-<27}\n",
        "Idx", "Pos", "Call", "Rule", "", "", "", "", ""
    )
}

/// Human-readable rendering of one decision trace.
pub fn format_trace(trace: &DecisionTrace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Phase: {}", trace.phase);

    let _ = writeln!(out, "\nFeatures:");
    for (feature, value) in trace.features.iter() {
        let _ = writeln!(out, "  {:<22} {}", feature.name(), value);
    }

    let _ = writeln!(out, "\nRules tried:");
    if trace.rules.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for step in &trace.rules {
        let status = match step.outcome {
            RuleOutcome::ConditionFalse => "no     ".to_string(),
            RuleOutcome::TemplateUnresolved => "no bid ".to_string(),
            RuleOutcome::Matched { call } => format!("MATCH {}", call),
        };
        let _ = writeln!(
            out,
            "  [{}] {:>4} {}/{}",
            status, step.priority, step.module, step.rule
        );
    }
    match (trace.matched_rule(), trace.fallback) {
        (Some(step), _) => {
            let _ = writeln!(
                out,
                "  -> {}/{} (priority {})",
                step.module, step.rule, step.priority
            );
        }
        (None, Some(call)) => {
            let _ = writeln!(out, "  -> no rule matched, fallback proposed {}", call);
        }
        (None, None) => {}
    }

    let _ = writeln!(out, "\nProposed: {}", trace.proposed);
    if let Some(forcing) = trace.declared_forcing {
        let _ = writeln!(out, "Rule declares: {:?}", forcing);
    }
    for adjustment in &trace.validation {
        let _ = writeln!(
            out,
            "  {:?}: {} -> {} ({})",
            adjustment.kind, adjustment.original, adjustment.call, adjustment.reason
        );
    }

    let result = &trace.result;
    if result.was_adjusted() {
        let _ = writeln!(out, "Validation changed the call.");
    }
    let _ = writeln!(out, "\nDecision: {}", result);
    if let Some(forcing) = result.forcing {
        let _ = writeln!(out, "Forcing side effect: {:?}", forcing);
    }
    out
}

pub fn pct(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * n as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs() {
        assert_eq!(parse_position("s").unwrap(), Position::South);
        assert_eq!(parse_vulnerability("Both").unwrap(), Vulnerability::Both);
        assert!(parse_position("X").is_err());
        let auction = parse_auction(Position::North, "1S,X").unwrap();
        assert_eq!(auction.calls.len(), 2);
        assert!(parse_auction(Position::North, "1S 1H").is_err());
    }

    #[test]
    fn test_hand_suits_high_first() {
        let hand = Hand::from_pbn("AQ3.KJ2.Q987.A32").unwrap();
        assert_eq!(
            get_hand_suits(&hand),
            vec!["S: AQ3", "H: KJ2", "D: Q987", "C: A32"]
        );
    }

    #[test]
    fn test_hands_table_marks_missing_hands() {
        let mut hands = HashMap::new();
        hands.insert(Position::North, Hand::from_pbn("AQ3.KJ2.Q987.A32").unwrap());
        let table = format_hands_table(&hands);
        assert!(table.contains("S: AQ3"));
        assert!(table.contains("West"));
        assert!(table.lines().any(|line| line.trim() == "-"));
    }
}
