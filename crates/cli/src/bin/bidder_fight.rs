use anyhow::{Context, Result};
use clap::Parser;
use cli::bidding_utils::{init_logging, pct};
use engine::{generate_random_board, BidRequest, BidderKind, Engine, EngineConfig, Phase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use types::{Auction, Board, Call, Position};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compare the rule-driven bidder with the point-count reference bidder"
)]
struct Args {
    /// Number of random boards to compare
    #[arg(short = 'n', long, default_value_t = 200)]
    count: usize,

    /// Random seed for reproducible runs (random if omitted, always printed)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Show all individual differences, not just top examples
    #[arg(short, long)]
    verbose: bool,

    /// Max examples shown per category
    #[arg(long, default_value_t = 3)]
    examples: usize,

    /// Only show examples whose phase contains this substring
    #[arg(long)]
    category: Option<String>,

    /// Print the summary as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Engine configuration (YAML) shared by both bidders
    #[arg(short, long, env = "BIDDING_CONFIG")]
    config: Option<PathBuf>,
}

// ── types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
struct Difference {
    board: u32,
    position: Position,
    hand: String,
    auction_so_far: String,
    phase: Phase,
    schema_call: Call,
    reference_call: Call,
}

enum BoardResult {
    Agree,
    Differ(Difference),
}

/// Where the schema bidder's own auctions ended.
#[derive(Debug, Default, Serialize)]
struct Contracts {
    passed_out: usize,
    partscores: usize,
    games: usize,
    slams: usize,
}

impl Contracts {
    fn record(&mut self, auction: &Auction) {
        match auction.final_contract() {
            None => self.passed_out += 1,
            Some(contract) if contract.is_slam() => self.slams += 1,
            Some(contract) if contract.is_game() => self.games += 1,
            Some(_) => self.partscores += 1,
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    boards: usize,
    agree: usize,
    contracts: Contracts,
    differences: Vec<Difference>,
}

// ── board comparison ───────────────────────────────────────────────────

/// Bid the board with the schema engine, asking the reference engine the
/// same question at every turn. Stops at the first disagreement.
fn compare_board(
    schema: &Engine,
    reference: &Engine,
    board: &Board,
    board_number: u32,
) -> Result<BoardResult> {
    let mut auction = Auction::new(board.dealer);
    while !auction.is_finished() {
        let seat = auction.current_player();
        let hand = board
            .get_hand(seat)
            .with_context(|| format!("board {} has no hand for {}", board_number, seat))?;
        let request = BidRequest {
            hand: hand.clone(),
            auction: auction.clone(),
            seat,
            vulnerability: board.vulnerability,
        };
        let ours = schema.decide(&request)?;
        let theirs = reference.decide(&request)?;

        if ours.call != theirs.call {
            return Ok(BoardResult::Differ(Difference {
                board: board_number,
                position: seat,
                hand: hand.to_pbn(),
                auction_so_far: engine::render_calls(&auction.calls),
                phase: ours.phase,
                schema_call: ours.call,
                reference_call: theirs.call,
            }));
        }
        auction.try_add_call(ours.call)?;
    }
    Ok(BoardResult::Agree)
}

fn run(args: &Args, schema: &Engine, reference: &Engine) -> Result<Summary> {
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    eprintln!("Seed: {seed} | Boards: {}", args.count);

    // Generate all boards deterministically from the seed.
    let mut rng = StdRng::seed_from_u64(seed);
    let mut agree = 0;
    let mut contracts = Contracts::default();
    let mut differences = Vec::new();
    for i in 0..args.count {
        let n = rng.gen_range(1..=16);
        let board = generate_random_board(n, &mut rng)?;
        match compare_board(schema, reference, &board, n)? {
            BoardResult::Agree => agree += 1,
            BoardResult::Differ(d) => differences.push(d),
        }
        contracts.record(&schema.bid_board(&board)?);
        eprint!("\rProgress: {}/{}", i + 1, args.count);
    }
    eprintln!("\r\x1b[K"); // clear progress line

    Ok(Summary {
        seed,
        boards: args.count,
        agree,
        contracts,
        differences,
    })
}

fn print_report(args: &Args, summary: &Summary) {
    let total = summary.boards;
    let diffs = &summary.differences;
    println!("Seed: {}", summary.seed);
    println!(
        "Boards: {total} | Agree: {} ({:.1}%) | Differ: {} ({:.1}%)",
        summary.agree,
        pct(summary.agree, total),
        diffs.len(),
        pct(diffs.len(), total),
    );
    let c = &summary.contracts;
    println!(
        "Schema contracts: {} passed out | {} partscores | {} games | {} slams",
        c.passed_out, c.partscores, c.games, c.slams
    );
    println!();

    if diffs.is_empty() {
        println!("Perfect agreement!");
        return;
    }

    let mut by_phase: BTreeMap<&str, Vec<&Difference>> = BTreeMap::new();
    for d in diffs {
        by_phase.entry(d.phase.name()).or_default().push(d);
    }

    // ── category table ─────────────────────────────────────────────────
    let mut phases: Vec<_> = by_phase.iter().collect();
    phases.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let max_count = phases.first().map(|(_, v)| v.len()).unwrap_or(1);
    let bar_width = 20;

    println!("Differences by phase:");
    for (phase, items) in &phases {
        let n = items.len();
        let bar_len = (n * bar_width / max_count).max(1);
        let bar: String = "\u{2588}".repeat(bar_len);
        println!(
            "  {:<24} {:>3}  {:<20} ({:>4.1}%)",
            phase,
            n,
            bar,
            pct(n, diffs.len())
        );
    }
    println!();

    // ── per-phase detail ───────────────────────────────────────────────
    for (phase, items) in &phases {
        if let Some(ref filter) = args.category {
            if !phase.contains(&filter.to_lowercase()) {
                continue;
            }
        }

        let mut pairs: BTreeMap<String, usize> = BTreeMap::new();
        for d in *items {
            let key = format!("schema:{} reference:{}", d.schema_call, d.reference_call);
            *pairs.entry(key).or_default() += 1;
        }
        let mut pair_list: Vec<_> = pairs.iter().collect();
        pair_list.sort_by(|a, b| b.1.cmp(a.1));
        let pairs_str: String = pair_list
            .iter()
            .take(5)
            .map(|(k, v)| format!("{k} ({v})"))
            .collect::<Vec<_>>()
            .join(", ");

        println!("{phase} ({}):", items.len());
        println!("  Patterns: {pairs_str}");

        let limit = if args.verbose {
            items.len()
        } else {
            args.examples
        };
        for d in items.iter().take(limit) {
            let auc = if d.auction_so_far.is_empty() {
                "-"
            } else {
                &d.auction_so_far
            };
            println!(
                "    board {} {:?}: {} after [{}] \u{2192} schema: {}, reference: {}",
                d.board, d.position, d.hand, auc, d.schema_call, d.reference_call,
            );
        }
        if !args.verbose && items.len() > args.examples {
            println!("    ... and {} more", items.len() - args.examples);
        }
        println!();
    }
}

// ── main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let schema = Engine::new(EngineConfig {
        bidder: BidderKind::Schema,
        ..config.clone()
    })?;
    let reference = Engine::new(EngineConfig {
        bidder: BidderKind::Reference,
        ..config
    })?;

    let summary = run(&args, &schema, &reference)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&args, &summary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engines() -> (Engine, Engine) {
        let schema = Engine::sayc().unwrap();
        let reference = Engine::new(EngineConfig {
            bidder: BidderKind::Reference,
            ..EngineConfig::default()
        })
        .unwrap();
        (schema, reference)
    }

    #[test]
    fn test_same_engine_always_agrees() {
        let (schema, _) = engines();
        let mut rng = StdRng::seed_from_u64(11);
        for n in 1..=8 {
            let board = generate_random_board(n, &mut rng).unwrap();
            let result = compare_board(&schema, &schema, &board, n).unwrap();
            assert!(matches!(result, BoardResult::Agree));
        }
    }

    #[test]
    fn test_run_is_reproducible() {
        let (schema, reference) = engines();
        let args = Args::parse_from(["bidder_fight", "-n", "10", "--seed", "42"]);
        let first = run(&args, &schema, &reference).unwrap();
        let second = run(&args, &schema, &reference).unwrap();
        assert_eq!(first.seed, 42);
        assert_eq!(first.agree + first.differences.len(), 10);
        let c = &first.contracts;
        assert_eq!(c.passed_out + c.partscores + c.games + c.slams, 10);
        assert_eq!(first.agree, second.agree);
        let calls = |s: &Summary| -> Vec<(Call, Call)> {
            s.differences
                .iter()
                .map(|d| (d.schema_call, d.reference_call))
                .collect()
        };
        assert_eq!(calls(&first), calls(&second));
    }

    #[test]
    fn test_difference_records_where_bidders_split() {
        let (schema, reference) = engines();
        let mut rng = StdRng::seed_from_u64(3);
        for n in 1..=30 {
            let board = generate_random_board(n, &mut rng).unwrap();
            let result = compare_board(&schema, &reference, &board, n).unwrap();
            if let BoardResult::Differ(d) = result {
                assert_ne!(d.schema_call, d.reference_call);
                assert_eq!(d.board, n);
                let auction = Auction::parse(board.dealer, &d.auction_so_far).unwrap();
                assert_eq!(auction.current_player(), d.position);
            }
        }
    }
}
