use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::bidding_utils::*;
use engine::{
    generate_random_board, BidRequest, DecisionResult, DecisionSource, Engine, EngineConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use types::{Auction, Hand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Show how the engine decides", long_about = None)]
struct Args {
    /// The hand on turn, spades first (e.g. K65.9872.T52.643)
    #[arg(long, required_unless_present = "deal")]
    hand: Option<String>,

    /// Calls so far, space separated (e.g. "1S X")
    #[arg(short, long, default_value = "")]
    auction: String,

    #[arg(short, long, default_value = "N")]
    dealer: String,

    #[arg(short, long, default_value = "none")]
    vul: String,

    /// Deal a random board from this seed and bid it out instead
    #[arg(long, conflicts_with = "hand")]
    deal: Option<u64>,

    /// Board number for --deal; sets dealer and vulnerability
    #[arg(long, default_value_t = 1, requires = "deal")]
    board: u32,

    /// Print the full trace as JSON
    #[arg(long)]
    json: bool,

    /// Engine configuration (YAML)
    #[arg(short, long, env = "BIDDING_CONFIG")]
    config: Option<PathBuf>,
}

fn rule_name(result: &DecisionResult) -> &str {
    match &result.source {
        DecisionSource::Rule { id, .. } => id.as_str(),
        DecisionSource::Fallback => "fallback",
    }
}

fn debug_one(engine: &Engine, args: &Args, hand: &str) -> Result<()> {
    let dealer = parse_position(&args.dealer)?;
    let vulnerability = parse_vulnerability(&args.vul)?;
    let auction = parse_auction(dealer, &args.auction)?;
    let hand = Hand::from_pbn(hand).with_context(|| format!("invalid hand '{}'", hand))?;
    let request = BidRequest::new(hand, auction, vulnerability);
    let trace = engine
        .decide_with_trace(&request)
        .context("the engine could not decide")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    println!("Hand ({}):", request.seat);
    for line in get_hand_suits(&request.hand) {
        println!("  {}", line);
    }
    println!("Dealer: {:?} | Vulnerability: {:?}", dealer, vulnerability);
    println!("Bidder: {}\n", engine.bidder_name());

    print!("{}", format_table_header());
    for (idx, (position, call)) in request.auction.iter().enumerate() {
        println!(
            "{}",
            format_row(idx + 1, position.to_char(), &call.render(), "", "(History)")
        );
    }
    let result = &trace.result;
    println!(
        "{}",
        format_row(
            request.auction.calls.len() + 1,
            request.seat.to_char(),
            &result.call.render(),
            rule_name(result),
            &result.explanation
        )
    );
    println!();
    print!("{}", format_trace(&trace));
    Ok(())
}

fn debug_deal(engine: &Engine, args: &Args, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let board = generate_random_board(args.board, &mut rng)?;

    let mut auction = Auction::new(board.dealer);
    let mut results = Vec::new();
    while !auction.is_finished() {
        let seat = auction.current_player();
        let Some(hand) = board.get_hand(seat) else {
            bail!("the deal has no hand for {}", seat);
        };
        let request = BidRequest {
            hand: hand.clone(),
            auction: auction.clone(),
            seat,
            vulnerability: board.vulnerability,
        };
        let result = engine.decide(&request)?;
        auction.try_add_call(result.call)?;
        results.push((seat, result));
    }

    if args.json {
        let calls: Vec<&DecisionResult> = results.iter().map(|(_, result)| result).collect();
        println!("{}", serde_json::to_string_pretty(&calls)?);
        return Ok(());
    }

    println!("Seed: {} | Board: {}", seed, args.board);
    println!(
        "Dealer: {:?} | Vulnerability: {:?}\n",
        board.dealer, board.vulnerability
    );
    print!("{}", format_hands_table(&board.hands));
    println!();
    print!("{}", format_table_header());
    for (idx, (seat, result)) in results.iter().enumerate() {
        println!(
            "{}",
            format_row(
                idx + 1,
                seat.to_char(),
                &result.call.render(),
                rule_name(result),
                &result.explanation
            )
        );
    }
    match auction.final_contract() {
        Some(contract) => println!("\nContract: {}", contract),
        None => println!("\nPassed out"),
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config).context("building the engine")?;

    match (&args.hand, args.deal) {
        (_, Some(seed)) => debug_deal(&engine, &args, seed),
        (Some(hand), None) => debug_one(&engine, &args, hand),
        (None, None) => bail!("give either --hand or --deal"),
    }
}
