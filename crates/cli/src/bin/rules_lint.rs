use anyhow::Result;
use clap::Parser;
use cli::bidding_utils::init_logging;
use engine::{Phase, RuleStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load rule modules and report authoring errors")]
struct Args {
    /// Directory of extra rule modules to check alongside the built-in ones
    dir: Option<PathBuf>,

    /// Check only the given directory, without the built-in modules
    #[arg(long, requires = "dir")]
    alone: bool,
}

fn load(args: &Args) -> Result<RuleStore, engine::RuleStoreError> {
    match (&args.dir, args.alone) {
        (Some(dir), true) => RuleStore::load_dir(dir),
        (Some(dir), false) => RuleStore::embedded_with_dir(dir),
        (None, _) => RuleStore::embedded(),
    }
}

fn report(store: &RuleStore) {
    println!("{} modules, {} rules", store.modules().len(), store.len());
    for module in store.modules() {
        let rules = store
            .rules()
            .iter()
            .filter(|rule| rule.module == module.name)
            .count();
        let phases: Vec<&str> = module.phases.iter().map(|phase| phase.name()).collect();
        println!("  {:<14} {:>3} rules  [{}]", module.name, rules, phases.join(", "));
    }
    println!();
    for phase in Phase::ALL {
        let candidates = store.candidates(phase).count();
        println!("  {:<16} {:>3} candidates", phase.name(), candidates);
    }
}

fn main() -> Result<ExitCode> {
    init_logging();
    let args = Args::parse();
    match load(&args) {
        Ok(store) => {
            report(&store);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
