mod config;
mod output;
mod session_file;
mod simulate;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tierjudge_core::constants::DEFAULT_MIN_COMPARISONS;
use tierjudge_core::{initial_comparison_queue_warm_start, operative_tier_names, RankingConfig};
use tracing_subscriber::EnvFilter;

use crate::config::{TierjudgeConfig, DEFAULT_TARGET_PER_ITEM, DEFAULT_TIER_ORDER};
use crate::session_file::{load_session, SessionFile};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "tierjudge", version, about = "Sort items into tiers from pairwise votes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Replay a session file and print the resulting tiers
    Tiers(TiersArgs),
    /// Print the warm-start comparison queue for a session file
    Queue(QueueArgs),
    /// Benchmark tier recovery against a synthetic rater
    Simulate(SimulateArgs),
    /// Create a default config file at ~/.config/tierjudge/config.toml
    Init,
}

/// Flags shared by every command that builds a session.
#[derive(clap::Args)]
struct CommonArgs {
    /// Tier names, best first (comma-separated, e.g. "S,A,B,C")
    #[arg(long, value_delimiter = ',')]
    tiers: Option<Vec<String>>,

    /// Comparisons an item needs before it is placed in a tier
    #[arg(long)]
    min_comparisons: Option<u32>,

    /// Path to config file (default: ~/.config/tierjudge/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser)]
struct TiersArgs {
    /// JSON session file (items, tier order, tiers, votes)
    #[arg(long)]
    session: PathBuf,

    /// Number of suggested next pairs to print
    #[arg(long, default_value_t = 5)]
    next: usize,

    /// Seed for pair selection
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct QueueArgs {
    /// JSON session file (items, tier order, tiers, votes)
    #[arg(long)]
    session: PathBuf,

    /// Comparisons per item the queue aims for
    #[arg(long)]
    target: Option<u32>,

    /// Seed for the shuffled fallback stage
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of a numbered list
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct SimulateArgs {
    /// Number of synthetic items
    #[arg(long, default_value_t = 30)]
    items: usize,

    /// Number of votes to cast
    #[arg(long, default_value_t = 200)]
    votes: usize,

    /// Seed for strengths, rater and pair selection
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of a summary
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// Settings after merging CLI flags over the config file over defaults.
struct Resolved {
    cfg: TierjudgeConfig,
    ranking: RankingConfig,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "tierjudge_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve(common: &CommonArgs) -> Resolved {
    init_logging(common.verbose);

    let config_path = common.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let ranking = RankingConfig {
        min_comparisons: common
            .min_comparisons
            .or(cfg.min_comparisons)
            .unwrap_or(DEFAULT_MIN_COMPARISONS),
        ..RankingConfig::default()
    };
    Resolved { cfg, ranking }
}

/// Tier order: --tiers > session file > config file > built-in default.
fn tier_order(common: &CommonArgs, file: Option<&SessionFile>, cfg: &TierjudgeConfig) -> Vec<String> {
    let raw = common
        .tiers
        .clone()
        .or_else(|| file.and_then(|f| f.tier_order.clone()))
        .or_else(|| cfg.tier_order.clone())
        .unwrap_or_else(|| DEFAULT_TIER_ORDER.iter().map(|s| s.to_string()).collect());
    let order = operative_tier_names(&raw);
    if order.is_empty() {
        bail("No usable tier names. \"unranked\" is reserved; pass --tiers S,A,B or set tier_order in the config.");
    }
    order
}

fn seeded_rng(flag: Option<u64>, cfg: &TierjudgeConfig) -> StdRng {
    match flag.or(cfg.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tiers(args) => run_tiers(args),
        Commands::Queue(args) => run_queue(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your default tier order, seed, etc.");
        }
    }
}

fn run_tiers(args: TiersArgs) {
    let Resolved { cfg, ranking } = resolve(&args.common);
    let file = load_session(&args.session);
    let order = tier_order(&args.common, Some(&file), &cfg);

    let session = file.replay(&order, ranking).unwrap_or_else(|e| bail(e));
    let mut rng = seeded_rng(args.seed, &cfg);
    let next = session.next_pairs(args.next, &mut rng);

    if args.json {
        output::print_json(
            session.tiers(),
            session.tier_order(),
            session.ledger(),
            session.votes_recorded(),
            session.last_report(),
            &next,
        );
    } else {
        output::print_table(
            session.tiers(),
            session.tier_order(),
            session.ledger(),
            session.votes_recorded(),
            session.last_report(),
            &next,
        );
    }
}

fn run_queue(args: QueueArgs) {
    let Resolved { cfg, ranking } = resolve(&args.common);
    let file = load_session(&args.session);
    let order = tier_order(&args.common, Some(&file), &cfg);
    let target = args.target.or(cfg.target_per_item).unwrap_or(DEFAULT_TARGET_PER_ITEM);

    let session = file.replay(&order, ranking).unwrap_or_else(|e| bail(e));
    let mut rng = seeded_rng(args.seed, &cfg);
    let queue = initial_comparison_queue_warm_start(
        session.pool(),
        session.ledger(),
        session.tier_order(),
        session.tiers(),
        target,
        &mut rng,
    );

    if args.json {
        output::print_pairs_json(&queue);
    } else if queue.is_empty() {
        println!("Every item already has {target} comparisons.");
    } else {
        output::print_pairs(&queue);
        println!("\n{} pairs queued (target {target} per item)", queue.len());
    }
}

fn run_simulate(args: SimulateArgs) {
    let Resolved { cfg, ranking } = resolve(&args.common);
    if args.items < 2 {
        bail(format!("Need at least 2 items to simulate, got {}", args.items));
    }
    let order = tier_order(&args.common, None, &cfg);
    let seed = args.seed.or(cfg.seed).unwrap_or_else(rand::random);

    tracing::info!(items = args.items, votes = args.votes, seed, "starting simulation");
    let summary = simulate::run_simulation(args.items, args.votes, &order, ranking, seed);

    if args.json {
        let text = serde_json::to_string_pretty(&summary)
            .unwrap_or_else(|e| bail(format!("Failed to serialize output: {e}")));
        println!("{text}");
    } else {
        simulate::print_summary(&summary);
        println!("Seed:              {seed}");
    }
}
