//! Mixtour-Engine command line tool.
//!
//! ## Usage
//!
//! - `mixtour-engine` - Show a demo
//! - `mixtour-engine demo` - Play one game between the two searches
//! - `mixtour-engine selfplay --agents negamax,dummy` - Play automated games
//! - `mixtour-engine best position.json` - Print the best moves for a position

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;

use mixtour_engine::constants::{MAX_GAME_LEN, SEARCH_DEPTH, TOTAL_SIMULATIONS};
use mixtour_engine::geometry::{BoardConfig, BoardGeometry};
use mixtour_engine::montecarlo::{self, MonteCarloConfig};
use mixtour_engine::negamax::{self, NegamaxConfig};
use mixtour_engine::selfplay::{play_game, Agent, GameOutcome};
use mixtour_engine::state::{default_pieces, GameState, Snapshot};

/// Mixtour-Engine: move selection for Mixtour-style stacking games
#[derive(Parser)]
#[command(name = "mixtour-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level, used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game between negamax and Monte Carlo on the standard board
    Demo,
    /// Play automated games between agents
    Selfplay(SelfplayArgs),
    /// Print the best moves for a position read from a JSON snapshot
    Best(BestArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AgentKind {
    Dummy,
    Negamax,
    Montecarlo,
}

#[derive(Args)]
struct SearchArgs {
    /// Negamax search depth
    #[arg(long, default_value_t = SEARCH_DEPTH)]
    depth: u32,

    /// Total Monte Carlo simulations per move
    #[arg(long, default_value_t = TOTAL_SIMULATIONS)]
    simulations: usize,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// JSON board description (board config plus `layout`)
    #[arg(long)]
    board: Option<PathBuf>,
}

#[derive(Args)]
struct SelfplayArgs {
    /// Agent for each player, in turn order
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [AgentKind::Negamax, AgentKind::Montecarlo])]
    agents: Vec<AgentKind>,

    /// Pieces per player (default depends on the player count)
    #[arg(long)]
    pieces: Option<u32>,

    /// Towers needed to win
    #[arg(long, default_value_t = 1)]
    towers: u32,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: usize,

    /// Maximum moves per game
    #[arg(long, default_value_t = MAX_GAME_LEN)]
    max_moves: usize,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Args)]
struct BestArgs {
    /// Snapshot file; reads stdin when omitted
    input: Option<PathBuf>,

    /// Search algorithm
    #[arg(long, value_enum, default_value_t = AgentKind::Negamax)]
    algorithm: AgentKind,

    #[command(flatten)]
    search: SearchArgs,
}

/// Board description file.
#[derive(Deserialize)]
struct BoardFile {
    #[serde(flatten)]
    config: BoardConfig,
    layout: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Some(Commands::Selfplay(args)) => run_selfplay(&args),
        Some(Commands::Best(args)) => run_best(&args),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_geometry(board: Option<&Path>, player_count: usize) -> Result<Arc<BoardGeometry>> {
    let geometry = match board {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read board file {}", path.display()))?;
            let file: BoardFile = serde_json::from_str(&text)
                .with_context(|| format!("invalid board file {}", path.display()))?;
            let config = BoardConfig {
                player_count,
                ..file.config
            };
            BoardGeometry::build(config, &file.layout)?
        }
        None => BoardGeometry::standard(player_count)?,
    };
    Ok(Arc::new(geometry))
}

fn make_rng(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    }
}

fn make_agent(kind: AgentKind, search: &SearchArgs) -> Agent {
    match kind {
        AgentKind::Dummy => Agent::Dummy,
        AgentKind::Negamax => Agent::Negamax(NegamaxConfig {
            depth: search.depth,
        }),
        AgentKind::Montecarlo => Agent::MonteCarlo(MonteCarloConfig {
            total_simulations: search.simulations,
            ..MonteCarloConfig::default()
        }),
    }
}

fn run_demo() -> Result<()> {
    println!("Mixtour-Engine: negamax versus Monte Carlo\n");

    let geometry = BoardGeometry::standard(2)?;
    let mut state = GameState::new(Arc::new(geometry));
    let agents = [
        Agent::Negamax(NegamaxConfig { depth: 3 }),
        Agent::MonteCarlo(MonteCarloConfig {
            total_simulations: 1000,
            ..MonteCarloConfig::default()
        }),
    ];
    let mut rng = fastrand::Rng::with_seed(1);
    let (outcome, history) = play_game(&mut state, &agents, MAX_GAME_LEN, &mut rng)?;

    println!("{state}");
    println!("Moves played: {}", history.len());
    report_outcome(outcome, &agents);
    Ok(())
}

fn run_selfplay(args: &SelfplayArgs) -> Result<()> {
    let players = args.agents.len();
    if players < 2 {
        bail!("at least 2 agents are required");
    }
    let geometry = load_geometry(args.search.board.as_deref(), players)?;
    let agents: Vec<Agent> = args
        .agents
        .iter()
        .map(|&kind| make_agent(kind, &args.search))
        .collect();
    let pieces = args.pieces.unwrap_or_else(|| default_pieces(players));
    let mut rng = make_rng(args.search.seed);

    let mut wins = vec![0usize; players];
    for game in 0..args.games {
        let mut state = GameState::with_counts(geometry.clone(), pieces, args.towers);
        let (outcome, history) = play_game(&mut state, &agents, args.max_moves, &mut rng)?;
        info!(game, moves = history.len(), ?outcome, "game finished");
        if let GameOutcome::Won(p) = outcome {
            wins[p as usize] += 1;
        }
        if args.games == 1 {
            println!("{state}");
            report_outcome(outcome, &agents);
        }
    }

    for (p, agent) in agents.iter().enumerate() {
        println!("Player {p} ({agent}): {} wins", wins[p]);
    }
    Ok(())
}

fn report_outcome(outcome: GameOutcome, agents: &[Agent]) {
    match outcome {
        GameOutcome::Won(p) => println!("Player {p} ({}) wins", agents[p as usize]),
        GameOutcome::PassCycle => println!("No player can move; game abandoned"),
        GameOutcome::MoveLimit => println!("Move limit reached"),
    }
}

fn run_best(args: &BestArgs) -> Result<()> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read snapshot from stdin")?;
            text
        }
    };
    let snapshot: Snapshot = serde_json::from_str(&text).context("invalid snapshot")?;
    let players = snapshot.pieces_left.len();
    let geometry = load_geometry(args.search.board.as_deref(), players)?;
    let mut state = GameState::from_snapshot(geometry, snapshot)?;

    let moves = state.generate_moves();
    if moves.is_empty() {
        bail!("the game is already over");
    }
    let (best, value) = match args.algorithm {
        AgentKind::Dummy => bail!("the dummy agent does not search"),
        AgentKind::Negamax => {
            let config = NegamaxConfig {
                depth: args.search.depth,
            };
            let best = negamax::find_best_moves(&mut state, &moves, &config)?;
            (best.moves, best.value.to_string())
        }
        AgentKind::Montecarlo => {
            let config = MonteCarloConfig {
                total_simulations: args.search.simulations,
                ..MonteCarloConfig::default()
            };
            let mut rng = make_rng(args.search.seed);
            let best = montecarlo::find_best_moves(&state, &moves, &config, &mut rng)?;
            (best.moves, format!("{:.3}", best.value))
        }
    };

    println!("{}", serde_json::to_string(&best)?);
    println!("value: {value}");
    Ok(())
}
