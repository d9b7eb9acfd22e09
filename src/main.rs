//! Gridclash - Main Binary
//!
//! Resolve rounds, play matches and batch-simulate scenario files

use clap::{Parser, Subcommand};
use gridclash_rs::{
    board::BoardSet,
    game::{
        compute_board_hash, format_hash, recording_callback, OutputMode, RoundEngine, RoundInput,
        RoundOptions, VerbosityLevel,
    },
    loader::{ContentDatabase, Scenario},
    simulate::{run_simulation, SimulationConfig},
    Result,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Verbosity level for round output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "clash")]
#[command(about = "Gridclash - deterministic round resolution for a 3x3 auto-battler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single round from a scenario file
    Round {
        /// Scenario file (.json)
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Extra content directory, merged under the scenario's own content
        #[arg(long, value_name = "DIR")]
        content_dir: Option<PathBuf>,

        /// Verbosity level for round output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Print every emitted step as one JSON line
        #[arg(long)]
        steps: bool,

        /// Print the round result as JSON
        #[arg(long)]
        json: bool,

        /// Use renderer pacing delays between steps
        #[arg(long)]
        paced: bool,

        /// Print a hash of the boards before and after the round
        #[arg(long)]
        debug_state_hash: bool,
    },

    /// Play rounds back to back until one side wins
    Match {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        #[arg(long, value_name = "DIR")]
        content_dir: Option<PathBuf>,

        /// Stop after this many rounds
        #[arg(long, default_value_t = 20)]
        max_rounds: u32,

        /// Match seed (defaults to the scenario's seed)
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityArg,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        debug_state_hash: bool,
    },

    /// Play the same scenario many times in parallel and report win rates
    Simulate {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        #[arg(long, value_name = "DIR")]
        content_dir: Option<PathBuf>,

        /// Number of games to run
        #[arg(long, short = 'g', default_value_t = 1000)]
        games: usize,

        #[arg(long, default_value_t = 20)]
        max_rounds: u32,

        /// Master seed for the per-game seeds
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Draw the opening priority per game
        #[arg(long)]
        random_priority: bool,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Round {
            scenario,
            content_dir,
            verbosity,
            steps,
            json,
            paced,
            debug_state_hash,
        } => {
            run_round(
                &scenario,
                content_dir,
                verbosity.into(),
                steps,
                json,
                paced,
                debug_state_hash,
            )
            .await?
        }
        Commands::Match {
            scenario,
            content_dir,
            max_rounds,
            seed,
            verbosity,
            json,
            debug_state_hash,
        } => {
            run_match(
                &scenario,
                content_dir,
                max_rounds,
                seed,
                verbosity.into(),
                json,
                debug_state_hash,
            )
            .await?
        }
        Commands::Simulate {
            scenario,
            content_dir,
            games,
            max_rounds,
            seed,
            random_priority,
            json,
        } => {
            run_simulate(
                &scenario,
                content_dir,
                SimulationConfig {
                    games,
                    max_rounds,
                    seed,
                    random_priority,
                },
                json,
            )
            .await?
        }
    }

    Ok(())
}

/// Load a scenario, merging its content over an optional content directory
async fn load_scenario(
    path: &Path,
    content_dir: Option<PathBuf>,
) -> Result<(Scenario, ContentDatabase, BoardSet)> {
    let scenario = Scenario::load(path)?;
    let (content, boards) = match content_dir {
        Some(dir) => {
            let mut content = ContentDatabase::load_from_dir_async(dir).await?;
            content.merge(scenario.content.clone());
            let boards = scenario.setup.build(&content)?;
            (content, boards)
        }
        None => scenario.build()?,
    };
    Ok((scenario, content, boards))
}

async fn run_round(
    path: &Path,
    content_dir: Option<PathBuf>,
    verbosity: VerbosityLevel,
    print_steps: bool,
    json: bool,
    paced: bool,
    debug_state_hash: bool,
) -> Result<()> {
    let (scenario, content, boards) = load_scenario(path, content_dir).await?;

    if debug_state_hash {
        eprintln!("State hash (start): {}", format_hash(compute_board_hash(&boards)));
    }

    let recorded = Arc::new(Mutex::new(Vec::new()));
    let base = if paced {
        RoundOptions::paced()
    } else {
        RoundOptions::default()
    };
    let mut options = base.with_verbosity(verbosity);
    if json {
        // Keep stdout clean for the JSON document
        options = options.with_output_mode(OutputMode::Memory);
    }
    if print_steps {
        options = options.with_step_callback(recording_callback(Arc::clone(&recorded)));
    }

    let mut engine = RoundEngine::new(&content, options);
    let input = RoundInput::new(boards)
        .with_priority(scenario.priority)
        .with_round(scenario.round)
        .with_seed(scenario.seed);
    let result = engine.execute_round(input).await;

    if print_steps {
        let steps = recorded
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default();
        for step in steps {
            println!("{}", serde_json::to_string(&step)?);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let outcome = match result.winner {
            Some(winner) => winner.to_string(),
            None => "undecided".to_string(),
        };
        println!(
            "Round {} resolved: {} casts, {} steps, winner: {}, priority: {}",
            scenario.round, result.casts_resolved, result.steps_emitted, outcome, result.priority
        );
    }

    if debug_state_hash {
        eprintln!(
            "State hash (end):   {}",
            format_hash(compute_board_hash(&result.boards))
        );
    }

    Ok(())
}

async fn run_match(
    path: &Path,
    content_dir: Option<PathBuf>,
    max_rounds: u32,
    seed: Option<u64>,
    verbosity: VerbosityLevel,
    json: bool,
    debug_state_hash: bool,
) -> Result<()> {
    let (scenario, content, boards) = load_scenario(path, content_dir).await?;

    let mut options = RoundOptions::default().with_verbosity(verbosity);
    if json {
        options = options.with_output_mode(OutputMode::Memory);
    }
    let mut engine = RoundEngine::new(&content, options);
    let result = engine
        .run_match(
            boards,
            scenario.priority,
            max_rounds,
            seed.unwrap_or(scenario.seed),
        )
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let outcome = match result.winner {
            Some(winner) => winner.to_string(),
            None => "undecided".to_string(),
        };
        println!(
            "Match over after {} round(s): {} casts, winner: {}",
            result.rounds_played, result.casts_resolved, outcome
        );
    }

    if debug_state_hash {
        eprintln!(
            "State hash (end): {}",
            format_hash(compute_board_hash(&result.boards))
        );
    }

    Ok(())
}

async fn run_simulate(
    path: &Path,
    content_dir: Option<PathBuf>,
    config: SimulationConfig,
    json: bool,
) -> Result<()> {
    let (scenario, content, boards) = load_scenario(path, content_dir).await?;

    if !json {
        println!("=== Gridclash - Simulation Mode ===\n");
        println!("Scenario: {}", path.display());
        println!(
            "Running {} games (max {} rounds, seed {})\n",
            config.games, config.max_rounds, config.seed
        );
    }

    // rayon workers each build their own runtime; keep them off this one
    let summary = tokio::task::spawn_blocking(move || {
        run_simulation(&content, &boards, scenario.priority, config)
    })
    .await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}
