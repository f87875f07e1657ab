//! Command-line front end: compile a declarative MDP, or compile-and-search
//! it, printing a recommendation and per-edge statistics.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use weavetree::keys::{ActionKey, StateKey};
use weavetree::mdp::compile_yaml_str;
use weavetree::search::{SearchConfig, SearchTree};
use weavetree::simulator::MdpSimulator;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print debug-level logging
    #[arg(long, short, action)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and compile a YAML MDP document, reporting state/action counts.
    Compile {
        /// Path to the declarative MDP document.
        path: PathBuf,
    },
    /// Compile a document and run MCTS from its start state.
    Search {
        /// Path to the declarative MDP document.
        path: PathBuf,

        /// Number of selection/expansion/rollout/backprop cycles.
        #[arg(long, default_value_t = 1000)]
        iterations: u32,

        /// UCB1 exploration constant.
        #[arg(long, default_value_t = 1.4)]
        c: f64,

        /// Per-step discount factor.
        #[arg(long, default_value_t = 1.0)]
        gamma: f64,

        /// Hard step cap per iteration (selection + rollout combined).
        #[arg(long, default_value_t = 1000)]
        max_steps: u32,

        /// Whether backpropagated returns are discounted or summed raw.
        #[arg(long, default_value = "discounted")]
        return_type: String,

        /// Cut episodes at exactly this many steps from the root.
        #[arg(long)]
        fixed_horizon_steps: Option<u32>,

        /// Seed for the simulator's RNG stream.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Fixed rollout action index, used when no rollout policy is given.
        #[arg(long)]
        rollout_action: Option<u32>,

        /// Print the recommendation and statistics as JSON instead of a table.
        #[arg(long, action)]
        json: bool,
    },
}

/// A `search` subcommand's result, in the shape printed by `--json`.
#[derive(Debug, Serialize)]
struct SearchReport {
    iterations_completed: u32,
    iterations_requested: u32,
    best_by_visits: Option<String>,
    best_by_value: Option<String>,
    edges: Vec<EdgeReport>,
}

#[derive(Debug, Serialize)]
struct EdgeReport {
    action: u32,
    id: String,
    visits: u64,
    total_value: f64,
    mean_value: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let log_level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(log_level).unwrap();

    match args.command {
        Commands::Compile { path } => run_compile(&path),
        Commands::Search {
            path,
            iterations,
            c,
            gamma,
            max_steps,
            return_type,
            fixed_horizon_steps,
            seed,
            rollout_action,
            json,
        } => run_search(
            &path,
            SearchConfig {
                iterations,
                c,
                gamma,
                max_steps,
                return_type: return_type.parse().map_err(weavetree::EngineError::from)?,
                fixed_horizon_steps,
            },
            seed,
            rollout_action.map(ActionKey),
            json,
        ),
    }
}

fn run_compile(path: &PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let compiled = compile_yaml_str(&text)?;
    debug!(
        "compiled {} with {} states",
        path.display(),
        compiled.state_count()
    );
    println!(
        "{}: {} states, start = `{}`",
        path.display(),
        compiled.state_count(),
        compiled.state_id(compiled.start_state_key())
    );
    Ok(())
}

/// The declared `id` of `action` at `start`, for display.
fn action_label(sim: &MdpSimulator, start: StateKey, action: ActionKey) -> String {
    sim.compiled().action(start, action).id.clone()
}

fn run_search(
    path: &PathBuf,
    config: SearchConfig,
    seed: u64,
    rollout_action: Option<ActionKey>,
    json: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let compiled = compile_yaml_str(&text)?;
    let start = compiled.start_state_key();
    let terminal = compiled.is_terminal(start);
    let mut sim = MdpSimulator::new(compiled, seed);
    let mut tree = SearchTree::new(start, terminal);

    let result = tree.run(&mut sim, &config, rollout_action, None)?;

    let best_by_visits = tree
        .best_root_action_by_visits()
        .map(|action| action_label(&sim, start, action));
    let best_by_value = tree
        .best_root_action_by_value()
        .map(|action| action_label(&sim, start, action));

    let mut edges = Vec::new();
    let mut a = 0u32;
    while let Some(stats) = tree.edge_stats(ActionKey(a)) {
        edges.push(EdgeReport {
            action: a,
            id: action_label(&sim, start, ActionKey(a)),
            visits: stats.visits,
            total_value: stats.total_value,
            mean_value: stats.mean_value,
        });
        a += 1;
    }

    if json {
        let report = SearchReport {
            iterations_completed: result.iterations_completed,
            iterations_requested: config.iterations,
            best_by_visits,
            best_by_value,
            edges,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "completed {} of {} iterations",
        result.iterations_completed, config.iterations
    );
    match best_by_visits {
        Some(id) => println!("recommended action (by visits): {id}"),
        None => println!("recommended action (by visits): none (root has no edges)"),
    }
    match best_by_value {
        Some(id) => println!("recommended action (by value): {id}"),
        None => println!("recommended action (by value): none (no edge has been visited)"),
    }

    println!(
        "{:>8}  {:>8}  {:>10}  {:>14}  {:>12}",
        "action", "id", "visits", "total_value", "mean_value"
    );
    for edge in &edges {
        println!(
            "{:>8}  {:>8}  {:>10}  {:>14.4}  {:>12.4}",
            edge.action, edge.id, edge.visits, edge.total_value, edge.mean_value
        );
    }

    Ok(())
}
