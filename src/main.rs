use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dicewar::{
    graph::TileGraph,
    influence::{InfluenceMap, InfluencePropagator, InfluenceSettings},
    scenario::ScenarioLoader,
    snapshot::SnapshotWriter,
    tile::Coord,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Dice war map tools and computer player")]
struct Cli {
    /// Log filter, e.g. `info` or `dicewar=debug` (defaults to RUST_LOG, then the scenario)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a map file
    Check { map: PathBuf },
    /// Print influence weights around a tile
    Influence {
        map: PathBuf,
        #[arg(long)]
        row: usize,
        #[arg(long)]
        col: usize,
        #[arg(long, default_value_t = 30)]
        initial: i32,
        #[arg(long, default_value_t = 15)]
        floor: i32,
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,
    },
    /// Run one computer-player decision for a scenario
    Decide {
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long)]
        player: String,
    },
    /// Write a board snapshot for a scenario
    Snapshot {
        #[arg(long)]
        scenario: PathBuf,
        /// Focused tile as `row,col`
        #[arg(long, value_parser = parse_coord)]
        focus: Option<Coord>,
        #[arg(long, default_value = "snapshots")]
        out: PathBuf,
    },
}

fn parse_coord(value: &str) -> Result<Coord, String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected row,col but got {value:?}"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row: {e}"))?;
    let col = col.trim().parse().map_err(|e| format!("bad column: {e}"))?;
    Ok(Coord::new(row, col))
}

fn init_logging(cli_level: Option<&str>, fallback: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn render_weights(graph: &TileGraph, influence: &InfluenceMap) -> String {
    let mut out = String::new();
    for row in 0..graph.height() {
        for col in 0..graph.width() {
            match influence.get(Coord::new(row, col)) {
                Some(weight) => out.push_str(&format!("{weight:>4}")),
                None => out.push_str("    "),
            }
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");

    match cli.command {
        Command::Check { map } => {
            init_logging(cli.log_level.as_deref(), "info");
            let graph = TileGraph::load(&map)?;
            println!(
                "{}: {} tiles, {}x{} (height x width), connected",
                map.display(),
                graph.len(),
                graph.height(),
                graph.width()
            );
        }
        Command::Influence {
            map,
            row,
            col,
            initial,
            floor,
            step,
        } => {
            init_logging(cli.log_level.as_deref(), "info");
            let graph = TileGraph::load(&map)?;
            let source = Coord::new(row, col);
            if !graph.contains(source) {
                bail!("{source} is not a tile of {}", map.display());
            }
            let propagator = InfluencePropagator::new(InfluenceSettings {
                initial_weight: initial,
                floor,
                step,
            });
            let influence = propagator.propagate(&graph, source);
            print!("{}", render_weights(&graph, &influence));
        }
        Command::Decide { scenario, player } => {
            let config = loader.load(&scenario)?;
            init_logging(cli.log_level.as_deref(), &config.logging.level);
            let mut session = loader.open_scenario(&config)?;
            let decision = session.decide(&player)?;
            println!("{}", serde_json::to_string(&decision)?);
        }
        Command::Snapshot {
            scenario,
            focus,
            out,
        } => {
            let config = loader.load(&scenario)?;
            init_logging(cli.log_level.as_deref(), &config.logging.level);
            let session = loader.open_scenario(&config)?;
            if let Some(coord) = focus {
                if !session.graph().contains(coord) {
                    bail!("{coord} is not a tile of scenario '{}'", session.name());
                }
            }
            let label = match focus {
                Some(coord) => format!("focus_{}_{}", coord.row, coord.col),
                None => "board".to_string(),
            };
            let path = SnapshotWriter::new(out).write(&session.snapshot(focus), &label)?;
            println!("Snapshot for '{}' written to {}", session.name(), path.display());
        }
    }
    Ok(())
}
