use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spychess::config::{GameConfig, Layout};
use spychess::game::GameState;
use spychess::opponent::seeded_move;

/// Play one random-vs-random game and print every move.
#[derive(Parser)]
#[command(version = env!("BUILD_TIMESTAMP"))]
struct Args {
    /// Starting layout; overrides the config file.
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    /// JSON game config.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 200)]
    max_plies: u32,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LayoutArg {
    Classic,
    Wide,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Classic => Layout::Classic,
            LayoutArg::Wide => Layout::Wide,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.layout = layout.into();
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut state = GameState::with_config(config);

    while !state.game_over && state.ply < args.max_plies {
        let Some(mv) = seeded_move(&mut state, &mut rng) else {
            break;
        };
        let mover = state.turn;
        let outcome = state.try_move(mv.from, mv.to)?;
        match outcome.special {
            Some(special) => println!("{:>3}. {mover} {mv} {special:?} {:?}", state.ply, outcome.status),
            None => println!("{:>3}. {mover} {mv} {:?}", state.ply, outcome.status),
        }
    }

    println!("\n{}", state.board);
    match state.result {
        Some(result) => eprintln!("Game over after {} plies: {result:?}", state.ply),
        None => eprintln!("Stopped after {} plies without a result", state.ply),
    }
    Ok(())
}
