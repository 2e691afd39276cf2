use std::io::Write;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use spychess::config::{GameConfig, Layout};
use spychess::game::{GameResult, GameState, Special, Status};
use spychess::opponent::seeded_move;
use spychess::piece::Color;

/// Play many random games and report how they ended.
#[derive(Parser)]
#[command(version = env!("BUILD_TIMESTAMP"))]
struct Args {
    #[arg(long, default_value_t = 100)]
    games: u32,
    #[arg(long, default_value_t = 300)]
    max_plies: u32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Play on the 8x9 layout instead of the classic board.
    #[arg(long)]
    wide: bool,
}

#[derive(Debug, Default, Serialize)]
struct Tally {
    games: u32,
    white_wins: u32,
    black_wins: u32,
    draws: u32,
    unfinished: u32,
    turns_skipped: u32,
    conversions: u32,
    total_plies: u64,
}

fn play_game(config: &GameConfig, rng: &mut StdRng, max_plies: u32, tally: &mut Tally) {
    let mut state = GameState::with_config(config.clone());
    while !state.game_over && state.ply < max_plies {
        let Some(mv) = seeded_move(&mut state, rng) else {
            break;
        };
        match state.try_move(mv.from, mv.to) {
            Ok(outcome) => {
                if outcome.status == Status::TurnSkipped {
                    tally.turns_skipped += 1;
                }
                if outcome.special == Some(Special::Conversion) {
                    tally.conversions += 1;
                }
            }
            Err(err) => {
                log::error!("random mover produced a rejected move: {err}");
                break;
            }
        }
    }

    tally.games += 1;
    tally.total_plies += u64::from(state.ply);
    match state.result {
        Some(GameResult::Win(Color::White)) => tally.white_wins += 1,
        Some(GameResult::Win(Color::Black)) => tally.black_wins += 1,
        Some(GameResult::Draw) => tally.draws += 1,
        None => tally.unfinished += 1,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = GameConfig {
        layout: if args.wide { Layout::Wide } else { Layout::Classic },
        ..GameConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut tally = Tally::default();

    for game in 0..args.games {
        play_game(&config, &mut rng, args.max_plies, &mut tally);
        eprint!("\r  played {}/{}", game + 1, args.games);
        std::io::stderr().flush().ok();
    }
    eprintln!();

    println!("{}", serde_json::to_string_pretty(&tally)?);
    Ok(())
}
