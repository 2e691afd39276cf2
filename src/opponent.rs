// =============================================================================
// Random opponent
//
// Picks uniformly among the legal moves of the side to move. There is no
// evaluation: this is the stand-in opponent for self-play and the browser UI.
// =============================================================================

use crate::game::{GameState, MoveOutcome};
use crate::moves::Move;

/// Platform-appropriate random index in [0, len).
/// Uses js_sys::Math::random() in WASM builds, rand crate natively.
fn random_index(len: usize) -> usize {
    #[cfg(target_arch = "wasm32")]
    {
        ((js_sys::Math::random() * len as f64) as usize).min(len - 1)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len)
    }
}

/// Choose a legal move with `pick`, which receives the number of candidates
/// and must return an index below it.
pub fn choose_move(state: &mut GameState, pick: impl FnOnce(usize) -> usize) -> Option<Move> {
    if state.game_over {
        return None;
    }
    let moves = state.all_legal_moves();
    if moves.is_empty() {
        return None;
    }
    moves.get(pick(moves.len())).copied()
}

pub fn random_move(state: &mut GameState) -> Option<Move> {
    choose_move(state, random_index)
}

/// Reproducible variant for simulations and tests.
#[cfg(not(target_arch = "wasm32"))]
pub fn seeded_move<R: rand::Rng>(state: &mut GameState, rng: &mut R) -> Option<Move> {
    choose_move(state, |len| rng.gen_range(0..len))
}

/// Pick a random legal move and play it.
pub fn play_random(state: &mut GameState) -> Option<MoveOutcome> {
    let mv = random_move(state)?;
    state.try_move(mv.from, mv.to).ok()
}
