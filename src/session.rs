//! Click-to-move selection on top of a [`GameState`].
//!
//! The front end forwards board clicks here; the session keeps track of the
//! selected piece and its highlighted destinations.

use std::collections::BTreeSet;

use log::warn;

use crate::config::GameConfig;
use crate::game::{GameState, MoveOutcome};
use crate::moves::Square;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    Selected(Square),
    Cleared,
    Moved(MoveOutcome),
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub state: GameState,
    pub selected: Option<Square>,
    pub possible_moves: BTreeSet<Square>,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Session {
            state: GameState::with_config(config),
            selected: None,
            possible_moves: BTreeSet::new(),
        }
    }

    pub fn click(&mut self, square: Square) -> ClickOutcome {
        if self.state.game_over || !self.state.board.in_bounds(square.0 as i32, square.1 as i32) {
            return ClickOutcome::Ignored;
        }

        let own_piece = self
            .state
            .board
            .get_piece(square)
            .is_some_and(|p| p.color == self.state.turn);

        match self.selected {
            Some(from) if self.possible_moves.contains(&square) => {
                self.clear_selection();
                match self.state.try_move(from, square) {
                    Ok(outcome) => ClickOutcome::Moved(outcome),
                    Err(err) => {
                        warn!("highlighted move rejected: {err}");
                        ClickOutcome::Cleared
                    }
                }
            }
            _ if own_piece => {
                self.selected = Some(square);
                self.possible_moves = self.state.get_legal_moves(square);
                ClickOutcome::Selected(square)
            }
            Some(_) => {
                self.clear_selection();
                ClickOutcome::Cleared
            }
            None => ClickOutcome::Ignored,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.possible_moves.clear();
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.clear_selection();
    }
}
