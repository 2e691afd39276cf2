use crate::config::GameConfig;
use crate::game::{GameResult, MoveOutcome, Special, Status};
use crate::opponent::play_random;
use crate::piece::Color;
use crate::session::{ClickOutcome, Session};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct SquarePiece {
    piece_type: String,
    color: String,
}

#[derive(Serialize)]
struct BoardState {
    rows: usize,
    cols: usize,
    squares: Vec<Vec<Option<SquarePiece>>>,
    current_turn: String,
    game_over: bool,
    result: Option<String>,
    is_in_check: bool,
    selected: Option<[usize; 2]>,
    possible_moves: Vec<[usize; 2]>,
    last_move: Option<[[usize; 2]; 2]>,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    board_state: Option<BoardState>,
    special: Option<String>,
    status: Option<String>,
    error: Option<String>,
}

fn color_to_string(c: Color) -> String {
    c.to_string()
}

fn result_to_string(r: GameResult) -> String {
    match r {
        GameResult::Win(Color::White) => "White wins".to_string(),
        GameResult::Win(Color::Black) => "Black wins".to_string(),
        GameResult::Draw => "Draw by repetition".to_string(),
    }
}

fn special_to_string(s: Special) -> String {
    match s {
        Special::Conversion => "conversion".to_string(),
        Special::Castle(_) => "castle".to_string(),
        Special::Promotion => "promotion".to_string(),
    }
}

fn status_to_string(s: Status) -> String {
    match s {
        Status::Ongoing => "ongoing".to_string(),
        Status::Check => "check".to_string(),
        Status::Checkmate => "checkmate".to_string(),
        Status::TurnSkipped => "turn_skipped".to_string(),
        Status::DrawByRepetition => "draw".to_string(),
    }
}

fn build_board_state(session: &Session) -> BoardState {
    let state = &session.state;
    let squares: Vec<Vec<Option<SquarePiece>>> = state
        .board
        .squares
        .iter()
        .map(|row| {
            row.iter()
                .map(|sq| {
                    sq.map(|p| SquarePiece {
                        piece_type: p.kind.name().to_string(),
                        color: color_to_string(p.color),
                    })
                })
                .collect()
        })
        .collect();

    BoardState {
        rows: state.board.rows,
        cols: state.board.cols,
        squares,
        current_turn: color_to_string(state.turn),
        game_over: state.game_over,
        result: state.result.map(result_to_string),
        is_in_check: state.is_in_check(),
        selected: session.selected.map(|(r, c)| [r, c]),
        possible_moves: session.possible_moves.iter().map(|&(r, c)| [r, c]).collect(),
        last_move: state.last_move.map(|m| [[m.from.0, m.from.1], [m.to.0, m.to.1]]),
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub struct Game {
    session: Session,
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game {
            session: Session::default(),
        }
    }

    /// Start a game from a JSON `GameConfig`; falls back to the classic game
    /// when the config is invalid.
    pub fn with_config(json: &str) -> Game {
        let config = GameConfig::from_json(json).unwrap_or_default();
        Game {
            session: Session::new(config),
        }
    }

    pub fn build_timestamp() -> String {
        env!("BUILD_TIMESTAMP").to_string()
    }

    pub fn get_board_state(&self) -> JsValue {
        to_js(&build_board_state(&self.session))
    }

    pub fn click(&mut self, row: usize, col: usize) -> JsValue {
        let outcome = match self.session.click((row, col)) {
            ClickOutcome::Moved(outcome) => Some(outcome),
            _ => None,
        };
        to_js(&self.move_result(outcome))
    }

    pub fn make_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> JsValue {
        if self.session.state.game_over {
            return to_js(&MoveResult {
                board_state: None,
                special: None,
                status: None,
                error: Some("Game is already over".to_string()),
            });
        }

        self.session.clear_selection();
        match self.session.state.try_move((from_row, from_col), (to_row, to_col)) {
            Ok(outcome) => to_js(&self.move_result(Some(outcome))),
            Err(err) => to_js(&MoveResult {
                board_state: None,
                special: None,
                status: None,
                error: Some(err.to_string()),
            }),
        }
    }

    pub fn make_random_move(&mut self) -> JsValue {
        self.session.clear_selection();
        let outcome = play_random(&mut self.session.state);
        to_js(&self.move_result(outcome))
    }

    pub fn get_legal_moves_for_square(&mut self, row: usize, col: usize) -> JsValue {
        let moves: Vec<[usize; 2]> = self
            .session
            .state
            .get_legal_moves((row, col))
            .into_iter()
            .map(|(r, c)| [r, c])
            .collect();
        to_js(&moves)
    }

    pub fn reset(&mut self) -> JsValue {
        self.session.reset();
        self.get_board_state()
    }
}

impl Game {
    fn move_result(&self, outcome: Option<MoveOutcome>) -> MoveResult {
        MoveResult {
            board_state: Some(build_board_state(&self.session)),
            special: outcome.and_then(|o| o.special).map(special_to_string),
            status: outcome.map(|o| status_to_string(o.status)),
            error: None,
        }
    }
}
