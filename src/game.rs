use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::MoveError;
use crate::moves::{Move, Square};
use crate::piece::{Color, Piece, PieceKind};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum GameResult {
    Win(Color),
    Draw,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Side effect a move had beyond relocating the mover.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Special {
    /// A spy turned the piece it landed on and left play.
    Conversion,
    Castle(CastleSide),
    Promotion,
}

/// Where the game stands right after a move.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Status {
    Ongoing,
    Check,
    Checkmate,
    /// The opponent had no legal move while not in check, so the mover
    /// plays again.
    TurnSkipped,
    DrawByRepetition,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub mv: Move,
    pub special: Option<Special>,
    pub status: Status,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub game_over: bool,
    pub result: Option<GameResult>,
    pub last_move: Option<Move>,
    /// Occurrences of each position reached after a move, keyed by
    /// [`Board::position_key`].
    pub position_counts: HashMap<String, u32>,
    /// Moves applied so far.
    pub ply: u32,
    config: GameConfig,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        GameState {
            board: Board::new(config.layout),
            turn: Color::White,
            game_over: false,
            result: None,
            last_move: None,
            position_counts: HashMap::new(),
            ply: 0,
            config,
        }
    }

    /// Start from an arbitrary position. `reset` still returns to the
    /// configured starting layout.
    pub fn from_board(board: Board, turn: Color) -> Self {
        GameState {
            board,
            turn,
            ..Self::new()
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    pub fn is_in_check(&self) -> bool {
        self.board.is_in_check(self.turn)
    }

    pub fn repetition_count(&self, key: &str) -> u32 {
        self.position_counts.get(key).copied().unwrap_or(0)
    }

    /// Destinations the piece on `square` may legally move to. Empty unless
    /// the piece belongs to the side to move.
    pub fn get_legal_moves(&mut self, square: Square) -> BTreeSet<Square> {
        match self.board.get_piece(square) {
            Some(piece) if piece.color == self.turn => {}
            _ => return BTreeSet::new(),
        }

        let board = &mut self.board;
        board
            .get_moves(square, true)
            .into_iter()
            .filter(|&to| board.is_move_safe(square, to))
            .collect()
    }

    /// Every legal `(from, to)` pair for the side to move.
    pub fn all_legal_moves(&mut self) -> Vec<Move> {
        let turn = self.turn;
        let origins: Vec<Square> = self
            .board
            .pieces()
            .filter(|(_, p)| p.color == turn)
            .map(|(sq, _)| sq)
            .collect();

        let mut moves = Vec::new();
        for from in origins {
            moves.extend(
                self.get_legal_moves(from)
                    .into_iter()
                    .map(|to| Move::new(from, to)),
            );
        }
        moves
    }

    /// Apply a move if it is legal. Returns false and leaves the game
    /// untouched otherwise.
    pub fn make_move(&mut self, start: Square, end: Square) -> bool {
        self.try_move(start, end).is_ok()
    }

    pub fn try_move(&mut self, start: Square, end: Square) -> Result<MoveOutcome, MoveError> {
        let Some(piece) = self.board.get_piece(start) else {
            warn!("attempted to move a non-existent piece at {start:?}");
            return Err(MoveError::NoPiece(start));
        };
        if piece.color != self.turn {
            warn!("{} piece at {start:?} moved on {}'s turn", piece.color, self.turn);
            return Err(MoveError::WrongTurn {
                square: start,
                owner: piece.color,
                turn: self.turn,
            });
        }
        if !self.get_legal_moves(start).contains(&end) {
            warn!("illegal move attempted from {start:?} to {end:?}");
            return Err(MoveError::Illegal {
                from: start,
                to: end,
            });
        }

        let mv = Move::new(start, end);
        debug!("{} {} {mv}", piece.color, piece.kind.name());
        let special = self.apply_special_moves(mv, piece);
        self.last_move = Some(mv);
        self.ply += 1;
        self.turn = piece.color.opposite();
        let status = self.update_game_status(piece.color);

        Ok(MoveOutcome {
            mv,
            special,
            status,
        })
    }

    /// Mutate the board for `mv`, including any conversion, rook hop or
    /// promotion it triggers.
    fn apply_special_moves(&mut self, mv: Move, piece: Piece) -> Option<Special> {
        if piece.kind == PieceKind::Spy {
            if let Some(target) = self.board.get_piece(mv.to) {
                if target.color != piece.color {
                    info!("spy converted {} at {:?}", target.kind.name(), mv.to);
                    self.board.move_piece(mv.from, mv.to, true);
                    self.board.set_piece(mv.from, None);
                    return Some(Special::Conversion);
                }
            }
        }

        self.board.move_piece(mv.from, mv.to, false);

        if piece.kind == PieceKind::King && mv.col_delta().abs() == 2 {
            let row = mv.from.0;
            let (side, rook_from, rook_to) = if mv.col_delta() > 0 {
                (CastleSide::Kingside, (row, self.board.cols - 1), (row, mv.to.1 - 1))
            } else {
                (CastleSide::Queenside, (row, 0), (row, mv.to.1 + 1))
            };
            info!("{side:?} castling from {:?} to {:?}", mv.from, mv.to);
            self.board.move_piece(rook_from, rook_to, false);
            return Some(Special::Castle(side));
        }

        if piece.kind == PieceKind::Pawn && (mv.to.0 == 0 || mv.to.0 == self.board.rows - 1) {
            info!("pawn promoted to queen at {:?}", mv.to);
            let mut queen = Piece::new(PieceKind::Queen, piece.color);
            queen.has_moved = true;
            self.board.set_piece(mv.to, Some(queen));
            return Some(Special::Promotion);
        }

        None
    }

    /// Runs after the turn has passed to the opponent.
    fn update_game_status(&mut self, mover: Color) -> Status {
        let opponent = mover.opposite();
        let mut status = Status::Ongoing;

        if !self.board.has_legal_moves(opponent) {
            if self.board.is_in_check(opponent) {
                info!("{mover} wins by checkmate");
                self.game_over = true;
                self.result = Some(GameResult::Win(mover));
                status = Status::Checkmate;
            } else {
                // Stalemate does not end the game here: the stuck side
                // forfeits its turn.
                info!("{opponent} has no legal moves, {mover} moves again");
                self.turn = mover;
                status = Status::TurnSkipped;
            }
        } else if self.board.is_in_check(opponent) {
            status = Status::Check;
        }

        let count = self
            .position_counts
            .entry(self.board.position_key())
            .or_insert(0);
        *count += 1;
        if *count >= self.config.repetition_limit && !self.game_over {
            info!("position repeated {count} times, game drawn");
            self.game_over = true;
            self.result = Some(GameResult::Draw);
            status = Status::DrawByRepetition;
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use proptest::prelude::*;

    fn place(board: &mut Board, sq: Square, kind: PieceKind, color: Color) {
        board.set_piece(sq, Some(Piece::new(kind, color)));
    }

    #[test]
    fn new_game_starts_with_white() {
        let state = GameState::new();
        assert_eq!(state.turn, Color::White);
        assert!(!state.game_over);
        assert_eq!(state.result, None);
        assert_eq!(state.last_move, None);
        assert!(state.position_counts.is_empty());
        assert_eq!(state.board, Board::new(Layout::Classic));
    }

    #[test]
    fn legal_moves_are_empty_for_empty_or_enemy_squares() {
        let mut state = GameState::new();
        assert!(state.get_legal_moves((4, 4)).is_empty());
        assert!(state.get_legal_moves((1, 0)).is_empty());
        assert!(state.get_legal_moves((20, 20)).is_empty());
        assert!(!state.get_legal_moves((6, 0)).is_empty());
    }

    #[test]
    fn opening_moves_for_knight_include_the_orthogonal_jump() {
        let mut state = GameState::new();
        let moves = state.get_legal_moves((7, 6));
        let expected: BTreeSet<Square> = [(5, 5), (5, 6)].into_iter().collect();
        assert_eq!(moves, expected);
    }

    #[test]
    fn pinned_piece_stays_on_the_pin_line() {
        let mut board = Board::empty(8, 8);
        place(&mut board, (7, 4), PieceKind::King, Color::White);
        place(&mut board, (6, 4), PieceKind::Rook, Color::White);
        place(&mut board, (0, 4), PieceKind::Rook, Color::Black);
        place(&mut board, (0, 0), PieceKind::King, Color::Black);
        let mut state = GameState::from_board(board, Color::White);
        let moves = state.get_legal_moves((6, 4));
        assert!(moves.iter().all(|&(_, c)| c == 4));
        assert!(moves.contains(&(0, 4)));
        assert!(!state.make_move((6, 4), (6, 0)));
    }

    #[test]
    fn rejected_moves_leave_the_game_untouched() {
        let mut state = GameState::new();
        let board = state.board.clone();

        assert_eq!(state.try_move((4, 4), (3, 4)), Err(MoveError::NoPiece((4, 4))));
        assert!(matches!(
            state.try_move((1, 0), (2, 0)),
            Err(MoveError::WrongTurn { turn: Color::White, .. })
        ));
        assert_eq!(
            state.try_move((7, 0), (5, 0)),
            Err(MoveError::Illegal { from: (7, 0), to: (5, 0) })
        );
        assert!(!state.make_move((7, 0), (5, 0)));

        assert_eq!(state.board, board);
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.ply, 0);
        assert_eq!(state.last_move, None);
        assert!(state.position_counts.is_empty());
    }

    #[test]
    fn successful_move_flips_turn_and_records_it() {
        let mut state = GameState::new();
        let outcome = state.try_move((6, 4), (4, 4)).unwrap();
        assert_eq!(outcome.status, Status::Ongoing);
        assert_eq!(outcome.special, None);
        assert_eq!(state.turn, Color::Black);
        assert_eq!(state.last_move, Some(Move::new((6, 4), (4, 4))));
        assert_eq!(state.ply, 1);
        assert_eq!(state.repetition_count(&state.board.position_key()), 1);
    }

    #[test]
    fn black_checkmates_with_the_queen() {
        let mut state = GameState::new();

        assert!(state.make_move((6, 5), (5, 5)));
        assert!(state.make_move((1, 4), (2, 4)));
        assert!(state.make_move((6, 6), (4, 6)));
        assert!(state.make_move((0, 5), (2, 3)));
        assert!(state.make_move((5, 7), (4, 7)));
        // Queen takes the h-pawn and checks along the opened diagonal.
        assert!(state.make_move((0, 3), (4, 7)));
        assert!(state.is_in_check());
        // The knight's orthogonal jump is the block.
        assert!(state.make_move((7, 6), (5, 6)));
        let outcome = state.try_move((4, 7), (5, 6)).unwrap();

        assert_eq!(outcome.status, Status::Checkmate);
        assert!(state.game_over);
        assert_eq!(state.result, Some(GameResult::Win(Color::Black)));
        assert_eq!(state.turn, Color::White);
    }

    #[test]
    fn threefold_repetition_draws() {
        let mut state = GameState::new();
        let shuffle = [
            ((7, 6), (5, 6)),
            ((0, 6), (2, 6)),
            ((5, 6), (7, 6)),
            ((2, 6), (0, 6)),
        ];

        for _ in 0..2 {
            for (from, to) in shuffle {
                assert!(state.make_move(from, to));
                assert!(!state.game_over);
            }
        }

        // The first position of the cycle now comes up a third time.
        let outcome = state.try_move((7, 6), (5, 6)).unwrap();
        assert_eq!(outcome.status, Status::DrawByRepetition);
        assert!(state.game_over);
        assert_eq!(state.result, Some(GameResult::Draw));

        // Finishing the cycle keeps the draw.
        for (from, to) in &shuffle[1..] {
            assert!(state.make_move(*from, *to));
        }
        assert_eq!(state.result, Some(GameResult::Draw));
    }

    #[test]
    fn configured_repetition_limit_is_honoured() {
        let config = GameConfig {
            repetition_limit: 2,
            ..GameConfig::default()
        };
        let mut state = GameState::with_config(config);
        for (from, to) in [((7, 6), (5, 6)), ((0, 6), (2, 6)), ((5, 6), (7, 6)), ((2, 6), (0, 6))] {
            assert!(state.make_move(from, to));
        }
        assert!(!state.game_over);
        assert!(state.make_move((7, 6), (5, 6)));
        assert_eq!(state.result, Some(GameResult::Draw));
    }

    #[test]
    fn bishop_cannot_capture_queen() {
        let mut state = GameState::new();
        place(&mut state.board, (3, 3), PieceKind::Bishop, Color::White);
        place(&mut state.board, (4, 4), PieceKind::Queen, Color::Black);
        assert!(!state.get_legal_moves((3, 3)).contains(&(4, 4)));
    }

    #[test]
    fn stalemate_skips_the_stuck_side() {
        let mut state = GameState::new();
        state.board.clear();
        place(&mut state.board, (0, 0), PieceKind::King, Color::Black);
        place(&mut state.board, (2, 0), PieceKind::King, Color::White);
        place(&mut state.board, (1, 2), PieceKind::Queen, Color::White);

        let outcome = state.try_move((2, 0), (2, 1)).unwrap();

        assert_eq!(outcome.status, Status::TurnSkipped);
        assert_eq!(state.turn, Color::White);
        assert!(!state.game_over);
        assert_eq!(state.result, None);
    }

    #[test]
    fn spy_converts_instead_of_capturing() {
        let mut board = Board::empty(8, 8);
        place(&mut board, (7, 0), PieceKind::King, Color::White);
        place(&mut board, (0, 7), PieceKind::King, Color::Black);
        place(&mut board, (4, 4), PieceKind::Spy, Color::White);
        place(&mut board, (2, 5), PieceKind::Rook, Color::Black);
        let mut state = GameState::from_board(board, Color::White);

        let outcome = state.try_move((4, 4), (2, 5)).unwrap();

        assert_eq!(outcome.special, Some(Special::Conversion));
        assert_eq!(state.board.get_piece((4, 4)), None);
        let converted = state.board.get_piece((2, 5)).unwrap();
        assert_eq!((converted.kind, converted.color), (PieceKind::Rook, Color::White));
        assert_eq!(state.board.pieces().count(), 3);
    }

    #[test]
    fn spy_relocates_onto_empty_squares() {
        let mut state = GameState::new();
        assert!(state.make_move((6, 7), (4, 6)));
        assert_eq!(state.board.get_piece((6, 7)), None);
        assert_eq!(state.board.get_piece((4, 6)).map(|p| p.kind), Some(PieceKind::Spy));
    }

    #[test]
    fn castling_hops_the_rook_beside_the_king() {
        let mut state = GameState::new();
        for col in [5, 6] {
            state.board.set_piece((7, col), None);
        }
        let outcome = state.try_move((7, 4), (7, 6)).unwrap();
        assert_eq!(outcome.special, Some(Special::Castle(CastleSide::Kingside)));
        assert_eq!(state.board.get_piece((7, 6)).map(|p| p.kind), Some(PieceKind::King));
        assert_eq!(state.board.get_piece((7, 5)).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(state.board.get_piece((7, 7)), None);

        let mut state = GameState::new();
        for col in 1..4 {
            state.board.set_piece((7, col), None);
        }
        let outcome = state.try_move((7, 4), (7, 2)).unwrap();
        assert_eq!(outcome.special, Some(Special::Castle(CastleSide::Queenside)));
        assert_eq!(state.board.get_piece((7, 3)).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(state.board.get_piece((7, 0)), None);
    }

    #[test]
    fn wide_layout_castles_with_the_ninth_file_rook() {
        let mut state = GameState::with_config(GameConfig {
            layout: Layout::Wide,
            ..GameConfig::default()
        });
        for col in 5..8 {
            state.board.set_piece((7, col), None);
        }
        assert!(state.make_move((7, 4), (7, 6)));
        assert_eq!(state.board.get_piece((7, 5)).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(state.board.get_piece((7, 8)), None);
    }

    #[test]
    fn pawns_promote_on_the_far_rank() {
        let mut board = Board::empty(8, 8);
        place(&mut board, (7, 0), PieceKind::King, Color::White);
        place(&mut board, (3, 7), PieceKind::King, Color::Black);
        place(&mut board, (1, 3), PieceKind::Pawn, Color::White);
        place(&mut board, (6, 5), PieceKind::Pawn, Color::Black);
        let mut state = GameState::from_board(board, Color::White);

        let outcome = state.try_move((1, 3), (0, 3)).unwrap();
        assert_eq!(outcome.special, Some(Special::Promotion));
        let queen = state.board.get_piece((0, 3)).unwrap();
        assert_eq!((queen.kind, queen.color), (PieceKind::Queen, Color::White));

        assert_eq!(state.turn, Color::Black);
        assert!(state.make_move((6, 5), (7, 6)));
        assert_eq!(state.board.get_piece((7, 6)).map(|p| (p.kind, p.color)), Some((PieceKind::Queen, Color::Black)));
    }

    #[test]
    fn reset_returns_to_a_fresh_game() {
        let mut state = GameState::with_config(GameConfig {
            layout: Layout::Wide,
            ..GameConfig::default()
        });
        assert!(state.make_move((6, 0), (5, 0)));
        state.reset();
        assert_eq!(state.board, Board::new(Layout::Wide));
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.ply, 0);
        assert_eq!(state.last_move, None);
        assert!(state.position_counts.is_empty());
    }

    #[test]
    fn all_legal_moves_cover_every_piece_of_the_side_to_move() {
        let mut state = GameState::new();
        let moves = state.all_legal_moves();
        assert!(moves.iter().all(|m| state.board.get_piece(m.from).map(|p| p.color) == Some(Color::White)));
        assert!(moves.contains(&Move::new((7, 1), (5, 1))));
        assert!(moves.contains(&Move::new((6, 0), (4, 0))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn random_playouts_only_make_safe_legal_moves(choices in prop::collection::vec(any::<usize>(), 1..40)) {
            let mut state = GameState::new();
            for choice in choices {
                if state.game_over {
                    break;
                }
                let before = state.board.clone();
                let moves = state.all_legal_moves();
                prop_assert_eq!(&state.board, &before);
                for m in &moves {
                    prop_assert!(state.board.get_moves(m.from, true).contains(&m.to));
                }
                if moves.is_empty() {
                    break;
                }
                let mv = moves[choice % moves.len()];
                let mover = state.turn;
                prop_assert!(state.make_move(mv.from, mv.to));
                prop_assert!(!state.board.is_in_check(mover));
            }
        }
    }
}
