use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Layout;
use crate::moves::Square;
use crate::piece::{Color, Piece, PieceKind};

const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

/// Extra reach of the knight in this variant: exactly two squares orthogonally.
const ORTHOGONAL_JUMPS: [(i32, i32); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];

const KING_STEPS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const STRAIGHTS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop, PieceKind::Queen,
    PieceKind::King, PieceKind::Bishop, PieceKind::Knight, PieceKind::Rook,
];

const WIDE_BACK_RANK: [PieceKind; 9] = [
    PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop, PieceKind::Queen,
    PieceKind::King, PieceKind::Spy, PieceKind::Bishop, PieceKind::Knight,
    PieceKind::Rook,
];

/// The grid of pieces. Knows nothing about whose turn it is; all move
/// generation here is pseudo-legal unless stated otherwise.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Board {
    pub rows: usize,
    pub cols: usize,
    pub squares: Vec<Vec<Option<Piece>>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Layout::Classic)
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Board {
            rows,
            cols,
            squares: vec![vec![None; cols]; rows],
        }
    }

    pub fn new(layout: Layout) -> Self {
        let (rows, cols) = layout.dimensions();
        let mut board = Board::empty(rows, cols);
        let (black_back, black_pawns) = (0, 1);
        let (white_back, white_pawns) = (rows - 1, rows - 2);

        match layout {
            Layout::Classic => {
                for (col, &kind) in BACK_RANK.iter().enumerate() {
                    board.squares[black_back][col] = Some(Piece::new(kind, Color::Black));
                    board.squares[white_back][col] = Some(Piece::new(kind, Color::White));
                }
                // The h-file pawns give up their squares to the spies and
                // stand one rank further forward.
                let spy_col = cols - 1;
                for col in 0..spy_col {
                    board.squares[black_pawns][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
                    board.squares[white_pawns][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
                }
                board.squares[black_pawns + 1][spy_col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
                board.squares[white_pawns - 1][spy_col] = Some(Piece::new(PieceKind::Pawn, Color::White));
                board.squares[black_pawns][spy_col] = Some(Piece::new(PieceKind::Spy, Color::Black));
                board.squares[white_pawns][spy_col] = Some(Piece::new(PieceKind::Spy, Color::White));
            }
            Layout::Wide => {
                for (col, &kind) in WIDE_BACK_RANK.iter().enumerate() {
                    board.squares[black_back][col] = Some(Piece::new(kind, Color::Black));
                    board.squares[white_back][col] = Some(Piece::new(kind, Color::White));
                }
                for col in 0..cols {
                    board.squares[black_pawns][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
                    board.squares[white_pawns][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
                }
            }
        }
        board
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        (0..self.rows as i32).contains(&row) && (0..self.cols as i32).contains(&col)
    }

    fn offset(&self, (row, col): Square, dr: i32, dc: i32) -> Option<Square> {
        let r = row as i32 + dr;
        let c = col as i32 + dc;
        if self.in_bounds(r, c) {
            Some((r as usize, c as usize))
        } else {
            None
        }
    }

    /// Bounds-checked lookup; anything off the board is simply empty.
    pub fn get_piece(&self, (row, col): Square) -> Option<Piece> {
        self.squares.get(row)?.get(col).copied().flatten()
    }

    /// Overwrites a square. Writes outside the board are ignored.
    pub fn set_piece(&mut self, (row, col): Square, piece: Option<Piece>) {
        if let Some(cell) = self.squares.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = piece;
        }
    }

    pub fn clear(&mut self) {
        for row in &mut self.squares {
            row.fill(None);
        }
    }

    /// Every occupied square in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, sq)| sq.map(|p| ((r, c), p)))
        })
    }

    fn squares_of(&self, color: Color) -> Vec<Square> {
        self.pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, _)| sq)
            .collect()
    }

    /// Relocate the piece on `start` to `end`, capturing whatever stood there.
    /// With `convert` set nothing moves: the piece on `end` takes the color of
    /// the piece on `start` instead.
    pub fn move_piece(&mut self, start: Square, end: Square, convert: bool) {
        let Some(mut piece) = self.get_piece(start) else {
            return;
        };
        if convert {
            if let Some(mut target) = self.get_piece(end) {
                target.color = piece.color;
                self.set_piece(end, Some(target));
            }
        } else {
            piece.has_moved = true;
            self.set_piece(end, Some(piece));
            self.set_piece(start, None);
        }
    }

    /// Pseudo-legal destinations for the piece on `square`. Castling is only
    /// considered when `check_castling` is set, which keeps attack detection
    /// from recursing through the castling safety test.
    pub fn get_moves(&self, square: Square, check_castling: bool) -> BTreeSet<Square> {
        let mut moves = BTreeSet::new();
        let Some(piece) = self.get_piece(square) else {
            return moves;
        };

        match piece.kind {
            PieceKind::Pawn => self.generate_pawn_moves(square, piece, &mut moves),
            PieceKind::Knight => {
                self.generate_jumps(square, piece, &KNIGHT_JUMPS, &mut moves);
                self.generate_jumps(square, piece, &ORTHOGONAL_JUMPS, &mut moves);
            }
            PieceKind::Spy => self.generate_jumps(square, piece, &KNIGHT_JUMPS, &mut moves),
            PieceKind::Bishop => self.generate_bishop_moves(square, piece, &mut moves),
            PieceKind::Rook => self.generate_sliding_moves(square, piece, &STRAIGHTS, &mut moves),
            PieceKind::Queen => {
                self.generate_sliding_moves(square, piece, &DIAGONALS, &mut moves);
                self.generate_sliding_moves(square, piece, &STRAIGHTS, &mut moves);
            }
            PieceKind::King => {
                self.generate_jumps(square, piece, &KING_STEPS, &mut moves);
                if check_castling && !piece.has_moved {
                    self.generate_castling_moves(square, piece, &mut moves);
                }
            }
        }

        moves
    }

    fn can_land(&self, square: Square, color: Color) -> bool {
        self.get_piece(square).map_or(true, |p| p.color != color)
    }

    fn pawn_start_row(&self, color: Color) -> usize {
        match color {
            Color::White => self.rows.saturating_sub(2),
            Color::Black => 1,
        }
    }

    fn generate_pawn_moves(&self, square: Square, piece: Piece, moves: &mut BTreeSet<Square>) {
        let dir = piece.color.forward();

        // Diagonals are not capture-only in this variant, and the straight
        // step may capture too.
        for dc in -1..=1 {
            if let Some(to) = self.offset(square, dir, dc) {
                if self.can_land(to, piece.color) {
                    moves.insert(to);
                }
            }
        }

        if square.0 == self.pawn_start_row(piece.color) {
            let one = self.offset(square, dir, 0);
            let two = self.offset(square, 2 * dir, 0);
            if let (Some(one), Some(two)) = (one, two) {
                if self.get_piece(one).is_none() && self.get_piece(two).is_none() {
                    moves.insert(two);
                }
            }
        }
    }

    fn generate_jumps(
        &self,
        square: Square,
        piece: Piece,
        offsets: &[(i32, i32)],
        moves: &mut BTreeSet<Square>,
    ) {
        for &(dr, dc) in offsets {
            if let Some(to) = self.offset(square, dr, dc) {
                if self.can_land(to, piece.color) {
                    moves.insert(to);
                }
            }
        }
    }

    fn generate_sliding_moves(
        &self,
        square: Square,
        piece: Piece,
        directions: &[(i32, i32)],
        moves: &mut BTreeSet<Square>,
    ) {
        for &(dr, dc) in directions {
            let mut current = square;
            while let Some(to) = self.offset(current, dr, dc) {
                if let Some(p) = self.get_piece(to) {
                    if p.color != piece.color {
                        moves.insert(to);
                    }
                    break;
                }
                moves.insert(to);
                current = to;
            }
        }
    }

    /// Bishops slide like usual but can never take an enemy queen.
    fn generate_bishop_moves(&self, square: Square, piece: Piece, moves: &mut BTreeSet<Square>) {
        let mut diagonal = BTreeSet::new();
        self.generate_sliding_moves(square, piece, &DIAGONALS, &mut diagonal);
        moves.extend(diagonal.into_iter().filter(|&to| {
            !matches!(
                self.get_piece(to),
                Some(p) if p.kind == PieceKind::Queen && p.color != piece.color
            )
        }));
    }

    fn is_castling_rook(&self, square: Square, color: Color) -> bool {
        self.get_piece(square)
            .map(|p| p.kind == PieceKind::Rook && p.color == color && !p.has_moved)
            .unwrap_or(false)
    }

    fn generate_castling_moves(&self, square: Square, king: Piece, moves: &mut BTreeSet<Square>) {
        let (row, col) = square;
        let enemy = king.color.opposite();

        if self.is_square_attacked(square, enemy) {
            return;
        }

        // Kingside: rook on the last file, king lands two to the right.
        let rook_col = self.cols - 1;
        if col + 2 < rook_col
            && self.is_castling_rook((row, rook_col), king.color)
            && (col + 1..rook_col).all(|c| self.squares[row][c].is_none())
            && !self.is_square_attacked((row, col + 1), enemy)
            && !self.is_square_attacked((row, col + 2), enemy)
        {
            moves.insert((row, col + 2));
        }

        // Queenside: rook on the first file, king lands two to the left.
        if col >= 3
            && self.is_castling_rook((row, 0), king.color)
            && (1..col).all(|c| self.squares[row][c].is_none())
            && !self.is_square_attacked((row, col - 1), enemy)
            && !self.is_square_attacked((row, col - 2), enemy)
        {
            moves.insert((row, col - 2));
        }
    }

    /// True if any piece of `attacker` could move onto `square`.
    pub fn is_square_attacked(&self, square: Square, attacker: Color) -> bool {
        self.pieces()
            .filter(|(_, p)| p.color == attacker)
            .any(|(from, _)| self.get_moves(from, false).contains(&square))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// A side without a king is never in check.
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.is_square_attacked(king, color.opposite()),
            None => false,
        }
    }

    /// Try `from -> to` as a plain relocation, test whether the mover's king
    /// is attacked, then put both squares back exactly as they were.
    pub fn is_move_safe(&mut self, from: Square, to: Square) -> bool {
        let Some(piece) = self.get_piece(from) else {
            return false;
        };
        if !self.in_bounds(to.0 as i32, to.1 as i32) || from == to {
            return false;
        }

        let captured = self.squares[to.0][to.1];
        self.squares[to.0][to.1] = Some(piece);
        self.squares[from.0][from.1] = None;

        let safe = !self.is_in_check(piece.color);

        self.squares[from.0][from.1] = Some(piece);
        self.squares[to.0][to.1] = captured;
        safe
    }

    pub fn has_legal_moves(&mut self, color: Color) -> bool {
        for from in self.squares_of(color) {
            for to in self.get_moves(from, true) {
                if self.is_move_safe(from, to) {
                    return true;
                }
            }
        }
        false
    }

    /// Repetition key: every occupied square as `row,col,Kind,is_white`,
    /// sorted and joined. Castling rights and move flags are ignored.
    pub fn position_key(&self) -> String {
        let mut entries: Vec<String> = self
            .pieces()
            .map(|((r, c), p)| format!("{r},{c},{},{}", p.kind.name(), p.color.is_white()))
            .collect();
        entries.sort();
        entries.join(";")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.squares {
            let line: Vec<String> = row
                .iter()
                .map(|sq| sq.map_or('.', |p| p.symbol()).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
