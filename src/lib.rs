// src/lib.rs
//
// A deliberately small chess rules engine: board state, per-piece move
// legality with path tracing, check/checkmate evaluation, and a move history
// supporting single-step undo. The caller (see src/main.rs for a text-mode
// driver) owns turn orchestration and game-over flagging; the engine only
// exposes the primitives and never errors over its documented input domain.
//
// Rule set caveats, kept on purpose: no en passant, no castling, no
// promotion, no stalemate or draw detection. A move that leaves the mover's
// own king in check is legal; check status is a report to the caller, not a
// constraint. Capturing a king ends the game on the spot, independently of
// the checkmate logic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use lazy_static::lazy_static;

// --- Constants ---
pub const BOARD_SIZE: i8 = 8;

const WHITE_HOME_RANK: i8 = 1;
const BLACK_HOME_RANK: i8 = 6;

/// The knight's eight leap offsets as (file delta, rank delta).
const KNIGHT_LEAPS: [(i8, i8); 8] = [
    (2, 1), (2, -1), (-2, 1), (-2, -1),
    (1, 2), (1, -2), (-1, 2), (-1, -2),
];

// --- Enums and Basic Structs ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color { White, Black }

impl Color {
    pub fn opponent(&self) -> Color {
        match self { Color::White => Color::Black, Color::Black => Color::White }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind { Pawn, Rook, Knight, Bishop, Queen, King }

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self { Piece { kind, color } }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.kind {
            PieceKind::Pawn => 'p', PieceKind::Knight => 'n', PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r', PieceKind::Queen => 'q', PieceKind::King => 'k',
        };
        let symbol = match self.color {
            Color::White => symbol.to_ascii_uppercase(),
            Color::Black => symbol,
        };
        write!(f, "{}", symbol)
    }
}

/// A board square as a (file, rank) pair, each in [0, BOARD_SIZE).
/// File 0 is the a-file, rank 0 is White's back rank.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub file: i8,
    pub rank: i8,
}

impl Coord {
    pub fn new(file: i8, rank: i8) -> Self { Coord { file, rank } }

    pub fn in_bounds(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.file) && (0..BOARD_SIZE).contains(&self.rank)
    }

    /// Parses algebraic notation ("e4") into a coordinate.
    pub fn from_algebraic(s: &str) -> Option<Coord> {
        let mut chars = s.chars();
        let file_char = chars.next()?;
        let rank_char = chars.next()?;
        if chars.next().is_some() { return None; }
        let file = match file_char { 'a'..='h' => file_char as i8 - 'a' as i8, _ => return None };
        let rank = match rank_char { '1'..='8' => rank_char as i8 - '1' as i8, _ => return None };
        Some(Coord { file, rank })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.in_bounds() { return write!(f, "??"); }
        let file_char = (b'a' + self.file as u8) as char;
        let rank_char = (b'1' + self.rank as u8) as char;
        write!(f, "{}{}", file_char, rank_char)
    }
}

// --- Move Representation ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    pub fn new(from: Coord, to: Coord) -> Self { Move { from, to } }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Result of executing a move. `winner` is set only when the destination
/// held a king, which ends the game immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    pub captured: Option<Piece>,
    pub winner: Option<Color>,
}

// --- Piece Catalog ---

/// Geometric movement rule per piece kind. Static data; the legality
/// evaluator dispatches on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MovePattern {
    SlideOrthogonal,
    SlideDiagonal,
    SlideAny,
    SingleStep,
    Leap,
    PawnForward,
}

pub fn move_pattern(kind: PieceKind) -> MovePattern {
    match kind {
        PieceKind::Pawn => MovePattern::PawnForward,
        PieceKind::Rook => MovePattern::SlideOrthogonal,
        PieceKind::Knight => MovePattern::Leap,
        PieceKind::Bishop => MovePattern::SlideDiagonal,
        PieceKind::Queen => MovePattern::SlideAny,
        PieceKind::King => MovePattern::SingleStep,
    }
}

// --- Opening Layout ---

lazy_static! {
    /// Standard opening placement: White on ranks 0-1, Black on ranks 6-7,
    /// queens on file 3, kings on file 4.
    static ref OPENING_LAYOUT: Vec<(Coord, Piece)> = {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut layout = Vec::with_capacity(32);
        for file in 0..BOARD_SIZE {
            layout.push((Coord::new(file, 0), Piece::new(back_rank[file as usize], Color::White)));
            layout.push((Coord::new(file, 1), Piece::new(Pawn, Color::White)));
            layout.push((Coord::new(file, BLACK_HOME_RANK), Piece::new(Pawn, Color::Black)));
            layout.push((Coord::new(file, 7), Piece::new(back_rank[file as usize], Color::Black)));
        }
        layout
    };
}

// --- Board State ---

/// Occupancy mapping plus whose turn it is. A key is present only for an
/// occupied square; at most one piece per coordinate by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: HashMap<Coord, Piece>,
    pub turn: Color,
}

impl Board {
    /// A board in the standard opening layout, White to move.
    pub fn new() -> Self {
        Board {
            squares: OPENING_LAYOUT.iter().copied().collect(),
            turn: Color::White,
        }
    }

    /// An empty board, White to move. Useful for setting up positions.
    pub fn empty() -> Self {
        Board { squares: HashMap::new(), turn: Color::White }
    }

    pub fn piece_at(&self, coord: Coord) -> Option<Piece> {
        self.squares.get(&coord).copied()
    }

    pub fn place(&mut self, coord: Coord, piece: Piece) {
        self.squares.insert(coord, piece);
    }

    pub fn remove(&mut self, coord: Coord) -> Option<Piece> {
        self.squares.remove(&coord)
    }

    pub fn piece_count(&self) -> usize {
        self.squares.len()
    }

    /// Iterates over occupied squares in unspecified order.
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.squares.iter().map(|(&c, &p)| (c, p))
    }

    /// Finds the king of the given color. Returns None if it is missing.
    pub fn find_king(&self, color: Color) -> Option<Coord> {
        self.squares.iter()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(&c, _)| c)
    }

    pub fn toggle_turn(&mut self) {
        self.turn = self.turn.opponent();
    }
}

impl Default for Board {
    fn default() -> Self { Board::new() }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for rank in (0..BOARD_SIZE).rev() {
            write!(f, "{} | ", rank + 1)?;
            for file in 0..BOARD_SIZE {
                match self.piece_at(Coord::new(file, rank)) {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        writeln!(f, "    a b c d e f g h")?;
        write!(f, "Turn: {:?}", self.turn)
    }
}

// --- Move Legality Evaluator ---

/// Decides whether moving the piece on `from` to `to` is legal for its kind,
/// the current occupancy, and path constraints. Total over all inputs:
/// a null move, an out-of-bounds destination, or an empty `from` square all
/// come back as `false`, never as a fault.
///
/// King safety is deliberately not consulted here; see `is_in_check`.
pub fn is_legal(board: &Board, from: Coord, to: Coord) -> bool {
    if from == to { return false; }
    if !to.in_bounds() { return false; }
    let piece = match board.piece_at(from) {
        Some(p) => p,
        None => return false,
    };

    let df = to.file - from.file;
    let dr = to.rank - from.rank;

    match move_pattern(piece.kind) {
        MovePattern::PawnForward => pawn_legal(board, piece.color, from, to, df, dr),
        MovePattern::SlideOrthogonal => (df == 0 || dr == 0) && clear_path(board, from, to),
        MovePattern::SlideDiagonal => df.abs() == dr.abs() && clear_path(board, from, to),
        MovePattern::SlideAny => {
            (df == 0 || dr == 0 || df.abs() == dr.abs()) && clear_path(board, from, to)
        }
        MovePattern::SingleStep => df.abs() <= 1 && dr.abs() <= 1,
        MovePattern::Leap => KNIGHT_LEAPS.contains(&(df, dr)),
    }
}

fn pawn_legal(board: &Board, color: Color, from: Coord, to: Coord, df: i8, dr: i8) -> bool {
    let direction = if color == Color::White { 1 } else { -1 };
    let home_rank = if color == Color::White { WHITE_HOME_RANK } else { BLACK_HOME_RANK };

    if df == 0 {
        if dr == direction && board.piece_at(to).is_none() {
            return true;
        }
        // Two squares only from the home rank, with both the intermediate
        // square and the destination empty.
        if dr == 2 * direction
            && from.rank == home_rank
            && board.piece_at(to).is_none()
            && board.piece_at(Coord::new(from.file, from.rank + direction)).is_none()
        {
            return true;
        }
        false
    } else if df.abs() == 1 && dr == direction {
        // Diagonal step is a capture, nothing else.
        matches!(board.piece_at(to), Some(p) if p.color != color)
    } else {
        false
    }
}

/// Walks one square at a time from just past `from` toward `to`. Any occupied
/// square strictly before `to` blocks the path. The destination itself is
/// clear when empty or held by the other side (a capture).
///
/// Callers must pass squares aligned on a rank, file, or diagonal.
fn clear_path(board: &Board, from: Coord, to: Coord) -> bool {
    let step_file = (to.file - from.file).signum();
    let step_rank = (to.rank - from.rank).signum();

    let mut cur = Coord::new(from.file + step_file, from.rank + step_rank);
    while cur != to {
        if board.piece_at(cur).is_some() {
            return false;
        }
        cur = Coord::new(cur.file + step_file, cur.rank + step_rank);
    }

    match (board.piece_at(to), board.piece_at(from)) {
        (Some(occupant), Some(mover)) => occupant.color != mover.color,
        _ => true,
    }
}

// --- Check / Checkmate Evaluator ---

/// True iff some enemy piece has a legal move onto the king's square.
/// A missing king reads as "not in check" rather than a fault.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    let king_pos = match board.find_king(color) {
        Some(pos) => pos,
        None => return false,
    };
    board.pieces()
        .any(|(pos, piece)| piece.color != color && is_legal(board, pos, king_pos))
}

/// True iff `color` is in check and no legal move by `color` removes the
/// check. Each candidate is tried on a clone of the board, so the search can
/// never leak a provisional move into real game state.
pub fn is_checkmate(board: &Board, color: Color) -> bool {
    if !is_in_check(board, color) {
        return false;
    }

    let own_squares: Vec<Coord> = board.pieces()
        .filter(|(_, piece)| piece.color == color)
        .map(|(pos, _)| pos)
        .collect();

    for from in own_squares {
        for file in 0..BOARD_SIZE {
            for rank in 0..BOARD_SIZE {
                let to = Coord::new(file, rank);
                if !is_legal(board, from, to) {
                    continue;
                }
                let mut trial = board.clone();
                apply_move(&mut trial, Move::new(from, to));
                if !is_in_check(&trial, color) {
                    return false;
                }
            }
        }
    }
    true
}

// --- Move Executor ---

/// Executes a move on the board: removes any captured occupant and relocates
/// the moving piece. Turn is NOT toggled here; that is the caller's job.
///
/// If the destination holds a king the board is left untouched and the
/// outcome names the winner instead. An empty `from` square is a no-op.
pub fn apply_move(board: &mut Board, mv: Move) -> MoveOutcome {
    if board.piece_at(mv.from).is_none() {
        return MoveOutcome::default();
    }
    if let Some(occupant) = board.piece_at(mv.to) {
        if occupant.kind == PieceKind::King {
            return MoveOutcome { captured: None, winner: Some(occupant.color.opponent()) };
        }
    }
    let mover = match board.remove(mv.from) {
        Some(piece) => piece,
        None => return MoveOutcome::default(),
    };
    let captured = board.squares.insert(mv.to, mover);
    MoveOutcome { captured, winner: None }
}

// --- Game Session: Executor & History ---

/// The board/history pair owned by one game session. The history is an
/// append-only log of executed moves, most recent last, supporting
/// single-step undo. Reset wholesale on a new game.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    history: Vec<Move>,
}

impl Game {
    pub fn new() -> Self {
        Game { board: Board::new(), history: Vec::new() }
    }

    /// Wraps an arbitrary board position with an empty history.
    pub fn with_board(board: Board) -> Self {
        Game { board, history: Vec::new() }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Executes a move and records it. King capture ends the game without
    /// touching board or history; an empty origin square is a no-op.
    pub fn apply_move(&mut self, mv: Move) -> MoveOutcome {
        if self.board.piece_at(mv.from).is_none() {
            return MoveOutcome::default();
        }
        let outcome = apply_move(&mut self.board, mv);
        if outcome.winner.is_none() {
            self.history.push(mv);
        }
        outcome
    }

    /// Reverses the most recent move: the moved piece walks back and the turn
    /// toggles back. A piece captured by that move is NOT restored; undo after
    /// a capture loses the victim. Returns false on empty history.
    pub fn undo(&mut self) -> bool {
        let last = match self.history.pop() {
            Some(mv) => mv,
            None => return false,
        };
        if let Some(piece) = self.board.remove(last.to) {
            self.board.place(last.from, piece);
        }
        self.board.toggle_turn();
        true
    }

    /// Starts over: opening layout, White to move, empty history.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.history.clear();
    }

    /// Writes the game record (moves played plus the winner, if any) to a
    /// JSON file.
    pub fn save_record(&self, filename: &str, winner: Option<Color>) -> Result<(), SaveError> {
        let record = GameRecord { winner, moves: self.history.clone() };
        let json_data = serde_json::to_string_pretty(&record)
            .map_err(SaveError::Serialization)?;
        fs::write(filename, json_data)
            .map_err(|e| SaveError::Io(filename.to_string(), e))?;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self { Game::new() }
}

#[derive(Debug, Serialize)]
struct GameRecord {
    winner: Option<Color>,
    moves: Vec<Move>,
}

// --- Custom Error Types ---

#[derive(Debug)]
pub enum SaveError {
    Serialization(serde_json::Error),
    Io(String, io::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SaveError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}

impl Error for SaveError {}

// --- Tests ---
