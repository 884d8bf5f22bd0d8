use serde::Serializer;
use crate::board::Color::{Black, White};

pub const WIDTH: usize = 8;
pub const HEIGHT: usize = 8;

/// `(row, col)`, row 0 being Black's back rank.
pub type Coordinate = (usize, usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    pub fn is_promotion_target(&self) -> bool {
        matches!(self, PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Color {
    White, Black
}

impl Color {
    pub fn opposite(&self) -> Color {
        if self == &Color::White {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Row delta of a single pawn step.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            White => -1,
            Black => 1,
        }
    }

    pub fn pawn_start_rank(&self) -> usize {
        match self {
            White => HEIGHT - 2,
            Black => 1,
        }
    }

    /// The opponent's back rank.
    pub fn promotion_rank(&self) -> usize {
        match self {
            White => 0,
            Black => HEIGHT - 1,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Square ({row}, {col}) is outside the board")]
    OutOfRange { row: usize, col: usize },
    #[error("Cannot parse board: {0}")]
    Parse(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
    pub position: Coordinate,
}

impl Piece {
    pub fn new(color: Color, kind: PieceType, position: Coordinate) -> Self {
        Piece { color, kind, position }
    }

    /// The same piece standing on `position`. The original value is left untouched.
    pub fn moved_to(&self, position: Coordinate) -> Piece {
        Piece { position, ..*self }
    }

    pub fn promoted_to(&self, kind: PieceType) -> Piece {
        Piece { kind, ..*self }
    }

    fn icon(&self) -> char {
        let icon = match self.kind {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Pawn => 'p',
        };
        if self.color == White { icon.to_ascii_uppercase() } else { icon }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) squares: [[Option<Piece>; WIDTH]; HEIGHT],
}

fn check_bounds((row, col): Coordinate) -> Result<(), BoardError> {
    if row < HEIGHT && col < WIDTH {
        Ok(())
    } else {
        Err(BoardError::OutOfRange { row, col })
    }
}

impl Board {
    pub fn at(&self, square: Coordinate) -> Result<Option<Piece>, BoardError> {
        check_bounds(square)?;
        Ok(self.squares[square.0][square.1])
    }

    /// Puts `piece` on its own position and returns whatever stood there before.
    pub fn place(&mut self, piece: Piece) -> Result<Option<Piece>, BoardError> {
        let (row, col) = piece.position;
        check_bounds(piece.position)?;
        Ok(self.squares[row][col].replace(piece))
    }

    pub fn clear(&mut self, square: Coordinate) -> Result<Option<Piece>, BoardError> {
        check_bounds(square)?;
        Ok(self.squares[square.0][square.1].take())
    }

    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.squares.iter().flatten().flatten().copied()
    }

    pub fn count(&self, kind: PieceType) -> usize {
        self.pieces().filter(|p| p.kind == kind).count()
    }
}

pub fn to_string(board: &Board) -> String {
    board.squares.iter()
        .map(|row| row.iter()
            .map(|square| square.map_or(' ', |p| p.icon()))
            .collect::<String>())
        .collect::<Vec<String>>()
        .join("\n")
}

/// Reads the layout produced by [`to_string`]: eight lines of eight characters,
/// upper case for White, lower case for Black, space for an empty square.
pub fn parse_board(text: &str) -> Result<Board, BoardError> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() != HEIGHT {
        return Err(BoardError::Parse(format!("expected {} rows, found {}", HEIGHT, lines.len())));
    }
    let mut board = empty_board();
    for (row, line) in lines.iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() != WIDTH {
            return Err(BoardError::Parse(format!("row {} has {} squares", row, chars.len())));
        }
        for (col, c) in chars.into_iter().enumerate() {
            if c == ' ' {
                continue;
            }
            let kind = match c.to_ascii_lowercase() {
                'k' => PieceType::King,
                'q' => PieceType::Queen,
                'r' => PieceType::Rook,
                'b' => PieceType::Bishop,
                'n' => PieceType::Knight,
                'p' => PieceType::Pawn,
                x => return Err(BoardError::Parse(format!("unknown piece '{}' at ({}, {})", x, row, col))),
            };
            let color = if c.is_ascii_uppercase() { White } else { Black };
            board.squares[row][col] = Some(Piece::new(color, kind, (row, col)));
        }
    }
    Ok(board)
}

impl serde::Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str(to_string(self).as_str())
    }
}

fn new_pieces(color: Color, row: usize) -> [Option<Piece>; WIDTH] {
    let kinds = [
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Rook,
    ];
    let mut rank = [None; WIDTH];
    for (col, kind) in kinds.into_iter().enumerate() {
        rank[col] = Some(Piece::new(color, kind, (row, col)));
    }
    rank
}

fn new_pawns(color: Color, row: usize) -> [Option<Piece>; WIDTH] {
    let mut rank = [None; WIDTH];
    for (col, square) in rank.iter_mut().enumerate() {
        *square = Some(Piece::new(color, PieceType::Pawn, (row, col)));
    }
    rank
}

fn new_empty() -> [Option<Piece>; WIDTH] {
    [None; WIDTH]
}

pub fn empty_board() -> Board {
    Board { squares: [new_empty(); HEIGHT] }
}

pub fn new_board() -> Board {
    let squares = [
        new_pieces(Color::Black, 0),
        new_pawns(Color::Black, 1),
        new_empty(),
        new_empty(),
        new_empty(),
        new_empty(),
        new_pawns(Color::White, 6),
        new_pieces(Color::White, 7),
    ];
    Board { squares }
}
