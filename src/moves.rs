use crate::board::{Board, Color, Coordinate, Piece, PieceType, HEIGHT, WIDTH};

const STRAIGHT: [[i8; 2]; 4] = [[1, 0], [-1, 0], [0, 1], [0, -1]];
const DIAGONAL: [[i8; 2]; 4] = [[1, 1], [-1, 1], [-1, -1], [1, -1]];
const KNIGHT_JUMPS: [[i8; 2]; 8] = [
    [2, 1], [1, 2], [-1, 2], [-2, 1],
    [-2, -1], [-1, -2], [1, -2], [2, -1],
];

fn shift(from: Coordinate, vec: &[i8; 2]) -> Option<Coordinate> {
    let n_row = from.0 as i8 + vec[0];
    let n_col = from.1 as i8 + vec[1];
    (n_row >= 0 && n_row < HEIGHT as i8 && n_col >= 0 && n_col < WIDTH as i8)
        .then_some((n_row as usize, n_col as usize))
}

fn move_by_vector(board: &Board, vec: &[i8; 2], from: Coordinate, current_color: &Color) -> Vec<Coordinate> {
    let mut result: Vec<Coordinate> = Vec::new();
    let mut current = from;
    while let Some((row, col)) = shift(current, vec) {
        match board.squares[row][col] {
            None => result.push((row, col)),
            Some(other) => {
                if other.color != *current_color {
                    result.push((row, col));
                }
                break
            }
        }
        current = (row, col);
    }
    result
}

fn move_by_rays(board: &Board, piece: &Piece, rays: &[[i8; 2]]) -> Vec<Coordinate> {
    rays.iter()
        .flat_map(|vec| move_by_vector(board, vec, piece.position, &piece.color))
        .collect()
}

/// Single steps, each landing on an empty or enemy square.
fn move_by_steps(board: &Board, piece: &Piece, steps: &[[i8; 2]]) -> Vec<Coordinate> {
    steps.iter()
        .filter_map(|vec| shift(piece.position, vec))
        .filter(|&(r, c)| board.squares[r][c].map_or(true, |other| other.color != piece.color))
        .collect()
}

fn pawn_moves(board: &Board, piece: &Piece) -> Vec<Coordinate> {
    let direction = piece.color.pawn_direction();
    let mut result: Vec<Coordinate> = Vec::new();

    if let Some(one) = shift(piece.position, &[direction, 0]) {
        if board.squares[one.0][one.1].is_none() {
            result.push(one);
            if piece.position.0 == piece.color.pawn_start_rank() {
                if let Some(two) = shift(one, &[direction, 0]) {
                    if board.squares[two.0][two.1].is_none() {
                        result.push(two);
                    }
                }
            }
        }
    }

    let captures = [[direction, -1], [direction, 1]].into_iter()
        .filter_map(|vec| shift(piece.position, &vec))
        .filter(|&(r, c)| board.squares[r][c].is_some_and(|other| other.color != piece.color));
    result.extend(captures);
    result
}

/// Squares `piece` may move to on `board` under the simplified rules: no check
/// detection, castling or en passant. Order is ray order, then offset order.
pub fn legal_moves(piece: &Piece, board: &Board) -> Vec<Coordinate> {
    match piece.kind {
        PieceType::Rook => move_by_rays(board, piece, &STRAIGHT),
        PieceType::Bishop => move_by_rays(board, piece, &DIAGONAL),
        PieceType::Queen => move_by_rays(board, piece, &[STRAIGHT, DIAGONAL].concat()),
        PieceType::Knight => move_by_steps(board, piece, &KNIGHT_JUMPS),
        PieceType::King => move_by_steps(board, piece, &[STRAIGHT, DIAGONAL].concat()),
        PieceType::Pawn => pawn_moves(board, piece),
    }
}
