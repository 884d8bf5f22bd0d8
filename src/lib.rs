//! Game state engine for a simplified two-player chess variant: pseudo-legal
//! move generation, capture and promotion, a "king captured" end condition and
//! a linear undo/redo history.

pub mod board;
pub mod moves;
pub mod history;
pub mod game;
pub mod communication_protocol;
pub mod game_server;

pub use board::{Board, BoardError, Color, Coordinate, Piece, PieceType};
pub use game::GameState;
