use crate::board::{BoardError, Color, Coordinate, Piece, PieceType, to_string};
use crate::game::GameState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Deserialize)]
pub enum MsgType {
    Click, Select, Move, Promote, Undo, Redo, Reset, State
}

#[derive(Debug, serde::Deserialize)]
pub struct JsonMsg {
    pub msg_type: MsgType,
    pub square: Option<Coordinate>,
    pub promote_to: Option<PieceType>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub enum MsgTypeServer {
    State,
    Ignored,
    Error,
}

#[derive(Debug, serde::Serialize)]
pub struct JsonMsgServer {
    pub msg_type: MsgTypeServer,
    pub board: String,
    pub turn: Color,
    pub selected: Option<Piece>,
    pub legal_targets: Vec<Coordinate>,
    pub pending_promotion: Option<Piece>,
    pub is_over: bool,
    pub winner: Option<Color>,
    pub casualties: Vec<Piece>,
    pub error: Option<String>,
}

impl JsonMsgServer {
    pub fn from_game(msg_type: MsgTypeServer, game: &GameState) -> Self {
        JsonMsgServer {
            msg_type,
            board: to_string(game.board()),
            turn: game.turn(),
            selected: game.selected_piece(),
            legal_targets: game.legal_targets().to_vec(),
            pending_promotion: game.pending_promotion(),
            is_over: game.is_over(),
            winner: game.winner(),
            casualties: game.casualties().to_vec(),
            error: None,
        }
    }

    pub fn error(game: &GameState, error: &ProtocolError) -> Self {
        JsonMsgServer {
            error: Some(error.to_string()),
            ..JsonMsgServer::from_game(MsgTypeServer::Error, game)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Cannot decode message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0:?} message requires a square")]
    MissingSquare(MsgType),
    #[error("Promote message requires a piece type")]
    MissingPieceType,
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub fn decode(line: &str) -> Result<JsonMsg, ProtocolError> {
    Ok(serde_json::from_str(line)?)
}

impl JsonMsg {
    pub fn square(&self) -> Result<Coordinate, ProtocolError> {
        self.square.ok_or(ProtocolError::MissingSquare(self.msg_type))
    }
}
