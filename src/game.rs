use crate::board::{new_board, Board, BoardError, Color, Coordinate, Piece, PieceType};
use crate::history::{History, Snapshot};
use crate::moves::legal_moves;

/// A single game session: the board plus selection, promotion and undo/redo
/// bookkeeping. Every transition returns whether it changed anything; a
/// transition whose precondition fails leaves the state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    board: Board,
    turn: Color,
    selected_piece: Option<Piece>,
    legal_targets: Vec<Coordinate>,
    pending_promotion: Option<Piece>,
    is_over: bool,
    casualties: Vec<Piece>,
    history: History,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

fn apply_move(board: &Board, piece: Piece, target: Coordinate) -> Result<(Board, Option<Piece>), BoardError> {
    let mut new_board = *board;
    new_board.clear(piece.position)?;
    let captured = new_board.place(piece.moved_to(target))?;
    Ok((new_board, captured))
}

impl GameState {
    pub fn new() -> Self {
        GameState::with_position(new_board(), Color::White)
    }

    /// Starts a session from an arbitrary position. The game counts as over
    /// right away if fewer than two kings are on `board`.
    pub fn with_position(board: Board, turn: Color) -> Self {
        GameState {
            board,
            turn,
            selected_piece: None,
            legal_targets: Vec::new(),
            pending_promotion: None,
            is_over: board.count(PieceType::King) < 2,
            casualties: Vec::new(),
            history: History::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn selected_piece(&self) -> Option<Piece> {
        self.selected_piece
    }

    pub fn legal_targets(&self) -> &[Coordinate] {
        &self.legal_targets
    }

    pub fn pending_promotion(&self) -> Option<Piece> {
        self.pending_promotion
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn casualties(&self) -> &[Piece] {
        &self.casualties
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The side that still has a king once the game is over.
    pub fn winner(&self) -> Option<Color> {
        if !self.is_over {
            return None;
        }
        self.board.pieces()
            .find(|p| p.kind == PieceType::King)
            .map(|p| p.color)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            turn: self.turn,
            is_over: self.is_over,
            pending_promotion: self.pending_promotion,
            casualties: self.casualties.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.board = snapshot.board;
        self.turn = snapshot.turn;
        self.is_over = snapshot.is_over;
        self.pending_promotion = snapshot.pending_promotion;
        self.casualties = snapshot.casualties;
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.selected_piece = None;
        self.legal_targets.clear();
    }

    /// Selects `piece` and computes its targets. Selecting the already selected
    /// piece deselects it, `None` clears the selection.
    pub fn select(&mut self, piece: Option<Piece>) -> bool {
        if self.is_over {
            log::debug!("Game is over, ignoring selection");
            return false;
        }
        let Some(piece) = piece else {
            let changed = self.selected_piece.is_some();
            self.clear_selection();
            return changed;
        };
        if piece.color != self.turn {
            log::debug!("Ignoring {:?} {:?}, {:?} to play", piece.color, piece.kind, self.turn);
            return false;
        }
        if self.board.at(piece.position) != Ok(Some(piece)) {
            log::warn!("Ignoring stale piece {:?}", piece);
            return false;
        }
        if self.selected_piece == Some(piece) {
            self.clear_selection();
            return true;
        }
        self.selected_piece = Some(piece);
        self.legal_targets = legal_moves(&piece, &self.board);
        log::debug!("Selected {:?} at {:?}, targets: {:?}", piece.kind, piece.position, self.legal_targets);
        true
    }

    /// Moves the selected piece to `target`, which must be one of its legal targets.
    pub fn move_to(&mut self, target: Coordinate) -> bool {
        if self.is_over {
            log::debug!("Game is over, ignoring move");
            return false;
        }
        let Some(piece) = self.selected_piece else {
            log::debug!("No piece selected, ignoring move to {:?}", target);
            return false;
        };
        if !self.legal_targets.contains(&target) {
            log::debug!("{:?} is not a legal target for {:?}", target, piece);
            return false;
        }
        let (board, captured) = match apply_move(&self.board, piece, target) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Cannot apply move: {}", e);
                return false;
            }
        };

        self.history.record(self.snapshot());
        self.board = board;
        if let Some(casualty) = captured {
            log::info!("{:?} {:?} captured at {:?}", casualty.color, casualty.kind, target);
            self.casualties.push(casualty);
        }
        self.is_over = self.board.count(PieceType::King) < 2;
        self.pending_promotion = (piece.kind == PieceType::Pawn && target.0 == piece.color.promotion_rank())
            .then(|| piece.moved_to(target));
        self.clear_selection();
        self.turn = self.turn.opposite();
        if self.is_over {
            log::info!("Game over, {:?} won", self.winner());
        }
        true
    }

    /// Replaces the pawn waiting for promotion with `kind`.
    pub fn promote(&mut self, kind: PieceType) -> bool {
        let Some(pending) = self.pending_promotion else {
            log::debug!("No promotion pending");
            return false;
        };
        if !kind.is_promotion_target() {
            log::debug!("Cannot promote to {:?}", kind);
            return false;
        }
        let pawn = match self.board.at(pending.position) {
            Ok(Some(p)) if p.kind == PieceType::Pawn => p,
            _ => {
                log::warn!("No pawn left at {:?}, promotion ignored", pending.position);
                return false;
            }
        };
        let mut board = self.board;
        if let Err(e) = board.place(pawn.promoted_to(kind)) {
            log::warn!("Cannot promote: {}", e);
            return false;
        }

        self.history.record(self.snapshot());
        self.board = board;
        self.pending_promotion = None;
        log::info!("{:?} pawn promoted to {:?} at {:?}", pawn.color, kind, pawn.position);
        true
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            None => false,
            Some(previous) => {
                self.restore(previous);
                true
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            None => false,
            Some(next) => {
                self.restore(next);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        log::info!("Resetting game");
        *self = GameState::new();
    }

    /// Square click from a board view: moves the selection there when it is a
    /// legal target, otherwise selects whatever stands on the square.
    pub fn click(&mut self, square: Coordinate) -> Result<bool, BoardError> {
        let occupant = self.board.at(square)?;
        if self.selected_piece.is_some() && self.legal_targets.contains(&square) {
            return Ok(self.move_to(square));
        }
        Ok(self.select(occupant))
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use crate::board::{empty_board, new_board, parse_board, BoardError, Coordinate, Piece, PieceType};
    use crate::board::Color::{Black, White};
    use crate::game::GameState;

    fn piece_at(game: &GameState, square: Coordinate) -> Piece {
        game.board().at(square).unwrap().expect("Only occupied squares expected")
    }

    fn play(game: &mut GameState, from: Coordinate, to: Coordinate) {
        assert!(game.select(Some(piece_at(game, from))), "cannot select {:?}", from);
        assert!(game.move_to(to), "cannot move {:?} -> {:?}", from, to);
    }

    fn kings_only() -> GameState {
        let board = parse_board("    k   \n        \n        \n        \n        \n        \n        \n    K   ").unwrap();
        GameState::with_position(board, White)
    }

    #[test]
    fn test_initial_state() {
        let game = GameState::new();
        assert_eq!(*game.board(), new_board());
        assert_eq!(game.turn(), White);
        assert_eq!(game.selected_piece(), None);
        assert!(game.legal_targets().is_empty());
        assert_eq!(game.pending_promotion(), None);
        assert!(!game.is_over());
        assert!(game.casualties().is_empty());
        assert_eq!(game.history().undo_len(), 0);
        assert_eq!(game.history().redo_len(), 0);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_opening_pawn_move() {
        let mut game = GameState::new();
        let pawn = piece_at(&game, (6, 4));
        assert!(game.select(Some(pawn)));
        let targets: HashSet<Coordinate> = game.legal_targets().iter().copied().collect();
        assert_eq!(targets, HashSet::from([(5, 4), (4, 4)]));

        assert!(game.move_to((4, 4)));
        assert_eq!(game.board().at((6, 4)), Ok(None));
        assert_eq!(game.board().at((4, 4)), Ok(Some(Piece::new(White, PieceType::Pawn, (4, 4)))));
        assert_eq!(game.turn(), Black);
        assert_eq!(game.selected_piece(), None);
        assert!(game.legal_targets().is_empty());
        assert_eq!(game.history().undo_len(), 1);
    }

    #[test]
    fn test_select_wrong_turn() {
        let mut game = GameState::new();
        let before = game.clone();
        assert!(!game.select(Some(piece_at(&game, (1, 0)))));
        assert_eq!(game, before);
    }

    #[test]
    fn test_select_toggle() {
        let mut game = GameState::new();
        let knight = piece_at(&game, (7, 1));
        assert!(game.select(Some(knight)));
        assert_eq!(game.selected_piece(), Some(knight));
        assert!(game.select(Some(knight)));
        assert_eq!(game.selected_piece(), None);
        assert!(game.legal_targets().is_empty());

        assert!(game.select(Some(knight)));
        assert!(game.select(Some(piece_at(&game, (6, 0)))));
        assert_eq!(game.selected_piece().map(|p| p.kind), Some(PieceType::Pawn));
        assert!(game.select(None));
        assert_eq!(game.selected_piece(), None);
        assert!(!game.select(None));
    }

    #[test]
    fn test_select_stale_piece() {
        let mut game = GameState::new();
        let ghost = Piece::new(White, PieceType::Queen, (4, 4));
        assert!(!game.select(Some(ghost)));
        assert_eq!(game.selected_piece(), None);
    }

    #[test]
    fn test_move_without_selection() {
        let mut game = GameState::new();
        let before = game.clone();
        assert!(!game.move_to((4, 4)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_move_to_illegal_target() {
        let mut game = GameState::new();
        game.select(Some(piece_at(&game, (6, 4))));
        let before = game.clone();
        assert!(!game.move_to((3, 4)));
        assert!(!game.move_to((6, 4)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_capture_records_casualties() {
        let mut game = GameState::new();
        play(&mut game, (6, 4), (4, 4));
        play(&mut game, (1, 3), (3, 3));
        play(&mut game, (4, 4), (3, 3));
        assert_eq!(game.casualties(), &[Piece::new(Black, PieceType::Pawn, (3, 3))]);

        play(&mut game, (0, 3), (3, 3));
        assert_eq!(game.casualties(), &[
            Piece::new(Black, PieceType::Pawn, (3, 3)),
            Piece::new(White, PieceType::Pawn, (3, 3)),
        ]);
        assert_eq!(piece_at(&game, (3, 3)), Piece::new(Black, PieceType::Queen, (3, 3)));
        assert_eq!(game.board().at((0, 3)), Ok(None));
    }

    #[test]
    fn test_new_move_clears_redo() {
        let mut game = GameState::new();
        play(&mut game, (6, 4), (4, 4));
        play(&mut game, (1, 4), (3, 4));
        assert!(game.undo());
        assert_eq!(game.history().redo_len(), 1);

        play(&mut game, (1, 0), (2, 0));
        assert_eq!(game.history().redo_len(), 0);
        assert!(!game.redo());
    }

    #[test]
    fn test_undo_redo() {
        let mut game = GameState::new();
        assert!(!game.undo());
        assert!(!game.redo());

        play(&mut game, (6, 4), (4, 4));
        let after_move = game.clone();
        game.select(Some(piece_at(&game, (1, 4))));

        assert!(game.undo());
        assert_eq!(*game.board(), new_board());
        assert_eq!(game.turn(), White);
        assert_eq!(game.selected_piece(), None);
        assert!(game.legal_targets().is_empty());

        assert!(game.redo());
        assert_eq!(game, after_move);
    }

    #[test]
    fn test_undo_restores_casualties() {
        let mut game = GameState::new();
        play(&mut game, (6, 4), (4, 4));
        play(&mut game, (1, 3), (3, 3));
        play(&mut game, (4, 4), (3, 3));
        assert_eq!(game.casualties().len(), 1);
        assert!(game.undo());
        assert!(game.casualties().is_empty());
        assert_eq!(piece_at(&game, (3, 3)), Piece::new(Black, PieceType::Pawn, (3, 3)));
    }

    #[test]
    fn test_king_capture_ends_game() {
        let mut board = empty_board();
        board.place(Piece::new(Black, PieceType::King, (0, 4))).unwrap();
        board.place(Piece::new(White, PieceType::King, (7, 4))).unwrap();
        board.place(Piece::new(White, PieceType::Rook, (5, 4))).unwrap();
        let mut game = GameState::with_position(board, White);
        assert!(!game.is_over());

        play(&mut game, (5, 4), (0, 4));
        assert!(game.is_over());
        assert_eq!(game.winner(), Some(White));
        assert_eq!(game.casualties(), &[Piece::new(Black, PieceType::King, (0, 4))]);

        let before = game.clone();
        assert!(!game.select(Some(piece_at(&game, (7, 4)))));
        assert!(!game.move_to((6, 4)));
        assert_eq!(game, before);

        assert!(game.undo());
        assert!(!game.is_over());
        assert_eq!(game.winner(), None);
        assert!(game.redo());
        assert!(game.is_over());
    }

    #[test]
    fn test_king_walk_keeps_game_going() {
        let mut game = kings_only();
        play(&mut game, (7, 4), (6, 4));
        play(&mut game, (0, 4), (1, 4));
        assert!(!game.is_over());
    }

    #[test]
    fn test_promotion() {
        let board = parse_board("   r k  \n  P     \n        \n        \n        \n        \n        \n    K   ").unwrap();
        let mut game = GameState::with_position(board, White);
        play(&mut game, (1, 2), (0, 3));
        let pawn = Piece::new(White, PieceType::Pawn, (0, 3));
        assert_eq!(game.pending_promotion(), Some(pawn));
        assert_eq!(game.casualties(), &[Piece::new(Black, PieceType::Rook, (0, 3))]);

        let before = game.clone();
        assert!(!game.promote(PieceType::Pawn));
        assert!(!game.promote(PieceType::King));
        assert_eq!(game, before);
        assert_eq!(piece_at(&game, (0, 3)), pawn);

        assert!(game.promote(PieceType::Queen));
        assert_eq!(piece_at(&game, (0, 3)), Piece::new(White, PieceType::Queen, (0, 3)));
        assert_eq!(game.pending_promotion(), None);
        assert!(!game.promote(PieceType::Rook));

        assert!(game.undo());
        assert_eq!(game.pending_promotion(), Some(pawn));
        assert_eq!(piece_at(&game, (0, 3)), pawn);
        assert!(game.promote(PieceType::Knight));
        assert_eq!(piece_at(&game, (0, 3)).kind, PieceType::Knight);
    }

    #[test]
    fn test_black_promotion() {
        let board = parse_board("    k   \n        \n        \n        \n        \n        \n p      \n    K   ").unwrap();
        let mut game = GameState::with_position(board, Black);
        play(&mut game, (6, 1), (7, 1));
        assert_eq!(game.pending_promotion(), Some(Piece::new(Black, PieceType::Pawn, (7, 1))));
        assert!(game.promote(PieceType::Bishop));
        assert_eq!(piece_at(&game, (7, 1)), Piece::new(Black, PieceType::Bishop, (7, 1)));
    }

    #[test]
    fn test_pending_promotion_cleared_by_next_move() {
        let board = parse_board("    k   \n  P     \n        \n        \n        \n        \n        \n    K   ").unwrap();
        let mut game = GameState::with_position(board, White);
        play(&mut game, (1, 2), (0, 2));
        assert!(game.pending_promotion().is_some());
        play(&mut game, (0, 4), (0, 3));
        assert!(game.pending_promotion().is_none());
    }

    #[test]
    fn test_reset() {
        let mut game = GameState::new();
        play(&mut game, (6, 4), (4, 4));
        play(&mut game, (1, 3), (3, 3));
        play(&mut game, (4, 4), (3, 3));
        game.undo();
        game.select(Some(piece_at(&game, (1, 0))));

        game.reset();
        assert_eq!(game, GameState::new());
        assert_eq!(*game.board(), new_board());
        assert_eq!(game.turn(), White);
        assert_eq!(game.history().undo_len(), 0);
        assert_eq!(game.history().redo_len(), 0);
        assert!(!game.is_over());
    }

    #[test]
    fn test_click() {
        let mut game = GameState::new();
        assert_eq!(game.click((4, 4)), Ok(false));
        assert_eq!(game.click((6, 4)), Ok(true));
        assert_eq!(game.selected_piece().map(|p| p.position), Some((6, 4)));

        assert_eq!(game.click((1, 4)), Ok(false));
        assert_eq!(game.selected_piece().map(|p| p.position), Some((6, 4)));

        assert_eq!(game.click((4, 4)), Ok(true));
        assert_eq!(game.turn(), Black);
        assert_eq!(game.board().at((4, 4)).unwrap().map(|p| p.kind), Some(PieceType::Pawn));

        assert_eq!(game.click((1, 0)), Ok(true));
        assert_eq!(game.click((5, 5)), Ok(true));
        assert_eq!(game.selected_piece(), None);

        assert_eq!(game.click((8, 8)), Err(BoardError::OutOfRange { row: 8, col: 8 }));
    }

    fn random_turn(game: &mut GameState, rng: &mut StdRng) -> bool {
        let movable: Vec<Piece> = game.board().pieces()
            .filter(|p| p.color == game.turn())
            .filter(|p| !crate::moves::legal_moves(p, game.board()).is_empty())
            .collect();
        let Some(&piece) = movable.choose(rng) else { return false };
        game.select(Some(piece));
        let target = *game.legal_targets().choose(rng).expect("Movable piece has targets");
        let kings = game.board().count(PieceType::King);
        let casualties = game.casualties().len();
        let captured = game.board().at(target).unwrap();

        assert!(game.move_to(target));
        assert_eq!(game.history().redo_len(), 0);
        assert_eq!(game.selected_piece(), None);
        assert!(game.legal_targets().is_empty());
        assert_eq!(game.casualties().len(), casualties + captured.is_some() as usize);
        assert_eq!(game.is_over(), kings == 2 && captured.is_some_and(|p| p.kind == PieceType::King));

        if game.pending_promotion().is_some() {
            let kinds = [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];
            assert!(game.promote(kinds[rng.gen_range(0..kinds.len())]));
        }
        true
    }

    #[test]
    fn test_random_games_keep_positions_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut game = GameState::new();
            while !game.is_over() && game.history().undo_len() < 300 {
                if !random_turn(&mut game, &mut rng) {
                    break;
                }
                for row in 0..8 {
                    for col in 0..8 {
                        if let Some(piece) = game.board().at((row, col)).unwrap() {
                            assert_eq!(piece.position, (row, col));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_random_undo_redo_round_trip() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..20 {
            let mut game = GameState::new();
            for _ in 0..rng.gen_range(1..60) {
                if game.is_over() || !random_turn(&mut game, &mut rng) {
                    break;
                }
            }
            let undo_steps = rng.gen_range(0..game.history().undo_len());
            for _ in 0..undo_steps {
                assert!(game.undo());
            }
            let before = game.clone();
            assert!(game.undo());
            assert!(game.redo());
            assert_eq!(game, before);
        }
    }
}
