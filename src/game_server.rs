use std::io::{BufRead, Write};
use crate::board::{Board, to_string};
use crate::communication_protocol::{decode, JsonMsg, JsonMsgServer, MsgType, MsgTypeServer, ProtocolError};
use crate::game::GameState;

fn draw_board(board: &Board) -> String {
    let mut result = String::new();
    for c in to_string(board).chars() {
        match c {
            '\n' => result.push_str("|\n"),
            x => {
                result.push('|');
                result.push(x);
            }
        }
    }
    result.push('|');
    result
}

/// Applies one intent to `game`. `Ok(false)` means the intent was ignored.
pub fn apply_msg(game: &mut GameState, msg: &JsonMsg) -> Result<bool, ProtocolError> {
    let changed = match msg.msg_type {
        MsgType::Click => game.click(msg.square()?)?,
        MsgType::Select => {
            let piece = game.board().at(msg.square()?)?;
            game.select(piece)
        }
        MsgType::Move => game.move_to(msg.square()?),
        MsgType::Promote => game.promote(msg.promote_to.ok_or(ProtocolError::MissingPieceType)?),
        MsgType::Undo => game.undo(),
        MsgType::Redo => game.redo(),
        MsgType::Reset => {
            game.reset();
            true
        }
        MsgType::State => true,
    };
    Ok(changed)
}

fn respond(game: &mut GameState, line: &str) -> JsonMsgServer {
    let applied = decode(line).and_then(|msg| apply_msg(game, &msg).map(|changed| (msg, changed)));
    match applied {
        Ok((msg, true)) => {
            log::debug!("{:?} applied, {:?} to play", msg.msg_type, game.turn());
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("\n{}", draw_board(game.board()));
            }
            JsonMsgServer::from_game(MsgTypeServer::State, game)
        }
        Ok((msg, false)) => {
            log::debug!("{:?} ignored", msg.msg_type);
            JsonMsgServer::from_game(MsgTypeServer::Ignored, game)
        }
        Err(e) => {
            log::warn!("Rejecting message {:?}: {}", line, e);
            JsonMsgServer::error(game, &e)
        }
    }
}

/// Runs one session: a JSON intent per input line, a JSON state per output line.
pub fn handle_game<R: BufRead, W: Write>(reader: R, mut writer: W) -> Result<(), ProtocolError> {
    let mut game = GameState::new();
    let mut handled: usize = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = respond(&mut game, &line);
        let msg = serde_json::to_string(&response)?;
        writeln!(writer, "{}", msg)?;
        writer.flush()?;
        handled += 1;
    }
    log::info!("Session closed after {} messages", handled);
    Ok(())
}
