use std::io::{stdin, stdout};
use std::process::ExitCode;

use chess_engine::game_server;

fn main() -> ExitCode {
    let logger_env = env_logger::Env::default().filter_or("LOG_LEVEL", "INFO");
    env_logger::Builder::from_env(logger_env).format_timestamp_millis().init();

    log::info!("Reading intents from stdin");
    match game_server::handle_game(stdin().lock(), stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
