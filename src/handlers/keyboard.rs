use std::io::BufRead;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use crate::handlers::events::Direction;

pub fn parse_key(input: &str) -> Option<Direction> {
    match input.trim().to_ascii_lowercase().as_str() {
        "arrowup" | "up" | "w" | "k" => Some(Direction::Up),
        "arrowdown" | "down" | "s" | "j" => Some(Direction::Down),
        "arrowleft" | "left" | "a" | "h" => Some(Direction::Left),
        "arrowright" | "right" | "d" | "l" => Some(Direction::Right),
        _ => None,
    }
}

/// Reads keys with blocking I/O on its own thread.
///
/// A blocked read can't be cancelled, so it must stay off the runtime or
/// shutdown would wait for the next line.
pub struct KeyboardReader;

impl KeyboardReader {
    pub fn spawn<R>(input: R, keys: mpsc::Sender<Direction>) -> std::io::Result<JoinHandle<()>>
        where R: BufRead + Send + 'static {
        std::thread::Builder::new()
            .name("keyboard".to_string())
            .spawn(move || {
                if let Err(e) = Self::run_blocking(input, keys) {
                    error!("Keyboard input failed: {}", e);
                }
            })
    }

    /// Forwards one direction per recognised line until input ends or the receiver goes away.
    /// Must not be called from inside the runtime.
    pub fn run_blocking<R>(input: R, keys: mpsc::Sender<Direction>) -> std::io::Result<()>
        where R: BufRead {
        for line in input.lines() {
            let line = line?;
            match parse_key(&line) {
                Some(direction) => {
                    if keys.blocking_send(direction).is_err() {
                        break;
                    }
                }
                None => debug!("Ignoring key input {:?}", line),
            }
        }
        info!("Keyboard input closed");
        Ok(())
    }
}
