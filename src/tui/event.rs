//! TUI messages and the terminal input reader.
//!
//! A blocking reader polls crossterm and forwards key and paste events
//! into an mpsc channel, so the main loop can `select!` over terminal
//! input, the intent bus, and its intervals without losing keystrokes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::controller::Snapshot;

/// Messages that drive the TUI update loop.
#[derive(Debug, Clone)]
pub enum TuiMessage {
    /// Keyboard input.
    Input(KeyEvent),
    /// Bracketed paste.
    Paste(String),
    /// Fresh state from the controller.
    Snapshot(Snapshot),
    /// The controller rejected an intent.
    ControllerError(String),
    /// Tick: advance spinner, refresh clock.
    Tick,
}

/// Handle to the input reader thread; stops it on drop.
pub struct InputReader {
    stop: Arc<AtomicBool>,
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Spawn the blocking terminal reader.
pub fn spawn_input_reader(tx: mpsc::UnboundedSender<TuiMessage>) -> InputReader {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::task::spawn_blocking(move || {
        while !flag.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!("terminal poll failed: {e}");
                    break;
                }
            }
            let msg = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => TuiMessage::Input(key),
                Ok(Event::Paste(text)) => TuiMessage::Paste(text),
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("terminal read failed: {e}");
                    break;
                }
            };
            if tx.send(msg).is_err() {
                break;
            }
        }
    });
    InputReader { stop }
}
