//! TUI runner — main loop that wires everything together.
//!
//! Sets up the terminal, starts the input reader, and runs the TEA loop:
//! controller ticks, renders, intents from the bus, and terminal input
//! all arrive on one task.

use std::io;
use std::time::Duration;

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::controller::Controller;
use crate::intent::{Intent, IntentBus};

use super::app::TuiApp;
use super::event::{spawn_input_reader, TuiMessage};
use super::layout;

/// Pull a fresh snapshot into the app if anything changed.
pub fn refresh_from_controller<C: Controller + ?Sized>(app: &mut TuiApp, controller: &C) {
    let snapshot = controller.snapshot();
    if snapshot != app.snapshot {
        app.update(TuiMessage::Snapshot(snapshot));
    }
}

/// Hand an accepted intent to the controller. Rejections are logged and
/// shown in the status bar; they never end the loop.
pub async fn handle_intent<C: Controller + ?Sized>(
    app: &mut TuiApp,
    controller: &mut C,
    intent: Intent,
) {
    info!(?intent, "dispatching intent");
    match controller.dispatch(intent).await {
        Ok(()) => app.last_error = None,
        Err(e) => {
            warn!(error = %e, "intent rejected");
            app.update(TuiMessage::ControllerError(e.to_string()));
        }
    }
    refresh_from_controller(app, controller);
}

/// Run the TUI main loop. Blocks until quit.
pub async fn run_tui<C: Controller + ?Sized>(
    controller: &mut C,
    tick: Duration,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, controller, tick).await;

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    io::stdout().execute(DisableBracketedPaste)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn main_loop<C: Controller + ?Sized>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut C,
    tick: Duration,
) -> anyhow::Result<()> {
    let (bus, mut intent_rx) = IntentBus::channel();
    let mut app = TuiApp::new(bus);
    refresh_from_controller(&mut app, controller);

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let _reader = spawn_input_reader(input_tx);

    let mut tick_interval = interval(tick);
    let mut render_interval = interval(Duration::from_millis(33)); // ~30fps

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if let Err(e) = controller.tick().await {
                    warn!(error = %e, "controller tick failed");
                    app.update(TuiMessage::ControllerError(e.to_string()));
                }
                app.update(TuiMessage::Tick);
                refresh_from_controller(&mut app, controller);
            }
            _ = render_interval.tick() => {
                terminal.draw(|f| layout::draw(f, &mut app))?;
            }
            Some(intent) = intent_rx.recv() => {
                handle_intent(&mut app, controller, intent).await;
            }
            msg = input_rx.recv() => match msg {
                Some(msg) => app.update(msg),
                None => {
                    warn!("terminal input closed");
                    break;
                }
            },
        }

        if app.should_quit {
            break;
        }
    }
    info!("tui exiting");
    Ok(())
}
