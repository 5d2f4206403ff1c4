//! Main TUI runner - entry point and event loop

use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::Event;
use tokio::sync::mpsc;

use roverdeck_app::message::Message;
use roverdeck_app::Engine;
use roverdeck_core::prelude::*;

use crate::event::{self, PointerState};
use crate::layout::ScreenAreas;
use crate::{render, terminal};

/// How long the reader thread blocks before checking for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the operator console until the operator quits or a signal arrives.
pub async fn run(mut engine: Engine) -> Result<()> {
    terminal::install_panic_hook();

    let mut term = ratatui::try_init().map_err(|e| Error::TerminalInit(e.to_string()))?;
    let releases = match terminal::enable_input_features() {
        Ok(releases) => releases,
        Err(e) => {
            ratatui::restore();
            return Err(e);
        }
    };

    let (term_tx, mut term_rx) = mpsc::channel::<Event>(256);
    let reader = spawn_event_reader(term_tx);

    engine.start().await;
    let result = run_loop(&mut term, &mut engine, &mut term_rx).await;

    // Final stop and channel teardown happen before the terminal goes away
    engine.shutdown().await;

    drop(term_rx);
    if reader.join().is_err() {
        warn!("Terminal reader thread panicked");
    }

    terminal::disable_input_features(releases);
    ratatui::restore();

    result
}

/// Main event loop
async fn run_loop(
    term: &mut ratatui::DefaultTerminal,
    engine: &mut Engine,
    term_rx: &mut mpsc::Receiver<Event>,
) -> Result<()> {
    let mut pointer = PointerState::new();
    let mut areas = draw(term, engine)?;

    while !engine.should_quit() {
        tokio::select! {
            event = term_rx.recv() => match event {
                Some(event) => {
                    for msg in event::map_event(&event, engine.state.ui_mode, &areas, &mut pointer) {
                        engine.process_message(msg).await;
                    }
                }
                None => {
                    error!("Terminal input closed");
                    engine.process_message(Message::Quit).await;
                }
            },
            msg = engine.next_message() => {
                if let Some(msg) = msg {
                    engine.process_message(msg).await;
                }
            }
        }

        engine.drain_pending_messages().await;
        areas = draw(term, engine)?;
    }

    Ok(())
}

fn draw(term: &mut ratatui::DefaultTerminal, engine: &Engine) -> Result<ScreenAreas> {
    let mut areas = None;
    term.draw(|frame| areas = Some(render::view(frame, &engine.state)))?;
    areas.ok_or_else(|| Error::terminal("Frame was not rendered"))
}

/// Read terminal events on a dedicated thread; crossterm's reader blocks.
fn spawn_event_reader(tx: mpsc::Sender<Event>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match crossterm::event::poll(POLL_INTERVAL) {
                Ok(true) => match crossterm::event::read() {
                    Ok(event) => {
                        if tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to poll terminal: {}", e);
                    break;
                }
            }
        }
    })
}
