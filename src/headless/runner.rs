//! Headless mode runner - main event loop without TUI
//!
//! Reads NDJSON intents from stdin on a dedicated thread and prints every
//! [`EngineEvent`] as NDJSON on stdout.

use std::io::BufRead;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use roverdeck_app::{Engine, EngineEvent, Message};
use roverdeck_core::prelude::*;

use super::{HeadlessEvent, HeadlessIntent};

/// Run in headless mode - NDJSON events instead of TUI
pub async fn run_headless(mut engine: Engine) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Rover Deck starting in HEADLESS mode");
    info!("Endpoint: {}", engine.state.registry.base_url());
    info!("═══════════════════════════════════════════════════════");

    let printer = spawn_event_printer(engine.subscribe());

    // Spawn headless-specific stdin reader
    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        read_intents(stdin.lock(), stdin_tx);
    });

    engine.start().await;

    let result = headless_event_loop(&mut engine).await;

    engine.shutdown().await;
    if printer.await.is_err() {
        warn!("Headless event printer panicked");
    }

    info!("Rover Deck headless mode exiting");
    result
}

/// Main headless event loop
async fn headless_event_loop(engine: &mut Engine) -> Result<()> {
    while !engine.should_quit() {
        match engine.next_message().await {
            Some(msg) => {
                engine.process_message(msg).await;
                engine.drain_pending_messages().await;
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    info!("Quit requested");
    Ok(())
}

/// Print engine events until the engine shuts down.
fn spawn_event_printer(mut events: broadcast::Receiver<EngineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    HeadlessEvent::from(&event).emit();
                    if event == EngineEvent::Shutdown {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Headless output lagged, {} events skipped", skipped);
                    HeadlessEvent::error(format!("{} events skipped", skipped), false).emit();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Forward stdin intents to the message channel (blocking).
///
/// Malformed lines are reported as `error` events and skipped. End of input
/// does not quit: a script that pipes intents in keeps the channel open until
/// it sends `quit` or the process is signalled.
fn read_intents(reader: impl BufRead, msg_tx: mpsc::Sender<Message>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        match HeadlessIntent::parse(&line) {
            Ok(Some(intent)) => {
                let quit = intent == HeadlessIntent::Quit;
                if msg_tx.blocking_send(intent.into_message()).is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Unknown stdin intent {:?}: {}", line.trim(), e);
                HeadlessEvent::error(format!("Invalid intent: {}", e), false).emit();
            }
        }
    }

    info!("Stdin reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use roverdeck_core::Direction;
    use std::io::Cursor;

    #[test]
    fn test_read_intents_forwards_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = concat!(
            "{\"intent\":\"key_down\",\"direction\":\"up\"}\n",
            "\n",
            "{\"intent\":\"key_up\",\"direction\":\"up\"}\n",
        );
        read_intents(Cursor::new(input), tx);

        assert_eq!(rx.try_recv().unwrap(), Message::KeyDown(Direction::Up));
        assert_eq!(rx.try_recv().unwrap(), Message::KeyUp(Direction::Up));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_read_intents_skips_bad_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = "garbage\n{\"intent\":\"release_all\"}\n";
        read_intents(Cursor::new(input), tx);

        assert_eq!(rx.try_recv().unwrap(), Message::ReleaseAll);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_read_intents_stops_after_quit() {
        let (tx, mut rx) = mpsc::channel(16);
        let input = "quit\n{\"intent\":\"release_all\"}\n";
        read_intents(Cursor::new(input), tx);

        assert_eq!(rx.try_recv().unwrap(), Message::Quit);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_printer_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(8);
        let printer = spawn_event_printer(rx);
        tx.send(EngineEvent::Shutdown).unwrap();
        printer.await.unwrap();
    }
}
