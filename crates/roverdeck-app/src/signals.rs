//! OS signals: stop the vehicle, then quit

use tokio::sync::mpsc;

use crate::message::Message;
use roverdeck_core::prelude::*;

/// Signal that ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    /// Controlling terminal went away
    Hangup,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Hangup => "SIGHUP",
        })
    }
}

/// Messages a signal turns into. Releasing first means the stop is queued
/// ahead of teardown even if the loop is busy.
pub fn signal_messages(signal: ShutdownSignal) -> [Message; 2] {
    debug!("{} → release all, quit", signal);
    [Message::ReleaseAll, Message::Quit]
}

/// Spawn a task that turns the first OS shutdown signal into messages.
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        let signal = match wait_for_signal().await {
            Ok(signal) => signal,
            Err(e) => {
                error!("Signal handler error: {}", e);
                return;
            }
        };

        info!("Received {}, stopping", signal);
        for msg in signal_messages(signal) {
            if tx.send(msg).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let listen = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| Error::terminal(format!("Failed to listen for {name}: {e}")))
    };
    let mut sigint = listen(SignalKind::interrupt(), "SIGINT")?;
    let mut sigterm = listen(SignalKind::terminate(), "SIGTERM")?;
    let mut sighup = listen(SignalKind::hangup(), "SIGHUP")?;

    Ok(tokio::select! {
        _ = sigint.recv() => ShutdownSignal::Interrupt,
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sighup.recv() => ShutdownSignal::Hangup,
    })
}

#[cfg(windows)]
async fn wait_for_signal() -> Result<ShutdownSignal> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::terminal(format!("Failed to listen for Ctrl+C: {}", e)))?;
    Ok(ShutdownSignal::Interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_stops_before_quitting() {
        for signal in [
            ShutdownSignal::Interrupt,
            ShutdownSignal::Terminate,
            ShutdownSignal::Hangup,
        ] {
            assert_eq!(signal_messages(signal), [Message::ReleaseAll, Message::Quit]);
        }
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(ShutdownSignal::Hangup.to_string(), "SIGHUP");
    }

    #[tokio::test]
    async fn test_no_messages_without_a_signal() {
        let (tx, mut rx) = mpsc::channel::<Message>(2);

        spawn_signal_handler(tx);
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        assert!(rx.try_recv().is_err());
    }
}
