//! Background WebSocket task for the control channel.
//!
//! The task owns the socket for one endpoint. It performs the Engine.IO /
//! Socket.IO handshake, answers heartbeats, writes queued commands in order,
//! forwards decoded events, and reconnects with exponential backoff until it
//! is told to shut down.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ChannelSession                          │
//! │                                                               │
//! │  ┌──────────────┐          ┌──────────────────────────────┐  │
//! │  │  Public API  │          │  run_link_task                │  │
//! │  │              │          │                                │  │
//! │  │  send()  ────┼──cmd───▶ │  handshake → io loop          │  │
//! │  │              │  chan    │    ping → pong                 │  │
//! │  │  next_event◀─┼──evt──── │    42[...] → InboundEvent      │  │
//! │  │              │  chan    │  lost → backoff → handshake    │  │
//! │  └──────────────┘          └──────────────────────────────┘  │
//! │            ▲                                                  │
//! │            └──── watch<ConnectionState> ◀──── task            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roverdeck_core::prelude::*;
use roverdeck_core::{ConnectionState, OutboundMessage};

use crate::protocol::{
    decode_event, encode_connect, encode_disconnect, encode_outbound, encode_pong, parse_frame,
    EnginePacket, OpenPayload, SocketPacket,
};
use crate::session::{SessionEvent, SessionOptions};

// ---------------------------------------------------------------------------
// Internal command type
// ---------------------------------------------------------------------------

/// Messages from the session to the background task.
#[derive(Debug)]
pub(crate) enum LinkCommand {
    /// Write one envelope. Dropped if the link is not currently connected.
    Send(OutboundMessage),
    /// Say goodbye to the server and stop.
    Shutdown,
}

// ---------------------------------------------------------------------------
// WebSocket type aliases
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

const EXCERPT_CHARS: usize = 120;

/// Why one connection's I/O loop ended.
#[derive(Debug, PartialEq)]
enum LoopExit {
    /// Transport failure; the task should back off and reconnect.
    Lost(String),
    /// Shutdown requested or nobody is listening any more.
    Stop,
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

/// Entry point for the background link task.
///
/// Runs until [`LinkCommand::Shutdown`] arrives, the command channel closes,
/// or `options.max_attempts` consecutive reconnects fail.
pub(crate) async fn run_link_task(
    url: String,
    options: SessionOptions,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    let mut seq: u64 = 0;
    let mut attempt: u32 = 0;

    loop {
        publish_state(&state, &event_tx, ConnectionState::Connecting);

        let handshake = tokio::time::timeout(options.handshake_timeout, open_session(&url));
        let Some(result) = unless_shutdown(handshake, &mut cmd_rx).await else {
            break;
        };

        let failure = match result {
            Ok(Ok((ws, open))) => {
                info!("Control channel connected to {} (sid {})", url, open.sid);
                attempt = 0;
                publish_state(&state, &event_tx, ConnectionState::Connected);

                let exit = run_io_loop(
                    ws,
                    open.heartbeat_deadline(),
                    &mut cmd_rx,
                    &event_tx,
                    &mut seq,
                    options.sequence_numbers,
                )
                .await;

                match exit {
                    LoopExit::Stop => break,
                    LoopExit::Lost(reason) => reason,
                }
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!(
                "handshake timed out after {}ms",
                options.handshake_timeout.as_millis()
            ),
        };

        publish_state(&state, &event_tx, ConnectionState::Disconnected);

        attempt = attempt.saturating_add(1);
        if let Some(max) = options.max_attempts {
            if attempt > max {
                error!(
                    "Control channel: exceeded {} reconnection attempts, giving up",
                    max
                );
                break;
            }
        }

        let backoff = compute_backoff(attempt, options.initial_backoff, options.max_backoff);
        warn!(
            "Control channel: {}, retrying in {:?} (attempt {})",
            failure, backoff, attempt
        );

        if unless_shutdown(tokio::time::sleep(backoff), &mut cmd_rx)
            .await
            .is_none()
        {
            break;
        }
    }

    publish_state(&state, &event_tx, ConnectionState::Disconnected);
    debug!("Control channel task for {} exiting", url);
}

/// Drive `fut` to completion while draining the command channel.
///
/// Sends that arrive while the link is down are dropped. Returns `None` when
/// shutdown was requested first.
async fn unless_shutdown<F: Future>(
    fut: F,
    cmd_rx: &mut mpsc::Receiver<LinkCommand>,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            cmd = cmd_rx.recv() => match cmd {
                Some(LinkCommand::Send(message)) => {
                    debug!(
                        "Control channel not connected, dropping {}",
                        message.command_name().unwrap_or(message.event.as_str())
                    );
                }
                Some(LinkCommand::Shutdown) | None => return None,
            }
        }
    }
}

/// Run one connection's read/write select loop.
async fn run_io_loop(
    ws: WsStream,
    heartbeat: Duration,
    cmd_rx: &mut mpsc::Receiver<LinkCommand>,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
    seq: &mut u64,
    stamp_seq: bool,
) -> LoopExit {
    let (mut ws_sink, mut ws_stream) = ws.split();

    let watchdog = tokio::time::sleep(heartbeat);
    tokio::pin!(watchdog);

    loop {
        tokio::select! {
            // ── Incoming WebSocket message ───────────────────────────────
            frame = ws_stream.next() => {
                watchdog.as_mut().reset(Instant::now() + heartbeat);
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(exit) = handle_ws_text(text.as_str(), &mut ws_sink, event_tx).await {
                            if exit == LoopExit::Stop {
                                send_goodbye(&mut ws_sink).await;
                            }
                            return exit;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        return LoopExit::Lost("server closed the WebSocket".into());
                    }
                    Some(Ok(_)) => {
                        // Binary/Ping/Pong frames are not part of the text protocol
                    }
                    Some(Err(err)) => {
                        return LoopExit::Lost(format!("WebSocket read error: {err}"));
                    }
                    None => {
                        return LoopExit::Lost("WebSocket stream ended".into());
                    }
                }
            }

            // ── Outgoing command from the session ────────────────────────
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LinkCommand::Send(message)) => {
                        let stamp = if stamp_seq && message.command_name().is_some() {
                            *seq += 1;
                            Some(*seq)
                        } else {
                            None
                        };
                        let frame = match encode_outbound(&message, stamp) {
                            Ok(frame) => frame,
                            Err(err) => {
                                warn!("Control channel: failed to encode envelope: {}", err);
                                continue;
                            }
                        };
                        trace!("Control channel → {}", frame);
                        if let Err(err) = ws_sink.send(WsMessage::Text(frame.into())).await {
                            return LoopExit::Lost(format!("WebSocket write error: {err}"));
                        }
                    }
                    Some(LinkCommand::Shutdown) | None => {
                        send_goodbye(&mut ws_sink).await;
                        return LoopExit::Stop;
                    }
                }
            }

            // ── Heartbeat watchdog ───────────────────────────────────────
            _ = &mut watchdog => {
                return LoopExit::Lost(format!(
                    "no frame from server for {}ms",
                    heartbeat.as_millis()
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Establish a new WebSocket connection to `url`.
async fn connect_ws(url: &str) -> Result<WsStream> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|err| Error::transport(format!("failed to connect to {url}: {err}")))?;
    Ok(ws_stream)
}

/// Connect and complete the Engine.IO open plus Socket.IO namespace connect.
async fn open_session(url: &str) -> Result<(WsStream, OpenPayload)> {
    let mut ws = connect_ws(url).await?;

    let open = loop {
        match next_packet(&mut ws).await? {
            EnginePacket::Open(open) => break open,
            other => debug!("Control channel: ignoring {:?} before open", other),
        }
    };

    ws.send(WsMessage::Text(encode_connect().into()))
        .await
        .map_err(|err| Error::transport(format!("failed to send namespace connect: {err}")))?;

    loop {
        match next_packet(&mut ws).await? {
            EnginePacket::Message(SocketPacket::Connect { namespace, .. }) if namespace == "/" => {
                return Ok((ws, open));
            }
            EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
                return Err(Error::protocol(format!("namespace connect refused: {data}")));
            }
            EnginePacket::Ping(probe) => {
                ws.send(WsMessage::Text(encode_pong(&probe).into()))
                    .await
                    .map_err(|err| Error::transport(format!("failed to answer ping: {err}")))?;
            }
            EnginePacket::Close => {
                return Err(Error::transport("server closed during handshake"));
            }
            other => debug!("Control channel: ignoring {:?} during handshake", other),
        }
    }
}

/// Read the next text frame and decode it.
async fn next_packet(ws: &mut WsStream) -> Result<EnginePacket> {
    loop {
        match ws.next().await {
            Some(Ok(WsMessage::Text(text))) => return parse_frame(text.as_str()),
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(Error::transport("connection closed during handshake"));
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                return Err(Error::transport(format!("handshake read failed: {err}")));
            }
        }
    }
}

/// Route one inbound text frame. Returns `Some` when the loop must end.
async fn handle_ws_text(
    text: &str,
    ws_sink: &mut WsSink,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
) -> Option<LoopExit> {
    let packet = match parse_frame(text) {
        Ok(packet) => packet,
        Err(err) => {
            warn!("Control channel: {} in frame {}", err, excerpt(text));
            return None;
        }
    };

    match packet {
        EnginePacket::Ping(probe) => {
            if let Err(err) = ws_sink.send(WsMessage::Text(encode_pong(&probe).into())).await {
                return Some(LoopExit::Lost(format!("failed to answer ping: {err}")));
            }
        }
        EnginePacket::Close => {
            return Some(LoopExit::Lost("server sent Engine.IO close".into()));
        }
        EnginePacket::Message(SocketPacket::Event {
            namespace,
            name,
            data,
        }) => {
            if namespace != "/" {
                trace!("Control channel: ignoring event on {}", namespace);
                return None;
            }
            match decode_event(&name, data) {
                Ok(Some(event)) => {
                    if event_tx.send(SessionEvent::Inbound(event)).is_err() {
                        debug!("Control channel: session dropped its receiver");
                        return Some(LoopExit::Stop);
                    }
                }
                Ok(None) => trace!("Control channel: ignoring '{}' event", name),
                Err(err) => warn!("Control channel: dropping '{}' event: {}", name, err),
            }
        }
        EnginePacket::Message(SocketPacket::Disconnect { .. }) => {
            return Some(LoopExit::Lost("server disconnected the namespace".into()));
        }
        EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
            return Some(LoopExit::Lost(format!("server rejected the namespace: {data}")));
        }
        other => trace!("Control channel: ignoring {:?}", other),
    }
    None
}

/// Publish a state transition on the watch and the event channel.
fn publish_state(
    state: &watch::Sender<ConnectionState>,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
    next: ConnectionState,
) {
    let previous = state.send_replace(next);
    if previous != next {
        debug!(
            "Control channel: {} → {}",
            previous.label(),
            next.label()
        );
        let _ = event_tx.send(SessionEvent::StateChanged(next));
    }
}

/// Compute exponential backoff duration for reconnection attempt `n`.
///
/// The formula is `initial * 2^(n-1)`, capped at `max`.
pub(crate) fn compute_backoff(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let multiplier: u32 = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    initial.saturating_mul(multiplier).min(max)
}

/// At most the first [`EXCERPT_CHARS`] characters of a frame, for logging.
fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Leave the namespace and close the WebSocket, ignoring write errors.
async fn send_goodbye(ws_sink: &mut WsSink) {
    let _ = ws_sink
        .send(WsMessage::Text(encode_disconnect().into()))
        .await;
    let _ = ws_sink.send(WsMessage::Close(None)).await;
    let _ = ws_sink.close().await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const INITIAL: Duration = Duration::from_millis(500);
    const MAX: Duration = Duration::from_secs(3);

    #[test]
    fn test_backoff_first_attempt_is_initial() {
        assert_eq!(compute_backoff(1, INITIAL, MAX), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(compute_backoff(2, INITIAL, MAX), Duration::from_millis(1000));
        assert_eq!(compute_backoff(3, INITIAL, MAX), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        assert_eq!(compute_backoff(4, INITIAL, MAX), MAX);
        assert_eq!(compute_backoff(10, INITIAL, MAX), MAX);
    }

    #[test]
    fn test_backoff_large_attempt_does_not_overflow() {
        assert_eq!(compute_backoff(u32::MAX, INITIAL, MAX), MAX);
    }

    #[test]
    fn test_backoff_attempt_zero_treated_as_first() {
        assert_eq!(compute_backoff(0, INITIAL, MAX), INITIAL);
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        let frame = format!("9{}", "é".repeat(100));
        let cut = excerpt(&frame);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS);
        assert!(cut.starts_with("9é"));

        assert_eq!(excerpt("42[\"status\"]"), "42[\"status\"]");
        assert_eq!(excerpt(""), "");
    }

    #[test]
    fn test_publish_state_only_emits_on_change() {
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        publish_state(&state, &event_tx, ConnectionState::Disconnected);
        assert!(event_rx.try_recv().is_err());

        publish_state(&state, &event_tx, ConnectionState::Connecting);
        assert!(matches!(
            event_rx.try_recv(),
            Ok(SessionEvent::StateChanged(ConnectionState::Connecting))
        ));
        assert_eq!(*state.borrow(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_unless_shutdown_drops_sends_and_stops_on_shutdown() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(8);
        cmd_tx
            .send(LinkCommand::Send(OutboundMessage::motion(
                roverdeck_core::MotionVector::ZERO,
            )))
            .await
            .unwrap();
        cmd_tx.send(LinkCommand::Shutdown).await.unwrap();

        let out = unless_shutdown(std::future::pending::<()>(), &mut cmd_rx).await;
        assert!(out.is_none());
        assert!(cmd_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unless_shutdown_returns_future_output() {
        let (_cmd_tx, mut cmd_rx) = mpsc::channel::<LinkCommand>(1);
        let out = unless_shutdown(async { 42 }, &mut cmd_rx).await;
        assert_eq!(out, Some(42));
    }

    #[tokio::test]
    async fn test_task_stops_when_endpoint_unreachable_and_attempts_exhausted() {
        let options = SessionOptions {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            handshake_timeout: Duration::from_millis(500),
            max_attempts: Some(1),
            sequence_numbers: true,
        };
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(watch::channel(ConnectionState::Disconnected).0);

        tokio::time::timeout(
            Duration::from_secs(10),
            run_link_task(
                "ws://127.0.0.1:1/socket.io/?EIO=4&transport=websocket".into(),
                options,
                cmd_rx,
                event_tx,
                state.clone(),
            ),
        )
        .await
        .expect("task should give up");

        let mut states = Vec::new();
        while let Ok(SessionEvent::StateChanged(s)) = event_rx.try_recv() {
            states.push(s);
        }
        assert_eq!(
            states,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
            ]
        );
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }
}
