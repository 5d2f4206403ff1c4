//! Engine - shared orchestration for the TUI and headless runners
//!
//! The Engine owns the TEA state, the unified message channel and the
//! Channel Session. Runners feed it messages and render from `state` or from
//! the broadcast [`EngineEvent`] stream.

use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc};

use roverdeck_core::prelude::*;
use roverdeck_core::{ConnectionState, EventKind, InboundEvent};
use roverdeck_link::ChannelSession;

use crate::actions;
use crate::config::{self, Settings};
use crate::engine_event::EngineEvent;
use crate::handler::{self, UpdateAction};
use crate::message::Message;
use crate::signals;
use crate::state::{AppState, NoticeKind};

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents.
#[derive(Debug, Clone, PartialEq)]
struct StateSnapshot {
    connection: ConnectionState,
    snapshot_count: u64,
    ack_count: u64,
    endpoint: (String, String),
    notice_seq: Option<u64>,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        let endpoint = state.registry.get();
        Self {
            connection: state.connection,
            snapshot_count: state.reconciler.snapshot_count(),
            ack_count: state.reconciler.ack_count(),
            endpoint: (endpoint.host.clone(), endpoint.port.clone()),
            notice_seq: state.notice.as_ref().map(|n| n.seq),
        }
    }
}

/// Orchestration engine for Rover Deck.
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, terminal, stdin).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Loaded settings (cached from config)
    pub settings: Settings,

    /// The one control channel
    session: ChannelSession,

    /// Event broadcaster for external consumers.
    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an Engine from the settings in `config_dir` and start listening
    /// for OS signals. Must be called inside a tokio runtime.
    pub fn new(config_dir: PathBuf) -> Self {
        let settings = config::load_settings(&config_dir);
        let engine = Self::with_settings(config_dir, settings);
        signals::spawn_signal_handler(engine.msg_tx.clone());
        engine
    }

    /// Create an Engine from explicit settings. No signal handler, no network.
    pub fn with_settings(config_dir: PathBuf, settings: Settings) -> Self {
        let state = AppState::with_settings(config_dir, &settings);

        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (event_tx, _) = broadcast::channel(256);

        let mut session = ChannelSession::new(settings.link.session_options());
        session.on(EventKind::CommandAck, |event| match event {
            InboundEvent::CommandAck(ack) => debug!("robot_response: {}", ack.raw),
            InboundEvent::AutonomyChanged(level) => info!("Platform autonomy now {}", level),
            InboundEvent::Status(_) => {}
        });

        Self {
            state,
            msg_tx,
            msg_rx,
            settings,
            session,
            event_tx,
        }
    }

    /// Open the control channel to the configured endpoint.
    pub async fn start(&mut self) {
        let url = self.state.registry.channel_url();
        info!("Connecting control channel to {}", url);
        self.session.connect(&url).await;
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Wait for the next message from an input source or the channel.
    pub async fn next_message(&mut self) -> Option<Message> {
        tokio::select! {
            msg = self.msg_rx.recv() => msg,
            event = self.session.next_event() => Some(match event {
                Some(event) => Message::Channel(event),
                None => Message::ChannelEnded,
            }),
        }
    }

    /// Process a single message through the TEA update cycle, following
    /// chained messages and executing resulting actions.
    pub async fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        let mut next = Some(msg);
        while let Some(msg) = next.take() {
            let result = handler::update(&mut self.state, msg);
            if let Some(action) = result.action {
                self.handle_action(action).await;
            }
            next = result.message;
        }

        let post = StateSnapshot::capture(&self.state);
        self.emit_events(&pre, &post);
    }

    /// Drain and process everything already queued on the message channel.
    pub async fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg).await;
            count += 1;
        }
        count
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    /// Flush a final stop if anything could still be moving, then close the
    /// channel.
    pub async fn shutdown(&mut self) {
        if self.state.aggregator.needs_final_stop() {
            let event = actions::flush_stop(&mut self.state, &self.session);
            self.emit(event);
        }
        self.session.disconnect().await;
        self.state.connection = ConnectionState::Disconnected;
        self.emit(EngineEvent::Shutdown);
        info!("Engine shut down");
    }

    async fn handle_action(&mut self, action: UpdateAction) {
        match action {
            UpdateAction::SendMotion(vector) => {
                let event = actions::send_motion(&mut self.state, &self.session, vector);
                self.emit(event);
            }
            UpdateAction::Dispatch(ui_action) => {
                let event = actions::dispatch_control(&mut self.state, &self.session, &ui_action);
                self.emit(event);
            }
            UpdateAction::SwitchEndpoint { url, flush_stop } => {
                if flush_stop {
                    let event = actions::flush_stop(&mut self.state, &self.session);
                    self.emit(event);
                }
                info!("Switching control channel to {}", url);
                self.session.connect(&url).await;
            }
            UpdateAction::Reconnect { url } => {
                self.session.connect(&url).await;
            }
        }
    }

    /// Emit EngineEvents based on state changes after processing.
    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        if pre.connection != post.connection {
            self.emit(EngineEvent::ConnectionChanged {
                state: post.connection,
            });
        }

        if post.snapshot_count > pre.snapshot_count {
            self.emit(EngineEvent::StatusUpdated {
                status: self.state.reconciler.view(),
            });
        }

        if post.ack_count > pre.ack_count {
            if let Some(ack) = self.state.reconciler.last_ack() {
                self.emit(EngineEvent::Acknowledged {
                    summary: ack.summary(),
                });
            }
        }

        if pre.endpoint != post.endpoint {
            let (host, port) = post.endpoint.clone();
            self.emit(EngineEvent::EndpointChanged {
                host,
                port,
                base_url: self.state.registry.base_url(),
            });
        }

        if post.notice_seq.is_some() && pre.notice_seq != post.notice_seq {
            if let Some(notice) = &self.state.notice {
                let event = match notice.kind {
                    NoticeKind::EndpointRejected => EngineEvent::EndpointRejected {
                        reason: notice.message.clone(),
                    },
                    NoticeKind::Channel | NoticeKind::Config => EngineEvent::Error {
                        message: notice.message.clone(),
                    },
                };
                self.emit(event);
            }
        }
    }

    /// Emit a single event to all subscribers (ignores send errors when no
    /// subscribers are listening).
    fn emit(&self, event: EngineEvent) {
        trace!("engine event: {}", event.event_type());
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roverdeck_core::{Direction, MotionVector, RobotStatus};
    use roverdeck_link::SessionEvent;
    use tempfile::tempdir;

    fn test_engine() -> (tempfile::TempDir, Engine) {
        let temp = tempdir().unwrap();
        let engine = Engine::with_settings(temp.path().to_path_buf(), Settings::default());
        (temp, engine)
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_motion_while_disconnected_is_dropped_not_fatal() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        engine.process_message(Message::KeyDown(Direction::Up)).await;
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![EngineEvent::MotionSent {
                vector: MotionVector { x: 0.0, y: 1.0 },
                delivered: false
            }]
        );
        assert_eq!(engine.state.stats.dropped, 1);
    }

    #[tokio::test]
    async fn test_connection_change_is_broadcast() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        engine
            .process_message(Message::Channel(SessionEvent::StateChanged(
                ConnectionState::Connecting,
            )))
            .await;
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::ConnectionChanged {
                state: ConnectionState::Connecting
            }]
        );
    }

    #[tokio::test]
    async fn test_status_and_ack_are_broadcast() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        let mut status = RobotStatus::default();
        status.battery = Some(11.9);
        engine
            .process_message(Message::Channel(SessionEvent::Inbound(
                InboundEvent::Status(status.clone()),
            )))
            .await;
        engine
            .process_message(Message::Channel(SessionEvent::Inbound(
                InboundEvent::AutonomyChanged(roverdeck_core::AutonomyLevel::Semi),
            )))
            .await;

        assert_eq!(
            drain(&mut rx),
            vec![
                EngineEvent::StatusUpdated { status },
                EngineEvent::Acknowledged {
                    summary: "autonomy → semi".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_endpoint_is_broadcast() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        engine
            .process_message(Message::SetEndpoint {
                host: String::new(),
                port: "8000".into(),
            })
            .await;
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], EngineEvent::EndpointRejected { .. }));
        assert_eq!(engine.state.registry.get().host, "localhost");
    }

    #[tokio::test]
    async fn test_editor_submit_chains_into_endpoint_change() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        engine.process_message(Message::OpenEndpointEditor).await;
        for _ in 0.."localhost".len() {
            engine.process_message(Message::EditorBackspace).await;
        }
        for c in "10.0.0.5".chars() {
            engine.process_message(Message::EditorInput(c)).await;
        }
        engine.process_message(Message::EditorSubmit).await;

        let events = drain(&mut rx);
        assert!(events.contains(&EngineEvent::EndpointChanged {
            host: "10.0.0.5".into(),
            port: "8000".into(),
            base_url: "http://10.0.0.5:8000".into(),
        }));
        assert!(engine.state.editor.is_none());

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_quit_and_shutdown() {
        let (_temp, mut engine) = test_engine();
        let mut rx = engine.subscribe();

        engine.msg_sender().send(Message::Quit).await.unwrap();
        assert_eq!(engine.drain_pending_messages().await, 1);
        assert!(engine.should_quit());

        engine.shutdown().await;
        assert_eq!(drain(&mut rx), vec![EngineEvent::Shutdown]);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_stop_when_moving() {
        let (_temp, mut engine) = test_engine();
        engine.process_message(Message::KeyDown(Direction::Right)).await;
        let mut rx = engine.subscribe();

        engine.shutdown().await;
        assert_eq!(
            drain(&mut rx),
            vec![
                EngineEvent::MotionSent {
                    vector: MotionVector::ZERO,
                    delivered: false
                },
                EngineEvent::Shutdown,
            ]
        );
    }
}
