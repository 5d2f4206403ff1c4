//! Channel Session: the single owner of the control-channel connection.
//!
//! [`ChannelSession`] wraps one background link task (see `client.rs`) and
//! exposes a synchronous, never-blocking [`send`](ChannelSession::send), an
//! event subscription API, and an observable [`ConnectionState`].
//!
//! Inbound events are pulled with [`next_event`](ChannelSession::next_event),
//! which also runs registered handlers. Handlers therefore execute on the
//! caller's task, one at a time and in arrival order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use roverdeck_core::prelude::*;
use roverdeck_core::{ConnectionState, EventKind, InboundEvent, OutboundMessage};

use crate::client::{run_link_task, LinkCommand};

/// Capacity of the command channel (bounded; `send` fails fast when full).
const CMD_CHANNEL_CAPACITY: usize = 64;

/// How long teardown waits for the old task to say goodbye.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Delay before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the exponential backoff.
    pub max_backoff: Duration,
    /// Budget for WebSocket connect plus the Socket.IO handshake.
    pub handshake_timeout: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Stamp a monotonically increasing `seq` on every `control_command`.
    pub sequence_numbers: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
            handshake_timeout: Duration::from_secs(5),
            max_attempts: None,
            sequence_numbers: true,
        }
    }
}

/// Something that happened on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Connectivity changed
    StateChanged(ConnectionState),
    /// Decoded platform event
    Inbound(InboundEvent),
}

/// Token returned by [`ChannelSession::on`] for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Outbound seam between dispatch logic and the network.
///
/// The input aggregator and command dispatcher only ever talk to this trait,
/// so they can be exercised against a mock.
#[cfg_attr(any(test, feature = "test-helpers"), mockall::automock)]
pub trait CommandSink {
    /// Enqueue one envelope. Returns `false` when it was dropped.
    fn send(&self, message: OutboundMessage) -> bool;

    /// Current connectivity.
    fn connection_state(&self) -> ConnectionState;
}

// ---------------------------------------------------------------------------
// Handler registry
// ---------------------------------------------------------------------------

type Handler = Box<dyn FnMut(&InboundEvent) + Send + 'static>;

#[derive(Default)]
struct HandlerRegistry {
    next_id: u64,
    handlers: Vec<(HandlerId, EventKind, Handler)>,
}

impl HandlerRegistry {
    fn register(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push((id, kind, handler));
        id
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Invoke matching handlers in registration order.
    fn dispatch(&mut self, event: &InboundEvent) {
        let kind = event.kind();
        for (_, handler_kind, handler) in self.handlers.iter_mut() {
            if *handler_kind == kind {
                handler(event);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelSession
// ---------------------------------------------------------------------------

struct LinkHandle {
    url: String,
    cmd_tx: mpsc::Sender<LinkCommand>,
    task: JoinHandle<()>,
}

/// Reconnect-tolerant session to the platform's control channel.
pub struct ChannelSession {
    options: SessionOptions,
    state: Arc<watch::Sender<ConnectionState>>,
    link: Option<LinkHandle>,
    event_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    handlers: HandlerRegistry,
}

impl std::fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSession")
            .field("endpoint", &self.endpoint())
            .field("connection_state", &self.connection_state())
            .field("handlers", &self.handlers.handlers.len())
            .finish()
    }
}

impl ChannelSession {
    pub fn new(options: SessionOptions) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            options,
            state: Arc::new(state),
            link: None,
            event_rx: None,
            handlers: HandlerRegistry::default(),
        }
    }

    /// Start talking to `url`.
    ///
    /// Calling again with the same URL while a link task is alive is a no-op.
    /// A different URL first tears the existing link down: queued envelopes
    /// are flushed to the old endpoint, then the namespace is left.
    pub async fn connect(&mut self, url: &str) {
        if let Some(link) = &self.link {
            let alive = self.event_rx.is_some() && !link.task.is_finished();
            if link.url == url && alive {
                debug!("Control channel already targeting {}", url);
                return;
            }
        }

        self.teardown().await;

        info!("Connecting control channel to {}", url);
        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_link_task(
            url.to_string(),
            self.options.clone(),
            cmd_rx,
            event_tx,
            Arc::clone(&self.state),
        ));

        self.link = Some(LinkHandle {
            url: url.to_string(),
            cmd_tx,
            task,
        });
        self.event_rx = Some(event_rx);
    }

    /// Tear the link down and stop reconnecting.
    pub async fn disconnect(&mut self) {
        if self.link.is_some() {
            info!("Disconnecting control channel");
        }
        self.teardown().await;
    }

    /// Enqueue one envelope; dropped unless `connected`.
    pub fn send(&self, message: OutboundMessage) -> bool {
        let name = message
            .command_name()
            .unwrap_or(message.event.as_str())
            .to_string();
        match self.try_send(message) {
            Ok(()) => true,
            Err(Error::ChannelDisconnected) => {
                trace!("Control channel not connected, dropping {}", name);
                false
            }
            Err(err) => {
                warn!("Dropping {}: {}", name, err);
                false
            }
        }
    }

    /// Enqueue one envelope, reporting why it was not accepted.
    ///
    /// `ChannelDisconnected` while not `connected`, `ChannelClosed` once the
    /// link task is gone, `Transport` when the queue is full.
    pub fn try_send(&self, message: OutboundMessage) -> Result<()> {
        if !self.connection_state().is_connected() {
            return Err(Error::ChannelDisconnected);
        }
        let link = self.link.as_ref().ok_or(Error::ChannelDisconnected)?;
        link.cmd_tx
            .try_send(LinkCommand::Send(message))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Closed(_) => Error::ChannelClosed,
                mpsc::error::TrySendError::Full(_) => {
                    Error::transport("control channel queue is full")
                }
            })
    }

    /// Subscribe to inbound events of one kind.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&InboundEvent) + Send + 'static,
    {
        self.handlers.register(kind, Box::new(handler))
    }

    /// Remove a subscription. Returns `false` for unknown ids.
    pub fn off(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every connectivity change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// URL of the current link, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.url.as_str())
    }

    /// Wait for the next channel event, running subscribed handlers first.
    ///
    /// Pends forever while there is no link. Returns `None` once when the
    /// link task has ended on its own (reconnect attempts exhausted, or the
    /// task failed); the state is `Disconnected` from then on and `connect`
    /// with the same URL starts a fresh task. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let Some(event_rx) = self.event_rx.as_mut() else {
            return std::future::pending().await;
        };

        match event_rx.recv().await {
            Some(event) => {
                if let SessionEvent::Inbound(inbound) = &event {
                    self.handlers.dispatch(inbound);
                }
                Some(event)
            }
            None => {
                warn!("Control channel task ended");
                self.event_rx = None;
                // A task that died mid-connection never published its exit
                self.state.send_replace(ConnectionState::Disconnected);
                None
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            let LinkHandle { url, cmd_tx, task } = link;
            let _ = cmd_tx.try_send(LinkCommand::Shutdown);
            drop(cmd_tx);

            let abort = task.abort_handle();
            match tokio::time::timeout(TEARDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => debug!("Control channel to {} closed", url),
                Ok(Err(err)) => warn!("Control channel task for {} failed: {}", url, err),
                Err(_) => {
                    warn!("Control channel to {} did not close in time, aborting", url);
                    abort.abort();
                }
            }
        }
        self.event_rx = None;
        self.state.send_replace(ConnectionState::Disconnected);
    }
}

impl CommandSink for ChannelSession {
    fn send(&self, message: OutboundMessage) -> bool {
        ChannelSession::send(self, message)
    }

    fn connection_state(&self) -> ConnectionState {
        ChannelSession::connection_state(self)
    }
}
