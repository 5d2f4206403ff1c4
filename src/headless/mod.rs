//! Headless mode - NDJSON in, NDJSON out
//!
//! Operator intents arrive on stdin, one JSON object per line, tagged by
//! `intent`. Engine events leave on stdout, one JSON object per line, tagged
//! by `event` and stamped with a millisecond timestamp.
//!
//! # Example Session
//!
//! ```json
//! {"intent":"key_down","direction":"up"}
//! {"event":"motion_sent","x":0.0,"y":1.0,"delivered":true,"timestamp":1704700001000}
//! {"intent":"control","control":{"action":"camera_pan","angle":120}}
//! {"event":"command_sent","command":"camera_pan","payload":{"angle":120},"delivered":true,"timestamp":1704700002000}
//! ```

pub mod runner;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Write};
use tracing::error;

use roverdeck_app::{EngineEvent, Message, NamedAction, UiAction};
use roverdeck_core::{Direction, RobotStatus};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Control channel connectivity changed
    ConnectionChanged { state: String, timestamp: i64 },

    /// Reconciled platform status after a snapshot
    Status { status: RobotStatus, timestamp: i64 },

    /// A platform acknowledgement arrived
    Acknowledged { summary: String, timestamp: i64 },

    /// A motion vector was handed to the channel (or dropped)
    MotionSent {
        x: f64,
        y: f64,
        delivered: bool,
        timestamp: i64,
    },

    /// A discrete command was handed to the channel (or dropped)
    CommandSent {
        command: String,
        payload: Value,
        delivered: bool,
        timestamp: i64,
    },

    /// New endpoint saved; the channel is reconnecting to it
    EndpointChanged {
        host: String,
        port: String,
        base_url: String,
        timestamp: i64,
    },

    /// Endpoint change refused; the previous endpoint stays
    EndpointRejected { reason: String, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// The engine is shutting down
    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<&EngineEvent> for HeadlessEvent {
    fn from(event: &EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::ConnectionChanged { state } => Self::ConnectionChanged {
                state: state.label().to_string(),
                timestamp,
            },
            EngineEvent::StatusUpdated { status } => Self::Status {
                status: status.clone(),
                timestamp,
            },
            EngineEvent::Acknowledged { summary } => Self::Acknowledged {
                summary: summary.clone(),
                timestamp,
            },
            EngineEvent::MotionSent { vector, delivered } => Self::MotionSent {
                x: vector.x,
                y: vector.y,
                delivered: *delivered,
                timestamp,
            },
            EngineEvent::CommandSent {
                command,
                payload,
                delivered,
            } => Self::CommandSent {
                command: command.clone(),
                payload: payload.clone(),
                delivered: *delivered,
                timestamp,
            },
            EngineEvent::EndpointChanged {
                host,
                port,
                base_url,
            } => Self::EndpointChanged {
                host: host.clone(),
                port: port.clone(),
                base_url: base_url.clone(),
                timestamp,
            },
            EngineEvent::EndpointRejected { reason } => Self::EndpointRejected {
                reason: reason.clone(),
                timestamp,
            },
            EngineEvent::Error { message } => Self::Error {
                message: message.clone(),
                fatal: false,
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

// ─────────────────────────────────────────────────────────
// Intents (stdin)
// ─────────────────────────────────────────────────────────

/// Operator intents accepted on stdin
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum HeadlessIntent {
    KeyDown { direction: Direction },
    KeyUp { direction: Direction },
    DpadDown { direction: Direction },
    DpadUp { direction: Direction },
    DpadLeave,
    Joystick { x: f64, y: f64 },
    JoystickStop,
    ReleaseAll,
    Control { control: UiAction },
    Action { name: NamedAction },
    SetEndpoint { host: String, port: String },
    Quit,
}

impl HeadlessIntent {
    /// Parse one stdin line. Blank lines yield `None`; `q` and `quit` are
    /// accepted bare for interactive use.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, serde_json::Error> {
        match line.trim() {
            "" => Ok(None),
            "q" | "quit" => Ok(Some(Self::Quit)),
            trimmed => serde_json::from_str(trimmed).map(Some),
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Self::KeyDown { direction } => Message::KeyDown(direction),
            Self::KeyUp { direction } => Message::KeyUp(direction),
            Self::DpadDown { direction } => Message::DpadDown(direction),
            Self::DpadUp { direction } => Message::DpadUp(direction),
            Self::DpadLeave => Message::DpadLeave,
            Self::Joystick { x, y } => Message::JoystickMove { x, y },
            Self::JoystickStop => Message::JoystickStop,
            Self::ReleaseAll => Message::ReleaseAll,
            Self::Control { control } => Message::Control(control),
            Self::Action { name } => Message::Action(name),
            Self::SetEndpoint { host, port } => Message::SetEndpoint { host, port },
            Self::Quit => Message::Quit,
        }
    }
}
