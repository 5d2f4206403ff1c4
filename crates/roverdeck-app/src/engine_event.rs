//! Domain events emitted by the Engine for external consumers
//!
//! Frontends that do not read `AppState` directly (the headless NDJSON
//! runner, tests) subscribe to these via `Engine::subscribe()`.

use roverdeck_core::{ConnectionState, MotionVector, RobotStatus};
use serde_json::Value;

/// Domain events emitted by the Engine.
///
/// Events derived from state changes are broadcast after each message
/// processing cycle; send results are broadcast as the send happens.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Control Channel
    // ─────────────────────────────────────────────────────────
    /// Channel connectivity changed
    ConnectionChanged { state: ConnectionState },

    /// A status snapshot arrived; carries the displayed (reconciled) view
    StatusUpdated { status: RobotStatus },

    /// The platform acknowledged something (advisory)
    Acknowledged { summary: String },

    // ─────────────────────────────────────────────────────────
    // Outbound
    // ─────────────────────────────────────────────────────────
    /// A `move` envelope was handed to the channel (or dropped)
    MotionSent {
        vector: MotionVector,
        delivered: bool,
    },

    /// A discrete command was handed to the channel (or dropped)
    CommandSent {
        command: String,
        payload: Value,
        delivered: bool,
    },

    // ─────────────────────────────────────────────────────────
    // Endpoint
    // ─────────────────────────────────────────────────────────
    /// A new endpoint was saved and the channel is switching to it
    EndpointChanged {
        host: String,
        port: String,
        base_url: String,
    },

    /// An endpoint change was refused; the previous endpoint stays
    EndpointRejected { reason: String },

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Non-fatal problem worth surfacing
    Error { message: String },

    /// The engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Short name for logging and the NDJSON `event` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::ConnectionChanged { .. } => "connection_changed",
            EngineEvent::StatusUpdated { .. } => "status",
            EngineEvent::Acknowledged { .. } => "acknowledged",
            EngineEvent::MotionSent { .. } => "motion_sent",
            EngineEvent::CommandSent { .. } => "command_sent",
            EngineEvent::EndpointChanged { .. } => "endpoint_changed",
            EngineEvent::EndpointRejected { .. } => "endpoint_rejected",
            EngineEvent::Error { .. } => "error",
            EngineEvent::Shutdown => "shutdown",
        }
    }
}
