//! Handler module - TEA update function
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `controls`: Nudge/cycle helpers that turn relative intents into absolute ones
//! - `endpoint`: Endpoint editor and endpoint switch handling

pub(crate) mod controls;
pub(crate) mod endpoint;
pub(crate) mod update;


use roverdeck_core::MotionVector;

use crate::dispatcher::UiAction;
use crate::message::Message;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Transmit a `move` envelope for the aggregator's new combined vector
    SendMotion(MotionVector),

    /// Resolve and send a discrete control intent
    Dispatch(UiAction),

    /// Tear down the channel and reconnect to a freshly saved endpoint
    SwitchEndpoint {
        /// Channel URL of the new endpoint
        url: String,
        /// Send `{0,0}` to the old endpoint before closing it
        flush_stop: bool,
    },

    /// Start a fresh link task to the current endpoint after the old one ended
    Reconnect {
        /// Channel URL of the current endpoint
        url: String,
    },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    /// `SendMotion` when the aggregator emitted, otherwise nothing.
    pub fn motion(vector: Option<MotionVector>) -> Self {
        match vector {
            Some(v) => Self::action(UpdateAction::SendMotion(v)),
            None => Self::none(),
        }
    }
}
