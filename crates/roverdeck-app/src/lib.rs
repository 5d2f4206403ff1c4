//! roverdeck-app - Coordinator state and orchestration for Rover Deck
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! teleoperation coordinator: the Endpoint Registry, the Input Aggregator,
//! the Command Dispatcher and the State Reconciler all live in [`AppState`],
//! mutated only by [`handler::update`]. The [`Engine`] owns the Channel
//! Session and drives the update loop for both frontends.

pub mod actions;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod input;
pub mod message;
pub mod reconciler;
pub mod signals;
pub mod state;

// Re-export primary types
pub use dispatcher::{CommandDispatcher, Dispatch, NamedAction, UiAction};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use input::InputAggregator;
pub use message::Message;
pub use reconciler::{Acknowledgement, AxisValue, ControlAxis, StateReconciler};
pub use state::{AppState, EditorField, EndpointEditorState, UiMode};
