//! # roverdeck-core - Core Domain Types
//!
//! Foundation crate for Rover Deck. Provides the motion, status and command
//! types shared by every other crate, plus error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing, dirs).
//!
//! ## Public API
//!
//! ### Motion (`motion`)
//! - [`MotionVector`] - Normalized `{x, y}` drive intent; zero means stop
//! - [`Direction`], [`KeyState`] - Discrete direction holds
//! - [`InputSource`] - Dpad, keyboard or joystick
//!
//! ### Status (`status`)
//! - [`RobotStatus`] - Cached copy of the latest platform snapshot
//! - [`AutonomyLevel`], [`Camera`], [`ArmJoint`], [`LedState`]
//!
//! ### Commands (`command`)
//! - [`ControlCommand`] - The command vocabulary (wire contract)
//! - [`OutboundMessage`] - One socket event plus payload
//!
//! ### Events (`events`)
//! - [`InboundEvent`] - Status snapshots and acknowledgements
//! - [`ConnectionState`] - Channel connectivity
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use roverdeck_core::prelude::*;
//! ```

pub mod command;
pub mod error;
pub mod events;
pub mod logging;
pub mod motion;
pub mod status;

/// Prelude for common imports used throughout all Rover Deck crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use command::{ControlCommand, OutboundEvent, OutboundMessage};
pub use error::{Error, Result, ResultExt};
pub use events::{CommandAck, ConnectionState, EventKind, InboundEvent};
pub use motion::{Direction, InputSource, KeyState, MotionVector};
pub use status::{
    ArmJoint, ArmPose, AutonomyLevel, Camera, LedState, RobotStatus, Sensors, Ultrasonic,
    ZoomState, LED_MODES,
};
