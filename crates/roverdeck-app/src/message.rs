//! Message types for the application (TEA pattern)

use roverdeck_core::{ArmJoint, Camera, Direction};
use roverdeck_link::SessionEvent;

use crate::dispatcher::{NamedAction, UiAction};

/// All possible messages/actions in the application
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Motion Input Edges
    // ─────────────────────────────────────────────────────────
    /// Keyboard direction pressed
    KeyDown(Direction),
    /// Keyboard direction released
    KeyUp(Direction),
    /// On-screen dpad button pressed
    DpadDown(Direction),
    /// On-screen dpad button released
    DpadUp(Direction),
    /// Pointer left the pressed dpad button
    DpadLeave,
    /// Analog stick sample
    JoystickMove { x: f64, y: f64 },
    /// Analog stick released
    JoystickStop,
    /// Release every motion source (focus loss, panic key)
    ReleaseAll,

    // ─────────────────────────────────────────────────────────
    // Discrete Controls
    // ─────────────────────────────────────────────────────────
    /// Absolute control intent
    Control(UiAction),
    /// Named platform action
    Action(NamedAction),
    /// Pan the camera by a number of servo steps (negative = left)
    NudgePan(i16),
    /// Move an arm joint by a number of servo steps
    NudgeArm { joint: ArmJoint, steps: i16 },
    /// Change the speed limit by a number of speed steps
    NudgeSpeed(i16),
    /// Zoom the selected camera by a factor delta
    NudgeZoom(f64),
    /// Choose which camera zoom keys apply to
    SelectCamera(Camera),
    /// Advance to the next LED pattern
    CycleLedMode,
    /// Advance manual → semi → auto → manual
    CycleAutonomy,

    // ─────────────────────────────────────────────────────────
    // Endpoint
    // ─────────────────────────────────────────────────────────
    /// Validate, persist and switch to a new endpoint
    SetEndpoint { host: String, port: String },
    /// Open the endpoint editor prefilled with the current endpoint
    OpenEndpointEditor,
    /// Close the editor without saving
    CloseEndpointEditor,
    /// Type a character into the focused editor field
    EditorInput(char),
    /// Delete the last character of the focused editor field
    EditorBackspace,
    /// Move focus between host and port
    EditorNextField,
    /// Submit the editor (becomes `SetEndpoint`)
    EditorSubmit,

    // ─────────────────────────────────────────────────────────
    // Control Channel
    // ─────────────────────────────────────────────────────────
    /// Connectivity change or inbound platform event
    Channel(SessionEvent),
    /// The channel task stopped on its own
    ChannelEnded,

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Quit the application
    Quit,
}
