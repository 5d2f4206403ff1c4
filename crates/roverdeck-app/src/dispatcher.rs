//! Command Dispatcher: discrete operator intents to wire commands.
//!
//! Stateless apart from the configured zoom range. Every numeric input is
//! clamped into its documented range; nothing here can fail.

use serde::{Deserialize, Serialize};

use roverdeck_core::prelude::*;
use roverdeck_core::{ArmJoint, AutonomyLevel, Camera, ControlCommand, OutboundMessage};
use roverdeck_link::CommandSink;

use crate::config::ControlSettings;

/// Servo angle range for `camera_pan` and `arm_control`.
pub const SERVO_RANGE: (u8, u8) = (0, 180);

/// Speed limit range for `set_speed`.
pub const SPEED_RANGE: (u8, u8) = (0, 100);

/// Parameterless platform actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedAction {
    TrackFace,
    LineTracking,
    ObstacleAvoidance,
    Pickup,
    Drop,
    EmergencyStop,
}

impl NamedAction {
    pub const ALL: [NamedAction; 6] = [
        NamedAction::TrackFace,
        NamedAction::LineTracking,
        NamedAction::ObstacleAvoidance,
        NamedAction::Pickup,
        NamedAction::Drop,
        NamedAction::EmergencyStop,
    ];

    pub fn command(self) -> ControlCommand {
        match self {
            NamedAction::TrackFace => ControlCommand::TrackFace,
            NamedAction::LineTracking => ControlCommand::LineTracking,
            NamedAction::ObstacleAvoidance => ControlCommand::ObstacleAvoidance,
            NamedAction::Pickup => ControlCommand::Pickup,
            NamedAction::Drop => ControlCommand::Drop,
            NamedAction::EmergencyStop => ControlCommand::EmergencyStop,
        }
    }
}

/// A discrete operator intent with raw, unclamped values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    CameraPan { angle: f64 },
    Arm { joint: ArmJoint, value: f64 },
    Zoom { camera: Camera, factor: f64 },
    Led { mode: String, r: f64, g: f64, b: f64 },
    Speed { value: f64 },
    Autonomy { level: AutonomyLevel },
    Named { name: NamedAction },
}

/// A clamped, ready-to-send command.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Command(ControlCommand),
    SetAutonomy(AutonomyLevel),
}

impl Dispatch {
    pub fn message(&self) -> OutboundMessage {
        match self {
            Dispatch::Command(command) => OutboundMessage::command(command),
            Dispatch::SetAutonomy(level) => OutboundMessage::set_autonomy(*level),
        }
    }

    /// Wire name, for logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            Dispatch::Command(command) => command.name(),
            Dispatch::SetAutonomy(_) => "set_autonomy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandDispatcher {
    zoom_range: (f64, f64),
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(&ControlSettings::default())
    }
}

impl CommandDispatcher {
    pub fn new(control: &ControlSettings) -> Self {
        Self {
            zoom_range: control.zoom_range(),
        }
    }

    pub fn zoom_range(&self) -> (f64, f64) {
        self.zoom_range
    }

    /// Map an intent to its clamped command.
    pub fn resolve(&self, action: &UiAction) -> Dispatch {
        match action {
            UiAction::CameraPan { angle } => Dispatch::Command(ControlCommand::CameraPan {
                angle: clamp_u8(*angle, SERVO_RANGE),
            }),
            UiAction::Arm { joint, value } => Dispatch::Command(ControlCommand::ArmControl {
                joint: *joint,
                value: clamp_u8(*value, SERVO_RANGE),
            }),
            UiAction::Zoom { camera, factor } => Dispatch::Command(ControlCommand::SetZoom {
                camera: *camera,
                factor: clamp_f64(*factor, self.zoom_range),
            }),
            UiAction::Led { mode, r, g, b } => Dispatch::Command(ControlCommand::SetLed {
                mode: mode.clone(),
                r: clamp_u8(*r, (0, 255)),
                g: clamp_u8(*g, (0, 255)),
                b: clamp_u8(*b, (0, 255)),
            }),
            UiAction::Speed { value } => Dispatch::Command(ControlCommand::SetSpeed {
                value: clamp_u8(*value, SPEED_RANGE),
            }),
            UiAction::Autonomy { level } => Dispatch::SetAutonomy(*level),
            UiAction::Named { name } => Dispatch::Command(name.command()),
        }
    }

    /// Resolve and send. Also reports whether the envelope was enqueued.
    pub fn dispatch(&self, sink: &impl CommandSink, action: &UiAction) -> (Dispatch, bool) {
        let resolved = self.resolve(action);
        let sent = sink.send(resolved.message());
        if !sent {
            debug!("Dropped {} (channel not connected)", resolved.name());
        }
        (resolved, sent)
    }
}

/// Round and clamp into `[lo, hi]`; non-finite goes to `lo`.
fn clamp_u8(value: f64, (lo, hi): (u8, u8)) -> u8 {
    if !value.is_finite() {
        return lo;
    }
    value.round().clamp(lo as f64, hi as f64) as u8
}

fn clamp_f64(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if !value.is_finite() {
        return lo;
    }
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roverdeck_link::MockCommandSink;
    use serde_json::json;

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::default()
    }

    #[test]
    fn test_camera_pan_is_clamped() {
        let resolved = dispatcher().resolve(&UiAction::CameraPan { angle: 200.0 });
        assert_eq!(
            resolved,
            Dispatch::Command(ControlCommand::CameraPan { angle: 180 })
        );
        let resolved = dispatcher().resolve(&UiAction::CameraPan { angle: -15.0 });
        assert_eq!(
            resolved,
            Dispatch::Command(ControlCommand::CameraPan { angle: 0 })
        );
    }

    #[test]
    fn test_zoom_is_clamped_to_configured_range() {
        let resolved = dispatcher().resolve(&UiAction::Zoom {
            camera: Camera::Front,
            factor: 7.0,
        });
        assert_eq!(resolved.message().payload["params"]["factor"], 5.0);

        let resolved = dispatcher().resolve(&UiAction::Zoom {
            camera: Camera::Rear,
            factor: 0.2,
        });
        assert_eq!(resolved.message().payload["params"]["factor"], 1.0);

        let wide = CommandDispatcher::new(&ControlSettings {
            zoom_max: 10.0,
            ..Default::default()
        });
        let resolved = wide.resolve(&UiAction::Zoom {
            camera: Camera::Front,
            factor: 7.0,
        });
        assert_eq!(resolved.message().payload["params"]["factor"], 7.0);
    }

    #[test]
    fn test_non_finite_inputs_clamp_to_lower_bound() {
        let d = dispatcher();
        assert_eq!(
            d.resolve(&UiAction::Speed { value: f64::NAN }),
            Dispatch::Command(ControlCommand::SetSpeed { value: 0 })
        );
        assert_eq!(
            d.resolve(&UiAction::Arm {
                joint: ArmJoint::Lift,
                value: f64::INFINITY
            }),
            Dispatch::Command(ControlCommand::ArmControl {
                joint: ArmJoint::Lift,
                value: 0
            })
        );
        match d.resolve(&UiAction::Zoom {
            camera: Camera::Front,
            factor: f64::NEG_INFINITY,
        }) {
            Dispatch::Command(ControlCommand::SetZoom { factor, .. }) => assert_eq!(factor, 1.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_speed_and_led_ranges() {
        let d = dispatcher();
        assert_eq!(
            d.resolve(&UiAction::Speed { value: 150.0 }),
            Dispatch::Command(ControlCommand::SetSpeed { value: 100 })
        );
        let led = d.resolve(&UiAction::Led {
            mode: "police".into(),
            r: 300.0,
            g: -4.0,
            b: 127.6,
        });
        assert_eq!(
            led.message().payload,
            json!({"command": "set_led", "params": {"mode": "police", "r": 255, "g": 0, "b": 128}})
        );
    }

    #[test]
    fn test_autonomy_uses_set_autonomy_event() {
        let resolved = dispatcher().resolve(&UiAction::Autonomy {
            level: AutonomyLevel::Auto,
        });
        assert_eq!(resolved.name(), "set_autonomy");
        assert_eq!(resolved.message().payload, json!({"level": "auto"}));
    }

    #[test]
    fn test_named_actions_have_no_params() {
        for name in NamedAction::ALL {
            let msg = dispatcher()
                .resolve(&UiAction::Named { name })
                .message();
            assert_eq!(msg.payload["params"], json!({}));
        }
        let msg = dispatcher()
            .resolve(&UiAction::Named {
                name: NamedAction::EmergencyStop,
            })
            .message();
        assert_eq!(msg.payload["command"], "emergency_stop");
    }

    #[test]
    fn test_dispatch_sends_through_sink() {
        let mut sink = MockCommandSink::new();
        sink.expect_send()
            .withf(|msg| {
                msg.payload == json!({"command": "camera_pan", "params": {"angle": 180}})
            })
            .times(1)
            .return_const(true);

        let (resolved, sent) = dispatcher().dispatch(&sink, &UiAction::CameraPan { angle: 999.0 });
        assert!(sent);
        assert_eq!(
            resolved,
            Dispatch::Command(ControlCommand::CameraPan { angle: 180 })
        );
    }

    #[test]
    fn test_dispatch_reports_drop() {
        let mut sink = MockCommandSink::new();
        sink.expect_send().times(1).return_const(false);
        let (_, sent) = dispatcher().dispatch(
            &sink,
            &UiAction::Named {
                name: NamedAction::Pickup,
            },
        );
        assert!(!sent);
    }

    #[test]
    fn test_ui_action_json_shape() {
        let action: UiAction =
            serde_json::from_value(json!({"action": "arm", "joint": "claw", "value": 30}))
                .unwrap();
        assert_eq!(
            action,
            UiAction::Arm {
                joint: ArmJoint::Claw,
                value: 30.0
            }
        );
        let action: UiAction =
            serde_json::from_value(json!({"action": "named", "name": "line_tracking"})).unwrap();
        assert_eq!(
            action,
            UiAction::Named {
                name: NamedAction::LineTracking
            }
        );
    }
}
