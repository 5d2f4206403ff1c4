//! Outbound command vocabulary.
//!
//! This is the wire contract with the platform: command names and parameter
//! keys must match exactly what the platform dispatches on. Values arriving
//! here are expected to be clamped already (see the dispatcher in
//! `roverdeck-app`).

use serde_json::{json, Map, Value};

use crate::motion::MotionVector;
use crate::status::{ArmJoint, AutonomyLevel, Camera};

/// A single control command carried in a `control_command` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Move(MotionVector),
    CameraPan { angle: u8 },
    ArmControl { joint: ArmJoint, value: u8 },
    SetZoom { camera: Camera, factor: f64 },
    SetLed { mode: String, r: u8, g: u8, b: u8 },
    SetSpeed { value: u8 },
    TrackFace,
    LineTracking,
    ObstacleAvoidance,
    Pickup,
    Drop,
    /// Honoured by the platform even in full autonomy
    EmergencyStop,
}

impl ControlCommand {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::Move(_) => "move",
            ControlCommand::CameraPan { .. } => "camera_pan",
            ControlCommand::ArmControl { .. } => "arm_control",
            ControlCommand::SetZoom { .. } => "set_zoom",
            ControlCommand::SetLed { .. } => "set_led",
            ControlCommand::SetSpeed { .. } => "set_speed",
            ControlCommand::TrackFace => "track_face",
            ControlCommand::LineTracking => "line_tracking",
            ControlCommand::ObstacleAvoidance => "obstacle_avoidance",
            ControlCommand::Pickup => "pickup",
            ControlCommand::Drop => "drop",
            ControlCommand::EmergencyStop => "emergency_stop",
        }
    }

    /// Parameter object; empty for named actions.
    pub fn params(&self) -> Value {
        match self {
            ControlCommand::Move(v) => json!({ "x": v.x, "y": v.y }),
            ControlCommand::CameraPan { angle } => json!({ "angle": angle }),
            ControlCommand::ArmControl { joint, value } => {
                json!({ "joint": joint.as_str(), "value": value })
            }
            ControlCommand::SetZoom { camera, factor } => {
                json!({ "camera": camera.as_str(), "factor": factor })
            }
            ControlCommand::SetLed { mode, r, g, b } => {
                json!({ "mode": mode, "r": r, "g": g, "b": b })
            }
            ControlCommand::SetSpeed { value } => json!({ "value": value }),
            ControlCommand::TrackFace
            | ControlCommand::LineTracking
            | ControlCommand::ObstacleAvoidance
            | ControlCommand::Pickup
            | ControlCommand::Drop
            | ControlCommand::EmergencyStop => Value::Object(Map::new()),
        }
    }
}

/// Socket event names the client emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundEvent {
    ControlCommand,
    SetAutonomy,
}

impl OutboundEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundEvent::ControlCommand => "control_command",
            OutboundEvent::SetAutonomy => "set_autonomy",
        }
    }
}

/// One outbound socket event with its JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub event: OutboundEvent,
    pub payload: Value,
}

impl OutboundMessage {
    /// Wrap a command in the `{command, params}` envelope.
    pub fn command(command: &ControlCommand) -> Self {
        Self {
            event: OutboundEvent::ControlCommand,
            payload: json!({
                "command": command.name(),
                "params": command.params(),
            }),
        }
    }

    pub fn motion(vector: MotionVector) -> Self {
        Self::command(&ControlCommand::Move(vector))
    }

    pub fn set_autonomy(level: AutonomyLevel) -> Self {
        Self {
            event: OutboundEvent::SetAutonomy,
            payload: json!({ "level": level.as_str() }),
        }
    }

    /// Command name for `control_command` envelopes.
    pub fn command_name(&self) -> Option<&str> {
        match self.event {
            OutboundEvent::ControlCommand => self.payload.get("command").and_then(Value::as_str),
            OutboundEvent::SetAutonomy => None,
        }
    }

    /// Decode the motion vector if this is a `move` envelope.
    pub fn motion_vector(&self) -> Option<MotionVector> {
        if self.command_name() != Some("move") {
            return None;
        }
        let params = self.payload.get("params")?;
        Some(MotionVector {
            x: params.get("x")?.as_f64()?,
            y: params.get("y")?.as_f64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_envelope() {
        let msg = OutboundMessage::motion(MotionVector { x: 0.0, y: 1.0 });
        assert_eq!(msg.event, OutboundEvent::ControlCommand);
        assert_eq!(
            msg.payload,
            json!({"command": "move", "params": {"x": 0.0, "y": 1.0}})
        );
        assert_eq!(msg.motion_vector(), Some(MotionVector { x: 0.0, y: 1.0 }));
    }

    #[test]
    fn test_arm_control_envelope() {
        let msg = OutboundMessage::command(&ControlCommand::ArmControl {
            joint: ArmJoint::Claw,
            value: 45,
        });
        assert_eq!(
            msg.payload,
            json!({"command": "arm_control", "params": {"joint": "claw", "value": 45}})
        );
    }

    #[test]
    fn test_named_action_has_empty_params() {
        let msg = OutboundMessage::command(&ControlCommand::TrackFace);
        assert_eq!(msg.payload["command"], "track_face");
        assert_eq!(msg.payload["params"], json!({}));
        assert_eq!(msg.motion_vector(), None);
    }

    #[test]
    fn test_set_autonomy_uses_dedicated_event() {
        let msg = OutboundMessage::set_autonomy(AutonomyLevel::Semi);
        assert_eq!(msg.event.as_str(), "set_autonomy");
        assert_eq!(msg.payload, json!({"level": "semi"}));
        assert_eq!(msg.command_name(), None);
    }

    #[test]
    fn test_command_names_match_vocabulary() {
        let names: Vec<&str> = [
            ControlCommand::Move(MotionVector::ZERO),
            ControlCommand::CameraPan { angle: 0 },
            ControlCommand::ArmControl {
                joint: ArmJoint::Lift,
                value: 0,
            },
            ControlCommand::SetZoom {
                camera: Camera::Front,
                factor: 1.0,
            },
            ControlCommand::SetLed {
                mode: "off".into(),
                r: 0,
                g: 0,
                b: 0,
            },
            ControlCommand::SetSpeed { value: 0 },
            ControlCommand::LineTracking,
            ControlCommand::ObstacleAvoidance,
            ControlCommand::Pickup,
            ControlCommand::Drop,
        ]
        .iter()
        .map(ControlCommand::name)
        .collect();

        assert_eq!(
            names,
            vec![
                "move",
                "camera_pan",
                "arm_control",
                "set_zoom",
                "set_led",
                "set_speed",
                "line_tracking",
                "obstacle_avoidance",
                "pickup",
                "drop",
            ]
        );
    }
}
