//! Robot status snapshot and the small enums shared with the command layer.
//!
//! The platform owns every value here. A [`RobotStatus`] is a cached copy of
//! the latest snapshot; nothing in this module validates reported ranges.
//!
//! Every field parses leniently: a value of the wrong shape degrades to
//! "not reported" instead of failing the whole snapshot.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Autonomy level understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    #[default]
    Manual,
    Semi,
    Auto,
}

impl AutonomyLevel {
    pub const ALL: [AutonomyLevel; 3] = [
        AutonomyLevel::Manual,
        AutonomyLevel::Semi,
        AutonomyLevel::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutonomyLevel::Manual => "manual",
            AutonomyLevel::Semi => "semi",
            AutonomyLevel::Auto => "auto",
        }
    }
}

impl std::fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera mounted on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Camera {
    Front,
    Rear,
}

impl Camera {
    pub fn as_str(&self) -> &'static str {
        match self {
            Camera::Front => "front",
            Camera::Rear => "rear",
        }
    }
}

impl std::fmt::Display for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arm joint addressed by `arm_control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmJoint {
    Lift,
    Claw,
}

impl ArmJoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmJoint::Lift => "lift",
            ArmJoint::Claw => "claw",
        }
    }
}

/// LED strip state: a pattern name plus a base colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    #[serde(default, deserialize_with = "lenient")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient_channel")]
    pub r: u8,
    #[serde(default, deserialize_with = "lenient_channel")]
    pub g: u8,
    #[serde(default, deserialize_with = "lenient_channel")]
    pub b: u8,
}

/// LED pattern names the platform's pattern engine knows about.
pub const LED_MODES: &[&str] = &[
    "off",
    "static",
    "blink",
    "breath",
    "police",
    "ambulance",
    "chaser",
    "fire",
    "rainbow",
    "color_wipe",
    "theater_chase",
    "strobe",
    "twinkle",
    "sparkle",
    "meteor",
    "heartbeat",
    "disco",
];

/// Ultrasonic range reading: older firmware reports one number, newer
/// firmware reports one reading per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ultrasonic {
    Single(f64),
    PerSide(BTreeMap<String, f64>),
}

impl Ultrasonic {
    /// Closest obstacle across all sides, in centimetres.
    pub fn nearest(&self) -> Option<f64> {
        match self {
            Ultrasonic::Single(v) => Some(*v),
            Ultrasonic::PerSide(sides) => sides.values().copied().reduce(f64::min),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub ultrasonic: Option<Ultrasonic>,
    /// Line-tracking channels; a bare reading is kept as a one-element list
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub infrared: Vec<Value>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmPose {
    #[serde(
        default,
        deserialize_with = "lenient_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub lift: Option<u16>,
    #[serde(
        default,
        deserialize_with = "lenient_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub claw: Option<u16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub front: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub rear: Option<f64>,
}

impl ZoomState {
    pub fn get(&self, camera: Camera) -> Option<f64> {
        match camera {
            Camera::Front => self.front,
            Camera::Rear => self.rear,
        }
    }
}

/// Authoritative platform status snapshot (`status.robot_state`).
///
/// Snapshots are total, not deltas. Fields the platform does not report stay
/// `None`; unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub battery: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sensors: Sensors,
    /// Free-text activity label, e.g. "standby"
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub autonomy_level: Option<AutonomyLevel>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub speed_limit: Option<u16>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub camera_pan: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub arm: ArmPose,
    #[serde(default, deserialize_with = "lenient")]
    pub zoom: ZoomState,
    #[serde(default, deserialize_with = "lenient")]
    pub led: Option<LedState>,
    #[serde(default, deserialize_with = "lenient")]
    pub active_modules: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Lenient field parsers
// ---------------------------------------------------------------------------

/// Parse `T`, falling back to its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            tracing::debug!("Ignoring status field {}: {}", value, err);
            Ok(T::default())
        }
    }
}

/// Any finite number, rounded and saturated to `u16`.
fn lenient_position<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, f64::from(u16::MAX)) as u16))
}

/// Any finite number, rounded and saturated to `u8`; anything else is 0.
fn lenient_channel<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, f64::from(u8::MAX)) as u8)
        .unwrap_or(0))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_platform_snapshot() {
        let json = r#"{
            "autonomy_level": "manual",
            "battery": 99.87,
            "status": "standby",
            "sensors": {"ultrasonic": 42.5},
            "active_modules": []
        }"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.autonomy_level, Some(AutonomyLevel::Manual));
        assert_eq!(status.battery, Some(99.87));
        assert_eq!(status.status.as_deref(), Some("standby"));
        assert_eq!(
            status.sensors.ultrasonic,
            Some(Ultrasonic::Single(42.5))
        );
        assert_eq!(status.arm.lift, None);
    }

    #[test]
    fn test_parse_per_side_ultrasonic_and_infrared() {
        let json = r#"{
            "sensors": {
                "ultrasonic": {"left": 30.0, "right": 12.5},
                "infrared": [0, 1, 0],
                "imu": {"yaw": 1.2}
            }
        }"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();
        let us = status.sensors.ultrasonic.unwrap();
        assert_eq!(us.nearest(), Some(12.5));
        assert_eq!(status.sensors.infrared.len(), 3);
        assert!(status.sensors.other.contains_key("imu"));
    }

    #[test]
    fn test_parse_controllable_axes() {
        let json = r#"{
            "camera_pan": 120,
            "arm": {"lift": 90, "claw": 45},
            "zoom": {"front": 2.5},
            "led": {"mode": "police", "r": 255, "g": 0, "b": 0},
            "speed_limit": 60
        }"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.camera_pan, Some(120));
        assert_eq!(status.arm.lift, Some(90));
        assert_eq!(status.arm.claw, Some(45));
        assert_eq!(status.zoom.get(Camera::Front), Some(2.5));
        assert_eq!(status.zoom.get(Camera::Rear), None);
        assert_eq!(status.led.unwrap().mode, "police");
        assert_eq!(status.speed_limit, Some(60));
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let json = r#"{"battery": 50, "firmware": "1.4.2"}"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();
        assert_eq!(
            status.extra.get("firmware"),
            Some(&Value::String("1.4.2".into()))
        );
    }

    #[test]
    fn test_mistyped_fields_do_not_drop_the_snapshot() {
        let json = r#"{
            "battery": 50.0,
            "camera_pan": 90.5,
            "speed_limit": "fast",
            "autonomy_level": "full",
            "sensors": {"ultrasonic": "n/a", "infrared": 5},
            "arm": {"lift": -3, "claw": [1]},
            "zoom": {"front": "2x", "rear": 1.5},
            "led": {"mode": "police", "r": 300, "g": 12.4, "b": "blue"},
            "active_modules": "line_tracking"
        }"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();

        assert_eq!(status.battery, Some(50.0));
        assert_eq!(status.camera_pan, Some(91));
        assert_eq!(status.speed_limit, None);
        assert_eq!(status.autonomy_level, None);
        assert_eq!(status.sensors.ultrasonic, None);
        assert_eq!(status.sensors.infrared, vec![Value::from(5)]);
        assert_eq!(status.arm.lift, Some(0));
        assert_eq!(status.arm.claw, None);
        assert_eq!(status.zoom.front, None);
        assert_eq!(status.zoom.rear, Some(1.5));
        assert_eq!(
            status.led,
            Some(LedState {
                mode: "police".into(),
                r: 255,
                g: 12,
                b: 0,
            })
        );
        assert!(status.active_modules.is_empty());
    }

    #[test]
    fn test_led_without_mode_keeps_colour() {
        let status: RobotStatus =
            serde_json::from_str(r#"{"led": {"r": 10, "g": 20, "b": 30}}"#).unwrap();
        let led = status.led.unwrap();
        assert_eq!(led.mode, "");
        assert_eq!((led.r, led.g, led.b), (10, 20, 30));
    }

    #[test]
    fn test_null_fields_are_not_reported() {
        let json = r#"{"battery": null, "led": null, "arm": null, "sensors": {"infrared": null}}"#;
        let status: RobotStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status, RobotStatus::default());
    }

    #[test]
    fn test_autonomy_level_names() {
        for level in AutonomyLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }

    #[test]
    fn test_led_modes_include_off() {
        assert_eq!(LED_MODES[0], "off");
    }
}
