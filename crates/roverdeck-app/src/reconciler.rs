//! State Reconciler: the platform's snapshot plus short-lived local edits.
//!
//! Each `status` snapshot replaces the cached [`RobotStatus`] wholesale. An
//! axis the operator just changed keeps showing the local value through the
//! first snapshot after the edit (which may predate the command), and defers
//! to the platform from the second snapshot on, echo or not.

use std::collections::HashMap;

use roverdeck_core::{
    ArmJoint, AutonomyLevel, Camera, CommandAck, ControlCommand, LedState, RobotStatus,
};

use crate::dispatcher::Dispatch;

/// Snapshots an edit survives before the platform value wins again.
const GRACE_SNAPSHOTS: u8 = 1;

/// Controllable axis that can carry a local override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAxis {
    CameraPan,
    Arm(ArmJoint),
    Zoom(Camera),
    Led,
    Speed,
    Autonomy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AxisValue {
    Angle(u16),
    Zoom(f64),
    Led(LedState),
    Speed(u16),
    Autonomy(AutonomyLevel),
}

impl AxisValue {
    pub fn as_angle(&self) -> Option<u16> {
        match self {
            AxisValue::Angle(v) | AxisValue::Speed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_zoom(&self) -> Option<f64> {
        match self {
            AxisValue::Zoom(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingEdit {
    value: AxisValue,
    snapshots_seen: u8,
}

/// Advisory acknowledgement, kept for display only.
#[derive(Debug, Clone, PartialEq)]
pub enum Acknowledgement {
    Command(CommandAck),
    Autonomy(AutonomyLevel),
}

impl Acknowledgement {
    pub fn summary(&self) -> String {
        match self {
            Acknowledgement::Command(ack) => match (&ack.action, &ack.status) {
                (Some(action), Some(status)) => format!("{action}: {status}"),
                (Some(action), None) => action.clone(),
                (None, Some(status)) => status.clone(),
                (None, None) => ack.raw.to_string(),
            },
            Acknowledgement::Autonomy(level) => format!("autonomy → {level}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateReconciler {
    snapshot: Option<RobotStatus>,
    pending: HashMap<ControlAxis, PendingEdit>,
    last_ack: Option<Acknowledgement>,
    snapshot_count: u64,
    ack_count: u64,
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the value just sent for an axis. Re-editing restarts the grace.
    pub fn record_edit(&mut self, dispatch: &Dispatch) {
        if let Some((axis, value)) = edit_for(dispatch) {
            self.pending.insert(
                axis,
                PendingEdit {
                    value,
                    snapshots_seen: 0,
                },
            );
        }
    }

    /// Adopt a new authoritative snapshot and age pending edits.
    pub fn apply_snapshot(&mut self, status: RobotStatus) {
        self.snapshot = Some(status);
        self.snapshot_count += 1;
        for edit in self.pending.values_mut() {
            edit.snapshots_seen = edit.snapshots_seen.saturating_add(1);
        }
        self.pending
            .retain(|_, edit| edit.snapshots_seen <= GRACE_SNAPSHOTS);
    }

    pub fn record_ack(&mut self, ack: Acknowledgement) {
        self.last_ack = Some(ack);
        self.ack_count += 1;
    }

    /// Forget everything; used when switching endpoints.
    pub fn clear(&mut self) {
        self.snapshot = None;
        self.pending.clear();
        self.last_ack = None;
    }

    pub fn snapshot(&self) -> Option<&RobotStatus> {
        self.snapshot.as_ref()
    }

    pub fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    pub fn ack_count(&self) -> u64 {
        self.ack_count
    }

    pub fn last_ack(&self) -> Option<&Acknowledgement> {
        self.last_ack.as_ref()
    }

    pub fn is_pending(&self, axis: ControlAxis) -> bool {
        self.pending.contains_key(&axis)
    }

    /// Displayed value of an axis: pending edit first, then the snapshot.
    pub fn value(&self, axis: ControlAxis) -> Option<AxisValue> {
        if let Some(edit) = self.pending.get(&axis) {
            return Some(edit.value.clone());
        }
        let status = self.snapshot.as_ref()?;
        match axis {
            ControlAxis::CameraPan => status.camera_pan.map(AxisValue::Angle),
            ControlAxis::Arm(ArmJoint::Lift) => status.arm.lift.map(AxisValue::Angle),
            ControlAxis::Arm(ArmJoint::Claw) => status.arm.claw.map(AxisValue::Angle),
            ControlAxis::Zoom(camera) => status.zoom.get(camera).map(AxisValue::Zoom),
            ControlAxis::Led => status.led.clone().map(AxisValue::Led),
            ControlAxis::Speed => status.speed_limit.map(AxisValue::Speed),
            ControlAxis::Autonomy => status.autonomy_level.map(AxisValue::Autonomy),
        }
    }

    /// The snapshot with pending edits laid over it.
    pub fn view(&self) -> RobotStatus {
        let mut status = self.snapshot.clone().unwrap_or_default();
        for (axis, edit) in &self.pending {
            match (axis, &edit.value) {
                (ControlAxis::CameraPan, AxisValue::Angle(v)) => status.camera_pan = Some(*v),
                (ControlAxis::Arm(ArmJoint::Lift), AxisValue::Angle(v)) => {
                    status.arm.lift = Some(*v)
                }
                (ControlAxis::Arm(ArmJoint::Claw), AxisValue::Angle(v)) => {
                    status.arm.claw = Some(*v)
                }
                (ControlAxis::Zoom(Camera::Front), AxisValue::Zoom(v)) => {
                    status.zoom.front = Some(*v)
                }
                (ControlAxis::Zoom(Camera::Rear), AxisValue::Zoom(v)) => {
                    status.zoom.rear = Some(*v)
                }
                (ControlAxis::Led, AxisValue::Led(led)) => status.led = Some(led.clone()),
                (ControlAxis::Speed, AxisValue::Speed(v)) => status.speed_limit = Some(*v),
                (ControlAxis::Autonomy, AxisValue::Autonomy(level)) => {
                    status.autonomy_level = Some(*level)
                }
                _ => {}
            }
        }
        status
    }
}

fn edit_for(dispatch: &Dispatch) -> Option<(ControlAxis, AxisValue)> {
    match dispatch {
        Dispatch::SetAutonomy(level) => {
            Some((ControlAxis::Autonomy, AxisValue::Autonomy(*level)))
        }
        Dispatch::Command(command) => match command {
            ControlCommand::CameraPan { angle } => {
                Some((ControlAxis::CameraPan, AxisValue::Angle(u16::from(*angle))))
            }
            ControlCommand::ArmControl { joint, value } => {
                Some((ControlAxis::Arm(*joint), AxisValue::Angle(u16::from(*value))))
            }
            ControlCommand::SetZoom { camera, factor } => {
                Some((ControlAxis::Zoom(*camera), AxisValue::Zoom(*factor)))
            }
            ControlCommand::SetLed { mode, r, g, b } => Some((
                ControlAxis::Led,
                AxisValue::Led(LedState {
                    mode: mode.clone(),
                    r: *r,
                    g: *g,
                    b: *b,
                }),
            )),
            ControlCommand::SetSpeed { value } => {
                Some((ControlAxis::Speed, AxisValue::Speed(u16::from(*value))))
            }
            _ => None,
        },
    }
}
