//! Relative operator intents (nudges, cycles) resolved against the displayed
//! state into absolute [`UiAction`]s. `None` means the control is already at
//! its bound and nothing needs sending.

use roverdeck_core::{ArmJoint, AutonomyLevel, LED_MODES};

use crate::dispatcher::{UiAction, SERVO_RANGE, SPEED_RANGE};
use crate::reconciler::{AxisValue, ControlAxis};
use crate::state::AppState;

pub(crate) fn nudge_pan(state: &AppState, steps: i16) -> Option<UiAction> {
    let current = state.angle(ControlAxis::CameraPan);
    step_within(current, steps, state.control.servo_step, SERVO_RANGE)
        .map(|angle| UiAction::CameraPan { angle })
}

pub(crate) fn nudge_arm(state: &AppState, joint: ArmJoint, steps: i16) -> Option<UiAction> {
    let current = state.angle(ControlAxis::Arm(joint));
    step_within(current, steps, state.control.servo_step, SERVO_RANGE)
        .map(|value| UiAction::Arm { joint, value })
}

pub(crate) fn nudge_speed(state: &AppState, steps: i16) -> Option<UiAction> {
    let current = state.speed_limit();
    step_within(current, steps, state.control.speed_step, SPEED_RANGE)
        .map(|value| UiAction::Speed { value })
}

pub(crate) fn nudge_zoom(state: &AppState, delta: f64) -> Option<UiAction> {
    if !delta.is_finite() {
        return None;
    }
    let camera = state.selected_camera;
    let (lo, hi) = state.dispatcher.zoom_range();
    let current = state.zoom(camera);
    let target = (current + delta).clamp(lo, hi);
    if (target - current).abs() < f64::EPSILON {
        return None;
    }
    Some(UiAction::Zoom {
        camera,
        factor: target,
    })
}

/// Advance the LED pattern, keeping the current colour.
pub(crate) fn cycle_led(state: &mut AppState) -> Option<UiAction> {
    state.led_mode_index = (state.led_mode_index + 1) % LED_MODES.len();
    let (r, g, b) = match state.reconciler.value(ControlAxis::Led) {
        Some(AxisValue::Led(led)) => (led.r, led.g, led.b),
        _ => (255, 255, 255),
    };
    Some(UiAction::Led {
        mode: state.led_mode().to_string(),
        r: r as f64,
        g: g as f64,
        b: b as f64,
    })
}

pub(crate) fn cycle_autonomy(state: &AppState) -> Option<UiAction> {
    let current = state.autonomy();
    let index = AutonomyLevel::ALL
        .iter()
        .position(|level| *level == current)
        .unwrap_or(0);
    let level = AutonomyLevel::ALL[(index + 1) % AutonomyLevel::ALL.len()];
    Some(UiAction::Autonomy { level })
}

fn step_within(current: u16, steps: i16, step: u8, (lo, hi): (u8, u8)) -> Option<f64> {
    let target = (current as i32 + steps as i32 * step as i32).clamp(lo as i32, hi as i32);
    if target == current as i32 {
        None
    } else {
        Some(target as f64)
    }
}
