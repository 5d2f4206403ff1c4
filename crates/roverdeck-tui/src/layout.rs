//! Screen layout definitions for the TUI
//!
//! Besides splitting the screen, this module owns pointer hit testing: the
//! mouse handler and the widgets must agree on where the dpad buttons and the
//! stick pad are, so both go through these functions.

use ratatui::layout::{Constraint, Layout, Margin, Position, Rect};

use roverdeck_core::{Direction, MotionVector};

/// Screen areas for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    /// Title, endpoint and connection indicator
    pub header: Rect,

    /// On-screen directional pad (bordered)
    pub dpad: Rect,

    /// Analog stick pad (bordered)
    pub stick: Rect,

    /// Reconciled platform status
    pub status: Rect,

    /// Key hints and notices
    pub footer: Rect,
}

/// Width of the left control column
const CONTROL_WIDTH: u16 = 27;

/// Height of the dpad panel: border + 3 rows of 2-line buttons + border
const DPAD_HEIGHT: u16 = 8;

pub fn create(area: Rect) -> ScreenAreas {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(DPAD_HEIGHT + 3),
        Constraint::Length(1),
    ])
    .areas(area);

    let [controls, status] =
        Layout::horizontal([Constraint::Length(CONTROL_WIDTH), Constraint::Min(20)]).areas(body);

    let [dpad, stick] =
        Layout::vertical([Constraint::Length(DPAD_HEIGHT), Constraint::Min(3)]).areas(controls);

    ScreenAreas {
        header,
        dpad,
        stick,
        status,
        footer,
    }
}

/// Button rects of the dpad, laid out as a plus inside the panel border.
pub fn dpad_buttons(area: Rect) -> [(Direction, Rect); 4] {
    let inner = area.inner(Margin::new(1, 1));
    let w = inner.width / 3;
    let h = inner.height / 3;
    [
        (Direction::Up, Rect::new(inner.x + w, inner.y, w, h)),
        (Direction::Left, Rect::new(inner.x, inner.y + h, w, h)),
        (Direction::Right, Rect::new(inner.x + 2 * w, inner.y + h, w, h)),
        (Direction::Down, Rect::new(inner.x + w, inner.y + 2 * h, w, h)),
    ]
}

/// Which dpad button is under the pointer, if any.
pub fn hit_dpad(area: Rect, column: u16, row: u16) -> Option<Direction> {
    let pos = Position::new(column, row);
    dpad_buttons(area)
        .into_iter()
        .find(|(_, rect)| rect.contains(pos))
        .map(|(direction, _)| direction)
}

/// Whether the pointer is on the stick pad (inside its border).
pub fn hit_stick(area: Rect, column: u16, row: u16) -> bool {
    area.inner(Margin::new(1, 1))
        .contains(Position::new(column, row))
}

/// Stick deflection for a pointer position; positions outside the pad clamp
/// to its edge. Screen rows grow downwards, so `y` is inverted.
pub fn stick_vector(area: Rect, column: u16, row: u16) -> MotionVector {
    let inner = area.inner(Margin::new(1, 1));
    let (cx, cy, half_w, half_h) = stick_geometry(inner);
    MotionVector::new(
        (column as f64 - cx) / half_w,
        (cy - row as f64) / half_h,
    )
}

/// Cell that represents a stick deflection (inverse of [`stick_vector`]).
pub fn stick_cell(area: Rect, vector: MotionVector) -> Position {
    let inner = area.inner(Margin::new(1, 1));
    let (cx, cy, half_w, half_h) = stick_geometry(inner);
    Position::new(
        (cx + vector.x * half_w).round() as u16,
        (cy - vector.y * half_h).round() as u16,
    )
}

fn stick_geometry(inner: Rect) -> (f64, f64, f64, f64) {
    let half_w = (inner.width.saturating_sub(1) as f64 / 2.0).max(1.0);
    let half_h = (inner.height.saturating_sub(1) as f64 / 2.0).max(1.0);
    (
        inner.x as f64 + inner.width.saturating_sub(1) as f64 / 2.0,
        inner.y as f64 + inner.height.saturating_sub(1) as f64 / 2.0,
        half_w,
        half_h,
    )
}
