//! Motion intent types shared by the input layer and the wire codec.

use serde::{Deserialize, Serialize};

/// Normalized drive intent: `x` is lateral, `y` is longitudinal.
///
/// Both components live in `[-1, 1]`. The zero vector is the canonical stop
/// command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub x: f64,
    pub y: f64,
}

impl MotionVector {
    /// The stop command.
    pub const ZERO: MotionVector = MotionVector { x: 0.0, y: 0.0 };

    /// Build a vector, clamping each component into `[-1, 1]`.
    ///
    /// Non-finite components become `0.0` so a bad sample never leaves the
    /// vehicle moving.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_axis(x),
            y: clamp_axis(y),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

fn clamp_axis(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

impl std::fmt::Display for MotionVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{:.2}, {:.2}}}", self.x, self.y)
    }
}

/// Logical drive direction for discrete inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Contribution of this direction to the combined vector while held.
    pub fn unit(self) -> MotionVector {
        match self {
            Direction::Up => MotionVector { x: 0.0, y: 1.0 },
            Direction::Down => MotionVector { x: 0.0, y: -1.0 },
            Direction::Left => MotionVector { x: -1.0, y: 0.0 },
            Direction::Right => MotionVector { x: 1.0, y: 0.0 },
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// Independently tracked motion input sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// On-screen press-and-hold directional pad
    Dpad,
    /// Keyboard arrow keys
    Keyboard,
    /// Analog stick (takes precedence while active)
    Joystick,
}

/// Held/not-held state of the four directions for one discrete source.
///
/// Only mutated by press/release edges; never polled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    held: [bool; 4],
}

impl KeyState {
    /// Mark `direction` held. Returns `true` if that changed anything.
    pub fn press(&mut self, direction: Direction) -> bool {
        let slot = &mut self.held[direction.index()];
        let changed = !*slot;
        *slot = true;
        changed
    }

    /// Mark `direction` released. Returns `true` if that changed anything.
    pub fn release(&mut self, direction: Direction) -> bool {
        let slot = &mut self.held[direction.index()];
        let changed = *slot;
        *slot = false;
        changed
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[direction.index()]
    }

    pub fn any_held(&self) -> bool {
        self.held.iter().any(|h| *h)
    }

    pub fn clear(&mut self) {
        self.held = [false; 4];
    }

    /// Union of two key states: a direction is held if either holds it.
    pub fn union(&self, other: &KeyState) -> KeyState {
        let mut held = [false; 4];
        for (i, slot) in held.iter_mut().enumerate() {
            *slot = self.held[i] || other.held[i];
        }
        KeyState { held }
    }

    /// Vector from held directions; opposing directions cancel to zero.
    pub fn vector(&self) -> MotionVector {
        Direction::ALL
            .iter()
            .filter(|d| self.is_held(**d))
            .fold(MotionVector::ZERO, |acc, d| {
                let unit = d.unit();
                MotionVector {
                    x: acc.x + unit.x,
                    y: acc.y + unit.y,
                }
            })
    }
}
