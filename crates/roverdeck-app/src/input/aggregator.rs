//! Input Aggregator: fuses dpad, keyboard and joystick edges into a single
//! stream of change-only motion vectors.
//!
//! Every edge method returns the vector to transmit, or `None` when the
//! combined vector did not change. The caller sends it and reports back with
//! [`InputAggregator::record_delivery`] so a dropped stop can be resent once
//! the channel comes back.

use roverdeck_core::{Direction, InputSource, KeyState, MotionVector};

#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    keyboard: KeyState,
    dpad: KeyState,
    /// Latest analog sample while the stick is engaged
    joystick: Option<MotionVector>,
    /// Last vector handed out for transmission
    last_sent: MotionVector,
    /// A `{0,0}` was emitted but never reached the channel
    stop_dropped: bool,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────

    pub fn key_down(&mut self, direction: Direction) -> Option<MotionVector> {
        self.keyboard.press(direction);
        self.emit()
    }

    pub fn key_up(&mut self, direction: Direction) -> Option<MotionVector> {
        self.keyboard.release(direction);
        self.emit()
    }

    pub fn dpad_down(&mut self, direction: Direction) -> Option<MotionVector> {
        self.dpad.press(direction);
        self.emit()
    }

    pub fn dpad_up(&mut self, direction: Direction) -> Option<MotionVector> {
        self.dpad.release(direction);
        self.emit()
    }

    /// Pointer left a pressed dpad button: same as releasing it.
    pub fn dpad_leave(&mut self) -> Option<MotionVector> {
        self.dpad.clear();
        self.emit()
    }

    pub fn joystick_move(&mut self, x: f64, y: f64) -> Option<MotionVector> {
        self.joystick = Some(MotionVector::new(x, y));
        self.emit()
    }

    pub fn joystick_stop(&mut self) -> Option<MotionVector> {
        self.joystick = None;
        self.emit()
    }

    /// Release every source at once (focus loss, endpoint switch, teardown).
    pub fn release_all(&mut self) -> Option<MotionVector> {
        self.keyboard.clear();
        self.dpad.clear();
        self.joystick = None;
        self.emit()
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Joystick if engaged, otherwise the union of the discrete sources.
    pub fn combined_vector(&self) -> MotionVector {
        match self.joystick {
            Some(vector) => vector,
            None => self.keyboard.union(&self.dpad).vector(),
        }
    }

    /// Whether any source is currently engaged.
    pub fn is_active(&self) -> bool {
        self.joystick.is_some() || self.keyboard.any_held() || self.dpad.any_held()
    }

    /// Source currently driving the combined vector.
    pub fn active_source(&self) -> Option<InputSource> {
        if self.joystick.is_some() {
            Some(InputSource::Joystick)
        } else if self.keyboard.any_held() {
            Some(InputSource::Keyboard)
        } else if self.dpad.any_held() {
            Some(InputSource::Dpad)
        } else {
            None
        }
    }

    pub fn last_sent(&self) -> MotionVector {
        self.last_sent
    }

    pub fn is_held(&self, source: InputSource, direction: Direction) -> bool {
        match source {
            InputSource::Keyboard => self.keyboard.is_held(direction),
            InputSource::Dpad => self.dpad.is_held(direction),
            InputSource::Joystick => false,
        }
    }

    pub fn joystick(&self) -> Option<MotionVector> {
        self.joystick
    }

    // ─────────────────────────────────────────────────────────
    // Delivery bookkeeping
    // ─────────────────────────────────────────────────────────

    /// Report whether an emitted vector actually reached the channel.
    pub fn record_delivery(&mut self, vector: MotionVector, delivered: bool) {
        if vector.is_zero() {
            self.stop_dropped = !delivered;
        } else if delivered {
            self.stop_dropped = false;
        }
    }

    /// Channel just became connected: the stop to resend, if one was lost.
    pub fn take_dropped_stop(&mut self) -> Option<MotionVector> {
        if self.stop_dropped && self.last_sent.is_zero() {
            self.stop_dropped = false;
            Some(MotionVector::ZERO)
        } else {
            None
        }
    }

    /// Teardown needs a final stop if anything could still be moving.
    pub fn needs_final_stop(&self) -> bool {
        self.is_active() || !self.last_sent.is_zero()
    }

    fn emit(&mut self) -> Option<MotionVector> {
        let combined = self.combined_vector();
        if combined == self.last_sent {
            return None;
        }
        self.last_sent = combined;
        Some(combined)
    }
}
