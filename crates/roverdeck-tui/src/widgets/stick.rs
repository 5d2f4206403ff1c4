//! Analog stick pad

use ratatui::{
    buffer::Buffer,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use roverdeck_core::MotionVector;

use crate::layout;
use crate::theme;

/// Shows the crosshair and the current stick deflection, plus the vector
/// last handed to the channel.
pub struct StickPad {
    joystick: Option<MotionVector>,
    last_sent: MotionVector,
}

impl StickPad {
    pub fn new(joystick: Option<MotionVector>, last_sent: MotionVector) -> Self {
        Self {
            joystick,
            last_sent,
        }
    }
}

impl Widget for StickPad {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default()
            .title(" Stick ")
            .title_bottom(format!(" sent {} ", self.last_sent))
            .borders(Borders::ALL)
            .border_style(theme::border(self.joystick.is_some()))
            .render(area, buf);

        let inner = area.inner(Margin::new(1, 1));
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let centre = layout::stick_cell(area, MotionVector::ZERO);
        let muted = Style::default().fg(theme::TEXT_MUTED);
        for x in inner.left()..inner.right() {
            buf[(x, centre.y)].set_symbol("─").set_style(muted);
        }
        for y in inner.top()..inner.bottom() {
            buf[(centre.x, y)].set_symbol("│").set_style(muted);
        }
        buf[(centre.x, centre.y)].set_symbol("┼");

        if let Some(vector) = self.joystick {
            let knob = layout::stick_cell(area, vector);
            buf[(knob.x, knob.y)].set_symbol("●").set_style(
                Style::default()
                    .fg(theme::HELD)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }
}
