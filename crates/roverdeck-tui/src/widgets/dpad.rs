//! On-screen directional pad
//!
//! Button geometry comes from [`crate::layout::dpad_buttons`] so the mouse
//! hit testing always matches what is drawn.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use roverdeck_app::InputAggregator;
use roverdeck_core::{Direction, InputSource};

use crate::layout;
use crate::theme;

pub struct Dpad<'a> {
    aggregator: &'a InputAggregator,
}

impl<'a> Dpad<'a> {
    pub fn new(aggregator: &'a InputAggregator) -> Self {
        Self { aggregator }
    }

    fn glyph(direction: Direction) -> &'static str {
        match direction {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Left => "◀",
            Direction::Right => "▶",
        }
    }
}

impl Widget for Dpad<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let active = self.aggregator.active_source().is_some()
            && self.aggregator.joystick().is_none();
        Block::default()
            .title(" Drive ")
            .borders(Borders::ALL)
            .border_style(theme::border(active))
            .render(area, buf);

        for (direction, rect) in layout::dpad_buttons(area) {
            let held = self.aggregator.is_held(InputSource::Dpad, direction)
                || self.aggregator.is_held(InputSource::Keyboard, direction);
            let style = if held {
                Style::default()
                    .fg(theme::DEEPEST_BG)
                    .bg(theme::HELD)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_SECONDARY)
            };
            Paragraph::new(Self::glyph(direction))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE).style(style))
                .render(rect, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_utils::render_to_string;

    #[test]
    fn test_renders_all_arrows() {
        let agg = InputAggregator::new();
        let content = render_to_string(Dpad::new(&agg), 27, 8);
        for glyph in ["▲", "▼", "◀", "▶"] {
            assert!(content.contains(glyph), "missing {glyph}");
        }
        assert!(content.contains("Drive"));
    }

    #[test]
    fn test_held_direction_is_highlighted() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut agg = InputAggregator::new();
        agg.key_down(Direction::Up);

        let backend = TestBackend::new(27, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| f.render_widget(Dpad::new(&agg), f.area()))
            .unwrap();

        let area = Rect::new(0, 0, 27, 8);
        let (_, up) = layout::dpad_buttons(area)[0];
        let (_, left) = layout::dpad_buttons(area)[1];
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(up.x, up.y)].bg, theme::HELD);
        assert_ne!(buffer[(left.x, left.y)].bg, theme::HELD);
    }
}
