//! Header bar: title, endpoint and connectivity

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use roverdeck_app::state::AppState;

use crate::theme;

pub struct Header<'a> {
    state: &'a AppState,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let endpoint = self.state.registry.get();
        let (icon, style) = theme::connection_style(self.state.connection);
        let stats = self.state.stats;

        let line = Line::from(vec![
            Span::styled(
                "Rover Deck",
                Style::default()
                    .fg(theme::TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{}:{}", endpoint.host, endpoint.port),
                Style::default().fg(theme::TEXT_SECONDARY),
            ),
            Span::raw("  "),
            Span::styled(format!("{} {}", icon, self.state.connection.label()), style),
            Span::raw("  "),
            Span::styled(
                format!(
                    "tx {}/{}  dropped {}",
                    stats.motions_sent, stats.commands_sent, stats.dropped
                ),
                Style::default().fg(theme::TEXT_MUTED),
            ),
        ]);

        Paragraph::new(line)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::border(false)),
            )
            .render(area, buf);
    }
}
