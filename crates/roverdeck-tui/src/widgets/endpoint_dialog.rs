//! Endpoint editor modal

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use roverdeck_app::state::{EditorField, EndpointEditorState};

use crate::theme;

/// Center a fixed-size rect within an area, clamped to the area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

pub struct EndpointDialog<'a> {
    editor: &'a EndpointEditorState,
}

impl<'a> EndpointDialog<'a> {
    pub fn new(editor: &'a EndpointEditorState) -> Self {
        Self { editor }
    }

    pub const WIDTH: u16 = 50;
    pub const HEIGHT: u16 = 8;

    fn field(&self, label: &str, value: &str, field: EditorField) -> Line<'static> {
        let focused = self.editor.focus == field;
        let style = if focused {
            Style::default()
                .fg(theme::TEXT_PRIMARY)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme::TEXT_SECONDARY)
        };
        let cursor = if focused { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<6}"), Style::default().fg(theme::TEXT_MUTED)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    }
}

impl Widget for EndpointDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = centered_rect(Self::WIDTH, Self::HEIGHT, area);
        Clear.render(rect, buf);

        let mut lines = vec![
            self.field("Host", &self.editor.host, EditorField::Host),
            self.field("Port", &self.editor.port, EditorField::Port),
            Line::default(),
        ];
        match &self.editor.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(theme::STATUS_RED),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter save · Tab switch field · Esc cancel",
                Style::default().fg(theme::TEXT_MUTED),
            ))),
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Platform endpoint ")
                    .borders(Borders::ALL)
                    .border_style(theme::border(true))
                    .style(Style::default().bg(theme::POPUP_BG)),
            )
            .render(rect, buf);
    }
}
