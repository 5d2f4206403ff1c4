//! Main render/view function (View in TEA pattern)

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use roverdeck_app::state::{AppState, UiMode};

use crate::layout::{self, ScreenAreas};
use crate::theme;
use crate::widgets;

const KEY_HINTS: &str = "←↑↓→ drive · space stop · h/l pan · j/k lift · o/c claw · \
f/r +/- zoom · [ ] speed · m led · a autonomy · 1-5 actions · x e-stop · s endpoint · q quit";

/// Render the complete UI. Pure: reads state, returns the layout it drew so
/// the caller can hit-test mouse events against it.
pub fn view(frame: &mut Frame, state: &AppState) -> ScreenAreas {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::DEEPEST_BG)),
        area,
    );

    let areas = layout::create(area);

    frame.render_widget(widgets::Header::new(state), areas.header);
    frame.render_widget(widgets::Dpad::new(&state.aggregator), areas.dpad);
    frame.render_widget(
        widgets::StickPad::new(state.aggregator.joystick(), state.aggregator.last_sent()),
        areas.stick,
    );
    frame.render_widget(widgets::StatusPanel::new(state), areas.status);
    frame.render_widget(footer(state), areas.footer);

    if state.ui_mode == UiMode::EndpointEditor {
        if let Some(editor) = &state.editor {
            frame.render_widget(widgets::EndpointDialog::new(editor), area);
        }
    }

    areas
}

fn footer(state: &AppState) -> Paragraph<'static> {
    let line = match &state.notice {
        Some(notice) => Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(theme::STATUS_YELLOW),
        )),
        None => Line::from(Span::styled(
            KEY_HINTS,
            Style::default().fg(theme::TEXT_MUTED),
        )),
    };
    Paragraph::new(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use roverdeck_app::state::NoticeKind;
    use tempfile::tempdir;

    fn draw(state: &AppState) -> (ScreenAreas, String) {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut areas = None;
        terminal
            .draw(|f| areas = Some(view(f, state)))
            .unwrap();
        let content = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        (areas.unwrap(), content)
    }

    #[test]
    fn test_dashboard_renders() {
        let temp = tempdir().unwrap();
        let state = AppState::new(temp.path().to_path_buf());
        let (areas, content) = draw(&state);
        assert_eq!(areas, layout::create(ratatui::layout::Rect::new(0, 0, 100, 30)));
        assert!(content.contains("Drive"));
        assert!(content.contains("Stick"));
        assert!(content.contains("Status"));
        assert!(content.contains("space stop"));
    }

    #[test]
    fn test_notice_replaces_hints() {
        let temp = tempdir().unwrap();
        let mut state = AppState::new(temp.path().to_path_buf());
        state.set_notice(NoticeKind::Channel, "Control channel stopped");
        let (_, content) = draw(&state);
        assert!(content.contains("Control channel stopped"));
    }

    #[test]
    fn test_editor_overlay() {
        let temp = tempdir().unwrap();
        let mut state = AppState::new(temp.path().to_path_buf());
        roverdeck_app::handler::update(&mut state, roverdeck_app::Message::OpenEndpointEditor);
        let (_, content) = draw(&state);
        assert!(content.contains("Platform endpoint"));
    }
}
