//! Reconciled platform status
//!
//! Values come from `StateReconciler::view()`. An axis still showing a local
//! edit is drawn in the pending colour with a trailing `*`.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use roverdeck_app::state::AppState;
use roverdeck_app::ControlAxis;
use roverdeck_core::{ArmJoint, Camera};

use crate::theme;

const MISSING: &str = "--";

pub struct StatusPanel<'a> {
    state: &'a AppState,
}

impl<'a> StatusPanel<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn label(text: &str) -> Span<'static> {
        Span::styled(
            format!("{text:<12}"),
            Style::default().fg(theme::TEXT_SECONDARY),
        )
    }

    fn value(&self, text: String, axis: Option<ControlAxis>) -> Span<'static> {
        match axis {
            Some(axis) if self.state.reconciler.is_pending(axis) => Span::styled(
                format!("{text}*"),
                Style::default().fg(theme::PENDING),
            ),
            _ => Span::styled(text, Style::default().fg(theme::TEXT_PRIMARY)),
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let view = self.state.reconciler.view();
        let fmt_angle = |v: Option<u16>| v.map_or(MISSING.to_string(), |a| format!("{a}°"));
        let fmt_zoom = |v: Option<f64>| v.map_or(MISSING.to_string(), |z| format!("{z:.1}x"));
        let selected = |camera: Camera| {
            if self.state.selected_camera == camera {
                "▸"
            } else {
                " "
            }
        };

        let mut lines = Vec::new();

        if self.state.reconciler.snapshot().is_none() {
            lines.push(Line::from(Span::styled(
                "Waiting for status…",
                Style::default()
                    .fg(theme::TEXT_MUTED)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        lines.push(Line::from(vec![
            Self::label("Battery"),
            self.value(
                view.battery.map_or(MISSING.to_string(), |b| format!("{b:.1} V")),
                None,
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("Status"),
            self.value(view.status.clone().unwrap_or_else(|| MISSING.into()), None),
        ]));
        lines.push(Line::from(vec![
            Self::label("Autonomy"),
            self.value(
                view.autonomy_level
                    .map_or(MISSING.to_string(), |l| l.to_string()),
                Some(ControlAxis::Autonomy),
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("Speed limit"),
            self.value(
                view.speed_limit.map_or(MISSING.to_string(), |s| format!("{s}%")),
                Some(ControlAxis::Speed),
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("Obstacle"),
            self.value(
                view.sensors
                    .ultrasonic
                    .as_ref()
                    .and_then(|u| u.nearest())
                    .map_or(MISSING.to_string(), |d| format!("{d:.1} cm")),
                None,
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("Camera pan"),
            self.value(fmt_angle(view.camera_pan), Some(ControlAxis::CameraPan)),
        ]));
        lines.push(Line::from(vec![
            Self::label("Arm"),
            Span::raw("lift "),
            self.value(
                fmt_angle(view.arm.lift),
                Some(ControlAxis::Arm(ArmJoint::Lift)),
            ),
            Span::raw("  claw "),
            self.value(
                fmt_angle(view.arm.claw),
                Some(ControlAxis::Arm(ArmJoint::Claw)),
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("Zoom"),
            Span::raw(format!("{}front ", selected(Camera::Front))),
            self.value(
                fmt_zoom(view.zoom.front),
                Some(ControlAxis::Zoom(Camera::Front)),
            ),
            Span::raw(format!("  {}rear ", selected(Camera::Rear))),
            self.value(
                fmt_zoom(view.zoom.rear),
                Some(ControlAxis::Zoom(Camera::Rear)),
            ),
        ]));
        lines.push(Line::from(vec![
            Self::label("LED"),
            self.value(
                view.led.as_ref().map_or(MISSING.to_string(), |led| {
                    format!("{} ({},{},{})", led.mode, led.r, led.g, led.b)
                }),
                Some(ControlAxis::Led),
            ),
        ]));
        if !view.active_modules.is_empty() {
            lines.push(Line::from(vec![
                Self::label("Modules"),
                self.value(view.active_modules.join(", "), None),
            ]));
        }
        if let Some(ack) = self.state.reconciler.last_ack() {
            lines.push(Line::from(vec![
                Self::label("Last ack"),
                Span::styled(ack.summary(), Style::default().fg(theme::TEXT_MUTED)),
            ]));
        }

        lines.push(Line::default());
        for camera in [Camera::Front, Camera::Rear] {
            lines.push(Line::from(vec![
                Self::label(&format!("Video {}", camera)),
                Span::styled(
                    self.state.registry.video_url(camera),
                    Style::default().fg(theme::TEXT_MUTED),
                ),
            ]));
        }
        lines.push(Line::from(vec![
            Self::label("Health"),
            Span::styled(
                self.state.registry.health_url(),
                Style::default().fg(theme::TEXT_MUTED),
            ),
        ]));

        lines
    }
}

impl Widget for StatusPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Status ")
                    .borders(Borders::ALL)
                    .border_style(theme::border(self.state.connection.is_connected())),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::test_utils::render_to_string;
    use roverdeck_app::Dispatch;
    use roverdeck_core::{ControlCommand, RobotStatus};
    use tempfile::tempdir;

    #[test]
    fn test_waiting_before_first_snapshot() {
        let temp = tempdir().unwrap();
        let state = AppState::new(temp.path().to_path_buf());
        let content = render_to_string(StatusPanel::new(&state), 70, 24);
        assert!(content.contains("Waiting for status"));
        assert!(content.contains("http://localhost:8000/api/video/front"));
        assert!(content.contains("http://localhost:8000/api/status"));
    }

    #[test]
    fn test_pending_edit_is_marked() {
        let temp = tempdir().unwrap();
        let mut state = AppState::new(temp.path().to_path_buf());
        let mut status = RobotStatus::default();
        status.battery = Some(12.3);
        status.arm.lift = Some(90);
        state.reconciler.apply_snapshot(status);
        state
            .reconciler
            .record_edit(&Dispatch::Command(ControlCommand::ArmControl {
                joint: ArmJoint::Lift,
                value: 100,
            }));

        let content = render_to_string(StatusPanel::new(&state), 70, 20);
        assert!(content.contains("12.3 V"));
        assert!(content.contains("100°*"));
        assert!(!content.contains("Waiting for status"));
    }
}
