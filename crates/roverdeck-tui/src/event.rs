//! Terminal event mapping
//!
//! Translates crossterm key, mouse and focus events into coordinator
//! messages. Arrow keys are the keyboard source and need release reporting
//! (kitty keyboard protocol); `space` releases everything on terminals that
//! only report presses.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use roverdeck_app::message::Message;
use roverdeck_app::state::UiMode;
use roverdeck_app::NamedAction;
use roverdeck_core::{ArmJoint, Camera, Direction};

use crate::layout::{self, ScreenAreas};

/// Zoom change per key press
const ZOOM_STEP: f64 = 0.5;

/// What the primary mouse button is currently holding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grab {
    /// A dpad button; `inside` tracks whether the pointer is still on it
    Dpad { direction: Direction, inside: bool },
    Stick,
}

/// Pointer state that must survive between mouse events.
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    grab: Option<Grab>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any grab (focus lost, editor opened).
    pub fn reset(&mut self) {
        self.grab = None;
    }
}

/// Map one terminal event to the messages it produces.
pub fn map_event(
    event: &Event,
    mode: UiMode,
    areas: &ScreenAreas,
    pointer: &mut PointerState,
) -> Vec<Message> {
    match event {
        Event::Key(key) => key_to_message(key, mode).into_iter().collect(),
        Event::Mouse(mouse) if mode == UiMode::Normal => mouse_to_messages(mouse, areas, pointer),
        Event::FocusLost => {
            pointer.reset();
            vec![Message::ReleaseAll]
        }
        _ => Vec::new(),
    }
}

/// Convert a key event to a message for the current UI mode.
pub fn key_to_message(key: &KeyEvent, mode: UiMode) -> Option<Message> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.kind == KeyEventKind::Press).then_some(Message::Quit);
    }
    match mode {
        UiMode::Normal => normal_key(key),
        UiMode::EndpointEditor => editor_key(key),
    }
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn normal_key(key: &KeyEvent) -> Option<Message> {
    if let Some(direction) = arrow(key.code) {
        return match key.kind {
            KeyEventKind::Press => Some(Message::KeyDown(direction)),
            KeyEventKind::Release => Some(Message::KeyUp(direction)),
            // Auto-repeat carries no new state
            KeyEventKind::Repeat => None,
        };
    }

    if key.kind == KeyEventKind::Release {
        return None;
    }

    let message = match key.code {
        KeyCode::Char(' ') => Message::ReleaseAll,
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('s') => Message::OpenEndpointEditor,

        // Camera pan / arm
        KeyCode::Char('h') => Message::NudgePan(-1),
        KeyCode::Char('l') => Message::NudgePan(1),
        KeyCode::Char('k') => Message::NudgeArm {
            joint: ArmJoint::Lift,
            steps: 1,
        },
        KeyCode::Char('j') => Message::NudgeArm {
            joint: ArmJoint::Lift,
            steps: -1,
        },
        KeyCode::Char('o') => Message::NudgeArm {
            joint: ArmJoint::Claw,
            steps: 1,
        },
        KeyCode::Char('c') => Message::NudgeArm {
            joint: ArmJoint::Claw,
            steps: -1,
        },

        // Zoom
        KeyCode::Char('f') => Message::SelectCamera(Camera::Front),
        KeyCode::Char('r') => Message::SelectCamera(Camera::Rear),
        KeyCode::Char('+') | KeyCode::Char('=') => Message::NudgeZoom(ZOOM_STEP),
        KeyCode::Char('-') => Message::NudgeZoom(-ZOOM_STEP),

        // Speed, LED, autonomy
        KeyCode::Char(']') => Message::NudgeSpeed(1),
        KeyCode::Char('[') => Message::NudgeSpeed(-1),
        KeyCode::Char('m') => Message::CycleLedMode,
        KeyCode::Char('a') => Message::CycleAutonomy,

        // Named actions
        KeyCode::Char('1') => Message::Action(NamedAction::TrackFace),
        KeyCode::Char('2') => Message::Action(NamedAction::LineTracking),
        KeyCode::Char('3') => Message::Action(NamedAction::ObstacleAvoidance),
        KeyCode::Char('4') => Message::Action(NamedAction::Pickup),
        KeyCode::Char('5') => Message::Action(NamedAction::Drop),
        KeyCode::Char('x') | KeyCode::Esc => Message::Action(NamedAction::EmergencyStop),

        _ => return None,
    };
    Some(message)
}

fn editor_key(key: &KeyEvent) -> Option<Message> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Esc => Some(Message::CloseEndpointEditor),
        KeyCode::Enter => Some(Message::EditorSubmit),
        KeyCode::Tab | KeyCode::BackTab => Some(Message::EditorNextField),
        KeyCode::Backspace => Some(Message::EditorBackspace),
        KeyCode::Char(c) if !c.is_control() => Some(Message::EditorInput(c)),
        _ => None,
    }
}

fn mouse_to_messages(
    mouse: &MouseEvent,
    areas: &ScreenAreas,
    pointer: &mut PointerState,
) -> Vec<Message> {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(direction) = layout::hit_dpad(areas.dpad, col, row) {
                pointer.grab = Some(Grab::Dpad {
                    direction,
                    inside: true,
                });
                vec![Message::DpadDown(direction)]
            } else if layout::hit_stick(areas.stick, col, row) {
                pointer.grab = Some(Grab::Stick);
                let v = layout::stick_vector(areas.stick, col, row);
                vec![Message::JoystickMove { x: v.x, y: v.y }]
            } else {
                Vec::new()
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match pointer.grab {
            Some(Grab::Dpad {
                direction,
                inside: true,
            }) if layout::hit_dpad(areas.dpad, col, row) != Some(direction) => {
                // Dragging off a pressed button releases it
                pointer.grab = Some(Grab::Dpad {
                    direction,
                    inside: false,
                });
                vec![Message::DpadLeave]
            }
            Some(Grab::Stick) => {
                let v = layout::stick_vector(areas.stick, col, row);
                vec![Message::JoystickMove { x: v.x, y: v.y }]
            }
            _ => Vec::new(),
        },
        MouseEventKind::Up(MouseButton::Left) => match pointer.grab.take() {
            Some(Grab::Dpad {
                direction,
                inside: true,
            }) => vec![Message::DpadUp(direction)],
            Some(Grab::Stick) => vec![Message::JoystickStop],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn areas() -> ScreenAreas {
        layout::create(Rect::new(0, 0, 80, 24))
    }

    /// Centre cell of the button for `direction`
    fn button_centre(direction: Direction) -> (u16, u16) {
        let (_, rect) = layout::dpad_buttons(areas().dpad)
            .into_iter()
            .find(|(d, _)| *d == direction)
            .unwrap();
        (rect.x + rect.width / 2, rect.y + rect.height / 2)
    }

    #[test]
    fn test_arrow_press_and_release() {
        assert_eq!(
            key_to_message(&key(KeyCode::Up, KeyEventKind::Press), UiMode::Normal),
            Some(Message::KeyDown(Direction::Up))
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Up, KeyEventKind::Release), UiMode::Normal),
            Some(Message::KeyUp(Direction::Up))
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Up, KeyEventKind::Repeat), UiMode::Normal),
            None
        );
    }

    #[test]
    fn test_space_releases_all() {
        assert_eq!(
            key_to_message(&key(KeyCode::Char(' '), KeyEventKind::Press), UiMode::Normal),
            Some(Message::ReleaseAll)
        );
    }

    #[test]
    fn test_control_keys() {
        let press = |c| key_to_message(&key(KeyCode::Char(c), KeyEventKind::Press), UiMode::Normal);
        assert_eq!(press('l'), Some(Message::NudgePan(1)));
        assert_eq!(press('['), Some(Message::NudgeSpeed(-1)));
        assert_eq!(press('4'), Some(Message::Action(NamedAction::Pickup)));
        assert_eq!(press('x'), Some(Message::Action(NamedAction::EmergencyStop)));
        assert_eq!(press('s'), Some(Message::OpenEndpointEditor));
        assert_eq!(press('z'), None);
    }

    #[test]
    fn test_release_of_non_motion_key_is_ignored() {
        assert_eq!(
            key_to_message(&key(KeyCode::Char('l'), KeyEventKind::Release), UiMode::Normal),
            None
        );
    }

    #[test]
    fn test_ctrl_c_quits_in_any_mode() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_message(&ctrl_c, UiMode::Normal), Some(Message::Quit));
        assert_eq!(
            key_to_message(&ctrl_c, UiMode::EndpointEditor),
            Some(Message::Quit)
        );
    }

    #[test]
    fn test_editor_mode_types_instead_of_driving() {
        let mode = UiMode::EndpointEditor;
        assert_eq!(
            key_to_message(&key(KeyCode::Char('q'), KeyEventKind::Press), mode),
            Some(Message::EditorInput('q'))
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Up, KeyEventKind::Press), mode),
            None
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Enter, KeyEventKind::Press), mode),
            Some(Message::EditorSubmit)
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Esc, KeyEventKind::Press), mode),
            Some(Message::CloseEndpointEditor)
        );
        assert_eq!(
            key_to_message(&key(KeyCode::Tab, KeyEventKind::Press), mode),
            Some(Message::EditorNextField)
        );
    }

    #[test]
    fn test_dpad_press_and_release() {
        let mut pointer = PointerState::new();
        let (col, row) = button_centre(Direction::Right);

        let down = map_event(
            &mouse(MouseEventKind::Down(MouseButton::Left), col, row),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert_eq!(down, vec![Message::DpadDown(Direction::Right)]);

        let up = map_event(
            &mouse(MouseEventKind::Up(MouseButton::Left), col, row),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert_eq!(up, vec![Message::DpadUp(Direction::Right)]);
    }

    #[test]
    fn test_dragging_off_dpad_button_is_a_release() {
        let mut pointer = PointerState::new();
        let (col, row) = button_centre(Direction::Up);
        map_event(
            &mouse(MouseEventKind::Down(MouseButton::Left), col, row),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );

        // Still on the button: nothing
        let still = map_event(
            &mouse(MouseEventKind::Drag(MouseButton::Left), col, row),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert!(still.is_empty());

        let left = map_event(
            &mouse(MouseEventKind::Drag(MouseButton::Left), 60, 20),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert_eq!(left, vec![Message::DpadLeave]);

        // Button-up after leaving sends nothing more
        let up = map_event(
            &mouse(MouseEventKind::Up(MouseButton::Left), 60, 20),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert!(up.is_empty());
    }

    #[test]
    fn test_stick_drag_and_release() {
        let mut pointer = PointerState::new();
        let stick = areas().stick;
        let centre_col = stick.x + stick.width / 2;
        let centre_row = stick.y + stick.height / 2;

        let down = map_event(
            &mouse(MouseEventKind::Down(MouseButton::Left), centre_col, centre_row),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert!(matches!(down.as_slice(), [Message::JoystickMove { .. }]));

        let drag = map_event(
            &mouse(MouseEventKind::Drag(MouseButton::Left), 79, stick.y),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert_eq!(drag, vec![Message::JoystickMove { x: 1.0, y: 1.0 }]);

        let up = map_event(
            &mouse(MouseEventKind::Up(MouseButton::Left), 79, stick.y),
            UiMode::Normal,
            &areas(),
            &mut pointer,
        );
        assert_eq!(up, vec![Message::JoystickStop]);
    }

    #[test]
    fn test_mouse_ignored_while_editing() {
        let mut pointer = PointerState::new();
        let (col, row) = button_centre(Direction::Up);
        let msgs = map_event(
            &mouse(MouseEventKind::Down(MouseButton::Left), col, row),
            UiMode::EndpointEditor,
            &areas(),
            &mut pointer,
        );
        assert!(msgs.is_empty());
    }

    #[test]
    fn test_focus_lost_releases_everything() {
        let mut pointer = PointerState::new();
        let msgs = map_event(&Event::FocusLost, UiMode::Normal, &areas(), &mut pointer);
        assert_eq!(msgs, vec![Message::ReleaseAll]);
    }
}
