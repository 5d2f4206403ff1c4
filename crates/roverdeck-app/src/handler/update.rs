//! Main update function - handles state transitions (TEA pattern)

use roverdeck_core::prelude::*;
use roverdeck_core::{ConnectionState, InboundEvent};
use roverdeck_link::SessionEvent;

use crate::dispatcher::UiAction;
use crate::message::Message;
use crate::reconciler::Acknowledgement;
use crate::state::{AppState, NoticeKind, UiMode};

use super::{controls, endpoint, UpdateAction, UpdateResult};

/// Process a message and update state
/// Returns an optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Quit => {
            state.request_quit();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Motion Input Edges
        // ─────────────────────────────────────────────────────────
        Message::KeyDown(direction) => UpdateResult::motion(state.aggregator.key_down(direction)),
        Message::KeyUp(direction) => UpdateResult::motion(state.aggregator.key_up(direction)),
        Message::DpadDown(direction) => {
            UpdateResult::motion(state.aggregator.dpad_down(direction))
        }
        Message::DpadUp(direction) => UpdateResult::motion(state.aggregator.dpad_up(direction)),
        Message::DpadLeave => UpdateResult::motion(state.aggregator.dpad_leave()),
        Message::JoystickMove { x, y } => {
            UpdateResult::motion(state.aggregator.joystick_move(x, y))
        }
        Message::JoystickStop => UpdateResult::motion(state.aggregator.joystick_stop()),
        Message::ReleaseAll => UpdateResult::motion(state.aggregator.release_all()),

        // ─────────────────────────────────────────────────────────
        // Discrete Controls
        // ─────────────────────────────────────────────────────────
        Message::Control(action) => UpdateResult::action(UpdateAction::Dispatch(action)),
        Message::Action(name) => {
            UpdateResult::action(UpdateAction::Dispatch(UiAction::Named { name }))
        }
        Message::NudgePan(steps) => dispatch(controls::nudge_pan(state, steps)),
        Message::NudgeArm { joint, steps } => dispatch(controls::nudge_arm(state, joint, steps)),
        Message::NudgeSpeed(steps) => dispatch(controls::nudge_speed(state, steps)),
        Message::NudgeZoom(delta) => dispatch(controls::nudge_zoom(state, delta)),
        Message::SelectCamera(camera) => {
            state.selected_camera = camera;
            UpdateResult::none()
        }
        Message::CycleLedMode => dispatch(controls::cycle_led(state)),
        Message::CycleAutonomy => dispatch(controls::cycle_autonomy(state)),

        // ─────────────────────────────────────────────────────────
        // Endpoint
        // ─────────────────────────────────────────────────────────
        Message::SetEndpoint { host, port } => endpoint::handle_set_endpoint(state, &host, &port),
        Message::OpenEndpointEditor => endpoint::open_editor(state),
        Message::CloseEndpointEditor => {
            endpoint::close_editor(state);
            UpdateResult::none()
        }
        Message::EditorInput(c) => {
            if let Some(editor) = state.editor.as_mut() {
                editor.focused_mut().push(c);
                editor.error = None;
            }
            UpdateResult::none()
        }
        Message::EditorBackspace => {
            if let Some(editor) = state.editor.as_mut() {
                editor.focused_mut().pop();
                editor.error = None;
            }
            UpdateResult::none()
        }
        Message::EditorNextField => {
            if let Some(editor) = state.editor.as_mut() {
                editor.next_field();
            }
            UpdateResult::none()
        }
        Message::EditorSubmit => match state.editor.as_ref() {
            Some(editor) if state.ui_mode == UiMode::EndpointEditor => {
                UpdateResult::message(Message::SetEndpoint {
                    host: editor.host.clone(),
                    port: editor.port.clone(),
                })
            }
            _ => UpdateResult::none(),
        },

        // ─────────────────────────────────────────────────────────
        // Control Channel
        // ─────────────────────────────────────────────────────────
        Message::Channel(SessionEvent::StateChanged(connection)) => {
            handle_connection_change(state, connection)
        }
        Message::Channel(SessionEvent::Inbound(event)) => {
            handle_inbound(state, event);
            UpdateResult::none()
        }
        Message::ChannelEnded => {
            warn!("Control channel task ended, restarting it");
            state.connection = ConnectionState::Disconnected;
            state.set_notice(NoticeKind::Channel, "Control channel restarted");
            UpdateResult::action(UpdateAction::Reconnect {
                url: state.registry.channel_url(),
            })
        }
    }
}

fn dispatch(action: Option<UiAction>) -> UpdateResult {
    match action {
        Some(action) => UpdateResult::action(UpdateAction::Dispatch(action)),
        None => UpdateResult::none(),
    }
}

fn handle_connection_change(state: &mut AppState, connection: ConnectionState) -> UpdateResult {
    let previous = std::mem::replace(&mut state.connection, connection);
    if previous == connection {
        return UpdateResult::none();
    }
    info!("Control channel {} → {}", previous.label(), connection.label());

    if connection.is_connected() {
        if matches!(
            state.notice.as_ref().map(|n| n.kind),
            Some(NoticeKind::Channel)
        ) {
            state.clear_notice();
        }
        return UpdateResult::motion(state.aggregator.take_dropped_stop());
    }
    UpdateResult::none()
}

fn handle_inbound(state: &mut AppState, event: InboundEvent) {
    match event {
        InboundEvent::Status(status) => {
            trace!("Status snapshot #{}", state.reconciler.snapshot_count() + 1);
            state.reconciler.apply_snapshot(status);
        }
        InboundEvent::CommandAck(ack) => {
            state.reconciler.record_ack(Acknowledgement::Command(ack));
        }
        InboundEvent::AutonomyChanged(level) => {
            state.reconciler.record_ack(Acknowledgement::Autonomy(level));
        }
    }
}
