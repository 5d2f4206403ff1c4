//! Endpoint editor and endpoint switch handlers

use roverdeck_core::prelude::*;
use roverdeck_core::MotionVector;

use crate::state::{AppState, EndpointEditorState, NoticeKind, UiMode};

use super::{UpdateAction, UpdateResult};

/// Open the editor prefilled with the active endpoint.
///
/// Motion is released first: arrow keys type into the dialog while it is open.
pub(crate) fn open_editor(state: &mut AppState) -> UpdateResult {
    let current = state.registry.get();
    state.editor = Some(EndpointEditorState::new(&current.host, &current.port));
    state.ui_mode = UiMode::EndpointEditor;
    UpdateResult::motion(state.aggregator.release_all())
}

pub(crate) fn close_editor(state: &mut AppState) {
    state.editor = None;
    state.ui_mode = UiMode::Normal;
}

/// Validate and persist a new endpoint, then ask the loop to reconnect.
pub(crate) fn handle_set_endpoint(state: &mut AppState, host: &str, port: &str) -> UpdateResult {
    let previous = state.registry.get().clone();

    let endpoint = match state.registry.set(host, port) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            warn!("Endpoint rejected: {}", e);
            let kind = match e {
                Error::InvalidEndpoint { .. } => NoticeKind::EndpointRejected,
                _ => NoticeKind::Config,
            };
            if let Some(editor) = state.editor.as_mut() {
                editor.error = Some(e.to_string());
            }
            state.set_notice(kind, e.to_string());
            return UpdateResult::none();
        }
    };

    close_editor(state);
    state.clear_notice();

    if endpoint == previous {
        debug!("Endpoint unchanged, keeping the current channel");
        return UpdateResult::none();
    }

    let flush_stop = state.aggregator.needs_final_stop();
    // The stop owed to the old endpoint travels with the switch action
    state.aggregator.release_all();
    state.aggregator.record_delivery(MotionVector::ZERO, true);
    state.reconciler.clear();

    UpdateResult::action(UpdateAction::SwitchEndpoint {
        url: state.registry.channel_url(),
        flush_stop,
    })
}
