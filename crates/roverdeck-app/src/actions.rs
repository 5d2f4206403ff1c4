//! Action execution: the side of an `UpdateAction` that touches the channel.
//!
//! Generic over [`CommandSink`] so the bookkeeping that follows a send
//! (dropped-stop tracking, pending edits, counters) is testable without a
//! network.

use roverdeck_core::prelude::*;
use roverdeck_core::{MotionVector, OutboundMessage};
use roverdeck_link::CommandSink;

use crate::dispatcher::UiAction;
use crate::engine_event::EngineEvent;
use crate::state::AppState;

/// Send one `move` envelope and record whether it got through.
pub fn send_motion<S: CommandSink>(
    state: &mut AppState,
    sink: &S,
    vector: MotionVector,
) -> EngineEvent {
    let delivered = sink.send(OutboundMessage::motion(vector));
    state.aggregator.record_delivery(vector, delivered);
    if delivered {
        state.stats.motions_sent += 1;
        trace!("move {}", vector);
    } else {
        state.stats.dropped += 1;
        debug!("Dropped move {} (channel {})", vector, sink.connection_state().label());
    }
    EngineEvent::MotionSent { vector, delivered }
}

/// Resolve and send a discrete intent. A delivered edit becomes pending in
/// the reconciler so the display follows the operator immediately.
pub fn dispatch_control<S: CommandSink>(
    state: &mut AppState,
    sink: &S,
    action: &UiAction,
) -> EngineEvent {
    let (resolved, delivered) = state.dispatcher.dispatch(sink, action);
    if delivered {
        state.reconciler.record_edit(&resolved);
        state.stats.commands_sent += 1;
    } else {
        state.stats.dropped += 1;
    }
    EngineEvent::CommandSent {
        command: resolved.name().to_string(),
        payload: resolved.message().payload,
        delivered,
    }
}

/// Best-effort `{0,0}` before the channel goes away.
///
/// Sent even when the aggregator has already converged, because the stop may
/// still be owed to the endpoint being left.
pub fn flush_stop<S: CommandSink>(state: &mut AppState, sink: &S) -> EngineEvent {
    state.aggregator.release_all();
    let event = send_motion(state, sink, MotionVector::ZERO);
    if let EngineEvent::MotionSent {
        delivered: false, ..
    } = event
    {
        warn!("Final stop could not be delivered");
    }
    event
}
