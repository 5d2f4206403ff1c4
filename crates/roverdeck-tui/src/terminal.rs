//! Terminal setup and restoration

use std::io::stdout;

use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;

use roverdeck_core::prelude::*;

/// Install a panic hook that restores the terminal
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        disable_input_features(true);
        ratatui::restore();
        original_hook(panic_info);
    }));
}

/// Turn on mouse capture, focus reporting and, where the terminal supports
/// it, key release reporting.
///
/// Returns whether key releases will be reported. Without them held arrow
/// keys never release on their own and the operator stops with `space`.
pub fn enable_input_features() -> Result<bool> {
    let mut out = stdout();
    execute!(out, EnableMouseCapture, EnableFocusChange)
        .map_err(|e| Error::TerminalInit(format!("mouse capture: {}", e)))?;

    let releases = matches!(supports_keyboard_enhancement(), Ok(true));
    if releases {
        execute!(
            out,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .map_err(|e| Error::TerminalInit(format!("key release reporting: {}", e)))?;
    } else {
        warn!("Terminal cannot report key releases; press space to stop");
    }
    Ok(releases)
}

/// Undo [`enable_input_features`]. Best-effort; errors are ignored.
pub fn disable_input_features(releases: bool) {
    let mut out = stdout();
    if releases {
        let _ = execute!(out, PopKeyboardEnhancementFlags);
    }
    let _ = execute!(out, DisableMouseCapture, DisableFocusChange);
}
