//! Color palette for the operator console.

use ratatui::style::{Color, Modifier, Style};

use roverdeck_core::ConnectionState;

// --- Background layers ---
pub const DEEPEST_BG: Color = Color::Black;
pub const POPUP_BG: Color = Color::DarkGray;

// --- Borders ---
pub const BORDER_DIM: Color = Color::DarkGray;
pub const BORDER_ACTIVE: Color = Color::Cyan;

// --- Text ---
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Gray;
pub const TEXT_MUTED: Color = Color::DarkGray;

// --- Status ---
pub const STATUS_GREEN: Color = Color::Green;
pub const STATUS_RED: Color = Color::Red;
pub const STATUS_YELLOW: Color = Color::Yellow;

// --- Controls ---
pub const HELD: Color = Color::Cyan;
pub const PENDING: Color = Color::Magenta;

pub fn connection_style(state: ConnectionState) -> (&'static str, Style) {
    match state {
        ConnectionState::Connected => ("●", Style::default().fg(STATUS_GREEN)),
        ConnectionState::Connecting => ("◐", Style::default().fg(STATUS_YELLOW)),
        ConnectionState::Disconnected => (
            "○",
            Style::default().fg(STATUS_RED).add_modifier(Modifier::BOLD),
        ),
    }
}

pub fn border(active: bool) -> Style {
    Style::default().fg(if active { BORDER_ACTIVE } else { BORDER_DIM })
}
