//! roverdeck-tui - Terminal operator console for Rover Deck
//!
//! This crate drives an Engine from roverdeck-app and adds terminal
//! rendering, key/mouse input mapping and widget display. It is a thin
//! frontend: all coordinator state lives in the Engine.

pub mod event;
pub mod layout;
pub mod render;
pub mod runner;
pub mod terminal;
pub mod theme;
pub mod widgets;

// Re-export main entry point
pub use runner::run;
