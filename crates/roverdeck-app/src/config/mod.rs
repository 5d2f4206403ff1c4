//! Configuration for Rover Deck
//!
//! Supports:
//! - `settings.toml` in the config directory - endpoint, link and control settings
//! - The Endpoint Registry, which owns the `[endpoint]` table

pub mod endpoint;
pub mod settings;
pub mod types;

pub use endpoint::{validate_endpoint, EndpointRegistry};
pub use settings::{config_dir, load_settings, save_settings, CONFIG_DIR_ENV, CONFIG_FILENAME};
pub use types::*;
