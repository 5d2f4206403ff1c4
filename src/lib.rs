//! Rover Deck Library
//!
//! Operator console for driving a remote rover over its control channel.
//! The domain lives in the `roverdeck-*` crates; this crate wires them into
//! the two frontends (TUI and headless NDJSON).

pub mod headless;

pub use headless::runner::run_headless;

use std::path::PathBuf;

use roverdeck_app::state::NoticeKind;
use roverdeck_app::{Engine, EngineEvent};
use roverdeck_core::prelude::*;

use headless::HeadlessEvent;

/// Launch options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Endpoint host override
    pub host: Option<String>,
    /// Endpoint port override
    pub port: Option<String>,
    /// Persist the override instead of using it for this run only
    pub save: bool,
    /// Configuration directory; the platform default when unset
    pub config_dir: Option<PathBuf>,
    /// NDJSON on stdin/stdout instead of the TUI
    pub headless: bool,
}

/// Main application entry point
pub async fn run(options: LaunchOptions) -> Result<()> {
    // Initialize error handling
    color_eyre::install().map_err(|e| Error::terminal(e.to_string()))?;

    // Initialize logging (to file, since the frontend owns stdout)
    roverdeck_core::logging::init()?;

    let config_dir = match &options.config_dir {
        Some(dir) => dir.clone(),
        None => roverdeck_app::config::config_dir().context("Resolving config directory")?,
    };
    info!("Config directory: {}", config_dir.display());

    let mut engine = Engine::new(config_dir);
    if let Err(e) = apply_endpoint_override(&mut engine, &options) {
        let reason = reject_override(&mut engine, e)?;
        if options.headless {
            HeadlessEvent::from(&EngineEvent::EndpointRejected { reason }).emit();
        }
    }

    let result = if options.headless {
        run_headless(engine).await
    } else {
        roverdeck_tui::run(engine).await
    };

    if let Err(ref e) = result {
        error!("Application error (fatal: {}): {:?}", e.is_fatal(), e);
        if options.headless {
            HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
        }
    }

    info!("Rover Deck exiting");
    result
}

/// Apply `--host`/`--port` on top of the configured endpoint.
///
/// A missing half keeps its configured value. With `save` the result is
/// persisted through the registry, otherwise it lasts for this run only.
pub fn apply_endpoint_override(engine: &mut Engine, options: &LaunchOptions) -> Result<()> {
    if options.host.is_none() && options.port.is_none() {
        return Ok(());
    }

    let current = engine.state.registry.get().clone();
    let host = options.host.as_deref().unwrap_or(&current.host);
    let port = options.port.as_deref().unwrap_or(&current.port);

    let endpoint = if options.save {
        engine.state.registry.set(host, port)?
    } else {
        engine.state.registry.override_session(host, port)?
    };
    info!("Using endpoint {}:{}", endpoint.host, endpoint.port);
    Ok(())
}

/// Keep the configured endpoint after a bad `--host`/`--port`.
///
/// Recoverable errors become an inline notice and their message is returned;
/// anything else aborts the launch.
fn reject_override(engine: &mut Engine, err: Error) -> Result<String> {
    if !err.is_recoverable() {
        return Err(err);
    }
    warn!("Ignoring --host/--port: {}", err);
    let reason = err.to_string();
    engine
        .state
        .set_notice(NoticeKind::EndpointRejected, reason.clone());
    Ok(reason)
}
