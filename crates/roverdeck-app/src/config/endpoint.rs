//! Endpoint Registry: the persisted `{host, port}` of the platform.
//!
//! `set` validates before anything is touched and only updates the in-memory
//! value once the new configuration has been written to disk. It has no
//! network effect; callers rebuild the channel session themselves.

use std::path::{Path, PathBuf};

use url::Url;

use roverdeck_core::prelude::*;
use roverdeck_core::Camera;
use roverdeck_link::protocol::WEBSOCKET_QUERY;

use super::settings::{load_settings, save_settings};
use super::types::EndpointConfig;

/// Validate and normalize an operator-entered endpoint.
///
/// The host is trimmed and must form a valid URL authority; the port must be
/// an integer in `1..=65535`.
pub fn validate_endpoint(host: &str, port: &str) -> Result<EndpointConfig> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::invalid_endpoint("host must not be empty"));
    }
    if host
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
    {
        return Err(Error::invalid_endpoint(format!(
            "host '{host}' contains characters not allowed in a host name"
        )));
    }

    let port_num: u16 = port
        .trim()
        .parse()
        .map_err(|_| Error::invalid_endpoint(format!("port '{}' is not in 1-65535", port.trim())))?;
    if port_num == 0 {
        return Err(Error::invalid_endpoint("port '0' is not in 1-65535"));
    }

    let candidate = format!("http://{}:{}/", url_host(host), port_num);
    let parsed = Url::parse(&candidate)
        .map_err(|e| Error::invalid_endpoint(format!("host '{host}' is not valid: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(Error::invalid_endpoint(format!("host '{host}' is not valid")));
    }

    Ok(EndpointConfig {
        host: host.to_string(),
        port: port_num.to_string(),
    })
}

/// Bracket bare IPv6 literals for use in a URL authority.
fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

/// Owns the active endpoint and its persistence.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    dir: PathBuf,
    current: EndpointConfig,
}

impl EndpointRegistry {
    /// Read the persisted endpoint from `dir`, falling back to defaults if it
    /// is missing or invalid.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let stored = load_settings(&dir).endpoint;
        let current = match validate_endpoint(&stored.host, &stored.port) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!("Ignoring stored endpoint: {}", e);
                EndpointConfig::default()
            }
        };
        Self { dir, current }
    }

    pub fn get(&self) -> &EndpointConfig {
        &self.current
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    /// Validate, persist, then adopt a new endpoint.
    ///
    /// On any error the previous endpoint stays in effect.
    pub fn set(&mut self, host: &str, port: &str) -> Result<EndpointConfig> {
        let endpoint = validate_endpoint(host, port)?;

        let mut settings = load_settings(&self.dir);
        settings.endpoint = endpoint.clone();
        save_settings(&self.dir, &settings)?;

        info!("Endpoint set to {}:{}", endpoint.host, endpoint.port);
        self.current = endpoint.clone();
        Ok(endpoint)
    }

    /// Use an endpoint for this run only, without persisting it.
    pub fn override_session(&mut self, host: &str, port: &str) -> Result<EndpointConfig> {
        let endpoint = validate_endpoint(host, port)?;
        debug!(
            "Endpoint overridden for this session: {}:{}",
            endpoint.host, endpoint.port
        );
        self.current = endpoint.clone();
        Ok(endpoint)
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", url_host(&self.current.host), self.current.port)
    }

    pub fn video_url(&self, camera: Camera) -> String {
        format!("{}/api/video/{}", self.base_url(), camera.as_str())
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/status", self.base_url())
    }

    /// WebSocket URL of the Socket.IO control channel.
    pub fn channel_url(&self) -> String {
        format!(
            "ws://{}:{}/socket.io/?{}",
            url_host(&self.current.host),
            self.current.port,
            WEBSOCKET_QUERY
        )
    }
}
