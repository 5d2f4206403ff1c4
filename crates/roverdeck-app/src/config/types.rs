//! Configuration types for Rover Deck
//!
//! Defines:
//! - `Settings` - Everything persisted in `settings.toml`
//! - `EndpointConfig` - Where the platform lives
//! - `LinkSettings` - Control channel tunables
//! - `ControlSettings` - Operator control ranges and step sizes

use std::time::Duration;

use serde::{Deserialize, Serialize};

use roverdeck_link::SessionOptions;

/// Default platform host
pub const DEFAULT_HOST: &str = "localhost";

/// Default platform port (the platform's web server)
pub const DEFAULT_PORT: &str = "8000";

/// Persisted application settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub link: LinkSettings,

    #[serde(default)]
    pub control: ControlSettings,
}

/// Platform address.
///
/// The port is kept as the operator typed it; it is validated by the
/// endpoint registry before it is ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

/// Control channel settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkSettings {
    /// First reconnect delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Reconnect delay cap in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// WebSocket connect plus Socket.IO handshake budget
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Stamp `seq` on every control command
    #[serde(default = "default_true")]
    pub sequence_numbers: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            sequence_numbers: true,
        }
    }
}

impl LinkSettings {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            max_attempts: None,
            sequence_numbers: self.sequence_numbers,
        }
    }
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    3000
}

fn default_handshake_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Operator control settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlSettings {
    /// Lowest zoom factor sent to the platform
    #[serde(default = "default_zoom_min")]
    pub zoom_min: f64,

    /// Highest zoom factor sent to the platform
    #[serde(default = "default_zoom_max")]
    pub zoom_max: f64,

    /// Degrees per pan/arm key press
    #[serde(default = "default_servo_step")]
    pub servo_step: u8,

    /// Percent per speed key press
    #[serde(default = "default_speed_step")]
    pub speed_step: u8,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            zoom_min: default_zoom_min(),
            zoom_max: default_zoom_max(),
            servo_step: default_servo_step(),
            speed_step: default_speed_step(),
        }
    }
}

impl ControlSettings {
    /// Zoom range with the bounds ordered and finite.
    pub fn zoom_range(&self) -> (f64, f64) {
        let lo = if self.zoom_min.is_finite() {
            self.zoom_min
        } else {
            default_zoom_min()
        };
        let hi = if self.zoom_max.is_finite() {
            self.zoom_max
        } else {
            default_zoom_max()
        };
        if lo <= hi {
            (lo, hi)
        } else {
            (hi, lo)
        }
    }
}

fn default_zoom_min() -> f64 {
    1.0
}

fn default_zoom_max() -> f64 {
    5.0
}

fn default_servo_step() -> u8 {
    5
}

fn default_speed_step() -> u8 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint.host, "localhost");
        assert_eq!(settings.endpoint.port, "8000");
        assert_eq!(settings.link.initial_backoff_ms, 500);
        assert_eq!(settings.link.max_backoff_ms, 3000);
        assert!(settings.link.sequence_numbers);
        assert_eq!(settings.control.zoom_range(), (1.0, 5.0));
    }

    #[test]
    fn test_settings_parse_partial() {
        let settings: Settings = toml::from_str(
            r#"
[endpoint]
host = "10.0.0.5"

[control]
zoom_max = 8.0
"#,
        )
        .unwrap();
        assert_eq!(settings.endpoint.host, "10.0.0.5");
        assert_eq!(settings.endpoint.port, "8000");
        assert_eq!(settings.control.zoom_max, 8.0);
        assert_eq!(settings.control.servo_step, 5);
        assert_eq!(settings.link, LinkSettings::default());
    }

    #[test]
    fn test_link_settings_to_session_options() {
        let link = LinkSettings {
            initial_backoff_ms: 250,
            max_backoff_ms: 1000,
            handshake_timeout_ms: 2000,
            sequence_numbers: false,
        };
        let options = link.session_options();
        assert_eq!(options.initial_backoff, Duration::from_millis(250));
        assert_eq!(options.max_backoff, Duration::from_millis(1000));
        assert_eq!(options.handshake_timeout, Duration::from_millis(2000));
        assert!(!options.sequence_numbers);
        assert_eq!(options.max_attempts, None);
    }

    #[test]
    fn test_max_backoff_never_below_initial() {
        let link = LinkSettings {
            initial_backoff_ms: 2000,
            max_backoff_ms: 100,
            ..Default::default()
        };
        assert_eq!(
            link.session_options().max_backoff,
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_zoom_range_reorders_inverted_bounds() {
        let control = ControlSettings {
            zoom_min: 4.0,
            zoom_max: 2.0,
            ..Default::default()
        };
        assert_eq!(control.zoom_range(), (2.0, 4.0));
    }
}
