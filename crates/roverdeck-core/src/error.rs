//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
///
/// Out-of-range control parameters have no variant: they are clamped before
/// they reach the wire and are never reported.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Terminal/TUI Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    #[error("Failed to initialize terminal: {0}")]
    TerminalInit(String),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid endpoint: {reason}")]
    InvalidEndpoint { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Control Channel Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Control channel is not connected")]
    ChannelDisconnected,

    /// The link task is gone; the session must be reconnected
    #[error("Control channel task has ended")]
    ChannelClosed,

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Channel protocol error: {message}")]
    Protocol { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_endpoint(reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            reason: reason.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Connectivity problems are always recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidEndpoint { .. }
                | Error::ChannelDisconnected
                | Error::ChannelClosed
                | Error::Transport { .. }
                | Error::Protocol { .. }
                | Error::Config { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::TerminalInit(_) | Error::Terminal { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::invalid_endpoint("host must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid endpoint: host must not be empty"
        );

        let err = Error::ChannelDisconnected;
        assert!(err.to_string().contains("not connected"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_channel_errors_are_not_fatal_while_disconnected() {
        assert!(!Error::ChannelDisconnected.is_fatal());
        assert!(Error::ChannelDisconnected.is_recoverable());
        assert!(Error::transport("connection reset").is_recoverable());
    }

    #[test]
    fn test_invalid_endpoint_is_recoverable() {
        let err = Error::invalid_endpoint("port out of range");
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::TerminalInit("no tty".into()).is_fatal());
        assert!(Error::terminal("raw mode").is_fatal());
        assert!(!Error::config("bad toml").is_fatal());
    }

    #[test]
    fn test_ended_channel_is_recoverable() {
        assert!(Error::ChannelClosed.is_recoverable());
        assert!(!Error::ChannelClosed.is_fatal());
    }

    #[test]
    fn test_context_preserves_error() {
        let res: std::result::Result<(), Error> = Err(Error::protocol("bad frame"));
        let err = res.context("decoding frame").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
