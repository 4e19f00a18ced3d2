//! Error types for Courier

use thiserror::Error;

/// Main error type for Courier operations
#[derive(Error, Debug)]
pub enum CourierError {
    /// Malformed or missing request field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-200 response from the downstream webhook.
    ///
    /// The only variant whose status code and body are surfaced to the
    /// browser; everything else collapses to a generic 500 envelope.
    #[error("Downstream returned status {status}")]
    Downstream { status: u16, body: String },

    /// Network failure reaching the downstream webhook (connect, timeout,
    /// DNS). The specific reason is logged, never surfaced to the caller.
    #[error("Transport error: {0}")]
    Transport(String),

    /// OAuth state mismatch or rejected authorization-code exchange
    #[error("Auth exchange error: {0}")]
    AuthExchange(String),

    /// Reasoning-loop or tool failure in agent mode
    #[error("Agent error: {0}")]
    Agent(String),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downstream_error_display() {
        let err = CourierError::Downstream {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Downstream returned status 502");
    }

    #[test]
    fn test_transport_error_display() {
        let err = CourierError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CourierError = io_err.into();
        assert!(matches!(err, CourierError::Io(_)));
    }
}
