// Error handling module
// Defines the error taxonomy shared by the session, histogram and driver

use thiserror::Error;

/// Errors that can occur while running a benchmark
#[derive(Error, Debug)]
pub enum BenchError {
    /// Socket-level failure on an established session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not connect to the counterpart
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Logon handshake was not completed
    #[error("Logon failed: {0}")]
    Logon(String),

    /// Counterpart logged out or closed the connection
    #[error("Session closed by counterpart")]
    SessionClosed,

    /// Malformed or out-of-sequence message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Histogram could not be created with the requested bounds
    #[error("Histogram error: {0}")]
    Histogram(String),

    /// Sample exceeds the highest trackable value
    #[error("Latency {value} ns exceeds the trackable maximum of {max} ns")]
    LatencyOutOfRange { value: u64, max: u64 },

    /// Percentile queried before anything was recorded
    #[error("No latency samples recorded")]
    EmptyHistogram,
}

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BenchError::Logon("unexpected MsgType 8".to_string());
        assert_eq!(err.to_string(), "Logon failed: unexpected MsgType 8");

        let err = BenchError::SessionClosed;
        assert_eq!(err.to_string(), "Session closed by counterpart");

        let err = BenchError::LatencyOutOfRange {
            value: 120,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "Latency 120 ns exceeds the trackable maximum of 100 ns"
        );
    }

    #[test]
    fn test_connect_error_keeps_source() {
        use std::error::Error as _;

        let err = BenchError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.to_string(), "Failed to connect to 127.0.0.1:1: refused");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: BenchError = io.into();
        assert!(matches!(err, BenchError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: eof");
    }
}
