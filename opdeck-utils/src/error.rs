//! Error types for opdeck
//!
//! Provides a unified error type used across all opdeck crates.

use std::path::PathBuf;

/// Main error type for opdeck operations
#[derive(Debug, thiserror::Error)]
pub enum OpdeckError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection timeout after {seconds}s")]
    ConnectionTimeout { seconds: u64 },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // === Session Errors ===

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    // === Collaborator Errors ===

    #[error("Collaborator call failed: {0}")]
    Collaborator(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpdeckError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
            | Self::Connection(_)
        )
    }
}

/// Result type alias using OpdeckError
pub type Result<T> = std::result::Result<T, OpdeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Display Tests ====================

    #[test]
    fn test_error_display() {
        let err = OpdeckError::SessionNotFound("term_3".into());
        assert_eq!(err.to_string(), "Session not found: term_3");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = OpdeckError::Io(io_err);
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = OpdeckError::FileWrite {
            path: PathBuf::from("/var/log/opdeck.log"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to write file"));
        assert!(msg.contains("/var/log/opdeck.log"));
    }

    #[test]
    fn test_error_display_connection() {
        let err = OpdeckError::Connection("refused".into());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_error_display_connection_timeout() {
        let err = OpdeckError::ConnectionTimeout { seconds: 30 };
        assert_eq!(err.to_string(), "Connection timeout after 30s");
    }

    #[test]
    fn test_error_display_connection_closed() {
        let err = OpdeckError::ConnectionClosed;
        assert_eq!(err.to_string(), "Connection closed unexpectedly");
    }

    #[test]
    fn test_error_display_protocol() {
        let err = OpdeckError::Protocol("invalid frame".into());
        assert_eq!(err.to_string(), "Protocol error: invalid frame");
    }

    #[test]
    fn test_error_display_invalid_message() {
        let err = OpdeckError::InvalidMessage("malformed JSON".into());
        assert_eq!(err.to_string(), "Invalid message: malformed JSON");
    }

    #[test]
    fn test_error_display_duplicate_session() {
        let err = OpdeckError::DuplicateSession("default".into());
        assert_eq!(err.to_string(), "Session already exists: default");
    }

    #[test]
    fn test_error_display_collaborator() {
        let err = OpdeckError::Collaborator("archive returned 500".into());
        assert_eq!(err.to_string(), "Collaborator call failed: archive returned 500");
    }

    #[test]
    fn test_error_display_config() {
        let err = OpdeckError::Config("missing key".into());
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn test_error_display_internal() {
        let err = OpdeckError::Internal("unexpected state".into());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    // ==================== Retryable Tests ====================

    #[test]
    fn test_retryable() {
        assert!(OpdeckError::ConnectionTimeout { seconds: 5 }.is_retryable());
        assert!(OpdeckError::Connection("refused".into()).is_retryable());
        assert!(!OpdeckError::SessionNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_not_retryable_errors() {
        let non_retryable = [
            OpdeckError::SessionNotFound("term_1".into()),
            OpdeckError::DuplicateSession("term_1".into()),
            OpdeckError::Protocol("error".into()),
            OpdeckError::InvalidMessage("bad".into()),
            OpdeckError::Collaborator("error".into()),
            OpdeckError::Config("bad".into()),
            OpdeckError::Internal("error".into()),
            OpdeckError::ConnectionClosed,
        ];

        for err in non_retryable {
            assert!(
                !err.is_retryable(),
                "Expected {:?} to NOT be retryable",
                err
            );
        }
    }

    // ==================== From Trait Tests ====================

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: OpdeckError = io_err.into();
        assert!(matches!(err, OpdeckError::Io(_)));
    }

    // ==================== Helper Function Tests ====================

    #[test]
    fn test_connection_helper() {
        let err = OpdeckError::connection("connection refused");
        assert!(matches!(err, OpdeckError::Connection(_)));
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_protocol_helper() {
        let err = OpdeckError::protocol("invalid frame header");
        assert!(matches!(err, OpdeckError::Protocol(_)));
    }

    #[test]
    fn test_collaborator_helper() {
        let err = OpdeckError::collaborator("tool toggle failed");
        assert!(matches!(err, OpdeckError::Collaborator(_)));
    }

    #[test]
    fn test_config_helper() {
        let err = OpdeckError::config("missing required field 'server'");
        assert!(matches!(err, OpdeckError::Config(_)));
    }

    #[test]
    fn test_internal_helper() {
        let err = OpdeckError::internal("invariant violated");
        assert!(matches!(err, OpdeckError::Internal(_)));
    }

    // ==================== Debug Tests ====================

    #[test]
    fn test_error_debug() {
        let err = OpdeckError::DuplicateSession("term_2".into());
        let debug = format!("{:?}", err);
        assert!(debug.contains("DuplicateSession"));
        assert!(debug.contains("term_2"));
    }
}
