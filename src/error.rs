//! Error types for the NVS reset protocol implementation.

use thiserror::Error;

/// Result type alias for reset operations.
pub type ResetResult<T> = Result<T, ResetError>;

/// Errors that can occur during a reset session.
#[derive(Debug, Error)]
pub enum ResetError {
    /// Serial port error from the serialport crate.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Received frame could not be parsed into a protocol message.
    ///
    /// Never escalates past the frame reader; malformed frames are
    /// dropped and the byte stream scan resumes.
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// No connected MODI+ network module was found.
    #[error("No MODI+ network module found")]
    DeviceNotFound,

    /// Serial port is busy (in use by another process).
    #[error("Port '{port}' is busy or in use by another application")]
    PortBusy { port: String },

    /// Permission denied accessing serial port.
    #[error("Permission denied for port '{port}'")]
    PortPermissionDenied { port: String },

    /// The reset request was retransmitted the maximum number of times
    /// without a confirming version broadcast.
    #[error("Reset request timed out after {attempts} attempts")]
    RetryExhausted { attempts: u8 },

    /// A reset session is already running on this manager.
    #[error("A reset session is already active")]
    SessionAlreadyActive,

    /// Operation on a transport that has already been closed.
    #[error("Transport is closed")]
    TransportClosed,

    /// The serial connection dropped in the middle of an active session.
    #[error("Connection lost during reset session")]
    ConnectionLost,
}

impl ResetError {
    /// Check if this error ends the session (reported to the sink, no
    /// frame-level recovery possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResetError::DeviceNotFound
                | ResetError::RetryExhausted { .. }
                | ResetError::ConnectionLost
        )
    }
}
