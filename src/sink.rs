//! Notification sink interface.
//!
//! The core never renders anything; status, progress, and errors are
//! emitted as fire-and-forget events through an injected sink. The
//! surrounding shell (GUI or CLI) decides how to present them.

/// Events emitted over the lifetime of one reset session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetEvent {
    /// No connected network module was found; the session never started.
    DeviceNotFound,
    /// A network module answered discovery and the reset request went out.
    ModuleDetected,
    /// The module confirmed the reset via its version broadcast.
    ResetComplete,
    /// Retry budget exhausted without confirmation.
    TimeoutError,
    /// The serial connection dropped mid-session.
    ConnectionLost,
    /// The user must do something to finish (e.g. press the module button).
    PromptUserAction(String),
}

impl ResetEvent {
    /// Get a human-readable message for this event.
    pub fn message(&self) -> String {
        match self {
            ResetEvent::DeviceNotFound => "Please connect MODI+ Network Module".into(),
            ResetEvent::ModuleDetected => "module detected".into(),
            ResetEvent::ResetComplete => "reset complete".into(),
            ResetEvent::TimeoutError => "Timeout error".into(),
            ResetEvent::ConnectionLost => "Connection to the module was lost".into(),
            ResetEvent::PromptUserAction(text) => text.clone(),
        }
    }

    /// Check if this event reports a session failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ResetEvent::DeviceNotFound | ResetEvent::TimeoutError | ResetEvent::ConnectionLost
        )
    }
}

/// Receiver for session events.
///
/// Implementations must tolerate being called from the reader and
/// supervisor tasks; no return value is observed.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Deliver one event.
    fn notify(&self, event: ResetEvent);
}
