//! Shared state for one reset session.
//!
//! The frame reader and retry supervisor run as independent tasks over the
//! same session. All cross-task state lives behind one mutex and is only
//! reachable through whole-transition operations, so neither task can
//! observe a partially-updated session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::MAX_RESET_RETRIES;
use crate::error::ResetResult;
use crate::module::ModuleIdentity;
use crate::sink::NotificationSink;
use crate::transport::Transport;

/// Session phase. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a network module to announce itself.
    Idle,
    /// Target module known, reset request in flight.
    TargetAcquired,
    /// Reset confirmed by the firmware controller's version broadcast.
    Completed,
    /// Retry budget exhausted or connection lost.
    Failed,
}

impl Phase {
    /// Check if the session can make no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

/// Outcome of one retry supervisor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// Still waiting for confirmation; resend the reset request.
    Resend { destination: u16 },
    /// Retry budget spent while the target is still unconfirmed.
    Exhausted,
    /// The session moved on without this supervisor; exit quietly.
    StandDown,
}

struct SessionState {
    phase: Phase,
    target: Option<ModuleIdentity>,
    retry_count: u8,
}

/// State shared between the reader task, the supervisor task, and the
/// session handle.
pub(crate) struct SessionShared {
    state: Mutex<SessionState>,
    stop: AtomicBool,
    transport: Mutex<Box<dyn Transport>>,
    sink: Arc<dyn NotificationSink>,
    retry_interval: Duration,
}

impl SessionShared {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        sink: Arc<dyn NotificationSink>,
        retry_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                target: None,
                retry_count: 0,
            }),
            stop: AtomicBool::new(false),
            transport: Mutex::new(transport),
            sink,
            retry_interval,
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Record the target module and move `Idle -> TargetAcquired`.
    ///
    /// Returns false without touching the session if a target was already
    /// acquired or the session is terminal.
    pub(crate) fn try_acquire_target(&self, identity: ModuleIdentity) -> bool {
        let mut state = self.lock_state();
        if state.phase != Phase::Idle {
            return false;
        }
        state.phase = Phase::TargetAcquired;
        state.target = Some(identity);
        true
    }

    /// Move `TargetAcquired -> Completed`. Returns false from any other
    /// phase, so completion side effects fire at most once.
    pub(crate) fn try_complete(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase != Phase::TargetAcquired {
            return false;
        }
        state.phase = Phase::Completed;
        true
    }

    /// Move a non-terminal session to `Failed`. Returns false if the
    /// session already ended, so failure events fire at most once.
    pub(crate) fn fail(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase.is_terminal() {
            return false;
        }
        state.phase = Phase::Failed;
        true
    }

    /// Evaluate one supervisor tick: resend while the retry budget lasts
    /// and the target is still unconfirmed, otherwise classify the exit.
    pub(crate) fn tick_retry(&self) -> RetryDecision {
        let mut state = self.lock_state();
        match state.phase {
            Phase::TargetAcquired => {
                if state.retry_count < MAX_RESET_RETRIES {
                    state.retry_count += 1;
                    let destination = state
                        .target
                        .as_ref()
                        .map(|t| t.id)
                        .unwrap_or_default();
                    RetryDecision::Resend { destination }
                } else {
                    RetryDecision::Exhausted
                }
            }
            // Torn down before a target was confirmed, or another task
            // already ended the session
            Phase::Idle | Phase::Completed | Phase::Failed => RetryDecision::StandDown,
        }
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Check if the session is still running (not stopped, not terminal).
    pub(crate) fn is_active(&self) -> bool {
        !self.stopped() && !self.phase().is_terminal()
    }

    pub(crate) fn sink(&self) -> &dyn NotificationSink {
        self.sink.as_ref()
    }

    pub(crate) fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Write an encoded frame to the transport.
    pub(crate) fn send_frame(&self, frame: &str) -> ResetResult<()> {
        self.lock_transport().write(frame.as_bytes())
    }

    /// Poll the transport for one byte.
    pub(crate) fn read_byte(&self) -> ResetResult<Option<u8>> {
        self.lock_transport().read_byte()
    }

    /// Close the transport. Safe to call from either task, any number of
    /// times.
    pub(crate) fn close_transport(&self) {
        if let Err(e) = self.lock_transport().close() {
            log::warn!("closing transport failed: {}", e);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A task panicking while holding the lock already aborts the
        // session; propagate the poison as a panic rather than limp on
        self.state.lock().expect("session state lock poisoned")
    }

    fn lock_transport(&self) -> std::sync::MutexGuard<'_, Box<dyn Transport>> {
        self.transport.lock().expect("transport lock poisoned")
    }
}
