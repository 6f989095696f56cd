//! Protocol engine: the reset state machine and session orchestration.
//!
//! A session runs `Idle -> TargetAcquired -> Completed`, with `Failed`
//! reachable via retry exhaustion or a dropped connection. The engine owns
//! every phase transition; the retry supervisor only reads the phase and
//! spends the retry budget.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::codec::{self, Command, Message};
use crate::config::{
    FIRMWARE_CONTROLLER_ID, HEALTH_REPLY_PAYLOAD, HOST_ID, PRESS_BUTTON_PROMPT, RESET_REQUEST_PAYLOAD,
    RESET_SOURCE_ID, RETRY_INTERVAL,
};
use crate::device;
use crate::error::{ResetError, ResetResult};
use crate::module::{ModuleIdentity, ModuleType};
use crate::reader;
use crate::session::{Phase, SessionShared};
use crate::sink::{NotificationSink, ResetEvent};
use crate::supervisor;
use crate::transport::{SerialTransport, Transport};

/// Entry point for running reset sessions.
///
/// Holds the injected notification sink and tracks the current session so
/// a second concurrent start is rejected.
pub struct ResetManager {
    sink: Arc<dyn NotificationSink>,
    retry_interval: Duration,
    session: Option<Arc<SessionShared>>,
}

impl ResetManager {
    /// Create a manager that reports through the given sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            retry_interval: RETRY_INTERVAL,
            session: None,
        }
    }

    /// Start a reset session against the first discovered network module.
    ///
    /// Returns as soon as the transport is open and the reader task is
    /// running; the outcome is observed exclusively through the sink.
    pub fn start_session(&mut self) -> ResetResult<SessionHandle> {
        let port = match device::discover_port() {
            Ok(port) => port,
            Err(e @ ResetError::DeviceNotFound) => {
                self.sink.notify(ResetEvent::DeviceNotFound);
                self.sink
                    .notify(ResetEvent::PromptUserAction(PRESS_BUTTON_PROMPT.into()));
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.start_session_on_port(&port)
    }

    /// Start a reset session on an explicitly chosen serial port.
    pub fn start_session_on_port(&mut self, port: &str) -> ResetResult<SessionHandle> {
        if self.session.as_ref().is_some_and(|s| s.is_active()) {
            return Err(ResetError::SessionAlreadyActive);
        }

        let transport = SerialTransport::open(port)?;
        Ok(self.launch(Box::new(transport)))
    }

    /// Wire up shared state and start the reader task over an open
    /// transport.
    fn launch(&mut self, transport: Box<dyn Transport>) -> SessionHandle {
        let shared = SessionShared::new(transport, self.sink.clone(), self.retry_interval);

        let reader_shared = shared.clone();
        thread::spawn(move || reader::run(reader_shared));

        self.session = Some(shared.clone());
        SessionHandle { shared }
    }
}

/// Opaque handle to a running reset session.
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Check if the session is still in progress.
    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }
}

/// Dispatch one decoded frame against the session state machine.
///
/// Unknown commands and command/state combinations outside the protocol
/// are ignored without error.
pub(crate) fn handle_frame(shared: &Arc<SessionShared>, message: &Message) {
    match message.command {
        Command::Health => {
            // Keep the sender responsive while we wait for discovery
            if shared.phase() == Phase::Idle {
                let reply = codec::encode_frame(
                    Command::HealthReply,
                    HOST_ID,
                    message.source,
                    &HEALTH_REPLY_PAYLOAD,
                );
                if let Err(e) = shared.send_frame(&reply) {
                    log::warn!("health reply failed: {}", e);
                }
            }
        }
        Command::AssignId => {
            if shared.phase() != Phase::Idle {
                return;
            }

            let identity = ModuleIdentity::from_payload(&message.payload);
            log::info!(
                "{} module detected, uuid = {:#014x}",
                identity.module_type.name(),
                identity.uuid
            );

            // Only the network module is a reset target
            if identity.module_type != ModuleType::Network {
                return;
            }

            let destination = identity.id;
            if shared.try_acquire_target(identity) {
                shared.sink().notify(ResetEvent::ModuleDetected);

                let request = codec::encode_frame(
                    Command::ResetNvs,
                    RESET_SOURCE_ID,
                    destination,
                    &RESET_REQUEST_PAYLOAD,
                );
                if let Err(e) = shared.send_frame(&request) {
                    log::warn!("reset request failed: {}", e);
                }

                supervisor::spawn(shared.clone());
            }
        }
        Command::Warning => {
            log::warn!("warning frame from module {}", message.source);
        }
        Command::VersionReport => {
            // Only the firmware controller's broadcast confirms the reset
            if message.source == FIRMWARE_CONTROLLER_ID && shared.try_complete() {
                shared.sink().notify(ResetEvent::ResetComplete);
                shared
                    .sink()
                    .notify(ResetEvent::PromptUserAction(PRESS_BUTTON_PROMPT.into()));
                shared.request_stop();
                shared.close_transport();
            }
        }
        Command::ResetNvs | Command::SetModuleState | Command::HealthReply | Command::Unknown(_) => {
        }
    }
}
