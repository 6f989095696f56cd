//! Retry supervisor: timeout-driven retransmission of the reset request.
//!
//! Started only once a target module has been acquired. Every tick it
//! resends the reset request until either the version broadcast completes
//! the session or the retry budget runs out.

use std::sync::Arc;
use std::thread;

use crate::codec::{self, Command};
use crate::config::{MAX_RESET_RETRIES, PRESS_BUTTON_PROMPT, RESET_REQUEST_PAYLOAD, RESET_SOURCE_ID};
use crate::error::ResetError;
use crate::session::{RetryDecision, SessionShared};
use crate::sink::ResetEvent;

/// Spawn the supervisor task for an acquired target.
pub(crate) fn spawn(shared: Arc<SessionShared>) -> thread::JoinHandle<()> {
    thread::spawn(move || run(shared))
}

/// Supervisor task body. Separated from [`spawn`] so tests can drive it
/// on the current thread with a short tick interval.
pub(crate) fn run(shared: Arc<SessionShared>) {
    let interval = shared.retry_interval();

    while !shared.stopped() {
        thread::sleep(interval);
        if shared.stopped() {
            break;
        }

        match shared.tick_retry() {
            RetryDecision::Resend { destination } => {
                let frame = codec::encode_frame(
                    Command::ResetNvs,
                    RESET_SOURCE_ID,
                    destination,
                    &RESET_REQUEST_PAYLOAD,
                );
                if let Err(e) = shared.send_frame(&frame) {
                    log::warn!("reset request retransmission failed: {}", e);
                }
            }
            RetryDecision::StandDown => break,
            RetryDecision::Exhausted => {
                log::error!(
                    "{}",
                    ResetError::RetryExhausted {
                        attempts: MAX_RESET_RETRIES
                    }
                );
                if shared.fail() {
                    shared.sink().notify(ResetEvent::TimeoutError);
                    shared
                        .sink()
                        .notify(ResetEvent::PromptUserAction(PRESS_BUTTON_PROMPT.into()));
                }
                shared.request_stop();
                shared.close_transport();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::codec::decode_frame;
    use crate::module::ModuleIdentity;
    use crate::reader::FrameScanner;
    use crate::session::Phase;
    use crate::test_support::{RecordingSink, ScriptedTransport};

    fn shared_with(
        sink: Arc<RecordingSink>,
        transport: ScriptedTransport,
    ) -> Arc<SessionShared> {
        SessionShared::new(Box::new(transport), sink, Duration::from_millis(5))
    }

    fn parse_written(written: &[u8]) -> Vec<crate::codec::Message> {
        let mut scanner = FrameScanner::new();
        written
            .iter()
            .filter_map(|&b| scanner.feed(b))
            .map(|text| decode_frame(&text).expect("captured frame must parse"))
            .collect()
    }

    #[test]
    fn test_exhaustion_after_three_retries() {
        let sink = Arc::new(RecordingSink::default());
        let transport = ScriptedTransport::new(&[]);
        let written = transport.written();
        let shared = shared_with(sink.clone(), transport);

        shared.try_acquire_target(ModuleIdentity::from_uuid(0x0000_0000_0123));
        run(shared.clone());

        // Three retransmissions, then failure
        let frames = parse_written(&written.lock().unwrap());
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.command, Command::ResetNvs);
            assert_eq!(frame.source, RESET_SOURCE_ID);
            assert_eq!(frame.destination, 0x123);
            assert_eq!(frame.payload, vec![0]);
        }

        assert_eq!(shared.phase(), Phase::Failed);
        assert!(shared.stopped());
        assert_eq!(sink.count(&ResetEvent::TimeoutError), 1);
        assert_eq!(
            sink.count(&ResetEvent::PromptUserAction(PRESS_BUTTON_PROMPT.into())),
            1
        );
    }

    #[test]
    fn test_no_target_teardown_is_silent() {
        let sink = Arc::new(RecordingSink::default());
        let shared = shared_with(sink.clone(), ScriptedTransport::new(&[]));

        // Session never left Idle; the supervisor exits without events
        run(shared.clone());

        assert_eq!(shared.phase(), Phase::Idle);
        assert!(sink.events().is_empty());
        assert_eq!(sink.count(&ResetEvent::TimeoutError), 0);
    }

    #[test]
    fn test_stands_down_after_completion() {
        let sink = Arc::new(RecordingSink::default());
        let shared = shared_with(sink.clone(), ScriptedTransport::new(&[]));

        shared.try_acquire_target(ModuleIdentity::from_uuid(0x0000_0000_0123));
        shared.try_complete();
        shared.request_stop();

        run(shared.clone());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_stop_flag_checked_before_tick() {
        let sink = Arc::new(RecordingSink::default());
        let transport = ScriptedTransport::new(&[]);
        let written = transport.written();
        let shared = shared_with(sink, transport);

        shared.try_acquire_target(ModuleIdentity::from_uuid(0x0000_0000_0123));
        shared.request_stop();

        run(shared);
        assert!(written.lock().unwrap().is_empty());
    }
}
