//! Frame reader: extracts discrete message frames from the raw byte stream.
//!
//! Runs as a long-lived task once the connection is open. Bytes outside a
//! frame are ignored until a `{` is seen; the frame ends at the next `}`.

use std::sync::Arc;

use crate::codec;
use crate::engine;
use crate::error::ResetError;
use crate::session::SessionShared;
use crate::sink::ResetEvent;

/// Upper bound on an accumulated frame. A valid frame is well under 100
/// bytes; anything larger is stream garbage and gets discarded.
const MAX_FRAME_SIZE: usize = 1024;

/// Streaming scanner that accumulates one brace-delimited frame at a time.
///
/// This is a simple bracket detector, not a JSON scanner: the frame format
/// is always a single flat record, so the first `}` terminates the frame.
/// A `}` inside a quoted string value would close the frame early and the
/// fragment would be dropped as malformed. The device firmware never emits
/// such values.
#[derive(Debug, Default)]
pub struct FrameScanner {
    buffer: Vec<u8>,
    in_frame: bool,
}

impl FrameScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(128),
            in_frame: false,
        }
    }

    /// Feed a byte to the scanner.
    ///
    /// Returns the complete bracketed span (including both braces) when a
    /// frame closes, `None` while more bytes are needed.
    pub fn feed(&mut self, byte: u8) -> Option<String> {
        if !self.in_frame {
            if byte == b'{' {
                self.in_frame = true;
                self.buffer.clear();
                self.buffer.push(byte);
            }
            return None;
        }

        self.buffer.push(byte);

        if byte == b'}' {
            self.in_frame = false;
            let frame = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            return Some(frame);
        }

        if self.buffer.len() > MAX_FRAME_SIZE {
            log::debug!("discarding oversized frame fragment");
            self.reset();
        }

        None
    }

    /// Reset the scanner state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_frame = false;
    }
}

/// Reader task body: poll the transport byte by byte, dispatch complete
/// frames to the protocol engine, drop malformed ones, and exit once the
/// session stops or the connection closes.
pub(crate) fn run(shared: Arc<SessionShared>) {
    let mut scanner = FrameScanner::new();

    while !shared.stopped() {
        match shared.read_byte() {
            Ok(Some(byte)) => {
                if let Some(text) = scanner.feed(byte) {
                    match codec::decode_frame(&text) {
                        Ok(message) => engine::handle_frame(&shared, &message),
                        // A malformed frame never stops the reader
                        Err(e) => log::debug!("dropping malformed frame: {}", e),
                    }
                }
            }
            Ok(None) => {}
            // Another task closed the transport during shutdown
            Err(ResetError::TransportClosed) => break,
            Err(e) => {
                if shared.stopped() || shared.phase().is_terminal() {
                    break;
                }
                log::error!("serial read failed mid-session: {}", e);
                if shared.fail() {
                    shared.sink().notify(ResetEvent::ConnectionLost);
                }
                shared.request_stop();
                shared.close_transport();
                break;
            }
        }
    }
}
