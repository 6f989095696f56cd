//! In-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{ResetError, ResetResult};
use crate::sink::{NotificationSink, ResetEvent};
use crate::transport::Transport;

/// Transport fed from a fixed byte script, recording everything written.
pub(crate) struct ScriptedTransport {
    incoming: VecDeque<u8>,
    written: Arc<Mutex<Vec<u8>>>,
    close_count: Arc<Mutex<u32>>,
    fail_reads_when_drained: bool,
    closed: bool,
}

impl ScriptedTransport {
    pub(crate) fn new(incoming: &[u8]) -> Self {
        Self {
            incoming: incoming.iter().copied().collect(),
            written: Arc::new(Mutex::new(Vec::new())),
            close_count: Arc::new(Mutex::new(0)),
            fail_reads_when_drained: false,
            closed: false,
        }
    }

    /// After the script is drained, reads fail with an I/O error instead
    /// of timing out. Simulates the cable being pulled.
    pub(crate) fn failing_after_script(incoming: &[u8]) -> Self {
        let mut transport = Self::new(incoming);
        transport.fail_reads_when_drained = true;
        transport
    }

    /// Handle onto the write capture, usable after the transport is boxed.
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }

    /// Handle onto the close counter.
    pub(crate) fn close_counter(&self) -> Arc<Mutex<u32>> {
        self.close_count.clone()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> ResetResult<()> {
        if self.closed {
            return Err(ResetError::TransportClosed);
        }
        self.written.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    fn read_byte(&mut self) -> ResetResult<Option<u8>> {
        if self.closed {
            return Err(ResetError::TransportClosed);
        }
        match self.incoming.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None if self.fail_reads_when_drained => Err(ResetError::Io(
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device unplugged"),
            )),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> ResetResult<()> {
        self.closed = true;
        *self.close_count.lock().unwrap() += 1;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Sink capturing every event in order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<ResetEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<ResetEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, event: &ResetEvent) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: ResetEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Sink that drops everything.
pub(crate) struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: ResetEvent) {}
}
