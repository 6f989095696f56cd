//! Serial transport layer for module communication.
//!
//! Provides a trait-based abstraction over the serial connection,
//! enabling both real hardware and scripted test transports.

use std::io::Read;

use serialport::SerialPort;

use crate::config::{BAUD_RATE, SERIAL_READ_TIMEOUT};
use crate::error::{ResetError, ResetResult};

/// Trait for reset transport operations.
///
/// Reads are single-byte with a short timeout so the frame reader can
/// observe cancellation promptly. Close is idempotent and safe to call
/// from a different task than the one reading.
pub trait Transport: Send {
    /// Write data to the transport.
    fn write(&mut self, data: &[u8]) -> ResetResult<()>;

    /// Read one byte.
    ///
    /// Returns `Ok(None)` when no byte arrived within the poll timeout.
    fn read_byte(&mut self) -> ResetResult<Option<u8>>;

    /// Close the connection. Subsequent reads and writes fail with
    /// [`ResetError::TransportClosed`]; closing again is a no-op.
    fn close(&mut self) -> ResetResult<()>;

    /// Check whether the connection has been closed.
    fn is_closed(&self) -> bool;
}

/// Serial port transport implementation.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the module's serial port at the protocol baud rate.
    pub fn open(port_name: &str) -> ResetResult<Self> {
        let normalized = normalize_port_name(port_name);

        match serialport::new(&normalized, BAUD_RATE)
            .timeout(SERIAL_READ_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
        {
            Ok(mut port) => {
                // Drop any bytes buffered from before this session
                port.clear(serialport::ClearBuffer::Input).ok();
                Ok(Self { port: Some(port) })
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                Err(match e.kind() {
                    serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                        ResetError::PortPermissionDenied {
                            port: port_name.to_string(),
                        }
                    }
                    serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                        ResetError::DeviceNotFound
                    }
                    _ if err_str.contains("busy") || err_str.contains("in use") => {
                        ResetError::PortBusy {
                            port: port_name.to_string(),
                        }
                    }
                    _ => ResetError::Serial(e),
                })
            }
        }
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> ResetResult<()> {
        use std::io::Write;

        let port = self.port.as_mut().ok_or(ResetError::TransportClosed)?;
        port.write_all(data).map_err(ResetError::Io)?;
        Ok(())
    }

    fn read_byte(&mut self) -> ResetResult<Option<u8>> {
        let port = self.port.as_mut().ok_or(ResetError::TransportClosed)?;

        let mut buffer = [0u8; 1];
        match port.read(&mut buffer) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buffer[0])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(ResetError::Io(e)),
        }
    }

    fn close(&mut self) -> ResetResult<()> {
        // Dropping the handle releases the port; second close is a no-op
        self.port.take();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.port.is_none()
    }
}

/// Normalize a port name for cross-platform compatibility.
fn normalize_port_name(name: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        // Prefer cu. over tty. for better compatibility
        if name.starts_with("/dev/tty.") {
            return name.replace("/dev/tty.", "/dev/cu.");
        }
    }

    #[cfg(target_os = "windows")]
    {
        // COM ports > 9 need \\.\\ prefix
        if name.starts_with("COM") {
            if let Ok(n) = name[3..].parse::<u32>() {
                if n > 9 {
                    return format!("\\\\.\\{}", name);
                }
            }
        }
    }

    name.to_string()
}
