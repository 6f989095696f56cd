//! Device detection for the MODI+ network module.
//!
//! Finds the module's USB-CDC serial interface by VID/PID.

use serde::{Deserialize, Serialize};
use serialport::{available_ports, SerialPortType};

use crate::config::{MODI_NETWORK_PID, MODI_VID};
use crate::error::{ResetError, ResetResult};

/// Information about a detected MODI+ network module port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDevice {
    /// Serial port path (e.g., "/dev/cu.usbmodem1234" or "COM3").
    pub port: String,
    /// USB Vendor ID.
    pub vid: u16,
    /// USB Product ID.
    pub pid: u16,
    /// Device serial number (if available).
    pub serial_number: Option<String>,
    /// Product name (if available).
    pub product_name: Option<String>,
}

impl NetworkDevice {
    /// Get a display label for this device.
    pub fn display_label(&self) -> String {
        if let Some(ref name) = self.product_name {
            format!("{} ({})", name, self.port)
        } else {
            format!("MODI+ Network Module ({})", self.port)
        }
    }
}

/// Find all connected MODI+ network modules.
///
/// Scans available serial ports and returns those matching the module's
/// VID/PID.
///
/// On macOS, filters out `tty.*` ports to avoid duplicates (each device
/// appears as both `cu.*` and `tty.*`). The `cu.*` variant is preferred
/// as it doesn't block waiting for DCD.
pub fn find_network_modules() -> Vec<NetworkDevice> {
    scan_ports(|vid, pid| vid == MODI_VID && pid == MODI_NETWORK_PID)
}

/// Select the port to use for a reset session.
///
/// Discovery policy, in order:
/// 1. First port matching the module's VID/PID.
/// 2. On Windows, first vendor USB port regardless of PID - the module's
///    composite WinUSB interface enumerates without the CDC product id.
/// 3. Otherwise `DeviceNotFound`, a terminal condition at this level.
pub fn discover_port() -> ResetResult<String> {
    if let Some(device) = find_network_modules().into_iter().next() {
        return Ok(device.port);
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(device) = scan_ports(|vid, _| vid == MODI_VID).into_iter().next() {
            return Ok(device.port);
        }
    }

    Err(ResetError::DeviceNotFound)
}

fn scan_ports(matches: impl Fn(u16, u16) -> bool) -> Vec<NetworkDevice> {
    let mut devices = Vec::new();

    let ports = match available_ports() {
        Ok(ports) => ports,
        Err(_) => return devices,
    };

    for port in ports {
        // On macOS, skip tty.* ports to avoid duplicates
        #[cfg(target_os = "macos")]
        if port.port_name.contains("/dev/tty.") {
            continue;
        }

        if let SerialPortType::UsbPort(usb_info) = &port.port_type {
            if matches(usb_info.vid, usb_info.pid) {
                devices.push(NetworkDevice {
                    port: port.port_name.clone(),
                    vid: usb_info.vid,
                    pid: usb_info.pid,
                    serial_number: usb_info.serial_number.clone(),
                    product_name: usb_info.product.clone(),
                });
            }
        }
    }

    devices
}
