//! Configuration constants for the MODI+ network reset protocol.

// Allow unused items - these are part of the protocol surface and may be
// used for future flows like module state control.
#![allow(dead_code)]

use std::time::Duration;

// ============================================================================
// USB Device Identifiers
// ============================================================================

/// MODI+ USB Vendor ID.
pub const MODI_VID: u16 = 0x2FDE;

/// Product ID for the MODI+ network module CDC serial interface.
pub const MODI_NETWORK_PID: u16 = 0x0003;

// ============================================================================
// Serial Communication
// ============================================================================

/// Baud rate for communication with the network module.
pub const BAUD_RATE: u32 = 115_200;

/// Per-byte read timeout for the frame reader poll loop.
///
/// Kept short so the reader observes the stop flag promptly and so the
/// retry supervisor never waits long for the transport lock.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(20);

// ============================================================================
// Protocol Addresses
// ============================================================================

/// Logical address of the host/manager endpoint.
pub const HOST_ID: u16 = 0;

/// Source id carried by outgoing NVS reset requests.
pub const RESET_SOURCE_ID: u16 = 30;

/// Source id of the firmware controller (ESP32) whose version broadcast
/// confirms the reset completed.
pub const FIRMWARE_CONTROLLER_ID: u16 = 9;

/// Broadcast destination id.
pub const BROADCAST_ID: u16 = 0xFFF;

// ============================================================================
// Retry Configuration
// ============================================================================

/// Maximum number of reset request retransmissions after the initial send.
pub const MAX_RESET_RETRIES: u8 = 3;

/// Interval between retry supervisor ticks.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// Fixed Payloads
// ============================================================================

/// Health-reply payload elements: 0xFFF packed little-endian into 8 slots.
pub const HEALTH_REPLY_PAYLOAD: [i64; 8] = [0xFFF, 0, 0, 0, 0, 0, 0, 0];

/// Reset request payload: a single zero byte.
pub const RESET_REQUEST_PAYLOAD: [i64; 1] = [0];

// ============================================================================
// User-facing Messages
// ============================================================================

/// Prompt shown whenever the user must press the module button to finish.
pub const PRESS_BUTTON_PROMPT: &str = "Press the button";
