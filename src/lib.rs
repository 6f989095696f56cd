//! NVS reset core for the MODI+ network module.
//!
//! Resets the persisted network configuration of a connected network
//! module over its serial link.
//!
//! # Protocol Overview
//!
//! One reset session runs:
//! 1. **Discovery** - Find the module's serial port by USB VID/PID
//! 2. **Handshake** - Answer health broadcasts until the module announces
//!    its UUID via an assign-id frame
//! 3. **Reset request** - Send the NVS reset command to the module's
//!    assigned short id
//! 4. **Retry** - Retransmit on a fixed schedule, bounded at three
//!    attempts
//! 5. **Confirmation** - The firmware controller's version broadcast
//!    marks the reset complete
//!
//! The frame reader and the retry supervisor run as independent tasks over
//! shared session state; the caller observes progress only through an
//! injected [`NotificationSink`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modi_nvs_reset::{ResetManager, NotificationSink, ResetEvent};
//!
//! struct PrintSink;
//! impl NotificationSink for PrintSink {
//!     fn notify(&self, event: ResetEvent) {
//!         println!("{}", event.message());
//!     }
//! }
//!
//! let mut manager = ResetManager::new(Arc::new(PrintSink));
//! let handle = manager.start_session()?;
//! while handle.is_active() {
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! ```

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod module;
pub mod reader;
pub mod sink;
pub mod transport;

mod engine;
mod session;
mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the session-facing surface
pub use codec::{decode_frame, encode_frame, encode_payload, Command, Message};
pub use device::{find_network_modules, NetworkDevice};
pub use engine::{ResetManager, SessionHandle};
pub use error::{ResetError, ResetResult};
pub use module::{ModuleIdentity, ModuleType};
pub use session::Phase;
pub use sink::{NotificationSink, ResetEvent};
