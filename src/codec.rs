//! Wire codec for MODI+ protocol frames.
//!
//! A frame is a compact JSON record with five fields: command `c`, source
//! `s`, destination `d`, base64 payload `b`, and pre-encoding element count
//! `l`. The payload itself uses a variable-width packing scheme where a
//! logically wider integer borrows the zero-padding slots the caller placed
//! after it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::HOST_ID;
use crate::error::{ResetError, ResetResult};

/// Protocol command codes.
///
/// Codes outside the known set are preserved as `Unknown` so the engine can
/// ignore them without losing the raw value in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Periodic module health broadcast (received).
    Health,
    /// NVS reset request (sent).
    ResetNvs,
    /// Module id assignment broadcast carrying the module UUID (received).
    AssignId,
    /// Module state control (available, unused by the reset flow).
    SetModuleState,
    /// Module warning broadcast, log-only (received).
    Warning,
    /// Health reply / ack (sent).
    HealthReply,
    /// Firmware version report (received).
    VersionReport,
    /// Any other command code.
    Unknown(u8),
}

impl Command {
    /// Parse a command from its wire code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Command::Health,
            0x04 => Command::ResetNvs,
            0x05 => Command::AssignId,
            0x09 => Command::SetModuleState,
            0x0A => Command::Warning,
            0x28 => Command::HealthReply,
            0xA1 => Command::VersionReport,
            other => Command::Unknown(other),
        }
    }

    /// Get the wire code for this command.
    pub fn code(&self) -> u8 {
        match self {
            Command::Health => 0x00,
            Command::ResetNvs => 0x04,
            Command::AssignId => 0x05,
            Command::SetModuleState => 0x09,
            Command::Warning => 0x0A,
            Command::HealthReply => 0x28,
            Command::VersionReport => 0xA1,
            Command::Unknown(code) => *code,
        }
    }
}

/// One decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Command selecting the meaning of the frame.
    pub command: Command,
    /// Logical source endpoint (0 = host/manager).
    pub source: u16,
    /// Logical destination endpoint.
    pub destination: u16,
    /// Base64-decoded payload bytes.
    pub payload: Vec<u8>,
    /// Element count of the payload prior to encoding.
    pub length: usize,
}

/// Wire representation of a frame. Field order matches the device firmware.
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    c: u8,
    s: u16,
    d: u16,
    b: String,
    l: usize,
}

/// Pack a sequence of integer elements into a byte buffer of equal length.
///
/// Scan rules, per element at position `i`:
/// - `0`: one zero byte, advance 1.
/// - `>= 256`: written little-endian over `1 + following-zero-count` bytes,
///   consuming those zero placeholder slots.
/// - `< 0`: written as a 4-byte little-endian signed integer.
/// - `1..=255`: one byte.
///
/// The caller must pre-size the sequence so every multi-byte or negative
/// value is followed by enough zero placeholders; the encoder cannot recover
/// field boundaries on its own. Violations panic.
pub fn encode_payload(elements: &[i64]) -> Vec<u8> {
    let mut data = vec![0u8; elements.len()];
    let mut idx = 0;

    while idx < elements.len() {
        let value = elements[idx];
        if value == 0 {
            idx += 1;
        } else if value >= 256 {
            let width = run_width(elements, idx);
            write_le(&mut data[idx..idx + width], value);
            idx += width;
        } else if value < 0 {
            assert!(
                idx + 4 <= elements.len(),
                "negative element at index {} requires 3 trailing zero placeholders",
                idx
            );
            data[idx..idx + 4].copy_from_slice(&(value as i32).to_le_bytes());
            idx += 4;
        } else {
            data[idx] = value as u8;
            idx += 1;
        }
    }

    data
}

/// Count the run width for a multi-byte element: itself plus every
/// consecutive zero placeholder that follows.
fn run_width(elements: &[i64], begin: usize) -> usize {
    let mut width = 1;
    for &element in &elements[begin + 1..] {
        if element == 0 {
            width += 1;
        } else {
            break;
        }
    }
    width
}

/// Write `value` little-endian into `slot`, which must be wide enough.
fn write_le(slot: &mut [u8], value: i64) {
    let bytes = value.to_le_bytes();
    let copy = slot.len().min(8);
    assert!(
        slot.len() >= 8 || value >> (8 * slot.len() as u32) == 0,
        "element 0x{:X} does not fit in {} zero-padded byte(s)",
        value,
        slot.len()
    );
    slot[..copy].copy_from_slice(&bytes[..copy]);
}

/// Read a `width`-byte little-endian signed field starting at `offset`.
///
/// Inverse of the packing scheme for a single field, given the field width
/// the command dictates.
pub fn read_field(bytes: &[u8], offset: usize, width: usize) -> i64 {
    let mut buf = [0u8; 8];
    let end = (offset + width).min(bytes.len());
    let slice = &bytes[offset..end];
    buf[..slice.len()].copy_from_slice(slice);

    let raw = i64::from_le_bytes(buf);
    if width >= 8 {
        return raw;
    }

    // Sign-extend from the field width
    let shift = (8 - width) as u32 * 8;
    (raw << shift) >> shift
}

/// Encode a complete protocol frame as compact JSON text.
pub fn encode_frame(command: Command, source: u16, destination: u16, elements: &[i64]) -> String {
    let payload = encode_payload(elements);
    let frame = WireFrame {
        c: command.code(),
        s: source,
        d: destination,
        b: BASE64.encode(&payload),
        l: elements.len(),
    };

    // A flat record of primitives cannot fail to serialize
    serde_json::to_string(&frame).expect("frame serialization is infallible")
}

/// Encode a module state control frame with a `[module_state, pnp_state]`
/// payload.
///
/// Part of the protocol surface; the reset flow itself never sends it.
pub fn encode_set_module_state(destination: u16, module_state: u8, pnp_state: u8) -> String {
    encode_frame(
        Command::SetModuleState,
        HOST_ID,
        destination,
        &[module_state as i64, pnp_state as i64],
    )
}

/// Decode a JSON frame into a [`Message`].
///
/// Fails with [`ResetError::MalformedFrame`] if required fields are absent,
/// the base64 payload is invalid, or the declared length disagrees with the
/// decoded payload.
pub fn decode_frame(text: &str) -> ResetResult<Message> {
    let frame: WireFrame = serde_json::from_str(text).map_err(|e| ResetError::MalformedFrame {
        reason: e.to_string(),
    })?;

    let payload = BASE64
        .decode(frame.b.as_bytes())
        .map_err(|e| ResetError::MalformedFrame {
            reason: format!("invalid base64 payload: {}", e),
        })?;

    if payload.len() != frame.l {
        return Err(ResetError::MalformedFrame {
            reason: format!(
                "declared length {} does not match payload of {} bytes",
                frame.l,
                payload.len()
            ),
        });
    }

    Ok(Message {
        command: Command::from_code(frame.c),
        source: frame.s,
        destination: frame.d,
        payload,
        length: frame.l,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_roundtrip() {
        for code in [0x00u8, 0x04, 0x05, 0x09, 0x0A, 0x28, 0xA1, 0x77] {
            assert_eq!(Command::from_code(code).code(), code);
        }
        assert_eq!(Command::from_code(0x77), Command::Unknown(0x77));
    }

    #[test]
    fn test_encode_payload_single_bytes() {
        let elements = [1i64, 0, 255, 42];
        assert_eq!(encode_payload(&elements), vec![1, 0, 255, 42]);
    }

    #[test]
    fn test_encode_payload_empty() {
        assert_eq!(encode_payload(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_encode_payload_multibyte_borrows_padding() {
        // 0xFFF followed by one zero placeholder packs as 2 bytes LE
        let elements = [0xFFFi64, 0, 5];
        assert_eq!(encode_payload(&elements), vec![0xFF, 0x0F, 5]);
    }

    #[test]
    fn test_encode_payload_health_reply() {
        let elements = [0xFFFi64, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            encode_payload(&elements),
            vec![0xFF, 0x0F, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_encode_payload_negative_four_bytes() {
        let elements = [-2i64, 0, 0, 0, 7];
        assert_eq!(encode_payload(&elements), vec![0xFE, 0xFF, 0xFF, 0xFF, 7]);
    }

    #[test]
    #[should_panic(expected = "zero placeholders")]
    fn test_encode_payload_missing_negative_padding_panics() {
        encode_payload(&[-1i64]);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_encode_payload_overflowing_run_panics() {
        // 0x12345 needs 3 bytes but only has a 2-slot run
        encode_payload(&[0x12345i64, 0, 9]);
    }

    #[test]
    fn test_read_field_roundtrip() {
        // Any sequence with valid zero padding decodes back field by field
        let elements = [0x1234i64, 0, 5, -2, 0, 0, 0, 0xAB];
        let bytes = encode_payload(&elements);

        assert_eq!(read_field(&bytes, 0, 2), 0x1234);
        assert_eq!(read_field(&bytes, 2, 1), 5);
        assert_eq!(read_field(&bytes, 3, 4), -2);
        assert_eq!(read_field(&bytes, 7, 1), 0xAB);
    }

    #[test]
    fn test_read_field_sign_extension() {
        let bytes = [0xFFu8, 0xFF];
        assert_eq!(read_field(&bytes, 0, 2), -1);
        assert_eq!(read_field(&bytes, 0, 1), -1);
    }

    #[test]
    fn test_encode_frame_exact_wire_format() {
        let text = encode_frame(Command::ResetNvs, 30, 0x123, &[0]);
        assert_eq!(text, r#"{"c":4,"s":30,"d":291,"b":"AA==","l":1}"#);
    }

    #[test]
    fn test_decode_frame_valid() {
        let msg = decode_frame(r#"{"c":4,"s":30,"d":291,"b":"AA==","l":1}"#).unwrap();
        assert_eq!(msg.command, Command::ResetNvs);
        assert_eq!(msg.source, 30);
        assert_eq!(msg.destination, 291);
        assert_eq!(msg.payload, vec![0]);
        assert_eq!(msg.length, 1);
    }

    #[test]
    fn test_decode_frame_missing_field() {
        let result = decode_frame(r#"{"c":4,"s":30,"d":291}"#);
        assert!(matches!(result, Err(ResetError::MalformedFrame { .. })));
    }

    #[test]
    fn test_decode_frame_invalid_base64() {
        let result = decode_frame(r#"{"c":4,"s":30,"d":291,"b":"!!","l":1}"#);
        assert!(matches!(result, Err(ResetError::MalformedFrame { .. })));
    }

    #[test]
    fn test_decode_frame_length_mismatch() {
        let result = decode_frame(r#"{"c":4,"s":30,"d":291,"b":"AA==","l":3}"#);
        assert!(matches!(result, Err(ResetError::MalformedFrame { .. })));
    }

    #[test]
    fn test_encode_set_module_state() {
        let msg = decode_frame(&encode_set_module_state(0x123, 2, 1)).unwrap();
        assert_eq!(msg.command, Command::SetModuleState);
        assert_eq!(msg.payload, vec![2, 1]);
        assert_eq!(msg.length, 2);
    }

    #[test]
    fn test_frame_roundtrip() {
        let text = encode_frame(Command::HealthReply, 0, 0xFFF, &[0xFF, 0x0F]);
        let msg = decode_frame(&text).unwrap();
        assert_eq!(msg.command, Command::HealthReply);
        assert_eq!(msg.destination, 0xFFF);
        assert_eq!(msg.payload, vec![0xFF, 0x0F]);
    }
}
