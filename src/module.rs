//! MODI+ module identification.
//!
//! Modules report a 48-bit UUID whose top 16 bits select the module type
//! and whose low 12 bits are the runtime-assigned short id used as the
//! destination address for subsequent commands.

use crate::codec;

/// Mask folding a reported UUID down to its 48-bit value.
const UUID_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// MODI+ module types, keyed by the top 16 bits of the UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    Network,
    Battery,
    Env,
    Gyro,
    Button,
    Dial,
    Joystick,
    Tof,
    Display,
    MotorA,
    MotorB,
    Led,
    Speaker,
    /// Unrecognized type code.
    None,
}

impl ModuleType {
    /// Map the type code (top 16 bits of a 48-bit UUID) to a module type.
    pub fn from_type_code(code: u16) -> Self {
        match code {
            0x0000 => ModuleType::Network,
            0x0010 => ModuleType::Battery,
            0x2000 => ModuleType::Env,
            0x2010 => ModuleType::Gyro,
            0x2030 => ModuleType::Button,
            0x2040 => ModuleType::Dial,
            0x2070 => ModuleType::Joystick,
            0x2080 => ModuleType::Tof,
            0x4000 => ModuleType::Display,
            0x4010 => ModuleType::MotorA,
            0x4011 => ModuleType::MotorB,
            0x4020 => ModuleType::Led,
            0x4030 => ModuleType::Speaker,
            _ => ModuleType::None,
        }
    }

    /// Display name matching the device tooling.
    pub fn name(&self) -> &'static str {
        match self {
            ModuleType::Network => "Network",
            ModuleType::Battery => "Battery",
            ModuleType::Env => "Env",
            ModuleType::Gyro => "Gyro",
            ModuleType::Button => "Button",
            ModuleType::Dial => "Dial",
            ModuleType::Joystick => "Joystick",
            ModuleType::Tof => "ToF",
            ModuleType::Display => "Display",
            ModuleType::MotorA => "MotorA",
            ModuleType::MotorB => "MotorB",
            ModuleType::Led => "Led",
            ModuleType::Speaker => "Speaker",
            ModuleType::None => "none",
        }
    }
}

/// Identity of one module, derived from an assign-id broadcast.
///
/// Lives only for the duration of a single reset session; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIdentity {
    /// 48-bit UUID as reported by the module.
    pub uuid: u64,
    /// Type decoded from the top 16 bits.
    pub module_type: ModuleType,
    /// Low 12 bits, the module's short address.
    pub id: u16,
}

impl ModuleIdentity {
    /// Split a 48-bit UUID into its identity parts.
    pub fn from_uuid(uuid: u64) -> Self {
        let uuid = uuid & UUID_MASK;
        Self {
            uuid,
            module_type: ModuleType::from_type_code(((uuid >> 32) & 0xFFFF) as u16),
            id: (uuid & 0xFFF) as u16,
        }
    }

    /// Decode the little-endian UUID carried by an assign-id payload.
    pub fn from_payload(payload: &[u8]) -> Self {
        let uuid = codec::read_field(payload, 0, 8) as u64;
        Self::from_uuid(uuid)
    }
}
