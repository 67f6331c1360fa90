//! piControl wire structures and the safe data model built from them.
//!
//! The `#[repr(C)]` structs mirror the kernel's ioctl argument layouts and
//! are only touched at the control-channel boundary:
//! - `SpiVariable` - `KB_FIND_VARIABLE` argument
//! - `SpiValue` - `KB_SET_VALUE` / `KB_GET_VALUE` argument
//! - `DeviceInfo` - one `KB_GET_DEVICE_INFO_LIST` record
//!
//! Everything above the channel works with `DeviceRecord` and
//! `VarDescriptor`.

use std::ops::Range;

use bitflags::bitflags;
use serde::Serialize;
use static_assertions::const_assert_eq;

use crate::picontrol::consts::{
    MODULE_NOT_CONNECTED, MODULE_TYPE_AIO, MODULE_TYPE_DI, MODULE_TYPE_DIO, MODULE_TYPE_DO,
    VAR_NAME_MAX, VAR_NAME_WIDTH,
};

/// Variable name as carried on the wire, at most 31 bytes.
pub type VarName = heapless::String<VAR_NAME_MAX>;

// ─── Wire structures ────────────────────────────────────────────────

/// `KB_FIND_VARIABLE` argument: name in, address/bit/length out.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct SpiVariable {
    /// NUL-terminated variable name.
    pub var_name: [u8; VAR_NAME_WIDTH],
    /// Address of the byte in the process image.
    pub address: u16,
    /// 0-7 bit position, >= 8 whole byte.
    pub bit: u8,
    /// Length of the variable in bits (1, 8, 16 or 32).
    pub length: u16,
}

const_assert_eq!(core::mem::size_of::<SpiVariable>(), 38);

impl SpiVariable {
    /// Build a lookup request for `name`, truncated to the wire width.
    pub fn for_name(name: &str) -> Self {
        let name = truncate_name(name);
        let mut var_name = [0u8; VAR_NAME_WIDTH];
        var_name[..name.len()].copy_from_slice(name.as_bytes());
        Self {
            var_name,
            ..Self::default()
        }
    }

    /// Name stored in the request, up to the first NUL.
    pub fn name(&self) -> VarName {
        let end = self
            .var_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(VAR_NAME_MAX)
            .min(VAR_NAME_MAX);
        truncate_name(&String::from_utf8_lossy(&self.var_name[..end]))
    }
}

/// `KB_SET_VALUE` / `KB_GET_VALUE` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SpiValue {
    /// Address of the byte in the process image.
    pub address: u16,
    /// 0-7 bit position, >= 8 whole byte.
    pub bit: u8,
    /// 0/1 for bit access, whole byte otherwise.
    pub value: u8,
}

const_assert_eq!(core::mem::size_of::<SpiValue>(), 4);

/// One record of the `KB_GET_DEVICE_INFO_LIST` response.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct DeviceInfo {
    /// Address of the module in the current configuration.
    pub address: u8,
    /// Serial number of the module.
    pub serial_number: u32,
    /// Module type code, possibly carrying `MODULE_NOT_CONNECTED`.
    pub module_type: u16,
    /// Hardware revision.
    pub hw_revision: u16,
    /// Major software version.
    pub sw_major: u16,
    /// Minor software version.
    pub sw_minor: u16,
    /// SVN revision of the firmware.
    pub svn_revision: u32,
    /// Length in bytes of all input values together.
    pub input_length: u16,
    /// Length in bytes of all output values together.
    pub output_length: u16,
    /// Length in bytes of all config values together.
    pub config_length: u16,
    /// Offset of the module in the process image.
    pub base_offset: u16,
    /// Offset of the first input byte.
    pub input_offset: u16,
    /// Offset of the first output byte.
    pub output_offset: u16,
    /// Offset of the first config byte.
    pub config_offset: u16,
    /// Index of the first entry.
    pub first_entry: u16,
    /// Number of entries in the process image.
    pub entries: u16,
    /// Fieldbus state of a gateway module.
    pub module_state: u8,
    /// 0 means the module is not present and no data is available.
    pub active: u8,
    /// Reserved for future extensions.
    pub reserve: [u8; 30],
}

const_assert_eq!(core::mem::size_of::<DeviceInfo>(), 72);

// ─── Module types ───────────────────────────────────────────────────

bitflags! {
    /// Flag bits carried in the raw module-type word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModuleTypeFlags: u16 {
        /// Module is configured but not answering on the bus.
        const NOT_CONNECTED = MODULE_NOT_CONNECTED;
    }
}

/// Device class this driver knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// DIO, DI or DO digital module.
    Dio,
    /// AIO analog module.
    Aio,
    /// Anything else (core, gateways, ...).
    Other,
}

/// Module type code with the flag bits masked off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModuleType(pub u16);

impl ModuleType {
    /// Split a raw module-type word into its code.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw & !MODULE_NOT_CONNECTED)
    }

    /// Human-readable module name.
    pub fn name(self) -> &'static str {
        match self.0 {
            95 => "RevPi Core",
            96 => "RevPi DIO",
            97 => "RevPi DI",
            98 => "RevPi DO",
            103 => "RevPi AIO",
            136 => "RevPi Connect 4",
            0x6001 => "ModbusTCP Slave Adapter",
            0x6002 => "ModbusRTU Slave Adapter",
            0x6003 => "ModbusTCP Master Adapter",
            0x6004 => "ModbusRTU Master Adapter",
            100 => "Gateway DMX",
            71 => "Gateway CANopen",
            73 => "Gateway DeviceNet",
            74 => "Gateway EtherCAT",
            75 => "Gateway EtherNet/IP",
            93 => "Gateway ModbusTCP",
            76 => "Gateway Powerlink",
            77 => "Gateway Profibus",
            79 => "Gateway Profinet IRT",
            81 => "Gateway SercosIII",
            _ => "unknown moduletype",
        }
    }

    /// Classify the module for pin addressing.
    pub const fn class(self) -> DeviceClass {
        match self.0 {
            MODULE_TYPE_DIO | MODULE_TYPE_DI | MODULE_TYPE_DO => DeviceClass::Dio,
            MODULE_TYPE_AIO => DeviceClass::Aio,
            _ => DeviceClass::Other,
        }
    }
}

impl std::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Data model ─────────────────────────────────────────────────────

/// One enumerated module, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Slot index in the enumeration response.
    pub slot: usize,
    /// Address of the module in the current configuration.
    pub module_address: u8,
    /// Serial number.
    pub serial_number: u32,
    /// Module type code.
    pub module_type: ModuleType,
    /// Module type name.
    pub module_name: &'static str,
    /// Hardware revision.
    pub hw_revision: u16,
    /// Software version `(major, minor)`.
    pub sw_version: (u16, u16),
    /// SVN revision of the firmware.
    pub svn_revision: u32,
    /// Input bytes.
    pub input_length: u16,
    /// Output bytes.
    pub output_length: u16,
    /// Config bytes.
    pub config_length: u16,
    /// Offset of the module in the process image.
    pub base_offset: u16,
    /// Offset of the first input byte.
    pub input_offset: u16,
    /// Offset of the first output byte.
    pub output_offset: u16,
    /// Offset of the first config byte.
    pub config_offset: u16,
    /// Number of process-image entries.
    pub entries: u16,
    /// Module present and exchanging data.
    pub active: bool,
    /// `MODULE_NOT_CONNECTED` was set in the type word.
    pub not_connected: bool,
}

impl DeviceRecord {
    /// Build the record for enumeration slot `slot`.
    pub fn from_info(slot: usize, info: &DeviceInfo) -> Self {
        let module_type = ModuleType::from_raw(info.module_type);
        let flags = ModuleTypeFlags::from_bits_truncate(info.module_type);
        Self {
            slot,
            module_address: info.address,
            serial_number: info.serial_number,
            module_type,
            module_name: module_type.name(),
            hw_revision: info.hw_revision,
            sw_version: (info.sw_major, info.sw_minor),
            svn_revision: info.svn_revision,
            input_length: info.input_length,
            output_length: info.output_length,
            config_length: info.config_length,
            base_offset: info.base_offset,
            input_offset: info.input_offset,
            output_offset: info.output_offset,
            config_offset: info.config_offset,
            entries: info.entries,
            active: info.active != 0,
            not_connected: flags.contains(ModuleTypeFlags::NOT_CONNECTED),
        }
    }

    /// Device class of this module.
    pub fn class(&self) -> DeviceClass {
        self.module_type.class()
    }

    /// Process-image span owned by this module.
    ///
    /// Starts at `input_offset` and covers inputs, outputs and config.
    pub fn address_range(&self) -> Range<u32> {
        let start = u32::from(self.input_offset);
        let len = u32::from(self.output_length)
            + u32::from(self.input_length)
            + u32::from(self.config_length);
        start..start + len
    }

    /// Whether `address` falls inside this module's span.
    pub fn owns(&self, address: u16) -> bool {
        self.address_range().contains(&u32::from(address))
    }
}

/// Result of a variable lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDescriptor {
    /// Variable name (truncated to 31 bytes).
    pub name: VarName,
    /// Byte offset in the process image.
    pub address: u16,
    /// Bit position, meaningful only when `length == 1`.
    pub bit_position: u8,
    /// Length in bits (1, 8, 16 or 32).
    pub length: u16,
}

impl VarDescriptor {
    /// Build a descriptor directly (used by simulated channels and tests).
    pub fn new(name: &str, address: u16, bit_position: u8, length: u16) -> Self {
        Self {
            name: truncate_name(name),
            address,
            bit_position,
            length,
        }
    }

    /// Number of whole bytes covered by the variable.
    pub fn byte_len(&self) -> usize {
        usize::from(self.length / 8)
    }

    /// Whether the variable is a single bit.
    pub fn is_bit(&self) -> bool {
        self.length == 1
    }
}

impl From<&SpiVariable> for VarDescriptor {
    fn from(var: &SpiVariable) -> Self {
        Self {
            name: var.name(),
            address: var.address,
            bit_position: var.bit,
            length: var.length,
        }
    }
}

/// Truncate `name` to the wire width on a character boundary.
pub fn truncate_name(name: &str) -> VarName {
    let mut out = VarName::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dio_info(input_offset: u16, output_offset: u16) -> DeviceInfo {
        DeviceInfo {
            module_type: MODULE_TYPE_DIO,
            input_length: 70,
            output_length: 18,
            config_length: 109,
            input_offset,
            output_offset,
            active: 1,
            ..DeviceInfo::default()
        }
    }

    #[test]
    fn spi_variable_truncates_long_names() {
        let long = "A".repeat(40);
        let var = SpiVariable::for_name(&long);
        assert_eq!(var.var_name[VAR_NAME_MAX], 0);
        assert_eq!(var.name().len(), VAR_NAME_MAX);
    }

    #[test]
    fn spi_variable_name_roundtrip() {
        let var = SpiVariable::for_name("O_1");
        assert_eq!(var.name().as_str(), "O_1");
    }

    #[test]
    fn module_names() {
        assert_eq!(ModuleType(96).name(), "RevPi DIO");
        assert_eq!(ModuleType(103).name(), "RevPi AIO");
        assert_eq!(ModuleType(0x6003).name(), "ModbusTCP Master Adapter");
        assert_eq!(ModuleType(1).name(), "unknown moduletype");
    }

    #[test]
    fn module_type_masks_not_connected_flag() {
        let ty = ModuleType::from_raw(MODULE_NOT_CONNECTED | MODULE_TYPE_AIO);
        assert_eq!(ty, ModuleType(MODULE_TYPE_AIO));
        assert_eq!(ty.class(), DeviceClass::Aio);
    }

    #[test]
    fn module_classes() {
        for code in [MODULE_TYPE_DIO, MODULE_TYPE_DI, MODULE_TYPE_DO] {
            assert_eq!(ModuleType(code).class(), DeviceClass::Dio);
        }
        assert_eq!(ModuleType(95).class(), DeviceClass::Other);
    }

    #[test]
    fn record_flags_and_range() {
        let mut info = dio_info(11, 81);
        info.module_type |= MODULE_NOT_CONNECTED;
        let rec = DeviceRecord::from_info(2, &info);
        assert!(rec.not_connected);
        assert_eq!(rec.slot, 2);
        assert_eq!(rec.module_name, "RevPi DIO");
        assert_eq!(rec.address_range(), 11..11 + 70 + 18 + 109);
        assert!(rec.owns(11));
        assert!(!rec.owns(10));
        assert!(!rec.owns(11 + 197));
    }

    #[test]
    fn descriptor_from_wire() {
        let mut var = SpiVariable::for_name("Counter_1");
        var.address = 6;
        var.bit = 0;
        var.length = 32;
        let desc = VarDescriptor::from(&var);
        assert_eq!(desc.name.as_str(), "Counter_1");
        assert_eq!(desc.byte_len(), 4);
        assert!(!desc.is_bit());
    }
}
