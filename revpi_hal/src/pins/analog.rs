//! Analog pin on an AIO module.
//!
//! The range selector byte is read once at initialization and decoded into
//! limits; reads and writes use those limits until the pin is dropped.

use revpi_common::capability::{Analog, AnalogValue};
use revpi_common::error::{PiError, PiResult, RangeKind};
use revpi_common::picontrol::consts::ANALOG_STEP_SIZE;
use revpi_common::picontrol::types::{DeviceRecord, VarDescriptor, VarName};
use tracing::debug;

use crate::layout::{AioAddress, DeviceOffsets};
use crate::process_image::ProcessImage;

/// Limits of a configured analog range, in mV or uA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogRange {
    /// Lower limit.
    pub min: i32,
    /// Upper limit.
    pub max: i32,
    /// Current (uA) rather than voltage (mV).
    pub is_current: bool,
}

const fn range(min: i32, max: i32, is_current: bool) -> AnalogRange {
    AnalogRange {
        min,
        max,
        is_current,
    }
}

/// Decode an analog input range selector.
pub fn decode_input_range(code: u8) -> PiResult<AnalogRange> {
    Ok(match code {
        1 => range(-10_000, 10_000, false),
        2 => range(0, 10_000, false),
        3 => range(0, 5_000, false),
        4 => range(-5_000, 5_000, false),
        5 => range(0, 20_000, true),
        6 => range(0, 24_000, true),
        7 => range(4_000, 20_000, true),
        8 => range(-25_000, 25_000, true),
        _ => {
            return Err(PiError::InvalidRangeCode {
                kind: RangeKind::Input,
                code,
            });
        }
    })
}

/// Decode an analog output range selector for pin `pin`.
///
/// Code 0 means the output is switched off in the module configuration.
pub fn decode_output_range(code: u8, pin: &str) -> PiResult<AnalogRange> {
    Ok(match code {
        0 => {
            return Err(PiError::not_configured(
                pin,
                "not configured for analog write",
            ));
        }
        1 => range(0, 5_000, false),
        2 => range(0, 10_000, false),
        3 => range(-5_000, 5_000, false),
        4 => range(-10_000, 10_000, false),
        5 => range(0, 5_500, false),
        6 => range(0, 11_000, false),
        7 => range(-5_500, 5_500, false),
        8 => range(-11_000, 11_000, false),
        9 => range(4_000, 20_000, true),
        10 => range(0, 20_000, true),
        11 => range(0, 24_000, true),
        _ => {
            return Err(PiError::InvalidRangeCode {
                kind: RangeKind::Output,
                code,
            });
        }
    })
}

/// Analog input or output.
#[derive(Debug)]
pub struct AnalogPin<'a> {
    image: &'a ProcessImage,
    name: VarName,
    address: u16,
    length: u16,
    direction: AioAddress,
    range: AnalogRange,
}

impl<'a> AnalogPin<'a> {
    /// Bind `var` on `device` and read its range selector.
    pub fn initialize(
        image: &'a ProcessImage,
        var: &VarDescriptor,
        device: &DeviceRecord,
    ) -> PiResult<Self> {
        let offsets = DeviceOffsets::from(device);
        let direction = offsets.classify_aio(var.address);
        let range = match direction {
            AioAddress::Input => {
                let [code] =
                    image.read_array::<1>(offsets.analog_input_range_address(var.address))?;
                decode_input_range(code)?
            }
            AioAddress::Output => {
                let [code] =
                    image.read_array::<1>(offsets.analog_output_range_address(var.address))?;
                decode_output_range(code, &var.name)?
            }
            AioAddress::Unclassified => {
                return Err(PiError::not_configured(
                    &var.name,
                    "not an analog input or output",
                ));
            }
        };
        debug!(
            "Analog {} initialized: address {} {:?} range {:?}",
            var.name, var.address, direction, range
        );
        Ok(Self {
            image,
            name: var.name.clone(),
            address: var.address,
            length: var.length,
            direction,
            range,
        })
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable length in bits.
    pub fn length(&self) -> u16 {
        self.length
    }

    /// Input or output.
    pub fn direction(&self) -> AioAddress {
        self.direction
    }

    /// Range decoded at initialization.
    pub fn range(&self) -> AnalogRange {
        self.range
    }
}

impl Analog for AnalogPin<'_> {
    fn read(&self) -> PiResult<AnalogValue> {
        if self.direction != AioAddress::Input {
            return Err(PiError::not_configured(
                &self.name,
                "cannot read analog, not an analog input",
            ));
        }
        let raw = u16::from_le_bytes(self.image.read_array::<2>(self.address)?);
        Ok(AnalogValue {
            value: i32::from(raw),
            min: self.range.min as f32,
            max: self.range.max as f32,
            step_size: ANALOG_STEP_SIZE,
        })
    }

    fn write(&self, value: i32) -> PiResult<()> {
        if self.direction != AioAddress::Output {
            return Err(PiError::not_configured(
                &self.name,
                "cannot write analog, not an analog output",
            ));
        }
        if value < self.range.min || value > self.range.max {
            return Err(PiError::OutOfRange {
                value: f64::from(value),
                min: f64::from(self.range.min),
                max: f64::from(self.range.max),
            });
        }
        self.image.write_bytes(self.address, &value.to_le_bytes())
    }
}
