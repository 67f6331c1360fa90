//! Counter channel on a DIO module.
//!
//! A counter can be named either by its 4-byte counter variable or by the
//! input-word bit of the same channel. Both resolve to one counter cell and
//! one input mode byte; a mode of 0 disables counting, 3 selects encoder
//! mode.

use revpi_common::capability::DigitalInterrupt;
use revpi_common::error::{PiError, PiResult};
use revpi_common::picontrol::consts::{INPUT_MODE_DISABLED, INPUT_MODE_ENCODER};
use revpi_common::picontrol::types::{DeviceRecord, VarDescriptor, VarName};
use tracing::debug;

use crate::layout::DeviceOffsets;
use crate::process_image::ProcessImage;

/// What the caller intends to use the counter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterRequest {
    /// Plain edge counter. Encoder-mode channels are accepted too.
    Interrupt,
    /// Quadrature encoder; the channel must be in encoder mode.
    Encoder,
}

/// Counter backed digital interrupt.
#[derive(Debug)]
pub struct CounterPin<'a> {
    image: &'a ProcessImage,
    name: VarName,
    address: u16,
    bit_position: u8,
    mode_index: u16,
    interrupt_address: u16,
    enabled: bool,
    is_encoder: bool,
}

impl<'a> CounterPin<'a> {
    /// Bind `var` on `device` and check the channel's input mode.
    pub fn initialize(
        image: &'a ProcessImage,
        var: &VarDescriptor,
        device: &DeviceRecord,
        request: CounterRequest,
    ) -> PiResult<Self> {
        let offsets = DeviceOffsets::from(device);
        let class = offsets.classify_dio(var.address);
        let cell = offsets
            .counter_cell(var.address, var.bit_position, class)
            .ok_or_else(|| {
                PiError::not_configured(&var.name, "not a counter or digital input address")
            })?;

        let [mode] = image.read_array::<1>(offsets.input_mode_address(cell.mode_index))?;
        if mode == INPUT_MODE_DISABLED {
            return Err(PiError::not_configured(
                &var.name,
                "counter input is disabled",
            ));
        }
        let is_encoder = mode == INPUT_MODE_ENCODER;
        if request == CounterRequest::Encoder && !is_encoder {
            return Err(PiError::not_configured(
                &var.name,
                format!("input mode {mode} is not encoder mode"),
            ));
        }

        debug!(
            "Counter {} initialized: mode index {} counter at {} mode {}",
            var.name, cell.mode_index, cell.counter_address, mode
        );
        Ok(Self {
            image,
            name: var.name.clone(),
            address: var.address,
            bit_position: var.bit_position,
            mode_index: cell.mode_index,
            interrupt_address: cell.counter_address,
            enabled: true,
            is_encoder,
        })
    }

    /// Address of the 4-byte counter value.
    pub fn interrupt_address(&self) -> u16 {
        self.interrupt_address
    }

    /// Index into the input mode table.
    pub fn mode_index(&self) -> u16 {
        self.mode_index
    }

    /// Whether the channel is in encoder mode.
    pub fn is_encoder(&self) -> bool {
        self.is_encoder
    }

    /// Variable address and bit the pin was built from.
    pub fn source(&self) -> (u16, u8) {
        (self.address, self.bit_position)
    }

    /// Raw counter value.
    pub fn raw(&self) -> PiResult<u32> {
        if !self.enabled {
            return Err(PiError::not_configured(
                &self.name,
                "counter input is disabled",
            ));
        }
        Ok(u32::from_le_bytes(
            self.image.read_array::<4>(self.interrupt_address)?,
        ))
    }
}

impl DigitalInterrupt for CounterPin<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> PiResult<i64> {
        Ok(i64::from(self.raw()?))
    }

    fn tick(&self, _high: bool, _nanoseconds: u64) -> PiResult<()> {
        Err(PiError::Unsupported(
            "counter channels cannot be ticked".to_string(),
        ))
    }
}
