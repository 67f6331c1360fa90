//! Chip: one open control channel plus its device directory.
//!
//! The chip owns the handle. Pins it hands out borrow it, so the borrow
//! checker keeps every pin inside the lifetime of the handle and of the
//! directory snapshot it was built from; `refresh` needs `&mut self` and
//! therefore cannot run while any pin is alive.

use std::path::Path;

use revpi_common::error::{DeviceAnomalies, PiError, PiResult};
use revpi_common::picontrol::types::{DeviceClass, DeviceRecord, VarDescriptor};
use serde::Serialize;
use tracing::{info, warn};

use crate::channel::{ControlChannel, PiControl};
use crate::directory::DeviceDirectory;
use crate::encoder::CounterEncoder;
use crate::pins::{AnalogPin, CounterPin, CounterRequest, GpioPin};
use crate::process_image::ProcessImage;
use crate::resolver;

/// Fresh value of a process-image variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Single bit.
    Bit(bool),
    /// 8-bit value.
    Byte(u8),
    /// 16-bit little-endian value.
    Word(u16),
    /// 32-bit little-endian value.
    DWord(u32),
}

/// Open control channel with its enumerated modules.
#[derive(Debug)]
pub struct Chip {
    image: ProcessImage,
    directory: DeviceDirectory,
}

impl Chip {
    /// Open the kernel device at `path` and enumerate.
    pub fn open(path: &Path) -> PiResult<Self> {
        let channel = PiControl::open(path)?;
        Self::new(Box::new(channel))
    }

    /// Take ownership of `channel` and enumerate.
    ///
    /// Anomalies are logged and kept in the directory; only a failing
    /// device-list command is an error.
    pub fn new(channel: Box<dyn ControlChannel>) -> PiResult<Self> {
        let image = ProcessImage::new(channel);
        let directory = DeviceDirectory::enumerate(image.channel())?;
        if let Some(report) = directory.anomaly_report() {
            warn!("Device anomalies on {}: {}", image.channel().describe(), report);
        }
        Ok(Self { image, directory })
    }

    /// Re-enumerate modules and return the anomaly report.
    pub fn refresh(&mut self) -> PiResult<Option<DeviceAnomalies>> {
        let report = self.directory.refresh(self.image.channel())?;
        if let Some(report) = &report {
            warn!("Device anomalies on {}: {}", self.image.channel().describe(), report);
        }
        Ok(report)
    }

    /// Current directory snapshot.
    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    /// Checked primitives over the process image.
    pub fn image(&self) -> &ProcessImage {
        &self.image
    }

    /// Resolve `name` through the control channel.
    pub fn resolve(&self, name: &str) -> PiResult<VarDescriptor> {
        resolver::resolve(self.image.channel(), name)
    }

    fn locate(&self, name: &str, class: DeviceClass) -> PiResult<(VarDescriptor, &DeviceRecord)> {
        let var = self.resolve(name)?;
        let device = self.directory.find_owner(var.address, class)?;
        Ok((var, device))
    }

    /// Initialized GPIO pin for a DIO variable.
    pub fn gpio_pin(&self, name: &str) -> PiResult<GpioPin<'_>> {
        let (var, device) = self.locate(name, DeviceClass::Dio)?;
        let mut pin = GpioPin::new(&self.image, &var, device);
        pin.initialize()?;
        Ok(pin)
    }

    /// Analog pin for an AIO variable.
    pub fn analog_pin(&self, name: &str) -> PiResult<AnalogPin<'_>> {
        let (var, device) = self.locate(name, DeviceClass::Aio)?;
        AnalogPin::initialize(&self.image, &var, device)
    }

    /// Counter pin for a DIO counter or input-word variable.
    pub fn counter_pin(&self, name: &str, request: CounterRequest) -> PiResult<CounterPin<'_>> {
        let (var, device) = self.locate(name, DeviceClass::Dio)?;
        CounterPin::initialize(&self.image, &var, device, request)
    }

    /// Counter pin used as a plain digital interrupt.
    pub fn digital_interrupt(&self, name: &str) -> PiResult<CounterPin<'_>> {
        self.counter_pin(name, CounterRequest::Interrupt)
    }

    /// Encoder on a counter channel in encoder mode, zeroed at 0.
    pub fn encoder(&self, name: &str) -> PiResult<CounterEncoder<'_>> {
        CounterEncoder::new(self.counter_pin(name, CounterRequest::Encoder)?)
    }

    /// Resolve and read `name` fresh.
    pub fn read_variable(&self, name: &str) -> PiResult<VariableValue> {
        let var = self.resolve(name)?;
        if var.is_bit() {
            return Ok(VariableValue::Bit(
                self.image.get_bit(var.address, var.bit_position)?,
            ));
        }
        match var.byte_len() {
            1 => {
                let [b] = self.image.read_array::<1>(var.address)?;
                Ok(VariableValue::Byte(b))
            }
            2 => Ok(VariableValue::Word(u16::from_le_bytes(
                self.image.read_array::<2>(var.address)?,
            ))),
            4 => Ok(VariableValue::DWord(u32::from_le_bytes(
                self.image.read_array::<4>(var.address)?,
            ))),
            n => Err(PiError::Unsupported(format!(
                "cannot read {name}: {n} byte variables are not supported"
            ))),
        }
    }

    /// Release the control handle. Later operations fail.
    pub fn close(&self) -> PiResult<()> {
        let channel = self.image.channel();
        channel.close().map_err(|source| PiError::Close {
            path: channel.describe().to_string(),
            source,
        })?;
        info!("Chip on {} closed", channel.describe());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedControl;
    use crate::channel::simulated::{aio_module, dio_module};
    use std::sync::Arc;

    fn chip() -> (Arc<SimulatedControl>, Chip) {
        let sim = Arc::new(
            SimulatedControl::default()
                .with_device(dio_module(31, 0))
                .with_device(aio_module(32, 200))
                .with_variable("I_1", 0, 0, 1)
                .with_variable("Status", 2, 0, 8)
                .with_variable("InputValue_1", 200, 0, 16)
                .with_variable("Counter_1", 6, 0, 32)
                .with_variable("Odd", 300, 0, 24),
        );
        let chip = Chip::new(Box::new(Arc::clone(&sim))).unwrap();
        (sim, chip)
    }

    #[test]
    fn test_read_variable_widths() {
        let (sim, chip) = chip();
        sim.poke(0, &[1]);
        sim.poke(2, &[0x42]);
        sim.poke(200, &[0x34, 0x12]);
        sim.poke(6, &[0x78, 0x56, 0x34, 0x12]);

        assert_eq!(chip.read_variable("I_1").unwrap(), VariableValue::Bit(true));
        assert_eq!(chip.read_variable("Status").unwrap(), VariableValue::Byte(0x42));
        assert_eq!(
            chip.read_variable("InputValue_1").unwrap(),
            VariableValue::Word(0x1234)
        );
        assert_eq!(
            chip.read_variable("Counter_1").unwrap(),
            VariableValue::DWord(0x1234_5678)
        );
        assert!(matches!(
            chip.read_variable("Odd"),
            Err(PiError::Unsupported(_))
        ));
    }

    #[test]
    fn test_variable_value_json() {
        assert_eq!(
            serde_json::to_value(VariableValue::Bit(true)).unwrap(),
            serde_json::json!(true)
        );
        assert_eq!(
            serde_json::to_value(VariableValue::Word(513)).unwrap(),
            serde_json::json!(513)
        );
    }

    #[test]
    fn test_wrong_class_is_device_not_found() {
        let (_sim, chip) = chip();
        // InputValue_1 lives on the AIO module, not on a DIO module.
        assert!(matches!(
            chip.gpio_pin("InputValue_1"),
            Err(PiError::DeviceNotFound { address: 200 })
        ));
    }

    #[test]
    fn test_refresh_sees_new_devices() {
        let (sim, mut chip) = chip();
        assert_eq!(chip.directory().dio_devices().len(), 1);
        sim.add_device(dio_module(33, 400));
        assert!(chip.refresh().unwrap().is_none());
        assert_eq!(chip.directory().dio_devices().len(), 2);
    }

    #[test]
    fn test_close_releases_channel() {
        let (sim, chip) = chip();
        chip.close().unwrap();
        assert!(sim.is_closed());
        assert!(chip.read_variable("I_1").is_err());
    }
}
