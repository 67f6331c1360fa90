//! Digital pin on a DIO/DI/DO module.
//!
//! A pin is created uninitialized and must be `initialize`d once before
//! use; initialization reads the PWM-active flag for output pins and fixes
//! the pin's mode for its lifetime.

use revpi_common::capability::Gpio;
use revpi_common::error::{PiError, PiResult};
use revpi_common::picontrol::consts::PWM_DUTY_MAX;
use revpi_common::picontrol::types::{DeviceRecord, VarDescriptor, VarName};
use tracing::{debug, warn};

use crate::layout::{DeviceOffsets, DioAddress, pwm_step_to_hz};
use crate::process_image::ProcessImage;

/// Digital I/O or PWM channel.
#[derive(Debug)]
pub struct GpioPin<'a> {
    image: &'a ProcessImage,
    name: VarName,
    address: u16,
    bit_position: u8,
    length: u16,
    offsets: DeviceOffsets,
    class: DioAddress,
    pwm_mode: bool,
    initialized: bool,
}

impl<'a> GpioPin<'a> {
    /// Bind `var` on `device`. The pin is unusable until `initialize`.
    pub fn new(image: &'a ProcessImage, var: &VarDescriptor, device: &DeviceRecord) -> Self {
        let offsets = DeviceOffsets::from(device);
        Self {
            image,
            name: var.name.clone(),
            address: var.address,
            bit_position: var.bit_position,
            length: var.length,
            offsets,
            class: offsets.classify_dio(var.address),
            pwm_mode: false,
            initialized: false,
        }
    }

    /// Read the PWM-active flag (output pins) and mark the pin usable.
    pub fn initialize(&mut self) -> PiResult<()> {
        if self.initialized {
            return Err(PiError::Unsupported(format!(
                "pin {} is already initialized",
                self.name
            )));
        }
        if self.class.is_output() {
            let (address, bit) = self
                .offsets
                .pwm_active_flag(self.address, self.bit_position, self.class);
            self.pwm_mode = self.image.get_bit(address, bit)?;
        }
        self.initialized = true;
        debug!(
            "GPIO {} initialized: address {} bit {} class {:?} pwm {}",
            self.name, self.address, self.bit_position, self.class, self.pwm_mode
        );
        Ok(())
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable length in bits.
    pub fn length(&self) -> u16 {
        self.length
    }

    /// Address role within the module.
    pub fn class(&self) -> DioAddress {
        self.class
    }

    /// Whether the PWM-active flag was set at initialization.
    pub fn is_pwm(&self) -> bool {
        self.pwm_mode
    }

    /// Whether `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> PiResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PiError::NotInitialized {
                pin: self.name.to_string(),
            })
        }
    }

    fn ensure_pwm(&self) -> PiResult<()> {
        if !self.class.is_output() {
            return Err(PiError::not_configured(&self.name, "not a PWM capable output"));
        }
        if !self.pwm_mode {
            return Err(PiError::not_configured(&self.name, "not configured for PWM"));
        }
        Ok(())
    }

    fn duty_address(&self) -> u16 {
        self.offsets
            .pwm_duty_address(self.address, self.bit_position, self.class)
    }
}

impl Gpio for GpioPin<'_> {
    fn set(&self, high: bool) -> PiResult<()> {
        self.ensure_initialized()?;
        if !self.class.is_output() {
            return Err(PiError::not_configured(
                &self.name,
                "cannot set pin state, not a digital output",
            ));
        }
        if self.pwm_mode {
            return Err(PiError::not_configured(
                &self.name,
                "cannot set pin state, configured as PWM",
            ));
        }
        let (address, bit) = self
            .offsets
            .gpio_bit(self.address, self.bit_position, self.class);
        self.image.set_bit(address, bit, high)
    }

    fn get(&self) -> PiResult<bool> {
        self.ensure_initialized()?;
        if self.pwm_mode {
            return Err(PiError::not_configured(
                &self.name,
                "cannot get pin state, configured as PWM",
            ));
        }
        let (address, bit) = self
            .offsets
            .gpio_bit(self.address, self.bit_position, self.class);
        self.image.get_bit(address, bit)
    }

    fn pwm(&self) -> PiResult<f64> {
        self.ensure_initialized()?;
        self.ensure_pwm()?;
        let address = self.duty_address();
        let [raw] = self.image.read_array::<1>(address)?;
        if raw > PWM_DUTY_MAX {
            warn!(
                "PWM duty cycle of {} at address {} exceeds {}",
                self.name, address, PWM_DUTY_MAX
            );
        }
        Ok(f64::from(raw) / 100.0)
    }

    fn set_pwm(&self, duty_cycle: f64) -> PiResult<()> {
        self.ensure_initialized()?;
        self.ensure_pwm()?;
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(PiError::OutOfRange {
                value: duty_cycle,
                min: 0.0,
                max: 1.0,
            });
        }
        let percent = (duty_cycle * 100.0) as u16;
        let [low, _] = percent.to_le_bytes();
        self.image.write_bytes(self.duty_address(), &[low])
    }

    fn pwm_freq(&self) -> PiResult<u32> {
        self.ensure_initialized()?;
        if !self.class.is_output() {
            return Err(PiError::not_configured(&self.name, "not a PWM capable output"));
        }
        let [step] = self
            .image
            .read_array::<1>(self.offsets.pwm_frequency_address())?;
        Ok(pwm_step_to_hz(step))
    }

    fn set_pwm_freq(&self, _freq_hz: u32) -> PiResult<()> {
        self.ensure_initialized()?;
        Err(PiError::Unsupported(
            "PWM frequency is part of the module configuration and cannot be set at runtime"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedControl;
    use crate::channel::simulated::dio_module;
    use std::sync::Arc;

    fn setup() -> (Arc<SimulatedControl>, ProcessImage, DeviceRecord) {
        let sim = Arc::new(SimulatedControl::new(256));
        let image = ProcessImage::new(Box::new(Arc::clone(&sim)));
        let device = DeviceRecord::from_info(0, &dio_module(31, 0));
        (sim, image, device)
    }

    #[test]
    fn test_uninitialized_pin_rejects_everything() {
        let (_sim, image, device) = setup();
        let pin = GpioPin::new(&image, &VarDescriptor::new("O_1", 70, 0, 1), &device);
        assert!(matches!(pin.set(true), Err(PiError::NotInitialized { .. })));
        assert!(matches!(pin.get(), Err(PiError::NotInitialized { .. })));
        assert!(matches!(pin.pwm(), Err(PiError::NotInitialized { .. })));
        assert!(matches!(pin.set_pwm(0.5), Err(PiError::NotInitialized { .. })));
        assert!(matches!(pin.pwm_freq(), Err(PiError::NotInitialized { .. })));
        assert!(matches!(pin.set_pwm_freq(40), Err(PiError::NotInitialized { .. })));
    }

    #[test]
    fn test_reinitialize_rejected() {
        let (_sim, image, device) = setup();
        let mut pin = GpioPin::new(&image, &VarDescriptor::new("O_1", 70, 0, 1), &device);
        pin.initialize().unwrap();
        assert!(pin.initialize().is_err());
    }

    #[test]
    fn test_input_pin_cannot_be_set() {
        let (sim, image, device) = setup();
        sim.poke(0, &[0b0000_0100]);
        let mut pin = GpioPin::new(&image, &VarDescriptor::new("I_3", 0, 2, 1), &device);
        pin.initialize().unwrap();
        assert!(pin.get().unwrap());
        assert!(matches!(pin.set(true), Err(PiError::NotConfigured { .. })));
        assert!(matches!(pin.pwm(), Err(PiError::NotConfigured { .. })));
        assert!(matches!(pin.pwm_freq(), Err(PiError::NotConfigured { .. })));
    }

    #[test]
    fn test_pwm_freq_and_set_freq() {
        let (sim, image, device) = setup();
        sim.poke(112, &[4]);
        let mut pin = GpioPin::new(&image, &VarDescriptor::new("O_1", 70, 0, 1), &device);
        pin.initialize().unwrap();
        assert_eq!(pin.pwm_freq().unwrap(), 160);
        assert!(matches!(pin.set_pwm_freq(160), Err(PiError::Unsupported(_))));
    }

    #[test]
    fn test_set_pwm_rejects_nan() {
        let (sim, image, device) = setup();
        sim.poke(110, &[0b0000_0001]);
        let mut pin = GpioPin::new(&image, &VarDescriptor::new("O_1", 70, 0, 1), &device);
        pin.initialize().unwrap();
        assert!(pin.is_pwm());
        assert!(matches!(pin.set_pwm(f64::NAN), Err(PiError::OutOfRange { .. })));
        assert!(matches!(pin.set_pwm(-0.01), Err(PiError::OutOfRange { .. })));
    }
}
