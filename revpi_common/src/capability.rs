//! Host capability traits.
//!
//! This module defines the surface the hosting runtime drives:
//! - `Gpio` - Digital pin state and PWM
//! - `Analog` - Analog input/output
//! - `DigitalInterrupt` - Counter value (no event streaming)
//! - `Encoder` - Relative position on top of a counter
//! - `Board` - Pin lookup by variable name
//! - `Component` - A named, versioned instance built by a factory
//!
//! The driver implements these traits; discovery, naming and lifecycle
//! belong to the runtime.

use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::Serialize;

use crate::error::PiResult;

/// One analog sample with the range it was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalogValue {
    /// Raw value in mV or uA.
    pub value: i32,
    /// Lower end of the configured range.
    pub min: f32,
    /// Upper end of the configured range.
    pub max: f32,
    /// Scale from raw units to V or mA.
    pub step_size: f32,
}

/// Unit of an encoder position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PositionType {
    /// Caller accepts whatever the encoder reports.
    #[default]
    Unspecified,
    /// Raw counter ticks.
    Ticks,
    /// Shaft angle.
    Degrees,
}

/// What an encoder can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncoderProperties {
    /// Position available in ticks.
    pub ticks_count_supported: bool,
    /// Position available in degrees.
    pub angle_degrees_supported: bool,
}

/// Edge event of a digital interrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Interrupt name.
    pub name: String,
    /// Level after the edge.
    pub high: bool,
    /// Event timestamp.
    pub timestamp_ns: u64,
}

/// Board power mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    /// Fully powered.
    Normal,
    /// Deep sleep.
    OfflineDeep,
}

/// Digital pin capability.
pub trait Gpio {
    /// Drive the pin high or low.
    fn set(&self, high: bool) -> PiResult<()>;

    /// Current pin level.
    fn get(&self) -> PiResult<bool>;

    /// Duty cycle in `[0, 1]`.
    fn pwm(&self) -> PiResult<f64>;

    /// Set the duty cycle, `duty_cycle` in `[0, 1]`.
    fn set_pwm(&self, duty_cycle: f64) -> PiResult<()>;

    /// PWM frequency in Hz.
    fn pwm_freq(&self) -> PiResult<u32>;

    /// Set the PWM frequency.
    fn set_pwm_freq(&self, freq_hz: u32) -> PiResult<()>;
}

/// Analog pin capability.
pub trait Analog {
    /// Sample the input.
    fn read(&self) -> PiResult<AnalogValue>;

    /// Drive the output to `value` (mV or uA).
    fn write(&self, value: i32) -> PiResult<()>;
}

/// Counter-backed digital interrupt.
///
/// The hardware only offers point-in-time counter reads, so the callback
/// methods are inert.
pub trait DigitalInterrupt {
    /// Variable name.
    fn name(&self) -> &str;

    /// Current count.
    fn value(&self) -> PiResult<i64>;

    /// Inject a tick.
    fn tick(&self, high: bool, nanoseconds: u64) -> PiResult<()>;

    /// Register a tick listener.
    fn add_callback(&self, _tx: &Sender<Tick>) {}

    /// Unregister a tick listener.
    fn remove_callback(&self, _tx: &Sender<Tick>) {}
}

/// Encoder capability.
pub trait Encoder {
    /// Position relative to the last reset, with the unit it is reported in.
    fn position(&self, position_type: PositionType) -> PiResult<(f64, PositionType)>;

    /// Make the current position the new zero.
    fn reset_position(&mut self) -> PiResult<()>;

    /// Supported position units.
    fn properties(&self) -> EncoderProperties;
}

/// Board capability: pins by variable name.
pub trait Board {
    /// GPIO pin for a variable.
    fn gpio_pin_by_name(&self, name: &str) -> PiResult<Box<dyn Gpio + '_>>;

    /// Analog pin for a variable.
    fn analog_by_name(&self, name: &str) -> PiResult<Box<dyn Analog + '_>>;

    /// Digital interrupt for a counter variable.
    fn digital_interrupt_by_name(&self, name: &str) -> PiResult<Box<dyn DigitalInterrupt + '_>>;

    /// Known analog names.
    fn analog_names(&self) -> Vec<String>;

    /// Known digital interrupt names.
    fn digital_interrupt_names(&self) -> Vec<String>;

    /// Known GPIO names.
    fn gpio_pin_names(&self) -> Vec<String>;

    /// Stream ticks of `interrupts` into `tx`.
    fn stream_ticks(&self, interrupts: &[&dyn DigitalInterrupt], tx: Sender<Tick>)
    -> PiResult<()>;

    /// Change the board power mode.
    fn set_power_mode(&self, mode: PowerMode, duration: Option<Duration>) -> PiResult<()>;
}

/// A component instance created by a registered factory.
pub trait Component: Send {
    /// Model name the component was registered under.
    fn model(&self) -> &'static str;

    /// Driver version.
    fn version(&self) -> &'static str;

    /// Handle a model-specific command.
    fn do_command(&mut self, request: &serde_json::Value) -> PiResult<serde_json::Value>;

    /// Release the control handle.
    fn close(&mut self) -> PiResult<()>;

    /// Board view, if the component is a board.
    fn as_board(&self) -> Option<&dyn Board> {
        None
    }

    /// Encoder view, if the component is an encoder.
    fn as_encoder_mut(&mut self) -> Option<&mut dyn Encoder> {
        None
    }
}
