//! Encoder on top of a counter channel in encoder mode.
//!
//! Position is the raw 32-bit count minus a zero offset, both taken as
//! signed and subtracted with wrap-around so that a counter rolling over
//! keeps producing continuous relative positions.

use revpi_common::capability::{
    Component, DigitalInterrupt, Encoder, EncoderProperties, PositionType,
};
use revpi_common::config::{ComponentConfig, ConfigError, ENCODER_MODEL};
use revpi_common::error::{PiError, PiResult};
use tracing::{debug, info};

use crate::channel::ControlChannel;
use crate::chip::Chip;
use crate::pins::{CounterPin, CounterRequest};

const PROPERTIES: EncoderProperties = EncoderProperties {
    ticks_count_supported: true,
    angle_degrees_supported: false,
};

/// Position of `raw` relative to `zero_offset`, in ticks.
pub fn relative_position(raw: u32, zero_offset: i32) -> f64 {
    f64::from((raw as i32).wrapping_sub(zero_offset))
}

fn ticks_only(position_type: PositionType) -> PiResult<()> {
    match position_type {
        PositionType::Degrees => Err(PiError::Unsupported(
            "encoder does not support angular position".to_string(),
        )),
        PositionType::Unspecified | PositionType::Ticks => Ok(()),
    }
}

/// Encoder view of a counter pin.
#[derive(Debug)]
pub struct CounterEncoder<'a> {
    counter: CounterPin<'a>,
    zero_offset: i32,
}

impl<'a> CounterEncoder<'a> {
    /// Wrap `counter`, zeroed at raw count 0.
    pub fn new(counter: CounterPin<'a>) -> PiResult<Self> {
        Self::with_zero(counter, 0)
    }

    /// Wrap `counter` with an existing zero offset.
    pub fn with_zero(counter: CounterPin<'a>, zero_offset: i32) -> PiResult<Self> {
        if !counter.is_encoder() {
            return Err(PiError::not_configured(
                counter.name(),
                "counter is not in encoder mode",
            ));
        }
        Ok(Self {
            counter,
            zero_offset,
        })
    }

    /// Raw count reinterpreted as signed.
    pub fn raw_position(&self) -> PiResult<i32> {
        Ok(self.counter.raw()? as i32)
    }

    /// Current zero offset.
    pub fn zero_offset(&self) -> i32 {
        self.zero_offset
    }

    /// Underlying counter pin.
    pub fn counter(&self) -> &CounterPin<'a> {
        &self.counter
    }
}

impl Encoder for CounterEncoder<'_> {
    fn position(&self, position_type: PositionType) -> PiResult<(f64, PositionType)> {
        ticks_only(position_type)?;
        let raw = self.counter.raw()?;
        Ok((relative_position(raw, self.zero_offset), PositionType::Ticks))
    }

    fn reset_position(&mut self) -> PiResult<()> {
        self.zero_offset = self.raw_position()?;
        debug!(
            "Encoder {} zeroed at {}",
            self.counter.name(),
            self.zero_offset
        );
        Ok(())
    }

    fn properties(&self) -> EncoderProperties {
        PROPERTIES
    }
}

/// Standalone encoder component owning its own chip.
///
/// The counter pin is re-resolved on every call; only the zero offset is
/// kept between calls.
#[derive(Debug)]
pub struct EncoderComponent {
    chip: Chip,
    pin: String,
    zero_offset: i32,
}

impl EncoderComponent {
    /// Enumerate through `channel` and bind the configured encoder pin.
    pub fn new(config: &ComponentConfig, channel: Box<dyn ControlChannel>) -> PiResult<Self> {
        let pin = config
            .encoder
            .as_ref()
            .map(|enc| enc.pin.clone())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!("model {ENCODER_MODEL} requires [encoder] pin"))
            })?;
        let chip = Chip::new(channel)?;
        chip.encoder(&pin)?;
        info!(
            "Encoder component '{}' bound to {}",
            config.shared.service_name, pin
        );
        Ok(Self {
            chip,
            pin,
            zero_offset: 0,
        })
    }

    fn bind(&self) -> PiResult<CounterEncoder<'_>> {
        let counter = self.chip.counter_pin(&self.pin, CounterRequest::Encoder)?;
        CounterEncoder::with_zero(counter, self.zero_offset)
    }

    /// Configured pin name.
    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Owned chip.
    pub fn chip(&self) -> &Chip {
        &self.chip
    }
}

impl Encoder for EncoderComponent {
    fn position(&self, position_type: PositionType) -> PiResult<(f64, PositionType)> {
        self.bind()?.position(position_type)
    }

    fn reset_position(&mut self) -> PiResult<()> {
        let raw = self.bind()?.raw_position()?;
        self.zero_offset = raw;
        debug!("Encoder {} zeroed at {}", self.pin, raw);
        Ok(())
    }

    fn properties(&self) -> EncoderProperties {
        PROPERTIES
    }
}

impl Component for EncoderComponent {
    fn model(&self) -> &'static str {
        ENCODER_MODEL
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn do_command(&mut self, request: &serde_json::Value) -> PiResult<serde_json::Value> {
        Err(PiError::InvalidCommand(format!(
            "no valid commands found, got {request}"
        )))
    }

    fn close(&mut self) -> PiResult<()> {
        self.chip.close()
    }

    fn as_encoder_mut(&mut self) -> Option<&mut dyn Encoder> {
        Some(self)
    }
}
