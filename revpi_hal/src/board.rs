//! RevPi board component.
//!
//! Exposes the chip's pins through the `Board` capability and the generic
//! `readAddress` command through `do_command`.

use std::sync::mpsc::Sender;
use std::time::Duration;

use revpi_common::capability::{
    Analog, Board, Component, DigitalInterrupt, Gpio, PowerMode, Tick,
};
use revpi_common::config::{BOARD_MODEL, ComponentConfig};
use revpi_common::error::{DeviceAnomalies, PiError, PiResult};
use serde_json::{Map, Value};
use tracing::info;

use crate::channel::ControlChannel;
use crate::chip::Chip;

const READ_ADDRESS: &str = "readAddress";

/// Board component over one chip.
#[derive(Debug)]
pub struct RevPiBoard {
    name: String,
    chip: Chip,
}

impl RevPiBoard {
    /// Enumerate through `channel`. Anomalies are logged, not fatal.
    pub fn new(config: &ComponentConfig, channel: Box<dyn ControlChannel>) -> PiResult<Self> {
        let chip = Chip::new(channel)?;
        info!(
            "Board '{}' ready: {} digital, {} analog module(s)",
            config.shared.service_name,
            chip.directory().dio_devices().len(),
            chip.directory().aio_devices().len()
        );
        Ok(Self {
            name: config.shared.service_name.clone(),
            chip,
        })
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying chip.
    pub fn chip(&self) -> &Chip {
        &self.chip
    }

    /// Re-enumerate and report anomalies.
    pub fn status(&mut self) -> PiResult<Option<DeviceAnomalies>> {
        self.chip.refresh()
    }

    fn read_address(&self, arg: &Value) -> PiResult<Value> {
        let name = arg.as_str().ok_or_else(|| {
            PiError::InvalidCommand(format!(
                "error performing {READ_ADDRESS}: expected string, got {arg}"
            ))
        })?;
        let value = self.chip.read_variable(name)?;
        let mut out = Map::new();
        out.insert(
            name.to_string(),
            serde_json::to_value(value)
                .map_err(|e| PiError::InvalidCommand(e.to_string()))?,
        );
        Ok(Value::Object(out))
    }
}

impl Board for RevPiBoard {
    fn gpio_pin_by_name(&self, name: &str) -> PiResult<Box<dyn Gpio + '_>> {
        Ok(Box::new(self.chip.gpio_pin(name)?))
    }

    fn analog_by_name(&self, name: &str) -> PiResult<Box<dyn Analog + '_>> {
        Ok(Box::new(self.chip.analog_pin(name)?))
    }

    fn digital_interrupt_by_name(&self, name: &str) -> PiResult<Box<dyn DigitalInterrupt + '_>> {
        Ok(Box::new(self.chip.digital_interrupt(name)?))
    }

    fn analog_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn digital_interrupt_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn gpio_pin_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn stream_ticks(
        &self,
        _interrupts: &[&dyn DigitalInterrupt],
        _tx: Sender<Tick>,
    ) -> PiResult<()> {
        Err(PiError::Unsupported("tick streaming".to_string()))
    }

    fn set_power_mode(&self, _mode: PowerMode, _duration: Option<Duration>) -> PiResult<()> {
        Err(PiError::Unsupported("power modes".to_string()))
    }
}

impl Component for RevPiBoard {
    fn model(&self) -> &'static str {
        BOARD_MODEL
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn do_command(&mut self, request: &Value) -> PiResult<Value> {
        match request.get(READ_ADDRESS) {
            Some(arg) => self.read_address(arg),
            None => Err(PiError::InvalidCommand(format!(
                "no valid commands found, got {request}"
            ))),
        }
    }

    fn close(&mut self) -> PiResult<()> {
        self.chip.close()
    }

    fn as_board(&self) -> Option<&dyn Board> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedControl;
    use crate::channel::simulated::dio_module;
    use serde_json::json;
    use std::sync::Arc;

    fn board() -> (Arc<SimulatedControl>, RevPiBoard) {
        let sim = Arc::new(
            SimulatedControl::default()
                .with_device(dio_module(31, 0))
                .with_variable("O_1", 70, 0, 1)
                .with_variable("Counter_1", 6, 0, 32),
        );
        let board = RevPiBoard::new(&ComponentConfig::default(), Box::new(Arc::clone(&sim))).unwrap();
        (sim, board)
    }

    #[test]
    fn test_read_address_command() {
        let (sim, mut board) = board();
        sim.poke(6, &9u32.to_le_bytes());
        let reply = board.do_command(&json!({"readAddress": "Counter_1"})).unwrap();
        assert_eq!(reply, json!({"Counter_1": 9}));
    }

    #[test]
    fn test_read_address_rejects_non_string() {
        let (_sim, mut board) = board();
        assert!(matches!(
            board.do_command(&json!({"readAddress": 5})),
            Err(PiError::InvalidCommand(_))
        ));
        assert!(matches!(
            board.do_command(&json!({"blink": "O_1"})),
            Err(PiError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_board_surface() {
        let (_sim, board) = board();
        assert_eq!(board.model(), BOARD_MODEL);
        assert!(board.gpio_pin_names().is_empty());
        let gpio = board.gpio_pin_by_name("O_1").unwrap();
        gpio.set(true).unwrap();
        assert!(gpio.get().unwrap());
        assert!(matches!(
            board.set_power_mode(PowerMode::OfflineDeep, None),
            Err(PiError::Unsupported(_))
        ));
    }

    #[test]
    fn test_status_reports_anomalies() {
        let (sim, mut board) = board();
        let mut gone = dio_module(32, 200);
        gone.active = 0;
        sim.add_device(gone);
        let report = board.status().unwrap().unwrap();
        assert_eq!(report.0.len(), 1);
        assert_eq!(report.0[0].slot(), 1);
    }
}
