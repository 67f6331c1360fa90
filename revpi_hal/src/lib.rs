//! # RevPi HAL Library
//!
//! Driver for Revolution Pi I/O modules behind the piControl kernel driver.
//!
//! Pins are process-image variables looked up by name. Every operation
//! resolves to a bit or byte access at an address derived from the owning
//! module's input/output offsets; nothing is cached beyond the enumerated
//! device list and per-pin mode flags read at initialization.
//!
//! # Module Structure
//!
//! - [`channel`] - Control channel trait, kernel and simulated implementations
//! - [`process_image`] - Checked bit/byte primitives
//! - [`directory`] - Enumerated DIO/AIO modules and address ownership
//! - [`resolver`] - Variable name lookup
//! - [`layout`] - DIO/AIO address arithmetic
//! - [`pins`] - GPIO, analog and counter pins
//! - [`encoder`] - Encoder over a counter channel
//! - [`chip`] - Handle owner handing out pins
//! - [`board`] - Board component
//! - [`registry`] - Model name to factory map
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            revpi_hal                             │
//! │  ┌───────────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │ RevPiBoard /  │──►│    Chip      │──►│  DeviceDirectory    │  │
//! │  │ EncoderComp.  │   │              │   │  (DIO / AIO lists)  │  │
//! │  └───────────────┘   └──────┬───────┘   └─────────────────────┘  │
//! │                             │ &'a borrow                         │
//! │             ┌───────────────┼────────────────┐                   │
//! │             ▼               ▼                ▼                   │
//! │       ┌──────────┐   ┌────────────┐   ┌─────────────┐            │
//! │       │ GpioPin  │   │ AnalogPin  │   │ CounterPin  │            │
//! │       └────┬─────┘   └─────┬──────┘   └──────┬──────┘            │
//! │            └───────────────┼─────────────────┘                   │
//! │                            ▼                                     │
//! │                   ┌────────────────┐                             │
//! │                   │ ProcessImage   │ get/set bit, read/write     │
//! │                   └───────┬────────┘                             │
//! │                           ▼                                      │
//! │                   ┌────────────────┐                             │
//! │                   │ ControlChannel │ (trait object)              │
//! │                   └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod board;
pub mod channel;
pub mod chip;
pub mod directory;
pub mod encoder;
pub mod layout;
pub mod pins;
pub mod process_image;
pub mod registry;
pub mod resolver;

// Re-export key types for convenience
pub use crate::board::RevPiBoard;
pub use crate::channel::{ControlChannel, PiControl, SimulatedControl};
pub use crate::chip::{Chip, VariableValue};
pub use crate::directory::DeviceDirectory;
pub use crate::encoder::{CounterEncoder, EncoderComponent};
pub use crate::pins::{AnalogPin, CounterPin, CounterRequest, GpioPin};
pub use crate::registry::ComponentRegistry;
