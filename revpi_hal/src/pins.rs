//! Pin handles bound to a process-image variable.
//!
//! - [`gpio`] - Digital I/O and PWM on DIO modules
//! - [`analog`] - Analog I/O on AIO modules
//! - [`counter`] - Counter / digital-interrupt channels on DIO modules
//!
//! Pins borrow the [`ProcessImage`](crate::process_image::ProcessImage) of
//! the chip that created them and hold a copy of their owning device's
//! offsets, taken at construction.

pub mod analog;
pub mod counter;
pub mod gpio;

pub use analog::{AnalogPin, AnalogRange, decode_input_range, decode_output_range};
pub use counter::{CounterPin, CounterRequest};
pub use gpio::GpioPin;
