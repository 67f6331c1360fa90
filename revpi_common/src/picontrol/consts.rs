//! piControl command codes and process-image layout constants.
//!
//! All values here are fixed by the piControl driver and the RevPi module
//! firmware. They are plain `const` items; nothing in the workspace mutates
//! them at runtime.
//!
//! Offsets are relative to a module's `input_offset` or `output_offset`
//! as reported by the device list.

// ─── Control device ─────────────────────────────────────────────────

/// Default path of the piControl character device.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/piControl0";

/// Maximum number of device records returned by one enumeration.
pub const MAX_DEVICES: usize = 255;

/// Width of the variable-name field on the wire (including terminator).
pub const VAR_NAME_WIDTH: usize = 32;

/// Maximum number of name bytes carried in a lookup.
pub const VAR_NAME_MAX: usize = VAR_NAME_WIDTH - 1;

/// Flag in the module-type word set when a configured module is absent.
pub const MODULE_NOT_CONNECTED: u16 = 0x8000;

// ─── ioctl command numbers ──────────────────────────────────────────
//
// Requests are `_IO(KB_IOC_MAGIC, nr)`; the argument pointer is passed
// without size encoding.

/// ioctl type byte of every piControl request.
pub const KB_IOC_MAGIC: u8 = b'K';

/// Reset the driver and reload the configuration file.
pub const KB_RESET: u8 = 12;
/// Copy the device info of all detected devices.
pub const KB_GET_DEVICE_INFO_LIST: u8 = 13;
/// Copy the device info of one device.
pub const KB_GET_DEVICE_INFO: u8 = 14;
/// Read one bit or byte of the process image.
pub const KB_GET_VALUE: u8 = 15;
/// Atomically set one bit or byte of the process image.
pub const KB_SET_VALUE: u8 = 16;
/// Look up a variable defined in the piCtory configuration.
pub const KB_FIND_VARIABLE: u8 = 17;
/// Set a counter or encoder to zero.
pub const KB_DIO_RESET_COUNTER: u8 = 20;
/// Copy the last error message of the driver.
pub const KB_GET_LAST_MESSAGE: u8 = 21;
/// Stop or restart I/O communication.
pub const KB_STOP_IO: u8 = 22;
/// Block until the driver raises an event.
pub const KB_WAIT_FOR_EVENT: u8 = 50;

/// Full request number for a piControl command (`_IO('K', nr)`).
pub const fn request_code(nr: u8) -> u32 {
    ((KB_IOC_MAGIC as u32) << 8) | nr as u32
}

// ─── Module type codes ──────────────────────────────────────────────

/// RevPi DIO (14 inputs, 14 outputs).
pub const MODULE_TYPE_DIO: u16 = 96;
/// RevPi DI (16 inputs).
pub const MODULE_TYPE_DI: u16 = 97;
/// RevPi DO (16 outputs).
pub const MODULE_TYPE_DO: u16 = 98;
/// RevPi AIO (4 analog inputs, 2 analog outputs, 2 RTD).
pub const MODULE_TYPE_AIO: u16 = 103;

// ─── DIO / DI / DO layout ───────────────────────────────────────────

/// Distance from the output word to the first PWM duty-cycle byte.
pub const OUTPUT_WORD_TO_PWM_OFFSET: u16 = 2;
/// Distance from the input word to the first 32-bit counter cell.
pub const INPUT_WORD_TO_COUNTER_OFFSET: u16 = 6;
/// End of the PWM duty-cycle block, relative to `input_offset`.
pub const DIO_MEMORY_OFFSET: u16 = 88;
/// Per-input mode table, relative to `input_offset`.
pub const INPUT_MODE_OFFSET: u16 = 88;
/// `OutputPWMActive` word, relative to `input_offset`.
pub const OUTPUT_PWM_ACTIVE_OFFSET: u16 = 110;
/// `OutputPWMFrequency` step-size byte, relative to `input_offset`.
pub const OUTPUT_PWM_FREQUENCY_OFFSET: u16 = 112;
/// Width of one counter cell in bytes.
pub const COUNTER_CELL_BYTES: u16 = 4;

/// Input mode byte: input is a plain digital input.
pub const INPUT_MODE_DISABLED: u8 = 0;
/// Input mode byte: input pair is decoded as a quadrature encoder.
pub const INPUT_MODE_ENCODER: u8 = 3;

/// Highest duty cycle the DIO firmware accepts, in percent.
pub const PWM_DUTY_MAX: u8 = 100;

// ─── AIO layout ─────────────────────────────────────────────────────

/// Number of process-image bytes holding the analog input values.
pub const ANALOG_INPUT_SPAN: u16 = 8;
/// `InputRange_1`, relative to `input_offset`.
pub const ANALOG_INPUT_RANGE_OFFSET: u16 = 24;
/// Distance between consecutive analog input configuration blocks.
pub const ANALOG_INPUT_CONFIG_STRIDE: u16 = 7;
/// `OutputRange_1`, relative to `input_offset`.
pub const ANALOG_OUTPUT_1_RANGE_OFFSET: u16 = 69;
/// `OutputRange_2`, relative to `input_offset`.
pub const ANALOG_OUTPUT_2_RANGE_OFFSET: u16 = 79;
/// Offset of the second analog output value, relative to `output_offset`.
pub const ANALOG_OUTPUT_2_OFFSET: u16 = 2;
/// Step size reported with analog reads (mV -> V, uA -> mA).
pub const ANALOG_STEP_SIZE: f32 = 0.001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_codes_match_io_encoding() {
        assert_eq!(request_code(KB_GET_DEVICE_INFO_LIST), 0x4B0D);
        assert_eq!(request_code(KB_SET_VALUE), 0x4B10);
        assert_eq!(request_code(KB_FIND_VARIABLE), 0x4B11);
    }

    #[test]
    fn name_width_leaves_room_for_terminator() {
        assert_eq!(VAR_NAME_MAX + 1, VAR_NAME_WIDTH);
    }
}
