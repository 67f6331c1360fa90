//! In-memory control channel.
//!
//! `SimulatedControl` keeps a byte-addressed process image, a device list
//! and a variable table behind a single lock. Transfers that run past the
//! end of the image are cut short the way the kernel cuts them, which lets
//! tests exercise the short-I/O paths.

use std::collections::HashMap;
use std::io;

use parking_lot::Mutex;
use revpi_common::picontrol::consts::{MAX_DEVICES, MODULE_TYPE_AIO, MODULE_TYPE_DIO};
use revpi_common::picontrol::types::{DeviceInfo, SpiValue, SpiVariable, VarDescriptor};
use tracing::trace;

use super::ControlChannel;

/// Process image size of a RevPi base system.
pub const DEFAULT_IMAGE_SIZE: usize = 4096;

/// DIO input bytes: input word, status words, 16 counters.
const DIO_INPUT_LENGTH: u16 = 70;
/// DIO output bytes: output word, 16 PWM duty cycles.
const DIO_OUTPUT_LENGTH: u16 = 18;
/// DIO config bytes: input modes through PWM frequency.
const DIO_CONFIG_LENGTH: u16 = 25;

const AIO_INPUT_LENGTH: u16 = 20;
const AIO_OUTPUT_LENGTH: u16 = 4;
const AIO_CONFIG_LENGTH: u16 = 70;

#[derive(Debug, Default)]
struct SimState {
    image: Vec<u8>,
    devices: Vec<DeviceInfo>,
    variables: HashMap<String, VarDescriptor>,
    bit_writes: Vec<SpiValue>,
    fail_enumeration: bool,
    closed: bool,
}

/// Simulated piControl device.
#[derive(Debug)]
pub struct SimulatedControl {
    state: Mutex<SimState>,
}

impl Default for SimulatedControl {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIZE)
    }
}

impl SimulatedControl {
    /// Create an empty channel with an image of `image_size` zero bytes.
    pub fn new(image_size: usize) -> Self {
        Self {
            state: Mutex::new(SimState {
                image: vec![0; image_size],
                ..SimState::default()
            }),
        }
    }

    /// Append a device record (builder form).
    pub fn with_device(self, info: DeviceInfo) -> Self {
        self.add_device(info);
        self
    }

    /// Register a variable (builder form).
    pub fn with_variable(self, name: &str, address: u16, bit: u8, length: u16) -> Self {
        self.add_variable(name, address, bit, length);
        self
    }

    /// Append a device record.
    pub fn add_device(&self, info: DeviceInfo) {
        self.state.lock().devices.push(info);
    }

    /// Drop every device record.
    pub fn clear_devices(&self) {
        self.state.lock().devices.clear();
    }

    /// Register a variable.
    pub fn add_variable(&self, name: &str, address: u16, bit: u8, length: u16) {
        let desc = VarDescriptor::new(name, address, bit, length);
        self.state
            .lock()
            .variables
            .insert(desc.name.to_string(), desc);
    }

    /// Make the next enumerations fail.
    pub fn fail_enumeration(&self, fail: bool) {
        self.state.lock().fail_enumeration = fail;
    }

    /// Overwrite image bytes starting at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the bytes do not fit in the image.
    pub fn poke(&self, address: u16, bytes: &[u8]) {
        let mut state = self.state.lock();
        let start = usize::from(address);
        state.image[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Copy `len` image bytes starting at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not fit in the image.
    pub fn peek(&self, address: u16, len: usize) -> Vec<u8> {
        let state = self.state.lock();
        let start = usize::from(address);
        state.image[start..start + len].to_vec()
    }

    /// Every `KB_SET_VALUE` command received so far.
    pub fn bit_writes(&self) -> Vec<SpiValue> {
        self.state.lock().bit_writes.clone()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

fn closed_error() -> io::Error {
    io::Error::from_raw_os_error(libc::EBADF)
}

impl ControlChannel for SimulatedControl {
    fn describe(&self) -> &str {
        "simulated"
    }

    fn device_list(&self) -> io::Result<Vec<DeviceInfo>> {
        let state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        if state.fail_enumeration {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        Ok(state.devices.iter().take(MAX_DEVICES).copied().collect())
    }

    fn find_variable(&self, var: &mut SpiVariable) -> io::Result<()> {
        let state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        let name = var.name();
        let desc = state
            .variables
            .get(name.as_str())
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENXIO))?;
        var.address = desc.address;
        var.bit = desc.bit_position;
        var.length = desc.length;
        Ok(())
    }

    fn read_at(&self, address: u16, buf: &mut [u8]) -> io::Result<usize> {
        let state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        let start = usize::from(address).min(state.image.len());
        let n = buf.len().min(state.image.len() - start);
        buf[..n].copy_from_slice(&state.image[start..start + n]);
        trace!("sim read {} byte(s) at {}", n, address);
        Ok(n)
    }

    fn write_at(&self, address: u16, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        let start = usize::from(address).min(state.image.len());
        let n = buf.len().min(state.image.len() - start);
        state.image[start..start + n].copy_from_slice(&buf[..n]);
        trace!("sim write {} byte(s) at {}", n, address);
        Ok(n)
    }

    fn set_value(&self, value: &SpiValue) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        let idx = usize::from(value.address);
        let Some(byte) = state.image.get_mut(idx) else {
            return Err(io::Error::from_raw_os_error(libc::EFAULT));
        };
        if value.bit >= 8 {
            *byte = value.value;
        } else if value.value != 0 {
            *byte |= 1 << value.bit;
        } else {
            *byte &= !(1 << value.bit);
        }
        state.bit_writes.push(*value);
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Active DIO record at `input_offset` with the stock process-image layout.
pub fn dio_module(slot_address: u8, input_offset: u16) -> DeviceInfo {
    DeviceInfo {
        address: slot_address,
        module_type: MODULE_TYPE_DIO,
        input_length: DIO_INPUT_LENGTH,
        output_length: DIO_OUTPUT_LENGTH,
        config_length: DIO_CONFIG_LENGTH,
        base_offset: input_offset,
        input_offset,
        output_offset: input_offset + DIO_INPUT_LENGTH,
        config_offset: input_offset + DIO_INPUT_LENGTH + DIO_OUTPUT_LENGTH,
        active: 1,
        ..DeviceInfo::default()
    }
}

/// Active AIO record at `input_offset` with the stock process-image layout.
pub fn aio_module(slot_address: u8, input_offset: u16) -> DeviceInfo {
    DeviceInfo {
        address: slot_address,
        module_type: MODULE_TYPE_AIO,
        input_length: AIO_INPUT_LENGTH,
        output_length: AIO_OUTPUT_LENGTH,
        config_length: AIO_CONFIG_LENGTH,
        base_offset: input_offset,
        input_offset,
        output_offset: input_offset + AIO_INPUT_LENGTH,
        config_offset: input_offset + AIO_INPUT_LENGTH + AIO_OUTPUT_LENGTH,
        active: 1,
        ..DeviceInfo::default()
    }
}
