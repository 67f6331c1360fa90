//! Control channel implementations.
//!
//! A control channel is the handle through which every process-image access
//! flows. It offers exactly the piControl primitives:
//!
//! - enumerate modules (`device_list`)
//! - resolve a variable name (`find_variable`)
//! - positional byte read/write (`read_at` / `write_at`)
//! - atomic single-bit set (`set_value`)
//!
//! Implementations:
//!
//! - [`picontrol`] - The kernel driver behind `/dev/piControl0`
//! - [`simulated`] - In-memory process image for development and testing

pub mod picontrol;
pub mod simulated;

use std::io;
use std::sync::Arc;

use revpi_common::picontrol::types::{DeviceInfo, SpiValue, SpiVariable};

pub use picontrol::PiControl;
pub use simulated::SimulatedControl;

/// Raw piControl primitives.
///
/// Methods report what the OS reported: byte counts are returned as-is and
/// short transfers are left to the caller to judge.
pub trait ControlChannel: Send + Sync {
    /// Human-readable identifier for logs (device path, "simulated", ...).
    fn describe(&self) -> &str;

    /// Enumerate attached modules, at most `MAX_DEVICES` records.
    fn device_list(&self) -> io::Result<Vec<DeviceInfo>>;

    /// Fill address, bit and length of `var` from its name.
    fn find_variable(&self, var: &mut SpiVariable) -> io::Result<()>;

    /// Read up to `buf.len()` bytes starting at `address`.
    fn read_at(&self, address: u16, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes starting at `address`.
    fn write_at(&self, address: u16, buf: &[u8]) -> io::Result<usize>;

    /// Atomically set one bit (or one byte when `bit >= 8`).
    fn set_value(&self, value: &SpiValue) -> io::Result<()>;

    /// Release the handle. Later calls fail.
    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for Arc<C> {
    fn describe(&self) -> &str {
        (**self).describe()
    }

    fn device_list(&self) -> io::Result<Vec<DeviceInfo>> {
        (**self).device_list()
    }

    fn find_variable(&self, var: &mut SpiVariable) -> io::Result<()> {
        (**self).find_variable(var)
    }

    fn read_at(&self, address: u16, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(address, buf)
    }

    fn write_at(&self, address: u16, buf: &[u8]) -> io::Result<usize> {
        (**self).write_at(address, buf)
    }

    fn set_value(&self, value: &SpiValue) -> io::Result<()> {
        (**self).set_value(value)
    }

    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}
