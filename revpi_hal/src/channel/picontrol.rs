//! piControl kernel driver channel.
//!
//! Byte access uses positional `pread`/`pwrite` on the character device;
//! enumeration, lookup and bit-set go through `_IO('K', nr)` ioctls whose
//! argument is a pointer to the matching `#[repr(C)]` struct.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use parking_lot::RwLock;
use revpi_common::error::{PiError, PiResult};
use revpi_common::picontrol::consts::{
    KB_FIND_VARIABLE, KB_GET_DEVICE_INFO_LIST, KB_IOC_MAGIC, KB_SET_VALUE, MAX_DEVICES,
};
use revpi_common::picontrol::types::{DeviceInfo, SpiValue, SpiVariable};
use tracing::{debug, info, trace};

use super::ControlChannel;

mod ioctl {
    use super::*;

    nix::ioctl_read_bad!(
        get_device_info_list,
        nix::request_code_none!(KB_IOC_MAGIC, KB_GET_DEVICE_INFO_LIST),
        DeviceInfo
    );
    nix::ioctl_readwrite_bad!(
        find_variable,
        nix::request_code_none!(KB_IOC_MAGIC, KB_FIND_VARIABLE),
        SpiVariable
    );
    nix::ioctl_write_ptr_bad!(
        set_value,
        nix::request_code_none!(KB_IOC_MAGIC, KB_SET_VALUE),
        SpiValue
    );
}

/// Handle to the piControl character device.
///
/// The file sits behind a read-write lock so that `close` can release it
/// while other calls share it.
pub struct PiControl {
    path: String,
    file: RwLock<Option<File>>,
}

impl PiControl {
    /// Open the control device read-write.
    pub fn open(path: &Path) -> PiResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| PiError::Open {
                path: path.display().to_string(),
                source,
            })?;
        info!("Opened control device {}", path.display());
        Ok(Self {
            path: path.display().to_string(),
            file: RwLock::new(Some(file)),
        })
    }

    fn with_file<T>(&self, f: impl FnOnce(&File) -> io::Result<T>) -> io::Result<T> {
        let guard = self.file.read();
        match guard.as_ref() {
            Some(file) => f(file),
            None => Err(io::Error::from_raw_os_error(libc::EBADF)),
        }
    }
}

impl ControlChannel for PiControl {
    fn describe(&self) -> &str {
        &self.path
    }

    fn device_list(&self) -> io::Result<Vec<DeviceInfo>> {
        self.with_file(|file| {
            let mut list = vec![DeviceInfo::default(); MAX_DEVICES];
            // SAFETY: `list` holds MAX_DEVICES records, the most the driver writes.
            let count: libc::c_int =
                unsafe { ioctl::get_device_info_list(file.as_raw_fd(), list.as_mut_ptr()) }?;
            let count = usize::try_from(count)
                .map_err(|_| io::Error::from_raw_os_error(count.saturating_neg()))?;
            list.truncate(count.min(MAX_DEVICES));
            debug!("Device list returned {} record(s)", list.len());
            Ok(list)
        })
    }

    fn find_variable(&self, var: &mut SpiVariable) -> io::Result<()> {
        self.with_file(|file| {
            // SAFETY: `var` is a valid, exclusively borrowed SpiVariable.
            unsafe { ioctl::find_variable(file.as_raw_fd(), var as *mut SpiVariable) }?;
            Ok(())
        })
    }

    fn read_at(&self, address: u16, buf: &mut [u8]) -> io::Result<usize> {
        self.with_file(|file| file.read_at(buf, u64::from(address)))
    }

    fn write_at(&self, address: u16, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write_at(buf, u64::from(address)))
    }

    fn set_value(&self, value: &SpiValue) -> io::Result<()> {
        trace!("KB_SET_VALUE {:?}", value);
        self.with_file(|file| {
            // SAFETY: `value` points to a valid SpiValue for the duration of the call.
            unsafe { ioctl::set_value(file.as_raw_fd(), value as *const SpiValue) }?;
            Ok(())
        })
    }

    fn close(&self) -> io::Result<()> {
        if self.file.write().take().is_some() {
            info!("Closed control device {}", self.path);
        }
        Ok(())
    }
}
