//! Bit and byte primitives over the process image.
//!
//! Every pin operation reduces to these four calls. Transfers are checked
//! for exact length; a short transfer is an error, never retried.
//! Single-bit writes always go through the atomic set-bit command so that
//! neighbouring bits written by other processes survive.

use std::fmt;

use revpi_common::error::{IoOp, PiError, PiResult};
use revpi_common::picontrol::types::SpiValue;
use tracing::{debug, trace};

use crate::channel::ControlChannel;

/// Checked access to the process image through a control channel.
pub struct ProcessImage {
    channel: Box<dyn ControlChannel>,
}

impl fmt::Debug for ProcessImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessImage")
            .field("channel", &self.channel.describe())
            .finish()
    }
}

impl ProcessImage {
    /// Wrap an open channel.
    pub fn new(channel: Box<dyn ControlChannel>) -> Self {
        Self { channel }
    }

    /// Underlying channel.
    pub fn channel(&self) -> &dyn ControlChannel {
        self.channel.as_ref()
    }

    /// Read bit `bit` of the byte at `address`.
    ///
    /// Bit positions of 8 and above read as low.
    pub fn get_bit(&self, address: u16, bit: u8) -> PiResult<bool> {
        let [byte] = self.read_array::<1>(address)?;
        let high = byte.checked_shr(u32::from(bit)).unwrap_or(0) & 1 == 1;
        trace!("get_bit {}.{} = {}", address, bit, high);
        Ok(high)
    }

    /// Atomically set bit `bit` of the byte at `address`.
    pub fn set_bit(&self, address: u16, bit: u8, high: bool) -> PiResult<()> {
        let cmd = SpiValue {
            address,
            bit,
            value: u8::from(high),
        };
        debug!("set_bit {}.{} = {}", address, bit, high);
        self.channel.set_value(&cmd).map_err(|source| PiError::Io {
            op: IoOp::SetBit,
            address,
            source,
        })
    }

    /// Read exactly `len` bytes at `address`.
    pub fn read_bytes(&self, address: u16, len: usize) -> PiResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }

    /// Read exactly `N` bytes at `address`.
    pub fn read_array<const N: usize>(&self, address: u16) -> PiResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }

    fn read_into(&self, address: u16, buf: &mut [u8]) -> PiResult<()> {
        let n = self
            .channel
            .read_at(address, buf)
            .map_err(|source| PiError::Io {
                op: IoOp::Read,
                address,
                source,
            })?;
        if n != buf.len() {
            return Err(PiError::ShortIo {
                op: IoOp::Read,
                address,
                expected: buf.len(),
                actual: n,
            });
        }
        trace!("read {:02X?} at {}", buf, address);
        Ok(())
    }

    /// Write all of `bytes` at `address`.
    pub fn write_bytes(&self, address: u16, bytes: &[u8]) -> PiResult<()> {
        debug!("write {:02X?} at {}", bytes, address);
        let n = self
            .channel
            .write_at(address, bytes)
            .map_err(|source| PiError::Io {
                op: IoOp::Write,
                address,
                source,
            })?;
        if n != bytes.len() {
            return Err(PiError::ShortIo {
                op: IoOp::Write,
                address,
                expected: bytes.len(),
                actual: n,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedControl;
    use std::sync::Arc;

    fn image(size: usize) -> (Arc<SimulatedControl>, ProcessImage) {
        let sim = Arc::new(SimulatedControl::new(size));
        let img = ProcessImage::new(Box::new(Arc::clone(&sim)));
        (sim, img)
    }

    #[test]
    fn test_get_bit() {
        let (sim, img) = image(16);
        sim.poke(4, &[0b0010_0000]);
        assert!(img.get_bit(4, 5).unwrap());
        assert!(!img.get_bit(4, 4).unwrap());
        assert!(!img.get_bit(4, 9).unwrap());
    }

    #[test]
    fn test_set_bit_uses_atomic_command() {
        let (sim, img) = image(16);
        sim.poke(3, &[0b1000_0001]);
        img.set_bit(3, 4, true).unwrap();
        assert_eq!(sim.peek(3, 1), vec![0b1001_0001]);
        assert_eq!(
            sim.bit_writes(),
            vec![SpiValue {
                address: 3,
                bit: 4,
                value: 1
            }]
        );
    }

    #[test]
    fn test_short_read_is_error() {
        let (_sim, img) = image(8);
        let err = img.read_bytes(6, 4).unwrap_err();
        assert!(matches!(
            err,
            PiError::ShortIo {
                op: IoOp::Read,
                address: 6,
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_short_write_is_error() {
        let (_sim, img) = image(8);
        let err = img.write_bytes(7, &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(
            err,
            PiError::ShortIo {
                op: IoOp::Write,
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_write_then_read() {
        let (_sim, img) = image(32);
        img.write_bytes(10, &[0xDE, 0xAD]).unwrap();
        assert_eq!(img.read_array::<2>(10).unwrap(), [0xDE, 0xAD]);
    }

    #[test]
    fn test_set_bit_out_of_image_is_io_error() {
        let (_sim, img) = image(4);
        let err = img.set_bit(9, 0, true).unwrap_err();
        assert!(matches!(
            err,
            PiError::Io {
                op: IoOp::SetBit,
                address: 9,
                ..
            }
        ));
    }
}
