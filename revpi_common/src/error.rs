//! Error types for piControl operations.
//!
//! This module defines:
//! - `PiError` - Every failure surfaced by the driver
//! - `IoOp` - Which primitive failed, for error context
//! - `RangeKind` - Which analog range table rejected a code
//! - `DeviceAnomaly` / `DeviceAnomalies` - Non-fatal enumeration findings
//!
//! Nothing in the driver retries; errors carry the address and operation
//! that failed and are returned to the caller as-is.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::picontrol::types::ModuleType;

/// Result type alias for piControl operations.
pub type PiResult<T> = Result<T, PiError>;

/// Primitive operation against the process image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Raw byte read.
    Read,
    /// Raw byte write.
    Write,
    /// Atomic single-bit set.
    SetBit,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::SetBit => write!(f, "set-bit"),
        }
    }
}

/// Analog range table a selector byte was decoded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Analog input range (codes 1-8).
    Input,
    /// Analog output range (codes 1-11).
    Output,
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Errors that can occur when working with the piControl driver.
#[derive(Error, Debug)]
pub enum PiError {
    /// The control device could not be opened.
    #[error("Failed to open control device '{path}': {source}")]
    Open {
        /// Device path.
        path: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// The control device could not be released.
    #[error("Failed to close control device '{path}': {source}")]
    Close {
        /// Device path.
        path: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// The device-list command failed.
    #[error("Failed to retrieve device info list: {source}")]
    Enumeration {
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Variable lookup failed at the control channel.
    #[error("Failed to resolve address of variable '{name}': {source}")]
    AddressResolution {
        /// Requested variable name.
        name: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// No enumerated device of the requested class owns the address.
    #[error("Unable to find device for address {address}")]
    DeviceNotFound {
        /// Process-image address.
        address: u16,
    },

    /// Fewer bytes were transferred than requested.
    #[error("Short {op} at address {address}: expected {expected} byte(s), got {actual}")]
    ShortIo {
        /// Failed primitive.
        op: IoOp,
        /// Process-image address.
        address: u16,
        /// Requested byte count.
        expected: usize,
        /// Transferred byte count.
        actual: usize,
    },

    /// The OS rejected a primitive.
    #[error("I/O error during {op} at address {address}: {source}")]
    Io {
        /// Failed primitive.
        op: IoOp,
        /// Process-image address.
        address: u16,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Analog range selector outside the known table.
    #[error("Invalid {kind} range received, got {code}")]
    InvalidRangeCode {
        /// Table consulted.
        kind: RangeKind,
        /// Selector byte.
        code: u8,
    },

    /// Pin is not in the mode or direction the operation needs.
    #[error("Pin {pin}: {reason}")]
    NotConfigured {
        /// Variable name.
        pin: String,
        /// What is missing.
        reason: String,
    },

    /// Pin used before `initialize()`.
    #[error("Pin {pin} not initialized")]
    NotInitialized {
        /// Variable name.
        pin: String,
    },

    /// Value outside the pin's numeric domain.
    #[error("Value of {value} is not within expected range ({min} to {max})")]
    OutOfRange {
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Operation the hardware does not offer.
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// Malformed host command.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PiError {
    /// Shorthand for `NotConfigured`.
    pub fn not_configured(pin: &str, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            pin: pin.to_string(),
            reason: reason.into(),
        }
    }
}

// ─── Enumeration anomalies ──────────────────────────────────────────

/// A slot that enumerated without being usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAnomaly {
    /// Module configured but not answering.
    NotConnected {
        /// Enumeration slot.
        slot: usize,
    },
    /// Module present but absent from the active configuration.
    NotConfigured {
        /// Enumeration slot.
        slot: usize,
        /// Reported module type.
        module_type: ModuleType,
    },
}

impl DeviceAnomaly {
    /// Enumeration slot the anomaly refers to.
    pub fn slot(&self) -> usize {
        match self {
            Self::NotConnected { slot } | Self::NotConfigured { slot, .. } => *slot,
        }
    }
}

impl fmt::Display for DeviceAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { slot } => write!(f, "device {slot} is not connected"),
            Self::NotConfigured { slot, module_type } => {
                write!(f, "device {slot} is type {module_type} but is not configured")
            }
        }
    }
}

/// Every anomaly of one enumeration, combined into a single error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAnomalies(pub Vec<DeviceAnomaly>);

impl fmt::Display for DeviceAnomalies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, anomaly) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{anomaly}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeviceAnomalies {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pi_error_display() {
        let err = PiError::DeviceNotFound { address: 513 };
        assert!(err.to_string().contains("513"));

        let err = PiError::ShortIo {
            op: IoOp::Read,
            address: 7,
            expected: 4,
            actual: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("read"));
        assert!(msg.contains("expected 4"));

        let err = PiError::InvalidRangeCode {
            kind: RangeKind::Output,
            code: 12,
        };
        assert_eq!(err.to_string(), "Invalid output range received, got 12");
    }

    #[test]
    fn test_not_configured_shorthand() {
        let err = PiError::not_configured("O_3", "is configured as PWM");
        assert_eq!(err.to_string(), "Pin O_3: is configured as PWM");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: PiError = ConfigError::FileNotFound.into();
        assert!(matches!(err, PiError::Config(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_anomalies_join() {
        let report = DeviceAnomalies(vec![
            DeviceAnomaly::NotConnected { slot: 3 },
            DeviceAnomaly::NotConfigured {
                slot: 5,
                module_type: ModuleType(103),
            },
        ]);
        assert_eq!(
            report.to_string(),
            "device 3 is not connected; device 5 is type RevPi AIO but is not configured"
        );
        assert_eq!(report.0[1].slot(), 5);
    }
}
