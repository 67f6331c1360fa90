//! Prelude module for common re-exports.
//!
//! ```rust
//! use revpi_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ComponentConfig, ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{DeviceAnomalies, DeviceAnomaly, IoOp, PiError, PiResult, RangeKind};

// ─── Data model ─────────────────────────────────────────────────────
pub use crate::picontrol::types::{DeviceClass, DeviceRecord, ModuleType, VarDescriptor};

// ─── Capabilities ───────────────────────────────────────────────────
pub use crate::capability::{
    Analog, AnalogValue, Board, Component, DigitalInterrupt, Encoder, EncoderProperties, Gpio,
    PositionType,
};
