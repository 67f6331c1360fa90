//! RevPi Common Library
//!
//! This crate provides the shared vocabulary of the RevPi HAL: the piControl
//! wire structures and command codes, the process-image layout constants,
//! the device and variable data model, the error taxonomy, configuration
//! loading and the capability traits the host runtime drives.
//!
//! # Module Structure
//!
//! - [`picontrol`] - piControl command codes, layout constants and wire types
//! - [`error`] - `PiError` and the device anomaly report
//! - [`config`] - Configuration loading traits and types
//! - [`capability`] - Board / GPIO / analog / interrupt / encoder traits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use revpi_common::picontrol::consts::*;
//! use revpi_common::config::{ConfigLoader, ComponentConfig};
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod picontrol;
pub mod prelude;
