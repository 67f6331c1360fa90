//! piControl interface definitions.
//!
//! This module contains everything needed to talk to the piControl kernel
//! driver without owning a handle to it:
//! - [`consts`] - Command codes and process-image layout offsets
//! - [`types`] - `#[repr(C)]` wire structures and their safe counterparts

pub mod consts;
pub mod types;
