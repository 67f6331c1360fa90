//! Variable name resolution.

use revpi_common::error::{PiError, PiResult};
use revpi_common::picontrol::types::{SpiVariable, VarDescriptor};
use tracing::debug;

use crate::channel::ControlChannel;

/// Look up `name` in the active configuration.
///
/// Names longer than 31 bytes are truncated before the lookup.
pub fn resolve(channel: &dyn ControlChannel, name: &str) -> PiResult<VarDescriptor> {
    let mut var = SpiVariable::for_name(name);
    channel
        .find_variable(&mut var)
        .map_err(|source| PiError::AddressResolution {
            name: name.to_string(),
            source,
        })?;
    let desc = VarDescriptor::from(&var);
    debug!(
        "Resolved {} -> address {} bit {} length {}",
        desc.name, desc.address, desc.bit_position, desc.length
    );
    Ok(desc)
}
