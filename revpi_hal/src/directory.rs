//! Device directory: enumerated modules split by class.
//!
//! Enumeration keeps active DIO/DI/DO modules and active AIO modules in two
//! ordered lists. Inactive slots do not abort enumeration; they are
//! collected as anomalies and reported together.

use revpi_common::error::{DeviceAnomalies, DeviceAnomaly, PiError, PiResult};
use revpi_common::picontrol::types::{DeviceClass, DeviceRecord};
use tracing::{debug, info};

use crate::channel::ControlChannel;

/// Ordered lists of addressable modules.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    dio: Vec<DeviceRecord>,
    aio: Vec<DeviceRecord>,
    anomalies: Vec<DeviceAnomaly>,
}

impl DeviceDirectory {
    /// Enumerate through `channel` into a fresh directory.
    pub fn enumerate(channel: &dyn ControlChannel) -> PiResult<Self> {
        let mut directory = Self::default();
        directory.refresh(channel)?;
        Ok(directory)
    }

    /// Re-enumerate, replacing both lists.
    ///
    /// Returns the anomalies of this pass combined into one error value, or
    /// `None` when every slot was usable. Only a failing device-list command
    /// is fatal; the lists are left untouched in that case.
    pub fn refresh(&mut self, channel: &dyn ControlChannel) -> PiResult<Option<DeviceAnomalies>> {
        let infos = channel
            .device_list()
            .map_err(|source| PiError::Enumeration { source })?;

        let mut dio = Vec::new();
        let mut aio = Vec::new();
        let mut anomalies = Vec::new();

        for (slot, info) in infos.iter().enumerate() {
            let record = DeviceRecord::from_info(slot, info);
            if !record.active {
                let anomaly = if record.not_connected {
                    DeviceAnomaly::NotConnected { slot }
                } else {
                    DeviceAnomaly::NotConfigured {
                        slot,
                        module_type: record.module_type,
                    }
                };
                debug!("Skipping slot {}: {}", slot, anomaly);
                anomalies.push(anomaly);
                continue;
            }
            match record.class() {
                DeviceClass::Dio => dio.push(record),
                DeviceClass::Aio => aio.push(record),
                DeviceClass::Other => {
                    debug!("Ignoring slot {} ({})", slot, record.module_name);
                }
            }
        }

        info!(
            "Enumerated {} slot(s) on {}: {} digital, {} analog, {} anomalies",
            infos.len(),
            channel.describe(),
            dio.len(),
            aio.len(),
            anomalies.len()
        );

        self.dio = dio;
        self.aio = aio;
        self.anomalies = anomalies;

        Ok(self.anomaly_report())
    }

    /// Active digital modules in enumeration order.
    pub fn dio_devices(&self) -> &[DeviceRecord] {
        &self.dio
    }

    /// Active analog modules in enumeration order.
    pub fn aio_devices(&self) -> &[DeviceRecord] {
        &self.aio
    }

    /// Modules of `class`. `Other` is never stored.
    pub fn devices(&self, class: DeviceClass) -> &[DeviceRecord] {
        match class {
            DeviceClass::Dio => &self.dio,
            DeviceClass::Aio => &self.aio,
            DeviceClass::Other => &[],
        }
    }

    /// Anomalies of the last enumeration.
    pub fn anomalies(&self) -> &[DeviceAnomaly] {
        &self.anomalies
    }

    /// Anomalies of the last enumeration as one error, if any.
    pub fn anomaly_report(&self) -> Option<DeviceAnomalies> {
        if self.anomalies.is_empty() {
            None
        } else {
            Some(DeviceAnomalies(self.anomalies.clone()))
        }
    }

    /// First module of `class` whose span contains `address`.
    pub fn find_owner(&self, address: u16, class: DeviceClass) -> PiResult<&DeviceRecord> {
        find_owner(address, self.devices(class))
    }
}

/// First device in `devices` whose span contains `address`.
pub fn find_owner(address: u16, devices: &[DeviceRecord]) -> PiResult<&DeviceRecord> {
    devices
        .iter()
        .find(|dev| dev.owns(address))
        .ok_or(PiError::DeviceNotFound { address })
}
