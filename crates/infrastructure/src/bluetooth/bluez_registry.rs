use std::time::Duration;

use async_trait::async_trait;
use domain::{DeviceRegistry, PeripheralAddress, PeripheralDescriptor, PrinterError};
use tracing::{debug, warn};

use super::bluez::{self, DEVICE_IFACE, ManagedObjects};

/// Bonded devices as reported by bluetoothd over the system bus
/// (`org.bluez.Device1` objects with `Paired = true`).
pub struct BluezDeviceRegistry {
    timeout: Duration,
}

impl BluezDeviceRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DeviceRegistry for BluezDeviceRegistry {
    async fn list_paired_devices(&self) -> Result<Vec<PeripheralDescriptor>, PrinterError> {
        let timeout = self.timeout;
        let objects = tokio::task::spawn_blocking(move || {
            let conn = bluez::system_bus()?;
            bluez::managed_objects(&conn, timeout)
        })
        .await
        .map_err(|e| PrinterError::Unavailable(format!("BlueZ query aborted: {}", e)))?
        .inspect_err(|e| warn!(error = %e, "BlueZ object query failed"))?;

        let devices = paired_devices(&objects)?;
        debug!(count = devices.len(), "Listed bonded devices");
        Ok(devices)
    }
}

fn paired_devices(objects: &ManagedObjects) -> Result<Vec<PeripheralDescriptor>, PrinterError> {
    if !bluez::has_adapter(objects) {
        return Err(PrinterError::Unavailable(
            "no Bluetooth adapter registered with BlueZ".to_string(),
        ));
    }

    let mut devices: Vec<PeripheralDescriptor> = Vec::new();
    for (path, props) in bluez::paths_with(objects, DEVICE_IFACE) {
        if bluez::bool_prop(props, "Paired") != Some(true) {
            continue;
        }
        let Some(address) =
            bluez::str_prop(props, "Address").and_then(|a| PeripheralAddress::parse(&a).ok())
        else {
            debug!(path = %path, "Skipping device without a usable address");
            continue;
        };

        // Same device bonded on two adapters is listed once
        if devices.iter().any(|d| d.address == address) {
            continue;
        }

        let name = bluez::str_prop(props, "Name")
            .or_else(|| bluez::str_prop(props, "Alias"))
            .unwrap_or_else(|| address.to_string());
        devices.push(PeripheralDescriptor::new(name, address));
    }

    Ok(devices)
}
