use async_trait::async_trait;
use domain::{DeviceRegistry, PeripheralDescriptor, PrinterError};

/// Fixed bonded-device list, for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceRegistry {
    devices: Vec<PeripheralDescriptor>,
}

impl StaticDeviceRegistry {
    pub fn new(devices: Vec<PeripheralDescriptor>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl DeviceRegistry for StaticDeviceRegistry {
    async fn list_paired_devices(&self) -> Result<Vec<PeripheralDescriptor>, PrinterError> {
        Ok(self.devices.clone())
    }
}
