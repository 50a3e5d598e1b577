use async_trait::async_trait;
use domain::{AddressStore, PeripheralAddress, PrinterError};
use tokio::sync::Mutex;

/// Process-lifetime address store
#[derive(Debug, Default)]
pub struct MemoryAddressStore {
    address: Mutex<Option<PeripheralAddress>>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(address: PeripheralAddress) -> Self {
        Self {
            address: Mutex::new(Some(address)),
        }
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn load(&self) -> Result<Option<PeripheralAddress>, PrinterError> {
        Ok(self.address.lock().await.clone())
    }

    async fn save(&self, address: &PeripheralAddress) -> Result<(), PrinterError> {
        *self.address.lock().await = Some(address.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PrinterError> {
        *self.address.lock().await = None;
        Ok(())
    }
}
