use async_trait::async_trait;

use crate::error::{PrinterError, Result};
use crate::peripheral::{PeripheralAddress, PeripheralDescriptor};

/// Read-only view of the platform's bonded (paired) device set
///
/// Pairing happens outside this process; implementations never talk to the
/// devices themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// All bonded peripherals. An empty list is not an error.
    ///
    /// Errors: `Unavailable` when the Bluetooth stack is missing,
    /// `PermissionDenied` when the caller lacks access.
    async fn list_paired_devices(&self) -> Result<Vec<PeripheralDescriptor>>;
}

/// Resolve `address` against the bonded set.
pub async fn find_bonded(
    registry: &dyn DeviceRegistry,
    address: &PeripheralAddress,
) -> Result<PeripheralDescriptor> {
    registry
        .list_paired_devices()
        .await?
        .into_iter()
        .find(|d| &d.address == address)
        .ok_or_else(|| PrinterError::DeviceNotFound(format!("{} is not paired", address)))
}
