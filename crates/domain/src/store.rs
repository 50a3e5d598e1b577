use async_trait::async_trait;

use crate::error::Result;
use crate::peripheral::PeripheralAddress;

/// Persistence for the last successfully connected address.
///
/// Holds an address only, never a live handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn load(&self) -> Result<Option<PeripheralAddress>>;

    async fn save(&self, address: &PeripheralAddress) -> Result<()>;

    /// Only called by an explicit forget
    async fn clear(&self) -> Result<()>;
}

/// Stored address wins over the configured fallback.
pub async fn resolve_last_known(
    store: &dyn AddressStore,
    configured: Option<PeripheralAddress>,
) -> Result<Option<PeripheralAddress>> {
    Ok(store.load().await?.or(configured))
}
