use async_trait::async_trait;

use crate::error::Result;
use crate::peripheral::PeripheralAddress;

/// One open serial channel to a printer and its writable byte stream.
///
/// Implementations must release the underlying socket when dropped so that
/// abnormal termination never leaks a live link.
#[async_trait]
pub trait SerialLink: Send + Sync {
    /// Address this link was opened against
    fn address(&self) -> &PeripheralAddress;

    /// Write the whole buffer then flush. A partial write is a `WriteFailed`.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Best-effort liveness from the platform. Optimistic: `true` only means
    /// "probably alive", the next write is the real test.
    fn is_alive(&self) -> bool;

    /// Close stream then socket. Idempotent, never fails.
    async fn close(&mut self);
}

/// Opens serial-port-profile links to bonded peripherals
#[async_trait]
pub trait SerialTransport: Send + Sync {
    /// Open exactly one channel to `address`.
    ///
    /// Errors: `DeviceNotFound`, `ConnectFailed`, `PermissionDenied`, `Unavailable`.
    async fn open(&self, address: &PeripheralAddress) -> Result<Box<dyn SerialLink>>;
}
