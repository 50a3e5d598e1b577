use domain::{DrawerKick, PrinterError};
use tracing::{info, warn};

use super::connection_manager::ConnectionManager;

/// Ensure-connected-then-write for every command.
///
/// The only retry is the reconnect inside `ensure_connected`; a failed write
/// is surfaced once so a truncated receipt or a drawer kick is never repeated.
pub struct CommandDispatcher {
    manager: ConnectionManager,
    default_kick: DrawerKick,
}

impl CommandDispatcher {
    pub fn new(manager: ConnectionManager, default_kick: DrawerKick) -> Self {
        Self {
            manager,
            default_kick,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager {
        &mut self.manager
    }

    /// Issue a pre-formatted buffer verbatim.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        if !self.manager.ensure_connected().await {
            warn!(bytes = bytes.len(), "⚠️ Printer not connected, rejecting write");
            return Err(PrinterError::NotConnected);
        }

        self.manager.write(bytes).await?;
        info!("✅ Print job sent ({} bytes)", bytes.len());
        Ok(())
    }

    /// Pulse the drawer solenoid. A live link is reused as-is; the whole
    /// command goes out in one write.
    pub async fn open_cash_drawer(&mut self, kick: Option<DrawerKick>) -> Result<(), PrinterError> {
        let kick = kick.unwrap_or(self.default_kick);

        if !self.manager.ensure_connected().await {
            warn!("⚠️ Printer not connected, cannot open cash drawer");
            return Err(PrinterError::NotConnected);
        }

        self.manager.write(&kick.encode()).await?;
        info!(pin = ?kick.pin, on_ms = kick.on_ms, off_ms = kick.off_ms, "💰 Cash drawer kicked");
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        self.manager.shutdown().await;
    }
}
