use std::sync::Arc;
use std::time::Duration;

use domain::{
    AddressStore, ConnectionEvent, ConnectionState, PeripheralAddress, PrinterError, SerialLink,
    SerialTransport,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Owns the only link to the printer and every transition of its state.
///
/// Not synchronized internally: exactly one task (the printer actor) owns it,
/// which is what keeps lifecycle transitions and writes totally ordered.
pub struct ConnectionManager {
    transport: Arc<dyn SerialTransport>,
    store: Arc<dyn AddressStore>,
    state: ConnectionState,
    link: Option<Box<dyn SerialLink>>,
    last_known: Option<PeripheralAddress>,
    settle_delay: Duration,
    status_tx: broadcast::Sender<bool>,
    event_tx: watch::Sender<ConnectionEvent>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn SerialTransport>,
        store: Arc<dyn AddressStore>,
        last_known: Option<PeripheralAddress>,
        settle_delay: Duration,
        status_tx: broadcast::Sender<bool>,
        event_tx: watch::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            transport,
            store,
            state: ConnectionState::Disconnected,
            link: None,
            last_known,
            settle_delay,
            status_tx,
            event_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn last_known(&self) -> Option<&PeripheralAddress> {
        self.last_known.as_ref()
    }

    /// Explicit connect. Any existing link is torn down first.
    pub async fn connect(&mut self, address: PeripheralAddress) -> Result<(), PrinterError> {
        self.drop_link("replaced by explicit connect").await;

        let next = self
            .state
            .to_connecting()
            .map_err(|e| PrinterError::ConnectFailed(e.to_string()))?;
        self.set_state(next, Some(address.clone()));

        info!(address = %address, "🔌 Connecting to printer...");
        match self.open_link(&address).await {
            Ok(link) => {
                self.install_link(link).await;
                Ok(())
            }
            Err(e) => {
                // Last known address stays whatever it was before this attempt
                warn!(address = %address, error = %e, "Connection failed");
                let previous = self.last_known.clone();
                self.set_state(self.state.to_disconnected(), previous);
                Err(e)
            }
        }
    }

    /// Implicit path used before every command.
    ///
    /// No-op while the link reports alive. Otherwise the stale link is closed
    /// and one reopen to the last known address is attempted. Returns false
    /// only when there is no address or that reopen fails.
    pub async fn ensure_connected(&mut self) -> bool {
        if self.state.is_connected() && self.link.as_ref().is_some_and(|l| l.is_alive()) {
            return true;
        }

        let Some(address) = self.last_known.clone() else {
            debug!("No printer configured, nothing to reconnect to");
            return false;
        };

        if let Some(mut stale) = self.link.take() {
            debug!(address = %stale.address(), "Closing stale link");
            stale.close().await;
        }

        let next = match self.state.to_reconnecting() {
            Ok(next) => next,
            Err(e) => {
                warn!(state = %self.state, "Refusing reconnect: {}", e);
                return false;
            }
        };
        self.set_state(next, Some(address.clone()));

        info!(address = %address, "🔄 Reconnecting to printer...");
        match self.open_link(&address).await {
            Ok(link) => {
                self.install_link(link).await;
                true
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Reconnect failed, will retry on next command");
                self.set_state(self.state.to_disconnected(), Some(address));
                false
            }
        }
    }

    /// Write through the current link. A failed write is proof the link is
    /// dead: it is closed and the state drops to Disconnected. Never retried.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        let link = self.link.as_mut().ok_or(PrinterError::NotConnected)?;

        match link.write(bytes).await {
            Ok(()) => {
                debug!(bytes = bytes.len(), "Write complete");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, bytes = bytes.len(), "Write failed, dropping link");
                self.drop_link("write failed").await;
                Err(match e {
                    PrinterError::WriteFailed(msg) => PrinterError::WriteFailed(msg),
                    other => PrinterError::WriteFailed(other.to_string()),
                })
            }
        }
    }

    /// Idempotent. Keeps the last known address.
    pub async fn disconnect(&mut self) {
        self.drop_link("disconnect requested").await;
    }

    /// Disconnect and clear the last known address, in memory and in the store.
    pub async fn forget(&mut self) {
        if let Some(address) = self.last_known.take() {
            info!(address = %address, "Forgetting printer");
        }
        self.drop_link("forget requested").await;

        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear persisted printer address");
        }
    }

    /// Close the link unconditionally.
    pub async fn shutdown(&mut self) {
        self.drop_link("shutting down").await;
    }

    async fn open_link(
        &self,
        address: &PeripheralAddress,
    ) -> Result<Box<dyn SerialLink>, PrinterError> {
        let link = self.transport.open(address).await?;

        // Some firmware drops the first write issued right after connect
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(link)
    }

    async fn install_link(&mut self, link: Box<dyn SerialLink>) {
        let address = link.address().clone();
        self.link = Some(link);

        let next = self
            .state
            .to_connected()
            .unwrap_or(ConnectionState::Connected);
        self.set_state(next, Some(address.clone()));
        self.last_known = Some(address.clone());
        info!(address = %address, "✅ Printer connected");

        if let Err(e) = self.store.save(&address).await {
            warn!(address = %address, error = %e, "Failed to persist printer address");
        }
    }

    async fn drop_link(&mut self, reason: &str) {
        if let Some(mut link) = self.link.take() {
            info!(address = %link.address(), reason, "Closing printer link");
            link.close().await;
        }
        let address = self.last_known.clone();
        self.set_state(self.state.to_disconnected(), address);
    }

    fn set_state(&mut self, next: ConnectionState, address: Option<PeripheralAddress>) {
        if next == self.state {
            return;
        }

        let was_connected = self.state.is_connected();
        debug!(from = %self.state, to = %next, "Connection state change");
        self.state = next;
        self.event_tx.send_replace(ConnectionEvent::new(next, address));

        if was_connected != next.is_connected() {
            // No subscribers is fine
            let _ = self.status_tx.send(next.is_connected());
        }
    }
}
