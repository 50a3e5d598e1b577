use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use domain::registry::find_bonded;
use domain::{DeviceRegistry, PeripheralAddress, PrinterError, SerialLink, SerialTransport};
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::tty_binding::TtyBindings;
use crate::bluetooth::DiscoveryControl;
use crate::config::{BluetoothConfig, PrinterConfig};

/// Serial Port Profile service class
pub const SPP_UUID: Uuid = Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5F9B_34FB);

/// Opens SPP links through the RFCOMM tty the kernel binds for a peripheral
/// (`rfcomm bind`), driven with tokio-serial.
pub struct RfcommTransport {
    config: PrinterConfig,
    registry: Arc<dyn DeviceRegistry>,
    discovery: DiscoveryControl,
    ttys: TtyBindings,
}

impl RfcommTransport {
    pub fn new(
        config: PrinterConfig,
        bluetooth: &BluetoothConfig,
        registry: Arc<dyn DeviceRegistry>,
    ) -> Self {
        let discovery = DiscoveryControl::new(config.cancel_discovery, bluetooth.dbus_timeout());
        let ttys = TtyBindings::new(&bluetooth.tty_class_dir, &bluetooth.dev_dir);
        Self {
            config,
            registry,
            discovery,
            ttys,
        }
    }
}

#[async_trait]
impl SerialTransport for RfcommTransport {
    async fn open(&self, address: &PeripheralAddress) -> Result<Box<dyn SerialLink>, PrinterError> {
        self.discovery.cancel().await;

        let device = find_bonded(self.registry.as_ref(), address).await?;
        let port_name = self
            .ttys
            .resolve(address, self.config.port_for(address))
            .await
            .inspect_err(|e| warn!(address = %address, error = %e, "No RFCOMM tty for printer"))?;

        info!(
            address = %address,
            name = %device.name,
            port = %port_name,
            service = %SPP_UUID,
            "Opening RFCOMM serial channel"
        );

        let stream = tokio_serial::new(&port_name, self.config.baud_rate)
            .open_native_async()
            .map_err(|e| {
                warn!(address = %address, port = %port_name, error = %e, "Failed to open RFCOMM channel");
                map_serial_error(address, e)
            })?;

        Ok(Box::new(RfcommLink::new(address.clone(), port_name, stream)))
    }
}

fn map_serial_error(address: &PeripheralAddress, e: tokio_serial::Error) -> PrinterError {
    match e.kind {
        tokio_serial::ErrorKind::NoDevice => {
            PrinterError::DeviceNotFound(format!("{}: {}", address, e.description))
        }
        tokio_serial::ErrorKind::Io(kind) => PrinterError::from_connect_io(
            address.as_str(),
            &std::io::Error::new(kind, e.description),
        ),
        _ => PrinterError::ConnectFailed(format!("{}: {}", address, e.description)),
    }
}

/// An open RFCOMM tty. Dropping it closes the descriptor.
pub struct RfcommLink {
    address: PeripheralAddress,
    port: String,
    stream: Option<SerialStream>,
    broken: bool,
}

impl RfcommLink {
    pub fn new(address: PeripheralAddress, port: String, stream: SerialStream) -> Self {
        Self {
            address,
            port,
            stream: Some(stream),
            broken: false,
        }
    }
}

#[async_trait]
impl SerialLink for RfcommLink {
    fn address(&self) -> &PeripheralAddress {
        &self.address
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        let stream = self.stream.as_mut().ok_or(PrinterError::NotConnected)?;

        if let Err(e) = stream.write_all(bytes).await {
            self.broken = true;
            return Err(PrinterError::WriteFailed(format!("Write error: {}", e)));
        }
        if let Err(e) = stream.flush().await {
            self.broken = true;
            return Err(PrinterError::WriteFailed(format!("Flush error: {}", e)));
        }

        debug!(address = %self.address, bytes = bytes.len(), "Wrote to RFCOMM channel");
        Ok(())
    }

    // The tty node outlives a silently dropped baseband link, so this stays optimistic
    fn is_alive(&self) -> bool {
        self.stream.is_some() && !self.broken && Path::new(&self.port).exists()
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(address = %self.address, error = %e, "Ignoring error while closing RFCOMM channel");
            }
            info!(address = %self.address, port = %self.port, "RFCOMM channel closed");
        }
    }
}

impl Drop for RfcommLink {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!(address = %self.address, "RFCOMM link dropped while open, releasing descriptor");
        }
    }
}
