use std::sync::Arc;

use application::{PrinterGateway, PrinterSettings};
use domain::{AddressStore, DeviceRegistry, PeripheralAddress, PeripheralDescriptor, SerialTransport};
use infrastructure::{
    BluezDeviceRegistry, BridgeConfig, FileAddressStore, MemoryAddressStore, MockTransport,
    MockTransportProbe, RfcommTransport, StaticDeviceRegistry,
};
use tokio::task::JoinHandle;
use tracing::info;

/// Adapters selected from configuration
pub struct Components {
    pub transport: Arc<dyn SerialTransport>,
    pub registry: Arc<dyn DeviceRegistry>,
    pub store: Arc<dyn AddressStore>,
    /// Present in dry-run mode only
    pub probe: Option<MockTransportProbe>,
}

pub struct Running {
    pub gateway: PrinterGateway,
    pub handle: JoinHandle<()>,
    pub probe: Option<MockTransportProbe>,
}

/// Real BlueZ registry and RFCOMM transport, or an in-memory stand-in that
/// accepts every configured address when `dry_run` is set.
pub fn build_components(config: &BridgeConfig, dry_run: bool) -> Components {
    let store: Arc<dyn AddressStore> = match &config.storage.address_file {
        Some(path) => {
            info!(path = ?path, "💾 Persisting last known printer");
            Arc::new(FileAddressStore::new(path))
        }
        None => Arc::new(MemoryAddressStore::new()),
    };

    if dry_run {
        let devices = dry_run_devices(config);
        let transport = MockTransport::new(devices.iter().map(|d| d.address.clone()));
        let probe = transport.probe();
        info!(devices = devices.len(), "🧪 Dry run: no Bluetooth I/O will happen");
        return Components {
            transport: Arc::new(transport),
            registry: Arc::new(StaticDeviceRegistry::new(devices)),
            store,
            probe: Some(probe),
        };
    }

    let registry: Arc<dyn DeviceRegistry> =
        Arc::new(BluezDeviceRegistry::new(config.bluetooth.dbus_timeout()));
    let transport =
        RfcommTransport::new(config.printer.clone(), &config.bluetooth, registry.clone());

    Components {
        transport: Arc::new(transport),
        registry,
        store,
        probe: None,
    }
}

fn dry_run_devices(config: &BridgeConfig) -> Vec<PeripheralDescriptor> {
    let mut addresses: Vec<PeripheralAddress> = config
        .printer
        .bindings
        .iter()
        .map(|b| b.address.clone())
        .collect();
    if let Some(default) = &config.printer.default_address {
        if !addresses.contains(default) {
            addresses.push(default.clone());
        }
    }

    addresses
        .into_iter()
        .map(|address| PeripheralDescriptor::new(format!("Dry-run printer {}", address), address))
        .collect()
}

pub async fn start(config: &BridgeConfig, dry_run: bool) -> Running {
    let components = build_components(config, dry_run);
    let settings = PrinterSettings::from_config(config);

    let (gateway, handle) = PrinterGateway::start(
        settings,
        components.transport,
        components.registry,
        components.store,
    )
    .await;

    Running {
        gateway,
        handle,
        probe: components.probe,
    }
}
