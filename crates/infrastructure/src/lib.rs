//! Infrastructure layer - Bluetooth, serial and storage integrations

pub mod bluetooth;
pub mod config;
pub mod store;
pub mod transport;

pub use bluetooth::{BluezDeviceRegistry, DiscoveryControl, StaticDeviceRegistry};
pub use config::BridgeConfig;
pub use store::{FileAddressStore, MemoryAddressStore};
pub use transport::{MockTransport, MockTransportProbe, RfcommTransport};
