mod bluez;
mod bluez_registry;
mod discovery;
mod static_registry;

pub use bluez_registry::BluezDeviceRegistry;
pub use discovery::DiscoveryControl;
pub use static_registry::StaticDeviceRegistry;
