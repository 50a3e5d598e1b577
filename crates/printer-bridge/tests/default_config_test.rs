use domain::{DrawerPin, PeripheralAddress};
use infrastructure::BridgeConfig;
use std::time::Duration;

#[test]
fn test_shipped_default_config_loads() {
    // Integration tests run from the package root
    let config = BridgeConfig::load("config").expect("config/default.toml should parse");

    assert_eq!(config.printer.settle_delay(), Duration::from_millis(500));
    assert_eq!(config.printer.drawer.pin, DrawerPin::Pin2);
    assert_eq!(
        config.printer.drawer.kick().encode(),
        [0x1B, 0x70, 0x00, 0x19, 0x78]
    );
    assert_eq!(config.bluetooth.dbus_timeout(), Duration::from_secs(5));
    assert!(config.storage.address_file.is_some());
}

#[test]
fn test_shipped_config_has_no_shared_port() {
    let config = BridgeConfig::load("config").expect("config/default.toml should parse");

    let a = PeripheralAddress::parse("66:22:B3:05:9F:01").unwrap();
    let b = PeripheralAddress::parse("AA:BB:CC:DD:EE:FF").unwrap();
    // Unlisted printers resolve through the kernel binding, never a shared tty
    assert_eq!(config.printer.port_for(&a), None);
    assert_eq!(config.printer.port_for(&b), None);
}
