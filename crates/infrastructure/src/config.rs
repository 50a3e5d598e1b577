use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use domain::{DrawerKick, DrawerPin, PeripheralAddress};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PortBinding {
    pub address: PeripheralAddress,
    /// Serial device the RFCOMM channel is bound to, e.g. `/dev/rfcomm0`
    pub port: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DrawerConfig {
    #[serde(default)]
    pub pin: DrawerPin,
    #[serde(default = "default_drawer_on_ms")]
    pub on_ms: u16,
    #[serde(default = "default_drawer_off_ms")]
    pub off_ms: u16,
}

fn default_drawer_on_ms() -> u16 {
    50
}
fn default_drawer_off_ms() -> u16 {
    240
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            pin: DrawerPin::default(),
            on_ms: default_drawer_on_ms(),
            off_ms: default_drawer_off_ms(),
        }
    }
}

impl DrawerConfig {
    pub fn kick(&self) -> DrawerKick {
        DrawerKick::new(self.pin, self.on_ms, self.off_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrinterConfig {
    /// Seeds the last known address when nothing is persisted
    #[serde(default)]
    pub default_address: Option<PeripheralAddress>,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_cancel_discovery")]
    pub cancel_discovery: bool,
    /// Explicit tty per printer. Unlisted printers are looked up among the
    /// bound RFCOMM ttys.
    #[serde(default)]
    pub bindings: Vec<PortBinding>,
    #[serde(default)]
    pub drawer: DrawerConfig,
}

fn default_settle_delay_ms() -> u64 {
    500
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_cancel_discovery() -> bool {
    true
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            default_address: None,
            settle_delay_ms: default_settle_delay_ms(),
            baud_rate: default_baud_rate(),
            cancel_discovery: default_cancel_discovery(),
            bindings: Vec::new(),
            drawer: DrawerConfig::default(),
        }
    }
}

impl PrinterConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Configured serial device for `address`, if any
    pub fn port_for(&self, address: &PeripheralAddress) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| &b.address == address)
            .map(|b| b.port.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BluetoothConfig {
    /// Timeout for BlueZ D-Bus calls
    #[serde(default = "default_dbus_timeout_ms")]
    pub dbus_timeout_ms: u64,
    /// Kernel tty class directory; `<tty_class_dir>/rfcommN/address` holds
    /// the peer a bound RFCOMM tty talks to
    #[serde(default = "default_tty_class_dir")]
    pub tty_class_dir: PathBuf,
    #[serde(default = "default_dev_dir")]
    pub dev_dir: PathBuf,
}

fn default_dbus_timeout_ms() -> u64 {
    5000
}
fn default_tty_class_dir() -> PathBuf {
    PathBuf::from("/sys/class/tty")
}
fn default_dev_dir() -> PathBuf {
    PathBuf::from("/dev")
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            dbus_timeout_ms: default_dbus_timeout_ms(),
            tty_class_dir: default_tty_class_dir(),
            dev_dir: default_dev_dir(),
        }
    }
}

impl BluetoothConfig {
    pub fn dbus_timeout(&self) -> Duration {
        Duration::from_millis(self.dbus_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct StorageConfig {
    /// JSON file holding the last connected address. None keeps it in memory.
    #[serde(default)]
    pub address_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub printer: PrinterConfig,
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_status_buffer")]
    pub status_buffer: usize,
}

fn default_status_buffer() -> usize {
    16
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            printer: PrinterConfig::default(),
            bluetooth: BluetoothConfig::default(),
            storage: StorageConfig::default(),
            status_buffer: default_status_buffer(),
        }
    }
}

impl BridgeConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Local defaults, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. PRINTER__PRINTER__SETTLE_DELAY_MS=800)
            .add_source(Environment::with_prefix("PRINTER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
