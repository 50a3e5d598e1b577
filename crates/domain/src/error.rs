use thiserror::Error;

/// Failure kinds surfaced by the printer link.
///
/// Platform errors are converted into one of these at the transport and
/// registry boundary; nothing above that layer sees a raw `io::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrinterError {
    #[error("Bluetooth unavailable: {0}")]
    Unavailable(String),

    #[error("Bluetooth permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid peripheral address: {0}")]
    InvalidAddress(String),

    #[error("Address storage error: {0}")]
    Storage(String),

    #[error("Printer service is not running")]
    ChannelClosed,
}

impl PrinterError {
    /// Map an I/O error raised while opening a link.
    pub fn from_connect_io(address: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                Self::DeviceNotFound(format!("{}: {}", address, err))
            }
            std::io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(format!("{}: {}", address, err))
            }
            _ => Self::ConnectFailed(format!("{}: {}", address, err)),
        }
    }

    /// Map an I/O error raised while reading the bonded-device set.
    pub fn from_registry_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrinterError>;
