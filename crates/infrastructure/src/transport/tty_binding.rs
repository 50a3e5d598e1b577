use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use domain::{PeripheralAddress, PrinterError};
use regex::Regex;
use tracing::debug;

static RFCOMM_TTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rfcomm[0-9]+$").expect("Invalid RFCOMM_TTY regex"));

/// Kernel view of bound RFCOMM ttys.
///
/// `rfcomm bind` exposes `<class_dir>/rfcommN/address` with the peer the tty
/// is tied to. A port is only handed out when that peer is the requested
/// printer.
#[derive(Debug, Clone)]
pub struct TtyBindings {
    class_dir: PathBuf,
    dev_dir: PathBuf,
}

impl TtyBindings {
    pub fn new(class_dir: impl Into<PathBuf>, dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            class_dir: class_dir.into(),
            dev_dir: dev_dir.into(),
        }
    }

    /// Peer address a tty is bound to, or None when it is not an RFCOMM tty
    pub async fn bound_address(&self, tty: &str) -> Option<PeripheralAddress> {
        let path = self.class_dir.join(tty).join("address");
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        PeripheralAddress::parse(raw.trim()).ok()
    }

    /// Device path for `address`. A configured port must be bound to that
    /// address; without one the bound ttys are searched.
    pub async fn resolve(
        &self,
        address: &PeripheralAddress,
        configured: Option<&str>,
    ) -> Result<String, PrinterError> {
        if let Some(port) = configured {
            return self.verify(address, port).await;
        }

        for tty in self.rfcomm_ttys().await {
            if self.bound_address(&tty).await.as_ref() == Some(address) {
                let port = self.dev_dir.join(&tty).display().to_string();
                debug!(address = %address, port = %port, "Found bound RFCOMM tty");
                return Ok(port);
            }
        }

        Err(PrinterError::DeviceNotFound(format!(
            "no RFCOMM tty is bound to {}",
            address
        )))
    }

    async fn verify(&self, address: &PeripheralAddress, port: &str) -> Result<String, PrinterError> {
        let tty = Path::new(port)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(port);

        match self.bound_address(tty).await {
            Some(bound) if &bound == address => Ok(port.to_string()),
            Some(bound) => Err(PrinterError::DeviceNotFound(format!(
                "{} is bound to {}, not {}",
                port, bound, address
            ))),
            None => Err(PrinterError::DeviceNotFound(format!(
                "{} is not a bound RFCOMM tty",
                port
            ))),
        }
    }

    async fn rfcomm_ttys(&self) -> Vec<String> {
        let mut ttys = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.class_dir).await else {
            return ttys;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(name) = entry.file_name().to_str() {
                if RFCOMM_TTY.is_match(name) {
                    ttys.push(name.to_string());
                }
            }
        }
        ttys.sort();
        ttys
    }
}
