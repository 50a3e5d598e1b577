use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{AddressStore, PeripheralAddress, PrinterError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct StoredAddress {
    address: PeripheralAddress,
    saved_at: DateTime<Utc>,
}

/// Keeps the last connected address in a small JSON file so a cold start can
/// reconnect without going through the device picker again.
#[derive(Debug, Clone)]
pub struct FileAddressStore {
    path: PathBuf,
}

impl FileAddressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn storage_error(&self, action: &str, e: impl std::fmt::Display) -> PrinterError {
        PrinterError::Storage(format!("Failed to {} {:?}: {}", action, self.path, e))
    }
}

#[async_trait]
impl AddressStore for FileAddressStore {
    async fn load(&self) -> Result<Option<PeripheralAddress>, PrinterError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        let stored: StoredAddress =
            serde_json::from_slice(&bytes).map_err(|e| self.storage_error("parse", e))?;
        debug!(address = %stored.address, saved_at = %stored.saved_at, "Loaded last known printer");
        Ok(Some(stored.address))
    }

    async fn save(&self, address: &PeripheralAddress) -> Result<(), PrinterError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let stored = StoredAddress {
            address: address.clone(),
            saved_at: Utc::now(),
        };
        let json =
            serde_json::to_vec_pretty(&stored).map_err(|e| self.storage_error("encode", e))?;

        // Write then rename so a crash never leaves a truncated file behind
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.storage_error("replace", e))?;

        info!(address = %address, path = ?self.path, "Saved last known printer");
        Ok(())
    }

    async fn clear(&self) -> Result<(), PrinterError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = ?self.path, "Cleared last known printer");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}
