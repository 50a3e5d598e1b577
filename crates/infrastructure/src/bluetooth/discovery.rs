use std::time::Duration;

use dbus::blocking::Connection;
use domain::PrinterError;
use tracing::{debug, warn};

use super::bluez::{self, ADAPTER_IFACE, BLUEZ_SERVICE, ManagedObjects};

/// Stops an in-progress inquiry before a connect attempt; the two contend
/// for radio time on the same adapter.
///
/// BlueZ only lets the client that started a discovery session stop it, so
/// sessions held by other processes are logged and left running.
#[derive(Debug, Clone)]
pub struct DiscoveryControl {
    enabled: bool,
    timeout: Duration,
}

impl DiscoveryControl {
    pub fn new(enabled: bool, timeout: Duration) -> Self {
        Self { enabled, timeout }
    }

    /// Best effort. Failures are logged and ignored.
    pub async fn cancel(&self) {
        if !self.enabled {
            return;
        }

        let timeout = self.timeout;
        match tokio::task::spawn_blocking(move || stop_discovery(timeout)).await {
            Ok(Ok(0)) => debug!("No adapter discovering"),
            Ok(Ok(stopped)) => debug!(adapters = stopped, "Discovery cancelled"),
            Ok(Err(e)) => debug!(error = %e, "Discovery cancel unavailable"),
            Err(e) => warn!(error = %e, "Discovery cancel task failed"),
        }
    }
}

fn stop_discovery(timeout: Duration) -> Result<usize, PrinterError> {
    let conn = bluez::system_bus()?;
    let objects = bluez::managed_objects(&conn, timeout)?;

    let mut stopped = 0;
    for adapter in discovering_adapters(&objects) {
        if stop_adapter(&conn, &adapter, timeout) {
            stopped += 1;
        }
    }
    Ok(stopped)
}

fn stop_adapter(conn: &Connection, adapter: &dbus::Path<'static>, timeout: Duration) -> bool {
    let proxy = conn.with_proxy(BLUEZ_SERVICE, adapter, timeout);
    match proxy.method_call::<(), _, _, _>(ADAPTER_IFACE, "StopDiscovery", ()) {
        Ok(()) => true,
        Err(e) => {
            // org.bluez.Error.Failed: the session belongs to another client
            debug!(adapter = %adapter, error = %e, "StopDiscovery refused");
            false
        }
    }
}

fn discovering_adapters(objects: &ManagedObjects) -> Vec<dbus::Path<'static>> {
    bluez::paths_with(objects, ADAPTER_IFACE)
        .into_iter()
        .filter(|(_, props)| bluez::bool_prop(props, "Discovering") == Some(true))
        .map(|(path, _)| path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::bluetooth::bluez::fixtures::{adapter, device};

    #[tokio::test]
    async fn test_disabled_cancel_is_noop() {
        DiscoveryControl::new(false, Duration::from_millis(10))
            .cancel()
            .await;
    }

    #[test]
    fn test_only_discovering_adapters_are_stopped() {
        let objects: ManagedObjects = HashMap::from([
            (dbus::Path::from("/org/bluez/hci0"), adapter(false)),
            (dbus::Path::from("/org/bluez/hci1"), adapter(true)),
            (
                dbus::Path::from("/org/bluez/hci1/dev_66_22_B3_05_9F_01"),
                device("66:22:B3:05:9F:01", Some("PT-210"), None, true),
            ),
        ]);

        let adapters = discovering_adapters(&objects);
        assert_eq!(adapters, vec![dbus::Path::from("/org/bluez/hci1")]);
    }
}
