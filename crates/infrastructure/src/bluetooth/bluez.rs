//! Shared BlueZ D-Bus plumbing: system bus, object manager snapshot and
//! property accessors.

use std::collections::HashMap;
use std::time::Duration;

use dbus::arg::PropMap;
use dbus::blocking::Connection;
use dbus::blocking::stdintf::org_freedesktop_dbus::ObjectManager;
use domain::PrinterError;

pub(crate) type ManagedObjects = HashMap<dbus::Path<'static>, HashMap<String, PropMap>>;

pub(crate) const BLUEZ_SERVICE: &str = "org.bluez";
pub(crate) const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
pub(crate) const DEVICE_IFACE: &str = "org.bluez.Device1";

pub(crate) fn system_bus() -> Result<Connection, PrinterError> {
    Connection::new_system().map_err(map_dbus_error)
}

/// Every BlueZ object (adapters, devices) with its interfaces and properties
pub(crate) fn managed_objects(
    conn: &Connection,
    timeout: Duration,
) -> Result<ManagedObjects, PrinterError> {
    conn.with_proxy(BLUEZ_SERVICE, "/", timeout)
        .get_managed_objects()
        .map_err(map_dbus_error)
}

pub(crate) fn map_dbus_error(e: dbus::Error) -> PrinterError {
    match e.name() {
        Some(
            "org.freedesktop.DBus.Error.AccessDenied"
            | "org.freedesktop.DBus.Error.AuthFailed"
            | "org.bluez.Error.NotAuthorized",
        ) => PrinterError::PermissionDenied(e.to_string()),
        _ => PrinterError::Unavailable(e.to_string()),
    }
}

pub(crate) fn has_adapter(objects: &ManagedObjects) -> bool {
    objects.values().any(|ifaces| ifaces.contains_key(ADAPTER_IFACE))
}

pub(crate) fn str_prop(props: &PropMap, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(|v| v.0.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub(crate) fn bool_prop(props: &PropMap, key: &str) -> Option<bool> {
    props.get(key).and_then(|v| {
        v.0.as_u64()
            .map(|n| n != 0)
            .or_else(|| v.0.as_i64().map(|n| n != 0))
    })
}

/// Object paths carrying `iface`, in path order
pub(crate) fn paths_with<'a>(
    objects: &'a ManagedObjects,
    iface: &'a str,
) -> Vec<(&'a dbus::Path<'static>, &'a PropMap)> {
    let mut found: Vec<_> = objects
        .iter()
        .filter_map(|(path, ifaces)| ifaces.get(iface).map(|props| (path, props)))
        .collect();
    found.sort_by(|a, b| (**a.0).cmp(&**b.0));
    found
}

#[cfg(test)]
pub(crate) mod fixtures {
    use dbus::arg::{RefArg, Variant};

    use super::*;

    pub fn prop(value: impl RefArg + 'static) -> Variant<Box<dyn RefArg>> {
        Variant(Box::new(value))
    }

    pub fn adapter(discovering: bool) -> HashMap<String, PropMap> {
        let mut props = PropMap::new();
        props.insert("Address".into(), prop("00:1A:7D:DA:71:13".to_string()));
        props.insert("Discovering".into(), prop(discovering));
        HashMap::from([(ADAPTER_IFACE.to_string(), props)])
    }

    pub fn device(
        address: &str,
        name: Option<&str>,
        alias: Option<&str>,
        paired: bool,
    ) -> HashMap<String, PropMap> {
        let mut props = PropMap::new();
        props.insert("Address".into(), prop(address.to_string()));
        if let Some(name) = name {
            props.insert("Name".into(), prop(name.to_string()));
        }
        if let Some(alias) = alias {
            props.insert("Alias".into(), prop(alias.to_string()));
        }
        props.insert("Paired".into(), prop(paired));
        HashMap::from([(DEVICE_IFACE.to_string(), props)])
    }
}
