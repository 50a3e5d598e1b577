use crate::error::{PrinterError, Result};
use serde::{Deserialize, Serialize};

/// Value object identifying a Bluetooth peripheral (MAC-like string)
///
/// Rules:
/// - Colon separated groups of exactly two hex digits
/// - Between 1 and 6 groups ("AA:BB" and "00:11:22:AA:BB:CC" are both valid)
/// - Normalized to upper case so it is stable as a reconnection key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeripheralAddress(String);

impl PeripheralAddress {
    pub fn parse(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        let trimmed = address.trim();

        if trimmed.is_empty() {
            return Err(PrinterError::InvalidAddress(
                "Address cannot be empty".to_string(),
            ));
        }

        let groups: Vec<&str> = trimmed.split(':').collect();
        if groups.len() > 6 {
            return Err(PrinterError::InvalidAddress(format!(
                "{trimmed}: too many groups ({}, max 6)",
                groups.len()
            )));
        }

        let well_formed = groups
            .iter()
            .all(|g| g.len() == 2 && g.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(PrinterError::InvalidAddress(format!(
                "{trimmed}: expected colon separated hex pairs"
            )));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeripheralAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PeripheralAddress {
    type Err = PrinterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeripheralAddress {
    type Error = PrinterError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PeripheralAddress> for String {
    fn from(address: PeripheralAddress) -> Self {
        address.0
    }
}

/// A bonded peripheral as reported by the platform. Immutable query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralDescriptor {
    pub name: String,
    pub address: PeripheralAddress,
}

impl PeripheralDescriptor {
    pub fn new(name: impl Into<String>, address: PeripheralAddress) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}
