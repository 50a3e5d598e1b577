use serde::{Deserialize, Serialize};

/// Connection state of the single printer link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// No live link, no attempt in flight
    #[default]
    Disconnected,
    /// Explicit, caller-initiated connect in flight
    Connecting,
    /// Link open and believed usable
    Connected,
    /// Implicit reopen to the last known address in flight
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Transition to connecting state
    pub fn to_connecting(&self) -> Result<Self, &'static str> {
        match self {
            Self::Disconnected => Ok(Self::Connecting),
            _ => Err("Can only connect from Disconnected state"),
        }
    }

    /// Transition to connected state
    pub fn to_connected(&self) -> Result<Self, &'static str> {
        match self {
            Self::Connecting | Self::Reconnecting => Ok(Self::Connected),
            _ => Err("Can only complete connection from Connecting or Reconnecting state"),
        }
    }

    /// Transition to disconnected state
    pub fn to_disconnected(&self) -> Self {
        Self::Disconnected
    }

    /// Transition to reconnecting state
    pub fn to_reconnecting(&self) -> Result<Self, &'static str> {
        match self {
            Self::Connected | Self::Disconnected => Ok(Self::Reconnecting),
            _ => Err("Can only reconnect from Connected or Disconnected state"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Reconnecting => "Reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
