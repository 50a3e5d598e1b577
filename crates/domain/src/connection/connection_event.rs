use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConnectionState;
use crate::peripheral::PeripheralAddress;

/// Snapshot published every time the connection state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub state: ConnectionState,
    pub address: Option<PeripheralAddress>,
    pub timestamp: DateTime<Utc>,
}

impl ConnectionEvent {
    pub fn new(state: ConnectionState, address: Option<PeripheralAddress>) -> Self {
        Self {
            state,
            address,
            timestamp: Utc::now(),
        }
    }

    /// Initial snapshot at process start
    pub fn initial() -> Self {
        Self::new(ConnectionState::Disconnected, None)
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_event() {
        let event = ConnectionEvent::initial();
        assert_eq!(event.state, ConnectionState::Disconnected);
        assert!(event.address.is_none());
        assert!(!event.is_connected());
    }

    #[test]
    fn test_event_serializes_state_and_address() {
        let addr = PeripheralAddress::parse("AA:BB").unwrap();
        let event = ConnectionEvent::new(ConnectionState::Connected, Some(addr));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["state"], "Connected");
        assert_eq!(json["address"], "AA:BB");
    }
}
