//! Domain layer - Pure printer-link model with no platform dependencies
//!
//! This crate contains:
//! - Value objects (PeripheralAddress, PeripheralDescriptor, DrawerKick)
//! - The connection state machine (ConnectionState)
//! - Error taxonomy (PrinterError)
//! - Seams the infrastructure layer implements (SerialTransport, DeviceRegistry, AddressStore)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Transition rules enforced at domain level
//! - Testable in isolation

pub mod connection;
pub mod drawer;
pub mod error;
pub mod peripheral;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use connection::{ConnectionEvent, ConnectionState, SerialLink, SerialTransport};
pub use drawer::{DrawerKick, DrawerPin};
pub use error::{PrinterError, Result};
pub use peripheral::{PeripheralAddress, PeripheralDescriptor};
pub use registry::DeviceRegistry;
pub use store::AddressStore;
