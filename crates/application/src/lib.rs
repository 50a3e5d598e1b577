//! Application layer - Printer link use cases
//!
//! Everything that touches the link runs inside one actor task; callers hold
//! a cloneable [`PrinterGateway`].

pub mod printer;

pub use printer::{PrinterGateway, PrinterSettings};
