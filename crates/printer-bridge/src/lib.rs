//! Printer bridge - wires configuration, Bluetooth adapters and the printer
//! gateway together for the command line.

pub mod bootstrap;
pub mod cli;
pub mod commands;
