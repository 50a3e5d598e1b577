mod actor;
pub mod connection_manager;
pub mod dispatcher;
mod gateway;

pub use connection_manager::ConnectionManager;
pub use dispatcher::CommandDispatcher;
pub use gateway::{PrinterGateway, PrinterSettings};
