mod connection_event;
mod connection_state;
mod serial_link;

pub use connection_event::ConnectionEvent;
pub use connection_state::ConnectionState;
pub use serial_link::{SerialLink, SerialTransport};
