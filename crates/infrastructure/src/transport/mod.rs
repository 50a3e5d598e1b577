pub mod mock_transport;
mod rfcomm;
mod tty_binding;

pub use mock_transport::{MockTransport, MockTransportProbe};
pub use rfcomm::{RfcommLink, RfcommTransport, SPP_UUID};
pub use tty_binding::TtyBindings;
