pub mod mock_ports;
pub use mock_ports::*;
