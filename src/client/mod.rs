pub mod transport;
pub mod events;
pub mod commands;

pub use transport::{Transport, RecordingTransport, ConsoleTransport, OutboundMessage};
pub use events::{InboundEvent, EventKind};
pub use commands::AdminCommand;
