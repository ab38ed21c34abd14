// kerminal-api: Async WebSocket client for the Telemachus datalink

pub mod catalog;
pub mod error;
pub mod link;
pub mod protocol;

pub use error::Error;
pub use link::{LinkReader, LinkWriter, dial};
pub use protocol::Record;
