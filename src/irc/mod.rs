//! IRC protocol layer: wire codec, connection management, and the client
//! surface consumers talk to.

pub mod client;
pub mod codec;
pub mod commands;
pub mod connection;
pub mod error;
pub mod event;

pub use client::IrcClient;
pub use codec::{Command, Frame, MessageKind, ParsedMessage};
pub use connection::ConnectionState;
pub use error::{Error, Result};
pub use event::ClientEvent;
