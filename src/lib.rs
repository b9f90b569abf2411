//! A minimal IRC client.
//!
//! Connects to one server over plain TCP, registers, answers PINGs and
//! publishes channel and private messages as [`irc::ClientEvent`]s.
//!
//! ```no_run
//! use subarashi::config::ClientConfig;
//! use subarashi::irc::{ClientEvent, IrcClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let (mut client, mut events) = IrcClient::with_events(ClientConfig::new("irc.libera.chat"))?;
//! client.connect().await?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::Ready => client.join("#subarashi")?,
//!         ClientEvent::Message(msg) => println!("{:?}: {:?}", msg.sender_nick, msg.body),
//!         ClientEvent::Disconnected => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod irc;
pub mod logging;
