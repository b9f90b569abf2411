//! Consumer-facing IRC client.
//!
//! [`IrcClient`] wraps a single [`Connection`] and offers the outgoing
//! commands. Incoming traffic is published as [`ClientEvent`]s on the channel
//! passed to [`IrcClient::new`].

use crate::config::ClientConfig;
use crate::irc::codec::Command;
use crate::irc::connection::{Connection, ConnectionState};
use crate::irc::error::{Error, Result};
use crate::irc::event::ClientEvent;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Message sent with `QUIT` when the caller does not give one.
pub const DEFAULT_QUIT_MESSAGE: &str = "Quitting";

pub struct IrcClient {
    config: ClientConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
    connection: Option<Connection>,
}

impl IrcClient {
    /// Build a client from a validated config. Nothing touches the network
    /// until [`connect`](Self::connect) is called.
    pub fn new(config: ClientConfig, event_tx: mpsc::UnboundedSender<ClientEvent>) -> Result<Self> {
        config.validate()?;
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Ok(Self {
            config,
            state: Arc::new(state),
            event_tx,
            connection: None,
        })
    }

    /// Convenience constructor that also creates the event channel.
    pub fn with_events(
        config: ClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok((Self::new(config, event_tx)?, event_rx))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// True once the server has sent end of MOTD on the current connection.
    pub fn is_ready(&self) -> bool {
        self.state().is_registered()
    }

    pub async fn connect(&mut self) -> Result<()> {
        if self.state() != ConnectionState::Disconnected {
            return Err(Error::AlreadyConnected);
        }
        // A previous session may have been closed by the server.
        self.connection = None;

        let conn = Connection::open(&self.config, self.state.clone(), self.event_tx.clone()).await?;
        self.connection = Some(conn);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<()> {
        let conn = self.connection.take().ok_or(Error::NotConnected)?;
        conn.close();
        Ok(())
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(Error::NotConnected)
    }

    /// Send a line verbatim (CRLF is appended).
    pub fn write_raw(&self, line: &str) -> Result<()> {
        self.connection()?.write_raw(line)
    }

    pub fn send(&self, command: &Command) -> Result<()> {
        self.connection()?.send(command)
    }

    pub fn join(&self, channel: &str) -> Result<()> {
        self.send(&Command::Join(channel.to_string()))
    }

    pub fn part(&self, channel: &str) -> Result<()> {
        self.send(&Command::Part(channel.to_string()))
    }

    pub fn say(&self, receiver: &str, message: &str) -> Result<()> {
        self.send(&Command::Privmsg {
            target: receiver.to_string(),
            text: message.to_string(),
        })
    }

    /// Ask the server for a new nickname. The configured nickname is left
    /// untouched; the server decides whether the change happens.
    pub fn change_nick(&self, new_nick: &str) -> Result<()> {
        self.send(&Command::Nick(new_nick.to_string()))
    }

    pub fn kick(&self, channel: &str, nick: &str, reason: &str) -> Result<()> {
        self.send(&Command::Kick {
            channel: channel.to_string(),
            nick: nick.to_string(),
            reason: reason.to_string(),
        })
    }

    /// Send `QUIT`. The socket stays open until the server closes it or
    /// [`disconnect`](Self::disconnect) is called.
    pub fn quit(&self, message: Option<&str>) -> Result<()> {
        let message = message.unwrap_or(DEFAULT_QUIT_MESSAGE);
        self.send(&Command::Quit(message.to_string()))
    }
}
