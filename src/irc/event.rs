use crate::irc::codec::ParsedMessage;

/// Events the client publishes to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Registration complete (end of MOTD received).
    Ready,

    /// A `PRIVMSG` to a channel or to us. `kind` and `body` are filled in.
    Message(ParsedMessage),

    /// Unmodified chunk of server text, before any parsing.
    RawData(String),

    /// The socket failed while reading. Always followed by `Disconnected`.
    Error(String),

    /// The connection is closed. No reconnect is attempted.
    Disconnected,
}
