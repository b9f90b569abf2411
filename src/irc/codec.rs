//! IRC wire codec.
//!
//! Turns raw server text into [`Frame`]s and renders outgoing [`Command`]s
//! into protocol lines. Everything here is a pure function of its input; the
//! connection layer owns the socket and decides what to do with each frame.

use std::fmt;

/// Numeric reply sent by the server at the end of the MOTD. Seeing it is the
/// only signal used to consider registration complete.
pub const END_OF_MOTD: &str = "376";

/// How a parsed line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `PRIVMSG` addressed to a `#channel`.
    ChannelMessage,
    /// `PRIVMSG` addressed to anything else (normally our nick).
    PrivateMessage,
    /// Any other command or numeric.
    Other,
}

/// A general command line broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Nick from a `nick!user@host` prefix. `None` when the prefix has no `!`.
    pub sender_nick: Option<String>,
    /// Host from a `nick!user@host` prefix. `None` when the prefix has no `@`.
    pub sender_host: Option<String>,
    pub command: String,
    pub target: String,
    /// Raw tokens following the target, in order.
    pub params: Vec<String>,
    pub kind: MessageKind,
    /// Unwrapped text of a `PRIVMSG`.
    pub body: Option<String>,
}

impl ParsedMessage {
    pub fn is_channel_message(&self) -> bool {
        self.kind == MessageKind::ChannelMessage
    }
}

/// One unit of work produced from an incoming chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Server keep-alive; must be answered with `PONG <token>`.
    Ping { token: String },
    /// End of MOTD seen, registration is complete.
    Ready,
    /// A classified `PRIVMSG`.
    Message(ParsedMessage),
    /// Parsed, but nothing is surfaced for this command.
    Unclassified(ParsedMessage),
}

/// Decode a chunk of server text into frames.
///
/// A chunk starting with `PING` is answered as a whole and nothing else in it
/// is looked at. Any other chunk is split on `\n` and its lines are decoded
/// last-to-first, so the returned frames are in reverse line order.
pub fn decode_chunk(chunk: &str) -> Vec<Frame> {
    if chunk.starts_with("PING") {
        return vec![Frame::Ping {
            token: ping_token(chunk),
        }];
    }

    chunk.split('\n').rev().filter_map(decode_line).collect()
}

/// Decode a single line. Returns `None` for blank or too-short lines.
pub fn decode_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() < 2 {
        return None;
    }

    if tokens[1] == END_OF_MOTD {
        return Some(Frame::Ready);
    }

    parse_tokens(&tokens).map(classify)
}

/// Parse a general command line into a [`ParsedMessage`] without classifying
/// it. Lines with fewer than three space-separated tokens yield `None`.
pub fn parse_line(line: &str) -> Option<ParsedMessage> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let tokens: Vec<&str> = line.split(' ').collect();
    parse_tokens(&tokens)
}

fn parse_tokens(tokens: &[&str]) -> Option<ParsedMessage> {
    let [prefix, command, target, rest @ ..] = tokens else {
        return None;
    };

    Some(ParsedMessage {
        sender_nick: sender_nick(prefix),
        sender_host: sender_host(prefix),
        command: command.to_string(),
        target: target.to_string(),
        params: rest.iter().map(|s| s.to_string()).collect(),
        kind: MessageKind::Other,
        body: None,
    })
}

fn sender_nick(prefix: &str) -> Option<String> {
    let (nick, _) = prefix.split_once('!')?;
    let nick = nick.strip_prefix(':').unwrap_or(nick);
    (!nick.is_empty()).then(|| nick.to_string())
}

fn sender_host(prefix: &str) -> Option<String> {
    let (_, host) = prefix.split_once('@')?;
    (!host.is_empty()).then(|| host.to_string())
}

fn classify(mut message: ParsedMessage) -> Frame {
    if message.command != "PRIVMSG" {
        return Frame::Unclassified(message);
    }

    let joined = message.params.join(" ");
    let body = joined.strip_prefix(':').unwrap_or(&joined).to_string();

    message.kind = if message.target.starts_with('#') {
        MessageKind::ChannelMessage
    } else {
        MessageKind::PrivateMessage
    };
    message.body = Some(body);
    Frame::Message(message)
}

fn ping_token(chunk: &str) -> String {
    chunk
        .lines()
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .unwrap_or_default()
        .to_string()
}

/// Terminate a protocol line for the wire.
pub fn frame(line: &str) -> String {
    format!("{}\r\n", line)
}

/// An outgoing command. `Display` renders the wire line without the CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pass(String),
    User { username: String, realname: String },
    Nick(String),
    Join(String),
    Part(String),
    Quit(String),
    Privmsg { target: String, text: String },
    Kick { channel: String, nick: String, reason: String },
    Pong(String),
    Raw(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pass(password) => write!(f, "PASS {}", password),
            Command::User { username, realname } => {
                write!(f, "USER {} 0 * :{}", username, realname)
            }
            Command::Nick(nick) => write!(f, "NICK {}", nick),
            Command::Join(channel) => write!(f, "JOIN {}", channel),
            Command::Part(channel) => write!(f, "PART {}", channel),
            Command::Quit(message) => write!(f, "QUIT :{}", message),
            Command::Privmsg { target, text } => write!(f, "PRIVMSG {} :{}", target, text),
            Command::Kick {
                channel,
                nick,
                reason,
            } => write!(f, "KICK {} {} :{}", channel, nick, reason),
            Command::Pong(token) => write!(f, "PONG {}", token),
            Command::Raw(line) => f.write_str(line),
        }
    }
}
