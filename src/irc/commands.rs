//! User slash-command parser.
//!
//! Parses `/command arg1 arg2 ...` input lines into typed [`ParsedCommand`]
//! values that the command-line client acts on.

/// Port used when an address has none.
pub const DEFAULT_PORT: u16 = 6667;

/// A parsed user command. Each variant corresponds to a `/command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Join { channel: String },
    Part { channel: Option<String> },
    Msg { target: String, text: String },
    Query { target: String },
    Nick { nick: String },
    Kick { channel: Option<String>, user: String, reason: Option<String> },
    Quit { message: Option<String> },
    Raw { command: String },
    Help,
}

/// Parse a slash-command string into a [`ParsedCommand`].
///
/// Returns `None` if the input does not start with `/` or is not a recognized
/// command. Commands are case-insensitive.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let body = input.strip_prefix('/')?;

    let parts: Vec<&str> = body.splitn(3, ' ').collect();
    let cmd = parts.first()?.to_lowercase();

    match cmd.as_str() {
        "join" | "j" => {
            let channel = parts.get(1)?.to_string();
            let channel = if !channel.starts_with('#') && !channel.starts_with('&') {
                format!("#{}", channel)
            } else {
                channel
            };
            Some(ParsedCommand::Join { channel })
        }
        "part" | "leave" => {
            let channel = parts.get(1).map(|s| s.to_string());
            Some(ParsedCommand::Part { channel })
        }
        "msg" => {
            let target = parts.get(1)?.to_string();
            let text = parts.get(2).unwrap_or(&"").to_string();
            Some(ParsedCommand::Msg { target, text })
        }
        "query" | "q" => {
            let target = parts.get(1)?.to_string();
            Some(ParsedCommand::Query { target })
        }
        "nick" => {
            let nick = parts.get(1)?.to_string();
            Some(ParsedCommand::Nick { nick })
        }
        "kick" => {
            let arg1 = parts.get(1)?.to_string();
            let rest = parts.get(2).map(|s| s.to_string());
            if arg1.starts_with('#') || arg1.starts_with('&') {
                // /kick #channel user [reason]
                let rest = rest?;
                let mut sp = rest.splitn(2, ' ');
                let user = sp.next().unwrap_or("").to_string();
                if user.is_empty() {
                    return None;
                }
                let reason = sp.next().map(|s| s.to_string());
                Some(ParsedCommand::Kick { channel: Some(arg1), user, reason })
            } else {
                // /kick user [reason]
                Some(ParsedCommand::Kick { channel: None, user: arg1, reason: rest })
            }
        }
        "quit" | "exit" => {
            let message = body.split_once(' ').map(|(_, m)| m.to_string());
            Some(ParsedCommand::Quit { message })
        }
        "raw" | "quote" => {
            let (_, command) = body.split_once(' ')?;
            if command.is_empty() {
                return None;
            }
            Some(ParsedCommand::Raw { command: command.to_string() })
        }
        "help" | "h" => Some(ParsedCommand::Help),
        _ => None,
    }
}

/// Parse a `host` or `host:port` address string. Returns `(host, port)`;
/// a missing or unparsable port falls back to [`DEFAULT_PORT`].
///
/// IPv6 literals take a port only in brackets (`[::1]:6697`); the brackets
/// are stripped from the returned host.
pub fn parse_host_port(addr: &str) -> (String, u16) {
    if let Some(rest) = addr.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT);
            return (host.to_string(), port);
        }
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            (host.to_string(), port.parse().unwrap_or(DEFAULT_PORT))
        }
        _ => (addr.to_string(), DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_command() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/frobnicate"), None);
    }

    #[test]
    fn test_join_adds_hash() {
        assert_eq!(
            parse_command("/join rust"),
            Some(ParsedCommand::Join { channel: "#rust".into() })
        );
        assert_eq!(
            parse_command("/J &local"),
            Some(ParsedCommand::Join { channel: "&local".into() })
        );
        assert_eq!(parse_command("/join"), None);
    }

    #[test]
    fn test_part() {
        assert_eq!(parse_command("/part"), Some(ParsedCommand::Part { channel: None }));
        assert_eq!(
            parse_command("/part #rust"),
            Some(ParsedCommand::Part { channel: Some("#rust".into()) })
        );
    }

    #[test]
    fn test_msg_keeps_spaces() {
        assert_eq!(
            parse_command("/msg friend hello   there"),
            Some(ParsedCommand::Msg {
                target: "friend".into(),
                text: "hello   there".into()
            })
        );
    }

    #[test]
    fn test_kick_forms() {
        assert_eq!(
            parse_command("/kick #rust troll be nice"),
            Some(ParsedCommand::Kick {
                channel: Some("#rust".into()),
                user: "troll".into(),
                reason: Some("be nice".into())
            })
        );
        assert_eq!(
            parse_command("/kick troll"),
            Some(ParsedCommand::Kick { channel: None, user: "troll".into(), reason: None })
        );
        assert_eq!(parse_command("/kick #rust"), None);
    }

    #[test]
    fn test_quit_and_raw() {
        assert_eq!(parse_command("/quit"), Some(ParsedCommand::Quit { message: None }));
        assert_eq!(
            parse_command("/quit see you all"),
            Some(ParsedCommand::Quit { message: Some("see you all".into()) })
        );
        assert_eq!(
            parse_command("/raw MODE #rust +m"),
            Some(ParsedCommand::Raw { command: "MODE #rust +m".into() })
        );
        assert_eq!(parse_command("/raw"), None);
    }

    #[test]
    fn test_parse_host_port() {
        assert_eq!(parse_host_port("irc.example.com"), ("irc.example.com".into(), 6667));
        assert_eq!(parse_host_port("irc.example.com:7000"), ("irc.example.com".into(), 7000));
        assert_eq!(parse_host_port("irc.example.com:nope"), ("irc.example.com".into(), 6667));
    }

    #[test]
    fn test_parse_host_port_ipv6() {
        assert_eq!(parse_host_port("::1"), ("::1".into(), 6667));
        assert_eq!(parse_host_port("2001:db8::7"), ("2001:db8::7".into(), 6667));
        assert_eq!(parse_host_port("[::1]:7000"), ("::1".into(), 7000));
        assert_eq!(parse_host_port("[::1]"), ("::1".into(), 6667));
    }
}
