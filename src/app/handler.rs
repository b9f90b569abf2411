use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::state::AppState;
use subarashi::irc::commands::{self, ParsedCommand};
use subarashi::irc::{ClientEvent, MessageKind, ParsedMessage};

const HELP: &[&str] = &[
    "/join <channel>              join a channel",
    "/part [channel]              leave a channel (default: current)",
    "/msg <target> <text>         send a message",
    "/query <target>              send plain input to <target>",
    "/nick <nick>                 change nickname",
    "/kick [channel] <nick> [why] kick someone (default: current channel)",
    "/raw <line>                  send a raw protocol line",
    "/quit [message]              disconnect",
];

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Irc(event) => handle_irc_event(state, event),
        AppEvent::Input(line) => handle_input(state, &line),
        AppEvent::InputClosed => {
            if state.quitting {
                vec![]
            } else {
                state.quitting = true;
                vec![Action::Quit { message: None }]
            }
        }
    }
}

fn handle_irc_event(state: &mut AppState, event: ClientEvent) -> Vec<Action> {
    match event {
        ClientEvent::Ready => {
            state.ready = true;
            state.system_message(format!("Registered as {}", state.nickname));
            state
                .autojoin
                .iter()
                .map(|channel| Action::JoinChannel {
                    channel: channel.clone(),
                })
                .collect()
        }
        ClientEvent::Message(msg) => {
            handle_message(state, msg);
            vec![]
        }
        // Raw echo is handled by the connection's debug logging.
        ClientEvent::RawData(_) => vec![],
        ClientEvent::Error(error) => {
            state.error_message(error);
            vec![]
        }
        ClientEvent::Disconnected => {
            state.ready = false;
            state.system_message("Disconnected.".to_string());
            state.should_quit = true;
            vec![]
        }
    }
}

fn handle_message(state: &mut AppState, msg: ParsedMessage) {
    let sender = msg.sender_nick.as_deref().unwrap_or("?");
    let body = msg.body.as_deref().unwrap_or_default();
    match msg.kind {
        MessageKind::ChannelMessage => {
            state.chat_line(format!("{} <{}> {}", msg.target, sender, body));
        }
        MessageKind::PrivateMessage => {
            state.chat_line(format!("*{}* {}", sender, body));
        }
        MessageKind::Other => {}
    }
}

fn handle_input(state: &mut AppState, line: &str) -> Vec<Action> {
    let line = line.trim_end();
    if line.is_empty() {
        return vec![];
    }

    if !line.starts_with('/') {
        return match state.current_target.clone() {
            Some(target) => {
                state.chat_line(format!("{} <{}> {}", target, state.nickname, line));
                vec![Action::SendMessage {
                    target,
                    text: line.to_string(),
                }]
            }
            None => {
                state.error_message("No target. Use /join or /query first.".to_string());
                vec![]
            }
        };
    }

    let Some(cmd) = commands::parse_command(line) else {
        state.error_message(format!("Unknown or incomplete command: {}", line));
        return vec![];
    };

    match cmd {
        ParsedCommand::Join { channel } => {
            state.current_target = Some(channel.clone());
            vec![Action::JoinChannel { channel }]
        }
        ParsedCommand::Part { channel } => {
            let Some(channel) = channel.or_else(|| current_channel(state)) else {
                state.error_message("Not in a channel.".to_string());
                return vec![];
            };
            if state.current_target.as_deref() == Some(channel.as_str()) {
                state.current_target = None;
            }
            vec![Action::PartChannel { channel }]
        }
        ParsedCommand::Msg { target, text } => {
            if text.is_empty() {
                state.error_message("Usage: /msg <target> <text>".to_string());
                return vec![];
            }
            state.chat_line(format!("-> *{}* {}", target, text));
            vec![Action::SendMessage { target, text }]
        }
        ParsedCommand::Query { target } => {
            state.system_message(format!("Now talking to {}", target));
            state.current_target = Some(target);
            vec![]
        }
        ParsedCommand::Nick { nick } => {
            // The server may refuse the nick, so ours stays until it confirms.
            state.system_message(format!("Requested nick change to {}", nick));
            vec![Action::ChangeNick { nick }]
        }
        ParsedCommand::Kick {
            channel,
            user,
            reason,
        } => {
            let Some(channel) = channel.or_else(|| current_channel(state)) else {
                state.error_message("Not in a channel.".to_string());
                return vec![];
            };
            let reason = reason.unwrap_or_else(|| user.clone());
            vec![Action::SendKick {
                channel,
                user,
                reason,
            }]
        }
        ParsedCommand::Quit { message } => {
            state.quitting = true;
            vec![Action::Quit { message }]
        }
        ParsedCommand::Raw { command } => vec![Action::SendRaw { command }],
        ParsedCommand::Help => {
            for line in HELP {
                state.system_message(line.to_string());
            }
            vec![]
        }
    }
}

fn current_channel(state: &AppState) -> Option<String> {
    state
        .current_target
        .clone()
        .filter(|t| t.starts_with('#') || t.starts_with('&'))
}
