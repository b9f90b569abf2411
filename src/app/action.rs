#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    JoinChannel { channel: String },
    PartChannel { channel: String },
    SendMessage { target: String, text: String },
    ChangeNick { nick: String },
    SendKick { channel: String, user: String, reason: String },
    Quit { message: Option<String> },
    SendRaw { command: String },
}
