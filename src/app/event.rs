use subarashi::irc::ClientEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Event published by the IRC client
    Irc(ClientEvent),

    /// One line typed on stdin
    Input(String),

    /// stdin reached end of file
    InputClosed,
}
