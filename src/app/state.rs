use subarashi::config::ClientConfig;

/// Everything the front end tracks between events.
#[derive(Debug)]
pub struct AppState {
    pub nickname: String,
    /// Channels joined once registration completes.
    pub autojoin: Vec<String>,
    /// Where plain (non-command) input goes.
    pub current_target: Option<String>,
    pub ready: bool,
    /// `QUIT` has been sent; waiting for the server to close.
    pub quitting: bool,
    pub should_quit: bool,
    /// Lines to print, drained by the main loop after every event.
    pub output: Vec<String>,
}

impl AppState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            nickname: config.nickname.clone(),
            autojoin: config.channels.clone(),
            current_target: config.channels.first().cloned(),
            ready: false,
            quitting: false,
            should_quit: false,
            output: Vec::new(),
        }
    }

    pub fn system_message(&mut self, text: String) {
        self.output.push(format!("{} -!- {}", timestamp(), text));
    }

    pub fn error_message(&mut self, text: String) {
        self.output.push(format!("{} !!! {}", timestamp(), text));
    }

    pub fn chat_line(&mut self, line: String) {
        self.output.push(format!("{} {}", timestamp(), line));
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
