mod app;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::AppState;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use subarashi::config::{self, ClientConfig};
use subarashi::irc::commands::parse_host_port;
use subarashi::irc::{ClientEvent, Command, IrcClient};
use subarashi::logging;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// How long to wait for the server to close the socket after `QUIT`.
const QUIT_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "subarashi", version, about = "A minimal IRC client")]
struct Cli {
    /// Config file to read instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address (host, host:port or [ipv6]:port).
    server: Option<String>,

    /// Nickname to register with.
    nick: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = load_from_cli(Cli::parse())?;
    logging::init(cfg.verbosity);

    if let Err(e) = run(cfg).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Build the config from the config file plus command-line overrides.
fn load_from_cli(cli: Cli) -> Result<ClientConfig> {
    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(addr) = cli.server {
        let (host, port) = parse_host_port(&addr);
        cfg.server = host;
        cfg.port = port;
    }
    if let Some(nick) = cli.nick {
        cfg.nickname = nick;
    }
    if cfg.server.is_empty() {
        anyhow::bail!(
            "no server given and none configured in {}",
            config::config_path().display()
        );
    }
    Ok(cfg)
}

async fn run(cfg: ClientConfig) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (irc_tx, mut irc_rx) = mpsc::unbounded_channel::<ClientEvent>();

    let mut state = AppState::new(&cfg);
    let mut client = IrcClient::new(cfg.clone(), irc_tx)?;

    // Forward client events into the app event stream
    let fwd_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = irc_rx.recv().await {
            if fwd_tx.send(AppEvent::Irc(event)).is_err() {
                break;
            }
        }
    });

    // Spawn stdin reader task
    let input_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(AppEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(AppEvent::InputClosed);
    });

    state.system_message(format!("Connecting to {}:{}...", cfg.server, cfg.port));
    flush_output(&mut state);
    client
        .connect()
        .await
        .with_context(|| format!("Connection to {}:{} failed", cfg.server, cfg.port))?;

    // Main event loop
    while let Some(event) = event_rx.recv().await {
        let actions = handler::handle_event(&mut state, event);

        for action in actions {
            if let Err(e) = execute(&client, &action) {
                state.error_message(format!("{:?} failed: {}", action, e));
            }
            if matches!(action, Action::Quit { .. }) {
                let mut watch = client.subscribe_state();
                let closed = tokio::time::timeout(QUIT_GRACE, watch.wait_for(|s| !s.is_open()));
                if closed.await.is_err() {
                    state.error_message("Server did not close the connection.".to_string());
                }
                state.should_quit = true;
            }
        }

        flush_output(&mut state);

        if state.should_quit {
            break;
        }
    }

    let _ = client.disconnect();
    Ok(())
}

fn execute(client: &IrcClient, action: &Action) -> subarashi::irc::Result<()> {
    match action {
        Action::JoinChannel { channel } => client.join(channel),
        Action::PartChannel { channel } => client.part(channel),
        Action::SendMessage { target, text } => client.say(target, text),
        Action::ChangeNick { nick } => client.change_nick(nick),
        Action::SendKick {
            channel,
            user,
            reason,
        } => client.kick(channel, user, reason),
        Action::Quit { message } => client.quit(message.as_deref()),
        Action::SendRaw { command } => client.send(&Command::Raw(command.clone())),
    }
}

fn flush_output(state: &mut AppState) {
    for line in state.output.drain(..) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config_file() {
        let path = std::env::temp_dir().join(format!("subarashi-main-{}.toml", std::process::id()));
        std::fs::write(&path, "server = \"irc.example.com\"\nverbosity = 2\n").unwrap();
        let cli = Cli::try_parse_from([
            "subarashi",
            "--config",
            path.to_str().unwrap(),
            "irc.other.net:7000",
            "crab",
        ])
        .unwrap();
        let cfg = load_from_cli(cli).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.server, "irc.other.net");
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.nickname, "crab");
        assert_eq!(cfg.verbosity, 2);
    }

    #[test]
    fn test_config_file_alone_supplies_server() {
        let path = std::env::temp_dir().join(format!("subarashi-main-only-{}.toml", std::process::id()));
        std::fs::write(&path, "server = \"irc.example.com\"\nport = 6697\n").unwrap();
        let cli = Cli::try_parse_from(["subarashi", "-c", path.to_str().unwrap()]).unwrap();
        let cfg = load_from_cli(cli).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.server, "irc.example.com");
        assert_eq!(cfg.port, 6697);
    }

    #[test]
    fn test_config_flag_needs_value() {
        assert!(Cli::try_parse_from(["subarashi", "--config"]).is_err());
    }

    #[test]
    fn test_too_many_positionals_rejected() {
        assert!(Cli::try_parse_from(["subarashi", "irc.example.com", "crab", "extra"]).is_err());
    }

    #[test]
    fn test_ipv6_server_argument() {
        let path = std::env::temp_dir().join(format!("subarashi-main-v6-{}.toml", std::process::id()));
        std::fs::write(&path, "server = \"irc.example.com\"\n").unwrap();
        let cli = Cli::try_parse_from(["subarashi", "-c", path.to_str().unwrap(), "[::1]:7000"]).unwrap();
        let cfg = load_from_cli(cli).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.server, "::1");
        assert_eq!(cfg.port, 7000);
    }
}
