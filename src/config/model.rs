//! Configuration data model.
//!
//! `ClientConfig` derives `Serialize`/`Deserialize` for TOML persistence.
//! Everything but the server address has a default.

use crate::irc::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest accepted log verbosity.
pub const MAX_VERBOSITY: u8 = 4;

/// Settings for one IRC connection. Treated as immutable once a client has
/// been built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Hostname or IP address of the IRC server.
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_nickname")]
    pub nickname: String,
    #[serde(default = "default_realname")]
    pub realname: String,
    #[serde(default)]
    pub password: Option<String>,
    /// 0 silences all logging, 4 is the chattiest.
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
    /// Echo every raw chunk received from the server to the log.
    #[serde(default)]
    pub debug: bool,
    /// Joined by the command-line client once registration completes.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_port(),
            nickname: default_nickname(),
            realname: default_realname(),
            password: None,
            verbosity: default_verbosity(),
            debug: false,
            channels: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::InvalidConfig("no server configured".into()));
        }
        if self.nickname.is_empty() || self.nickname.contains(' ') {
            return Err(Error::InvalidConfig(format!(
                "invalid nickname {:?}",
                self.nickname
            )));
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(Error::InvalidConfig(format!(
                "verbosity {} is above the maximum of {}",
                self.verbosity, MAX_VERBOSITY
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

fn default_port() -> u16 {
    6667
}
fn default_nickname() -> String {
    "Subarashi".to_string()
}
fn default_realname() -> String {
    "Subarashi IRC Client".to_string()
}
fn default_verbosity() -> u8 {
    1
}
