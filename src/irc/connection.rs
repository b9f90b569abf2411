//! TCP session management.
//!
//! A [`Connection`] owns one socket split into two tasks: the writer drains a
//! queue of framed lines onto the write half, the reader assembles incoming
//! bytes into whole lines, runs them through the codec and publishes
//! [`ClientEvent`]s. PINGs are answered from the reader task directly.

use crate::config::ClientConfig;
use crate::irc::codec::{self, Command, Frame};
use crate::irc::error::{Error, Result};
use crate::irc::event::ClientEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

const READ_BUFFER_SIZE: usize = 4096;

/// Upper bound on buffered bytes without a newline. A longer line is dropped.
const MAX_PENDING: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { registered: bool },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, ConnectionState::Connected { registered: true })
    }
}

pub struct Connection {
    outgoing: mpsc::UnboundedSender<String>,
    state: Arc<watch::Sender<ConnectionState>>,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
    /// Set exactly once when this session ends, by whichever side ends it.
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Connect to the configured server and send the registration lines.
    ///
    /// On failure the state goes back to `Disconnected` and the I/O error is
    /// returned as-is; nothing is retried.
    pub async fn open(
        config: &ClientConfig,
        state: Arc<watch::Sender<ConnectionState>>,
        event_tx: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<Self> {
        state.send_replace(ConnectionState::Connecting);
        info!(server = %config.server, port = config.port, "Connecting");

        let stream = match TcpStream::connect((config.server.as_str(), config.port)).await {
            Ok(stream) => stream,
            Err(e) => {
                state.send_replace(ConnectionState::Disconnected);
                warn!(server = %config.server, port = config.port, error = %e, "Connection failed");
                return Err(e.into());
            }
        };
        info!(server = %config.server, port = config.port, "Connected");

        let (read_half, write_half) = stream.into_split();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(write_half, outgoing_rx));

        state.send_replace(ConnectionState::Connected { registered: false });

        let closed = Arc::new(AtomicBool::new(false));
        let reader = Reader {
            read_half,
            outgoing: outgoing.clone(),
            state: state.clone(),
            event_tx: event_tx.clone(),
            closed: closed.clone(),
            debug: config.debug,
        };
        let reader = tokio::spawn(reader.run());

        let connection = Self {
            outgoing,
            state,
            event_tx,
            closed,
            reader,
        };

        debug!(nick = %config.nickname, "Registering");
        for command in registration(config) {
            connection.send(&command)?;
        }

        Ok(connection)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Queue a single protocol line. CRLF is appended here.
    pub fn write_raw(&self, line: &str) -> Result<()> {
        if line.contains(['\r', '\n']) {
            return Err(Error::InvalidLine(line.to_string()));
        }
        if !self.state().is_open() {
            return Err(Error::NotConnected);
        }
        if !line.starts_with("PASS ") {
            trace!(line, "Sending");
        }
        self.outgoing
            .send(codec::frame(line))
            .map_err(|_| Error::NotConnected)
    }

    pub fn send(&self, command: &Command) -> Result<()> {
        self.write_raw(&command.to_string())
    }

    /// Tear the session down from our side. Lines already queued are still
    /// flushed before the write half is shut down.
    ///
    /// The reader may still be finishing a chunk when this returns; it checks
    /// the closed flag before every frame and never touches the state again.
    pub fn close(self) {
        let already_closed = self.closed.swap(true, Ordering::SeqCst);
        self.reader.abort();
        if !already_closed {
            self.state.send_replace(ConnectionState::Disconnected);
            info!("Disconnected");
            let _ = self.event_tx.send(ClientEvent::Disconnected);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn registration(config: &ClientConfig) -> Vec<Command> {
    let mut commands = Vec::with_capacity(3);
    if let Some(password) = &config.password {
        commands.push(Command::Pass(password.clone()));
    }
    commands.push(Command::User {
        username: config.nickname.clone(),
        realname: config.realname.clone(),
    });
    commands.push(Command::Nick(config.nickname.clone()));
    commands
}

async fn write_loop(mut write_half: OwnedWriteHalf, mut outgoing: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outgoing.recv().await {
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            warn!(error = %e, "Write failed");
            break;
        }
    }
    let _ = write_half.shutdown().await;
}

struct Reader {
    read_half: OwnedReadHalf,
    outgoing: mpsc::UnboundedSender<String>,
    state: Arc<watch::Sender<ConnectionState>>,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
    closed: Arc<AtomicBool>,
    debug: bool,
}

impl Reader {
    async fn run(mut self) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut assembler = LineAssembler::default();

        loop {
            match self.read_half.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if self.debug {
                        info!(raw = %String::from_utf8_lossy(&buf[..n]), "Received");
                    }
                    if let Some(chunk) = assembler.push(&buf[..n]) {
                        self.dispatch(&chunk);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Socket error");
                    self.emit(ClientEvent::Error(e.to_string()));
                    break;
                }
            }
        }

        if assembler.pending() > 0 {
            trace!(bytes = assembler.pending(), "Dropping incomplete trailing line");
        }
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.send_replace(ConnectionState::Disconnected);
            info!("Disconnected");
            let _ = self.event_tx.send(ClientEvent::Disconnected);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Publish `event` unless this session was closed. The check and the send
    /// happen under the state lock, so nothing can follow `Disconnected`.
    fn emit(&self, event: ClientEvent) -> bool {
        let mut sent = false;
        self.state.send_if_modified(|state| {
            if !self.is_closed() && state.is_open() {
                sent = self.event_tx.send(event).is_ok();
            }
            false
        });
        sent
    }

    fn dispatch(&self, chunk: &str) {
        if !self.emit(ClientEvent::RawData(chunk.to_string())) {
            return;
        }

        for frame in codec::decode_chunk(chunk) {
            if self.is_closed() {
                return;
            }
            match frame {
                Frame::Ping { token } => {
                    debug!(%token, "Answering PING");
                    let pong = Command::Pong(token).to_string();
                    let _ = self.outgoing.send(codec::frame(&pong));
                }
                Frame::Ready => {
                    // A concurrent close() or a newer session must not be
                    // marked registered by this reader.
                    let registered = self.state.send_if_modified(|state| {
                        if self.is_closed() || !state.is_open() {
                            return false;
                        }
                        *state = ConnectionState::Connected { registered: true };
                        let _ = self.event_tx.send(ClientEvent::Ready);
                        true
                    });
                    if registered {
                        info!("Registration complete");
                    }
                }
                Frame::Message(message) => {
                    self.emit(ClientEvent::Message(message));
                }
                Frame::Unclassified(message) => {
                    trace!(command = %message.command, target = %message.target, "Unhandled line");
                }
            }
        }
    }
}

/// Holds back the bytes after the last newline until the rest of the line
/// arrives, so chunks handed to the codec always end on a line boundary.
///
/// A line that grows past `MAX_PENDING` without a newline is dropped whole:
/// everything up to its terminating newline is discarded with a warning.
#[derive(Debug, Default)]
struct LineAssembler {
    pending: Vec<u8>,
    discarding: bool,
}

impl LineAssembler {
    fn push(&mut self, mut bytes: &[u8]) -> Option<String> {
        if self.discarding {
            let pos = bytes.iter().position(|&b| b == b'\n')?;
            bytes = &bytes[pos + 1..];
            self.discarding = false;
        }
        self.pending.extend_from_slice(bytes);

        let complete = match self.pending.iter().rposition(|&b| b == b'\n') {
            Some(pos) => {
                let complete: Vec<u8> = self.pending.drain(..=pos).collect();
                Some(String::from_utf8_lossy(&complete).into_owned())
            }
            None => None,
        };
        if self.pending.len() >= MAX_PENDING {
            warn!(bytes = self.pending.len(), "Discarding oversized line");
            self.pending.clear();
            self.discarding = true;
        }
        complete
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_without_password() {
        let config = ClientConfig::new("irc.example.com");
        let lines: Vec<String> = registration(&config).iter().map(|c| c.to_string()).collect();
        assert_eq!(
            lines,
            vec!["USER Subarashi 0 * :Subarashi IRC Client", "NICK Subarashi"]
        );
    }

    #[test]
    fn test_registration_with_password() {
        let mut config = ClientConfig::new("irc.example.com");
        config.password = Some("secret".into());
        config.nickname = "crab".into();
        let lines: Vec<String> = registration(&config).iter().map(|c| c.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "PASS secret",
                "USER crab 0 * :Subarashi IRC Client",
                "NICK crab"
            ]
        );
    }

    #[test]
    fn test_assembler_holds_partial_line() {
        let mut assembler = LineAssembler::default();
        assert_eq!(assembler.push(b":a!u@h PRIVMSG #c :hel"), None);
        assert_eq!(
            assembler.push(b"lo\r\n:b!u@h PRI"),
            Some(":a!u@h PRIVMSG #c :hello\r\n".to_string())
        );
        assert_eq!(assembler.pending(), 10);
        assert_eq!(
            assembler.push(b"VMSG #c :x\r\n"),
            Some(":b!u@h PRIVMSG #c :x\r\n".to_string())
        );
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_assembler_keeps_split_utf8_intact() {
        let mut assembler = LineAssembler::default();
        let line = ":a!u@h PRIVMSG #c :caf\u{e9}\r\n".as_bytes();
        let split = line.len() - 3;
        assert_eq!(assembler.push(&line[..split]), None);
        assert_eq!(
            assembler.push(&line[split..]),
            Some(":a!u@h PRIVMSG #c :caf\u{e9}\r\n".to_string())
        );
    }

    #[test]
    fn test_assembler_drops_oversized_line() {
        let mut assembler = LineAssembler::default();
        assert_eq!(assembler.push(b":a!u@h PRIVMSG #c :ok\r\n:b!u@h PRIVMSG #c :"), Some(":a!u@h PRIVMSG #c :ok\r\n".to_string()));
        let junk = vec![b'x'; MAX_PENDING];
        assert_eq!(assembler.push(&junk), None);
        assert_eq!(assembler.pending(), 0);

        // The rest of the long line is skipped up to its newline.
        assert_eq!(assembler.push(b"xxxx"), None);
        assert_eq!(
            assembler.push(b"xx\r\n:c!u@h PRIVMSG #c :next\r\n"),
            Some(":c!u@h PRIVMSG #c :next\r\n".to_string())
        );
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_state_flags() {
        assert!(!ConnectionState::Disconnected.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(ConnectionState::Connected { registered: false }.is_open());
        assert!(!ConnectionState::Connected { registered: false }.is_registered());
        assert!(ConnectionState::Connected { registered: true }.is_registered());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run a reader over a loopback socket fed one line, returning the log.
    async fn read_with_log(verbosity: u8, debug: bool) -> String {
        let captured = Captured::default();
        let _guard = tracing::subscriber::set_default(crate::logging::subscriber(
            verbosity,
            captured.clone(),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();
        server.write_all(b":alice!a@host PRIVMSG #c :hi\r\n").await.unwrap();
        drop(server);

        let (read_half, _write_half) = stream.into_split();
        let (outgoing, _outgoing_rx) = mpsc::unbounded_channel();
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let reader = Reader {
            read_half,
            outgoing,
            state: Arc::new(watch::channel(ConnectionState::Connected { registered: false }).0),
            event_tx,
            closed: Arc::new(AtomicBool::new(false)),
            debug,
        };
        reader.run().await;

        assert!(matches!(events.recv().await, Some(ClientEvent::RawData(_))));
        captured.text()
    }

    // One test so the scoped subscribers never overlap on another thread.
    #[tokio::test]
    async fn test_log_output_follows_debug_and_verbosity() {
        let log = read_with_log(1, true).await;
        assert!(log.contains("Received"), "{}", log);
        assert!(log.contains("PRIVMSG #c :hi"), "{}", log);
        assert!(log.contains("Disconnected"), "{}", log);

        let log = read_with_log(1, false).await;
        assert!(!log.contains("Received"), "{}", log);
        assert!(log.contains("Disconnected"), "{}", log);

        assert_eq!(read_with_log(0, true).await, "");
    }
}
