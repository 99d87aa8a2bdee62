//! Remote control via Unix socket
//!
//! Accepts one text command per line and forwards it to the main loop,
//! which applies it exactly like the matching key press.

use crate::config::Mode;
use crate::error::Result;
use crate::projection::Extent;
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

pub const SOCKET_PATH: &str = "/tmp/currentfield.sock";

/// Commands that can be sent over the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the particle field
    Start,
    /// Stop the particle field
    Stop,
    /// Begin trajectory playback
    Play,
    /// Pause trajectory playback
    Pause,
    Seek(i64),
    Load,
    Hide,
    Show,
    Mode(Mode),
    Extent(Extent),
    Quit,
}

/// Parse one command line; `None` for anything unrecognized
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_lowercase();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, Some(arg.trim())),
        None => (line.as_str(), None),
    };

    match (word, arg) {
        ("start", None) => Some(Command::Start),
        ("stop", None) => Some(Command::Stop),
        ("play", None) => Some(Command::Play),
        ("pause", None) => Some(Command::Pause),
        ("seek", Some(n)) => n.parse().ok().map(Command::Seek),
        ("l" | "load", None) => Some(Command::Load),
        ("hide", None) => Some(Command::Hide),
        ("show", None) => Some(Command::Show),
        ("mode", Some(m)) => m.parse().ok().map(Command::Mode),
        ("extent", Some(e)) => e.parse().ok().map(Command::Extent),
        ("q" | "quit" | "exit", None) => Some(Command::Quit),
        _ => None,
    }
}

/// Controller that listens for commands on a Unix socket
pub struct Controller {
    receiver: Receiver<Command>,
    path: PathBuf,
    _listener_thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Listen on the default socket path
    pub fn new() -> Result<Self> {
        Self::bind(SOCKET_PATH)
    }

    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // Remove a stale socket left by an earlier run
        let _ = std::fs::remove_file(&path);

        let listener = UnixListener::bind(&path)?;
        // Non-blocking so the loop can notice a closed listener
        listener.set_nonblocking(true)?;

        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            Self::listener_loop(listener, sender);
        });

        log::info!("Control socket listening on {}", path.display());

        Ok(Self {
            receiver,
            path,
            _listener_thread: handle,
        })
    }

    fn listener_loop(listener: UnixListener, sender: Sender<Command>) {
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    let sender = sender.clone();
                    thread::spawn(move || {
                        Self::handle_client(stream, sender);
                    });
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                },
                Err(e) => {
                    log::warn!("Control socket closed: {}", e);
                    break;
                },
            }
        }
    }

    fn handle_client(stream: UnixStream, sender: Sender<Command>) {
        // Accepted sockets inherit non-blocking on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            log::warn!("Control client dropped: {}", e);
            return;
        }
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(std::result::Result::ok) {
            match parse_command(&line) {
                Some(cmd) => {
                    if sender.send(cmd).is_err() {
                        break;
                    }
                },
                None if line.trim().is_empty() => {},
                None => log::warn!("Unknown control command: {:?}", line.trim()),
            }
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
