//! Outbound side of the game session.
//!
//! The bot only talks to the world through [`Transport`]. Connection
//! handling, authentication and packet chunking belong to the implementation.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use cave_mapgen::PlacedBlock;

use crate::error::{Error, Result};

/// Blocks per console line, mirrors the server's per-packet limit
pub const BATCH_CHUNK: usize = 400;

/// Session operations the bot needs
pub trait Transport: Send + Sync {
    fn connect(&self, world_id: &str) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Chat to everyone. `prefixed` adds the bot's chat prefix; commands
    /// such as `/resetplayer` must go unprefixed.
    fn send_chat(&self, text: &str, prefixed: bool) -> Result<()>;

    fn send_direct_message(&self, username: &str, text: &str) -> Result<()>;

    fn send_batch(&self, blocks: Vec<PlacedBlock>) -> Result<()>;
}

/// Everything a transport can be asked to send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Connect { world_id: String },
    Chat { text: String, prefixed: bool },
    DirectMessage { username: String, text: String },
    Blocks { blocks: Vec<PlacedBlock> },
}

/// In-memory transport that records every message
#[derive(Debug)]
pub struct RecordingTransport {
    connected: AtomicBool,
    messages: Mutex<Vec<OutboundMessage>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// Starts out connected so the round loop can run without a session.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }

    /// Chat lines in send order, prefixed or not
    pub fn chats(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Chat { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn direct_messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::DirectMessage { username, text } => Some((username.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    /// All placed blocks across batches, in send order
    pub fn blocks(&self) -> Vec<PlacedBlock> {
        self.messages
            .lock()
            .iter()
            .flat_map(|m| match m {
                OutboundMessage::Blocks { blocks } => blocks.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    fn record(&self, message: OutboundMessage) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.messages.lock().push(message);
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn connect(&self, world_id: &str) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        self.record(OutboundMessage::Connect { world_id: world_id.to_string() })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_chat(&self, text: &str, prefixed: bool) -> Result<()> {
        self.record(OutboundMessage::Chat { text: text.to_string(), prefixed })
    }

    fn send_direct_message(&self, username: &str, text: &str) -> Result<()> {
        self.record(OutboundMessage::DirectMessage {
            username: username.to_string(),
            text: text.to_string(),
        })
    }

    fn send_batch(&self, blocks: Vec<PlacedBlock>) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        self.record(OutboundMessage::Blocks { blocks })
    }
}

/// Writes outbound messages as JSON lines, for piping into a session relay
pub struct ConsoleTransport {
    prefix: String,
    connected: AtomicBool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleTransport {
    pub fn new(prefix: impl Into<String>, out: Box<dyn Write + Send>) -> Self {
        Self {
            prefix: prefix.into(),
            connected: AtomicBool::new(false),
            out: Mutex::new(out),
        }
    }

    pub fn stdout(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Box::new(std::io::stdout()))
    }

    fn write(&self, message: &OutboundMessage) -> Result<()> {
        let json = serde_json::to_string(message).map_err(|e| Error::Transport(e.to_string()))?;
        let mut out = self.out.lock();
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

impl Transport for ConsoleTransport {
    fn connect(&self, world_id: &str) -> Result<()> {
        self.write(&OutboundMessage::Connect { world_id: world_id.to_string() })?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send_chat(&self, text: &str, prefixed: bool) -> Result<()> {
        self.ensure_connected()?;
        let text = if prefixed {
            format!("{}{}", self.prefix, text)
        } else {
            text.to_string()
        };
        self.write(&OutboundMessage::Chat { text, prefixed })
    }

    fn send_direct_message(&self, username: &str, text: &str) -> Result<()> {
        self.ensure_connected()?;
        self.write(&OutboundMessage::DirectMessage {
            username: username.to_string(),
            text: text.to_string(),
        })
    }

    fn send_batch(&self, blocks: Vec<PlacedBlock>) -> Result<()> {
        self.ensure_connected()?;
        for chunk in blocks.chunks(BATCH_CHUNK) {
            self.write(&OutboundMessage::Blocks { blocks: chunk.to_vec() })?;
        }
        Ok(())
    }
}
