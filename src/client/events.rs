use serde::{Deserialize, Serialize};

use crate::state::{PixelPosition, PlayerId};

/// Events delivered by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Player entered the world
    PlayerJoined {
        player_id: PlayerId,
        username: String,
        #[serde(default)]
        position: PixelPosition,
        #[serde(default)]
        godmode: bool,
    },

    /// Player left the world
    PlayerLeft {
        player_id: PlayerId,
    },

    /// Chat line from a player
    PlayerChat {
        player_id: PlayerId,
        text: String,
    },

    /// Player moved; a non-zero delta against a solid tile is a dig
    PlayerMoved {
        player_id: PlayerId,
        position: PixelPosition,
        #[serde(default)]
        horizontal: i32,
        #[serde(default)]
        vertical: i32,
    },

    /// Player toggled god mode
    PlayerGodMode {
        player_id: PlayerId,
        enabled: bool,
    },

    /// Message from the server itself
    SystemMessage {
        text: String,
    },
}

/// Key of the handler table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerJoined,
    PlayerLeft,
    PlayerChat,
    PlayerMoved,
    PlayerGodMode,
    SystemMessage,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::PlayerJoined,
        EventKind::PlayerLeft,
        EventKind::PlayerChat,
        EventKind::PlayerMoved,
        EventKind::PlayerGodMode,
        EventKind::SystemMessage,
    ];
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::PlayerJoined { .. } => EventKind::PlayerJoined,
            InboundEvent::PlayerLeft { .. } => EventKind::PlayerLeft,
            InboundEvent::PlayerChat { .. } => EventKind::PlayerChat,
            InboundEvent::PlayerMoved { .. } => EventKind::PlayerMoved,
            InboundEvent::PlayerGodMode { .. } => EventKind::PlayerGodMode,
            InboundEvent::SystemMessage { .. } => EventKind::SystemMessage,
        }
    }

    /// Parse one JSON line as produced by the console transport's peer.
    pub fn from_json_line(line: &str) -> crate::error::Result<Self> {
        serde_json::from_str(line.trim())
            .map_err(|e| crate::error::Error::Transport(format!("bad event: {}", e)))
    }
}
