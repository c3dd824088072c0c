//! Cave treasure bot
//!
//! Runs a "find the treasure" minigame in a tile-based multiplayer world:
//! generates a fresh cave per round, keeps it under fog-of-war and reveals
//! it as players dig.

pub mod error;
pub mod config;
pub mod state;
pub mod client;
pub mod discovery;
pub mod game;
pub use cave_mapgen as mapgen;

pub use error::{Error, Result};
pub use config::{BotConfig, RoundConfig};
pub use state::{PixelPosition, Player, PlayerDirectory, PlayerId};
pub use client::{
    AdminCommand, ConsoleTransport, EventKind, InboundEvent, OutboundMessage,
    RecordingTransport, Transport,
};
pub use discovery::{DiscoveryEngine, Vision};
pub use game::{CaveBot, Control, GameContext, RoundOrchestrator, RoundState};
