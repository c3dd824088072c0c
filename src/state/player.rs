use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::client::events::InboundEvent;

/// Player identifier
pub type PlayerId = u32;

/// Size of one tile in pixels
pub const TILE_PIXELS: f64 = 16.0;

/// Position in pixels, wire orientation (rows grow downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

impl PixelPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_tile(x: i32, y: i32) -> Self {
        Self {
            x: x as f64 * TILE_PIXELS,
            y: y as f64 * TILE_PIXELS,
        }
    }

    /// Tile under this position, in wire coordinates
    pub fn tile(&self) -> (i32, i32) {
        (
            (self.x / TILE_PIXELS).floor() as i32,
            (self.y / TILE_PIXELS).floor() as i32,
        )
    }
}

/// Player state
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub position: PixelPosition,
    pub godmode: bool,
}

impl Player {
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            position: PixelPosition::default(),
            godmode: false,
        }
    }
}

/// Everyone currently in the world, in join order
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    players: IndexMap<PlayerId, Player>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn find_by_name(&self, username: &str) -> Option<&Player> {
        self.players.values().find(|p| p.username.eq_ignore_ascii_case(username))
    }

    /// Keep the directory in sync with an inbound event.
    pub fn apply(&mut self, event: &InboundEvent) {
        match event {
            InboundEvent::PlayerJoined { player_id, username, position, godmode } => {
                self.insert(Player {
                    id: *player_id,
                    username: username.clone(),
                    position: *position,
                    godmode: *godmode,
                });
            }
            InboundEvent::PlayerLeft { player_id } => {
                self.remove(*player_id);
            }
            InboundEvent::PlayerMoved { player_id, position, .. } => {
                if let Some(player) = self.players.get_mut(player_id) {
                    player.position = *position;
                }
            }
            InboundEvent::PlayerGodMode { player_id, enabled } => {
                if let Some(player) = self.players.get_mut(player_id) {
                    player.godmode = *enabled;
                }
            }
            InboundEvent::PlayerChat { .. } | InboundEvent::SystemMessage { .. } => {}
        }
    }
}
