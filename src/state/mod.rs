pub mod player;

pub use player::{PixelPosition, Player, PlayerDirectory, PlayerId, TILE_PIXELS};
