//! Procedural cave world generation.
//!
//! Layout:
//! - `tiles` - tile catalogue and dig/solidity rules
//! - `grid` - tile grids, the foreground/background pair, wire placements
//! - `noise` - seeded Perlin noise channels
//! - `terrain` - the generation pipeline and base terrain
//! - `ores`, `caves`, `decorations` - later pipeline stages
//!
//! Generation is a pure function of seed and dimensions.

pub mod tiles;
pub mod grid;
pub mod noise;
pub mod terrain;
mod ores;
mod caves;
mod decorations;

pub use tiles::{Tile, TREASURE_FLOORS};
pub use grid::{Grid, Layer, PlacedBlock, WorldMap, to_wire_y, from_wire_y};
pub use noise::PerlinNoise;
pub use terrain::{generate, GeneratedWorld, TerrainProfile};
