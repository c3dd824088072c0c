//! Fixed-size tile storage and the foreground/background world pair.
//!
//! All coordinates here are generation coordinates: row 0 is the bottom of
//! the world. Conversion to the transport's downward-growing rows happens in
//! [`to_wire_y`] and only at emission time.

use serde::{Deserialize, Serialize};

use crate::tiles::Tile;

/// World layer a tile lives on, carried as its server index on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Layer {
    Background,
    Foreground,
}

impl Layer {
    /// Layer index used by the game server
    pub fn as_wire(self) -> u8 {
        match self {
            Layer::Background => 0,
            Layer::Foreground => 1,
        }
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> u8 {
        layer.as_wire()
    }
}

impl TryFrom<u8> for Layer {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Layer::Background),
            1 => Ok(Layer::Foreground),
            other => Err(format!("unknown layer {}", other)),
        }
    }
}

/// A single tile change addressed in wire coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBlock {
    pub x: i32,
    pub y: i32,
    pub layer: Layer,
    pub tile: Tile,
}

impl PlacedBlock {
    pub fn new(x: i32, y: i32, layer: Layer, tile: Tile) -> Self {
        Self { x, y, layer, tile }
    }
}

/// Convert a generation row into the row the transport expects.
#[inline]
pub fn to_wire_y(height: usize, y: i32) -> i32 {
    height as i32 - y - 1
}

/// Convert a transport row back into a generation row. `None` when the row
/// is too far off the map to be represented.
#[inline]
pub fn from_wire_y(height: usize, wire_y: i32) -> Option<i32> {
    i32::try_from(height).ok()?.checked_sub(wire_y)?.checked_sub(1)
}

/// Width × height tile container, default [`Tile::Empty`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width + x as usize
    }

    /// Writes outside the grid are dropped.
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        self.tiles[idx] = tile;
    }

    /// Reads outside the grid see [`Tile::Empty`].
    pub fn get(&self, x: i32, y: i32) -> Tile {
        if !self.in_bounds(x, y) {
            return Tile::Empty;
        }
        self.tiles[self.index(x, y)]
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_solid()
    }

    /// Every cell of the grid as a wire placement on `layer`.
    pub fn placements(&self, layer: Layer) -> Vec<PlacedBlock> {
        let mut blocks = Vec::with_capacity(self.tiles.len());
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                blocks.push(PlacedBlock::new(x, to_wire_y(self.height, y), layer, self.get(x, y)));
            }
        }
        blocks
    }

    /// Iterate over `(x, y, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, &tile)| {
            ((i % self.width) as i32, (i / self.width) as i32, tile)
        })
    }
}

/// Foreground and background grids produced by one generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldMap {
    pub foreground: Grid,
    pub background: Grid,
}

impl WorldMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            foreground: Grid::new(width, height),
            background: Grid::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.foreground.width()
    }

    pub fn height(&self) -> usize {
        self.foreground.height()
    }

    pub fn layer(&self, layer: Layer) -> &Grid {
        match layer {
            Layer::Background => &self.background,
            Layer::Foreground => &self.foreground,
        }
    }

    /// Place a foreground tile and, if given, its background counterpart.
    pub fn place(&mut self, x: i32, y: i32, foreground: Tile, background: Option<Tile>) {
        self.foreground.set(x, y, foreground);
        if let Some(bg) = background {
            self.background.set(x, y, bg);
        }
    }

    /// Both complete layers, foreground first.
    pub fn placements(&self) -> Vec<PlacedBlock> {
        let mut blocks = self.foreground.placements(Layer::Foreground);
        blocks.extend(self.background.placements(Layer::Background));
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut grid = Grid::new(4, 3);
        grid.set(-1, 0, Tile::BrickGray);
        grid.set(4, 0, Tile::BrickGray);
        grid.set(0, 3, Tile::BrickGray);
        assert!(grid.iter().all(|(_, _, t)| t == Tile::Empty));
        assert_eq!(grid.get(10, 10), Tile::Empty);
    }

    #[test]
    fn test_set_get() {
        let mut grid = Grid::new(4, 3);
        grid.set(3, 2, Tile::BrickBlack);
        assert_eq!(grid.get(3, 2), Tile::BrickBlack);
        assert!(grid.is_solid(3, 2));
        assert!(!grid.is_solid(2, 2));
    }

    #[test]
    fn test_placements_invert_rows() {
        let mut grid = Grid::new(2, 5);
        grid.set(1, 0, Tile::GenericYellow);
        let blocks = grid.placements(Layer::Foreground);
        assert_eq!(blocks.len(), 10);
        let yellow: Vec<_> = blocks.iter().filter(|b| b.tile == Tile::GenericYellow).collect();
        assert_eq!(yellow.len(), 1);
        assert_eq!((yellow[0].x, yellow[0].y), (1, 4));
    }

    #[test]
    fn test_wire_conversion() {
        assert_eq!(to_wire_y(200, 0), 199);
        assert_eq!(to_wire_y(200, 199), 0);
        assert_eq!(from_wire_y(200, to_wire_y(200, 37)), Some(37));
        assert_eq!(from_wire_y(200, i32::MIN), None);
        assert_eq!(from_wire_y(200, i32::MAX), Some(200 - i32::MAX - 1));
    }

    #[test]
    fn test_layer_uses_server_index() {
        let block = PlacedBlock::new(2, 3, Layer::Foreground, Tile::BrickGray);
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"layer\":1"));

        let back: Layer = serde_json::from_str("0").unwrap();
        assert_eq!(back, Layer::Background);
        assert!(serde_json::from_str::<Layer>("2").is_err());
    }

    #[test]
    fn test_world_map_layers_are_independent() {
        let mut map = WorldMap::new(3, 3);
        map.place(1, 1, Tile::Empty, Some(Tile::BrickGrayBg));
        assert!(!map.foreground.is_solid(1, 1));
        assert_eq!(map.layer(Layer::Background).get(1, 1), Tile::BrickGrayBg);
        assert_eq!(map.placements().len(), 18);
    }
}
