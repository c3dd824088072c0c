//! Fog-of-war bookkeeping over one attached [`WorldMap`].
//!
//! Coordinates are generation coordinates; rows are flipped to wire rows
//! only when blocks are emitted.

use cave_mapgen::{to_wire_y, Layer, PlacedBlock, Tile, WorldMap};

/// Side of the square revealed around every flood boundary tile
pub const EDGE_RIM_SIZE: i32 = 3;

/// Per-cell boolean flags sized to a map
#[derive(Debug, Clone, Default)]
struct FlagGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl FlagGrid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn get(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map(|i| self.cells[i]).unwrap_or(false)
    }

    fn set(&mut self, x: i32, y: i32, value: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    fn clear(&mut self) {
        self.cells.fill(false);
    }

    fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Discovery state for the attached map plus the reveal queue
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    map: WorldMap,
    /// Ever revealed since the last attach or hide
    discovered: FlagGrid,
    /// Already expanded by a flood pass
    flooded: FlagGrid,
    /// Discovered since the last flush, drained LIFO
    pending: Vec<(i32, i32)>,
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryEngine {
    /// An engine with an empty 0×0 map; [`attach`](Self::attach) a real one.
    pub fn new() -> Self {
        Self {
            map: WorldMap::new(0, 0),
            discovered: FlagGrid::default(),
            flooded: FlagGrid::default(),
            pending: Vec::new(),
        }
    }

    /// Take over `map` and drop every bit of previous discovery state.
    pub fn attach(&mut self, map: WorldMap) {
        let (width, height) = (map.width(), map.height());
        self.map = map;
        self.discovered = FlagGrid::new(width, height);
        self.flooded = FlagGrid::new(width, height);
        self.pending.clear();
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn width(&self) -> usize {
        self.map.width()
    }

    pub fn height(&self) -> usize {
        self.map.height()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.map.foreground.in_bounds(x, y)
    }

    pub fn is_discovered(&self, x: i32, y: i32) -> bool {
        self.discovered.get(x, y)
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.count()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Foreground tile as players currently see it
    pub fn visible_tile(&self, x: i32, y: i32) -> Tile {
        if self.is_discovered(x, y) {
            self.map.foreground.get(x, y)
        } else {
            Tile::HIDDEN
        }
    }

    /// Reveal one tile. Out of range or already discovered is a no-op.
    pub fn discover_tile(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) || self.discovered.get(x, y) {
            return;
        }
        self.discovered.set(x, y, true);
        self.pending.push((x, y));
    }

    /// Reveal the connected open area around (x, y) plus a rim of the walls
    /// enclosing it.
    ///
    /// Uses explicit stacks: open areas can be far larger than the call
    /// stack allows for recursion.
    pub fn flood_discovery(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }

        let mut to_check = vec![(x, y)];
        let mut edges = vec![(x, y)];

        while let Some((px, py)) = to_check.pop() {
            if self.flooded.get(px, py) {
                continue;
            }
            self.flooded.set(px, py, true);
            self.discover_tile(px, py);

            for dx in -1..=1 {
                for dy in -1..=1 {
                    let (nx, ny) = (px + dx, py + dy);
                    if !self.in_bounds(nx, ny) {
                        continue;
                    }
                    if self.map.foreground.is_solid(nx, ny) {
                        // walls are revealed, never expanded
                        if !self.discovered.get(nx, ny) {
                            edges.push((nx, ny));
                        }
                    } else if !self.flooded.get(nx, ny) {
                        to_check.push((nx, ny));
                    }
                }
            }
        }

        for (ex, ey) in edges {
            self.cubic_discovery(ex, ey, EDGE_RIM_SIZE);
        }
    }

    /// Reveal the `size`×`size` square centred on (x, y), solid or not.
    pub fn cubic_discovery(&mut self, x: i32, y: i32, size: i32) {
        let half = size / 2;
        for dx in -half..=half {
            for dy in -half..=half {
                self.discover_tile(x + dx, y + dy);
            }
        }
    }

    /// Overwrite a cell of the attached map. Discovered cells are queued
    /// again so players see the change on the next flush.
    pub fn place(&mut self, x: i32, y: i32, foreground: Tile, background: Option<Tile>) {
        if !self.in_bounds(x, y) {
            return;
        }
        self.map.place(x, y, foreground, background);
        if self.discovered.get(x, y) {
            self.pending.push((x, y));
        }
    }

    pub fn reveal_all(&mut self) {
        for x in 0..self.width() as i32 {
            for y in 0..self.height() as i32 {
                self.discover_tile(x, y);
            }
        }
    }

    /// Forget everything revealed and return a full fog overwrite.
    ///
    /// The fog tile is see-through, so the background of every cell is
    /// cleared along with it. The overwrite bypasses the pending queue, which
    /// is emptied: nothing queued before the hide may leak through afterwards.
    pub fn hide_all(&mut self) -> Vec<PlacedBlock> {
        self.discovered.clear();
        self.flooded.clear();
        self.pending.clear();

        let height = self.height();
        let mut blocks = Vec::with_capacity(self.width() * height * 2);
        for x in 0..self.width() as i32 {
            for y in 0..height as i32 {
                let wire_y = to_wire_y(height, y);
                blocks.push(PlacedBlock::new(x, wire_y, Layer::Foreground, Tile::HIDDEN));
                blocks.push(PlacedBlock::new(x, wire_y, Layer::Background, Tile::Empty));
            }
        }
        blocks
    }

    /// Drain the queue into wire placements. Background tiles are only sent
    /// where they differ from empty.
    pub fn take_block_update(&mut self) -> Vec<PlacedBlock> {
        let height = self.height();
        let mut blocks = Vec::with_capacity(self.pending.len());

        while let Some((x, y)) = self.pending.pop() {
            let wire_y = to_wire_y(height, y);
            blocks.push(PlacedBlock::new(x, wire_y, Layer::Foreground, self.map.foreground.get(x, y)));

            let background = self.map.background.get(x, y);
            if background != Tile::Empty {
                blocks.push(PlacedBlock::new(x, wire_y, Layer::Background, background));
            }
        }
        blocks
    }
}
