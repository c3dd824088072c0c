//! World generation pipeline.
//!
//! Stages run in order against the same [`WorldMap`], later stages
//! overwriting earlier ones:
//! 1. base terrain (surface, depth bands, filler, rock patches)
//! 2. ores (`ores.rs`)
//! 3. caves (`caves.rs`)
//! 4. surface decorations (`decorations.rs`)
//! 5. floor row, spawn and corner markers
//!
//! Generation rows grow upward from the bottom of the world.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::WorldMap;
use crate::noise::PerlinNoise;
use crate::tiles::Tile;

/// Distance from the top of the world to the average surface
const SKY_HEIGHT: i32 = 40;
/// Surface amplitude around the sea height
const SURFACE_AMPLITUDE: f32 = 20.0;
/// Rows above this never get filler randomisation
const RARE_FILLER_CEILING: i32 = 50;
/// Rows at or below this are always rare filler
const RARE_FILLER_FLOOR: i32 = 10;
/// Rock patches only appear below this row
const ROCK_PATCH_CEILING: i32 = 140;

/// Surface row for every column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainProfile {
    heights: Vec<i32>,
}

impl TerrainProfile {
    fn new(width: usize) -> Self {
        Self { heights: vec![0; width] }
    }

    pub fn height_at(&self, x: i32) -> Option<i32> {
        usize::try_from(x).ok().and_then(|x| self.heights.get(x).copied())
    }

    pub fn heights(&self) -> &[i32] {
        &self.heights
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

/// Output of one generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedWorld {
    pub seed: u32,
    pub map: WorldMap,
    pub terrain: TerrainProfile,
    pub spawn_x: i32,
    pub spawn_y: i32,
}

/// Generate a world. Identical arguments always give identical worlds.
pub fn generate(seed: u32, width: usize, height: usize) -> GeneratedWorld {
    let mut generator = Generator::new(seed, width, height);

    generator.generate_base_terrain();
    generator.generate_ores();
    generator.generate_caves();
    generator.generate_decorations();
    let (spawn_x, spawn_y) = generator.place_markers();

    GeneratedWorld {
        seed,
        map: generator.map,
        terrain: generator.terrain,
        spawn_x,
        spawn_y,
    }
}

/// Foreground/background pair produced for one cell by a stage
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Placement {
    pub foreground: Option<Tile>,
    pub background: Option<Tile>,
}

impl Placement {
    pub fn both(foreground: Tile, background: Tile) -> Self {
        Self { foreground: Some(foreground), background: Some(background) }
    }

    pub fn foreground(tile: Tile) -> Self {
        Self { foreground: Some(tile), background: None }
    }
}

pub(crate) struct Generator {
    pub seed: u32,
    pub width: usize,
    pub height: usize,
    pub map: WorldMap,
    pub terrain: TerrainProfile,
    /// Main stream: filler, patches, ore walks, tree and cloud shapes, spawn
    pub rng: ChaCha8Rng,
    /// Decoration decisions draw from their own stream
    pub decoration_rng: ChaCha8Rng,
}

impl Generator {
    fn new(seed: u32, width: usize, height: usize) -> Self {
        let mut decoration_rng = ChaCha8Rng::seed_from_u64(seed as u64);
        decoration_rng.set_stream(1);

        Self {
            seed,
            width,
            height,
            map: WorldMap::new(width, height),
            terrain: TerrainProfile::new(width),
            rng: ChaCha8Rng::seed_from_u64(seed as u64),
            decoration_rng,
        }
    }

    /// A noise channel seeded with the world seed
    pub fn noise(&self, frequency: f32) -> PerlinNoise {
        PerlinNoise::new(self.seed, frequency)
    }

    pub fn surface(&self, x: i32) -> i32 {
        self.terrain.height_at(x).unwrap_or(0)
    }

    /// Run `f` over every cell column by column, bottom to top, applying
    /// whatever it returns.
    pub fn for_each_cell<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Self, i32, i32) -> Option<Placement>,
    {
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                let Some(placement) = f(self, x, y) else {
                    continue;
                };
                if let Some(fg) = placement.foreground {
                    self.map.foreground.set(x, y, fg);
                }
                if let Some(bg) = placement.background {
                    self.map.background.set(x, y, bg);
                }
            }
        }
    }

    fn generate_base_terrain(&mut self) {
        let surface_noise = self.noise(0.02);
        let depth_noise = self.noise(0.1);
        let patch_noise = self.noise(0.08);
        let sea_height = self.height as i32 - SKY_HEIGHT;

        for x in 0..self.width as i32 {
            let surface = (surface_noise.get(x as f32, 0.0) * SURFACE_AMPLITUDE) as i32 + sea_height;
            self.terrain.heights[x as usize] = surface;
            self.map.place(x, surface, Tile::GrassBrickMiddle, Some(Tile::GardenGrassBg));

            let depth = (depth_noise.get(x as f32, 0.0) * 20.0).max(-5.0) as i32 + 8;
            let mut band_top = surface - depth;
            for dy in 0..depth {
                self.map.place(x, band_top + dy, Tile::BrickBrown, Some(Tile::BrickBrownBg));
            }

            let depth = (depth_noise.get(x as f32, 100.0) * 15.0).max(-2.0) as i32 + 5;
            band_top -= depth;
            for dy in 0..depth {
                self.map.place(x, band_top + dy, Tile::BrickOlive, Some(Tile::BrickOliveBg));
            }

            // Rare filler gets likelier toward the bottom
            for y in (0..=band_top).rev() {
                let filler = if y > RARE_FILLER_CEILING {
                    Tile::BrickGray
                } else if y <= RARE_FILLER_FLOOR || y <= self.rng.gen_range(0..RARE_FILLER_CEILING) {
                    Tile::BrickBlack
                } else {
                    Tile::BrickGray
                };
                self.map.place(x, y, filler, Some(Tile::BrickGrayBg));
            }

            for y in surface + 1..self.height as i32 {
                self.map.background.set(x, y, Tile::PastelBlueBg);
            }
        }

        self.for_each_cell(|gen, x, y| {
            if y >= ROCK_PATCH_CEILING {
                return None;
            }
            if gen.rng.gen_range(0..ROCK_PATCH_CEILING) < y {
                return None;
            }

            let value = patch_noise.get(x as f32 + 3432.0, y as f32 + 432.0);
            if value < 0.02 {
                Some(Placement::both(Tile::StoneGray, Tile::StoneGrayBg))
            } else if value < 0.03 {
                Some(Placement::both(Tile::StoneBlue, Tile::StoneBlueBg))
            } else if value < 0.04 {
                Some(Placement::both(Tile::StoneGreen, Tile::StoneGreenBg))
            } else {
                None
            }
        });
    }

    /// Floor row, spawn point with its floor, and hazard corners.
    fn place_markers(&mut self) -> (i32, i32) {
        let width = self.width as i32;
        let height = self.height as i32;

        for x in 0..width {
            self.map.foreground.set(x, 0, Tile::GenericYellow);
        }

        let spawn_x = self.rng.gen_range(0..(width / 2).max(1)) + width / 4;
        let spawn_y = self.surface(spawn_x) + 3;

        self.map.foreground.set(spawn_x, spawn_y, Tile::ToolSpawnLobby);
        for x in spawn_x - 1..=spawn_x + 1 {
            if let Some(surface) = self.terrain.height_at(x) {
                self.map.foreground.set(x, surface, Tile::BeveledYellow);
            }
        }

        for (x, y) in [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)] {
            self.map.foreground.set(x, y, Tile::GenericStripedHazardBlack);
        }

        (spawn_x, spawn_y)
    }
}
