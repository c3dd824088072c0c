use rand::Rng;

use crate::terrain::Generator;
use crate::tiles::Tile;

/// Noise level above which an ore patch is seeded
const ORE_THRESHOLD: f32 = 0.76;
/// Ores never appear within this many rows of the surface
const SURFACE_CLEARANCE: i32 = 20;

/// One ore type and where it may appear
struct OreKind {
    tile: Tile,
    /// Sample offset on the shared ore noise channel
    noise_offset: f32,
    min_row: i32,
    max_row: i32,
    /// Walk length range, max exclusive
    walk: (i64, i64),
}

const ORES: [OreKind; 3] = [
    OreKind { tile: Tile::MineralsOrange, noise_offset: 0.0, min_row: 25, max_row: 150, walk: (4, 8) },
    OreKind { tile: Tile::MineralsGreen, noise_offset: 100.0, min_row: 50, max_row: i32::MAX, walk: (2, 6) },
    OreKind { tile: Tile::MineralsCyan, noise_offset: 200.0, min_row: 100, max_row: i32::MAX, walk: (1, 2) },
];

impl Generator {
    pub(crate) fn generate_ores(&mut self) {
        let ore_noise = self.noise(0.5);

        for ore in &ORES {
            self.for_each_cell(|gen, x, y| {
                if y >= gen.surface(x) - SURFACE_CLEARANCE {
                    return None;
                }
                let value = ore_noise.get(x as f32, y as f32 + ore.noise_offset);
                if value > ORE_THRESHOLD && y >= ore.min_row && y <= ore.max_row {
                    gen.grow_patch(x, y, ore.walk, ore.tile);
                }
                None
            });
        }
    }

    /// Random walk from (x, y). Each axis has its own step odds so patches
    /// drift rather than wander evenly.
    fn grow_patch(&mut self, mut x: i32, mut y: i32, (min, max): (i64, i64), tile: Tile) {
        let steps = self.rng.gen_range(min..max);
        for _ in 0..steps {
            self.map.foreground.set(x, y, tile);

            if self.rng.gen::<f64>() > 0.75 {
                x += 1;
            }
            if self.rng.gen::<f64>() > 0.5 {
                x -= 1;
            }
            if self.rng.gen::<f64>() > 0.25 {
                y += 1;
            } else {
                y -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::terrain::generate;
    use crate::tiles::Tile;

    fn is_ore(tile: Tile) -> bool {
        matches!(tile, Tile::MineralsOrange | Tile::MineralsGreen | Tile::MineralsCyan)
    }

    #[test]
    fn test_ores_stay_below_surface() {
        for seed in [1, 1000, 4242] {
            let world = generate(seed, 200, 200);
            for (x, y, tile) in world.map.foreground.iter() {
                if is_ore(tile) {
                    // a walk can climb a few rows above its seed cell
                    let surface = world.terrain.height_at(x).unwrap();
                    assert!(y < surface, "ore at ({}, {}) above surface {}", x, y, surface);
                }
            }
        }
    }

    #[test]
    fn test_cyan_is_deep_only() {
        let world = generate(99, 200, 200);
        for (_, y, tile) in world.map.foreground.iter() {
            if tile == Tile::MineralsCyan {
                // seeded at row >= 100, walks at most one step
                assert!(y >= 99);
            }
        }
    }
}
