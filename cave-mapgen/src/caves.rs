use crate::terrain::{Generator, Placement};
use crate::tiles::Tile;

/// Rows within this distance of the surface only get sparse cave mouths
const NEAR_SURFACE_BAND: i32 = 10;
/// Carves at or below this row fill with lava
const LAVA_CEILING: i32 = 20;

const MOUTH_DENSITY: f32 = 0.35;
const MOUTH_OPENING: f32 = 0.1;
const CAVE_DENSITY: f32 = 0.15;
const EDGE_THRESHOLD: f32 = 0.2;

impl Generator {
    pub(crate) fn generate_caves(&mut self) {
        let density_noise = self.noise(0.1);
        let edge_noise = self.noise(0.3);
        let opening_noise = self.noise(0.01);

        self.for_each_cell(|gen, x, y| {
            let density = density_noise.get(x as f32, y as f32);

            if y >= gen.surface(x) - NEAR_SURFACE_BAND {
                if density > MOUTH_DENSITY && opening_noise.get(x as f32, y as f32) > MOUTH_OPENING {
                    return Some(Placement::foreground(Tile::Empty));
                }
                return None;
            }

            let edge = edge_noise.get(x as f32, y as f32);
            if density > CAVE_DENSITY || (density > 0.0 && edge > EDGE_THRESHOLD) {
                return Some(carve(y));
            }
            None
        });
    }
}

fn carve(y: i32) -> Placement {
    if y <= LAVA_CEILING {
        Placement::both(Tile::LiquidLava, Tile::LavaDarkRedBg)
    } else {
        Placement::foreground(Tile::Empty)
    }
}
