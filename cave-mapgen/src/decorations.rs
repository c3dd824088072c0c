//! Surface props, trees and clouds.

use rand::Rng;

use crate::terrain::Generator;
use crate::tiles::Tile;

/// Props dropped on top of the surface. Empty keeps some columns bare.
const PROPS: [Tile; 9] = [
    Tile::MeadowYellowFlower,
    Tile::MeadowSmallBush,
    Tile::BeachDryBush,
    Tile::FairytaleFlowerPink,
    Tile::FairytaleFlowerOrange,
    Tile::FairytaleFlowerBlue,
    Tile::FairytaleMushroomDecorationOrange,
    Tile::FairytaleMushroomDecorationRed,
    Tile::Empty,
];

const WOOD: [(Tile, Tile); 3] = [
    (Tile::FactoryWood, Tile::MedievalWoodBg),
    (Tile::DomesticWood, Tile::MedievalWoodBg),
    (Tile::EnvironmentLog, Tile::EnvironmentLogBg),
];

const LEAVES: [(Tile, Tile); 4] = [
    (Tile::BasicGreen, Tile::BasicGreenBg),
    (Tile::GardenLeaves, Tile::GardenLeavesBg),
    (Tile::BrickGreen, Tile::BrickGreenBg),
    (Tile::KeyGreenDoor, Tile::BasicGreenBg),
];

// Cut points on a single uniform draw per column
const PROP_CHANCE: f64 = 0.4;
const TREE_CHANCE: f64 = 0.5;
const CLOUD_CHANCE: f64 = 0.55;

/// Trunk rows below this only get a background
const BARE_TRUNK_ROWS: i32 = 3;
/// Clouds stay at least this far below the top of the world
const CLOUD_HEADROOM: i32 = 10;

/// What a column gets on top of its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoration {
    Prop,
    Tree,
    Cloud,
    Nothing,
}

impl Decoration {
    pub fn from_draw(draw: f64) -> Self {
        if draw < PROP_CHANCE {
            Decoration::Prop
        } else if draw < TREE_CHANCE {
            Decoration::Tree
        } else if draw < CLOUD_CHANCE {
            Decoration::Cloud
        } else {
            Decoration::Nothing
        }
    }
}

impl Generator {
    pub(crate) fn generate_decorations(&mut self) {
        for x in 0..self.width as i32 {
            let Some(surface) = self.terrain.height_at(x) else {
                continue;
            };
            if !self.map.foreground.is_solid(x, surface) {
                continue;
            }

            match Decoration::from_draw(self.decoration_rng.gen::<f64>()) {
                Decoration::Prop => {
                    let prop = PROPS[self.decoration_rng.gen_range(0..PROPS.len())];
                    self.map.foreground.set(x, surface + 1, prop);
                }
                Decoration::Tree => {
                    let height = self.decoration_rng.gen_range(5..9);
                    self.grow_tree(x, surface + 1, height);
                }
                Decoration::Cloud => {
                    let y = (surface + self.decoration_rng.gen_range(15..45))
                        .min(self.height as i32 - CLOUD_HEADROOM);
                    let size = self.decoration_rng.gen_range(2..7);
                    self.place_cloud(x, y, size);
                }
                Decoration::Nothing => {}
            }
        }
    }

    fn grow_tree(&mut self, x: i32, y: i32, height: i32) {
        let (wood, wood_bg) = WOOD[self.rng.gen_range(0..WOOD.len())];
        let (leaves, leaves_bg) = LEAVES[self.rng.gen_range(0..LEAVES.len())];

        for dy in 0..height {
            if dy >= BARE_TRUNK_ROWS {
                self.map.foreground.set(x, y + dy, wood);
            }
            self.map.background.set(x, y + dy, wood_bg);
        }

        // Canopy narrows by one tile per row going up
        let canopy_start = height - 2;
        let canopy_height = self.rng.gen_range(2..4);
        let canopy_top = canopy_start + canopy_height;
        for dy in canopy_start..=canopy_top {
            let radius = canopy_top - dy + 1;
            for dx in -radius..=radius {
                self.map.place(x + dx, y + dy, leaves, Some(leaves_bg));
            }
        }
    }

    fn place_cloud(&mut self, x: i32, y: i32, size: i32) {
        let half_width = size as f64 * 1.5;
        let half_height = size as f64 * 0.75;

        for dx in -(half_width as i32)..=half_width as i32 {
            for dy in -(half_height as i32)..=half_height as i32 {
                let distance = ((dx * dx) as f64 / (half_width * half_width)
                    + (dy * dy) as f64 / (half_height * half_height))
                    .sqrt();
                if distance > 1.0 {
                    continue;
                }
                // ragged edges: the further out, the likelier a gap
                if self.rng.gen::<f64>() > distance * 0.85 {
                    self.map.foreground.set(x + dx, y + dy, Tile::CloudWhiteCenter);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generate;

    #[test]
    fn test_decoration_cut_points() {
        assert_eq!(Decoration::from_draw(0.0), Decoration::Prop);
        assert_eq!(Decoration::from_draw(0.39), Decoration::Prop);
        assert_eq!(Decoration::from_draw(0.4), Decoration::Tree);
        assert_eq!(Decoration::from_draw(0.49), Decoration::Tree);
        assert_eq!(Decoration::from_draw(0.5), Decoration::Cloud);
        assert_eq!(Decoration::from_draw(0.549), Decoration::Cloud);
        assert_eq!(Decoration::from_draw(0.55), Decoration::Nothing);
        assert_eq!(Decoration::from_draw(0.99), Decoration::Nothing);
    }

    #[test]
    fn test_surface_gets_decorated() {
        let world = generate(1000, 200, 200);
        let decorated = (0..200)
            .filter(|&x| {
                let surface = world.terrain.height_at(x).unwrap();
                world.map.foreground.is_solid(x, surface + 1)
            })
            .count();
        assert!(decorated > 0);
    }

    #[test]
    fn test_clouds_in_the_sky() {
        let world = generate(2024, 400, 200);
        for (x, y, tile) in world.map.foreground.iter() {
            if tile == Tile::CloudWhiteCenter {
                let surface = world.terrain.height_at(x).unwrap();
                assert!(y > surface, "cloud at ({}, {}) below surface {}", x, y, surface);
            }
        }
    }
}
