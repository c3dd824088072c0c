use rand::seq::SliceRandom;
use rand::Rng;

use cave_mapgen::{Tile, WorldMap, TREASURE_FLOORS};

use crate::error::{Error, Result};

/// Rows kept free of treasure below the top of the world
const TOP_MARGIN: i32 = 60;

/// Fewer players means more chests to find.
pub fn treasure_count(players: usize) -> usize {
    6usize.saturating_sub(players).max(2)
}

/// Hide `count` chests on the map, each on a fresh floor.
///
/// Returns the chest positions in generation coordinates.
pub fn place_treasures<R: Rng>(
    map: &mut WorldMap,
    count: usize,
    rng: &mut R,
    max_attempts: u32,
) -> Result<Vec<(i32, i32)>> {
    let mut placed = Vec::with_capacity(count);
    for _ in 0..count {
        let (x, y) = find_spot(map, rng, max_attempts)?;
        let floor = TREASURE_FLOORS.choose(rng).copied().unwrap_or(Tile::BeveledGreen);

        map.place(x, y, Tile::TREASURE, None);
        for fx in x - 1..=x + 1 {
            map.place(fx, y - 1, floor, None);
        }
        placed.push((x, y));
    }
    Ok(placed)
}

/// Sample the inner 80% of columns until an open cell turns up, then let it
/// settle onto the floor of its pocket.
fn find_spot<R: Rng>(map: &WorldMap, rng: &mut R, max_attempts: u32) -> Result<(i32, i32)> {
    let width = map.width() as i32;
    let height = map.height() as i32;
    let min_x = width / 10;
    let span_x = (width * 8 / 10).max(1);
    let max_y = (height - TOP_MARGIN).max(1);

    for _ in 0..max_attempts {
        let x = min_x + rng.gen_range(0..span_x);
        let mut y = rng.gen_range(1..=max_y);
        if !map.foreground.in_bounds(x, y) || map.foreground.is_solid(x, y) {
            continue;
        }
        while y > 1 && !map.foreground.is_solid(x, y - 1) {
            y -= 1;
        }
        // the new floor must not bury an earlier chest
        if (x - 1..=x + 1).any(|fx| map.foreground.get(fx, y - 1).is_treasure()) {
            continue;
        }
        return Ok((x, y));
    }
    Err(Error::TreasurePlacement { attempts: max_attempts })
}
