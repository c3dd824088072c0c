use tracing::{debug, info};

use cave_mapgen::{from_wire_y, Tile};

use crate::error::Result;
use crate::state::{PixelPosition, PlayerId};

use super::round::WinnerRef;
use super::GameContext;

/// Side of the square revealed around a dig and around each chest at round end
pub const DIG_REVEAL_SIZE: i32 = 5;

/// What a move against a tile turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigOutcome {
    /// Out of range, not allowed, or nothing to do
    Ignored,
    /// Fog lifted around the tile, and the tile removed if it was visible
    Dug,
    /// A climbing aid was placed in open air
    Climb,
    /// The tile was a revealed chest
    TreasureFound,
}

/// Turn a player's move into a dig.
///
/// `horizontal` and `vertical` are the tile delta the player pushed against,
/// in wire orientation.
pub fn handle_move(
    ctx: &GameContext,
    player_id: PlayerId,
    position: PixelPosition,
    horizontal: i32,
    vertical: i32,
) -> Result<DigOutcome> {
    if horizontal == 0 && vertical == 0 {
        return Ok(DigOutcome::Ignored);
    }
    if !ctx.round.lock().dig_permitted {
        return Ok(DigOutcome::Ignored);
    }
    let username = match ctx.players.read().get(player_id) {
        Some(player) if !player.godmode => player.username.clone(),
        _ => return Ok(DigOutcome::Ignored),
    };

    let (tile_x, tile_y) = position.tile();
    let (Some(wire_x), Some(wire_y)) = (tile_x.checked_add(horizontal), tile_y.checked_add(vertical)) else {
        return Ok(DigOutcome::Ignored);
    };
    let climbing = horizontal == 0 && vertical == -1;

    let outcome = ctx.vision.update(|engine| {
        let x = wire_x;
        let Some(y) = from_wire_y(engine.height(), wire_y).filter(|&y| engine.in_bounds(x, y)) else {
            return DigOutcome::Ignored;
        };

        let seen = engine.visible_tile(x, y);
        if seen.can_dig() {
            if engine.is_discovered(x, y) && !seen.is_treasure() {
                engine.place(x, y, Tile::Empty, None);
            }

            let half = DIG_REVEAL_SIZE / 2;
            engine.cubic_discovery(x, y, DIG_REVEAL_SIZE);
            for dx in -half..=half {
                for dy in -half..=half {
                    let (nx, ny) = (x + dx, y + dy);
                    if engine.in_bounds(nx, ny) && !engine.map().foreground.is_solid(nx, ny) {
                        engine.flood_discovery(nx, ny);
                    }
                }
            }

            if seen.is_treasure() {
                DigOutcome::TreasureFound
            } else {
                DigOutcome::Dug
            }
        } else if seen == Tile::Empty && climbing {
            engine.place(x, y, Tile::GravityDot, Some(Tile::PirateWoodPlankDarkBrownBg));
            DigOutcome::Climb
        } else {
            DigOutcome::Ignored
        }
    })?;

    debug!(player = %username, x = wire_x, y = wire_y, ?outcome, "dig");
    if outcome == DigOutcome::TreasureFound {
        end_round(ctx, player_id, &username)?;
    }
    Ok(outcome)
}

/// Close the round in favour of `username`. Only the first finder counts.
pub fn end_round(ctx: &GameContext, player_id: PlayerId, username: &str) -> Result<()> {
    let treasures = {
        let mut round = ctx.round.lock();
        if !round.dig_permitted {
            return Ok(());
        }
        round.dig_permitted = false;
        round.treasures.clone()
    };
    info!(player = %username, "treasure found");

    ctx.transport
        .send_chat(&format!("The treasure was found by {}!", username), true)?;
    ctx.transport
        .send_chat(&format!("/giveeffect {} Fly 10000", username), false)?;
    ctx.transport.send_chat(&format!("/tp @a @r[id={}]", player_id), false)?;

    reveal_treasures(ctx, &treasures)?;

    let mut round = ctx.round.lock();
    round.last_winner = Some(WinnerRef {
        id: player_id,
        username: username.to_string(),
    });
    round.generate_next = true;
    Ok(())
}

/// Lift the fog around every chest.
pub fn reveal_treasures(ctx: &GameContext, treasures: &[(i32, i32)]) -> Result<()> {
    ctx.vision.update(|engine| {
        for &(x, y) in treasures {
            engine.cubic_discovery(x, y, DIG_REVEAL_SIZE);
        }
    })
}
