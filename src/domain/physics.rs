/// Physics integration — single source of truth for motion resolution.
///
/// Free functions over `&TileGrid` + `&mut Hitbox`. Two concerns:
///
///   1. HORIZONTAL — displace if the target box is movable, otherwise
///      snap flush against the obstructing tile boundary (1 px margin)
///      and report "blocked" so AI callers can reverse direction.
///   2. VERTICAL — integrate `y += air_speed; air_speed += gravity`
///      per tick while movable; on a block, snap to the floor/ceiling
///      tile boundary and zero the speed.
///
/// ## Floor snap invariant
///
/// The landing row is derived from the row the entity's FEET currently
/// occupy, never from the pre-collision target position. Deriving it
/// from the target sinks fast fallers one tile into the ground.

use super::tile::{Hitbox, TileGrid, TILE_SIZE};

/// Downward acceleration, px per tick².
pub const GRAVITY: f32 = 0.2;

/// Margin kept between a snapped box and the blocking tile face.
/// The 8-point sampler treats an exactly-flush edge as inside the
/// wall tile, so flush placement must stay one pixel short.
pub const SNAP_MARGIN: f32 = 1.0;

/// Outcome of one vertical integration step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AirStep {
    /// Still airborne; position and speed were advanced.
    Airborne,
    /// Feet hit the floor; box snapped, speed zeroed.
    Landed,
    /// Head hit a ceiling; box snapped, speed zeroed.
    BumpedCeiling,
}

/// Move `hb` horizontally by `x_speed`. Returns true if the full
/// displacement was applied; false means a wall blocked the move and
/// the box now sits flush against it.
pub fn move_horizontal(grid: &TileGrid, hb: &mut Hitbox, x_speed: f32) -> bool {
    if x_speed == 0.0 {
        return true;
    }
    let moved = Hitbox::new(hb.x + x_speed, hb.y, hb.w, hb.h);
    if grid.can_move_to(&moved) {
        hb.x = moved.x;
        true
    } else {
        hb.x = wall_snap_x(hb, x_speed);
        false
    }
}

/// X position that puts the box flush against the wall it is moving
/// into: left edge of the next tile column minus the box width (moving
/// right), or right edge of the current column (moving left), with a
/// `SNAP_MARGIN` gap.
pub fn wall_snap_x(hb: &Hitbox, x_speed: f32) -> f32 {
    if x_speed > 0.0 {
        let wall_col = ((hb.x + hb.w) / TILE_SIZE).floor() + 1.0;
        wall_col * TILE_SIZE - hb.w - SNAP_MARGIN
    } else {
        let col = (hb.x / TILE_SIZE).floor();
        col * TILE_SIZE + SNAP_MARGIN
    }
}

/// One tick of vertical motion under gravity. `air_speed` is mutated
/// in place (integrated, or zeroed on contact).
pub fn fall_step(grid: &TileGrid, hb: &mut Hitbox, air_speed: &mut f32) -> AirStep {
    fall_step_with_gravity(grid, hb, air_speed, GRAVITY)
}

/// As `fall_step`, with an explicit gravity (the boss dive doubles it).
pub fn fall_step_with_gravity(
    grid: &TileGrid,
    hb: &mut Hitbox,
    air_speed: &mut f32,
    gravity: f32,
) -> AirStep {
    let moved = Hitbox::new(hb.x, hb.y + *air_speed, hb.w, hb.h);
    if grid.can_move_to(&moved) {
        hb.y = moved.y;
        *air_speed += gravity;
        return AirStep::Airborne;
    }
    if *air_speed > 0.0 {
        hb.y = floor_snap_y(hb);
        *air_speed = 0.0;
        AirStep::Landed
    } else {
        hb.y = ceiling_snap_y(hb);
        *air_speed = 0.0;
        AirStep::BumpedCeiling
    }
}

/// Y position that rests the feet on the floor below. Uses the row the
/// feet currently occupy (see module invariant).
pub fn floor_snap_y(hb: &Hitbox) -> f32 {
    let feet_row = (hb.bottom() / TILE_SIZE).floor();
    (feet_row + 1.0) * TILE_SIZE - hb.h - SNAP_MARGIN
}

/// Y position that puts the head just under the ceiling: the top of
/// the row the head currently occupies.
pub fn ceiling_snap_y(hb: &Hitbox) -> f32 {
    let head_row = (hb.y / TILE_SIZE).floor();
    head_row * TILE_SIZE
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
