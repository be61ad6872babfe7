/// Shared entity model: facing, state enums, the animation ticker, and
/// the per-archetype data tables (frame counts, tuning parameters).
///
/// Tables are match arms, not stored config — they define the game's
/// identity the same way the tile legend does. Unlisted
/// (archetype, state) combinations fall back to a single frame so a
/// bad lookup degrades to a frozen sprite instead of a panic.

use super::tile::TILE_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn flip(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// -1.0 for Left, +1.0 for Right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn towards(from_x: f32, to_x: f32) -> Facing {
        if to_x > from_x { Facing::Right } else { Facing::Left }
    }
}

/// Enemy archetypes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Archetype {
    /// Baseline patrol/chase/attack hound.
    Sigbin,
    /// Small, fast, hides by turning invisible.
    Duwende,
    /// Boss: high health, leaping slam attack, enrages as it weakens.
    Tikbalang,
}

/// Fine-grained combat/animation state. Drives which animation plays
/// and which frame gates a damage check.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyState {
    Idle,
    Running,
    Attack,
    /// Tikbalang only: the leap.
    SpecialAttack,
    /// Duwende only: the disappearing animation before invisibility.
    Vanish,
    Hit,
    Dead,
}

/// Coarse AI intent. Separate from `EnemyState`: this picks how the
/// enemy moves, the state picks what it looks like.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Behavior {
    Patrolling,
    Chasing,
    Attacking,
    /// Tikbalang: lining up / performing the leap.
    Special,
    /// Duwende: currently invisible.
    Hiding,
}

/// Ticks of simulation per animation frame.
pub const ANIM_TICKS_PER_FRAME: u32 = 4;

/// Shared animation ticker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Anim {
    pub tick: u32,
    pub frame: u32,
}

impl Anim {
    pub fn reset(&mut self) {
        self.tick = 0;
        self.frame = 0;
    }

    /// Advance one tick within a cycle of `frames` frames.
    /// Returns true on the tick the cycle wraps back to frame 0.
    pub fn advance(&mut self, frames: u32) -> bool {
        self.tick += 1;
        if self.tick < ANIM_TICKS_PER_FRAME {
            return false;
        }
        self.tick = 0;
        self.frame += 1;
        if self.frame >= frames.max(1) {
            self.frame = 0;
            return true;
        }
        false
    }

    /// Pin to the final frame of a `frames`-long cycle.
    pub fn freeze_on_last(&mut self, frames: u32) {
        self.frame = frames.max(1) - 1;
        self.tick = 0;
    }
}

/// Animation frame count per (archetype, state). The fallback arm keeps
/// the simulation loop non-terminating on combinations no atlas defines.
pub fn frame_count(archetype: Archetype, state: EnemyState) -> u32 {
    match archetype {
        Archetype::Sigbin => match state {
            EnemyState::Idle | EnemyState::Dead => 30,
            EnemyState::Running => 20,
            EnemyState::Attack => 24,
            EnemyState::Hit => 19,
            _ => 1,
        },
        Archetype::Duwende => match state {
            EnemyState::Idle => 32,
            EnemyState::Attack => 21,
            EnemyState::Running => 20,
            EnemyState::Hit => 4,
            EnemyState::Dead | EnemyState::Vanish => 3,
            _ => 1,
        },
        Archetype::Tikbalang => match state {
            EnemyState::Idle
            | EnemyState::Running
            | EnemyState::Hit
            | EnemyState::Dead => 30,
            EnemyState::Attack => 32,
            EnemyState::SpecialAttack => 29,
            _ => 1,
        },
    }
}

/// Static tuning for one archetype. Distances are pixels, speeds are
/// pixels per tick, damage is health points.
#[derive(Clone, Copy, Debug)]
pub struct ArchetypeParams {
    pub max_health: i32,
    pub contact_damage: i32,
    pub walk_speed: f32,
    pub chase_speed: f32,
    /// Horizontal reach that triggers the attack state.
    pub attack_range: f32,
    /// Vertical tolerance for the attack/chase gates.
    pub attack_range_y: f32,
    /// Horizontal chase trigger distance.
    pub chase_range: f32,
    pub chase_range_y: f32,
    /// Knockback impulse scale applied to the player.
    pub knockback: f32,
    /// Hitbox dimensions.
    pub hitbox_w: f32,
    pub hitbox_h: f32,
    /// Outgoing attack box dimensions.
    pub attack_w: f32,
    pub attack_h: f32,
    /// Animation frame on which the attack damage check fires.
    pub attack_check_frame: u32,
}

pub fn params(archetype: Archetype) -> ArchetypeParams {
    match archetype {
        Archetype::Sigbin => ArchetypeParams {
            max_health: 50,
            contact_damage: 10,
            walk_speed: 0.6,
            chase_speed: 1.2,
            attack_range: TILE_SIZE,
            attack_range_y: 50.0,
            chase_range: 300.0,
            chase_range_y: 200.0,
            knockback: 1.0,
            hitbox_w: 36.0,
            hitbox_h: 24.0,
            attack_w: 60.0,
            attack_h: 35.0,
            attack_check_frame: 20,
        },
        Archetype::Duwende => ArchetypeParams {
            max_health: 20,
            contact_damage: 5,
            walk_speed: 0.6,
            chase_speed: 1.6,
            attack_range: TILE_SIZE,
            attack_range_y: 50.0,
            chase_range: 350.0,
            chase_range_y: 200.0,
            knockback: 0.7,
            hitbox_w: 14.0,
            hitbox_h: 22.0,
            attack_w: 20.0,
            attack_h: 20.0,
            attack_check_frame: 10,
        },
        Archetype::Tikbalang => ArchetypeParams {
            max_health: 300,
            contact_damage: 25,
            walk_speed: 0.9,
            chase_speed: 1.2,
            attack_range: TILE_SIZE,
            attack_range_y: 50.0,
            chase_range: 400.0,
            chase_range_y: 200.0,
            knockback: 1.5,
            hitbox_w: 56.0,
            hitbox_h: 48.0,
            attack_w: 45.0,
            attack_h: 29.0,
            attack_check_frame: 28,
        },
    }
}

/// Minimum interval between chase re-aims. Re-aiming every tick makes
/// chasers jitter around the player's center.
pub const REAIM_INTERVAL_MS: u64 = 500;

/// Sight radius: generously large, in multiples of the attack range.
pub const SIGHT_RANGE_FACTOR: f32 = 40.0;

/// Vertical sight tolerance in tile rows.
pub const SIGHT_ROW_TOLERANCE: i32 = 4;

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
