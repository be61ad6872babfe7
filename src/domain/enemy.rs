/// Enemy AI state machines.
///
/// One `Enemy` record serves every archetype: an archetype tag, the
/// shared fields, and a `SpecialState` variant holding archetype
/// private state (Duwende invisibility, Tikbalang leap). Behavior is
/// dispatched on the tag — no trait objects.
///
/// ## Per-tick shape (all archetypes)
///
///   1. first-update floor probe
///   2. airborne physics (the boss leap has its own handler)
///   3. grounded state machine (Idle → Running → Attack/Hit/Dead/…)
///   4. behavior reclassification (attack > special > chase > patrol,
///      skipped while Hit/Dead/mid-leap)
///   5. animation advance
///
/// Movement never observes this-tick state of other enemies; the only
/// cross-entity read is the player's hitbox, read-only.
///
/// All cooldowns run on the simulation clock (`clock_ms`), which the
/// step function advances by the fixed tick duration — never wall time.

use super::entity::{
    frame_count, params, Anim, Archetype, Behavior, EnemyState, Facing,
    REAIM_INTERVAL_MS, SIGHT_RANGE_FACTOR, SIGHT_ROW_TOLERANCE,
};
use super::physics::{self, AirStep};
use super::tile::{Hitbox, TileGrid, TILE_SIZE};

// ── Duwende tuning ──

pub const INVIS_DURATION_MS: u64 = 2000;
pub const VANISH_COOLDOWN_MS: u64 = 2000;

// ── Tikbalang tuning ──

pub const SPECIAL_COOLDOWN_MS: u64 = 4000;
pub const SPECIAL_RANGE: f32 = TILE_SIZE * 5.0;
pub const SPECIAL_RANGE_Y: f32 = 150.0;
pub const SPECIAL_DAMAGE: i32 = 25;
pub const SPECIAL_KNOCKBACK: f32 = 2.0;
const SPECIAL_BOX_W: f32 = 100.0;
const SPECIAL_BOX_H: f32 = 25.0;
const SPECIAL_JUMP_SPEED: f32 = -5.0;
/// Estimated leap duration used to derive the horizontal speed.
/// Slightly under the real flight time so the horizontal travel
/// finishes before touchdown.
const SPECIAL_JUMP_TICKS: f32 = 40.0;
const SPECIAL_MAX_H_SPEED: f32 = 3.0;

/// Cues surfaced to the step function, which maps them to game events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyCue {
    AttackSwing,
    SpecialLaunched,
    SpecialImpact,
    PlayerSpotted,
    VanishStarted,
}

/// An outgoing damage test recorded by the enemy this tick and applied
/// by encounter resolution after all entities have moved.
#[derive(Clone, Copy, Debug)]
pub struct Strike {
    pub area: Hitbox,
    pub damage: i32,
    pub knockback: f32,
}

/// Archetype-private state.
#[derive(Clone, Copy, Debug)]
pub enum SpecialState {
    None,
    Duwende {
        invisible: bool,
        /// Clock at the moment invisibility last began.
        last_vanish_ms: Option<u64>,
    },
    Tikbalang {
        jumping: bool,
        /// Player x captured at activation. Never re-tracked mid-leap.
        target_x: f32,
        /// Horizontal leap speed magnitude.
        h_speed: f32,
        anim_complete: bool,
        last_special_ms: Option<u64>,
        player_spotted: bool,
    },
}

/// Level/health-gated boss stats. The mechanism is the contract here:
/// the boss gets faster and leaps more often as the run progresses and
/// as its own health drops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossTuning {
    pub chase_speed: f32,
    pub jump_speed: f32,
    pub special_cooldown_ms: u64,
}

pub fn boss_tuning(level_index: usize, health: i32) -> BossTuning {
    let mut t = BossTuning {
        chase_speed: params(Archetype::Tikbalang).chase_speed,
        jump_speed: SPECIAL_JUMP_SPEED,
        special_cooldown_ms: SPECIAL_COOLDOWN_MS,
    };
    if level_index >= 2 {
        t.chase_speed = 1.4;
        t.jump_speed = -5.5;
        if health <= 40 {
            t.special_cooldown_ms = 1500;
        } else if health <= 100 {
            t.chase_speed += 0.4;
        }
    }
    t
}

pub struct Enemy {
    pub archetype: Archetype,
    pub hitbox: Hitbox,
    spawn: (f32, f32),
    pub health: i32,
    pub facing: Facing,
    pub state: EnemyState,
    pub behavior: Behavior,
    pub anim: Anim,
    pub active: bool,
    in_air: bool,
    fall_speed: f32,
    first_update: bool,
    attack_checked: bool,
    last_reaim_ms: u64,
    /// Set for one tick when a damage check fires; consumed by the
    /// encounter resolver.
    pub strike: Option<Strike>,
    pub special: SpecialState,
}

impl Enemy {
    /// Spawn from a level marker. `(tile_x, tile_y)` is the marker's
    /// tile; the hitbox is centered in the column with its feet resting
    /// on the bottom of that tile.
    pub fn spawn(archetype: Archetype, tile_x: usize, tile_y: usize) -> Self {
        let p = params(archetype);
        let x = tile_x as f32 * TILE_SIZE + (TILE_SIZE - p.hitbox_w) / 2.0;
        let y = (tile_y + 1) as f32 * TILE_SIZE - p.hitbox_h - physics::SNAP_MARGIN;
        let special = match archetype {
            Archetype::Sigbin => SpecialState::None,
            Archetype::Duwende => SpecialState::Duwende {
                invisible: false,
                last_vanish_ms: None,
            },
            Archetype::Tikbalang => SpecialState::Tikbalang {
                jumping: false,
                target_x: 0.0,
                h_speed: 0.0,
                anim_complete: false,
                last_special_ms: None,
                player_spotted: false,
            },
        };
        Enemy {
            archetype,
            hitbox: Hitbox::new(x, y, p.hitbox_w, p.hitbox_h),
            spawn: (x, y),
            health: p.max_health,
            facing: Facing::Left,
            state: EnemyState::Idle,
            behavior: Behavior::Patrolling,
            anim: Anim::default(),
            active: true,
            in_air: false,
            fall_speed: 0.0,
            first_update: true,
            attack_checked: false,
            last_reaim_ms: 0,
            strike: None,
            special,
        }
    }

    pub fn is_invisible(&self) -> bool {
        matches!(self.special, SpecialState::Duwende { invisible: true, .. })
    }

    fn mid_special(&self) -> bool {
        self.state == EnemyState::SpecialAttack
            || matches!(self.special, SpecialState::Tikbalang { jumping: true, .. })
    }

    fn set_state(&mut self, state: EnemyState) {
        self.state = state;
        self.anim.reset();
    }

    /// External damage entry point. Returns true if this hit killed.
    pub fn hurt(&mut self, amount: i32) -> bool {
        self.health -= amount;
        if self.health <= 0 {
            self.health = 0;
            // Death cancels a leap in progress; the body falls as a
            // normal airborne entity and never swings again.
            if let SpecialState::Tikbalang {
                ref mut jumping,
                ref mut h_speed,
                ..
            } = self.special
            {
                *jumping = false;
                *h_speed = 0.0;
            }
            self.set_state(EnemyState::Dead);
            return true;
        }
        if self.state != EnemyState::Hit
            && self.state != EnemyState::Dead
            && !self.mid_special()
        {
            self.set_state(EnemyState::Hit);
        }
        false
    }

    /// Hard reset to the spawn snapshot: health, position, state and
    /// every ability timer. A reset is a state clear, not a drain.
    pub fn reset(&mut self) {
        self.hitbox.x = self.spawn.0;
        self.hitbox.y = self.spawn.1;
        self.health = params(self.archetype).max_health;
        self.facing = Facing::Left;
        self.state = EnemyState::Idle;
        self.behavior = Behavior::Patrolling;
        self.anim.reset();
        self.active = true;
        self.in_air = false;
        self.fall_speed = 0.0;
        self.first_update = true;
        self.attack_checked = false;
        self.last_reaim_ms = 0;
        self.strike = None;
        self.special = match self.archetype {
            Archetype::Sigbin => SpecialState::None,
            Archetype::Duwende => SpecialState::Duwende {
                invisible: false,
                last_vanish_ms: None,
            },
            Archetype::Tikbalang => SpecialState::Tikbalang {
                jumping: false,
                target_x: 0.0,
                h_speed: 0.0,
                anim_complete: false,
                last_special_ms: None,
                player_spotted: false,
            },
        };
    }

    // ── Boxes ──

    /// Outgoing melee box, in front of the current facing.
    pub fn attack_box(&self) -> Hitbox {
        let p = params(self.archetype);
        let x = match self.facing {
            Facing::Right => self.hitbox.x + self.hitbox.w / 2.0,
            Facing::Left => self.hitbox.x + self.hitbox.w / 2.0 - p.attack_w,
        };
        Hitbox::new(x, self.hitbox.y, p.attack_w, p.attack_h)
    }

    /// Ground-slam area box, centered under the boss.
    fn special_attack_box(&self) -> Hitbox {
        Hitbox::new(
            self.hitbox.x - (SPECIAL_BOX_W - self.hitbox.w) / 2.0,
            self.hitbox.bottom(),
            SPECIAL_BOX_W,
            SPECIAL_BOX_H,
        )
    }

    // ══════════════════════════════════════════════════════════
    // Per-tick update
    // ══════════════════════════════════════════════════════════

    pub fn update(
        &mut self,
        grid: &TileGrid,
        player_box: &Hitbox,
        level_index: usize,
        clock_ms: u64,
        cues: &mut Vec<EnemyCue>,
    ) {
        self.strike = None;
        if !self.active {
            return;
        }

        if self.first_update {
            if !grid.is_on_floor(&self.hitbox) {
                self.in_air = true;
            }
            self.first_update = false;
            return;
        }

        if self.in_air {
            if matches!(self.special, SpecialState::Tikbalang { jumping: true, .. }) {
                self.special_jump_tick(grid, cues);
            } else {
                self.air_tick(grid);
            }
        } else {
            self.grounded_tick(grid, player_box, level_index, clock_ms, cues);
            self.reclassify_behavior(player_box, level_index, clock_ms);
        }

        self.advance_animation(clock_ms);
        self.expire_invisibility(clock_ms);
    }

    fn air_tick(&mut self, grid: &TileGrid) {
        if physics::fall_step(grid, &mut self.hitbox, &mut self.fall_speed) == AirStep::Landed {
            self.in_air = false;
        }
    }

    fn grounded_tick(
        &mut self,
        grid: &TileGrid,
        player_box: &Hitbox,
        level_index: usize,
        clock_ms: u64,
        cues: &mut Vec<EnemyCue>,
    ) {
        match self.state {
            EnemyState::Idle => self.set_state(EnemyState::Running),
            EnemyState::Running => {
                // Sight only re-faces; state changes go through the
                // range gates below.
                if self.can_see_player(grid, player_box, cues) {
                    self.facing = Facing::towards(self.hitbox.x, player_box.x);
                }

                match self.archetype {
                    Archetype::Duwende => {
                        if self.should_vanish(player_box, clock_ms) {
                            self.set_state(EnemyState::Vanish);
                            cues.push(EnemyCue::VanishStarted);
                        } else if self.player_close_for_attack(player_box) {
                            self.set_state(EnemyState::Attack);
                        }
                    }
                    Archetype::Tikbalang => {
                        if self.player_close_for_special(player_box)
                            && self.special_ready(level_index, clock_ms)
                        {
                            self.start_special(player_box, clock_ms, cues);
                        } else if self.player_close_for_attack(player_box) {
                            self.set_state(EnemyState::Attack);
                        }
                    }
                    Archetype::Sigbin => {
                        if self.player_close_for_attack(player_box) {
                            self.set_state(EnemyState::Attack);
                        }
                    }
                }

                if self.state == EnemyState::Running {
                    match self.behavior {
                        Behavior::Chasing => self.chase_move(grid, level_index, clock_ms),
                        // Invisible movement stays at walk speed.
                        Behavior::Patrolling | Behavior::Hiding => {
                            self.patrol_move(grid, clock_ms)
                        }
                        Behavior::Attacking | Behavior::Special => {}
                    }
                }
            }
            EnemyState::Attack => {
                if self.anim.frame == 0 {
                    self.attack_checked = false;
                }
                let p = params(self.archetype);
                if self.anim.frame == p.attack_check_frame && !self.attack_checked {
                    self.attack_checked = true;
                    self.strike = Some(Strike {
                        area: self.attack_box(),
                        damage: p.contact_damage,
                        knockback: p.knockback,
                    });
                    cues.push(EnemyCue::AttackSwing);
                }
            }
            EnemyState::SpecialAttack => {
                // The launch happens on the first animation frame; the
                // rest of the leap runs in special_jump_tick.
                if let SpecialState::Tikbalang { ref mut jumping, .. } = self.special {
                    if self.anim.frame == 0 && !*jumping {
                        *jumping = true;
                        self.fall_speed = boss_tuning(level_index, self.health).jump_speed;
                        self.in_air = true;
                    }
                }
            }
            EnemyState::Vanish | EnemyState::Hit | EnemyState::Dead => {
                // Control-locked; transitions happen on animation wrap.
            }
        }
    }

    // ── Behavior classification ──

    fn reclassify_behavior(&mut self, player_box: &Hitbox, level_index: usize, clock_ms: u64) {
        if self.state == EnemyState::Hit
            || self.state == EnemyState::Dead
            || self.state == EnemyState::Vanish
            || self.mid_special()
        {
            return;
        }
        if self.is_invisible() {
            self.behavior = Behavior::Hiding;
            return;
        }

        let p = params(self.archetype);
        let dist_x = (player_box.x - self.hitbox.x).abs();
        let dist_y = (player_box.y - self.hitbox.y).abs();

        if dist_x <= p.attack_range && dist_y < p.attack_range_y {
            self.behavior = Behavior::Attacking;
        } else if self.archetype == Archetype::Tikbalang
            && dist_x <= SPECIAL_RANGE
            && dist_y < SPECIAL_RANGE_Y
            && self.special_ready(level_index, clock_ms)
        {
            self.behavior = Behavior::Special;
        } else if dist_x < p.chase_range && dist_y < p.chase_range_y {
            self.behavior = Behavior::Chasing;
            // Re-aim at most every REAIM_INTERVAL_MS to avoid jitter
            // around the player's center.
            if clock_ms.saturating_sub(self.last_reaim_ms) > REAIM_INTERVAL_MS {
                self.facing = Facing::towards(self.hitbox.x, player_box.x);
                self.last_reaim_ms = clock_ms;
            }
        } else {
            self.behavior = Behavior::Patrolling;
        }
    }

    // ── Movement ──

    fn patrol_move(&mut self, grid: &TileGrid, clock_ms: u64) {
        self.walk(grid, params(self.archetype).walk_speed, clock_ms);
    }

    fn chase_move(&mut self, grid: &TileGrid, level_index: usize, clock_ms: u64) {
        let speed = match self.archetype {
            Archetype::Tikbalang => boss_tuning(level_index, self.health).chase_speed,
            _ => params(self.archetype).chase_speed,
        };
        self.walk(grid, speed, clock_ms);
    }

    /// Walk in the facing direction; reverse at walls and ledges.
    fn walk(&mut self, grid: &TileGrid, speed: f32, clock_ms: u64) {
        let x_speed = self.facing.sign() * speed;
        let target = Hitbox::new(self.hitbox.x + x_speed, self.hitbox.y, self.hitbox.w, self.hitbox.h);
        if grid.can_move_to(&target) && grid.is_floor_ahead(&self.hitbox, x_speed) {
            self.hitbox.x = target.x;
        } else {
            self.facing = self.facing.flip();
            self.last_reaim_ms = clock_ms;
        }
    }

    // ── Sight ──

    fn can_see_player(
        &mut self,
        grid: &TileGrid,
        player_box: &Hitbox,
        cues: &mut Vec<EnemyCue>,
    ) -> bool {
        let my_row = self.hitbox.tile_row();
        let player_row = player_box.tile_row();
        if (player_row - my_row).abs() > SIGHT_ROW_TOLERANCE {
            return false;
        }
        let p = params(self.archetype);
        if (player_box.x - self.hitbox.x).abs() > p.attack_range * SIGHT_RANGE_FACTOR {
            return false;
        }
        let sight_row = my_row.min(player_row);
        if !grid.is_sight_clear(&self.hitbox, player_box, sight_row) {
            return false;
        }
        if let SpecialState::Tikbalang { ref mut player_spotted, .. } = self.special {
            if !*player_spotted {
                *player_spotted = true;
                cues.push(EnemyCue::PlayerSpotted);
            }
        }
        true
    }

    fn player_close_for_attack(&self, player_box: &Hitbox) -> bool {
        match self.archetype {
            // The boss swings when the boxes actually overlap.
            Archetype::Tikbalang => self.hitbox.intersects(player_box),
            _ => {
                (player_box.x - self.hitbox.x).abs() <= params(self.archetype).attack_range
            }
        }
    }

    // ── Duwende: vanish ──

    fn vanish_ready(&self, clock_ms: u64) -> bool {
        match self.special {
            SpecialState::Duwende { last_vanish_ms: None, .. } => true,
            SpecialState::Duwende { last_vanish_ms: Some(t), .. } => {
                clock_ms.saturating_sub(t) > VANISH_COOLDOWN_MS + INVIS_DURATION_MS
            }
            _ => false,
        }
    }

    /// Vanish when the player is uncomfortably close but not yet in
    /// attack range.
    fn should_vanish(&self, player_box: &Hitbox, clock_ms: u64) -> bool {
        if !self.vanish_ready(clock_ms) {
            return false;
        }
        let range = params(self.archetype).attack_range;
        let dist_x = (player_box.x - self.hitbox.x).abs();
        dist_x < range * 3.0 && dist_x > range * 1.5
    }

    fn expire_invisibility(&mut self, clock_ms: u64) {
        if let SpecialState::Duwende {
            ref mut invisible,
            last_vanish_ms: Some(t),
        } = self.special
        {
            if *invisible && clock_ms.saturating_sub(t) > INVIS_DURATION_MS {
                *invisible = false;
            }
        }
    }

    // ── Tikbalang: leap ──

    fn special_ready(&self, level_index: usize, clock_ms: u64) -> bool {
        match self.special {
            SpecialState::Tikbalang { last_special_ms: None, .. } => true,
            SpecialState::Tikbalang { last_special_ms: Some(t), .. } => {
                let cooldown = boss_tuning(level_index, self.health).special_cooldown_ms;
                clock_ms.saturating_sub(t) >= cooldown
            }
            _ => false,
        }
    }

    fn player_close_for_special(&self, player_box: &Hitbox) -> bool {
        let dist_x = (player_box.x - self.hitbox.x).abs();
        let dist_y = (player_box.y - self.hitbox.y).abs();
        dist_x <= SPECIAL_RANGE && dist_y <= SPECIAL_RANGE_Y
    }

    fn start_special(&mut self, player_box: &Hitbox, clock_ms: u64, cues: &mut Vec<EnemyCue>) {
        // Capture the target NOW; the leap does not track the player.
        let target_x = player_box.x;
        let distance = (target_x - self.hitbox.x).abs();
        let h_speed = (distance / SPECIAL_JUMP_TICKS).min(SPECIAL_MAX_H_SPEED);

        // Align the feet to the ground before launching.
        self.hitbox.y = physics::floor_snap_y(&self.hitbox);

        self.set_state(EnemyState::SpecialAttack);
        self.facing = Facing::towards(self.hitbox.x, target_x);
        if let SpecialState::Tikbalang {
            ref mut jumping,
            target_x: ref mut tx,
            h_speed: ref mut hs,
            ref mut anim_complete,
            ref mut last_special_ms,
            ..
        } = self.special
        {
            *jumping = false; // launch fires on animation frame 0
            *tx = target_x;
            *hs = h_speed;
            *anim_complete = false;
            *last_special_ms = Some(clock_ms);
        }
        cues.push(EnemyCue::SpecialLaunched);
    }

    /// Horizontal leap step toward the captured target, clamped so the
    /// boss never overshoots it.
    fn special_h_step(&self) -> f32 {
        if let SpecialState::Tikbalang { target_x, h_speed, .. } = self.special {
            (target_x - self.hitbox.x).clamp(-h_speed, h_speed)
        } else {
            0.0
        }
    }

    fn special_jump_tick(&mut self, grid: &TileGrid, cues: &mut Vec<EnemyCue>) {
        let step_x = self.special_h_step();

        if self.fall_speed < 0.0 {
            // Ascent: try the full diagonal, then vertical only.
            let diag = Hitbox::new(
                self.hitbox.x + step_x,
                self.hitbox.y + self.fall_speed,
                self.hitbox.w,
                self.hitbox.h,
            );
            let vert = Hitbox::new(self.hitbox.x, diag.y, self.hitbox.w, self.hitbox.h);
            if grid.can_move_to(&diag) {
                self.hitbox.x = diag.x;
                self.hitbox.y = diag.y;
                self.fall_speed += physics::GRAVITY;
            } else if grid.can_move_to(&vert) {
                self.hitbox.y = vert.y;
                self.fall_speed += physics::GRAVITY;
                self.stop_leap_horizontal();
            } else {
                // Ceiling: begin the descent.
                self.fall_speed = 0.0;
            }
        } else {
            // Descent: doubled gravity for the slam.
            self.fall_speed += physics::GRAVITY * 2.0;
            let side = Hitbox::new(self.hitbox.x + step_x, self.hitbox.y, self.hitbox.w, self.hitbox.h);
            if grid.can_move_to(&side) {
                self.hitbox.x = side.x;
            } else {
                self.stop_leap_horizontal();
            }
            let down = Hitbox::new(self.hitbox.x, self.hitbox.y + self.fall_speed, self.hitbox.w, self.hitbox.h);
            if grid.can_move_to(&down) {
                self.hitbox.y = down.y;
            } else {
                self.land_special(cues);
            }
        }
    }

    fn stop_leap_horizontal(&mut self) {
        if let SpecialState::Tikbalang { ref mut h_speed, .. } = self.special {
            *h_speed = 0.0;
        }
    }

    fn land_special(&mut self, cues: &mut Vec<EnemyCue>) {
        self.hitbox.y = physics::floor_snap_y(&self.hitbox);
        self.in_air = false;
        self.fall_speed = 0.0;

        let area = self.special_attack_box();
        if let SpecialState::Tikbalang {
            ref mut jumping,
            ref mut h_speed,
            ref mut anim_complete,
            ..
        } = self.special
        {
            *jumping = false;
            *h_speed = 0.0;
            *anim_complete = false;
        }
        // The slam damage fires exactly once, at ground contact.
        self.strike = Some(Strike {
            area,
            damage: SPECIAL_DAMAGE,
            knockback: SPECIAL_KNOCKBACK,
        });
        cues.push(EnemyCue::SpecialImpact);
        self.set_state(EnemyState::Running);
    }

    // ── Animation ──

    fn advance_animation(&mut self, clock_ms: u64) {
        let frames = frame_count(self.archetype, self.state);

        // The leap animation freezes on its last frame until ground
        // contact ends the state; physics drives that transition, not
        // the animation clock.
        if self.state == EnemyState::SpecialAttack {
            if let SpecialState::Tikbalang { ref mut anim_complete, .. } = self.special {
                if *anim_complete {
                    return;
                }
                self.anim.tick += 1;
                if self.anim.tick >= super::entity::ANIM_TICKS_PER_FRAME {
                    self.anim.tick = 0;
                    self.anim.frame += 1;
                    if self.anim.frame >= frames {
                        *anim_complete = true;
                        self.anim.freeze_on_last(frames);
                    }
                }
            }
            return;
        }

        if self.anim.advance(frames) {
            match self.state {
                EnemyState::Attack | EnemyState::Hit => self.set_state(EnemyState::Idle),
                EnemyState::Dead => {
                    self.anim.freeze_on_last(frames);
                    self.active = false;
                }
                EnemyState::Vanish => {
                    if let SpecialState::Duwende {
                        ref mut invisible,
                        ref mut last_vanish_ms,
                    } = self.special
                    {
                        *invisible = true;
                        *last_vanish_ms = Some(clock_ms);
                    }
                    self.set_state(EnemyState::Running);
                }
                _ => {}
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ANIM_TICKS_PER_FRAME;

    fn grid_from(rows: &[&str]) -> TileGrid {
        let cells = rows
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { 1 } else { 0 }).collect())
            .collect();
        TileGrid::new(cells)
    }

    /// 20 columns of open air over a continuous floor.
    fn flat_grid() -> TileGrid {
        grid_from(&[
            "                    ",
            "                    ",
            "                    ",
            "                    ",
            "####################",
        ])
    }

    fn player_at(x: f32) -> Hitbox {
        Hitbox::new(x, 96.0, 20.0, 31.0)
    }

    fn far_player() -> Hitbox {
        player_at(10_000.0)
    }

    fn tick(e: &mut Enemy, grid: &TileGrid, player: &Hitbox, clock_ms: u64) {
        let mut cues = Vec::new();
        e.update(grid, player, 0, clock_ms, &mut cues);
    }

    // ── Lifecycle ──

    #[test]
    fn idle_transitions_to_running_once() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Sigbin, 5, 3);
        tick(&mut e, &grid, &far_player(), 0); // first-update probe
        assert_eq!(e.state, EnemyState::Idle);
        tick(&mut e, &grid, &far_player(), 16);
        assert_eq!(e.state, EnemyState::Running);
    }

    #[test]
    fn lethal_hurt_is_terminal() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Sigbin, 5, 3);
        e.health = 5;
        assert!(e.hurt(10));
        assert_eq!(e.state, EnemyState::Dead);
        assert_eq!(e.health, 0);

        // No later tick may leave Dead (until the death animation
        // completes and deactivates the enemy).
        let mut clock = 0;
        for _ in 0..2000 {
            clock += 16;
            tick(&mut e, &grid, &far_player(), clock);
            assert!(e.state == EnemyState::Dead);
        }
        assert!(!e.active);
    }

    #[test]
    fn nonlethal_hurt_enters_hit_then_recovers() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Sigbin, 5, 3);
        tick(&mut e, &grid, &far_player(), 0);
        tick(&mut e, &grid, &far_player(), 16);
        assert!(!e.hurt(10));
        assert_eq!(e.state, EnemyState::Hit);
        assert_eq!(e.health, 40);

        // Hit runs its animation, then falls back into the Idle →
        // Running lifecycle.
        let hit_frames = frame_count(Archetype::Sigbin, EnemyState::Hit);
        let mut clock = 16;
        for _ in 0..(hit_frames * ANIM_TICKS_PER_FRAME + 2) {
            clock += 16;
            tick(&mut e, &grid, &far_player(), clock);
        }
        assert_eq!(e.state, EnemyState::Running);
    }

    #[test]
    fn patrol_reverses_at_ledge() {
        // Floor only under columns 4..=9
        let grid = grid_from(&[
            "                    ",
            "    ######          ",
        ]);
        let mut e = Enemy::spawn(Archetype::Sigbin, 6, 0);
        tick(&mut e, &grid, &far_player(), 0);
        assert_eq!(e.facing, Facing::Left);
        let mut clock = 0;
        let mut saw_right = false;
        for _ in 0..2000 {
            clock += 16;
            tick(&mut e, &grid, &far_player(), clock);
            if e.facing == Facing::Right {
                saw_right = true;
            }
            // Never walks off the platform
            assert!(e.hitbox.x >= 4.0 * TILE_SIZE - e.hitbox.w);
            assert!(e.hitbox.x + e.hitbox.w <= 10.0 * TILE_SIZE + e.hitbox.w);
        }
        assert!(saw_right);
    }

    #[test]
    fn attack_fires_exactly_once_per_swing() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Sigbin, 5, 3);
        let player = player_at(e.hitbox.x + 10.0);
        let mut clock = 0;
        tick(&mut e, &grid, &player, clock);

        let mut strikes = 0;
        let frames = frame_count(Archetype::Sigbin, EnemyState::Attack);
        for _ in 0..(frames * ANIM_TICKS_PER_FRAME + 8) {
            clock += 16;
            tick(&mut e, &grid, &player, clock);
            if e.state != EnemyState::Attack && strikes > 0 {
                break;
            }
            if e.strike.is_some() {
                strikes += 1;
            }
        }
        assert_eq!(strikes, 1);
    }

    #[test]
    fn reset_restores_spawn_snapshot() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Sigbin, 5, 3);
        let spawn_box = e.hitbox;
        let mut clock = 0;
        for _ in 0..200 {
            clock += 16;
            tick(&mut e, &grid, &far_player(), clock);
        }
        e.hurt(10);
        e.reset();
        assert_eq!(e.hitbox, spawn_box);
        assert_eq!(e.health, params(Archetype::Sigbin).max_health);
        assert_eq!(e.state, EnemyState::Idle);
        assert_eq!(e.behavior, Behavior::Patrolling);
        assert!(e.active);
    }

    // ── Duwende ──

    #[test]
    fn duwende_vanish_window_and_cooldown() {
        let grid = flat_grid();
        let mut e = Enemy::spawn(Archetype::Duwende, 5, 3);
        // Player in the vanish band: between 1.5x and 3x attack range
        let player = player_at(e.hitbox.x + TILE_SIZE * 2.0);

        let mut clock = 0;
        tick(&mut e, &grid, &player, clock); // first update
        clock += 16;
        tick(&mut e, &grid, &player, clock); // Idle → Running
        clock += 16;
        tick(&mut e, &grid, &player, clock); // Running → Vanish
        assert_eq!(e.state, EnemyState::Vanish);

        // Run the vanish animation to completion → invisible
        let frames = frame_count(Archetype::Duwende, EnemyState::Vanish);
        for _ in 0..(frames * ANIM_TICKS_PER_FRAME) {
            clock += 16;
            tick(&mut e, &grid, &player, clock);
        }
        assert!(e.is_invisible());
        let vanish_start = clock;

        // Invisible until INVIS_DURATION_MS elapses
        while clock.saturating_sub(vanish_start) <= INVIS_DURATION_MS {
            assert!(e.is_invisible());
            clock += 16;
            tick(&mut e, &grid, &player, clock);
        }
        assert!(!e.is_invisible());

        // Cannot re-trigger before cooldown + duration since vanish
        while clock.saturating_sub(vanish_start) <= VANISH_COOLDOWN_MS + INVIS_DURATION_MS {
            assert_ne!(e.state, EnemyState::Vanish);
            clock += 16;
            tick(&mut e, &grid, &player, clock);
        }
    }

    #[test]
    fn invisible_duwende_is_classified_hiding() {
        let mut e = Enemy::spawn(Archetype::Duwende, 5, 3);
        if let SpecialState::Duwende { ref mut invisible, ref mut last_vanish_ms } = e.special {
            *invisible = true;
            *last_vanish_ms = Some(0);
        }
        e.reclassify_behavior(&player_at(e.hitbox.x + 100.0), 0, 100);
        assert_eq!(e.behavior, Behavior::Hiding);
    }

    // ── Tikbalang ──

    #[test]
    fn boss_leap_lands_on_captured_target() {
        let grid = grid_from(&[
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "##############################",
        ]);
        let mut e = Enemy::spawn(Archetype::Tikbalang, 3, 4);
        let activation_x = e.hitbox.x + 100.0;
        let player = player_at(activation_x);

        let mut clock = 0;
        tick(&mut e, &grid, &player, clock);
        clock += 16;
        tick(&mut e, &grid, &player, clock);
        clock += 16;
        tick(&mut e, &grid, &player, clock);
        assert_eq!(e.state, EnemyState::SpecialAttack);

        // The player runs away mid-leap; the landing must not care.
        let fleeing = player_at(activation_x + 500.0);
        let mut landed = false;
        for _ in 0..3000 {
            clock += 16;
            tick(&mut e, &grid, &fleeing, clock);
            if e.state != EnemyState::SpecialAttack {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(e.hitbox.x, activation_x);
        assert_eq!(e.state, EnemyState::Running);
    }

    #[test]
    fn boss_leap_emits_single_impact_strike() {
        let grid = grid_from(&[
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "##############################",
        ]);
        let mut e = Enemy::spawn(Archetype::Tikbalang, 3, 4);
        let player = player_at(e.hitbox.x + 100.0);

        let mut clock = 0;
        let mut strikes = 0;
        for _ in 0..3000 {
            let mut cues = Vec::new();
            e.update(&grid, &player, 0, clock, &mut cues);
            clock += 16;
            if e.strike.map_or(false, |s| s.knockback == SPECIAL_KNOCKBACK) {
                strikes += 1;
            }
            if strikes > 0 && e.state == EnemyState::Running && !e.mid_special() {
                break;
            }
        }
        assert_eq!(strikes, 1);
    }

    #[test]
    fn boss_special_respects_cooldown() {
        let mut e = Enemy::spawn(Archetype::Tikbalang, 3, 4);
        if let SpecialState::Tikbalang { ref mut last_special_ms, .. } = e.special {
            *last_special_ms = Some(1000);
        }
        assert!(!e.special_ready(0, 1000 + SPECIAL_COOLDOWN_MS - 1));
        assert!(e.special_ready(0, 1000 + SPECIAL_COOLDOWN_MS));
    }

    #[test]
    fn boss_tuning_escalates_with_level_and_low_health() {
        let base = boss_tuning(0, 300);
        let late = boss_tuning(2, 300);
        let enraged = boss_tuning(2, 30);
        assert!(late.chase_speed > base.chase_speed);
        assert!(late.jump_speed < base.jump_speed);
        assert!(enraged.special_cooldown_ms < base.special_cooldown_ms);
        // Magnitudes stay in family with the rest of the tuning.
        assert!(boss_tuning(2, 100).chase_speed < 3.0);
    }

    #[test]
    fn hurt_during_leap_does_not_interrupt_it() {
        let mut e = Enemy::spawn(Archetype::Tikbalang, 3, 4);
        e.set_state(EnemyState::SpecialAttack);
        if let SpecialState::Tikbalang { ref mut jumping, .. } = e.special {
            *jumping = true;
        }
        assert!(!e.hurt(50));
        assert_eq!(e.state, EnemyState::SpecialAttack);
        assert_eq!(e.health, 250);
    }
}
