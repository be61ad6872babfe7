/// Player controller.
///
/// One update per tick, driven by `PlayerInput` intents. Action
/// selection follows a strict priority ladder:
///
///   Death > Hit > Dash > Attack > airborne (Jump/Fall) > Running > Idle
///
/// Hit and Death are control locks: movement and attack input are
/// ignored entirely while either is active. The hit lock is short and
/// fixed; the invincibility window that suppresses incoming damage is
/// longer and runs independently.
///
/// Combo timing, the hit lock and invincibility all run on the
/// simulation clock, never wall time.

use super::entity::{Anim, Facing};
use super::physics::{self, AirStep};
use super::tile::{Hitbox, TileGrid, TILE_SIZE};

pub const MAX_HEALTH: i32 = 100;
pub const MAX_ENERGY: i32 = 100;
pub const DASH_ENERGY_COST: i32 = 40;
/// Fractional energy points regained per tick while not dashing.
pub const ENERGY_REGEN_RATE: f32 = 0.15;

pub const RUN_SPEED: f32 = 2.0;
pub const JUMP_SPEED: f32 = -5.0;
/// Small residual fall speed after a ceiling bump.
const CEILING_RESIDUAL: f32 = 0.1;

pub const DASH_SPEED: f32 = 8.0;
pub const DASH_DISTANCE: f32 = 4.0 * TILE_SIZE;

pub const HIT_LOCK_MS: u64 = 400;
pub const INVINCIBILITY_MS: u64 = 1200;
pub const COMBO_WINDOW_MS: u64 = 800;
const KNOCKBACK_SPEED: f32 = 3.0;

const HITBOX_W: f32 = 20.0;
const HITBOX_H: f32 = 40.0;
const ATTACK_BOX_W: f32 = 40.0;
const ATTACK_BOX_H: f32 = 40.0;

/// Damage per combo step.
const COMBO_DAMAGE: [i32; 3] = [10, 20, 10];
/// Animation frame on which each combo step's damage check fires.
const COMBO_CHECK_FRAME: [u32; 3] = [1, 2, 3];

/// Input intents for one tick. Left/right/jump are held states;
/// dash/attack are edge-triggered presses.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub dash: bool,
    pub attack: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerAction {
    Idle,
    Running,
    Jump,
    Fall,
    Dash,
    Attack1,
    Attack2,
    Attack3,
    Hit,
    Death,
}

/// Animation frame count per action.
pub fn player_frame_count(action: PlayerAction) -> u32 {
    match action {
        PlayerAction::Idle => 30,
        PlayerAction::Running | PlayerAction::Fall => 25,
        PlayerAction::Jump | PlayerAction::Hit => 20,
        PlayerAction::Attack1 | PlayerAction::Dash => 13,
        PlayerAction::Attack2 | PlayerAction::Death => 15,
        PlayerAction::Attack3 => 11,
    }
}

/// Cues surfaced to the step function.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerCue {
    Jumped,
    Dashed,
    AttackStarted(u8),
    Hurt,
    Died,
}

pub struct Player {
    pub hitbox: Hitbox,
    spawn: (f32, f32),
    pub health: i32,
    pub energy: i32,
    energy_acc: f32,
    pub action: PlayerAction,
    pub anim: Anim,
    pub facing: Facing,

    in_air: bool,
    air_speed: f32,
    moving: bool,

    attacking: bool,
    attack_checked: bool,
    combo_index: u8,
    last_attack_ms: Option<u64>,
    /// Pending strike (box + damage) for the encounter resolver.
    pub strike: Option<(Hitbox, i32)>,

    dashing: bool,
    dash_start_x: f32,
    dash_dir: f32,

    hit: bool,
    hit_until_ms: u64,
    invincible_until_ms: u64,

    pub dying: bool,
    /// Set once the death animation has played out.
    pub death_finished: bool,
}

impl Player {
    /// Spawn with feet resting on the bottom of the marker tile.
    pub fn spawn(tile_x: usize, tile_y: usize) -> Self {
        let x = tile_x as f32 * TILE_SIZE + (TILE_SIZE - HITBOX_W) / 2.0;
        let y = (tile_y + 1) as f32 * TILE_SIZE - HITBOX_H - physics::SNAP_MARGIN;
        Player {
            hitbox: Hitbox::new(x, y, HITBOX_W, HITBOX_H),
            spawn: (x, y),
            health: MAX_HEALTH,
            energy: MAX_ENERGY,
            energy_acc: 0.0,
            action: PlayerAction::Idle,
            anim: Anim::default(),
            facing: Facing::Right,
            in_air: false,
            air_speed: 0.0,
            moving: false,
            attacking: false,
            attack_checked: false,
            combo_index: 0,
            last_attack_ms: None,
            strike: None,
            dashing: false,
            dash_start_x: 0.0,
            dash_dir: 1.0,
            hit: false,
            hit_until_ms: 0,
            invincible_until_ms: 0,
            dying: false,
            death_finished: false,
        }
    }

    pub fn is_invincible(&self, clock_ms: u64) -> bool {
        clock_ms < self.invincible_until_ms
    }

    pub fn combo_index(&self) -> u8 {
        self.combo_index
    }

    /// Full restore: health, energy, position, state. The player object
    /// lives for the whole session — it is repositioned, never rebuilt.
    pub fn reset(&mut self) {
        self.hitbox.x = self.spawn.0;
        self.hitbox.y = self.spawn.1;
        self.health = MAX_HEALTH;
        self.energy = MAX_ENERGY;
        self.energy_acc = 0.0;
        self.action = PlayerAction::Idle;
        self.anim.reset();
        self.facing = Facing::Right;
        self.in_air = false;
        self.air_speed = 0.0;
        self.moving = false;
        self.attacking = false;
        self.attack_checked = false;
        self.combo_index = 0;
        self.last_attack_ms = None;
        self.strike = None;
        self.dashing = false;
        self.hit = false;
        self.hit_until_ms = 0;
        self.invincible_until_ms = 0;
        self.dying = false;
        self.death_finished = false;
    }

    /// The melee box in front of the current facing.
    pub fn attack_box(&self) -> Hitbox {
        let x = match self.facing {
            Facing::Right => self.hitbox.x + self.hitbox.w - 10.0,
            Facing::Left => self.hitbox.x - ATTACK_BOX_W + 10.0,
        };
        Hitbox::new(x, self.hitbox.y + 10.0, ATTACK_BOX_W, ATTACK_BOX_H)
    }

    // ══════════════════════════════════════════════════════════
    // Per-tick update
    // ══════════════════════════════════════════════════════════

    pub fn update(
        &mut self,
        grid: &TileGrid,
        input: PlayerInput,
        clock_ms: u64,
        cues: &mut Vec<PlayerCue>,
    ) {
        self.strike = None;

        // Death locks out everything except the animation advance.
        if self.dying {
            if self.anim.advance(player_frame_count(PlayerAction::Death)) {
                self.anim.freeze_on_last(player_frame_count(PlayerAction::Death));
                self.death_finished = true;
            }
            return;
        }

        // Falling out of the playfield is lethal.
        if self.hitbox.bottom() > grid.height_px() - 2.0 {
            self.start_death(cues);
            return;
        }

        if self.hit && clock_ms >= self.hit_until_ms {
            self.hit = false;
        }

        if !self.hit {
            self.handle_attack_input(input, clock_ms, cues);
            self.handle_dash_input(input, cues);
            self.update_position(grid, input, cues);
            if self.attacking {
                self.check_attack();
            }
        }

        self.regen_energy();
        self.select_action();
        self.advance_animation();
    }

    // ── Input-edge handling ──

    fn handle_attack_input(&mut self, input: PlayerInput, clock_ms: u64, cues: &mut Vec<PlayerCue>) {
        if !input.attack || self.attacking {
            return;
        }
        self.combo_index = match self.last_attack_ms {
            Some(last) if clock_ms.saturating_sub(last) <= COMBO_WINDOW_MS => {
                (self.combo_index + 1) % 3
            }
            _ => 0,
        };
        self.attacking = true;
        self.attack_checked = false;
        self.anim.reset();
        self.last_attack_ms = Some(clock_ms);
        cues.push(PlayerCue::AttackStarted(self.combo_index));
    }

    fn handle_dash_input(&mut self, input: PlayerInput, cues: &mut Vec<PlayerCue>) {
        if !input.dash || self.dashing || self.energy < DASH_ENERGY_COST {
            return;
        }
        self.dash_dir = if input.right {
            1.0
        } else if input.left {
            -1.0
        } else {
            self.facing.sign()
        };
        self.dashing = true;
        self.dash_start_x = self.hitbox.x;
        self.energy = (self.energy - DASH_ENERGY_COST).max(0);
        self.anim.reset();
        cues.push(PlayerCue::Dashed);
    }

    // ── Movement ──

    fn update_position(&mut self, grid: &TileGrid, input: PlayerInput, cues: &mut Vec<PlayerCue>) {
        self.moving = false;

        // Dashing overrides normal movement; no gravity applies.
        if self.dashing {
            self.handle_dashing(grid);
            return;
        }

        if input.jump {
            self.jump(cues);
        }

        if !self.in_air && (input.left == input.right) {
            // No horizontal intent (or both held): nothing to do on
            // the ground.
            return;
        }

        let mut x_speed = 0.0;
        if input.left {
            x_speed -= RUN_SPEED;
            self.facing = Facing::Left;
        }
        if input.right {
            x_speed += RUN_SPEED;
            self.facing = Facing::Right;
        }

        if !self.in_air && !grid.is_on_floor(&self.hitbox) {
            self.in_air = true;
        }

        if self.in_air {
            match physics::fall_step(grid, &mut self.hitbox, &mut self.air_speed) {
                AirStep::Landed => {
                    self.in_air = false;
                    self.air_speed = 0.0;
                }
                AirStep::BumpedCeiling => {
                    self.air_speed = CEILING_RESIDUAL;
                }
                AirStep::Airborne => {}
            }
            physics::move_horizontal(grid, &mut self.hitbox, x_speed);
        } else {
            physics::move_horizontal(grid, &mut self.hitbox, x_speed);
        }

        self.moving = true;
    }

    fn jump(&mut self, cues: &mut Vec<PlayerCue>) {
        if self.in_air {
            return;
        }
        self.in_air = true;
        self.air_speed = JUMP_SPEED;
        cues.push(PlayerCue::Jumped);
    }

    fn handle_dashing(&mut self, grid: &TileGrid) {
        // Distance-limited: stop once the travelled distance reaches
        // the cap.
        if (self.hitbox.x - self.dash_start_x).abs() >= DASH_DISTANCE {
            self.dashing = false;
            return;
        }
        let x_speed = DASH_SPEED * self.dash_dir;
        if !physics::move_horizontal(grid, &mut self.hitbox, x_speed) {
            // Wall contact terminates the dash at the snap position.
            self.dashing = false;
        }
        self.moving = true;
    }

    // ── Attack resolution ──

    fn check_attack(&mut self) {
        let idx = self.combo_index as usize;
        if self.anim.frame == COMBO_CHECK_FRAME[idx] && !self.attack_checked {
            self.strike = Some((self.attack_box(), COMBO_DAMAGE[idx]));
            self.attack_checked = true;
        }
    }

    // ── Damage ──

    /// Incoming damage. `knockback` is a signed archetype scale:
    /// positive pushes right. Ignored entirely while invincible.
    pub fn take_damage(
        &mut self,
        amount: i32,
        knockback: f32,
        grid: &TileGrid,
        clock_ms: u64,
        cues: &mut Vec<PlayerCue>,
    ) {
        if self.is_invincible(clock_ms) || self.dying {
            return;
        }

        if !self.hit {
            self.hit = true;
            self.hit_until_ms = clock_ms + HIT_LOCK_MS;
            self.invincible_until_ms = clock_ms + INVINCIBILITY_MS;
            self.attacking = false;
            self.dashing = false;
            self.action = PlayerAction::Hit;
            self.anim.reset();
            cues.push(PlayerCue::Hurt);
        }

        self.health -= amount;
        if self.health <= 0 {
            self.health = 0;
            self.start_death(cues);
            return;
        }

        self.apply_knockback(knockback, grid);
    }

    fn apply_knockback(&mut self, direction: f32, grid: &TileGrid) {
        let new_x = self.hitbox.x + direction * KNOCKBACK_SPEED;
        let target = Hitbox::new(new_x, self.hitbox.y, self.hitbox.w, self.hitbox.h);
        if grid.can_move_to(&target) {
            self.hitbox.x = new_x;
        }
        // Pop up a little so contact damage can't pin the player.
        if !self.in_air {
            self.in_air = true;
            self.air_speed = JUMP_SPEED / 2.0;
        }
    }

    fn start_death(&mut self, cues: &mut Vec<PlayerCue>) {
        self.dying = true;
        self.hit = false;
        self.attacking = false;
        self.dashing = false;
        self.action = PlayerAction::Death;
        self.anim.reset();
        cues.push(PlayerCue::Died);
    }

    // ── Energy ──

    fn regen_energy(&mut self) {
        if self.dashing || self.energy >= MAX_ENERGY {
            return;
        }
        // Fractional accumulation keeps low regen rates from stalling
        // on integer truncation.
        self.energy_acc += ENERGY_REGEN_RATE;
        if self.energy_acc >= 1.0 {
            let points = self.energy_acc as i32;
            self.energy = (self.energy + points).min(MAX_ENERGY);
            self.energy_acc -= points as f32;
        }
    }

    // ── Animation ──

    fn select_action(&mut self) {
        let previous = self.action;

        self.action = if self.dying {
            PlayerAction::Death
        } else if self.hit {
            PlayerAction::Hit
        } else if self.dashing {
            PlayerAction::Dash
        } else if self.attacking {
            match self.combo_index {
                0 => PlayerAction::Attack1,
                1 => PlayerAction::Attack2,
                _ => PlayerAction::Attack3,
            }
        } else if self.in_air {
            if self.air_speed < 0.0 {
                PlayerAction::Jump
            } else {
                PlayerAction::Fall
            }
        } else if self.moving {
            PlayerAction::Running
        } else {
            PlayerAction::Idle
        };

        if previous != self.action {
            self.anim.reset();
        }
    }

    fn advance_animation(&mut self) {
        if self.anim.advance(player_frame_count(self.action)) {
            match self.action {
                PlayerAction::Attack1 | PlayerAction::Attack2 | PlayerAction::Attack3 => {
                    self.attacking = false;
                }
                PlayerAction::Dash => {
                    self.dashing = false;
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

    fn grid_from(rows: &[&str]) -> TileGrid {
        let cells = rows
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { 1 } else { 0 }).collect())
            .collect();
        TileGrid::new(cells)
    }

    /// Wide open room with a floor at row 5.
    fn room() -> TileGrid {
        grid_from(&[
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "##############################",
        ])
    }

    fn tick(p: &mut Player, grid: &TileGrid, input: PlayerInput, clock_ms: u64) -> Vec<PlayerCue> {
        let mut cues = Vec::new();
        p.update(grid, input, clock_ms, &mut cues);
        cues
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    // ── Dash ──

    #[test]
    fn dash_consumes_energy_atomically() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let before = p.energy;
        tick(&mut p, &grid, PlayerInput { dash: true, ..idle() }, 0);
        assert_eq!(p.energy, (before - DASH_ENERGY_COST).max(0));
        assert!(p.dashing);
    }

    #[test]
    fn dash_denied_below_energy_cost() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        p.energy = DASH_ENERGY_COST - 1;
        tick(&mut p, &grid, PlayerInput { dash: true, ..idle() }, 0);
        assert!(!p.dashing);
        assert_eq!(p.energy, DASH_ENERGY_COST - 1);
    }

    #[test]
    fn dash_displacement_never_exceeds_distance() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let start_x = p.hitbox.x;
        let mut clock = 0;
        tick(&mut p, &grid, PlayerInput { dash: true, ..idle() }, clock);
        for _ in 0..100 {
            clock += 10;
            tick(&mut p, &grid, idle(), clock);
            assert!((p.hitbox.x - start_x).abs() <= DASH_DISTANCE);
        }
        assert!(!p.dashing);
        assert_eq!(p.hitbox.x - start_x, DASH_DISTANCE);
    }

    #[test]
    fn dash_terminates_early_on_wall() {
        // Wall three tiles to the right of the spawn column
        let grid = grid_from(&[
            "      #   ",
            "      #   ",
            "      #   ",
            "      #   ",
            "      #   ",
            "##########",
        ]);
        let mut p = Player::spawn(3, 4);
        let mut clock = 0;
        tick(&mut p, &grid, PlayerInput { dash: true, ..idle() }, clock);
        for _ in 0..40 {
            clock += 10;
            tick(&mut p, &grid, idle(), clock);
            if !p.dashing {
                break;
            }
        }
        assert!(!p.dashing);
        // Flush against the wall: right edge one margin short of it.
        assert_eq!(p.hitbox.x + p.hitbox.w, 6.0 * TILE_SIZE - physics::SNAP_MARGIN);
    }

    #[test]
    fn energy_regenerates_fractionally() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        p.energy = 0;
        let ticks_per_point = (1.0 / ENERGY_REGEN_RATE).ceil() as u64 + 1;
        let mut clock = 0;
        for _ in 0..ticks_per_point {
            clock += 10;
            tick(&mut p, &grid, idle(), clock);
        }
        assert!(p.energy >= 1);
        // Never exceeds max
        p.energy = MAX_ENERGY;
        for _ in 0..50 {
            clock += 10;
            tick(&mut p, &grid, idle(), clock);
        }
        assert_eq!(p.energy, MAX_ENERGY);
    }

    // ── Attack combo ──

    #[test]
    fn combo_sequence_within_and_past_window() {
        let grid = room();
        let mut p = Player::spawn(3, 4);

        // First attack at t=1000
        let cues = tick(&mut p, &grid, PlayerInput { attack: true, ..idle() }, 1000);
        assert!(cues.contains(&PlayerCue::AttackStarted(0)));

        // Let the swing finish, then attack at t=1100 (inside window)
        p.attacking = false;
        let cues = tick(&mut p, &grid, PlayerInput { attack: true, ..idle() }, 1100);
        assert!(cues.contains(&PlayerCue::AttackStarted(1)));

        // Third attack at t=3000 (past the window) resets to step 0
        p.attacking = false;
        let cues = tick(&mut p, &grid, PlayerInput { attack: true, ..idle() }, 3000);
        assert!(cues.contains(&PlayerCue::AttackStarted(0)));
    }

    #[test]
    fn attack_strike_fires_once_per_swing() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let mut clock = 0;
        tick(&mut p, &grid, PlayerInput { attack: true, ..idle() }, clock);
        let mut strikes = 0;
        while p.attacking {
            clock += 10;
            tick(&mut p, &grid, idle(), clock);
            if p.strike.is_some() {
                strikes += 1;
            }
        }
        assert_eq!(strikes, 1);
        assert_eq!(p.strike.map(|(_, d)| d), None);
    }

    // ── Damage / invincibility / death ──

    #[test]
    fn invincibility_suppresses_damage() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let mut cues = Vec::new();
        p.take_damage(10, 1.0, &grid, 1000, &mut cues);
        assert_eq!(p.health, 90);
        assert!(p.is_invincible(1001));

        // Second hit inside the window leaves health unchanged
        p.take_damage(10, 1.0, &grid, 1000 + INVINCIBILITY_MS - 1, &mut cues);
        assert_eq!(p.health, 90);

        // After the window, damage lands again
        p.take_damage(10, 1.0, &grid, 1000 + INVINCIBILITY_MS, &mut cues);
        assert_eq!(p.health, 80);
    }

    #[test]
    fn hit_lock_blocks_movement_input() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let mut cues = Vec::new();
        p.take_damage(10, 0.0, &grid, 1000, &mut cues);
        let x = p.hitbox.x;
        // Inside the lock: held right is ignored (gravity from the
        // knockback pop-up still applies on later ticks).
        tick(&mut p, &grid, PlayerInput { right: true, ..idle() }, 1010);
        assert_eq!(p.hitbox.x, x);
        assert_eq!(p.action, PlayerAction::Hit);
    }

    #[test]
    fn lethal_damage_is_terminal() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let mut cues = Vec::new();
        p.take_damage(150, 1.0, &grid, 1000, &mut cues);
        assert!(p.dying);
        assert_eq!(p.health, 0);
        assert!(cues.contains(&PlayerCue::Died));

        // Updates only advance the death animation
        let mut clock = 1000;
        for _ in 0..200 {
            clock += 10;
            tick(&mut p, &grid, PlayerInput { right: true, attack: true, ..idle() }, clock);
            assert_eq!(p.action, PlayerAction::Death);
        }
        assert!(p.death_finished);
    }

    #[test]
    fn falling_out_of_the_playfield_kills() {
        let grid = grid_from(&["    ", "    "]); // no floor at all
        let mut p = Player::spawn(1, 0);
        let mut clock = 0;
        for _ in 0..200 {
            clock += 10;
            tick(&mut p, &grid, PlayerInput { right: true, ..idle() }, clock);
            if p.dying {
                break;
            }
        }
        assert!(p.dying);
    }

    // ── Movement basics ──

    #[test]
    fn jump_rises_then_falls_back_to_floor() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let ground_y = p.hitbox.y;
        let mut clock = 0;
        let cues = tick(
            &mut p,
            &grid,
            PlayerInput { jump: true, right: true, ..idle() },
            clock,
        );
        assert!(cues.contains(&PlayerCue::Jumped));
        assert_eq!(p.action, PlayerAction::Jump);
        assert!(p.hitbox.y < ground_y);

        let mut landed = false;
        for _ in 0..400 {
            clock += 10;
            tick(&mut p, &grid, PlayerInput { right: true, ..idle() }, clock);
            if p.hitbox.y == ground_y && p.action == PlayerAction::Running {
                landed = true;
                break;
            }
        }
        assert!(landed);
    }

    #[test]
    fn reset_restores_full_state() {
        let grid = room();
        let mut p = Player::spawn(3, 4);
        let spawn_box = p.hitbox;
        let mut cues = Vec::new();
        let mut clock = 0;
        for _ in 0..50 {
            clock += 10;
            tick(&mut p, &grid, PlayerInput { right: true, ..idle() }, clock);
        }
        p.take_damage(150, 1.0, &grid, clock, &mut cues);
        p.reset();
        assert_eq!(p.hitbox, spawn_box);
        assert_eq!(p.health, MAX_HEALTH);
        assert_eq!(p.energy, MAX_ENERGY);
        assert_eq!(p.action, PlayerAction::Idle);
        assert!(!p.dying && !p.death_finished);
    }
}
