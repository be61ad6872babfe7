/// The step function: advances the world by one tick.
///
/// Processing order (fixed — determinism depends on it):
///   1. Clock advance
///   2. Player update (input → movement/attack state)
///   3. Enemy updates (each reads the player's position read-only)
///   4. Encounter resolution (player strike vs enemies, enemy strikes
///      and contact vs player)
///   5. Level-complete check
///
/// Enemies never observe each other's this-tick state; encounter
/// resolution runs only after every entity has moved.

use crate::domain::enemy::EnemyCue;
use crate::domain::entity::{Archetype, EnemyState};
use crate::domain::player::{PlayerCue, PlayerInput};
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: PlayerInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    match world.phase {
        Phase::Playing => {}
        // While the player is dying, only the death animation advances.
        Phase::Dying => {
            world.tick += 1;
            world.clock_ms += world.tick_ms;
            resolve_player(world, PlayerInput::default(), &mut events);
            if world.player.death_finished {
                world.phase = Phase::GameOver;
            }
            return events;
        }
        _ => return events,
    }

    world.tick += 1;
    world.clock_ms += world.tick_ms;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    resolve_player(world, input, &mut events);
    resolve_enemies(world, &mut events);
    resolve_player_strike(world, &mut events);
    resolve_enemy_strikes(world, &mut events);
    resolve_contact(world, &mut events);

    if world.player.dying {
        world.phase = Phase::Dying;
    } else {
        resolve_level_complete(world, &mut events);
    }

    world
        .camera
        .follow(world.player.hitbox.center_x(), world.grid.width_px());

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, input: PlayerInput, events: &mut Vec<GameEvent>) {
    let mut cues = Vec::new();
    let clock = world.clock_ms;
    world.player.update(&world.grid, input, clock, &mut cues);
    for cue in cues {
        events.push(match cue {
            PlayerCue::Jumped => GameEvent::PlayerJumped,
            PlayerCue::Dashed => GameEvent::PlayerDashed,
            PlayerCue::AttackStarted(combo) => GameEvent::PlayerAttack { combo },
            PlayerCue::Hurt => GameEvent::PlayerHurt,
            PlayerCue::Died => GameEvent::PlayerDied,
        });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player_box = world.player.hitbox;
    let level_index = world.level_index;
    let clock = world.clock_ms;

    let mut cues = Vec::new();
    for enemy in world.enemies.iter_mut() {
        if !enemy.active {
            continue;
        }
        cues.clear();
        enemy.update(&world.grid, &player_box, level_index, clock, &mut cues);
        for cue in &cues {
            events.push(match cue {
                EnemyCue::AttackSwing => GameEvent::EnemyAttack { archetype: enemy.archetype },
                EnemyCue::SpecialLaunched => GameEvent::BossSpecial,
                EnemyCue::SpecialImpact => GameEvent::BossImpact,
                EnemyCue::PlayerSpotted => GameEvent::BossSpotted,
                EnemyCue::VanishStarted => GameEvent::DuwendeVanished,
            });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Encounter resolution
// ══════════════════════════════════════════════════════════════

/// Player attack vs enemy hitboxes. The first intersecting active,
/// visible enemy takes the hit; one enemy per swing.
fn resolve_player_strike(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some((attack_box, damage)) = world.player.strike else {
        return;
    };
    for enemy in world.enemies.iter_mut() {
        if !enemy.active || enemy.is_invisible() {
            continue;
        }
        if !attack_box.intersects(&enemy.hitbox) {
            continue;
        }
        // The boss shrugs off half of every hit.
        let applied = match enemy.archetype {
            Archetype::Tikbalang => damage / 2,
            _ => damage,
        };
        let killed = enemy.hurt(applied);
        events.push(if killed {
            GameEvent::EnemyKilled { archetype: enemy.archetype }
        } else {
            GameEvent::EnemyHurt { archetype: enemy.archetype }
        });
        if killed && enemy.archetype == Archetype::Tikbalang {
            events.push(GameEvent::BossDefeated);
        }
        return;
    }
}

/// Attack-frame and slam strikes recorded by enemies this tick.
/// Damage lands only while the player is vulnerable.
fn resolve_enemy_strikes(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let clock = world.clock_ms;
    let mut hits: Vec<(i32, f32)> = Vec::new();

    for enemy in world.enemies.iter() {
        if !enemy.active || enemy.is_invisible() {
            continue;
        }
        let Some(strike) = enemy.strike else { continue };
        if !strike.area.intersects(&world.player.hitbox) {
            continue;
        }
        let direction = if world.player.hitbox.x < enemy.hitbox.x {
            -strike.knockback
        } else {
            strike.knockback
        };
        hits.push((strike.damage, direction));
    }

    for (damage, direction) in hits {
        let mut cues = Vec::new();
        world
            .player
            .take_damage(damage, direction, &world.grid, clock, &mut cues);
        push_player_damage_events(&cues, events);
    }
}

/// Body contact: each active, visible, living enemy against the player
/// hitbox. First match wins; invincibility skips the whole pass.
fn resolve_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let clock = world.clock_ms;
    if world.player.is_invincible(clock) || world.player.dying {
        return;
    }

    let player_box = world.player.hitbox;
    let mut hit: Option<(i32, f32)> = None;

    for enemy in world.enemies.iter() {
        if !enemy.active || enemy.is_invisible() || enemy.state == EnemyState::Dead {
            continue;
        }
        if !enemy.hitbox.intersects(&player_box) {
            continue;
        }
        let p = crate::domain::entity::params(enemy.archetype);
        let direction = if player_box.x < enemy.hitbox.x {
            -p.knockback
        } else {
            p.knockback
        };
        hit = Some((p.contact_damage, direction));
        break;
    }

    if let Some((damage, direction)) = hit {
        let mut cues = Vec::new();
        world
            .player
            .take_damage(damage, direction, &world.grid, clock, &mut cues);
        push_player_damage_events(&cues, events);
    }
}

fn push_player_damage_events(cues: &[PlayerCue], events: &mut Vec<GameEvent>) {
    for cue in cues {
        match cue {
            PlayerCue::Hurt => events.push(GameEvent::PlayerHurt),
            PlayerCue::Died => events.push(GameEvent::PlayerDied),
            _ => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Completion / reset
// ══════════════════════════════════════════════════════════════

fn resolve_level_complete(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase == Phase::Playing && !world.any_enemy_active() {
        world.phase = Phase::LevelComplete;
        events.push(GameEvent::LevelCleared);
    }
}

/// Hard reset of the whole encounter: the player back to spawn at full
/// strength, every enemy back to its spawn snapshot, all ability
/// cooldowns and special states cleared. Used for death-replay and the
/// restart key — a reset is a state clear, not a graceful drain.
pub fn reset_encounter(world: &mut WorldState) {
    world.player.reset();
    for enemy in world.enemies.iter_mut() {
        enemy.reset();
    }
    world.tick = 0;
    world.clock_ms = 0;
    world.phase = Phase::Playing;
    world
        .camera
        .center_on(world.player.hitbox.center_x(), world.grid.width_px());
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enemy::{Enemy, Strike};
    use crate::domain::entity::Behavior;
    use crate::domain::player::{Player, MAX_HEALTH};
    use crate::domain::tile::{Hitbox, TileGrid};

    fn grid_from(rows: &[&str]) -> TileGrid {
        let cells = rows
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { 1 } else { 0 }).collect())
            .collect();
        TileGrid::new(cells)
    }

    /// A playing world on a long flat floor.
    fn world_with(enemies: Vec<Enemy>) -> WorldState {
        let mut w = WorldState::new();
        w.grid = grid_from(&[
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "##############################",
        ]);
        w.player = Player::spawn(2, 3);
        w.enemies = enemies;
        w.phase = Phase::Playing;
        w
    }

    #[test]
    fn step_advances_clock_by_tick_ms() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Sigbin, 20, 3)]);
        w.tick_ms = 10;
        step(&mut w, PlayerInput::default());
        step(&mut w, PlayerInput::default());
        assert_eq!(w.clock_ms, 20);
        assert_eq!(w.tick, 2);
    }

    #[test]
    fn player_strike_hits_first_enemy_only() {
        let mut w = world_with(vec![
            Enemy::spawn(Archetype::Sigbin, 3, 3),
            Enemy::spawn(Archetype::Sigbin, 3, 3),
        ]);
        // A strike box covering both enemies
        w.player.strike = Some((Hitbox::new(0.0, 0.0, 500.0, 200.0), 10));
        let mut events = Vec::new();
        resolve_player_strike(&mut w, &mut events);

        let full = crate::domain::entity::params(Archetype::Sigbin).max_health;
        assert_eq!(w.enemies[0].health, full - 10);
        assert_eq!(w.enemies[1].health, full);
        assert_eq!(events, vec![GameEvent::EnemyHurt { archetype: Archetype::Sigbin }]);
    }

    #[test]
    fn boss_takes_half_damage() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Tikbalang, 3, 3)]);
        w.player.strike = Some((Hitbox::new(0.0, 0.0, 500.0, 200.0), 20));
        let mut events = Vec::new();
        resolve_player_strike(&mut w, &mut events);
        let full = crate::domain::entity::params(Archetype::Tikbalang).max_health;
        assert_eq!(w.enemies[0].health, full - 10);
    }

    #[test]
    fn invisible_enemy_cannot_be_hit_or_touched() {
        let mut duwende = Enemy::spawn(Archetype::Duwende, 2, 3);
        if let crate::domain::enemy::SpecialState::Duwende {
            ref mut invisible, ref mut last_vanish_ms,
        } = duwende.special
        {
            *invisible = true;
            *last_vanish_ms = Some(0);
        }
        let mut w = world_with(vec![duwende]);
        // Put the enemy exactly on the player
        w.enemies[0].hitbox = w.player.hitbox;

        // Attack passes through
        w.player.strike = Some((Hitbox::new(0.0, 0.0, 900.0, 200.0), 10));
        let mut events = Vec::new();
        resolve_player_strike(&mut w, &mut events);
        let full = crate::domain::entity::params(Archetype::Duwende).max_health;
        assert_eq!(w.enemies[0].health, full);

        // No contact damage either
        resolve_contact(&mut w, &mut events);
        assert_eq!(w.player.health, MAX_HEALTH);
        assert!(events.is_empty());
    }

    #[test]
    fn contact_damages_and_knocks_back_once() {
        let mut w = world_with(vec![
            Enemy::spawn(Archetype::Sigbin, 2, 3),
            Enemy::spawn(Archetype::Sigbin, 2, 3),
        ]);
        // Both overlap the player; only the first lands a hit this tick
        w.enemies[0].hitbox = w.player.hitbox;
        w.enemies[1].hitbox = w.player.hitbox;
        w.clock_ms = 5000;

        let mut events = Vec::new();
        resolve_contact(&mut w, &mut events);
        let dmg = crate::domain::entity::params(Archetype::Sigbin).contact_damage;
        assert_eq!(w.player.health, MAX_HEALTH - dmg);
        assert_eq!(events, vec![GameEvent::PlayerHurt]);
    }

    #[test]
    fn contact_skipped_while_invincible() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Sigbin, 2, 3)]);
        w.enemies[0].hitbox = w.player.hitbox;
        w.clock_ms = 5000;

        let mut events = Vec::new();
        resolve_contact(&mut w, &mut events);
        let after_first = w.player.health;

        // Immediately again: invincibility window suppresses it
        resolve_contact(&mut w, &mut events);
        assert_eq!(w.player.health, after_first);
    }

    #[test]
    fn enemy_strike_damages_player() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Sigbin, 3, 3)]);
        w.clock_ms = 5000;
        w.enemies[0].strike = Some(Strike {
            area: Hitbox::new(0.0, 0.0, 900.0, 200.0),
            damage: 10,
            knockback: 1.0,
        });
        let mut events = Vec::new();
        resolve_enemy_strikes(&mut w, &mut events);
        assert_eq!(w.player.health, MAX_HEALTH - 10);
        assert!(events.contains(&GameEvent::PlayerHurt));
    }

    #[test]
    fn level_complete_fires_when_roster_is_down() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Sigbin, 20, 3)]);
        w.enemies[0].active = false;
        let events = step(&mut w, PlayerInput::default());
        assert_eq!(w.phase, Phase::LevelComplete);
        assert!(events.contains(&GameEvent::LevelCleared));
    }

    #[test]
    fn reset_restores_roster_and_player() {
        let mut w = world_with(vec![
            Enemy::spawn(Archetype::Sigbin, 10, 3),
            Enemy::spawn(Archetype::Duwende, 15, 3),
            Enemy::spawn(Archetype::Tikbalang, 20, 3),
        ]);
        let spawn_boxes: Vec<_> = w.enemies.iter().map(|e| e.hitbox).collect();

        // Rough the world up a bit
        for _ in 0..300 {
            step(&mut w, PlayerInput { right: true, ..Default::default() });
        }
        w.enemies[0].hurt(10);
        w.enemies[1].hurt(100);
        w.player.health = 30;

        reset_encounter(&mut w);

        assert_eq!(w.player.health, MAX_HEALTH);
        for (enemy, spawn_box) in w.enemies.iter().zip(&spawn_boxes) {
            assert_eq!(enemy.hitbox, *spawn_box);
            assert_eq!(enemy.health, crate::domain::entity::params(enemy.archetype).max_health);
            assert_eq!(enemy.state, EnemyState::Idle);
            assert_eq!(enemy.behavior, Behavior::Patrolling);
            assert!(enemy.active);
        }
        assert_eq!(w.clock_ms, 0);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn player_death_leads_to_game_over() {
        let mut w = world_with(vec![Enemy::spawn(Archetype::Sigbin, 20, 3)]);
        let grid = w.grid.clone();
        let mut cues = Vec::new();
        w.player.take_damage(200, 1.0, &grid, 0, &mut cues);
        assert!(w.player.dying);

        let mut saw_game_over = false;
        for _ in 0..300 {
            step(&mut w, PlayerInput::default());
            if w.phase == Phase::GameOver {
                saw_game_over = true;
                break;
            }
        }
        assert!(saw_game_over);
    }
}
