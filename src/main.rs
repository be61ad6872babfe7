/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::player::PlayerInput;
use sim::event::GameEvent;
use sim::level::{level_count, load_level};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Music, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new();
    world.tick_ms = config.speed.tick_rate_ms;
    world.total_levels = level_count(&config.levels_dir);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Aswang Hunter!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Edge-triggered intents can land between ticks; hold them until
    // the next simulation step consumes them.
    let mut pending_dash = false;
    let mut pending_attack = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, sound, &kb, &gp, config) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            if kb.any_pressed(KEYS_ATTACK) || gp.attack_pressed() {
                pending_attack = true;
            }
            if kb.any_pressed(KEYS_DASH) || gp.dash_pressed() {
                pending_dash = true;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if world.paused {
                // Pause blocks simulation but keeps the blink timer
                // alive for the overlay.
                world.anim_tick = world.anim_tick.wrapping_add(1);
            } else {
                match world.phase {
                    Phase::Playing | Phase::Dying => {
                        let input = PlayerInput {
                            left: kb.any_held(KEYS_LEFT) || gp.left_held(),
                            right: kb.any_held(KEYS_RIGHT) || gp.right_held(),
                            jump: kb.any_held(KEYS_JUMP) || gp.jump_held(),
                            dash: pending_dash,
                            attack: pending_attack,
                        };
                        pending_dash = false;
                        pending_attack = false;

                        let events = step::step(world, input);
                        process_sound_events(sound, &events);
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                    }
                    _ => {
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                        if world.message_timer > 0 {
                            world.message_timer -= 1;
                            if world.message_timer == 0 {
                                world.message.clear();
                            }
                        }
                    }
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Route named audio cues to the sound engine. The simulation core
/// only emits intents; playback decisions live here.
fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        match event {
            GameEvent::PlayerJumped => sfx.play_jump(),
            GameEvent::PlayerDashed => sfx.play_dash(),
            GameEvent::PlayerAttack { combo } => sfx.play_attack(*combo),
            GameEvent::PlayerHurt => sfx.play_hurt(),
            GameEvent::PlayerDied => sfx.play_death(),
            GameEvent::EnemyAttack { .. } => sfx.play_attack(2),
            GameEvent::EnemyHurt { .. } => sfx.play_hurt(),
            GameEvent::EnemyKilled { .. } => sfx.play_enemy_down(),
            GameEvent::DuwendeVanished => sfx.play_vanish(),
            GameEvent::BossSpotted => sfx.play_music(Music::Boss),
            GameEvent::BossSpecial => sfx.play_boss_special(),
            GameEvent::BossImpact => sfx.play_boss_impact(),
            GameEvent::BossDefeated => sfx.play_music(Music::Normal),
            GameEvent::LevelCleared => sfx.play_clear(),
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_ATTACK: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J'), KeyCode::Char('z'), KeyCode::Char('Z')];
const KEYS_DASH: &[KeyCode] = &[KeyCode::Char('k'), KeyCode::Char('K'), KeyCode::Char('x'), KeyCode::Char('X')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];

fn return_to_title(world: &mut WorldState, sound: Option<&SoundEngine>) {
    world.phase = Phase::Title;
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
    if let Some(sfx) = sound {
        sfx.stop_music();
    }
}

fn start_level(
    world: &mut WorldState,
    index: usize,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) {
    load_level(world, index, &config.levels_dir);
    if world.phase == Phase::Playing {
        if let Some(sfx) = sound {
            sfx.play_music(Music::Normal);
        }
    } else if let Some(sfx) = sound {
        // Past the last level: GameComplete
        sfx.stop_music();
    }
}

/// Phase and meta-key handling. Returns true to quit the program.
fn handle_meta(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                start_level(world, 0, sound, config);
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        // ── Playing ──
        Phase::Playing => {
            if world.paused {
                if esc {
                    world.paused = false;
                } else if kb.any_pressed(KEYS_QUIT) {
                    return_to_title(world, sound);
                }
                return false;
            }
            if esc {
                world.paused = true;
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                step::reset_encounter(world);
                if let Some(sfx) = sound {
                    sfx.play_music(Music::Normal);
                }
                world.set_message("Restarted", 60);
            }
        }

        // ── Level Complete ──
        Phase::LevelComplete => {
            if confirm {
                start_level(world, world.level_index + 1, sound, config);
            } else if esc {
                return_to_title(world, sound);
            }
        }

        // ── Game Over ──
        Phase::GameOver => {
            if confirm {
                // Replay the same area with a fresh roster.
                step::reset_encounter(world);
                if let Some(sfx) = sound {
                    sfx.play_music(Music::Normal);
                }
            } else if esc {
                return_to_title(world, sound);
            }
        }

        // ── Game Complete ──
        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world, sound);
            }
        }

        // Dying is internal to step(); nothing to handle here.
        Phase::Dying => {}
    }

    false
}
