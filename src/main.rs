/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::KeyCode;
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use domain::entity::{Action, EntityId};
use domain::geom::Vec2;
use sim::event::GameEvent;
use sim::world::World;
use ui::assets::Assets;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    if let Err(e) = init_tracing(&config.log) {
        eprintln!("Logging disabled: {e:#}");
    }
    config.report();

    let (mut world, mut player) = World::new_session(&config);
    let mut renderer = Renderer::new(Assets::from_config(&config.tiles));

    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            let _ = renderer.cleanup();
            tracing::error!("terminal init failed: {e}");
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(
        &mut world,
        &mut player,
        &mut renderer,
        sound.as_ref(),
        &config,
        honor_release,
    );

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            tracing::info!(ticks = world.tick(), "session ended");
            println!("Thanks for playing!");
        }
        Err(e) => {
            tracing::error!("game error: {e:#}");
            eprintln!("Game error: {e:#}");
        }
    }
}

/// Log to the configured file; the terminal is in raw mode while playing.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(cfg: &LogConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.file)
        .with_context(|| format!("cannot open log file {}", cfg.file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))
}

fn game_loop(
    world: &mut World,
    player: &mut EntityId,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.physics.tick_rate_ms);

    // Edge-triggered jump is latched between ticks so a short tap is not lost
    let mut pending_jump = false;
    let mut shooting = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            break;
        }
        if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
            let (fresh, id) = World::new_session(config);
            *world = fresh;
            *player = id;
            pending_jump = false;
            shooting = false;
            tracing::info!("session restarted");
        }
        if kb.any_pressed(KEYS_JUMP) || gp.jump_pressed() {
            pending_jump = true;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            let mouse = kb.take_mouse_aim();
            let aim = detect_aim(&kb, &gp, mouse, renderer, world, *player);
            let fire = kb.any_held(KEYS_FIRE) || kb.mouse_down || gp.fire_held();
            for action in frame_actions(&kb, &gp, aim, pending_jump, fire, &mut shooting) {
                world.apply_action(*player, action);
            }
            pending_jump = false;

            world.update(elapsed);
            process_events(sound, &world.drain_events());
            last_tick = Instant::now();
        }

        renderer.render(world).context("frame render failed")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Input → actions ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_FIRE: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_AIM_UP: &[KeyCode] = &[KeyCode::Char('i'), KeyCode::Char('I')];
const KEYS_AIM_LEFT: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J')];
const KEYS_AIM_DOWN: &[KeyCode] = &[KeyCode::Char('k'), KeyCode::Char('K')];
const KEYS_AIM_RIGHT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Aim keys win over the mouse, the mouse over the right stick. `mouse` is
/// the cursor cell if it moved since the previous tick.
fn detect_aim(
    kb: &InputState,
    gp: &GamepadState,
    mouse: Option<(u16, u16)>,
    renderer: &Renderer,
    world: &World,
    player: EntityId,
) -> Option<Vec2> {
    let axis = |neg: &[KeyCode], pos: &[KeyCode]| -> f32 {
        (kb.any_held(pos) as i32 - kb.any_held(neg) as i32) as f32
    };
    let keys = Vec2::new(axis(KEYS_AIM_LEFT, KEYS_AIM_RIGHT), axis(KEYS_AIM_UP, KEYS_AIM_DOWN));
    if keys != Vec2::ZERO {
        return Some(keys);
    }

    if let Some((col, row)) = mouse {
        let target = renderer.world_point(world, col, row);
        let origin = world.entity(player).map(|e| e.position());
        if let (Some(t), Some(o)) = (target, origin) {
            return Some(t - o);
        }
    }

    if gp.connected {
        return gp.aim();
    }
    None
}

fn frame_actions(
    kb: &InputState,
    gp: &GamepadState,
    aim: Option<Vec2>,
    jump: bool,
    fire: bool,
    shooting: &mut bool,
) -> Vec<Action> {
    let mut actions = Vec::with_capacity(4);
    if let Some(v) = aim {
        actions.push(Action::Aim(v));
    }

    let left = kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held();
    let right = kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held();
    actions.extend(move_action(left, right));

    if jump {
        actions.push(Action::Jump);
    }

    if fire {
        actions.push(Action::StartShoot);
        *shooting = true;
    } else if *shooting {
        actions.push(Action::StopShoot);
        *shooting = false;
    }
    actions
}

/// Left wins when both directions are held.
fn move_action(left: bool, right: bool) -> Option<Action> {
    if left {
        Some(Action::MoveLeft)
    } else if right {
        Some(Action::MoveRight)
    } else {
        None
    }
}

// ── Events → sound / log ──

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Jumped => {
                if let Some(sfx) = sound { sfx.play_jump(); }
            }
            GameEvent::Landed { at } => {
                tracing::trace!(x = at.x, y = at.y, "landed");
                if let Some(sfx) = sound { sfx.play_land(); }
            }
            GameEvent::Fired { at } => {
                tracing::trace!(x = at.x, y = at.y, "fired");
                if let Some(sfx) = sound { sfx.play_shot(); }
            }
            GameEvent::Impact { at, particles } => {
                tracing::debug!(x = at.x, y = at.y, particles, "impact");
                if let Some(sfx) = sound { sfx.play_impact(); }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_wins_when_both_directions_are_held() {
        assert_eq!(move_action(true, true), Some(Action::MoveLeft));
        assert_eq!(move_action(true, false), Some(Action::MoveLeft));
        assert_eq!(move_action(false, true), Some(Action::MoveRight));
        assert_eq!(move_action(false, false), None);
    }
}
