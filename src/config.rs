/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `notes` and logged once
/// tracing is up (the log file location itself comes from this config).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub map: MapConfig,
    pub tiles: TileGlyphs,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
    pub source: Option<PathBuf>,
    pub notes: Vec<String>,
}

/// Fixed per-tick tuning. Entities never scale by real elapsed time.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub tick_rate_ms: u64,
    pub gravity: f32,
    pub settle_velocity: f32, // vy pinned on landing so the floor is probed every tick
    pub move_speed: f32,
    pub jump_velocity: f32,   // negative = up
    pub fire_interval: u32,   // StartShoot calls per projectile
    pub projectile_speed: f32,
    pub particle_burst: usize,
    pub particle_lifetime_max: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    pub brick_chance: f64,
    pub stone_chance: f64,
    pub seed: Option<u64>,
    pub spawn_x: f32,
    pub spawn_y: f32,
}

#[derive(Clone, Debug)]
pub struct TileGlyphs {
    pub empty: char,
    pub floor: char,
    pub brick: char,
    pub stone: char,
    pub player: char,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub fire: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    particles: TomlParticles,
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    tiles: TomlTiles,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_settle")]
    settle_velocity: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_fire_interval")]
    fire_interval: u32,
    #[serde(default = "default_projectile_speed")]
    projectile_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlParticles {
    #[serde(default = "default_burst")]
    burst: usize,
    #[serde(default = "default_lifetime_max")]
    lifetime_max: i32,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_map_width")]
    width: usize,
    #[serde(default = "default_map_height")]
    height: usize,
    #[serde(default = "default_brick_chance")]
    brick_chance: f64,
    #[serde(default = "default_stone_chance")]
    stone_chance: f64,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_spawn_x")]
    spawn_x: f32,
    #[serde(default = "default_spawn_y")]
    spawn_y: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiles {
    #[serde(default = "default_glyph_empty")]
    empty: char,
    #[serde(default = "default_glyph_floor")]
    floor: char,
    #[serde(default = "default_glyph_brick")]
    brick: char,
    #[serde(default = "default_glyph_stone")]
    stone: char,
    #[serde(default = "default_glyph_player")]
    player: char,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_fire")]
    fire: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }        // ~60 ticks/s
fn default_gravity() -> f32 { 0.25 }
fn default_settle() -> f32 { 0.25 }
fn default_move_speed() -> f32 { 2.0 }
fn default_jump_velocity() -> f32 { -5.0 }
fn default_fire_interval() -> u32 { 12 }
fn default_projectile_speed() -> f32 { 3.0 }
fn default_burst() -> usize { 16 }
fn default_lifetime_max() -> i32 { 20 }

fn default_map_width() -> usize { 32 }
fn default_map_height() -> usize { 16 }
fn default_brick_chance() -> f64 { 0x2222_2222 as f64 / 4_294_967_296.0 } // ~13.3%
fn default_stone_chance() -> f64 { 0x1111_1111 as f64 / 4_294_967_296.0 } // ~6.7%
fn default_spawn_x() -> f32 { 64.0 }
fn default_spawn_y() -> f32 { 32.0 }

fn default_glyph_empty() -> char { ' ' }
fn default_glyph_floor() -> char { '█' }
fn default_glyph_brick() -> char { '▒' }
fn default_glyph_stone() -> char { '▓' }
fn default_glyph_player() -> char { '█' }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_fire() -> Vec<String> { vec!["R1".into(), "R2".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

fn default_log_file() -> String { "pocketgame.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tick_rate_ms: default_tick_rate(),
            gravity: default_gravity(),
            settle_velocity: default_settle(),
            move_speed: default_move_speed(),
            jump_velocity: default_jump_velocity(),
            fire_interval: default_fire_interval(),
            projectile_speed: default_projectile_speed(),
        }
    }
}

impl Default for TomlParticles {
    fn default() -> Self {
        TomlParticles {
            burst: default_burst(),
            lifetime_max: default_lifetime_max(),
        }
    }
}

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            width: default_map_width(),
            height: default_map_height(),
            brick_chance: default_brick_chance(),
            stone_chance: default_stone_chance(),
            seed: None,
            spawn_x: default_spawn_x(),
            spawn_y: default_spawn_y(),
        }
    }
}

impl Default for TomlTiles {
    fn default() -> Self {
        TomlTiles {
            empty: default_glyph_empty(),
            floor: default_glyph_floor(),
            brick: default_glyph_brick(),
            stone: default_glyph_stone(),
            player: default_glyph_player(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            fire: default_pad_fire(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), None, Vec::new())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let mut notes = Vec::new();
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match read_toml(&path) {
                Ok(cfg) => return GameConfig::from_toml(cfg, Some(path), notes),
                Err(e) => {
                    notes.push(format!("{e:#}; using default settings"));
                    return GameConfig::from_toml(TomlConfig::default(), None, notes);
                }
            }
        }
        GameConfig::from_toml(TomlConfig::default(), None, notes)
    }

    /// Parse config text directly, without touching the filesystem.
    #[cfg(test)]
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let cfg: TomlConfig = toml::from_str(text).context("config.toml parse error")?;
        Ok(GameConfig::from_toml(cfg, None, Vec::new()))
    }

    fn from_toml(t: TomlConfig, source: Option<PathBuf>, mut notes: Vec<String>) -> Self {
        let mut map = MapConfig {
            width: t.map.width,
            height: t.map.height,
            brick_chance: t.map.brick_chance,
            stone_chance: t.map.stone_chance,
            seed: t.map.seed,
            spawn_x: t.map.spawn_x,
            spawn_y: t.map.spawn_y,
        };
        // The border needs at least one interior cell to stand in.
        if map.width < 3 || map.height < 3 {
            notes.push(format!(
                "map {}x{} too small; using {}x{}",
                map.width, map.height, default_map_width(), default_map_height(),
            ));
            map.width = default_map_width();
            map.height = default_map_height();
        }
        let total = map.brick_chance + map.stone_chance;
        if !(0.0..=1.0).contains(&map.brick_chance)
            || !(0.0..=1.0).contains(&map.stone_chance)
            || total > 1.0
        {
            notes.push(format!(
                "block chances {}/{} out of range; using defaults",
                map.brick_chance, map.stone_chance,
            ));
            map.brick_chance = default_brick_chance();
            map.stone_chance = default_stone_chance();
        }

        let mut physics = PhysicsConfig {
            tick_rate_ms: t.physics.tick_rate_ms.max(1),
            gravity: t.physics.gravity,
            settle_velocity: t.physics.settle_velocity,
            move_speed: t.physics.move_speed,
            jump_velocity: t.physics.jump_velocity,
            fire_interval: t.physics.fire_interval,
            projectile_speed: t.physics.projectile_speed,
            particle_burst: t.particles.burst,
            particle_lifetime_max: t.particles.lifetime_max,
        };
        if physics.fire_interval == 0 {
            notes.push("fire_interval must be at least 1; using 12".into());
            physics.fire_interval = default_fire_interval();
        }
        if physics.particle_lifetime_max < 1 {
            notes.push("particles.lifetime_max must be at least 1; using 20".into());
            physics.particle_lifetime_max = default_lifetime_max();
        }

        GameConfig {
            physics,
            map,
            tiles: TileGlyphs {
                empty: t.tiles.empty,
                floor: t.tiles.floor,
                brick: t.tiles.brick,
                stone: t.tiles.stone,
                player: t.tiles.player,
            },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                fire: t.gamepad.fire,
                restart: t.gamepad.restart,
                quit: t.gamepad.quit,
            },
            log: LogConfig {
                file: PathBuf::from(t.log.file),
                level: t.log.level,
            },
            source,
            notes,
        }
    }

    /// Emit what happened during `load` into the log.
    pub fn report(&self) {
        match &self.source {
            Some(path) => tracing::info!(path = %path.display(), "loaded config"),
            None => tracing::info!("using built-in defaults"),
        }
        for note in &self.notes {
            tracing::warn!("config: {note}");
        }
    }
}

fn read_toml(path: &Path) -> anyhow::Result<TomlConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("{} parse error", path.display()))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.physics.fire_interval, 12);
        assert_eq!(cfg.physics.particle_burst, 16);
        assert_eq!(cfg.physics.particle_lifetime_max, 20);
        assert_eq!(cfg.map.width, 32);
        assert_eq!(cfg.map.height, 16);
        assert!(cfg.map.seed.is_none());
        assert!(cfg.notes.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::parse("[physics]\ngravity = 0.5\n[map]\nseed = 7\n").unwrap();
        assert_eq!(cfg.physics.gravity, 0.5);
        assert_eq!(cfg.physics.jump_velocity, -5.0);
        assert_eq!(cfg.map.seed, Some(7));
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(GameConfig::parse("[physics\ngravity = ").is_err());
    }

    #[test]
    fn out_of_range_values_fall_back_with_note() {
        let cfg = GameConfig::parse(
            "[map]\nwidth = 1\nbrick_chance = 0.9\nstone_chance = 0.5\n[physics]\nfire_interval = 0\n",
        )
        .unwrap();
        assert_eq!(cfg.map.width, 32);
        assert_eq!(cfg.map.brick_chance, default_brick_chance());
        assert_eq!(cfg.physics.fire_interval, 12);
        assert_eq!(cfg.notes.len(), 3);
    }

    #[test]
    fn default_chances_match_value_space_bands() {
        let brick = (default_brick_chance() * 4_294_967_296.0).round() as u64;
        let stone = (default_stone_chance() * 4_294_967_296.0).round() as u64;
        assert_eq!(brick, 0x2222_2222);
        assert_eq!(stone, 0x1111_1111);
    }
}
