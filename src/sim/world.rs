/// World: owns the grid, every entity and every particle.
///
/// ## Ownership
///
/// Entities live in a `HashMap<EntityId, Entity>` and never hold a pointer
/// back to the World. Each hook gets a short-lived `Ctx` built from the
/// World's other fields (grid, tuning, RNG, spawn/particle/event queues),
/// so an entity can spawn things while the map itself is being iterated.
///
/// ## Update order
///
///   1. particles move and age; expired ones are dropped
///   2. live entities update in id order
///   3. dead entities are purged
///   4. entities spawned during 2 are inserted (first updated next frame)
///
/// Killing an entity mid-sweep only flips its flag, so the sweep itself is
/// never disturbed.
///
/// ## Camera
///
/// The render offset centers the follow entity: its floored position minus
/// half the viewport. Without a follow target the map center is used.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, PhysicsConfig};
use crate::domain::canvas::{Canvas, Sprite};
use crate::domain::entity::{Action, Ctx, Entity, EntityId};
use crate::domain::geom::{IVec2, Vec2};
use crate::domain::grid::{Grid, TILE_SIZE};
use crate::domain::particle::Particle;
use crate::domain::player::PLAYER_HITBOX;
use crate::sim::event::GameEvent;

pub struct World {
    grid: Grid,
    entities: HashMap<EntityId, Entity>,
    particles: Vec<Particle>,
    follow: Option<EntityId>,
    last_id: u32,
    rng: StdRng,
    tuning: PhysicsConfig,

    // ── Queues filled through Ctx ──
    spawned: Vec<Entity>,
    events: Vec<GameEvent>,

    // ── Meta ──
    tick: u64,
    clock: Duration,
}

// ── Construction ──

impl World {
    pub fn with_grid(grid: Grid, tuning: PhysicsConfig, rng: StdRng) -> Self {
        World {
            grid,
            entities: HashMap::new(),
            particles: Vec::new(),
            follow: None,
            last_id: 0,
            rng,
            tuning,
            spawned: Vec::new(),
            events: Vec::new(),
            tick: 0,
            clock: Duration::ZERO,
        }
    }

    /// Fresh map plus a player at the configured spawn, followed by the camera.
    pub fn new_session(cfg: &GameConfig) -> (World, EntityId) {
        let mut rng = match cfg.map.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let spawn = clamp_spawn(cfg);
        let keep_clear: Vec<IVec2> = PLAYER_HITBOX
            .corners
            .iter()
            .map(|&c| (spawn + Vec2::from(c)).cell(TILE_SIZE))
            .collect();
        let grid = Grid::generate(&cfg.map, &mut rng, &keep_clear);

        let mut world = World::with_grid(grid, cfg.physics.clone(), rng);
        let player = world.add_entity(Entity::player(spawn));
        world.set_follow(player);

        tracing::info!(
            width = cfg.map.width,
            height = cfg.map.height,
            seed = ?cfg.map.seed,
            spawn_x = spawn.x,
            spawn_y = spawn.y,
            "session started"
        );
        (world, player)
    }
}

/// Keep the spawn point far enough from the frame that the hitbox fits.
fn clamp_spawn(cfg: &GameConfig) -> Vec2 {
    let [tl, _, br, _] = PLAYER_HITBOX.corners;
    let min_x = (TILE_SIZE - tl.x) as f32;
    let min_y = (TILE_SIZE - tl.y) as f32;
    let max_x = ((cfg.map.width as i32 - 1) * TILE_SIZE - br.x - 1) as f32;
    let max_y = ((cfg.map.height as i32 - 1) * TILE_SIZE - br.y - 1) as f32;

    let wanted = Vec2::new(cfg.map.spawn_x, cfg.map.spawn_y);
    let spawn = Vec2::new(
        wanted.x.min(max_x).max(min_x),
        wanted.y.min(max_y).max(min_y),
    );
    if spawn != wanted {
        tracing::warn!(x = wanted.x, y = wanted.y, "spawn point outside play area, moved inside");
    }
    spawn
}

// ── Entities and particles ──

impl World {
    /// Insert an entity and return its freshly assigned id.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        self.last_id += 1;
        let id = EntityId(self.last_id);
        entity.bind(id);
        tracing::debug!(id = id.0, projectile = entity.is_projectile(), "entity added");
        self.entities.insert(id, entity);
        id
    }

    /// Mark an entity dead. It is purged at the end of the next update.
    /// Returns false for unknown ids.
    #[allow(dead_code)]
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.kill();
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn add_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn set_follow(&mut self, id: EntityId) {
        self.follow = Some(id);
    }

    pub fn follow(&self) -> Option<EntityId> {
        self.follow
    }

    #[cfg(test)]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Sum of the elapsed times passed to `update`.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Hand buffered events to the caller.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn flush_spawned(&mut self) {
        for entity in std::mem::take(&mut self.spawned) {
            self.add_entity(entity);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Per-frame operations
// ══════════════════════════════════════════════════════════════

impl World {
    /// Deliver one action to a live entity. Returns false if there is none.
    pub fn apply_action(&mut self, id: EntityId, action: Action) -> bool {
        let entity = match self.entities.get_mut(&id) {
            Some(e) if !e.is_dead() => e,
            _ => return false,
        };
        let mut ctx = Ctx::new(
            &self.grid,
            &self.tuning,
            &mut self.rng,
            &mut self.spawned,
            &mut self.particles,
            &mut self.events,
        );
        entity.on_action(action, &mut ctx);
        self.flush_spawned();
        true
    }

    /// Advance one frame. Entity logic runs on fixed steps; `elapsed` only
    /// feeds the session clock.
    pub fn update(&mut self, elapsed: Duration) {
        self.tick += 1;
        self.clock += elapsed;

        self.particles.retain_mut(|p| !p.tick());

        let ids = self.sorted_ids();
        let mut ctx = Ctx::new(
            &self.grid,
            &self.tuning,
            &mut self.rng,
            &mut self.spawned,
            &mut self.particles,
            &mut self.events,
        );
        for id in ids {
            if let Some(entity) = self.entities.get_mut(&id) {
                if !entity.is_dead() {
                    entity.update(&mut ctx);
                }
            }
        }

        self.entities.retain(|id, e| {
            if e.is_dead() {
                tracing::debug!(id = id.0, "entity purged");
            }
            !e.is_dead()
        });
        self.flush_spawned();
    }

    /// Grid cells, then live entities, then particles, all shifted by the
    /// camera offset.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        let offset = self.camera_offset(canvas.viewport());
        canvas.clear();

        let cell = IVec2::new(TILE_SIZE, TILE_SIZE);
        for (at, tile) in self.grid.cells() {
            canvas.draw_sprite(at * TILE_SIZE - offset, cell, Sprite::Tile(tile));
        }
        for id in self.sorted_ids() {
            let entity = &self.entities[&id];
            if !entity.is_dead() {
                entity.render(canvas, offset);
            }
        }
        for p in &self.particles {
            p.render(canvas, offset);
        }
    }

    /// Top-left world coordinate of a viewport of `viewport` world units.
    pub fn camera_offset(&self, viewport: IVec2) -> IVec2 {
        let target = match self.follow.and_then(|id| self.entities.get(&id)) {
            Some(entity) => entity.position().floor(),
            None => IVec2::new(
                self.grid.width() as i32 * TILE_SIZE / 2,
                self.grid.height() as i32 * TILE_SIZE / 2,
            ),
        };
        target - viewport.half()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::canvas::recording::{Draw, RecordingCanvas};
    use crate::domain::canvas::Paint;
    use crate::domain::tile::Tile;

    const FRAME: Duration = Duration::from_millis(16);

    // 8x6 cells: open room over a floor at y = 80, right wall from x = 112
    const ROOM: [&str; 6] = [
        "########",
        "#      #",
        "#      #",
        "#      #",
        "#      #",
        "========",
    ];

    fn room() -> World {
        World::with_grid(
            Grid::from_rows(&ROOM),
            GameConfig::default().physics,
            StdRng::seed_from_u64(7),
        )
    }

    fn shot(x: f32, y: f32, dx: f32) -> Entity {
        Entity::projectile(Vec2::new(x, y), Vec2::new(dx, 0.0), 3.0)
    }

    #[test]
    fn ids_start_at_one_and_are_never_reused() {
        let mut w = room();
        let a = w.add_entity(Entity::player(Vec2::new(40.0, 40.0)));
        let b = w.add_entity(shot(40.0, 56.0, 1.0));
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));
        assert_eq!(w.entity(b).map(|e| e.id()), Some(b));

        w.remove_entity(b);
        w.update(FRAME);
        let c = w.add_entity(shot(40.0, 56.0, 1.0));
        assert_eq!(c, EntityId(3));
    }

    #[test]
    fn removal_takes_effect_after_update() {
        let mut w = room();
        let id = w.add_entity(shot(40.0, 40.0, 1.0));
        assert!(w.remove_entity(id));
        assert!(w.entity(id).map_or(false, |e| e.is_dead()));
        w.update(FRAME);
        assert!(w.entity(id).is_none());
        assert!(!w.remove_entity(id));
    }

    #[test]
    fn dead_entity_is_not_rendered() {
        let mut w = room();
        let id = w.add_entity(shot(40.0, 40.0, 1.0));
        w.remove_entity(id);
        let mut canvas = RecordingCanvas::new(64, 32);
        w.render(&mut canvas);
        assert!(!canvas.calls.iter().any(|c| matches!(c, Draw::Rect(..))));
    }

    #[test]
    fn actions_to_unknown_or_dead_ids_are_dropped() {
        let mut w = room();
        assert!(!w.apply_action(EntityId(42), Action::Jump));
        let id = w.add_entity(Entity::player(Vec2::new(40.0, 40.0)));
        w.remove_entity(id);
        assert!(!w.apply_action(id, Action::StartShoot));
        assert_eq!(w.entity_count(), 1);
    }

    #[test]
    fn held_fire_spawns_one_projectile_per_interval() {
        let mut w = room();
        let p = w.add_entity(Entity::player(Vec2::new(40.0, 40.0)));
        for _ in 0..24 {
            assert!(w.apply_action(p, Action::StartShoot));
        }
        assert_eq!(w.entity_count(), 3);

        w.apply_action(p, Action::StopShoot);
        w.apply_action(p, Action::StartShoot);
        assert_eq!(w.entity_count(), 4);
        let fired = w
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Fired { .. }))
            .count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn action_spawns_sit_still_until_next_update() {
        let mut w = room();
        let p = w.add_entity(Entity::player(Vec2::new(40.0, 40.0)));
        w.apply_action(p, Action::StartShoot);
        let bullet = EntityId(2);
        assert_eq!(w.entity(bullet).map(|e| e.position()), Some(Vec2::new(40.0, 40.0)));
        w.update(FRAME);
        assert_eq!(w.entity(bullet).map(|e| e.position()), Some(Vec2::new(43.0, 40.0)));
    }

    #[test]
    fn sweep_spawns_join_after_the_purge_and_wait_a_frame() {
        let mut w = room();
        let gone = w.add_entity(shot(40.0, 40.0, 1.0));
        w.remove_entity(gone);
        // Queued the way Ctx::spawn queues during a sweep
        w.spawned.push(shot(60.0, 40.0, 1.0));

        w.update(FRAME);
        assert!(w.entity(gone).is_none());
        assert_eq!(w.entity_count(), 1);
        let fresh = EntityId(2);
        assert_eq!(w.entity(fresh).map(|e| e.id()), Some(fresh));
        assert_eq!(w.entity(fresh).map(|e| e.position()), Some(Vec2::new(60.0, 40.0)));

        w.update(FRAME);
        assert_eq!(w.entity(fresh).map(|e| e.position()), Some(Vec2::new(63.0, 40.0)));
        assert_eq!(w.add_entity(shot(40.0, 40.0, 1.0)), EntityId(3));
    }

    #[test]
    fn projectile_hit_leaves_a_burst_and_is_purged() {
        let mut w = room();
        let id = w.add_entity(shot(111.0, 40.0, 1.0));
        w.update(FRAME);
        assert!(w.entity(id).is_none());
        assert_eq!(w.entity_count(), 0);
        assert_eq!(w.particle_count(), 16);

        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::Impact { particles: 16, .. }));
        assert!(w.drain_events().is_empty());
    }

    #[test]
    fn particle_lives_exactly_its_lifetime() {
        let mut w = room();
        w.add_particle(Particle::new(Vec2::new(40.0, 40.0), Vec2::ZERO, 3));
        w.update(FRAME);
        w.update(FRAME);
        assert_eq!(w.particle_count(), 1);
        w.update(FRAME);
        assert_eq!(w.particle_count(), 0);
    }

    #[test]
    fn self_removal_mid_sweep_leaves_others_updated_once() {
        let mut w = room();
        let doomed = w.add_entity(shot(111.0, 40.0, 1.0));
        let right = w.add_entity(shot(40.0, 40.0, 1.0));
        let left = w.add_entity(shot(40.0, 56.0, -1.0));
        w.update(FRAME);

        assert!(w.entity(doomed).is_none());
        assert_eq!(w.entity(right).map(|e| e.position()), Some(Vec2::new(43.0, 40.0)));
        assert_eq!(w.entity(left).map(|e| e.position()), Some(Vec2::new(37.0, 56.0)));
    }

    #[test]
    fn player_drops_onto_the_floor() {
        let mut w = room();
        let p = w.add_entity(Entity::player(Vec2::new(40.0, 24.0)));
        for _ in 0..120 {
            w.update(FRAME);
        }
        let player = w.entity(p).and_then(|e| e.as_player()).map(|pl| pl.on_ground);
        assert_eq!(player, Some(true));
        assert!(w.drain_events().iter().any(|e| matches!(e, GameEvent::Landed { .. })));
        assert_eq!(w.tick(), 120);
        assert_eq!(w.clock(), FRAME * 120);
    }

    #[test]
    fn render_draws_tiles_then_entities_then_particles() {
        let mut w = room();
        let p = w.add_entity(Entity::player(Vec2::new(40.0, 40.0)));
        w.set_follow(p);
        w.add_particle(Particle::new(Vec2::new(50.5, 41.2), Vec2::ZERO, 5));

        let mut canvas = RecordingCanvas::new(64, 32);
        w.render(&mut canvas);
        let calls = &canvas.calls;

        // offset = (40, 40) - (32, 16)
        assert_eq!(calls.len(), 1 + 48 + 2 + 1);
        assert_eq!(calls[0], Draw::Clear);
        assert_eq!(
            calls[1],
            Draw::Sprite(IVec2::new(-8, -24), IVec2::new(16, 16), Sprite::Tile(Tile::Brick))
        );
        assert_eq!(
            calls[48],
            Draw::Sprite(IVec2::new(104, 56), IVec2::new(16, 16), Sprite::Tile(Tile::Floor))
        );
        assert_eq!(calls[49], Draw::Line(IVec2::new(32, 16), IVec2::new(42, 16), Paint::Aim));
        assert_eq!(calls[50], Draw::Sprite(IVec2::new(28, 8), IVec2::new(8, 16), Sprite::Player));
        assert_eq!(calls[51], Draw::Pixel(IVec2::new(42, 17), Paint::Particle));
    }

    #[test]
    fn camera_centers_map_without_follow() {
        let w = room();
        assert_eq!(w.follow(), None);
        assert_eq!(w.camera_offset(IVec2::new(64, 32)), IVec2::new(32, 32));
    }

    #[test]
    fn session_never_starts_inside_a_block() {
        let mut cfg = GameConfig::default();
        cfg.map.brick_chance = 1.0;
        cfg.map.seed = Some(3);
        let (w, p) = World::new_session(&cfg);
        assert_eq!(w.follow(), Some(p));
        let player = w.entity(p).map(|e| e.body.corners_clear(w.grid()));
        assert_eq!(player, Some(true));
    }

    #[test]
    fn seeded_sessions_share_a_map() {
        let mut cfg = GameConfig::default();
        cfg.map.seed = Some(99);
        let (a, _) = World::new_session(&cfg);
        let (b, _) = World::new_session(&cfg);
        let ca: Vec<_> = a.grid().cells().collect();
        let cb: Vec<_> = b.grid().cells().collect();
        assert_eq!(ca, cb);
    }

    #[test]
    fn out_of_map_spawn_is_pulled_inside() {
        let mut cfg = GameConfig::default();
        cfg.map.brick_chance = 0.0;
        cfg.map.stone_chance = 0.0;
        cfg.map.spawn_x = -500.0;
        cfg.map.spawn_y = 1.0e6;
        let (w, p) = World::new_session(&cfg);
        let clear = w.entity(p).map(|e| e.body.corners_clear(w.grid()));
        assert_eq!(clear, Some(true));
    }
}
