/// Entities: a closed set of behavior variants over one kinematic core.
///
/// Every entity is a `Movable` (hitbox, position, velocity, dead flag) plus
/// an `EntityKind` carrying variant state. World calls four hooks through
/// the `Behavior` trait: action, block collision, update, render.
///
/// Entities never own or point at the World. For the duration of a hook they
/// borrow a `Ctx`, which exposes exactly what they may touch: the grid for
/// solidity, tuning, the shared RNG, and queues for spawns and events.

use rand::rngs::StdRng;

use super::canvas::Canvas;
use super::geom::{IVec2, Vec2};
use super::grid::Grid;
use super::motion::Movable;
use super::particle::Particle;
use super::player::Player;
use super::projectile::Projectile;
use crate::config::PhysicsConfig;
use crate::sim::event::GameEvent;

/// World-assigned identifier. Starts at 1 and is never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EntityId(pub u32);

/// Discrete input delivered to an entity once per tick.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(dead_code)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Aim(Vec2),
    StartShoot,
    StopShoot,

    // Reserved for a free-camera spectator mode; no entity reacts yet.
    SpectatorLeft,
    SpectatorRight,
    SpectatorUp,
    SpectatorDown,
}

// ══════════════════════════════════════════════════════════════
// World services handed to entity hooks
// ══════════════════════════════════════════════════════════════

pub struct Ctx<'w> {
    pub grid: &'w Grid,
    pub tuning: &'w PhysicsConfig,
    pub rng: &'w mut StdRng,
    spawned: &'w mut Vec<Entity>,
    particles: &'w mut Vec<Particle>,
    events: &'w mut Vec<GameEvent>,
}

impl<'w> Ctx<'w> {
    pub fn new(
        grid: &'w Grid,
        tuning: &'w PhysicsConfig,
        rng: &'w mut StdRng,
        spawned: &'w mut Vec<Entity>,
        particles: &'w mut Vec<Particle>,
        events: &'w mut Vec<GameEvent>,
    ) -> Self {
        Ctx { grid, tuning, rng, spawned, particles, events }
    }

    /// Queue an entity; World assigns its id once the current pass is over.
    pub fn spawn(&mut self, entity: Entity) {
        self.spawned.push(entity);
    }

    pub fn add_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

// ══════════════════════════════════════════════════════════════
// Behavior
// ══════════════════════════════════════════════════════════════

pub trait Behavior {
    fn on_action(&mut self, body: &mut Movable, action: Action, ctx: &mut Ctx);

    /// `velocity` is the axis velocity that ran into a solid cell.
    fn on_block_collision(&mut self, body: &mut Movable, velocity: Vec2, ctx: &mut Ctx);

    fn update(&mut self, body: &mut Movable, ctx: &mut Ctx);

    fn render(&self, body: &Movable, canvas: &mut dyn Canvas, offset: IVec2);
}

#[derive(Clone, Debug)]
pub enum EntityKind {
    Player(Player),
    Projectile(Projectile),
}

#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    pub body: Movable,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(position: Vec2) -> Self {
        Entity::unbound(Player::body(position), EntityKind::Player(Player::new()))
    }

    pub fn projectile(position: Vec2, direction: Vec2, speed: f32) -> Self {
        Entity::unbound(
            Projectile::body(position, direction, speed),
            EntityKind::Projectile(Projectile),
        )
    }

    fn unbound(body: Movable, kind: EntityKind) -> Self {
        Entity { id: EntityId(0), body, kind }
    }

    /// Id given by World on insertion; `EntityId(0)` before that.
    #[cfg(test)]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn bind(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn is_dead(&self) -> bool {
        self.body.is_dead()
    }

    pub fn kill(&mut self) {
        self.body.kill();
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self.kind, EntityKind::Projectile(_))
    }

    // ── Dispatch ──

    pub fn on_action(&mut self, action: Action, ctx: &mut Ctx) {
        let (behavior, body) = self.split();
        behavior.on_action(body, action, ctx);
    }

    pub fn update(&mut self, ctx: &mut Ctx) {
        let (behavior, body) = self.split();
        behavior.update(body, ctx);
    }

    pub fn render(&self, canvas: &mut dyn Canvas, offset: IVec2) {
        let behavior: &dyn Behavior = match &self.kind {
            EntityKind::Player(p) => p,
            EntityKind::Projectile(p) => p,
        };
        behavior.render(&self.body, canvas, offset);
    }

    fn split(&mut self) -> (&mut dyn Behavior, &mut Movable) {
        let behavior: &mut dyn Behavior = match &mut self.kind {
            EntityKind::Player(p) => p,
            EntityKind::Projectile(p) => p,
        };
        (behavior, &mut self.body)
    }
}
