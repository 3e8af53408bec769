/// Projectile: flies in a straight line, bursts into particles on the
/// first block it touches, and dies.

use rand::Rng;

use super::canvas::{Canvas, Paint};
use super::entity::{Action, Behavior, Ctx};
use super::geom::{IVec2, Vec2};
use super::motion::{Hitbox, Movable};
use super::particle::Particle;
use crate::sim::event::GameEvent;

pub const PROJECTILE_HITBOX: Hitbox = Hitbox::new([
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(0, 0),
    IVec2::new(-1, 0),
]);

#[derive(Clone, Copy, Debug, Default)]
pub struct Projectile;

impl Projectile {
    pub fn body(position: Vec2, direction: Vec2, speed: f32) -> Movable {
        Movable::new(PROJECTILE_HITBOX, position, direction * speed)
    }
}

impl Behavior for Projectile {
    fn on_action(&mut self, _body: &mut Movable, _action: Action, _ctx: &mut Ctx) {}

    fn on_block_collision(&mut self, body: &mut Movable, _velocity: Vec2, ctx: &mut Ctx) {
        if body.is_dead() {
            return;
        }
        let burst = ctx.tuning.particle_burst;
        let lifetime_max = ctx.tuning.particle_lifetime_max;
        for _ in 0..burst {
            // Difference of two uniforms leans toward zero
            let v = Vec2::new(
                ctx.rng.gen::<f32>() - ctx.rng.gen::<f32>(),
                ctx.rng.gen::<f32>() - ctx.rng.gen::<f32>(),
            );
            let lifetime = ctx.rng.gen_range(0..lifetime_max);
            ctx.add_particle(Particle::new(body.position, v, lifetime));
        }
        tracing::trace!(x = body.position.x, y = body.position.y, burst, "projectile impact");
        ctx.emit(GameEvent::Impact { at: body.position, particles: burst });
        body.kill();
    }

    fn update(&mut self, body: &mut Movable, ctx: &mut Ctx) {
        let grid = ctx.grid;
        body.advance(grid, |b, v| self.on_block_collision(b, v, ctx));
    }

    fn render(&self, body: &Movable, canvas: &mut dyn Canvas, offset: IVec2) {
        let at = body.position.floor() - offset - IVec2::new(1, 1);
        canvas.fill_rect(at, IVec2::new(2, 2), Paint::Projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Entity;
    use crate::domain::grid::Grid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ROOM: [&str; 4] = [
        "####",
        "#  #",
        "#  #",
        "####",
    ];

    fn hit(body: &mut Movable) -> (Vec<Particle>, Vec<GameEvent>) {
        let grid = Grid::from_rows(&ROOM);
        let tuning = GameConfig::default().physics;
        let mut rng = StdRng::seed_from_u64(11);
        let mut spawned: Vec<Entity> = vec![];
        let mut particles = vec![];
        let mut events = vec![];
        let mut ctx = Ctx::new(&grid, &tuning, &mut rng, &mut spawned, &mut particles, &mut events);
        Projectile.update(body, &mut ctx);
        assert!(spawned.is_empty());
        (particles, events)
    }

    #[test]
    fn free_flight_moves_by_velocity() {
        let mut body = Projectile::body(Vec2::new(24.0, 24.0), Vec2::new(1.0, 0.0), 3.0);
        let (particles, events) = hit(&mut body);
        assert_eq!(body.position, Vec2::new(27.0, 24.0));
        assert!(!body.is_dead());
        assert!(particles.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn wall_hit_bursts_exactly_once_and_dies() {
        // Diagonal into the corner: x blocks first, y is skipped
        let mut body = Projectile::body(Vec2::new(47.5, 47.5), Vec2::new(0.6, 0.8), 3.0);
        let (particles, events) = hit(&mut body);
        assert!(body.is_dead());
        assert_eq!(particles.len(), 16);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::Impact { particles: 16, .. }));
    }

    #[test]
    fn burst_particles_start_at_impact_point() {
        let mut body = Projectile::body(Vec2::new(20.0, 18.0), Vec2::new(0.0, -1.0), 3.0);
        let (particles, _) = hit(&mut body);
        assert!(body.is_dead());
        for p in &particles {
            assert_eq!(p.position, body.position);
            assert!(p.velocity.x > -1.0 && p.velocity.x < 1.0);
            assert!(p.velocity.y > -1.0 && p.velocity.y < 1.0);
            assert!((0..20).contains(&p.lifetime));
        }
    }

    #[test]
    fn actions_are_ignored() {
        let grid = Grid::from_rows(&ROOM);
        let tuning = GameConfig::default().physics;
        let mut rng = StdRng::seed_from_u64(1);
        let (mut spawned, mut particles, mut events) = (vec![], vec![], vec![]);
        let mut ctx = Ctx::new(&grid, &tuning, &mut rng, &mut spawned, &mut particles, &mut events);
        let mut body = Projectile::body(Vec2::new(24.0, 24.0), Vec2::new(1.0, 0.0), 3.0);
        for action in [Action::StartShoot, Action::Jump, Action::MoveLeft, Action::Aim(Vec2::new(0.0, 1.0))] {
            Projectile.on_action(&mut body, action, &mut ctx);
        }
        assert_eq!(body.velocity, Vec2::new(3.0, 0.0));
        assert!(spawned.is_empty());
    }
}
