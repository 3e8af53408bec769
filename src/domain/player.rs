/// Player: walks, jumps, aims, and fires projectiles.
///
/// No acceleration model. Horizontal velocity is set by a move action and
/// wiped at the end of every update, so holding a direction means issuing
/// the action every tick. Vertical velocity accumulates gravity while
/// airborne; landing pins it to the settle value so the next tick probes
/// the floor again and re-detects ground.
///
/// Firing is rate-limited by a call counter: `StartShoot` fires when the
/// counter is a multiple of `fire_interval`, then increments. `StopShoot`
/// zeroes it, so the next press fires at once.

use super::canvas::{Canvas, Paint, Sprite};
use super::entity::{Action, Behavior, Ctx, Entity};
use super::geom::{IVec2, Vec2};
use super::motion::{Hitbox, Movable};
use crate::sim::event::GameEvent;

pub const PLAYER_HITBOX: Hitbox = Hitbox::new([
    IVec2::new(-3, -4),
    IVec2::new(2, -4),
    IVec2::new(2, 7),
    IVec2::new(-3, 7),
]);

const SPRITE_SIZE: IVec2 = IVec2::new(8, 16);
const AIM_LINE_LEN: f32 = 10.0;

#[derive(Clone, Debug)]
pub struct Player {
    pub on_ground: bool,
    pub aim: Vec2,
    pub shoot: u32,
}

impl Player {
    pub fn new() -> Self {
        Player {
            on_ground: false,
            aim: Vec2::new(1.0, 0.0),
            shoot: 0,
        }
    }

    pub fn body(position: Vec2) -> Movable {
        Movable::new(PLAYER_HITBOX, position, Vec2::ZERO)
    }
}

impl Behavior for Player {
    fn on_action(&mut self, body: &mut Movable, action: Action, ctx: &mut Ctx) {
        match action {
            Action::MoveLeft => body.velocity.x = -ctx.tuning.move_speed,
            Action::MoveRight => body.velocity.x = ctx.tuning.move_speed,
            Action::Jump => {
                if self.on_ground {
                    body.velocity.y = ctx.tuning.jump_velocity;
                    ctx.emit(GameEvent::Jumped);
                }
            }
            Action::Aim(v) => {
                if let Some(dir) = v.normalized() {
                    self.aim = dir;
                }
            }
            Action::StartShoot => {
                let fire = self.shoot % ctx.tuning.fire_interval == 0;
                self.shoot = self.shoot.wrapping_add(1);
                if fire {
                    let speed = ctx.tuning.projectile_speed;
                    ctx.spawn(Entity::projectile(body.position, self.aim, speed));
                    ctx.emit(GameEvent::Fired { at: body.position });
                }
            }
            Action::StopShoot => self.shoot = 0,
            Action::SpectatorLeft
            | Action::SpectatorRight
            | Action::SpectatorUp
            | Action::SpectatorDown => {}
        }
    }

    fn on_block_collision(&mut self, body: &mut Movable, velocity: Vec2, ctx: &mut Ctx) {
        // Walls need no response: the blocked sub-step already stopped us.
        if velocity.y > 0.0 {
            self.on_ground = true;
            body.velocity.y = ctx.tuning.settle_velocity;
        } else if velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
    }

    fn update(&mut self, body: &mut Movable, ctx: &mut Ctx) {
        let was_grounded = self.on_ground;
        self.on_ground = false;

        let grid = ctx.grid;
        body.advance(grid, |b, v| self.on_block_collision(b, v, ctx));

        body.velocity.x = 0.0;
        if !self.on_ground {
            body.velocity.y += ctx.tuning.gravity;
        } else if !was_grounded {
            ctx.emit(GameEvent::Landed { at: body.position });
        }
    }

    fn render(&self, body: &Movable, canvas: &mut dyn Canvas, offset: IVec2) {
        let pos = body.position.floor() - offset;
        let tip = (body.position + self.aim * AIM_LINE_LEN).floor() - offset;
        canvas.draw_line(pos, tip, Paint::Aim);
        canvas.draw_sprite(pos - SPRITE_SIZE.half(), SPRITE_SIZE, Sprite::Player);
    }
}
