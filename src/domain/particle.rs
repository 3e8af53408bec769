/// Particle: a drifting dot with a fixed lifetime. Never collides.

use super::canvas::{Canvas, Paint};
use super::geom::{IVec2, Vec2};

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub lifetime: i32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, lifetime: i32) -> Self {
        Particle { position, velocity, lifetime }
    }

    /// Advance one tick. Returns true once the lifetime has run out.
    pub fn tick(&mut self) -> bool {
        self.position += self.velocity;
        self.lifetime -= 1;
        self.lifetime <= 0
    }

    pub fn render(&self, canvas: &mut dyn Canvas, offset: IVec2) {
        canvas.draw_pixel(self.position.floor() - offset, Paint::Particle);
    }
}
