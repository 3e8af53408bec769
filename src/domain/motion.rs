/// Swept, axis-separated movement against the tile grid.
///
/// ## Algorithm
///
/// X is resolved first, then Y from the position X left behind. For one axis
/// with velocity `v`:
///
///   1. `v == 0` → nothing happens (no attempts, no callback).
///   2. `floor(|v|)` unit sub-steps, then one sub-step of `|v| - floor(|v|)`
///      (zero-length when `|v|` is whole).
///   3. A sub-step moves a candidate position and tests the two hitbox
///      corners on the leading edge. Either corner in a solid cell aborts
///      the axis and reports the axis velocity to `on_block`.
///
/// A sub-step never exceeds one world unit and hitboxes are narrower than a
/// tile, so no corner can skip over a solid cell however fast the entity
/// moves.
///
/// Blocking is always enforced here. `on_block` only decides the response
/// (adjust velocity, die, spawn); if it kills the entity, Y is skipped.

use super::geom::{IVec2, Vec2};
use super::grid::Grid;

// ══════════════════════════════════════════════════════════════
// Hitbox
// ══════════════════════════════════════════════════════════════

pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_RIGHT: usize = 2;
pub const BOTTOM_LEFT: usize = 3;

/// Four corner offsets from the entity position, ordered
/// top-left, top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Hitbox {
    pub corners: [IVec2; 4],
}

impl Hitbox {
    pub const fn new(corners: [IVec2; 4]) -> Self {
        Hitbox { corners }
    }

    /// The two corners that lead when moving in `dir`.
    pub fn leading(&self, dir: Dir) -> [IVec2; 2] {
        let start = dir.first_corner();
        [self.corners[start], self.corners[(start + 1) % 4]]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
}

impl Dir {
    /// Start index into the corner ring; the edge is this corner and the next.
    fn first_corner(self) -> usize {
        match self {
            Dir::Left => BOTTOM_LEFT,
            Dir::Right => TOP_RIGHT,
            Dir::Up => TOP_LEFT,
            Dir::Down => BOTTOM_RIGHT,
        }
    }

    fn unit(self) -> Vec2 {
        match self {
            Dir::Left => Vec2::new(-1.0, 0.0),
            Dir::Right => Vec2::new(1.0, 0.0),
            Dir::Up => Vec2::new(0.0, -1.0),
            Dir::Down => Vec2::new(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Axis {
    X,
    Y,
}

impl Axis {
    /// Direction for a velocity component; `None` when not moving.
    fn dir(self, v: f32) -> Option<Dir> {
        match self {
            Axis::X if v < 0.0 => Some(Dir::Left),
            Axis::X if v > 0.0 => Some(Dir::Right),
            Axis::Y if v < 0.0 => Some(Dir::Up),
            Axis::Y if v > 0.0 => Some(Dir::Down),
            _ => None,
        }
    }

    fn vector(self, v: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(v, 0.0),
            Axis::Y => Vec2::new(0.0, v),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Reports
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AxisReport {
    /// Sub-steps tried, including the fractional one and a blocked one.
    pub attempts: u32,
    pub blocked: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MotionReport {
    pub x: AxisReport,
    pub y: AxisReport,
}

// ══════════════════════════════════════════════════════════════
// Movable
// ══════════════════════════════════════════════════════════════

/// Kinematic state and lifecycle flag shared by every entity.
#[derive(Clone, Debug)]
pub struct Movable {
    pub hitbox: Hitbox,
    pub position: Vec2,
    pub velocity: Vec2,
    dead: bool,
}

impl Movable {
    pub fn new(hitbox: Hitbox, position: Vec2, velocity: Vec2) -> Self {
        Movable { hitbox, position, velocity, dead: false }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Move by one tick of velocity, resolving X then Y.
    pub fn advance<F>(&mut self, grid: &Grid, mut on_block: F) -> MotionReport
    where
        F: FnMut(&mut Movable, Vec2),
    {
        let mut report = MotionReport::default();
        let vx = self.velocity.x;
        report.x = self.sweep(grid, Axis::X, vx, &mut on_block);
        if self.dead {
            return report;
        }
        let vy = self.velocity.y;
        report.y = self.sweep(grid, Axis::Y, vy, &mut on_block);
        report
    }

    /// Are all four corners in open cells?
    #[cfg(test)]
    pub fn corners_clear(&self, grid: &Grid) -> bool {
        self.hitbox
            .corners
            .iter()
            .all(|&c| !grid.is_solid_at(self.position + Vec2::from(c)))
    }

    fn sweep<F>(&mut self, grid: &Grid, axis: Axis, v: f32, on_block: &mut F) -> AxisReport
    where
        F: FnMut(&mut Movable, Vec2),
    {
        let mut report = AxisReport::default();
        let dir = match axis.dir(v) {
            Some(d) => d,
            None => return report,
        };

        let speed = v.abs();
        let whole = speed.floor();
        let steps = whole as u32;
        let fraction = speed - whole;

        for i in 0..=steps {
            let len = if i < steps { 1.0 } else { fraction };
            report.attempts += 1;
            if !self.try_step(grid, dir, len) {
                report.blocked = true;
                on_block(self, axis.vector(v));
                break;
            }
        }
        report
    }

    fn try_step(&mut self, grid: &Grid, dir: Dir, len: f32) -> bool {
        let candidate = self.position + dir.unit() * len;
        let hit = self
            .hitbox
            .leading(dir)
            .iter()
            .any(|&c| grid.is_solid_at(candidate + Vec2::from(c)));
        if !hit {
            self.position = candidate;
        }
        !hit
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
