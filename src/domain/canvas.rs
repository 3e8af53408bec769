/// Render sink: what the simulation needs from whatever draws it.
///
/// All coordinates are screen-space world units (world position minus the
/// camera offset). How they map onto real output is the implementor's
/// business; the terminal renderer packs several world units into a cell.

use super::geom::IVec2;
use super::tile::Tile;

/// Sprite handles, resolved by the canvas through its asset table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sprite {
    Tile(Tile),
    Player,
}

/// Flat colors by role.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Paint {
    Projectile,
    Particle,
    Aim,
}

pub trait Canvas {
    /// Visible area in world units.
    fn viewport(&self) -> IVec2;

    fn clear(&mut self);

    fn draw_sprite(&mut self, at: IVec2, size: IVec2, sprite: Sprite);

    fn fill_rect(&mut self, at: IVec2, size: IVec2, paint: Paint);

    fn draw_pixel(&mut self, at: IVec2, paint: Paint);

    fn draw_line(&mut self, from: IVec2, to: IVec2, paint: Paint);
}

#[cfg(test)]
pub mod recording {
    use super::*;

    /// One recorded draw call.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Draw {
        Clear,
        Sprite(IVec2, IVec2, Sprite),
        Rect(IVec2, IVec2, Paint),
        Pixel(IVec2, Paint),
        Line(IVec2, IVec2, Paint),
    }

    /// Canvas that remembers every call, for render-order assertions.
    pub struct RecordingCanvas {
        pub size: IVec2,
        pub calls: Vec<Draw>,
    }

    impl RecordingCanvas {
        pub fn new(w: i32, h: i32) -> Self {
            RecordingCanvas { size: IVec2::new(w, h), calls: Vec::new() }
        }
    }

    impl Canvas for RecordingCanvas {
        fn viewport(&self) -> IVec2 {
            self.size
        }
        fn clear(&mut self) {
            self.calls.push(Draw::Clear);
        }
        fn draw_sprite(&mut self, at: IVec2, size: IVec2, sprite: Sprite) {
            self.calls.push(Draw::Sprite(at, size, sprite));
        }
        fn fill_rect(&mut self, at: IVec2, size: IVec2, paint: Paint) {
            self.calls.push(Draw::Rect(at, size, paint));
        }
        fn draw_pixel(&mut self, at: IVec2, paint: Paint) {
            self.calls.push(Draw::Pixel(at, paint));
        }
        fn draw_line(&mut self, from: IVec2, to: IVec2, paint: Paint) {
            self.calls.push(Draw::Line(from, to, paint));
        }
    }
}
