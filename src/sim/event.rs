/// Events emitted during a tick or an action.
/// The presentation layer consumes these for sound; the simulation never
/// reads them back.

use crate::domain::geom::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Landed { at: Vec2 },
    Fired { at: Vec2 },
    Impact { at: Vec2, particles: usize },
}
