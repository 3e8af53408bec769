pub mod canvas;
pub mod entity;
pub mod geom;
pub mod grid;
pub mod motion;
pub mod particle;
pub mod player;
pub mod projectile;
pub mod tile;
