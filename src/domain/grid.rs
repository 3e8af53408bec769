/// Static tile layout and solidity queries.
///
/// ## Coordinates
///
/// Cells are addressed by `IVec2` so callers can ask about cells left of or
/// above the map without casting. Anything outside `[0,w)×[0,h)` is solid,
/// which keeps every entity inside the map without extra bounds checks.
///
/// ## Generation
///
/// Interior cells draw one uniform `u32` each. The value space is split into
/// bands: `[0, brick)` → Brick, `[brick, brick+stone)` → Stone, rest Empty.
/// Afterwards the frame is forced: top row and side columns Brick, bottom
/// row Floor. The play area is therefore always enclosed.

use rand::Rng;

use super::geom::{IVec2, Vec2};
use super::tile::Tile;
use crate::config::MapConfig;

/// Edge length of one cell in world units.
pub const TILE_SIZE: i32 = 16;

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
}

impl Grid {
    pub fn generate<R: Rng>(cfg: &MapConfig, rng: &mut R, keep_clear: &[IVec2]) -> Self {
        let (w, h) = (cfg.width, cfg.height);
        let brick = band(cfg.brick_chance);
        let stone = brick + band(cfg.stone_chance);

        let mut cells = Vec::with_capacity(w * h);
        for _ in 0..w * h {
            let v = rng.gen::<u32>() as u64;
            cells.push(if v < brick {
                Tile::Brick
            } else if v < stone {
                Tile::Stone
            } else {
                Tile::Empty
            });
        }

        let mut grid = Grid { width: w, height: h, cells };
        for x in 0..w {
            grid.cells[x] = Tile::Brick;
            grid.cells[(h - 1) * w + x] = Tile::Floor;
        }
        for y in 0..h - 1 {
            grid.cells[y * w] = Tile::Brick;
            grid.cells[y * w + w - 1] = Tile::Brick;
        }
        for &c in keep_clear {
            if c.x > 0 && c.y > 0 && (c.x as usize) < w - 1 && (c.y as usize) < h - 1 {
                let i = grid.index(c.x as usize, c.y as usize);
                grid.cells[i] = Tile::Empty;
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at `cell`, or `None` outside the map.
    pub fn tile_at(&self, cell: IVec2) -> Option<Tile> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[self.index(x, y)])
    }

    /// Out of bounds counts as solid.
    #[inline]
    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.tile_at(cell).map_or(true, Tile::is_solid)
    }

    /// Is the cell containing world point `p` solid?
    #[inline]
    pub fn is_solid_at(&self, p: Vec2) -> bool {
        self.is_solid(p.cell(TILE_SIZE))
    }

    /// All cells in row-major order with their coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (IVec2, Tile)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &t)| {
            (IVec2::new((i % self.width) as i32, (i / self.width) as i32), t)
        })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// Width of a probability band in the `u32` value space.
fn band(chance: f64) -> u64 {
    (chance.clamp(0.0, 1.0) * 4_294_967_296.0) as u64
}

#[cfg(test)]
impl Grid {
    /// Build a grid from ASCII rows: `#` Brick, `=` Floor, `%` Stone, else Empty.
    /// No frame is forced; tests place walls themselves.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows[0].chars().count();
        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            for ch in row.chars() {
                cells.push(match ch {
                    '#' => Tile::Brick,
                    '=' => Tile::Floor,
                    '%' => Tile::Stone,
                    _ => Tile::Empty,
                });
            }
        }
        Grid { width, height, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map_cfg(w: usize, h: usize, brick: f64, stone: f64) -> MapConfig {
        MapConfig {
            width: w,
            height: h,
            brick_chance: brick,
            stone_chance: stone,
            seed: None,
            spawn_x: 24.0,
            spawn_y: 24.0,
        }
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let g = Grid::from_rows(&["   ", "   "]);
        assert!(g.is_solid(IVec2::new(-1, 0)));
        assert!(g.is_solid(IVec2::new(0, -1)));
        assert!(g.is_solid(IVec2::new(3, 0)));
        assert!(g.is_solid(IVec2::new(0, 2)));
        assert!(!g.is_solid(IVec2::new(2, 1)));
    }

    #[test]
    fn non_empty_tiles_are_solid() {
        let g = Grid::from_rows(&["#=% "]);
        assert!(g.is_solid(IVec2::new(0, 0)));
        assert!(g.is_solid(IVec2::new(1, 0)));
        assert!(g.is_solid(IVec2::new(2, 0)));
        assert!(!g.is_solid(IVec2::new(3, 0)));
    }

    #[test]
    fn world_point_maps_to_cell() {
        let g = Grid::from_rows(&["  ", " #"]);
        assert!(!g.is_solid_at(Vec2::new(15.9, 15.9)));
        assert!(g.is_solid_at(Vec2::new(16.0, 16.0)));
        assert!(g.is_solid_at(Vec2::new(-0.1, 4.0)));
    }

    #[test]
    fn generated_frame_is_enclosed() {
        let mut rng = StdRng::seed_from_u64(1);
        let g = Grid::generate(&map_cfg(32, 16, 0.0, 0.0), &mut rng, &[]);
        for x in 0..32 {
            assert_eq!(g.tile_at(IVec2::new(x, 0)), Some(Tile::Brick));
            assert_eq!(g.tile_at(IVec2::new(x, 15)), Some(Tile::Floor));
        }
        for y in 0..15 {
            assert_eq!(g.tile_at(IVec2::new(0, y)), Some(Tile::Brick));
            assert_eq!(g.tile_at(IVec2::new(31, y)), Some(Tile::Brick));
        }
        // Zero chances leave the interior empty
        assert_eq!(g.tile_at(IVec2::new(5, 5)), Some(Tile::Empty));
    }

    #[test]
    fn full_brick_chance_fills_interior() {
        let mut rng = StdRng::seed_from_u64(2);
        let g = Grid::generate(&map_cfg(8, 8, 1.0, 0.0), &mut rng, &[]);
        for y in 1..7 {
            for x in 1..7 {
                assert_eq!(g.tile_at(IVec2::new(x, y)), Some(Tile::Brick));
            }
        }
    }

    #[test]
    fn full_stone_band_fills_interior() {
        let mut rng = StdRng::seed_from_u64(3);
        let g = Grid::generate(&map_cfg(6, 6, 0.0, 1.0), &mut rng, &[]);
        assert_eq!(g.tile_at(IVec2::new(2, 2)), Some(Tile::Stone));
    }

    #[test]
    fn keep_clear_carves_interior_only() {
        let mut rng = StdRng::seed_from_u64(4);
        let keep = [IVec2::new(2, 2), IVec2::new(0, 0), IVec2::new(7, 3)];
        let g = Grid::generate(&map_cfg(8, 8, 1.0, 0.0), &mut rng, &keep);
        assert_eq!(g.tile_at(IVec2::new(2, 2)), Some(Tile::Empty));
        assert_eq!(g.tile_at(IVec2::new(0, 0)), Some(Tile::Brick));
        assert_eq!(g.tile_at(IVec2::new(7, 3)), Some(Tile::Brick));
    }

    #[test]
    fn band_proportions_are_plausible() {
        let mut rng = StdRng::seed_from_u64(5);
        let g = Grid::generate(&map_cfg(202, 202, 0.25, 0.25), &mut rng, &[]);
        let interior: Vec<Tile> = g
            .cells()
            .filter(|(c, _)| c.x > 0 && c.y > 0 && c.x < 201 && c.y < 201)
            .map(|(_, t)| t)
            .collect();
        let n = interior.len() as f64;
        let bricks = interior.iter().filter(|t| **t == Tile::Brick).count() as f64 / n;
        let stones = interior.iter().filter(|t| **t == Tile::Stone).count() as f64 / n;
        assert!((bricks - 0.25).abs() < 0.02, "brick share {bricks}");
        assert!((stones - 0.25).abs() < 0.02, "stone share {stones}");
    }

    #[test]
    fn cells_iterates_row_major() {
        let g = Grid::from_rows(&["# ", " %"]);
        let v: Vec<_> = g.cells().collect();
        assert_eq!(v[0], (IVec2::new(0, 0), Tile::Brick));
        assert_eq!(v[1], (IVec2::new(1, 0), Tile::Empty));
        assert_eq!(v[3], (IVec2::new(1, 1), Tile::Stone));
    }
}
