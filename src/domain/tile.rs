/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// The discriminant doubles as the sprite-sheet column index.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Empty = 0,
    Floor = 1, // bottom row only
    Brick = 2, // border + common interior block
    Stone = 3, // rarer interior block
}

impl Tile {
    #[cfg(test)]
    pub const ALL: [Tile; 4] = [Tile::Empty, Tile::Floor, Tile::Brick, Tile::Stone];

    /// Does this tile stop movement?
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Empty)
    }

    /// Column in the tile sheet.
    pub fn index(self) -> usize {
        self as u8 as usize
    }
}
