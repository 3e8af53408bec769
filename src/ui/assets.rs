/// Asset table: how each sprite and paint looks in the terminal.
///
/// Built once at startup from the `[tiles]` config section and owned by the
/// renderer. Tiles are indexed by their tag, which doubles as the sheet
/// column, so lookup is a plain array index.

use crossterm::style::Color;

use crate::config::TileGlyphs;
use crate::domain::canvas::{Paint, Sprite};
use crate::domain::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Glyph {
    pub ch: char,
    pub fg: Color,
    /// `None` keeps whatever background is already in the cell.
    pub bg: Option<Color>,
}

impl Glyph {
    const fn new(ch: char, fg: Color, bg: Option<Color>) -> Self {
        Glyph { ch, fg, bg }
    }
}

#[derive(Clone, Debug)]
pub struct Assets {
    tiles: [Glyph; 4],
    player: Glyph,
    projectile: Glyph,
    particle: Glyph,
    aim: Glyph,
}

impl Assets {
    pub fn from_config(g: &TileGlyphs) -> Self {
        let sky = Color::Rgb { r: 22, g: 22, b: 35 };
        Assets {
            tiles: [
                Glyph::new(g.empty, Color::White, Some(sky)),
                Glyph::new(g.floor, Color::Rgb { r: 90, g: 160, b: 70 }, Some(Color::Rgb { r: 40, g: 80, b: 30 })),
                Glyph::new(g.brick, Color::Rgb { r: 180, g: 120, b: 60 }, Some(Color::Rgb { r: 100, g: 65, b: 30 })),
                Glyph::new(g.stone, Color::Rgb { r: 150, g: 150, b: 160 }, Some(Color::Rgb { r: 70, g: 70, b: 80 })),
            ],
            player: Glyph::new(g.player, Color::Rgb { r: 100, g: 200, b: 255 }, None),
            projectile: Glyph::new('•', Color::Rgb { r: 255, g: 230, b: 90 }, None),
            particle: Glyph::new('·', Color::Rgb { r: 255, g: 150, b: 40 }, None),
            aim: Glyph::new('·', Color::DarkGrey, None),
        }
    }

    pub fn tile(&self, tile: Tile) -> Glyph {
        self.tiles[tile.index()]
    }

    pub fn sprite(&self, sprite: Sprite) -> Glyph {
        match sprite {
            Sprite::Tile(t) => self.tile(t),
            Sprite::Player => self.player,
        }
    }

    pub fn paint(&self, paint: Paint) -> Glyph {
        match paint {
            Paint::Projectile => self.projectile,
            Paint::Particle => self.particle,
            Paint::Aim => self.aim,
        }
    }
}
