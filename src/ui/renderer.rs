/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The World draws the next frame into the `front` buffer through the
///      `Canvas` trait; HUD and help rows are added on top
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// ## Scale
///
/// World units are packed into terminal cells: one column covers
/// `PX_PER_COL` units horizontally, one row `PX_PER_ROW` vertically, so a
/// 16×16 tile is 4 columns by 2 rows. Row 0 is the HUD, the last row is
/// help text, everything between is the map viewport.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use super::assets::{Assets, Glyph};
use crate::domain::canvas::{Canvas, Paint, Sprite};
use crate::domain::geom::{IVec2, Vec2};
use crate::sim::world::World;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// the inter-row gap color identical to the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Fill a whole row with background, then write `s` over it.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Renderer ──

const PX_PER_COL: i32 = 4;
const PX_PER_ROW: i32 = 8;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
const FOOTER_ROWS: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const HELP: &str = " A/D:Move  W:Jump  IJKL/Mouse:Aim  Space/Click:Fire  R:Restart  Esc:Quit";

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    assets: Assets,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new(assets: Assets) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            assets,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns true when the terminal
    /// reports key releases, so held keys need no timeout.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        tracing::debug!(cols = tw, rows = th, enhanced = self.enhanced_keys, "terminal ready");
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &World) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose_frame(world);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    /// World position under a terminal cell, for mouse aiming.
    pub fn world_point(&self, world: &World, col: u16, row: u16) -> Option<Vec2> {
        let row = (row as usize).checked_sub(MAP_ROW)?;
        if row >= self.map_rows() {
            return None;
        }
        let px = IVec2::new(
            col as i32 * PX_PER_COL + PX_PER_COL / 2,
            row as i32 * PX_PER_ROW + PX_PER_ROW / 2,
        );
        Some(Vec2::from(px + world.camera_offset(self.viewport())))
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    fn map_rows(&self) -> usize {
        self.term_h.saturating_sub(MAP_ROW + FOOTER_ROWS)
    }

    // ── Compose: build front buffer content ──

    fn compose_frame(&mut self, world: &World) {
        world.render(self);

        self.front.put_bar(HUD_ROW, &hud_line(world), Color::White, HUD_BG);
        if self.term_h > MAP_ROW + FOOTER_ROWS {
            self.front.put_str(0, self.term_h - 1, HELP, Color::DarkGrey, Color::Reset);
        }
    }

    /// Draw one glyph at a map cell (column, map row). Clipped to the viewport.
    fn plot(&mut self, col: i32, row: i32, glyph: Glyph) {
        if col < 0 || row < 0 || col as usize >= self.term_w || row as usize >= self.map_rows() {
            return;
        }
        let (x, y) = (col as usize, MAP_ROW + row as usize);
        let bg = glyph.bg.unwrap_or_else(|| self.front.get(x, y).bg);
        self.front.set(x, y, Cell::from_char(glyph.ch, glyph.fg, bg));
    }

    /// Cover every cell touched by the world-unit rectangle.
    fn fill(&mut self, at: IVec2, size: IVec2, glyph: Glyph) {
        if size.x <= 0 || size.y <= 0 {
            return;
        }
        let c0 = at.x.div_euclid(PX_PER_COL).max(0);
        let c1 = (at.x + size.x - 1).div_euclid(PX_PER_COL).min(self.term_w as i32 - 1);
        let r0 = at.y.div_euclid(PX_PER_ROW).max(0);
        let r1 = (at.y + size.y - 1).div_euclid(PX_PER_ROW).min(self.map_rows() as i32 - 1);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.plot(col, row, glyph);
            }
        }
    }

    fn plot_px(&mut self, p: IVec2, glyph: Glyph) {
        self.plot(p.x.div_euclid(PX_PER_COL), p.y.div_euclid(PX_PER_ROW), glyph);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Canvas for Renderer {
    fn viewport(&self) -> IVec2 {
        IVec2::new(
            self.term_w as i32 * PX_PER_COL,
            self.map_rows() as i32 * PX_PER_ROW,
        )
    }

    fn clear(&mut self) {
        self.front.clear();
    }

    fn draw_sprite(&mut self, at: IVec2, size: IVec2, sprite: Sprite) {
        let glyph = self.assets.sprite(sprite);
        self.fill(at, size, glyph);
    }

    fn fill_rect(&mut self, at: IVec2, size: IVec2, paint: Paint) {
        let glyph = self.assets.paint(paint);
        self.fill(at, size, glyph);
    }

    fn draw_pixel(&mut self, at: IVec2, paint: Paint) {
        let glyph = self.assets.paint(paint);
        self.plot_px(at, glyph);
    }

    fn draw_line(&mut self, from: IVec2, to: IVec2, paint: Paint) {
        let glyph = self.assets.paint(paint);
        for p in line_points(from, to) {
            self.plot_px(p, glyph);
        }
    }
}

/// Bresenham: every integer point from `a` to `b`, both ends included.
fn line_points(a: IVec2, b: IVec2) -> Vec<IVec2> {
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);
    let mut points = Vec::with_capacity((dx - dy + 1) as usize);
    loop {
        points.push(IVec2::new(x, y));
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

fn hud_line(world: &World) -> String {
    let followed = world.follow().and_then(|id| world.entity(id));
    let (pos, grounded) = match followed {
        Some(e) => (e.position(), e.as_player().map_or(false, |p| p.on_ground)),
        None => (Vec2::ZERO, false),
    };
    format!(
        " x:{:>6.1} y:{:>6.1}  {}  entities:{:<3} particles:{:<4} {:>6.1}s ",
        pos.x,
        pos.y,
        if grounded { "ground" } else { "air   " },
        world.entity_count(),
        world.particle_count(),
        world.clock().as_secs_f32(),
    )
}
