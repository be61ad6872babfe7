/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (grid of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Mapping: one tile is 2 terminal columns × 1 row, so a 32 px tile
/// renders as a squarish block. The renderer only READS world state;
/// the single mutation allowed is publishing the viewport width into
/// the camera.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Archetype, EnemyState, Facing};
use crate::domain::player::{PlayerAction, MAX_ENERGY, MAX_HEALTH};
use crate::domain::tile::{Hitbox, TILE_SIZE};
use crate::sim::world::{Phase, WorldState};

/// Terminal columns per tile.
const COLS_PER_TILE: usize = 2;
/// Rows reserved for the HUD above the playfield.
const HUD_ROWS: usize = 2;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" cells so inter-row gap
    /// pixels match on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 18, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer after resize.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: Cell::BASE_BG }
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

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn put(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn put_str(&mut self, x: i32, y: i32, text: &str, fg: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i as i32, y, Cell::new(ch, fg));
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }
}

// ── Renderer ──

pub struct Renderer {
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All),
        )?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        let mut out = io::stdout();
        execute!(
            out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            terminal::LeaveAlternateScreen,
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let (cols, rows) = (cols as usize, rows as usize);
        if cols != self.term_w || rows != self.term_h {
            self.term_w = cols;
            self.term_h = rows;
            self.front = FrameBuffer::new(cols, rows);
            self.back = FrameBuffer::new(cols, rows);
            self.back.invalidate();
        }
        if cols == 0 || rows == 0 {
            return Ok(());
        }

        // Publish the viewport width so the camera can follow.
        world.camera.view_w = (cols / COLS_PER_TILE) as f32 * TILE_SIZE;

        self.front.clear();
        match world.phase {
            Phase::Title => self.draw_title(world),
            _ => {
                self.draw_scene(world);
                self.draw_hud(world);
                self.draw_overlay(world);
            }
        }

        self.flush_diff()
    }

    // ── Scene ──

    fn draw_scene(&mut self, world: &WorldState) {
        let cam_x = world.camera.x;
        let first_col = (cam_x / TILE_SIZE).floor() as i32;
        let view_tiles = self.term_w / COLS_PER_TILE + 1;

        for row in 0..world.grid.height_tiles() {
            let screen_y = (row + HUD_ROWS) as i32;
            for i in 0..view_tiles {
                let col = first_col + i as i32;
                if col < 0 || col as usize >= world.grid.width_tiles() {
                    continue;
                }
                let code = world.grid.code_at(col as usize, row);
                if code == 0 {
                    continue;
                }
                let (ch, fg) = match code {
                    1 => ('▓', Color::Rgb { r: 110, g: 82, b: 48 }),
                    _ => ('█', Color::Rgb { r: 95, g: 100, b: 110 }),
                };
                let sx = (col as f32 * TILE_SIZE - cam_x) / TILE_SIZE * COLS_PER_TILE as f32;
                let sx = sx.round() as i32;
                for dx in 0..COLS_PER_TILE as i32 {
                    self.front.put(sx + dx, screen_y, Cell::new(ch, fg));
                }
            }
        }

        for enemy in &world.enemies {
            if !enemy.active || enemy.is_invisible() {
                continue;
            }
            let (glyph, color) = enemy_glyph(enemy.archetype, enemy.state);
            self.draw_entity(&enemy.hitbox, cam_x, glyph, color);
        }

        // Invincibility blink: skip the sprite on alternating frames.
        let blink = world.player.is_invincible(world.clock_ms) && world.anim_tick % 4 >= 2;
        if !blink {
            let (glyph, color) = player_glyph(world.player.action, world.player.facing);
            self.draw_entity(&world.player.hitbox, cam_x, glyph, color);
        }
    }

    fn draw_entity(&mut self, hb: &Hitbox, cam_x: f32, glyph: char, color: Color) {
        let sx = ((hb.center_x() - cam_x) / TILE_SIZE * COLS_PER_TILE as f32).round() as i32;
        let top_row = (hb.y / TILE_SIZE).floor() as i32 + HUD_ROWS as i32;
        let bottom_row = ((hb.bottom() - 1.0) / TILE_SIZE).floor() as i32 + HUD_ROWS as i32;
        for y in top_row..=bottom_row {
            self.front.put(sx, y, Cell::new(glyph, color));
        }
    }

    // ── HUD ──

    fn draw_hud(&mut self, world: &WorldState) {
        let hp_color = Color::Rgb { r: 190, g: 60, b: 60 };
        let en_color = Color::Rgb { r: 180, g: 165, b: 40 };

        self.front.put_str(1, 0, "HP", Color::White);
        self.draw_bar(4, 0, 20, world.player.health, MAX_HEALTH, hp_color);
        self.front.put_str(26, 0, "EN", Color::White);
        self.draw_bar(29, 0, 12, world.player.energy, MAX_ENERGY, en_color);

        let status = format!(
            "{}  ({}/{})",
            world.level_name,
            world.level_index + 1,
            world.total_levels.max(1)
        );
        self.front.put_str(44, 0, &status, Color::Grey);

        if !world.message.is_empty() {
            let x = (self.term_w as i32 - world.message.chars().count() as i32) / 2;
            self.front.put_str(x, 1, &world.message, Color::Yellow);
        }
    }

    fn draw_bar(&mut self, x: i32, y: i32, width: i32, value: i32, max: i32, color: Color) {
        let filled = if max > 0 {
            (value as f32 / max as f32 * width as f32).round() as i32
        } else {
            0
        };
        for i in 0..width {
            let cell = if i < filled {
                Cell::new('█', color)
            } else {
                Cell::new('░', Color::DarkGrey)
            };
            self.front.put(x + i, y, cell);
        }
    }

    // ── Overlays ──

    fn draw_overlay(&mut self, world: &WorldState) {
        let text: Option<(&str, &str)> = match world.phase {
            Phase::LevelComplete => Some(("AREA CLEARED", "[Enter] next area   [Esc] title")),
            Phase::GameOver => Some(("YOU HAVE FALLEN", "[Enter] retry   [Esc] title")),
            Phase::GameComplete => {
                Some(("ASWANG SLAYER", "All areas cleared!  [Enter] title"))
            }
            _ if world.paused => Some(("PAUSED", "[Esc] resume   [Q] title")),
            _ => None,
        };
        let Some((title, hint)) = text else { return };

        let cy = (self.term_h / 2) as i32;
        let tx = (self.term_w as i32 - title.chars().count() as i32) / 2;
        let hx = (self.term_w as i32 - hint.chars().count() as i32) / 2;
        self.front.put_str(tx, cy - 1, title, Color::White);
        self.front.put_str(hx, cy + 1, hint, Color::Grey);
    }

    fn draw_title(&mut self, world: &WorldState) {
        let art = [
            "  A S W A N G   H U N T E R  ",
            "",
            "hunt the sigbin, the duwende,",
            "   and the tikbalang itself  ",
            "",
            "[Enter] start    [Q] quit",
            "",
            "move A/D  jump W  attack J  dash K",
        ];
        let cy = (self.term_h as i32 - art.len() as i32) / 2;
        for (i, line) in art.iter().enumerate() {
            let x = (self.term_w as i32 - line.chars().count() as i32) / 2;
            let color = if i == 0 { Color::Red } else { Color::Grey };
            self.front.put_str(x, cy + i as i32, line, color);
        }
        if world.total_levels > 0 {
            let info = format!("{} areas", world.total_levels);
            let x = (self.term_w as i32 - info.chars().count() as i32) / 2;
            self.front.put_str(x, cy + art.len() as i32 + 1, &info, Color::DarkGrey);
        }
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                queue!(out, MoveTo(x as u16, y as u16))?;
                if last_fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(out, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(out, Print(cell.ch))?;
            }
        }

        out.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

// ── Glyph tables ──

fn enemy_glyph(archetype: Archetype, state: EnemyState) -> (char, Color) {
    let base = match archetype {
        Archetype::Sigbin => 'ϟ',
        Archetype::Duwende => 'ɖ',
        Archetype::Tikbalang => 'Ͳ',
    };
    let color = match state {
        EnemyState::Hit => Color::White,
        EnemyState::Dead => Color::DarkGrey,
        EnemyState::Attack => Color::Rgb { r: 255, g: 120, b: 60 },
        EnemyState::SpecialAttack => Color::Rgb { r: 255, g: 60, b: 200 },
        _ => match archetype {
            Archetype::Sigbin => Color::Rgb { r: 200, g: 80, b: 80 },
            Archetype::Duwende => Color::Rgb { r: 90, g: 200, b: 90 },
            Archetype::Tikbalang => Color::Rgb { r: 200, g: 120, b: 255 },
        },
    };
    (base, color)
}

fn player_glyph(action: PlayerAction, facing: Facing) -> (char, Color) {
    let ch = match action {
        PlayerAction::Attack1 | PlayerAction::Attack2 | PlayerAction::Attack3 => {
            match facing {
                Facing::Right => '▶',
                Facing::Left => '◀',
            }
        }
        PlayerAction::Dash => match facing {
            Facing::Right => '≫',
            Facing::Left => '≪',
        },
        PlayerAction::Death => '✝',
        _ => '@',
    };
    let color = match action {
        PlayerAction::Hit => Color::White,
        PlayerAction::Death => Color::DarkGrey,
        PlayerAction::Dash => Color::Cyan,
        _ => Color::Rgb { r: 120, g: 200, b: 255 },
    };
    (ch, color)
}
