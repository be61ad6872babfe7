/// Tile grid and collision queries.
/// All solidity semantics are centralized here: movement, AI and combat
/// code ask questions about the grid, they never index it directly.
///
/// Coordinates are world pixels; the grid is `TILE_SIZE`-pixel cells.
/// Tile code 0 = empty, anything else = solid (the code selects the
/// glyph only).
///
/// ## Bounds policy
///
/// Out of horizontal bounds or below the playfield bottom → solid
/// (fail safe toward blocking movement). Above the top → empty, so
/// jumps may leave the visible playfield.

/// World pixels per tile cell.
pub const TILE_SIZE: f32 = 32.0;

/// Axis-aligned box in world pixels. The authoritative position of an
/// entity for physics and combat — visual bounds are the renderer's
/// business, not ours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Hitbox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Hitbox { x, y, w, h }
    }

    pub fn intersects(&self, other: &Hitbox) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    /// Bottom edge (feet) y coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Tile row containing the top edge.
    pub fn tile_row(&self) -> i32 {
        (self.y / TILE_SIZE).floor() as i32
    }

    /// Tile column containing the left edge.
    pub fn tile_col(&self) -> i32 {
        (self.x / TILE_SIZE).floor() as i32
    }
}

/// Static per-level solidity map. Never mutated after load.
#[derive(Clone, Debug)]
pub struct TileGrid {
    cells: Vec<Vec<u8>>,
    width: usize,
    height: usize,
}

impl TileGrid {
    pub fn new(cells: Vec<Vec<u8>>) -> Self {
        let height = cells.len();
        let width = cells.first().map_or(0, |r| r.len());
        TileGrid { cells, width, height }
    }

    pub fn width_tiles(&self) -> usize {
        self.width
    }

    pub fn height_tiles(&self) -> usize {
        self.height
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    /// Tile code at (col, row); out of bounds reads as 0.
    /// The renderer uses this to pick glyphs.
    pub fn code_at(&self, col: usize, row: usize) -> u8 {
        if row < self.height && col < self.width {
            self.cells[row][col]
        } else {
            0
        }
    }

    /// Is the tile cell at (col, row) solid? Out of bounds → solid.
    pub fn is_tile_solid(&self, col: i32, row: i32) -> bool {
        if col < 0 || col as usize >= self.width || row < 0 || row as usize >= self.height {
            return true;
        }
        self.cells[row as usize][col as usize] != 0
    }

    /// Is the world-pixel point (x, y) inside solid terrain?
    pub fn is_solid(&self, x: f32, y: f32) -> bool {
        if x < 0.0 || x >= self.width_px() {
            return true;
        }
        if y >= self.height_px() {
            return true;
        }
        if y < 0.0 {
            return false;
        }
        let col = (x / TILE_SIZE) as usize;
        let row = (y / TILE_SIZE) as usize;
        self.cells[row][col] != 0
    }

    /// Can `hb` occupy its position? Samples the four corners AND the
    /// four edge midpoints. Corner-only sampling lets thin obstacles
    /// slip between samples at speed; the midpoints close that gap at
    /// the cost of rejecting a few boxes that would technically fit.
    pub fn can_move_to(&self, hb: &Hitbox) -> bool {
        // Corners
        if self.is_solid(hb.x, hb.y) {
            return false;
        }
        if self.is_solid(hb.x + hb.w, hb.y + hb.h) {
            return false;
        }
        if self.is_solid(hb.x + hb.w, hb.y) {
            return false;
        }
        if self.is_solid(hb.x, hb.y + hb.h) {
            return false;
        }
        // Edge midpoints
        if self.is_solid(hb.x + hb.w / 2.0, hb.y) {
            return false;
        }
        if self.is_solid(hb.x + hb.w, hb.y + hb.h / 2.0) {
            return false;
        }
        if self.is_solid(hb.x + hb.w / 2.0, hb.y + hb.h) {
            return false;
        }
        if self.is_solid(hb.x, hb.y + hb.h / 2.0) {
            return false;
        }
        true
    }

    /// Is there floor one pixel below the leading bottom corner in the
    /// direction of travel? Patrol/chase movement stops at ledges when
    /// this returns false.
    pub fn is_floor_ahead(&self, hb: &Hitbox, x_speed: f32) -> bool {
        if x_speed < 0.0 {
            self.is_solid(hb.x + x_speed, hb.bottom() + 1.0)
        } else {
            self.is_solid(hb.x + hb.w + x_speed, hb.bottom() + 1.0)
        }
    }

    /// Standing on ground? Checks the pixel below bottom-left and
    /// bottom-right.
    pub fn is_on_floor(&self, hb: &Hitbox) -> bool {
        self.is_solid(hb.x, hb.bottom() + 1.0)
            || self.is_solid(hb.x + hb.w, hb.bottom() + 1.0)
    }

    /// Is the horizontal sight line between two boxes clear at `row`?
    ///
    /// Every tile in the spanned column range must be passable AND have
    /// solid ground directly beneath it — a wall blocks sight, and so
    /// does a floorless gap.
    pub fn is_sight_clear(&self, a: &Hitbox, b: &Hitbox, row: i32) -> bool {
        let a_col = a.tile_col();
        let b_col = b.tile_col();
        if a_col > b_col {
            self.all_tiles_walkable(b_col, a_col, row)
        } else {
            self.all_tiles_walkable(a_col, b_col, row)
        }
    }

    fn all_tiles_walkable(&self, col_start: i32, col_end: i32, row: i32) -> bool {
        for col in col_start..col_end {
            if self.is_tile_solid(col, row) {
                return false;
            }
            if !self.is_tile_solid(col, row + 1) {
                return false;
            }
        }
        true
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a grid from ASCII rows: '#' = solid, anything else = empty.
    fn grid_from(rows: &[&str]) -> TileGrid {
        let cells = rows
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { 1 } else { 0 }).collect())
            .collect();
        TileGrid::new(cells)
    }

    // ── is_solid bounds policy ──

    #[test]
    fn solid_out_of_horizontal_bounds() {
        let g = grid_from(&["  ", "  "]);
        assert!(g.is_solid(-1.0, 10.0));
        assert!(g.is_solid(g.width_px(), 10.0));
    }

    #[test]
    fn solid_below_playfield() {
        let g = grid_from(&["  ", "  "]);
        assert!(g.is_solid(10.0, g.height_px()));
    }

    #[test]
    fn empty_above_playfield() {
        let g = grid_from(&["##", "##"]);
        assert!(!g.is_solid(10.0, -5.0));
    }

    #[test]
    fn solid_follows_tile_code() {
        let g = grid_from(&[" #", "# "]);
        assert!(!g.is_solid(10.0, 10.0));
        assert!(g.is_solid(40.0, 10.0));
        assert!(g.is_solid(10.0, 40.0));
        assert!(!g.is_solid(40.0, 40.0));
    }

    // ── can_move_to ──

    #[test]
    fn box_inside_single_empty_tile_can_move() {
        let g = grid_from(&["###", "# #", "###"]);
        // Entirely within the middle (empty) tile
        let hb = Hitbox::new(36.0, 36.0, 20.0, 20.0);
        assert!(g.can_move_to(&hb));
    }

    #[test]
    fn box_overlapping_solid_corner_is_rejected() {
        let g = grid_from(&["#  ", "   ", "   "]);
        let hb = Hitbox::new(20.0, 20.0, 20.0, 20.0); // top-left corner in the '#'
        assert!(!g.can_move_to(&hb));
    }

    #[test]
    fn thin_wall_caught_by_edge_midpoint() {
        // A 1-tile pillar between the corner samples of a wide box:
        // the corners straddle it, the top-edge midpoint lands on it.
        let g = grid_from(&[" # ", "   ", "   "]);
        let hb = Hitbox::new(8.0, 16.0, 80.0, 20.0);
        assert!(!g.can_move_to(&hb));
    }

    // ── floor probes ──

    #[test]
    fn on_floor_above_solid_row() {
        let g = grid_from(&["   ", "   ", "###"]);
        let hb = Hitbox::new(34.0, 43.0, 20.0, 20.0); // feet at y=63, floor at 64
        assert!(g.is_on_floor(&hb));
    }

    #[test]
    fn not_on_floor_in_open_air() {
        let g = grid_from(&["   ", "   ", "###"]);
        let hb = Hitbox::new(34.0, 10.0, 20.0, 20.0);
        assert!(!g.is_on_floor(&hb));
    }

    #[test]
    fn ledge_detected_ahead() {
        // Floor only under the left two columns
        let g = grid_from(&["   ", "## "]);
        let hb = Hitbox::new(45.0, 11.0, 20.0, 20.0);
        assert!(g.is_floor_ahead(&hb, -1.0)); // moving left: floor
        assert!(!g.is_floor_ahead(&hb, 1.0)); // moving right: ledge
    }

    // ── sight line ──

    #[test]
    fn sight_clear_over_continuous_floor() {
        let g = grid_from(&["      ", "######"]);
        let a = Hitbox::new(5.0, 5.0, 16.0, 16.0);
        let b = Hitbox::new(150.0, 5.0, 16.0, 16.0);
        assert!(g.is_sight_clear(&a, &b, 0));
        // Order must not matter
        assert!(g.is_sight_clear(&b, &a, 0));
    }

    #[test]
    fn sight_blocked_by_wall_tile() {
        let g = grid_from(&["  #   ", "######"]);
        let a = Hitbox::new(5.0, 5.0, 16.0, 16.0);
        let b = Hitbox::new(150.0, 5.0, 16.0, 16.0);
        assert!(!g.is_sight_clear(&a, &b, 0));
    }

    #[test]
    fn sight_blocked_by_floor_gap() {
        let g = grid_from(&["      ", "##  ##"]);
        let a = Hitbox::new(5.0, 5.0, 16.0, 16.0);
        let b = Hitbox::new(150.0, 5.0, 16.0, 16.0);
        assert!(!g.is_sight_clear(&a, &b, 0));
    }

    // ── hitbox geometry ──

    #[test]
    fn hitbox_intersection() {
        let a = Hitbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Hitbox::new(5.0, 5.0, 10.0, 10.0);
        let c = Hitbox::new(20.0, 20.0, 4.0, 4.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
