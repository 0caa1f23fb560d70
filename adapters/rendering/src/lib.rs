#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Pocket Arcade adapters.
//!
//! Rule engines never talk to a display driver directly. They push text
//! through the [`Display`] trait, most often via [`update_display`], which
//! blits every non-empty tile at a fixed pitch of [`CELL_PITCH_PX`] pixels and
//! writes the score line underneath the grid.

use pocket_arcade_core::{CellCoord, Glyphs, TileGridView, CELL_PITCH_PX};

/// Width of the stock monochrome panel in pixels.
pub const DEVICE_WIDTH_PX: u32 = 128;

/// Height of the stock monochrome panel in pixels.
pub const DEVICE_HEIGHT_PX: u32 = 64;

/// Text-capable display driven by the engine.
pub trait Display {
    /// Blanks the back buffer.
    fn clear(&mut self);

    /// Draws text with its top-left corner at the provided pixel position.
    fn draw_text(&mut self, text: &str, x: i32, y: i32);

    /// Presents the back buffer.
    fn show(&mut self);
}

/// Pixel position of the top-left corner of a grid cell.
#[must_use]
pub fn cell_origin(cell: CellCoord) -> (i32, i32) {
    (
        cell.column() as i32 * CELL_PITCH_PX,
        cell.row() as i32 * CELL_PITCH_PX,
    )
}

/// Blits every non-empty tile without clearing or presenting.
pub fn draw_tiles(display: &mut dyn Display, tiles: TileGridView<'_>, glyphs: &Glyphs) {
    let mut buffer = [0u8; 4];
    for (cell, tile) in tiles.cells() {
        let Some(glyph) = glyphs.glyph(tile) else {
            continue;
        };
        let (x, y) = cell_origin(cell);
        display.draw_text(glyph.encode_utf8(&mut buffer), x, y);
    }
}

/// Clears the display, blits the grid, writes the score below it and presents.
pub fn update_display(
    display: &mut dyn Display,
    tiles: TileGridView<'_>,
    glyphs: &Glyphs,
    score: u32,
) {
    display.clear();
    draw_tiles(display, tiles, glyphs);
    let (_, rows) = tiles.dimensions();
    display.draw_text(&format!("Score: {score}"), 0, rows as i32 * CELL_PITCH_PX);
    display.show();
}

/// Clears the display, draws each line at its pixel position and presents.
pub fn present_screen(display: &mut dyn Display, lines: &[(&str, i32, i32)]) {
    display.clear();
    for (text, x, y) in lines {
        display.draw_text(text, *x, *y);
    }
    display.show();
}

/// In-memory display that snaps text onto 8x8 character cells.
///
/// Text drawn at `(x, y)` lands in the character cell containing that pixel
/// and is clipped at the panel edges. Presenting copies the back buffer into
/// the last presented frame.
#[derive(Clone, Debug)]
pub struct CharFramebuffer {
    columns: usize,
    rows: usize,
    cells: Vec<char>,
    presented: Vec<String>,
    frames_presented: u64,
}

impl CharFramebuffer {
    /// Creates a framebuffer covering the provided pixel area.
    #[must_use]
    pub fn new(width_px: u32, height_px: u32) -> Self {
        let pitch = CELL_PITCH_PX as u32;
        let columns = (width_px / pitch) as usize;
        let rows = (height_px / pitch) as usize;
        Self {
            columns,
            rows,
            cells: vec![' '; columns * rows],
            presented: Vec::new(),
            frames_presented: 0,
        }
    }

    /// Creates a framebuffer matching the stock 128x64 panel.
    #[must_use]
    pub fn device() -> Self {
        Self::new(DEVICE_WIDTH_PX, DEVICE_HEIGHT_PX)
    }

    /// Dimensions of the framebuffer in character cells as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Character stored in the back buffer at the provided character cell.
    #[must_use]
    pub fn char_at(&self, column: usize, row: usize) -> Option<char> {
        if column < self.columns && row < self.rows {
            self.cells.get(row * self.columns + column).copied()
        } else {
            None
        }
    }

    /// Rows of the back buffer, trailing blanks included.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.columns.max(1))
            .map(|row| row.iter().collect())
            .collect()
    }

    /// Rows of the most recently presented frame.
    #[must_use]
    pub fn presented(&self) -> &[String] {
        &self.presented
    }

    /// Number of frames presented so far.
    #[must_use]
    pub const fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Display for CharFramebuffer {
    fn clear(&mut self) {
        self.cells.fill(' ');
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        let row = y.div_euclid(CELL_PITCH_PX);
        let Ok(row) = usize::try_from(row) else {
            return;
        };
        if row >= self.rows {
            return;
        }

        let first_column = x.div_euclid(CELL_PITCH_PX);
        for (offset, glyph) in text.chars().enumerate() {
            let Ok(column) = usize::try_from(first_column + offset as i32) else {
                continue;
            };
            if column >= self.columns {
                break;
            }
            self.cells[row * self.columns + column] = glyph;
        }
    }

    fn show(&mut self) {
        self.presented = self.lines();
        self.frames_presented += 1;
    }
}
