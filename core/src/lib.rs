#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pocket Arcade engine.
//!
//! This crate defines the vocabulary that connects the grid world, the rule
//! engines, the session engine and the device adapters. The world stores
//! [`Tile`] values in a row-major grid addressed by [`CellCoord`], rule engines
//! react to [`Direction`] presses and periodic ticks, and adapters translate
//! tiles into glyphs through a [`Glyphs`] table when drawing.

use std::time::Duration;

pub mod config;

pub use config::{ConfigError, DodgeConfig, GameConfig, PursuitConfig, MAX_MAP_DIMENSION};

/// Side length of a single grid cell on the display, measured in pixels.
pub const CELL_PITCH_PX: i32 = 8;

/// Cadence of the input polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Minimum time between two reported presses of the same button.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Time a terminal screen stays visible before the device resets.
pub const TERMINAL_SCREEN_DELAY: Duration = Duration::from_secs(3);

/// Directions the player can request through the buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
}

impl Direction {
    /// Every direction in the order buttons are scanned.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Row and column deltas applied by a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (0, -1),
            Self::Right => (0, 1),
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
        }
    }

    /// Lower-case name used in logs and scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Left => 0b0001,
            Self::Right => 0b0010,
            Self::Up => 0b0100,
            Self::Down => 0b1000,
        }
    }
}

/// Compact set of directions observed during a single poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Creates a set containing a single direction.
    #[must_use]
    pub const fn only(direction: Direction) -> Self {
        Self {
            bits: direction.bit(),
        }
    }

    /// Adds a direction to the set.
    pub fn insert(&mut self, direction: Direction) {
        self.bits |= direction.bit();
    }

    /// Removes a direction from the set.
    pub fn remove(&mut self, direction: Direction) {
        self.bits &= !direction.bit();
    }

    /// Reports whether the set contains the provided direction.
    #[must_use]
    pub const fn contains(&self, direction: Direction) -> bool {
        self.bits & direction.bit() != 0
    }

    /// Reports whether the set holds no directions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of directions held by the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterates the contained directions in scan order: left, right, up, down.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::empty();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Applies signed row and column offsets, returning `None` below zero.
    #[must_use]
    pub fn offset(self, row_delta: i32, column_delta: i32) -> Option<Self> {
        let row = self.row.checked_add_signed(row_delta)?;
        let column = self.column.checked_add_signed(column_delta)?;
        Some(Self::new(row, column))
    }

    /// Cell one step away in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (row_delta, column_delta) = direction.delta();
        self.offset(row_delta, column_delta)
    }
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Open floor with nothing on it.
    #[default]
    Empty,
    /// The player-controlled character.
    Player,
    /// An enemy chasing the player.
    Pursuer,
    /// A collectible worth bonus points.
    Pickup,
    /// The exit that wins the pursuit game.
    Goal,
    /// Impassable terrain.
    Wall,
    /// An object dropping from the top of the dodge arena.
    FallingObject,
}

/// Symbols a game uses when drawing each kind of tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    /// Symbol for [`Tile::Player`].
    pub player: char,
    /// Symbol for [`Tile::Pursuer`].
    pub pursuer: char,
    /// Symbol for [`Tile::Pickup`].
    pub pickup: char,
    /// Symbol for [`Tile::Goal`].
    pub goal: char,
    /// Symbol for [`Tile::Wall`].
    pub wall: char,
    /// Symbol for [`Tile::FallingObject`].
    pub falling_object: char,
}

impl Glyphs {
    /// Symbol drawn for the tile, or `None` when the tile is left blank.
    #[must_use]
    pub const fn glyph(&self, tile: Tile) -> Option<char> {
        match tile {
            Tile::Empty => None,
            Tile::Player => Some(self.player),
            Tile::Pursuer => Some(self.pursuer),
            Tile::Pickup => Some(self.pickup),
            Tile::Goal => Some(self.goal),
            Tile::Wall => Some(self.wall),
            Tile::FallingObject => Some(self.falling_object),
        }
    }
}

/// Final state reached by a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// The player reached the winning condition.
    Won,
    /// The player was caught or hit.
    Lost,
}

/// Read-only view into the row-major tile array.
#[derive(Clone, Copy, Debug)]
pub struct TileGridView<'a> {
    tiles: &'a [Tile],
    columns: u32,
    rows: u32,
}

impl<'a> TileGridView<'a> {
    /// Captures a new tile view backed by the provided slice.
    #[must_use]
    pub fn new(tiles: &'a [Tile], columns: u32, rows: u32) -> Self {
        Self {
            tiles,
            columns,
            rows,
        }
    }

    /// Returns the tile stored at the provided cell, if it lies on the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Iterates every cell together with its tile in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, Tile)> + 'a {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (CellCoord::new(index / columns, index % columns), *tile)
        })
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() < self.rows && cell.column() < self.columns {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, DirectionSet, Glyphs, Tile, TileGridView};

    #[test]
    fn step_moves_one_cell_along_direction() {
        let origin = CellCoord::new(3, 4);
        assert_eq!(origin.step(Direction::Left), Some(CellCoord::new(3, 3)));
        assert_eq!(origin.step(Direction::Right), Some(CellCoord::new(3, 5)));
        assert_eq!(origin.step(Direction::Up), Some(CellCoord::new(2, 4)));
        assert_eq!(origin.step(Direction::Down), Some(CellCoord::new(4, 4)));
    }

    #[test]
    fn step_off_the_top_left_edge_is_rejected() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::Left), None);
        assert_eq!(corner.step(Direction::Up), None);
        assert_eq!(corner.offset(1, 1), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn direction_set_iterates_in_scan_order() {
        let set: DirectionSet = [Direction::Down, Direction::Left, Direction::Up]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 3);
        assert!(!set.contains(Direction::Right));
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, vec![Direction::Left, Direction::Up, Direction::Down]);
    }

    #[test]
    fn direction_set_remove_clears_membership() {
        let mut set = DirectionSet::only(Direction::Right);
        set.remove(Direction::Right);
        assert!(set.is_empty());
    }

    #[test]
    fn empty_tiles_have_no_glyph() {
        let glyphs = Glyphs {
            player: 'P',
            pursuer: 'Z',
            pickup: '*',
            goal: 'E',
            wall: '&',
            falling_object: 'O',
        };
        assert_eq!(glyphs.glyph(Tile::Empty), None);
        assert_eq!(glyphs.glyph(Tile::Goal), Some('E'));
    }

    #[test]
    fn tile_view_maps_cells_row_major() {
        let mut tiles = vec![Tile::Empty; 6];
        tiles[4] = Tile::Wall;
        let view = TileGridView::new(&tiles, 3, 2);

        assert_eq!(view.tile(CellCoord::new(1, 1)), Some(Tile::Wall));
        assert_eq!(view.tile(CellCoord::new(2, 0)), None);
        let walls: Vec<_> = view
            .cells()
            .filter(|(_, tile)| *tile == Tile::Wall)
            .map(|(cell, _)| cell)
            .collect();
        assert_eq!(walls, vec![CellCoord::new(1, 1)]);
    }
}
