#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid world state for Pocket Arcade sessions.
//!
//! The world owns the tile array together with the entity lists that explain
//! it. Mutation primitives keep both in step: every entity move rewrites the
//! vacated and the entered cell from the entity lists, so the tile array never
//! disagrees with the recorded positions outside of a primitive. Rule engines
//! that need a finer sequence (the dodge arena clears a cell before checking
//! the destination) use [`GridWorld::set_tile`] directly. Read access goes
//! through the [`query`] module.

use pocket_arcade_core::{CellCoord, Terminal, Tile};
use thiserror::Error;

/// Unique identifier assigned to a falling object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Object dropping through the dodge arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallingObject {
    id: ObjectId,
    cell: CellCoord,
}

impl FallingObject {
    /// Identifier assigned when the object spawned.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Cell the object currently occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

/// Represents the state of one game session.
#[derive(Clone, Debug)]
pub struct GridWorld {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    player: CellCoord,
    goal: Option<CellCoord>,
    pursuers: Vec<CellCoord>,
    pickups: Vec<CellCoord>,
    falling: Vec<FallingObject>,
    next_object_id: u32,
    score: u32,
    terminal: Option<Terminal>,
}

impl GridWorld {
    /// Creates an empty world with the player standing on the provided cell.
    pub fn new(columns: u32, rows: u32, player: CellCoord) -> Result<Self, InvariantViolation> {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut world = Self {
            columns,
            rows,
            tiles: vec![Tile::Empty; capacity],
            player,
            goal: None,
            pursuers: Vec::new(),
            pickups: Vec::new(),
            falling: Vec::new(),
            next_object_id: 0,
            score: 0,
            terminal: None,
        };

        if world.index(player).is_none() {
            return Err(InvariantViolation::OutOfBounds { cell: player });
        }
        world.redraw(player);
        Ok(world)
    }

    /// Writes a tile directly, ignoring cells outside the grid.
    pub fn set_tile(&mut self, cell: CellCoord, tile: Tile) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = tile;
            }
        }
    }

    /// Places a static wall.
    pub fn place_wall(&mut self, cell: CellCoord) {
        self.set_tile(cell, Tile::Wall);
    }

    /// Places the goal tile.
    pub fn place_goal(&mut self, cell: CellCoord) {
        if let Some(previous) = self.goal.replace(cell) {
            self.redraw(previous);
        }
        self.redraw(cell);
    }

    /// Adds a pursuer at the provided cell.
    pub fn add_pursuer(&mut self, cell: CellCoord) {
        self.pursuers.push(cell);
        self.redraw(cell);
    }

    /// Adds a collectible pickup at the provided cell.
    pub fn add_pickup(&mut self, cell: CellCoord) {
        self.pickups.push(cell);
        self.redraw(cell);
    }

    /// Spawns a falling object and returns its identifier.
    pub fn spawn_falling(&mut self, cell: CellCoord) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id = self.next_object_id.wrapping_add(1);
        self.falling.push(FallingObject { id, cell });
        self.redraw(cell);
        id
    }

    /// Moves the player, redrawing both the vacated and the entered cell.
    pub fn relocate_player(&mut self, to: CellCoord) {
        let from = self.player;
        self.player = to;
        self.redraw(from);
        self.redraw(to);
    }

    /// Moves the pursuer stored at `index`, redrawing both affected cells.
    pub fn move_pursuer(&mut self, index: usize, to: CellCoord) {
        let Some(slot) = self.pursuers.get_mut(index) else {
            return;
        };
        let from = *slot;
        *slot = to;
        self.redraw(from);
        self.redraw(to);
    }

    /// Removes the pickup lying on `cell`, reporting whether one was present.
    pub fn take_pickup(&mut self, cell: CellCoord) -> bool {
        let Some(position) = self.pickups.iter().position(|pickup| *pickup == cell) else {
            return false;
        };
        let _ = self.pickups.remove(position);
        self.redraw(cell);
        true
    }

    /// Records a new cell for the falling object stored at `index`.
    ///
    /// Tiles are left untouched; the caller writes them as part of its move.
    pub fn set_falling_cell(&mut self, index: usize, cell: CellCoord) {
        if let Some(object) = self.falling.get_mut(index) {
            object.cell = cell;
        }
    }

    /// Drops the listed objects from the live set without touching tiles.
    pub fn remove_falling(&mut self, ids: &[ObjectId]) {
        if ids.is_empty() {
            return;
        }
        self.falling.retain(|object| !ids.contains(&object.id));
    }

    /// Adds points to the score.
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Ends the game. The first conclusion wins; later ones are ignored.
    pub fn conclude(&mut self, terminal: Terminal) -> bool {
        if self.terminal.is_some() {
            return false;
        }
        self.terminal = Some(terminal);
        true
    }

    /// Checks that the tile array agrees with the entity lists.
    ///
    /// A pursuer standing on the goal or a pickup shows the tile underneath.
    /// The player may share its cell with the goal only once the game is won
    /// and with a pursuer only once it is lost.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut solid = vec![0u8; self.tiles.len()];
        let mut features = vec![0u8; self.tiles.len()];

        let solid_cells = std::iter::once(self.player)
            .chain(self.pursuers.iter().copied())
            .chain(self.falling.iter().map(FallingObject::cell));
        for cell in solid_cells {
            let index = self.index(cell).ok_or(InvariantViolation::OutOfBounds { cell })?;
            solid[index] = solid[index].saturating_add(1);
        }

        for cell in self.goal.iter().chain(self.pickups.iter()).copied() {
            let index = self.index(cell).ok_or(InvariantViolation::OutOfBounds { cell })?;
            features[index] = features[index].saturating_add(1);
        }

        for (index, tile) in self.tiles.iter().copied().enumerate() {
            let cell = self.cell_at(index);
            let shared_solid = solid[index] > 1 && self.terminal != Some(Terminal::Lost);
            if shared_solid || features[index] > 1 {
                return Err(InvariantViolation::SharedCell { cell });
            }

            if cell == self.player && features[index] > 0 && self.terminal != Some(Terminal::Won) {
                return Err(InvariantViolation::SharedCell { cell });
            }

            match self.entity_tile(cell) {
                Some(expected) if expected != tile => {
                    return Err(InvariantViolation::TileMismatch {
                        cell,
                        expected,
                        found: tile,
                    });
                }
                Some(_) => {}
                None if matches!(tile, Tile::Empty | Tile::Wall) => {}
                None => return Err(InvariantViolation::StrayTile { cell, found: tile }),
            }
        }

        Ok(())
    }

    fn entity_tile(&self, cell: CellCoord) -> Option<Tile> {
        if self.player == cell {
            Some(Tile::Player)
        } else if self.goal == Some(cell) {
            Some(Tile::Goal)
        } else if self.pickups.contains(&cell) {
            Some(Tile::Pickup)
        } else if self.pursuers.contains(&cell) {
            Some(Tile::Pursuer)
        } else if self.falling.iter().any(|object| object.cell == cell) {
            Some(Tile::FallingObject)
        } else {
            None
        }
    }

    fn redraw(&mut self, cell: CellCoord) {
        let tile = match self.entity_tile(cell) {
            Some(tile) => tile,
            None if query::tile(self, cell) == Some(Tile::Wall) => Tile::Wall,
            None => Tile::Empty,
        };
        self.set_tile(cell, tile);
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn cell_at(&self, index: usize) -> CellCoord {
        let columns = self.columns.max(1) as usize;
        CellCoord::new((index / columns) as u32, (index % columns) as u32)
    }
}

/// Disagreements between the tile array and the entity lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An entity was recorded outside the grid.
    #[error("entity recorded outside the grid at {cell:?}")]
    OutOfBounds {
        /// Offending position.
        cell: CellCoord,
    },
    /// A tile does not show the entity recorded on it.
    #[error("tile at {cell:?} shows {found:?} but {expected:?} is recorded there")]
    TileMismatch {
        /// Offending cell.
        cell: CellCoord,
        /// Tile implied by the entity lists.
        expected: Tile,
        /// Tile actually stored.
        found: Tile,
    },
    /// A tile shows an entity that no list records.
    #[error("tile at {cell:?} shows {found:?} but no entity is recorded there")]
    StrayTile {
        /// Offending cell.
        cell: CellCoord,
        /// Tile actually stored.
        found: Tile,
    },
    /// Two entities that must stay apart share a cell.
    #[error("more than one entity occupies {cell:?}")]
    SharedCell {
        /// Offending cell.
        cell: CellCoord,
    },
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use pocket_arcade_core::{CellCoord, Terminal, Tile, TileGridView};

    use super::{FallingObject, GridWorld};

    /// Captures a read-only view of the tile array.
    #[must_use]
    pub fn tiles(world: &GridWorld) -> TileGridView<'_> {
        TileGridView::new(&world.tiles, world.columns, world.rows)
    }

    /// Returns the tile stored at the provided cell, if it lies on the grid.
    #[must_use]
    pub fn tile(world: &GridWorld, cell: CellCoord) -> Option<Tile> {
        world
            .index(cell)
            .and_then(|index| world.tiles.get(index).copied())
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &GridWorld) -> (u32, u32) {
        (world.columns, world.rows)
    }

    /// Reports whether the cell lies on the grid.
    #[must_use]
    pub fn contains(world: &GridWorld, cell: CellCoord) -> bool {
        world.index(cell).is_some()
    }

    /// Reports whether the cell lies strictly inside the border rows and columns.
    #[must_use]
    pub fn is_interior(world: &GridWorld, cell: CellCoord) -> bool {
        cell.row() > 0
            && cell.column() > 0
            && cell.row() + 1 < world.rows
            && cell.column() + 1 < world.columns
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player(world: &GridWorld) -> CellCoord {
        world.player
    }

    /// Cell holding the goal, when the game has one.
    #[must_use]
    pub fn goal(world: &GridWorld) -> Option<CellCoord> {
        world.goal
    }

    /// Cells occupied by pursuers in placement order.
    #[must_use]
    pub fn pursuers(world: &GridWorld) -> &[CellCoord] {
        &world.pursuers
    }

    /// Reports whether any pursuer occupies the cell.
    #[must_use]
    pub fn pursuer_at(world: &GridWorld, cell: CellCoord) -> bool {
        world.pursuers.contains(&cell)
    }

    /// Cells holding uncollected pickups in placement order.
    #[must_use]
    pub fn pickups(world: &GridWorld) -> &[CellCoord] {
        &world.pickups
    }

    /// Live falling objects in spawn order.
    #[must_use]
    pub fn falling_objects(world: &GridWorld) -> &[FallingObject] {
        &world.falling
    }

    /// Points accumulated so far.
    #[must_use]
    pub fn score(world: &GridWorld) -> u32 {
        world.score
    }

    /// Terminal state reached by the session, if any.
    #[must_use]
    pub fn terminal(world: &GridWorld) -> Option<Terminal> {
        world.terminal
    }

    /// Reports whether gameplay may still mutate the world.
    #[must_use]
    pub fn is_running(world: &GridWorld) -> bool {
        world.terminal.is_none()
    }
}
