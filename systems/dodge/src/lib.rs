#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Falling-object dodge rule engine.
//!
//! Objects drop from row 0 between two wall columns while the player slides
//! along the bottom row. Every object that falls off the bottom scores one
//! point; touching one ends the game. There is no win condition.

use std::{ops::RangeInclusive, time::Instant};

use pocket_arcade_core::{CellCoord, ConfigError, Direction, DodgeConfig, Glyphs, Terminal, Tile};
use pocket_arcade_engine::{EngineError, RuleEngine};
use pocket_arcade_rendering::{draw_tiles, present_screen, Display};
use pocket_arcade_world::{query, GridWorld, ObjectId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Symbols used to draw the dodge arena.
pub const GLYPHS: Glyphs = Glyphs {
    player: 'A',
    pursuer: 'Z',
    pickup: '*',
    goal: 'E',
    wall: '#',
    falling_object: 'O',
};

/// Falling-object dodge game.
#[derive(Debug)]
pub struct Dodge {
    config: DodgeConfig,
    rng: ChaCha8Rng,
    last_spawn: Option<Instant>,
}

impl Dodge {
    /// Validates the configuration and prepares the spawn generator.
    pub fn new(config: DodgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            config,
            rng,
            last_spawn: None,
        })
    }

    /// Configuration the game was built from.
    #[must_use]
    pub fn config(&self) -> &DodgeConfig {
        &self.config
    }

    /// Bottom-center cell the player starts on.
    #[must_use]
    pub fn player_start(&self) -> CellCoord {
        CellCoord::new(self.config.map_height - 1, self.config.map_width / 2)
    }

    /// Columns between the walls, inclusive on both ends.
    #[must_use]
    pub fn open_columns(&self) -> RangeInclusive<u32> {
        self.config.num_walls..=self.config.map_width - self.config.num_walls - 1
    }

    /// Makes one attempt to drop a new object into row 0.
    ///
    /// The attempt is skipped when the drawn cell holds the player or a live
    /// object.
    fn spawn(&mut self, world: &mut GridWorld) -> Option<ObjectId> {
        let columns = self.open_columns();
        let column = self.rng.gen_range(columns);
        let cell = CellCoord::new(0, column);
        let occupied = cell == query::player(world)
            || query::falling_objects(world)
                .iter()
                .any(|object| object.cell() == cell);
        if occupied {
            debug!(column, "spawn_skipped");
            return None;
        }
        let id = world.spawn_falling(cell);
        debug!(id = id.get(), column, "object_spawned");
        Some(id)
    }
}

impl RuleEngine for Dodge {
    fn name(&self) -> &'static str {
        "dodge"
    }

    fn initialize(&mut self, now: Instant) -> Result<GridWorld, EngineError> {
        let DodgeConfig {
            map_width,
            map_height,
            num_walls,
            ..
        } = self.config;
        let mut world = GridWorld::new(map_width, map_height, self.player_start())?;

        for row in 0..map_height {
            for thickness in 0..num_walls {
                world.place_wall(CellCoord::new(row, thickness));
                world.place_wall(CellCoord::new(row, map_width - 1 - thickness));
            }
        }

        for _ in 0..self.config.initial_objects {
            let _ = self.spawn(&mut world);
        }
        self.last_spawn = Some(now);
        Ok(world)
    }

    /// Slides the player one column left or right between the walls.
    ///
    /// Sliding into a falling object ends the game as lost; the player stays
    /// on its cell so the two never share one.
    fn handle_input(&mut self, world: &mut GridWorld, direction: Direction) {
        if !query::is_running(world) {
            return;
        }
        let column_delta = match direction {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Up | Direction::Down => return,
        };
        let Some(target) = query::player(world).offset(0, column_delta) else {
            return;
        };
        if !self.open_columns().contains(&target.column()) {
            return;
        }

        if query::tile(world, target) == Some(Tile::FallingObject) {
            let _ = world.conclude(Terminal::Lost);
            info!(
                column = target.column(),
                score = query::score(world),
                "player_walked_into_object"
            );
            return;
        }
        world.relocate_player(target);
    }

    fn tick(&mut self, world: &mut GridWorld, now: Instant) {
        if !query::is_running(world) {
            return;
        }

        match self.last_spawn {
            Some(last) if now.saturating_duration_since(last) > self.config.spawn_interval() => {
                let _ = self.spawn(world);
                self.last_spawn = Some(now);
            }
            Some(_) => {}
            None => self.last_spawn = Some(now),
        }

        let (_, rows) = query::dimensions(world);
        let player = query::player(world);
        let mut landed = Vec::new();
        for index in 0..query::falling_objects(world).len() {
            let object = query::falling_objects(world)[index];
            let from = object.cell();
            world.set_tile(from, Tile::Empty);

            let row = from.row().saturating_add(self.config.fall_speed);
            if row >= rows {
                world.add_score(1);
                landed.push(object.id());
                debug!(id = object.id().get(), score = query::score(world), "object_dodged");
                continue;
            }

            let to = CellCoord::new(row, from.column());
            if to == player {
                let _ = world.conclude(Terminal::Lost);
                info!(id = object.id().get(), obstacle = "player", "object_collision");
                return;
            }
            if query::tile(world, to) != Some(Tile::Empty) {
                let _ = world.conclude(Terminal::Lost);
                info!(id = object.id().get(), obstacle = "tile", "object_collision");
                return;
            }

            world.set_tile(to, Tile::FallingObject);
            world.set_falling_cell(index, to);
        }

        world.remove_falling(&landed);
    }

    fn render(&self, world: &GridWorld, display: &mut dyn Display) {
        display.clear();
        draw_tiles(display, query::tiles(world), &GLYPHS);
        display.draw_text(&format!("Score: {}", query::score(world)), 0, 0);
        display.show();
    }

    fn on_won(&self, _world: &GridWorld, _display: &mut dyn Display) {}

    fn on_lost(&self, world: &GridWorld, display: &mut dyn Display) {
        let score = format!("Final Score: {}", query::score(world));
        present_screen(display, &[("GAME OVER", 20, 25), (score.as_str(), 20, 35)]);
    }
}
