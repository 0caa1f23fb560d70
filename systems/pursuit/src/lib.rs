#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuit and collection rule engine.
//!
//! The player starts in the bottom-left interior corner and walks toward the
//! goal in the opposite corner while pursuers close in one greedy step per
//! tick. Pickups along the way are worth [`PICKUP_BONUS`] points and every
//! tick survived adds [`TICK_SCORE`].

use std::time::Instant;

use pocket_arcade_core::{
    CellCoord, ConfigError, Direction, Glyphs, PursuitConfig, Terminal, Tile,
};
use pocket_arcade_engine::{EngineError, RuleEngine};
use pocket_arcade_rendering::{present_screen, update_display, Display};
use pocket_arcade_world::{query, GridWorld};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Points awarded for collecting a pickup.
pub const PICKUP_BONUS: u32 = 10;

/// Points awarded for every tick the game keeps running.
pub const TICK_SCORE: u32 = 1;

/// Random draws attempted per entity before placement scans for free cells.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 4096;

/// Symbols used to draw the pursuit board.
pub const GLYPHS: Glyphs = Glyphs {
    player: 'P',
    pursuer: 'Z',
    pickup: '*',
    goal: 'E',
    wall: '&',
    falling_object: 'O',
};

/// Pursuit/collection game.
#[derive(Debug)]
pub struct Pursuit {
    config: PursuitConfig,
    rng: ChaCha8Rng,
}

impl Pursuit {
    /// Validates the configuration and prepares the layout generator.
    pub fn new(config: PursuitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    /// Configuration the game was built from.
    #[must_use]
    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Interior corner the player starts on.
    #[must_use]
    pub fn player_start(&self) -> CellCoord {
        CellCoord::new(self.config.map_height - 2, 1)
    }

    /// Interior corner holding the goal.
    #[must_use]
    pub fn goal_cell(&self) -> CellCoord {
        CellCoord::new(1, self.config.map_width - 2)
    }

    fn place_random(
        &mut self,
        world: &GridWorld,
        entity: &'static str,
    ) -> Result<CellCoord, ConfigError> {
        let rows = 1..self.config.map_height - 1;
        let columns = 1..self.config.map_width - 1;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let cell = CellCoord::new(
                self.rng.gen_range(rows.clone()),
                self.rng.gen_range(columns.clone()),
            );
            if query::tile(world, cell) == Some(Tile::Empty) {
                return Ok(cell);
            }
        }

        // Nearly full interiors: draw among the free cells directly.
        let free: Vec<CellCoord> = query::tiles(world)
            .cells()
            .filter(|(cell, tile)| *tile == Tile::Empty && query::is_interior(world, *cell))
            .map(|(cell, _)| cell)
            .collect();
        if free.is_empty() {
            return Err(ConfigError::PlacementExhausted {
                entity,
                attempts: MAX_PLACEMENT_ATTEMPTS,
            });
        }
        debug!(entity, free = free.len(), "placement_scanned_free_cells");
        Ok(free[self.rng.gen_range(0..free.len())])
    }
}

/// Greedy step from `from` toward `target`, moving on both axes at once.
#[must_use]
pub fn pursuer_step(from: CellCoord, target: CellCoord) -> Option<CellCoord> {
    let row_delta = (i64::from(target.row()) - i64::from(from.row())).signum() as i32;
    let column_delta = (i64::from(target.column()) - i64::from(from.column())).signum() as i32;
    from.offset(row_delta, column_delta)
}

impl RuleEngine for Pursuit {
    fn name(&self) -> &'static str {
        "pursuit"
    }

    fn initialize(&mut self, _now: Instant) -> Result<GridWorld, EngineError> {
        let mut world = GridWorld::new(
            self.config.map_width,
            self.config.map_height,
            self.player_start(),
        )?;
        world.place_goal(self.goal_cell());

        for _ in 0..self.config.num_pursuers {
            let cell = self.place_random(&world, "pursuer")?;
            world.add_pursuer(cell);
        }
        for _ in 0..self.config.num_walls {
            let cell = self.place_random(&world, "wall")?;
            world.place_wall(cell);
        }
        for _ in 0..self.config.num_pickups {
            let cell = self.place_random(&world, "pickup")?;
            world.add_pickup(cell);
        }

        debug!(
            pursuers = self.config.num_pursuers,
            walls = self.config.num_walls,
            pickups = self.config.num_pickups,
            "board_seeded"
        );
        Ok(world)
    }

    /// Moves the player one cell.
    ///
    /// Walls, borders and visible pursuers refuse the move. A pursuer hidden
    /// under a pickup or the goal catches the player, who stays put.
    fn handle_input(&mut self, world: &mut GridWorld, direction: Direction) {
        if !query::is_running(world) {
            return;
        }
        let Some(target) = query::player(world).step(direction) else {
            return;
        };
        if !query::is_interior(world, target) {
            return;
        }

        let tile = query::tile(world, target);
        if matches!(tile, Some(Tile::Goal | Tile::Pickup)) && query::pursuer_at(world, target) {
            let _ = world.conclude(Terminal::Lost);
            info!(
                row = target.row(),
                column = target.column(),
                "player_walked_into_pursuer"
            );
            return;
        }

        match tile {
            Some(Tile::Empty) => world.relocate_player(target),
            Some(Tile::Goal) => {
                world.relocate_player(target);
                let _ = world.conclude(Terminal::Won);
                info!(score = query::score(world), "goal_reached");
            }
            Some(Tile::Pickup) => {
                let _ = world.take_pickup(target);
                world.add_score(PICKUP_BONUS);
                world.relocate_player(target);
                info!(
                    remaining = query::pickups(world).len(),
                    score = query::score(world),
                    "pickup_collected"
                );
            }
            _ => {}
        }
    }

    fn tick(&mut self, world: &mut GridWorld, _now: Instant) {
        if !query::is_running(world) {
            return;
        }

        let player = query::player(world);
        for index in 0..query::pursuers(world).len() {
            let from = query::pursuers(world)[index];
            let Some(to) = pursuer_step(from, player) else {
                continue;
            };
            if !query::is_interior(world, to) {
                continue;
            }

            if to == player {
                world.move_pursuer(index, to);
                let _ = world.conclude(Terminal::Lost);
                info!(row = to.row(), column = to.column(), "pursuer_caught_player");
                return;
            }

            let passable = matches!(
                query::tile(world, to),
                Some(Tile::Empty | Tile::Goal | Tile::Pickup)
            );
            if to != from && passable && !query::pursuer_at(world, to) {
                world.move_pursuer(index, to);
            }
        }

        world.add_score(TICK_SCORE);
    }

    fn render(&self, world: &GridWorld, display: &mut dyn Display) {
        update_display(display, query::tiles(world), &GLYPHS, query::score(world));
    }

    fn on_won(&self, world: &GridWorld, display: &mut dyn Display) {
        let score = format!("Score: {}", query::score(world));
        present_screen(display, &[("YOU WIN!", 35, 20), (score.as_str(), 35, 30)]);
    }

    fn on_lost(&self, world: &GridWorld, display: &mut dyn Display) {
        let score = format!("Score: {}", query::score(world));
        present_screen(display, &[("GAME OVER", 30, 20), (score.as_str(), 30, 30)]);
    }
}
