//! Session configuration records and their validation rules.
//!
//! Configurations are plain serde records so hosts can load them from TOML.
//! Every field has a default matching the stock game catalog, and unknown
//! fields are rejected so that a mismatched option fails before a session is
//! built rather than silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted map size on either axis, in cells.
pub const MAX_MAP_DIMENSION: u32 = 256;

/// Rejects maps too large to allocate as a single tile array.
fn check_max_dimensions(width: u32, height: u32) -> Result<(), ConfigError> {
    if width > MAX_MAP_DIMENSION || height > MAX_MAP_DIMENSION {
        return Err(ConfigError::GridTooLarge {
            width,
            height,
            max: MAX_MAP_DIMENSION,
        });
    }
    Ok(())
}

/// Configuration of any supported game, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameConfig {
    /// Grid chase with pickups and a goal tile.
    Pursuit(PursuitConfig),
    /// Falling-object dodge arena.
    Dodge(DodgeConfig),
}

impl GameConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Period of the timer-driven tick for this game.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        match self {
            Self::Pursuit(config) => config.tick_period(),
            Self::Dodge(config) => config.tick_period(),
        }
    }

    /// Validates the configuration against its grid capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Pursuit(config) => config.validate(),
            Self::Dodge(config) => config.validate(),
        }
    }

    /// Replaces the random seed used to lay out the board.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        match self {
            Self::Pursuit(config) => config.seed = seed,
            Self::Dodge(config) => config.seed = seed,
        }
    }
}

/// Options recognised by the pursuit/collection game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PursuitConfig {
    /// Width of the map in cells.
    pub map_width: u32,
    /// Height of the map in cells.
    pub map_height: u32,
    /// Milliseconds between pursuer advances.
    pub tick_period_ms: u64,
    /// Number of pursuers placed at random.
    pub num_pursuers: u32,
    /// Number of interior walls placed at random.
    pub num_walls: u32,
    /// Number of pickups placed at random.
    pub num_pickups: u32,
    /// Seed for the board layout; entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            map_width: 16,
            map_height: 8,
            tick_period_ms: 1000,
            num_pursuers: 2,
            num_walls: 5,
            num_pickups: 5,
            seed: None,
        }
    }
}

impl PursuitConfig {
    /// Period of the pursuer advance tick.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Number of interior cells left free once the player and goal are placed.
    #[must_use]
    pub fn open_cells(&self) -> u64 {
        let interior = u64::from(self.map_width.saturating_sub(2))
            * u64::from(self.map_height.saturating_sub(2));
        interior.saturating_sub(2)
    }

    /// Checks dimensions and entity counts before any board state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        if self.map_width < 3 || self.map_height < 3 {
            return Err(ConfigError::GridTooSmall {
                width: self.map_width,
                height: self.map_height,
                min_width: 3,
                min_height: 3,
            });
        }

        check_max_dimensions(self.map_width, self.map_height)?;

        if self.map_width == 3 && self.map_height == 3 {
            return Err(ConfigError::PlayerOnGoal);
        }

        let requested = u64::from(self.num_pursuers)
            + u64::from(self.num_walls)
            + u64::from(self.num_pickups);
        let available = self.open_cells();
        if requested > available {
            return Err(ConfigError::Overcrowded {
                requested,
                available,
            });
        }

        Ok(())
    }
}

/// Options recognised by the falling-object dodge game.
///
/// Files may give the spawn interval either as `spawn_interval_ms` or as
/// `spawn_interval` in whole seconds, but not both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DodgeOptions")]
pub struct DodgeConfig {
    /// Width of the map in cells, wall columns included.
    pub map_width: u32,
    /// Height of the map in cells.
    pub map_height: u32,
    /// Milliseconds between falling steps.
    pub tick_period_ms: u64,
    /// Thickness of the wall columns on each side.
    pub num_walls: u32,
    /// Milliseconds that must elapse between two spawns.
    pub spawn_interval_ms: u64,
    /// Rows an object falls per tick.
    pub fall_speed: u32,
    /// Spawn attempts made when the arena is initialised.
    pub initial_objects: u32,
    /// Seed for spawn columns; entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self {
            map_width: 16,
            map_height: 8,
            tick_period_ms: 300,
            num_walls: 1,
            spawn_interval_ms: 1000,
            fall_speed: 1,
            initial_objects: 3,
            seed: None,
        }
    }
}

/// Dodge options as written in a configuration file.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DodgeOptions {
    map_width: u32,
    map_height: u32,
    tick_period_ms: u64,
    num_walls: u32,
    spawn_interval_ms: Option<u64>,
    spawn_interval: Option<u64>,
    fall_speed: u32,
    initial_objects: u32,
    seed: Option<u64>,
}

impl Default for DodgeOptions {
    fn default() -> Self {
        let stock = DodgeConfig::default();
        Self {
            map_width: stock.map_width,
            map_height: stock.map_height,
            tick_period_ms: stock.tick_period_ms,
            num_walls: stock.num_walls,
            spawn_interval_ms: None,
            spawn_interval: None,
            fall_speed: stock.fall_speed,
            initial_objects: stock.initial_objects,
            seed: stock.seed,
        }
    }
}

impl TryFrom<DodgeOptions> for DodgeConfig {
    type Error = ConfigError;

    fn try_from(options: DodgeOptions) -> Result<Self, Self::Error> {
        let spawn_interval_ms = match (options.spawn_interval_ms, options.spawn_interval) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingOptions {
                    first: "spawn_interval_ms",
                    second: "spawn_interval",
                })
            }
            (Some(millis), None) => millis,
            (None, Some(seconds)) => seconds.saturating_mul(1000),
            (None, None) => Self::default().spawn_interval_ms,
        };
        Ok(Self {
            map_width: options.map_width,
            map_height: options.map_height,
            tick_period_ms: options.tick_period_ms,
            num_walls: options.num_walls,
            spawn_interval_ms,
            fall_speed: options.fall_speed,
            initial_objects: options.initial_objects,
            seed: options.seed,
        })
    }
}

impl DodgeConfig {
    /// Period of the falling-object tick.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Minimum elapsed time between two spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Checks dimensions, wall thickness and speed before any board state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        if self.map_width == 0 || self.map_height < 2 {
            return Err(ConfigError::GridTooSmall {
                width: self.map_width,
                height: self.map_height,
                min_width: 1,
                min_height: 2,
            });
        }
        check_max_dimensions(self.map_width, self.map_height)?;

        if u64::from(self.num_walls) * 2 >= u64::from(self.map_width) {
            return Err(ConfigError::WallsTooThick {
                num_walls: self.num_walls,
                map_width: self.map_width,
            });
        }

        if self.fall_speed == 0 {
            return Err(ConfigError::ZeroFallSpeed);
        }

        Ok(())
    }
}

/// Reasons a configuration cannot produce a playable session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The periodic tick must have a positive period.
    #[error("tick_period_ms must be positive")]
    ZeroTickPeriod,
    /// The map is too small for the game's fixed layout.
    #[error("a {width}x{height} map is too small (need at least {min_width}x{min_height})")]
    GridTooSmall {
        /// Requested width in cells.
        width: u32,
        /// Requested height in cells.
        height: u32,
        /// Smallest accepted width.
        min_width: u32,
        /// Smallest accepted height.
        min_height: u32,
    },
    /// The player start and the goal would share the only interior cell.
    #[error("the player start and the goal would occupy the same cell")]
    PlayerOnGoal,
    /// More entities were requested than the interior can hold.
    #[error("{requested} entities requested but only {available} interior cells are free")]
    Overcrowded {
        /// Pursuers, walls and pickups requested in total.
        requested: u64,
        /// Interior cells left after placing the player and the goal.
        available: u64,
    },
    /// The side walls leave no open column for the player.
    #[error("{num_walls} wall columns per side leave no open column on a {map_width}-wide map")]
    WallsTooThick {
        /// Requested wall thickness.
        num_walls: u32,
        /// Requested map width.
        map_width: u32,
    },
    /// Objects must fall at least one row per tick.
    #[error("fall_speed must be positive")]
    ZeroFallSpeed,
    /// Two options describing the same setting were both given.
    #[error("`{first}` and `{second}` set the same option; give only one")]
    ConflictingOptions {
        /// First spelling found.
        first: &'static str,
        /// Second spelling found.
        second: &'static str,
    },
    /// The map exceeds the largest supported grid.
    #[error("a {width}x{height} map exceeds the {max}x{max} limit")]
    GridTooLarge {
        /// Requested width in cells.
        width: u32,
        /// Requested height in cells.
        height: u32,
        /// Largest accepted size on either axis.
        max: u32,
    },
    /// Random placement gave up after the bounded number of attempts.
    #[error("could not place a {entity} after {attempts} attempts")]
    PlacementExhausted {
        /// Kind of entity being placed.
        entity: &'static str,
        /// Attempts made before giving up.
        attempts: u32,
    },
    /// The configuration text is not valid TOML for any known game.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pursuit_configuration_is_valid() {
        PursuitConfig::default()
            .validate()
            .expect("stock pursuit configuration must validate");
    }

    #[test]
    fn default_dodge_configuration_is_valid() {
        DodgeConfig::default()
            .validate()
            .expect("stock dodge configuration must validate");
    }

    #[test]
    fn pursuit_rejects_more_entities_than_open_cells() {
        let config = PursuitConfig {
            map_width: 5,
            map_height: 5,
            num_pursuers: 3,
            num_walls: 3,
            num_pickups: 2,
            ..PursuitConfig::default()
        };

        let error = config.validate().expect_err("9 interior cells minus 2");
        assert!(matches!(
            error,
            ConfigError::Overcrowded {
                requested: 8,
                available: 7
            }
        ));
    }

    #[test]
    fn pursuit_accepts_a_completely_filled_interior() {
        let config = PursuitConfig {
            map_width: 5,
            map_height: 5,
            num_pursuers: 2,
            num_walls: 3,
            num_pickups: 2,
            ..PursuitConfig::default()
        };

        config.validate().expect("exactly full interior is allowed");
    }

    #[test]
    fn pursuit_rejects_degenerate_maps() {
        let narrow = PursuitConfig {
            map_width: 2,
            ..PursuitConfig::default()
        };
        assert!(matches!(
            narrow.validate(),
            Err(ConfigError::GridTooSmall { width: 2, .. })
        ));

        let single_cell = PursuitConfig {
            map_width: 3,
            map_height: 3,
            num_pursuers: 0,
            num_walls: 0,
            num_pickups: 0,
            ..PursuitConfig::default()
        };
        assert!(matches!(
            single_cell.validate(),
            Err(ConfigError::PlayerOnGoal)
        ));
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        let config = DodgeConfig {
            tick_period_ms: 0,
            ..DodgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTickPeriod)));
    }

    #[test]
    fn dodge_rejects_walls_covering_the_arena() {
        let config = DodgeConfig {
            map_width: 4,
            num_walls: 2,
            ..DodgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WallsTooThick {
                num_walls: 2,
                map_width: 4
            })
        ));
    }

    #[test]
    fn dodge_rejects_stationary_objects() {
        let config = DodgeConfig {
            fall_speed: 0,
            ..DodgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFallSpeed)));
    }

    #[test]
    fn parses_tagged_toml_with_defaults() {
        let config = GameConfig::from_toml(
            r#"
            kind = "dodge"
            num_walls = 2
            spawn_interval_ms = 2000
            "#,
        )
        .expect("valid dodge configuration");

        let GameConfig::Dodge(dodge) = config else {
            panic!("expected a dodge configuration");
        };
        assert_eq!(dodge.num_walls, 2);
        assert_eq!(dodge.spawn_interval(), Duration::from_secs(2));
        assert_eq!(dodge.map_width, 16);
        assert_eq!(dodge.fall_speed, 1);
    }

    #[test]
    fn spawn_interval_in_seconds_is_accepted() {
        let config = GameConfig::from_toml("kind = \"dodge\"\nspawn_interval = 2")
            .expect("seconds spelling is recognised");

        let GameConfig::Dodge(dodge) = config else {
            panic!("expected a dodge configuration");
        };
        assert_eq!(dodge.spawn_interval_ms, 2000);
        assert_eq!(dodge.spawn_interval(), Duration::from_secs(2));
    }

    #[test]
    fn both_spawn_interval_spellings_are_rejected() {
        let error = GameConfig::from_toml(
            r#"
            kind = "dodge"
            spawn_interval = 2
            spawn_interval_ms = 500
            "#,
        )
        .expect_err("conflicting spellings");
        assert!(error.to_string().contains("spawn_interval"));
    }

    #[test]
    fn dodge_without_an_interval_keeps_the_default() {
        let GameConfig::Dodge(dodge) =
            GameConfig::from_toml("kind = \"dodge\"").expect("defaults apply")
        else {
            panic!("expected a dodge configuration");
        };
        assert_eq!(dodge, DodgeConfig::default());
    }

    #[test]
    fn oversized_maps_are_rejected_before_allocation() {
        let pursuit = PursuitConfig {
            map_width: 100_000,
            map_height: 100_000,
            ..PursuitConfig::default()
        };
        assert!(matches!(
            pursuit.validate(),
            Err(ConfigError::GridTooLarge { width: 100_000, .. })
        ));

        let dodge = DodgeConfig {
            map_height: MAX_MAP_DIMENSION + 1,
            ..DodgeConfig::default()
        };
        assert!(matches!(
            dodge.validate(),
            Err(ConfigError::GridTooLarge { max: MAX_MAP_DIMENSION, .. })
        ));

        let largest = PursuitConfig {
            map_width: MAX_MAP_DIMENSION,
            map_height: MAX_MAP_DIMENSION,
            ..PursuitConfig::default()
        };
        largest.validate().expect("the limit itself is allowed");
    }

    #[test]
    fn unknown_options_fail_fast() {
        let error = toml::from_str::<PursuitConfig>("num_zombies = 3")
            .expect_err("unknown option must be rejected");
        assert!(error.to_string().contains("num_zombies"));
    }

    #[test]
    fn unknown_game_kind_is_a_parse_error() {
        let error = GameConfig::from_toml("kind = \"tetris\"").expect_err("unknown kind");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn tick_period_follows_variant() {
        let pursuit = GameConfig::Pursuit(PursuitConfig::default());
        let dodge = GameConfig::Dodge(DodgeConfig::default());
        assert_eq!(pursuit.tick_period(), Duration::from_millis(1000));
        assert_eq!(dodge.tick_period(), Duration::from_millis(300));
    }
}
