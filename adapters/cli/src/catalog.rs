//! Bundled games and their stock configurations.

use clap::ValueEnum;
use pocket_arcade_core::{ConfigError, DodgeConfig, GameConfig, PursuitConfig};
use pocket_arcade_engine::RuleEngine;
use pocket_arcade_system_dodge::Dodge;
use pocket_arcade_system_pursuit::Pursuit;

/// Games the host knows how to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum GameKind {
    /// Collect pickups and reach the exit before the pursuers catch you.
    #[default]
    Pursuit,
    /// Slide along the bottom row and dodge falling objects.
    Dodge,
}

/// Catalog order used by `list`.
pub(crate) const GAMES: [GameKind; 2] = [GameKind::Pursuit, GameKind::Dodge];

impl GameKind {
    /// Kind of game a configuration describes.
    pub(crate) const fn of(config: &GameConfig) -> Self {
        match config {
            GameConfig::Pursuit(_) => Self::Pursuit,
            GameConfig::Dodge(_) => Self::Dodge,
        }
    }

    /// Display title shown in the catalog.
    pub(crate) const fn title(self) -> &'static str {
        match self {
            Self::Pursuit => "Collect Stars",
            Self::Dodge => "Dodge Objects",
        }
    }

    /// Configuration the game ships with.
    pub(crate) fn default_config(self) -> GameConfig {
        match self {
            Self::Pursuit => GameConfig::Pursuit(PursuitConfig::default()),
            Self::Dodge => GameConfig::Dodge(DodgeConfig {
                num_walls: 2,
                spawn_interval_ms: 2000,
                ..DodgeConfig::default()
            }),
        }
    }
}

/// Builds the rule engine for a configuration, validating it first.
pub(crate) fn build(config: GameConfig) -> Result<Box<dyn RuleEngine>, ConfigError> {
    Ok(match config {
        GameConfig::Pursuit(config) => Box::new(Pursuit::new(config)?),
        GameConfig::Dodge(config) => Box::new(Dodge::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_builds() {
        for kind in GAMES {
            let config = kind.default_config();
            assert_eq!(GameKind::of(&config), kind);
            let rules = build(config).expect("stock configuration is valid");
            assert!(!rules.name().is_empty());
        }
    }

    #[test]
    fn stock_dodge_uses_thick_walls_and_slow_spawns() {
        let GameConfig::Dodge(config) = GameKind::Dodge.default_config() else {
            panic!("dodge entry must carry a dodge configuration");
        };
        assert_eq!(config.num_walls, 2);
        assert_eq!(config.spawn_interval_ms, 2000);
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let config = GameConfig::Dodge(DodgeConfig {
            fall_speed: 0,
            ..DodgeConfig::default()
        });
        assert!(matches!(build(config), Err(ConfigError::ZeroFallSpeed)));
    }
}
