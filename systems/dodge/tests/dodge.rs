use std::time::{Duration, Instant};

use pocket_arcade_core::{CellCoord, Direction, DodgeConfig, Terminal, Tile};
use pocket_arcade_engine::{Device, Outcome, RuleEngine, Session, Timing};
use pocket_arcade_input::ScriptedInput;
use pocket_arcade_rendering::CharFramebuffer;
use pocket_arcade_system_dodge::Dodge;
use pocket_arcade_world::{query, GridWorld};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn arena(config: DodgeConfig) -> (Dodge, GridWorld, Instant) {
    let mut rules = Dodge::new(DodgeConfig {
        initial_objects: 0,
        seed: Some(5),
        ..config
    })
    .expect("valid configuration");
    let start = Instant::now();
    let world = rules.initialize(start).expect("arena");
    (rules, world, start)
}

fn soon(start: Instant) -> Instant {
    start + Duration::from_millis(10)
}

#[test]
fn objects_fall_by_their_speed() {
    let (mut rules, mut world, start) = arena(DodgeConfig {
        fall_speed: 3,
        ..DodgeConfig::default()
    });
    let _ = world.spawn_falling(CellCoord::new(1, 5));

    rules.tick(&mut world, soon(start));

    assert_eq!(query::falling_objects(&world)[0].cell(), CellCoord::new(4, 5));
    assert_eq!(query::tile(&world, CellCoord::new(1, 5)), Some(Tile::Empty));
    assert_eq!(query::tile(&world, CellCoord::new(4, 5)), Some(Tile::FallingObject));
    assert_eq!(query::score(&world), 0);
    world.verify().expect("consistent after a fall");
}

#[test]
fn object_leaving_the_bottom_is_removed_and_scored() {
    let (mut rules, mut world, start) = arena(DodgeConfig::default());
    let _ = world.spawn_falling(CellCoord::new(7, 3));

    rules.tick(&mut world, soon(start));

    assert!(query::falling_objects(&world).is_empty());
    assert_eq!(query::score(&world), 1);
    assert_eq!(query::tile(&world, CellCoord::new(7, 3)), Some(Tile::Empty));
    assert!(query::is_running(&world));
    world.verify().expect("consistent after removal");
}

#[test]
fn hitting_the_player_abandons_the_rest_of_the_tick() {
    let (mut rules, mut world, start) = arena(DodgeConfig::default());
    assert_eq!(query::player(&world), CellCoord::new(7, 8));
    let _ = world.spawn_falling(CellCoord::new(7, 3));
    let _ = world.spawn_falling(CellCoord::new(6, 8));
    let _ = world.spawn_falling(CellCoord::new(2, 4));

    rules.tick(&mut world, soon(start));

    assert_eq!(query::terminal(&world), Some(Terminal::Lost));
    assert_eq!(query::score(&world), 1);
    assert_eq!(query::falling_objects(&world).len(), 3);
    assert_eq!(query::tile(&world, CellCoord::new(7, 3)), Some(Tile::Empty));
    assert_eq!(query::tile(&world, CellCoord::new(6, 8)), Some(Tile::Empty));
    assert_eq!(query::tile(&world, CellCoord::new(2, 4)), Some(Tile::FallingObject));
    assert_eq!(query::tile(&world, CellCoord::new(7, 8)), Some(Tile::Player));
    assert_eq!(query::falling_objects(&world)[2].cell(), CellCoord::new(2, 4));
}

#[test]
fn landing_on_another_object_is_a_collision() {
    let (mut rules, mut world, start) = arena(DodgeConfig {
        fall_speed: 2,
        ..DodgeConfig::default()
    });
    let _ = world.spawn_falling(CellCoord::new(2, 5));
    let _ = world.spawn_falling(CellCoord::new(4, 5));

    rules.tick(&mut world, soon(start));

    assert_eq!(query::terminal(&world), Some(Terminal::Lost));
    assert_eq!(query::tile(&world, CellCoord::new(2, 5)), Some(Tile::Empty));
    assert_eq!(query::tile(&world, CellCoord::new(4, 5)), Some(Tile::FallingObject));
}

#[test]
fn no_objects_move_after_the_game_ends() {
    let (mut rules, mut world, start) = arena(DodgeConfig::default());
    let _ = world.spawn_falling(CellCoord::new(6, 8));
    let _ = world.spawn_falling(CellCoord::new(1, 2));
    rules.tick(&mut world, soon(start));
    assert!(!query::is_running(&world));

    rules.tick(&mut world, start + Duration::from_secs(5));
    assert_eq!(query::falling_objects(&world)[1].cell(), CellCoord::new(1, 2));
    assert_eq!(query::falling_objects(&world).len(), 2);
}

#[test]
fn player_is_clamped_between_the_walls() {
    let (mut rules, mut world, _) = arena(DodgeConfig {
        num_walls: 2,
        ..DodgeConfig::default()
    });

    for _ in 0..10 {
        rules.handle_input(&mut world, Direction::Right);
    }
    assert_eq!(query::player(&world), CellCoord::new(7, 13));
    assert_eq!(query::tile(&world, CellCoord::new(7, 14)), Some(Tile::Wall));

    for _ in 0..20 {
        rules.handle_input(&mut world, Direction::Left);
    }
    assert_eq!(query::player(&world), CellCoord::new(7, 2));

    rules.handle_input(&mut world, Direction::Up);
    rules.handle_input(&mut world, Direction::Down);
    assert_eq!(query::player(&world), CellCoord::new(7, 2));
    world.verify().expect("walls intact");
}

#[test]
fn sliding_into_an_object_loses() {
    let (mut rules, mut world, _) = arena(DodgeConfig::default());
    let _ = world.spawn_falling(CellCoord::new(7, 9));

    rules.handle_input(&mut world, Direction::Right);

    assert_eq!(query::terminal(&world), Some(Terminal::Lost));
    assert_eq!(query::player(&world), CellCoord::new(7, 8));
}

#[test]
fn spawns_wait_for_the_interval_to_be_exceeded() {
    let (mut rules, mut world, start) = arena(DodgeConfig {
        spawn_interval_ms: 1000,
        ..DodgeConfig::default()
    });

    rules.tick(&mut world, start + Duration::from_millis(1000));
    assert!(query::falling_objects(&world).is_empty());

    rules.tick(&mut world, start + Duration::from_millis(1001));
    let objects = query::falling_objects(&world);
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].cell().row(), 1);
    assert!((1..=14).contains(&objects[0].cell().column()));

    rules.tick(&mut world, start + Duration::from_millis(1500));
    assert_eq!(query::falling_objects(&world).len(), 1);
    assert_eq!(query::falling_objects(&world)[0].cell().row(), 2);
    world.verify().expect("consistent after spawning");
}

#[test]
fn initial_objects_start_on_distinct_open_columns() {
    for seed in 0..32 {
        let mut rules = Dodge::new(DodgeConfig {
            num_walls: 3,
            initial_objects: 4,
            seed: Some(seed),
            ..DodgeConfig::default()
        })
        .expect("valid configuration");
        let world = rules.initialize(Instant::now()).expect("arena");
        world.verify().expect("seeded arena is consistent");

        let objects = query::falling_objects(&world);
        assert!(!objects.is_empty() && objects.len() <= 4);
        let mut columns: Vec<_> = objects.iter().map(|object| object.cell().column()).collect();
        assert!(objects.iter().all(|object| object.cell().row() == 0));
        assert!(columns.iter().all(|column| (3..=12).contains(column)));
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), objects.len());
    }
}

#[test]
fn random_play_keeps_the_arena_consistent() {
    for seed in 0..200 {
        let mut rules = Dodge::new(DodgeConfig {
            fall_speed: 1 + (seed % 3) as u32,
            spawn_interval_ms: 200,
            seed: Some(seed),
            ..DodgeConfig::default()
        })
        .expect("valid configuration");
        let start = Instant::now();
        let mut world = rules.initialize(start).expect("arena");
        let mut moves = ChaCha8Rng::seed_from_u64(seed);

        for step in 0..300u64 {
            let choice = moves.gen_range(0..Direction::ALL.len() + 1);
            match Direction::ALL.get(choice) {
                Some(direction) => rules.handle_input(&mut world, *direction),
                None => rules.tick(&mut world, start + Duration::from_millis(step * 100)),
            }
            if !query::is_running(&world) {
                break;
            }
            if let Err(violation) = world.verify() {
                panic!("seed {seed} step {step}: {violation}");
            }
        }
    }
}

#[derive(Default)]
struct RecordingDevice {
    delays: Vec<Duration>,
    resets: u32,
}

impl Device for RecordingDevice {
    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

#[test]
fn session_ends_on_the_game_over_screen() {
    let config = DodgeConfig {
        map_width: 3,
        map_height: 2,
        tick_period_ms: 5,
        num_walls: 1,
        spawn_interval_ms: 60_000,
        fall_speed: 1,
        initial_objects: 1,
        seed: Some(9),
    };
    let rules = Dodge::new(config.clone()).expect("one open column");
    let timing = Timing {
        poll_interval: Duration::from_millis(1),
        ..Timing::new(config.tick_period())
    };
    let mut input = ScriptedInput::default();
    let mut display = CharFramebuffer::device();
    let mut device = RecordingDevice::default();

    let outcome = Session::new(Box::new(rules), timing)
        .run(&mut input, &mut display, &mut device)
        .expect("session completes");

    assert_eq!(
        outcome,
        Outcome {
            terminal: Terminal::Lost,
            score: 0
        }
    );
    assert_eq!(device.delays, vec![timing.terminal_delay]);
    assert_eq!(device.resets, 1);
    assert_eq!(display.presented()[3].trim_end(), "  GAME OVER");
    assert_eq!(display.presented()[4].trim_end(), "  Final Score: 0");
}
