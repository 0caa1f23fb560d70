#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session state machine shared by every Pocket Arcade title.
//!
//! A [`Session`] owns one [`GridWorld`] together with the [`RuleEngine`] that
//! gives it meaning. Two actors mutate that board: the poll loop driven by the
//! caller, which dispatches button presses and renders, and a periodic ticker
//! thread that advances non-player entities. Both take the same board lock for
//! their whole critical section, so a tick can never observe a half-applied
//! move or a frame in the middle of being drawn.

mod ticker;

use std::{
    fmt, io,
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::{Duration, Instant},
};

use pocket_arcade_core::{
    ConfigError, Direction, GameConfig, Terminal, POLL_INTERVAL, TERMINAL_SCREEN_DELAY,
};
use pocket_arcade_input::InputSource;
use pocket_arcade_rendering::Display;
use pocket_arcade_world::{query, GridWorld, InvariantViolation};
use thiserror::Error;
use tracing::{debug, info};

use crate::ticker::Ticker;

/// Game-specific behavior plugged into a [`Session`].
///
/// Every hook is required. A rule engine that forgets one does not compile,
/// which keeps a missing `tick` from ever showing up as a frozen game.
pub trait RuleEngine: Send {
    /// Short human-readable name of the game.
    fn name(&self) -> &'static str;

    /// Builds a fresh, internally consistent world for a new session.
    fn initialize(&mut self, now: Instant) -> Result<GridWorld, EngineError>;

    /// Reacts to one pressed direction. Illegal moves are silent no-ops.
    fn handle_input(&mut self, world: &mut GridWorld, direction: Direction);

    /// Advances every non-player entity by one step.
    fn tick(&mut self, world: &mut GridWorld, now: Instant);

    /// Pushes the current world and score to the display.
    fn render(&self, world: &GridWorld, display: &mut dyn Display);

    /// Presents the win screen.
    fn on_won(&self, world: &GridWorld, display: &mut dyn Display);

    /// Presents the loss screen.
    fn on_lost(&self, world: &GridWorld, display: &mut dyn Display);
}

/// Board-level services of the device hosting a session.
pub trait Device {
    /// Blocks for the provided duration.
    fn delay(&mut self, duration: Duration);

    /// Performs a full device reset. Real hardware never returns from this.
    fn reset(&mut self);
}

/// Cadences driving a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Period of the entity-advancing tick.
    pub tick_period: Duration,
    /// Sleep between two poll cycles.
    pub poll_interval: Duration,
    /// Time the terminal screen stays up before the reset.
    pub terminal_delay: Duration,
}

impl Timing {
    /// Stock poll and terminal cadences around the provided tick period.
    #[must_use]
    pub const fn new(tick_period: Duration) -> Self {
        Self {
            tick_period,
            poll_interval: POLL_INTERVAL,
            terminal_delay: TERMINAL_SCREEN_DELAY,
        }
    }

    /// Timing for a session built from the provided configuration.
    #[must_use]
    pub fn for_config(config: &GameConfig) -> Self {
        Self::new(config.tick_period())
    }
}

/// Lifecycle stage of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed but not yet started.
    Uninitialized,
    /// Polling input and ticking.
    Running,
    /// The player won; the session only awaits its terminal screen.
    Won,
    /// The player lost; the session only awaits its terminal screen.
    Lost,
}

impl Phase {
    /// Reports whether the phase ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    const fn terminal(self) -> Option<Terminal> {
        match self {
            Self::Won => Some(Terminal::Won),
            Self::Lost => Some(Terminal::Lost),
            Self::Uninitialized | Self::Running => None,
        }
    }
}

impl From<Terminal> for Phase {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Won => Self::Won,
            Terminal::Lost => Self::Lost,
        }
    }
}

/// Result of a concluded session, for hosts whose reset returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// How the session ended.
    pub terminal: Terminal,
    /// Score when the terminal condition was observed.
    pub score: u32,
}

/// Failures surfaced by a session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule engine rejected its configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The world broke one of its consistency rules.
    #[error("world invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// `start` was called on a session that already started.
    #[error("session has already been started")]
    AlreadyStarted,
    /// The session has no world yet.
    #[error("session has not been started")]
    NotStarted,
    /// The session is not in the running phase.
    #[error("session is not running")]
    NotRunning,
    /// `conclude` was called before a terminal condition was observed.
    #[error("session has not reached a terminal state")]
    NotFinished,
    /// The periodic ticker thread could not be spawned.
    #[error("failed to spawn the ticker thread")]
    TickerSpawn(#[source] io::Error),
    /// A thread panicked while holding the board lock.
    #[error("board lock poisoned by a panicked thread")]
    BoardPoisoned,
}

/// World and rule engine guarded together by the board lock.
pub(crate) struct Board {
    pub(crate) world: GridWorld,
    pub(crate) rules: Box<dyn RuleEngine>,
}

pub(crate) type SharedBoard = Arc<Mutex<Board>>;

/// One run of a game from initialization to its terminal screen.
pub struct Session {
    name: &'static str,
    timing: Timing,
    phase: Phase,
    pending: Option<Box<dyn RuleEngine>>,
    board: Option<SharedBoard>,
    ticker: Option<Ticker>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("timing", &self.timing)
            .field("phase", &self.phase)
            .field("ticker_armed", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an uninitialized session around the provided rule engine.
    #[must_use]
    pub fn new(rules: Box<dyn RuleEngine>, timing: Timing) -> Self {
        Self {
            name: rules.name(),
            timing,
            phase: Phase::Uninitialized,
            pending: Some(rules),
            board: None,
            ticker: None,
        }
    }

    /// Name of the game being played.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Cadences driving the session.
    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Reports whether the periodic ticker is still armed.
    #[must_use]
    pub fn ticker_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Initializes the world, verifies it and arms the periodic tick.
    ///
    /// A failed initialization leaves the session uninitialized so the caller
    /// can report the condition before anything was drawn.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let Some(mut rules) = self.pending.take() else {
            return Err(EngineError::AlreadyStarted);
        };

        let world = match initialize_verified(rules.as_mut()) {
            Ok(world) => world,
            Err(error) => {
                self.pending = Some(rules);
                return Err(error);
            }
        };

        let board = Arc::new(Mutex::new(Board { world, rules }));
        let ticker = Ticker::arm(Arc::clone(&board), self.timing.tick_period, self.name)
            .map_err(EngineError::TickerSpawn)?;

        self.board = Some(board);
        self.ticker = Some(ticker);
        self.phase = Phase::Running;
        info!(
            game = self.name,
            tick_period_ms = self.timing.tick_period.as_millis() as u64,
            "session_started"
        );
        Ok(())
    }

    /// Runs one poll cycle: dispatch presses, render, check terminal flags.
    ///
    /// Presses are dispatched in scan order; once a press ends the game the
    /// remaining ones are dropped. Observing a terminal flag disarms the ticker
    /// before this returns.
    pub fn poll(
        &mut self,
        input: &mut dyn InputSource,
        display: &mut dyn Display,
    ) -> Result<Phase, EngineError> {
        if self.phase != Phase::Running {
            return Err(EngineError::NotRunning);
        }

        let pressed = input.get_pressed();
        let terminal = {
            let mut board = self.lock()?;
            let Board { world, rules } = &mut *board;
            for direction in pressed.iter() {
                if !query::is_running(world) {
                    break;
                }
                rules.handle_input(world, direction);
            }
            rules.render(world, display);
            query::terminal(world)
        };

        if let Some(terminal) = terminal {
            self.disarm();
            self.phase = Phase::from(terminal);
            debug!(game = self.name, ?terminal, "terminal_observed");
        }
        Ok(self.phase)
    }

    /// Presents the terminal screen, waits, then resets the device.
    pub fn conclude(
        &mut self,
        display: &mut dyn Display,
        device: &mut dyn Device,
    ) -> Result<Outcome, EngineError> {
        let Some(terminal) = self.phase.terminal() else {
            return Err(EngineError::NotFinished);
        };
        self.disarm();

        let score = {
            let board = self.lock()?;
            match terminal {
                Terminal::Won => board.rules.on_won(&board.world, display),
                Terminal::Lost => board.rules.on_lost(&board.world, display),
            }
            query::score(&board.world)
        };

        info!(game = self.name, ?terminal, score, "session_concluded");
        device.delay(self.timing.terminal_delay);
        device.reset();
        Ok(Outcome { terminal, score })
    }

    /// Plays the session to completion.
    pub fn run(
        mut self,
        input: &mut dyn InputSource,
        display: &mut dyn Display,
        device: &mut dyn Device,
    ) -> Result<Outcome, EngineError> {
        if self.phase == Phase::Uninitialized {
            self.start()?;
        }

        while self.phase == Phase::Running {
            if self.poll(input, display)? == Phase::Running {
                thread::sleep(self.timing.poll_interval);
            }
        }

        self.conclude(display, device)
    }

    /// Reads the world under the board lock.
    pub fn with_world<R>(&self, read: impl FnOnce(&GridWorld) -> R) -> Result<R, EngineError> {
        let board = self.lock()?;
        Ok(read(&board.world))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Board>, EngineError> {
        self.board
            .as_ref()
            .ok_or(EngineError::NotStarted)?
            .lock()
            .map_err(|_| EngineError::BoardPoisoned)
    }

    fn disarm(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.disarm();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn initialize_verified(rules: &mut dyn RuleEngine) -> Result<GridWorld, EngineError> {
    let world = rules.initialize(Instant::now())?;
    world.verify()?;
    Ok(world)
}
