#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input contracts and debouncing for Pocket Arcade buttons.
//!
//! The engine only consumes [`InputSource`]. Hardware adapters expose raw pin
//! levels through [`Buttons`] and wrap them in a [`Debouncer`], which turns a
//! held or bouncing button into at most one press per debounce window.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use pocket_arcade_core::{Direction, DirectionSet, DEBOUNCE_WINDOW};
use thiserror::Error;
use tracing::trace;

/// Source of debounced direction presses polled by the engine.
pub trait InputSource {
    /// Directions newly pressed since the previous poll.
    fn get_pressed(&mut self) -> DirectionSet;
}

/// Raw button levels, sampled without any debouncing.
pub trait Buttons {
    /// Directions whose buttons are currently held down.
    fn held(&mut self) -> DirectionSet;
}

/// Reports each held direction at most once per debounce window.
#[derive(Debug)]
pub struct Debouncer<B> {
    buttons: B,
    window: Duration,
    last_press: [Option<Instant>; 4],
}

impl<B: Buttons> Debouncer<B> {
    /// Wraps the buttons with the stock debounce window.
    #[must_use]
    pub fn new(buttons: B) -> Self {
        Self::with_window(buttons, DEBOUNCE_WINDOW)
    }

    /// Wraps the buttons with a custom debounce window.
    #[must_use]
    pub fn with_window(buttons: B, window: Duration) -> Self {
        Self {
            buttons,
            window,
            last_press: [None; 4],
        }
    }

    /// Samples the buttons as if the current time were `now`.
    pub fn poll_at(&mut self, now: Instant) -> DirectionSet {
        let held = self.buttons.held();
        let mut pressed = DirectionSet::empty();
        for direction in held.iter() {
            let slot = &mut self.last_press[slot_index(direction)];
            let accepted = match *slot {
                Some(last) => now.saturating_duration_since(last) > self.window,
                None => true,
            };
            if accepted {
                *slot = Some(now);
                pressed.insert(direction);
            } else {
                trace!(direction = direction.name(), "press_debounced");
            }
        }
        pressed
    }

    /// Mutable access to the wrapped buttons.
    pub fn buttons_mut(&mut self) -> &mut B {
        &mut self.buttons
    }
}

impl<B: Buttons> InputSource for Debouncer<B> {
    fn get_pressed(&mut self) -> DirectionSet {
        self.poll_at(Instant::now())
    }
}

const fn slot_index(direction: Direction) -> usize {
    match direction {
        Direction::Left => 0,
        Direction::Right => 1,
        Direction::Up => 2,
        Direction::Down => 3,
    }
}

/// Maps a keyboard key onto a direction (`wasd` and `hjkl`).
#[must_use]
pub fn key_direction(key: char) -> Option<Direction> {
    match key.to_ascii_lowercase() {
        'a' | 'h' => Some(Direction::Left),
        'd' | 'l' => Some(Direction::Right),
        'w' | 'k' => Some(Direction::Up),
        's' | 'j' => Some(Direction::Down),
        _ => None,
    }
}

/// Replays a fixed sequence of polls, then reports nothing.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<DirectionSet>,
}

impl ScriptedInput {
    /// Creates a script from explicit per-poll frames.
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = DirectionSet>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parses a script where each key is one poll.
    ///
    /// Keys follow [`key_direction`]; `.` is a poll with nothing pressed and
    /// whitespace is ignored.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let mut frames = VecDeque::new();
        for (position, key) in script.chars().enumerate() {
            if key.is_whitespace() {
                continue;
            }
            if key == '.' {
                frames.push_back(DirectionSet::empty());
                continue;
            }
            let direction = key_direction(key).ok_or(ScriptError { key, position })?;
            frames.push_back(DirectionSet::only(direction));
        }
        Ok(Self { frames })
    }

    /// Number of polls left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn get_pressed(&mut self) -> DirectionSet {
        self.frames.pop_front().unwrap_or_default()
    }
}

/// A script contained a key that maps to no direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unrecognised key {key:?} at position {position} of the input script")]
pub struct ScriptError {
    /// Offending key.
    pub key: char,
    /// Zero-based character offset of the key.
    pub position: usize,
}
