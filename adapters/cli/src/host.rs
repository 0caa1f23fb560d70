//! Terminal stand-ins for the device display, buttons and reset line.

use std::{
    io::{self, BufRead, Write},
    process,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use pocket_arcade_core::DirectionSet;
use pocket_arcade_engine::Device;
use pocket_arcade_input::{key_direction, Buttons};
use pocket_arcade_rendering::{CharFramebuffer, Display, DEVICE_HEIGHT_PX, DEVICE_WIDTH_PX};
use tracing::{debug, info, warn};

/// Extra text row below the stock panel so the score line under a full board stays visible.
const SCORE_ROW_PX: u32 = 8;

/// Prints every presented frame to stdout inside a border.
#[derive(Debug)]
pub(crate) struct StdoutDisplay {
    frame: CharFramebuffer,
}

impl StdoutDisplay {
    pub(crate) fn new() -> Self {
        Self {
            frame: CharFramebuffer::new(DEVICE_WIDTH_PX, DEVICE_HEIGHT_PX + SCORE_ROW_PX),
        }
    }

    fn print_frame(&self) -> io::Result<()> {
        let (columns, _) = self.frame.dimensions();
        let border = format!("+{}+", "-".repeat(columns));
        let mut out = io::stdout().lock();
        writeln!(out, "{border}")?;
        for line in self.frame.presented() {
            writeln!(out, "|{line}|")?;
        }
        writeln!(out, "{border}")?;
        out.flush()
    }
}

impl Display for StdoutDisplay {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        self.frame.draw_text(text, x, y);
    }

    fn show(&mut self) {
        self.frame.show();
        if let Err(error) = self.print_frame() {
            warn!(%error, "frame_write_failed");
        }
    }
}

/// Buttons fed by key lines typed on stdin.
///
/// A reader thread latches every direction key it sees; the latch is drained
/// each time the buttons are sampled.
#[derive(Debug)]
pub(crate) struct StdinButtons {
    latched: Arc<Mutex<DirectionSet>>,
}

impl StdinButtons {
    pub(crate) fn spawn() -> io::Result<Self> {
        let latched = Arc::new(Mutex::new(DirectionSet::empty()));
        let writer = Arc::clone(&latched);
        let _ = thread::Builder::new()
            .name("stdin-buttons".to_owned())
            .spawn(move || read_keys(&writer))?;
        Ok(Self { latched })
    }
}

fn read_keys(latched: &Mutex<DirectionSet>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let Ok(mut held) = latched.lock() else {
            break;
        };
        for direction in line.chars().filter_map(key_direction) {
            held.insert(direction);
        }
    }
    debug!("stdin_closed");
}

impl Buttons for StdinButtons {
    fn held(&mut self) -> DirectionSet {
        match self.latched.lock() {
            Ok(mut held) => std::mem::take(&mut *held),
            Err(_) => DirectionSet::empty(),
        }
    }
}

/// Sleeps for delays and exits the process on reset.
#[derive(Debug, Default)]
pub(crate) struct HostDevice;

impl Device for HostDevice {
    fn delay(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    fn reset(&mut self) {
        info!("device_reset");
        let _ = io::stdout().flush();
        process::exit(0);
    }
}
