//! Periodic tick thread.

use std::{
    io,
    sync::mpsc::{self, RecvTimeoutError, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use pocket_arcade_world::query;
use tracing::{debug, info, warn};

use crate::{Board, SharedBoard};

/// Background thread firing the rule engine's tick at a fixed rate.
#[derive(Debug)]
pub(crate) struct Ticker {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the ticker. The first tick fires one period from now.
    pub(crate) fn arm(board: SharedBoard, period: Duration, game: &str) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("{game}-ticker"))
            .spawn(move || run(&board, period, &stopped))?;
        info!(
            game,
            period_ms = period.as_millis() as u64,
            "ticker_armed"
        );
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the ticker and waits for its thread. No tick fires afterwards.
    ///
    /// Must not be called while holding the board lock.
    pub(crate) fn disarm(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The thread may already have retired and dropped its receiver.
        let _ = self.stop.send(());
        if handle.join().is_err() {
            warn!("ticker_panicked");
        }
        info!("ticker_disarmed");
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(board: &SharedBoard, period: Duration, stopped: &mpsc::Receiver<()>) {
    let mut deadline = Instant::now() + period;
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match stopped.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
        deadline = next_deadline(deadline, period, Instant::now());

        let Ok(mut guard) = board.lock() else {
            warn!("ticker_board_poisoned");
            return;
        };
        // A disarm may have raced with the timeout while we waited for the lock.
        match stopped.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => return,
        }

        let Board { world, rules } = &mut *guard;
        if !query::is_running(world) {
            return;
        }
        rules.tick(world, Instant::now());
        if let Some(terminal) = query::terminal(world) {
            debug!(?terminal, "ticker_retired");
            return;
        }
    }
}

/// Next fire time on the fixed-rate schedule. Missed periods are dropped
/// rather than fired back to back.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next <= now {
        now + period
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_schedule_keeps_a_fixed_rate() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let now = start + Duration::from_millis(130);
        assert_eq!(next_deadline(start + period, period, now), start + period * 2);
    }

    #[test]
    fn overrun_skips_missed_periods() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let now = start + Duration::from_millis(550);
        assert_eq!(next_deadline(start + period, period, now), now + period);
    }
}
