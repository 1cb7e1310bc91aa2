//! Self-pacing under the DLP quota of 600 requests per minute.
//!
//! The default policy pauses after every 600th record by position, counting
//! records that were skipped for being empty. [`PacingBasis::RemoteCalls`]
//! counts actual DLP calls instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CALLS_PER_WINDOW: usize = 600;

/// Slightly longer than the 60-second quota window.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(61);

/// What the pause threshold counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingBasis {
    /// Record position in the batch.
    #[default]
    Position,
    /// Remote calls actually made.
    RemoteCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub calls_per_window: usize,
    pub pause: Duration,
    pub basis: PacingBasis,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            calls_per_window: DEFAULT_CALLS_PER_WINDOW,
            pause: DEFAULT_PAUSE,
            basis: PacingBasis::Position,
        }
    }
}

impl PacingPolicy {
    /// A pacer for one batch.
    pub fn pacer(self) -> Pacer {
        Pacer {
            policy: self,
            calls: 0,
        }
    }
}

/// Per-batch pacing state.
#[derive(Debug)]
pub struct Pacer {
    policy: PacingPolicy,
    calls: usize,
}

impl Pacer {
    /// Report that the record at `position` has been handled, `called`
    /// saying whether it reached the remote API. Returns the pause to take
    /// before the next record, if any.
    pub fn after_record(&mut self, position: usize, called: bool) -> Option<Duration> {
        let every = self.policy.calls_per_window;
        if every == 0 {
            return None;
        }
        let due = match self.policy.basis {
            PacingBasis::Position => position != 0 && position % every == 0,
            PacingBasis::RemoteCalls => {
                if !called {
                    return None;
                }
                self.calls += 1;
                self.calls % every == 0
            }
        };
        due.then_some(self.policy.pause)
    }
}

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// Blocks the calling thread.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
