//! Coalesced wake signal from the worker to whoever consumes responses.
//!
//! The notifier is a generation counter behind a condition variable. The
//! worker calls [`Notifier::notify`] at most once per cycle; a host waits
//! for the generation to move past the last one it saw. Several notifies
//! between two waits collapse into one wakeup.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Event-wait primitive shared between an engine and its host.
#[derive(Debug, Default)]
pub struct Notifier {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the generation and wake every waiter.
    pub fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Block until the generation differs from `seen`, then return it.
    pub fn wait(&self, seen: u64) -> u64 {
        let mut generation = self.generation.lock();
        while *generation == seen {
            self.cond.wait(&mut generation);
        }
        *generation
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`, returning
    /// `None` if nothing was signalled.
    pub fn wait_timeout(&self, seen: u64, timeout: Duration) -> Option<u64> {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        while *generation == seen {
            if self.cond.wait_until(&mut generation, deadline).timed_out() {
                break;
            }
        }
        (*generation != seen).then_some(*generation)
    }
}
