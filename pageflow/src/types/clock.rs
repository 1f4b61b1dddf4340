/*!
The virtual system clock and its published, shared form.

The clock is a purely virtual `(seconds, nanoseconds)` counter. It is
mutated only by the coordinator and advances in fixed quanta: one
[`tick`](VirtClock::tick) per loop iteration plus small
[`overhead`](VirtClock::overhead) charges at bookkeeping points.
*/

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::time;

/// Nanoseconds added by one clock tick (one loop iteration).
pub const TICK_NS: u64 = time::ms(10);

/// Nanoseconds charged for a bookkeeping operation.
pub const OVERHEAD_NS: u64 = time::us(1);

const NANOS_PER_SEC: u64 = time::sec(1);

/// The virtual system clock.
///
/// Invariant: `nanos < 1_000_000_000` after every operation, and the
/// composed value is monotonically non-decreasing. All composition into a
/// single nanosecond count goes through 64-bit arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirtClock {
    secs: u32,
    nanos: u32,
}

impl VirtClock {
    pub const fn new() -> Self {
        Self { secs: 0, nanos: 0 }
    }

    pub const fn secs(&self) -> u32 {
        self.secs
    }

    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Advances the clock by one simulation quantum.
    pub fn tick(&mut self) {
        self.add(TICK_NS);
    }

    /// Charges the cost of a bookkeeping operation.
    pub fn overhead(&mut self) {
        self.add(OVERHEAD_NS);
    }

    /// Advances the clock by an explicit nanosecond count, normalizing
    /// overflow into the seconds word.
    pub fn add(&mut self, ns: u64) {
        let total = self.nanos as u64 + ns;
        self.secs += (total / NANOS_PER_SEC) as u32;
        self.nanos = (total % NANOS_PER_SEC) as u32;
    }

    /// Returns the current virtual time as a single nanosecond count.
    pub fn now_ns(&self) -> u64 {
        self.secs as u64 * NANOS_PER_SEC + self.nanos as u64
    }
}

/// The published clock region.
///
/// Mirrors the wire contract of the shared region: two 32-bit words,
/// index 0 holding seconds and index 1 holding nanoseconds. The
/// coordinator is the single writer; workers attach read-only clones.
/// Relaxed ordering is sufficient under the single-writer rule.
#[derive(Clone, Default)]
pub struct SharedClock {
    words: Arc<[AtomicU32; 2]>,
}

impl SharedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the coordinator's clock value.
    pub fn store(&self, clock: &VirtClock) {
        self.words[0].store(clock.secs(), Ordering::Relaxed);
        self.words[1].store(clock.nanos(), Ordering::Relaxed);
    }

    /// Reads the published time as a single nanosecond count.
    pub fn load_ns(&self) -> u64 {
        let secs = self.words[0].load(Ordering::Relaxed);
        let nanos = self.words[1].load(Ordering::Relaxed);
        secs as u64 * NANOS_PER_SEC + nanos as u64
    }
}
