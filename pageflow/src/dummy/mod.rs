/*!
A deterministic in-process worker population.

Implements both halves of the coordinator's environment,
[`RequestChannel`] and [`WorkerPool`], without forking anything: each
worker is a small state machine that observes the published clock
read-only, issues a uniformly random reference when its act deadline
passes, blocks until its reply arrives, and periodically rolls a die on
whether to terminate once it has lived long enough.
*/

use log::trace;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::error::{Error, Result};
use crate::os::{Pid, WorkerPool};
use crate::proto::{Reply, Request, RequestChannel};
use crate::types::clock::SharedClock;
use crate::types::page::ADDRESS_SPACE;
use crate::types::time;

/// Upper bound on the random delay before a worker's next reference.
pub const ACT_BOUND_NS: u64 = 1_000;

/// Virtual time between two termination checks.
pub const TERM_CHECK_NS: u64 = time::ms(250);

/// Virtual lifetime a worker must reach before it may terminate.
pub const LIFE_NS: u64 = time::sec(2);

/// Percent chance of terminating at each eligible check.
pub const TERM_PROB: u32 = 40;

struct DummyWorker {
    pid: Pid,
    rng: XorShiftRng,
    start: u64,
    next_act: u64,
    last_term_check: u64,
    /// Request sent, reply not yet received.
    blocked: bool,
    /// Decided to exit, not yet reaped.
    done: bool,
}

impl DummyWorker {
    /// Runs the worker's termination logic against the published clock.
    /// A blocked worker sits in its receive and cannot decide anything.
    fn poll(&mut self, now: u64) {
        if self.blocked || self.done {
            return;
        }
        if now.saturating_sub(self.last_term_check) >= TERM_CHECK_NS {
            self.last_term_check = now;
            if now - self.start >= LIFE_NS && self.rng.gen_range(0..100) < TERM_PROB {
                self.done = true;
            }
        }
    }
}

/// The in-process worker population.
pub struct DummyPool {
    region: SharedClock,
    rng: XorShiftRng,
    workers: Vec<DummyWorker>,
    next_pid: Pid,
}

impl DummyPool {
    /// Creates a pool with a fixed default seed.
    ///
    /// Note:
    ///
    /// Using a fixed seed for the rng will provide reproducability
    /// throughout test cases.
    pub fn new(region: SharedClock) -> Self {
        Self::with_seed(region, 1)
    }

    /// Creates a pool with the given seed as a starting value for the RNG.
    pub fn with_seed(region: SharedClock, seed: u64) -> Self {
        Self {
            region,
            rng: SeedableRng::seed_from_u64(seed),
            workers: Vec::new(),
            next_pid: 1,
        }
    }

    /// Number of workers that have not yet been reaped.
    pub fn live_workers(&self) -> usize {
        self.workers.len()
    }
}

impl WorkerPool for DummyPool {
    fn spawn(&mut self) -> Result<Pid> {
        let pid = self.next_pid;
        self.next_pid += 1;

        // per-worker rng, derived once from the pool seed
        let mut rng = XorShiftRng::seed_from_u64(self.rng.gen());
        let now = self.region.load_ns();
        let next_act = now + rng.gen_range(0..ACT_BOUND_NS);

        self.workers.push(DummyWorker {
            pid,
            rng,
            start: now,
            next_act,
            last_term_check: now,
            blocked: false,
            done: false,
        });
        trace!("dummy worker pid {} spawned at {}ns", pid, now);
        Ok(pid)
    }

    fn try_reap(&mut self) -> Result<Option<Pid>> {
        let now = self.region.load_ns();
        for worker in self.workers.iter_mut() {
            worker.poll(now);
        }
        if let Some(idx) = self.workers.iter().position(|w| w.done) {
            let pid = self.workers.remove(idx).pid;
            trace!("dummy worker pid {} exited at {}ns", pid, now);
            return Ok(Some(pid));
        }
        Ok(None)
    }

    fn kill_all(&mut self) {
        self.workers.clear();
    }
}

impl RequestChannel for DummyPool {
    fn try_recv(&mut self) -> Result<Option<Request>> {
        let now = self.region.load_ns();
        for worker in self.workers.iter_mut() {
            worker.poll(now);
        }

        // the earliest-due worker sent first; ties resolve by pid
        let due = self
            .workers
            .iter_mut()
            .filter(|w| !w.blocked && !w.done && now >= w.next_act)
            .min_by_key(|w| (w.next_act, w.pid));

        if let Some(worker) = due {
            worker.blocked = true;
            let address = worker.rng.gen_range(0..ADDRESS_SPACE);
            let is_write = worker.rng.gen_range(0..2) == 1;
            return Ok(Some(Request {
                pid: worker.pid,
                address,
                is_write,
            }));
        }
        Ok(None)
    }

    fn send_reply(&mut self, reply: Reply) -> Result<()> {
        let now = self.region.load_ns();
        let worker = self
            .workers
            .iter_mut()
            .find(|w| w.pid == reply.pid)
            .ok_or(Error::Channel("reply addressed to dead worker"))?;

        worker.blocked = false;
        worker.next_act = now + worker.rng.gen_range(0..ACT_BOUND_NS);
        Ok(())
    }
}
