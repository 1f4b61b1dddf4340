/*!
The coordinator: a single-threaded, non-blocking event loop over virtual
time.

Each iteration advances the clock by one quantum and then polls its three
sites in a fixed order: reap terminated workers, admit at most one new
worker, receive at most one request, service at most the head of the
fault queue. Bounding per-tick work this way guarantees the clock makes
progress between any two service events.
*/

use log::{debug, error, info, warn};

pub mod fault;
#[doc(hidden)]
pub use fault::FaultQueue;

pub mod snapshot;

pub mod stats;
#[doc(hidden)]
pub use stats::Stats;

pub mod watchdog;
#[doc(hidden)]
pub use watchdog::Watchdog;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use crate::mem::{replacer, FrameTable, FRAME_NUM};
use crate::os::{PcbTable, Pid, WorkerPool, MAX_PROC};
use crate::proto::{Reply, RequestChannel};
use crate::types::clock::{SharedClock, VirtClock};
use crate::types::page::page_index;
use crate::types::time;

/// Nanoseconds charged for a page hit on top of the bookkeeping overhead.
pub const HIT_COST_NS: u64 = 100;

/// Base service latency of a page fault.
pub const FAULT_LATENCY_NS: u64 = time::ms(14);

/// Additional latency charged when the faulting reference is a write.
pub const DIRTY_PENALTY_NS: u64 = time::ms(1);

/// Virtual time between two state snapshots.
pub const SNAPSHOT_PERIOD_NS: u64 = time::sec(1);

/// Default wall-clock watchdog deadline in seconds.
pub const WATCHDOG_SECS: u64 = 5;

/// Cap on the total number of workers admitted over a run.
pub const MAX_TOTAL_WORKERS: u32 = 100;

/// Run parameters of a coordinator.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Config {
    /// Total number of workers to admit over the run.
    pub quota: u32,
    /// Maximum number of concurrently running workers.
    pub simul: u32,
    /// Virtual nanoseconds between two admissions.
    pub spawn_interval: u64,
    /// Size of the frame table.
    pub frames: usize,
    /// Virtual nanoseconds between two snapshots.
    pub snapshot_period: u64,
    /// Wall-clock seconds before the watchdog abandons the run.
    pub watchdog_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quota: 1,
            simul: 1,
            spawn_interval: 0,
            frames: FRAME_NUM,
            snapshot_period: SNAPSHOT_PERIOD_NS,
            watchdog_secs: WATCHDOG_SECS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.quota > MAX_TOTAL_WORKERS {
            return Err(Error::Config("worker quota exceeds 100"));
        }
        if self.simul as usize > MAX_PROC {
            return Err(Error::Config("simultaneous workers exceed pcb capacity"));
        }
        if self.frames == 0 {
            return Err(Error::Config("frame table cannot be empty"));
        }
        Ok(())
    }
}

/// The coordinator process.
///
/// Owns the virtual clock, the frame/PCB tables and the fault queue; the
/// host `H` stands in for the worker population and its message channel.
/// The coordinator is the sole writer of the clock and both tables.
pub struct Coordinator<H> {
    cfg: Config,
    clock: VirtClock,
    region: SharedClock,
    frames: FrameTable,
    pcbs: PcbTable,
    faults: FaultQueue,
    stats: Stats,
    host: H,
    running: u32,
    next_spawn: u64,
    last_snapshot: u64,
}

impl<H> Coordinator<H>
where
    H: RequestChannel + WorkerPool,
{
    /// Creates a coordinator publishing into `region`.
    ///
    /// The host typically holds a read-only clone of the same region so
    /// its workers can observe the published clock.
    pub fn new(cfg: Config, region: SharedClock, host: H) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            clock: VirtClock::new(),
            region,
            frames: FrameTable::new(cfg.frames),
            pcbs: PcbTable::new(),
            faults: FaultQueue::new(),
            stats: Stats::default(),
            host,
            running: 0,
            next_spawn: cfg.spawn_interval,
            last_snapshot: 0,
            cfg,
        })
    }

    pub fn clock(&self) -> &VirtClock {
        &self.clock
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn pcbs(&self) -> &PcbTable {
        &self.pcbs
    }

    pub fn faults(&self) -> &FaultQueue {
        &self.faults
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn running(&self) -> u32 {
        self.running
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// True once every admission has happened and no worker remains.
    pub fn done(&self) -> bool {
        self.stats.total_spawned >= self.cfg.quota as u64 && self.running == 0
    }

    // every clock advance is published to the region immediately
    fn tick(&mut self) {
        self.clock.tick();
        self.region.store(&self.clock);
    }

    fn overhead(&mut self) {
        self.clock.overhead();
        self.region.store(&self.clock);
    }

    fn add(&mut self, ns: u64) {
        self.clock.add(ns);
        self.region.store(&self.clock);
    }

    /// Runs one iteration of the simulation loop.
    pub fn step(&mut self) -> Result<()> {
        self.tick();
        self.reap()?;
        self.maybe_snapshot();
        self.maybe_admit()?;
        self.receive_one()?;
        self.service_head()?;
        Ok(())
    }

    /// Drives [`step`](Self::step) until the run completes, polling the
    /// watchdog once per iteration. Any error abandons the run and kills
    /// the remaining workers.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "starting run: quota {} simul {} interval {}ns frames {}",
            self.cfg.quota,
            self.cfg.simul,
            self.cfg.spawn_interval,
            self.frames.len()
        );

        let dog = Watchdog::new(self.cfg.watchdog_secs);
        while !self.done() {
            if dog.expired() {
                error!(
                    "watchdog: {}s of wall clock elapsed, killing workers",
                    self.cfg.watchdog_secs
                );
                self.host.kill_all();
                return Err(Error::Watchdog);
            }
            if let Err(e) = self.step() {
                self.host.kill_all();
                return Err(e);
            }
        }

        info!(
            "run complete at {}:{:09}: {} ({:.1} refs/s virtual)",
            self.clock.secs(),
            self.clock.nanos(),
            self.stats,
            self.stats.refs_per_sec(self.clock.now_ns())
        );
        Ok(())
    }

    /// Drains terminated workers and scrubs every trace of them.
    fn reap(&mut self) -> Result<()> {
        while let Some(pid) = self.host.try_reap()? {
            match self.pcbs.find_by_pid(pid) {
                Some(slot) => {
                    self.frames.clear_by_pid(pid);
                    self.faults.remove(slot);
                    self.pcbs.release(slot);
                    self.running = self.running.saturating_sub(1);
                    info!("reaped worker pid {} from slot {}", pid, slot);
                }
                None => warn!("reaped pid {} with no pcb slot", pid),
            }
        }
        Ok(())
    }

    fn maybe_snapshot(&mut self) {
        let now = self.clock.now_ns();
        if now - self.last_snapshot >= self.cfg.snapshot_period {
            for line in snapshot::render(&self.clock, &self.pcbs, &self.frames).lines() {
                info!("{}", line);
            }
            self.last_snapshot = now;
        }
    }

    /// Admits at most one worker once the spawn deadline has passed.
    fn maybe_admit(&mut self) -> Result<()> {
        if self.clock.now_ns() < self.next_spawn
            || self.stats.total_spawned >= self.cfg.quota as u64
            || self.running >= self.cfg.simul
        {
            return Ok(());
        }

        let pid = self.host.spawn()?;
        self.stats.total_spawned += 1;
        self.running += 1;
        // admission is charged a full quantum
        self.tick();

        let now = self.clock.now_ns();
        let slot = self
            .pcbs
            .admit(pid, now)
            .ok_or(Error::Other("pcb table full on admission"))?;
        self.next_spawn = now + self.cfg.spawn_interval;

        info!(
            "admitted worker pid {} into slot {} at {}:{:09}",
            pid,
            slot,
            self.clock.secs(),
            self.clock.nanos()
        );
        Ok(())
    }

    /// Dequeues and classifies at most one request.
    fn receive_one(&mut self) -> Result<()> {
        let req = match self.host.try_recv()? {
            Some(req) => req,
            None => return Ok(()),
        };
        self.stats.total_refs += 1;

        let slot = self.pcbs.find_by_pid(req.pid).ok_or_else(|| {
            error!("request from pid {} with no pcb slot", req.pid);
            Error::Protocol("request from unknown worker")
        })?;
        let page = page_index(req.address).ok_or_else(|| {
            error!(
                "bad address {} from p{}: page {} out of range",
                req.address,
                slot,
                req.address / crate::types::page::PAGE_SIZE
            );
            Error::Protocol("address out of range")
        })?;

        match self.pcbs.get(slot).page_table[page] {
            Some(frame) => {
                self.overhead();
                self.add(HIT_COST_NS);
                let now = self.clock.now_ns();
                self.frames.touch(frame, now);
                if req.is_write {
                    self.frames.mark_dirty(frame);
                }
                self.host.send_reply(Reply::grant(req.pid))?;
                debug!(
                    "p{} page {} hit in frame {} at {}:{:09}",
                    slot,
                    page,
                    frame,
                    self.clock.secs(),
                    self.clock.nanos()
                );
            }
            None => {
                self.stats.total_faults += 1;
                let now = self.clock.now_ns();
                self.pcbs.record_fault(slot, page, req.is_write, now);
                self.faults.push(slot);
                debug!(
                    "p{} page {} fault at {}:{:09}, queueing",
                    slot,
                    page,
                    self.clock.secs(),
                    self.clock.nanos()
                );
            }
        }
        Ok(())
    }

    /// Services the head of the fault queue once its latency has elapsed.
    fn service_head(&mut self) -> Result<()> {
        let slot = match self.faults.front() {
            Some(slot) => slot,
            None => return Ok(()),
        };
        let pending = match self.pcbs.get(slot).fault {
            Some(pending) => pending,
            None => return Err(Error::Other("fault queue out of sync with pcb table")),
        };

        let mut latency = FAULT_LATENCY_NS;
        if pending.is_write {
            latency += DIRTY_PENALTY_NS;
        }
        if self.clock.now_ns() - pending.at < latency {
            return Ok(());
        }

        self.faults.pop();
        let frame = replacer::select_frame(&mut self.frames, &mut self.pcbs, slot);
        let fault = self
            .pcbs
            .resolve_fault(slot, frame)
            .ok_or(Error::Other("fault queue out of sync with pcb table"))?;
        let pid = self.pcbs.get(slot).pid;
        self.frames
            .install(frame, pid, fault.page, fault.is_write, self.clock.now_ns());
        self.overhead();
        if fault.is_write {
            // dirty-bit writeback penalty
            self.overhead();
        }
        debug_assert!(self.tables_consistent());

        self.host.send_reply(Reply::grant(pid))?;
        debug!(
            "serviced p{} page {} in frame {} at {}:{:09}",
            slot,
            fault.page,
            frame,
            self.clock.secs(),
            self.clock.nanos()
        );
        Ok(())
    }

    /// Verifies the cross-table invariants: every occupied frame is
    /// referenced by exactly one live page-table entry with matching
    /// owner, every resident page-table entry back-points correctly, and
    /// a slot waits iff it sits in the fault queue exactly once.
    pub fn tables_consistent(&self) -> bool {
        for (idx, frame) in self.frames.iter().enumerate() {
            if !frame.is_occupied() {
                continue;
            }
            let owners = self
                .pcbs
                .iter()
                .filter(|p| {
                    p.occupied
                        && p.pid == frame.owner_pid
                        && p.page_table[frame.page_num] == Some(idx)
                })
                .count();
            if owners != 1 {
                return false;
            }
        }

        for pcb in self.pcbs.iter() {
            if !pcb.occupied {
                continue;
            }
            for (page, entry) in pcb.page_table.iter().enumerate() {
                if let Some(frame) = *entry {
                    let f = self.frames.get(frame);
                    if !f.is_occupied() || f.owner_pid != pcb.pid || f.page_num != page {
                        return false;
                    }
                }
            }
        }

        for (slot, pcb) in self.pcbs.iter().enumerate() {
            let queued = self.faults.iter().filter(|&s| s == slot).count();
            let expected = usize::from(pcb.occupied && pcb.is_waiting());
            if queued != expected {
                return false;
            }
        }

        true
    }

    /// The pid occupying `slot`, for hosts that index by slot.
    pub fn pid_of_slot(&self, slot: usize) -> Option<Pid> {
        let pcb = self.pcbs.get(slot);
        if pcb.occupied {
            Some(pcb.pid)
        } else {
            None
        }
    }
}
