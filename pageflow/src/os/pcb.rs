/*!
The process control block table.

Each of the `MAX_PROC` slots owns a 32-entry page table mapping page
indices to frame indices, plus the wait state of an unserviced fault.
A slot's lifetime runs from admission to reaping; releasing it resets
the page table so a later worker can reuse the slot cleanly.
*/

use super::worker::Pid;
use crate::types::page::PAGES_PER_PROC;

/// Maximum number of concurrently live workers.
pub const MAX_PROC: usize = 18;

/// The recorded state of an unserviced page fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFault {
    pub page: usize,
    pub is_write: bool,
    /// Virtual time (ns) at which the fault was recorded.
    pub at: u64,
}

/// One process control block slot.
#[derive(Clone, Copy, Debug)]
pub struct Pcb {
    pub occupied: bool,
    pub pid: Pid,
    /// Virtual time (ns) of admission.
    pub start_time: u64,
    /// Frame index per page, `None` when the page is not resident.
    pub page_table: [Option<usize>; PAGES_PER_PROC],
    /// `Some` iff this process has an unserviced fault.
    pub fault: Option<PendingFault>,
}

impl Pcb {
    const FREE: Pcb = Pcb {
        occupied: false,
        pid: 0,
        start_time: 0,
        page_table: [None; PAGES_PER_PROC],
        fault: None,
    };

    pub fn is_waiting(&self) -> bool {
        self.fault.is_some()
    }
}

/// Fixed table of PCB slots.
#[derive(Clone)]
pub struct PcbTable {
    slots: Box<[Pcb]>,
}

impl PcbTable {
    pub fn new() -> Self {
        Self {
            slots: vec![Pcb::FREE; MAX_PROC].into_boxed_slice(),
        }
    }

    pub fn get(&self, slot: usize) -> &Pcb {
        &self.slots[slot]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.slots.iter()
    }

    /// Admits a worker into the first free slot, or `None` if the table
    /// is full.
    pub fn admit(&mut self, pid: Pid, now: u64) -> Option<usize> {
        let slot = self.slots.iter().position(|p| !p.occupied)?;
        self.slots[slot] = Pcb {
            occupied: true,
            pid,
            start_time: now,
            ..Pcb::FREE
        };
        Some(slot)
    }

    /// Finds the slot of a live worker by pid.
    pub fn find_by_pid(&self, pid: Pid) -> Option<usize> {
        self.slots.iter().position(|p| p.occupied && p.pid == pid)
    }

    /// Clears a slot on worker termination, resetting its page table and
    /// any recorded fault.
    pub fn release(&mut self, slot: usize) {
        self.slots[slot] = Pcb::FREE;
    }

    /// Records an unserviced fault against `slot`.
    pub fn record_fault(&mut self, slot: usize, page: usize, is_write: bool, now: u64) {
        self.slots[slot].fault = Some(PendingFault {
            page,
            is_write,
            at: now,
        });
    }

    /// Completes the fault on `slot` by mapping its waited-on page to
    /// `frame`. Returns the recorded fault so the caller can install the
    /// frame with matching access mode, or `None` if the slot was not
    /// waiting.
    pub fn resolve_fault(&mut self, slot: usize, frame: usize) -> Option<PendingFault> {
        let pcb = &mut self.slots[slot];
        let fault = pcb.fault.take()?;
        pcb.page_table[fault.page] = Some(frame);
        Some(fault)
    }

    /// Clears the residency of `page` in the slot owning it. Used by the
    /// replacer when the page's frame is stolen.
    pub fn unmap(&mut self, slot: usize, page: usize) {
        self.slots[slot].page_table[page] = None;
    }
}

impl Default for PcbTable {
    fn default() -> Self {
        Self::new()
    }
}
