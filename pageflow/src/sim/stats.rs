/*!
End-of-run statistics.
*/

use std::fmt;

use crate::types::time;

/// Reference counters accumulated by the coordinator.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Stats {
    /// Memory references received, valid or not.
    pub total_refs: u64,
    /// References that missed their page table.
    pub total_faults: u64,
    /// Workers admitted over the whole run.
    pub total_spawned: u64,
}

impl Stats {
    pub fn hits(&self) -> u64 {
        self.total_refs - self.total_faults
    }

    /// Faults per reference, in `0.0..=1.0`.
    pub fn fault_ratio(&self) -> f64 {
        if self.total_refs == 0 {
            0.0
        } else {
            self.total_faults as f64 / self.total_refs as f64
        }
    }

    /// References per second of virtual time.
    pub fn refs_per_sec(&self, now_ns: u64) -> f64 {
        if now_ns == 0 {
            0.0
        } else {
            self.total_refs as f64 * time::sec(1) as f64 / now_ns as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} references, {} hits, {} faults (ratio {:.3}), {} workers",
            self.total_refs,
            self.hits(),
            self.total_faults,
            self.fault_ratio(),
            self.total_spawned
        )
    }
}
