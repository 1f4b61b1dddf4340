/*!
The real-time watchdog.

The simulation is virtual-time driven, but a run must not hold OS
resources forever if workers misbehave. The watchdog arms a wall-clock
deadline at construction and is polled once per loop iteration.
*/

use coarsetime::{Duration, Instant};

/// Wall-clock deadline for an entire run.
pub struct Watchdog {
    armed_at: Instant,
    deadline: Duration,
}

impl Watchdog {
    /// Arms the watchdog `deadline_secs` of real time from now.
    pub fn new(deadline_secs: u64) -> Self {
        Self {
            armed_at: Instant::now(),
            deadline: Duration::from_secs(deadline_secs),
        }
    }

    /// True once the wall-clock deadline has passed.
    pub fn expired(&self) -> bool {
        self.armed_at.elapsed() >= self.deadline
    }
}
