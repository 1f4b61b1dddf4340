/*!
The worker lifecycle contract.

Workers are opaque agents living outside the coordinator. The pool hides
how they come to exist (forked processes, threads, or the in-process
population in [dummy](../dummy/index.html)); the coordinator only
spawns, reaps and kills.
*/

use crate::error::Result;

/// Opaque worker identity, unique among live workers.
pub type Pid = u32;

/// Spawning, reaping and killing of the worker population.
pub trait WorkerPool {
    /// Launches one new worker and returns its pid.
    fn spawn(&mut self) -> Result<Pid>;

    /// Polls for a terminated worker without blocking.
    ///
    /// Returns `Ok(None)` when no worker has exited. Called in a drain
    /// loop, so at most one pid is reported per call.
    fn try_reap(&mut self) -> Result<Option<Pid>>;

    /// Terminates every live worker outright. Used only by the watchdog.
    fn kill_all(&mut self);
}
