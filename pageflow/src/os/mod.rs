/*!
The process side of the model: process control blocks and the worker
lifecycle contract.
*/

pub mod pcb;
#[doc(hidden)]
pub use pcb::{Pcb, PcbTable, PendingFault, MAX_PROC};

pub mod worker;
#[doc(hidden)]
pub use worker::{Pid, WorkerPool};
