/*!
pageflow is a discrete-time simulator of demand-paged virtual memory with a
global least-recently-used replacement policy.

The heart of the library is the [Coordinator](sim/index.html): an event loop
that advances a purely virtual clock, admits worker processes, classifies
their memory references as hits or faults against a finite
[frame table](mem/index.html), queues faulting workers for a
latency-bounded service, and evicts LRU victims when no free frame remains.

Workers are abstract agents behind the [RequestChannel](proto/index.html)
and [WorkerPool](os/index.html) contracts: they emit `(address, is_write)`
requests and block until the coordinator grants them. A deterministic
in-process population is provided by the [dummy](dummy/index.html) module
for tests and demonstration runs.
*/

#[macro_use]
extern crate bitflags;

pub mod error;

pub mod types;

pub mod proto;

pub mod mem;

pub mod os;

pub mod sim;

pub mod dummy;

pub mod prelude {
    pub mod v1 {
        pub use crate::dummy::*;
        pub use crate::error::*;
        pub use crate::mem::*;
        pub use crate::os::*;
        pub use crate::proto::*;
        pub use crate::sim::*;
        pub use crate::types::*;
    }
    pub use v1::*;
}
