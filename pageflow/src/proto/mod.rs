/*!
The request/response protocol between workers and the coordinator.

On the wire this maps to a typed message queue: requests travel to the
coordinator under a single well-known message type, replies travel back
under the requesting worker's pid. [`RequestChannel`] abstracts that
addressing convention so the coordinator never blocks: reception is
non-blocking and "no message ready" is a plain `Ok(None)`, not an error.
*/

use crate::error::Result;
use crate::os::Pid;

/// A memory reference emitted by a worker.
///
/// The worker blocks after sending a request until the reply addressed
/// to its pid arrives; it never has more than one request in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Request {
    pub pid: Pid,
    /// Logical address, legal range `0..32768`.
    pub address: u32,
    pub is_write: bool,
}

/// The coordinator's answer to a [`Request`], delivered to the worker's
/// private mailbox keyed by pid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Reply {
    pub pid: Pid,
    pub granted: bool,
}

impl Reply {
    pub const fn grant(pid: Pid) -> Self {
        Self { pid, granted: true }
    }
}

/// The message-channel contract between the coordinator and its workers.
pub trait RequestChannel {
    /// Polls for a pending request without blocking.
    ///
    /// `Ok(None)` means no message was ready; the simulation loop simply
    /// proceeds. `Err` is reserved for hard channel failures.
    fn try_recv(&mut self) -> Result<Option<Request>>;

    /// Delivers a reply to the worker addressed by `reply.pid`.
    fn send_reply(&mut self, reply: Reply) -> Result<()>;
}
