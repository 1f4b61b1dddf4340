/*!
The physical side of the memory model: the global frame table and the
LRU replacement policy that feeds it.
*/

pub mod frame;
#[doc(hidden)]
pub use frame::{Frame, FrameFlags, FrameTable, FRAME_NUM};

pub mod replacer;
#[doc(hidden)]
pub use replacer::select_frame;
