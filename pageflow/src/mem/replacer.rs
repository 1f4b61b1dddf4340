/*!
LRU victim selection.

The replacer only picks the frame and severs the victim's page-table
entry; installing the new page stays with the simulation loop, the
single site that closes the frame/page-table cycle.
*/

use log::{debug, warn};

use super::frame::FrameTable;
use crate::os::PcbTable;

/// Selects the frame that will hold the page `slot` is faulting on.
///
/// A free frame is taken as-is. Otherwise the occupied frame with the
/// oldest reference time is evicted: its owner's page-table entry is
/// cleared and the frame index returned for reuse.
pub fn select_frame(frames: &mut FrameTable, pcbs: &mut PcbTable, slot: usize) -> usize {
    if let Some(frame) = frames.find_free() {
        return frame;
    }

    let frame = frames.victim();
    let (victim_pid, victim_page) = frames.evict_owner(frame);
    match pcbs.find_by_pid(victim_pid) {
        Some(victim_slot) => pcbs.unmap(victim_slot, victim_page),
        // owner already reaped; the frame is reclaimable without unmapping
        None => warn!(
            "victim frame {} owner pid {} has no live pcb",
            frame, victim_pid
        ),
    }

    let page = pcbs.get(slot).fault.map(|f| f.page).unwrap_or_default();
    debug!(
        "clearing frame {}, swapping in p{} page {}",
        frame, slot, page
    );

    frame
}
