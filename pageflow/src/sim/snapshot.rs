/*!
Periodic state dump.

Renders the PCB table, frame table and per-process page tables to plain
text lines. The coordinator emits them through the `log` facade, so a
logfile mirror installed by the binary observes exactly the console
lines.
*/

use std::fmt::Write;

use crate::mem::FrameTable;
use crate::os::PcbTable;
use crate::types::VirtClock;

fn split_ns(ns: u64) -> (u64, u64) {
    (ns / 1_000_000_000, ns % 1_000_000_000)
}

/// Renders the full periodic snapshot.
pub fn render(clock: &VirtClock, pcbs: &PcbTable, frames: &FrameTable) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "coordinator clock {}:{:09}",
        clock.secs(),
        clock.nanos()
    );

    let _ = writeln!(out, "process table:");
    let _ = writeln!(out, "entry\tpid\tstarts\tstartns\twaiting");
    for (slot, pcb) in pcbs.iter().enumerate() {
        if !pcb.occupied {
            continue;
        }
        let (s, ns) = split_ns(pcb.start_time);
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{:09}\t{}",
            slot,
            pcb.pid,
            s,
            ns,
            if pcb.is_waiting() { 1 } else { 0 }
        );
    }

    let _ = writeln!(out, "frame table:");
    let _ = writeln!(out, "frame\tdirty\towner\tpage\trefs\trefns");
    for (idx, frame) in frames.iter().enumerate() {
        if !frame.is_occupied() {
            continue;
        }
        let (s, ns) = split_ns(frame.last_ref);
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{:09}",
            idx,
            if frame.is_dirty() { 1 } else { 0 },
            frame.owner_pid,
            frame.page_num,
            s,
            ns
        );
    }

    for (slot, pcb) in pcbs.iter().enumerate() {
        if !pcb.occupied {
            continue;
        }
        let _ = write!(out, "page table p{}:", slot);
        for (page, frame) in pcb.page_table.iter().enumerate() {
            if let Some(frame) = frame {
                let _ = write!(out, " {}->{}", page, frame);
            }
        }
        let _ = writeln!(out);
    }

    out
}
