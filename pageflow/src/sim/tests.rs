use std::collections::VecDeque;

use super::*;
use crate::dummy::DummyPool;
use crate::error::Error;
use crate::proto::Request;

/// Scripted stand-in for the worker population: requests are injected by
/// hand, spawns and reaps pop pre-arranged pids, replies are recorded.
#[derive(Default)]
struct TestHost {
    inbox: VecDeque<Request>,
    replies: Vec<Reply>,
    spawn_queue: VecDeque<Pid>,
    reap_queue: VecDeque<Pid>,
    killed: bool,
}

impl WorkerPool for TestHost {
    fn spawn(&mut self) -> Result<Pid> {
        self.spawn_queue
            .pop_front()
            .ok_or(Error::Setup("no scripted worker to spawn"))
    }

    fn try_reap(&mut self) -> Result<Option<Pid>> {
        Ok(self.reap_queue.pop_front())
    }

    fn kill_all(&mut self) {
        self.killed = true;
    }
}

impl RequestChannel for TestHost {
    fn try_recv(&mut self) -> Result<Option<Request>> {
        Ok(self.inbox.pop_front())
    }

    fn send_reply(&mut self, reply: Reply) -> Result<()> {
        self.replies.push(reply);
        Ok(())
    }
}

fn coordinator(cfg: Config) -> Coordinator<TestHost> {
    Coordinator::new(cfg, SharedClock::new(), TestHost::default()).unwrap()
}

fn push_request(coord: &mut Coordinator<TestHost>, pid: Pid, address: u32, is_write: bool) {
    coord.host_mut().inbox.push_back(Request {
        pid,
        address,
        is_write,
    });
}

/// Steps until `count` replies have been recorded.
fn step_until_replies(coord: &mut Coordinator<TestHost>, count: usize) {
    for _ in 0..1_000 {
        if coord.host().replies.len() >= count {
            return;
        }
        coord.step().unwrap();
    }
    panic!("no reply within 1000 steps");
}

#[test]
fn config_caps() {
    let mut cfg = Config::default();
    cfg.quota = MAX_TOTAL_WORKERS + 1;
    assert_eq!(cfg.validate(), Err(Error::Config("worker quota exceeds 100")));

    let mut cfg = Config::default();
    cfg.simul = MAX_PROC as u32 + 1;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.frames = 0;
    assert!(cfg.validate().is_err());

    assert!(Config::default().validate().is_ok());
}

#[test]
fn cold_fault_then_hit() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(42);

    coord.step().unwrap();
    assert_eq!(coord.pcbs().find_by_pid(42), Some(0));
    assert_eq!(coord.stats().total_spawned, 1);

    // first reference: cold fault
    push_request(&mut coord, 42, 0, false);
    coord.step().unwrap();
    assert_eq!(coord.stats().total_refs, 1);
    assert_eq!(coord.stats().total_faults, 1);
    assert!(coord.faults().contains(0));
    let wait_at = coord.pcbs().get(0).fault.unwrap().at;

    step_until_replies(&mut coord, 1);
    assert_eq!(coord.host().replies, vec![Reply::grant(42)]);

    let frame = coord.frames().get(0);
    assert!(frame.is_occupied());
    assert!(!frame.is_dirty());
    assert_eq!((frame.owner_pid, frame.page_num), (42, 0));
    assert_eq!(coord.pcbs().get(0).page_table[0], Some(0));
    assert!(!coord.pcbs().get(0).is_waiting());
    // service respected the base latency
    assert!(frame.last_ref - wait_at >= FAULT_LATENCY_NS);

    // second reference: hit, mapping untouched
    let before = coord.frames().get(0).last_ref;
    push_request(&mut coord, 42, 0, false);
    coord.step().unwrap();
    assert_eq!(coord.stats().total_refs, 2);
    assert_eq!(coord.stats().total_faults, 1);
    assert_eq!(coord.host().replies.len(), 2);
    assert_eq!(coord.pcbs().get(0).page_table[0], Some(0));

    // last_ref advanced to the post-overhead clock
    let frame = coord.frames().get(0);
    assert!(frame.last_ref > before);
    assert_eq!(frame.last_ref, coord.clock().now_ns());
    assert!(coord.tables_consistent());
}

#[test]
fn repeated_hits_advance_last_ref_monotonically() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(9);
    coord.step().unwrap();

    push_request(&mut coord, 9, 2048, false);
    step_until_replies(&mut coord, 1);

    let mut last = coord.frames().get(0).last_ref;
    for n in 2..6 {
        push_request(&mut coord, 9, 2048, false);
        step_until_replies(&mut coord, n);
        let now_ref = coord.frames().get(0).last_ref;
        assert!(now_ref > last);
        last = now_ref;
        // still a single mapping to the same frame
        assert_eq!(coord.pcbs().get(0).page_table[2], Some(0));
    }
    assert_eq!(coord.stats().total_faults, 1);
}

#[test]
fn eviction_clears_victim_mapping() {
    let cfg = Config {
        quota: 3,
        simul: 3,
        frames: 2,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.extend([100, 101, 102]);
    for _ in 0..3 {
        coord.step().unwrap();
    }
    assert_eq!(coord.running(), 3);

    // fill both frames
    push_request(&mut coord, 100, 0, false);
    step_until_replies(&mut coord, 1);
    push_request(&mut coord, 101, 1024, false);
    step_until_replies(&mut coord, 2);
    assert_eq!(coord.frames().find_free(), None);

    // third fault must evict frame 0, the older reference
    push_request(&mut coord, 102, 2048, false);
    step_until_replies(&mut coord, 3);

    let frame = coord.frames().get(0);
    assert_eq!((frame.owner_pid, frame.page_num), (102, 2));
    let a = coord.pcbs().find_by_pid(100).unwrap();
    assert_eq!(coord.pcbs().get(a).page_table[0], None);
    let b = coord.pcbs().find_by_pid(101).unwrap();
    assert_eq!(coord.pcbs().get(b).page_table[1], Some(1));
    assert!(coord.tables_consistent());
}

#[test]
fn write_fault_sets_dirty_and_pays_penalty() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(7);
    coord.step().unwrap();

    push_request(&mut coord, 7, 512, true);
    coord.step().unwrap();
    let wait_at = coord.pcbs().get(0).fault.unwrap().at;

    step_until_replies(&mut coord, 1);
    let frame = coord.frames().get(0);
    assert!(frame.is_dirty());
    assert_eq!(frame.page_num, 0);
    assert!(frame.last_ref - wait_at >= FAULT_LATENCY_NS + DIRTY_PENALTY_NS);
}

#[test]
fn write_hit_marks_frame_dirty() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(7);
    coord.step().unwrap();

    // load the page with a read, then hit it with a write
    push_request(&mut coord, 7, 0, false);
    step_until_replies(&mut coord, 1);
    assert!(!coord.frames().get(0).is_dirty());

    push_request(&mut coord, 7, 8, true);
    coord.step().unwrap();
    assert_eq!(coord.stats().total_faults, 1);
    assert!(coord.frames().get(0).is_dirty());
}

#[test]
fn fault_queue_services_strictly_in_order() {
    let cfg = Config {
        quota: 2,
        simul: 2,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.extend([200, 201]);
    coord.step().unwrap();
    coord.step().unwrap();

    // both requests pending; the loop dequeues one per iteration, so the
    // second fault is recorded one tick after the first
    push_request(&mut coord, 200, 0, false);
    push_request(&mut coord, 201, 1024, false);

    step_until_replies(&mut coord, 2);
    assert_eq!(
        coord.host().replies,
        vec![Reply::grant(200), Reply::grant(201)]
    );

    // each fault honored its own latency
    let fa = coord.frames().get(0);
    let fb = coord.frames().get(1);
    assert!(fa.last_ref < fb.last_ref);
}

#[test]
fn illegal_address_aborts_without_mutation() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(7);
    coord.step().unwrap();

    push_request(&mut coord, 7, 33_000, false);
    let err = coord.step().unwrap_err();
    assert_eq!(err, Error::Protocol("address out of range"));

    // the reference was counted but nothing else moved
    assert_eq!(coord.stats().total_refs, 1);
    assert_eq!(coord.stats().total_faults, 0);
    assert!(coord.frames().iter().all(|f| !f.is_occupied()));
    let pcb = coord.pcbs().get(0);
    assert!(pcb.page_table.iter().all(Option::is_none));
    assert!(!pcb.is_waiting());
    assert!(coord.faults().is_empty());
}

#[test]
fn request_from_unknown_pid_is_a_protocol_violation() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(7);
    coord.step().unwrap();

    push_request(&mut coord, 999, 0, false);
    assert_eq!(
        coord.step().unwrap_err(),
        Error::Protocol("request from unknown worker")
    );
}

#[test]
fn reap_scrubs_frames_pcb_and_fault_queue() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        frames: 8,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.push_back(77);
    coord.step().unwrap();

    // resident pages in frames 3 and 7, plus a queued fault
    coord.pcbs.record_fault(0, 0, false, 0);
    coord.pcbs.resolve_fault(0, 3);
    coord.frames.install(3, 77, 0, false, 100);
    coord.pcbs.record_fault(0, 5, true, 0);
    coord.pcbs.resolve_fault(0, 7);
    coord.frames.install(7, 77, 5, true, 200);
    coord.pcbs.record_fault(0, 9, false, coord.clock.now_ns());
    coord.faults.push(0);
    assert!(coord.tables_consistent());

    coord.host_mut().reap_queue.push_back(77);
    coord.step().unwrap();

    assert!(!coord.frames().get(3).is_occupied());
    assert!(!coord.frames().get(7).is_occupied());
    assert!(!coord.pcbs().get(0).occupied);
    assert!(coord.faults().is_empty());
    assert_eq!(coord.running(), 0);
    assert!(coord.done());
    assert!(coord.tables_consistent());
}

#[test]
fn admissions_respect_interval_and_simul_cap() {
    let cfg = Config {
        quota: 3,
        simul: 1,
        spawn_interval: time::ms(50),
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    coord.host_mut().spawn_queue.extend([1, 2, 3]);

    // only one worker may run; nothing else spawns until it is reaped
    for _ in 0..20 {
        coord.step().unwrap();
    }
    assert_eq!(coord.stats().total_spawned, 1);
    assert_eq!(coord.running(), 1);

    let pid = coord.pid_of_slot(0).unwrap();
    coord.host_mut().reap_queue.push_back(pid);
    for _ in 0..20 {
        coord.step().unwrap();
    }
    assert_eq!(coord.stats().total_spawned, 2);
}

#[test]
fn watchdog_kills_workers_and_fails_the_run() {
    let cfg = Config {
        quota: 1,
        simul: 1,
        watchdog_secs: 0,
        ..Config::default()
    };
    let mut coord = coordinator(cfg);
    assert_eq!(coord.run().unwrap_err(), Error::Watchdog);
    assert!(coord.host().killed);
}

#[test]
fn randomized_run_preserves_invariants() {
    let region = SharedClock::new();
    let host = DummyPool::with_seed(region.clone(), 0xdead_beef);
    let cfg = Config {
        quota: 12,
        simul: 6,
        spawn_interval: time::ms(1),
        frames: 8,
        watchdog_secs: 3600,
        ..Config::default()
    };
    let mut coord = Coordinator::new(cfg, region, host).unwrap();

    let mut last_now = 0;
    let mut prev_spawned = 0;
    let mut admit_times = Vec::new();

    for _ in 0..1_000_000 {
        if coord.done() {
            break;
        }
        coord.step().unwrap();

        let now = coord.clock().now_ns();
        assert!(now >= last_now);
        last_now = now;

        let stats = *coord.stats();
        assert!(stats.total_faults <= stats.total_refs);
        assert!(coord.tables_consistent());

        if stats.total_spawned > prev_spawned {
            prev_spawned = stats.total_spawned;
            admit_times.push(now);
        }
    }

    assert!(coord.done(), "run did not converge");
    assert_eq!(coord.stats().total_spawned, 12);
    assert!(coord.stats().total_refs > 0);
    assert!(coord.stats().total_faults > 0);
    assert_eq!(coord.host().live_workers(), 0);

    for pair in admit_times.windows(2) {
        assert!(pair[1] - pair[0] >= cfg.spawn_interval);
    }
}
