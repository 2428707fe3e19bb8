// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-thread commit and mount loop that exercises the tracing pipeline.
//!
//! A command thread reorders, inserts, and removes list items on one surface
//! while a mounting thread pulls aggregated transactions once per simulated
//! frame into a [`StubViewTree`]. When both finish, the mirror is checked
//! against the committed tree and a Chrome trace is written to `trace.json`.
//!
//! Pass `--verbose` to also print every trace event to stderr.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration as StdDuration;

use fabric_core::diff::{Mutation, StubViewTree};
use fabric_core::layout::{LayoutConstraints, StackLayoutEngine};
use fabric_core::mounting::TelemetryController;
use fabric_core::node::{Props, ShadowNode, SurfaceId, Tag};
use fabric_core::scheduler::{Scheduler, SchedulerConfig};
use fabric_core::time::{Clock, MonotonicClock};
use fabric_core::trace::{
    CommitEvent, PhaseBeginEvent, PhaseEndEvent, SurfaceEvent, TraceSink, Tracer,
    TransactionEvent, TransactionSummary,
};
use kurbo::Size;
use parking_lot::Mutex;
use serde_json::json;

use fabric_debug::pretty::PrettyPrintSink;
use fabric_debug::recorder::RecorderSink;
use fabric_debug::tree::describe_tree;

const SURFACE: SurfaceId = SurfaceId(1);
const COMMITS: u32 = 120;
const ITEMS: u32 = 24;
const FRAME: StdDuration = StdDuration::from_millis(4);

/// Records every event and optionally echoes it.
struct Fanout {
    recorder: RecorderSink,
    pretty: Option<PrettyPrintSink<std::io::Stderr>>,
}

macro_rules! fan_out {
    ($self:ident, $method:ident, $($arg:expr),+) => {{
        $self.recorder.$method($($arg),+);
        if let Some(pretty) = &mut $self.pretty {
            pretty.$method($($arg),+);
        }
    }};
}

impl TraceSink for Fanout {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        fan_out!(self, on_phase_begin, e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        fan_out!(self, on_phase_end, e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        fan_out!(self, on_commit, e);
    }

    fn on_transaction(&mut self, e: &TransactionEvent) {
        fan_out!(self, on_transaction, e);
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        fan_out!(self, on_surface, e);
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        fan_out!(self, on_transaction_summary, s);
    }

    fn on_mutations(&mut self, surface: SurfaceId, number: u64, mutations: &[Mutation]) {
        fan_out!(self, on_mutations, surface, number, mutations);
    }
}

/// Deterministic xorshift, so runs are reproducible.
struct Shuffle(u64);

impl Shuffle {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        let n = u64::try_from(n.max(1)).unwrap_or(u64::MAX);
        usize::try_from(self.next() % n).unwrap_or(0)
    }
}

fn run_commands(scheduler: &Scheduler, done: &AtomicBool) {
    let ui = scheduler.ui_manager();
    let items: Vec<Arc<ShadowNode>> = (0..ITEMS)
        .map(|i| {
            ui.create_node(
                Tag(100 + i),
                "View",
                SURFACE,
                Props::from(json!({ "height": 20 + (i % 3) * 10 })),
                None,
            )
            .expect("surface is running")
        })
        .collect();

    let mut rng = Shuffle(0x9e37_79b9_7f4a_7c15);
    let mut shown: Vec<Arc<ShadowNode>> = items[..ITEMS as usize / 2].to_vec();
    for step in 0..COMMITS {
        match rng.below(4) {
            0 if shown.len() > 1 => {
                let at = rng.below(shown.len());
                shown.remove(at);
            }
            1 => {
                let candidate = &items[rng.below(items.len())];
                if !shown.iter().any(|n| n.same_family(candidate)) {
                    let at = rng.below(shown.len() + 1);
                    shown.insert(at, Arc::clone(candidate));
                }
            }
            _ => {
                let (a, b) = (rng.below(shown.len()), rng.below(shown.len()));
                shown.swap(a, b);
            }
        }
        if let Err(error) = ui.complete_surface(SURFACE, shown.clone()) {
            log::warn!("step {step}: {error}");
        }
        if step % 10 == 9
            && let Some(first) = shown.first()
        {
            let props = Props::from(json!({ "opacity": f64::from(step) / f64::from(COMMITS) }));
            if let Err(error) = ui.set_native_props(first, &props) {
                log::warn!("step {step}: {error}");
            }
        }
        thread::sleep(FRAME / 3);
    }
    done.store(true, Ordering::Release);
}

fn run_mounting(
    mut controller: TelemetryController,
    mirror: &mut StubViewTree,
    done: &AtomicBool,
) -> u64 {
    let mut frames = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        if let Some(number) = controller.pull_aggregated_and_mount(mirror) {
            frames += 1;
            log::debug!("frame {frames}: mounted up to transaction {number}");
        } else if finished {
            return frames;
        }
        thread::sleep(FRAME);
    }
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");

    // -- tracing -----------------------------------------------------------
    let sink = Arc::new(Mutex::new(Fanout {
        recorder: RecorderSink::new(),
        pretty: verbose.then(PrettyPrintSink::stderr),
    }));
    let tracer = Tracer::new(Arc::clone(&sink) as _);

    // -- scheduler ---------------------------------------------------------
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let scheduler = Scheduler::new(
        SchedulerConfig::pull(),
        Some(Arc::new(StackLayoutEngine::default())),
        Arc::clone(&clock),
        tracer.clone(),
        None,
    );
    scheduler
        .start_surface(
            SURFACE,
            Props::from(json!({ "padding": 8 })),
            LayoutConstraints::fixed(Size::new(360.0, 640.0)),
        )
        .expect("fresh surface");
    let coordinator = scheduler
        .ui_manager()
        .mounting_coordinator(SURFACE)
        .expect("surface started");

    // -- threads -----------------------------------------------------------
    let done = AtomicBool::new(false);
    let mut mirror = StubViewTree::new();
    let frames = thread::scope(|s| {
        let mounting = s.spawn(|| {
            let controller = TelemetryController::new(coordinator, clock, tracer);
            run_mounting(controller, &mut mirror, &done)
        });
        run_commands(&scheduler, &done);
        mounting.join().expect("mounting thread panicked")
    });

    // -- verify ------------------------------------------------------------
    let tree = scheduler
        .ui_manager()
        .trees()
        .get(SURFACE)
        .expect("surface started");
    let root = tree.current_root();
    assert_eq!(
        mirror,
        StubViewTree::from_tree(&root),
        "mounted views diverged from the committed tree"
    );
    log::info!(
        "revision {} mounted in {frames} frames, {} coalesced",
        tree.revision_number(),
        tree.coordinator().coalesced_count()
    );
    print!("{}", describe_tree(&root));

    scheduler.stop_surface(SURFACE).expect("surface running");

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    fabric_debug::chrome::export(sink.lock().recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({COMMITS} commits, {frames} frames)");
}
