// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable, one-line-per-event trace output.

use std::io::Write;

use fabric_core::diff::Mutation;
use fabric_core::node::SurfaceId;
use fabric_core::trace::{
    CommitEvent, PhaseBeginEvent, PhaseEndEvent, SurfaceEvent, TraceSink, TransactionEvent,
    TransactionSummary,
};

use crate::recorder::MutationCounts;

/// A [`TraceSink`] that writes one line per event.
///
/// Write errors are ignored; tracing never fails the pipeline.
#[derive(Debug)]
pub struct PrettyPrintSink<W> {
    out: W,
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl PrettyPrintSink<std::io::Stderr> {
    /// Creates a sink writing to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.out,
            "[{}] r{} {:?} begin @{:.3}us",
            e.surface,
            e.revision,
            e.phase,
            e.timestamp.micros_f64()
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.out,
            "[{}] r{} {:?} end @{:.3}us",
            e.surface,
            e.revision,
            e.phase,
            e.timestamp.micros_f64()
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.out,
            "[{}] commit r{} {:?}",
            e.surface, e.revision, e.status
        );
    }

    fn on_transaction(&mut self, e: &TransactionEvent) {
        let _ = writeln!(
            self.out,
            "[{}] tx {} {:?} mutations={} pending={}",
            e.surface, e.number, e.op, e.mutation_count, e.pending
        );
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        let _ = writeln!(self.out, "[{}] {}", e.surface, e.status);
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        let _ = writeln!(
            self.out,
            "[{}] tx {} mounted: {} mutations, merged {}, commit {}ns layout {}ns diff {}ns mount {}ns",
            s.surface,
            s.number,
            s.mutation_count,
            s.merged_count,
            s.commit_nanos,
            s.layout_nanos,
            s.diff_nanos,
            s.mount_nanos
        );
    }

    fn on_mutations(&mut self, surface: SurfaceId, number: u64, mutations: &[Mutation]) {
        let c = MutationCounts::of(mutations);
        let _ = writeln!(
            self.out,
            "[{surface}] tx {number} +{} -{} ins={} rem={} upd={} state={}",
            c.create, c.delete, c.insert, c.remove, c.update, c.update_state
        );
    }
}
