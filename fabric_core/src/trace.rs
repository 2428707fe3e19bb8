// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the commit and mount pipeline.
//!
//! [`TraceSink`] has one method per event, each defaulting to a no-op, so a
//! sink only overrides what it records.
//!
//! [`Tracer`] is a cheap, clonable handle to an optional shared sink. Commits
//! and mounts run on different threads, so the sink sits behind a
//! [`parking_lot::Mutex`]. When the `trace` feature is **off**, every
//! `Tracer` method compiles to nothing. When **on**, each method performs one
//! `Option` branch and, if a sink is installed, one lock.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`) adds [`TraceSink::on_mutations`], which
//!   receives every mutation list as it is pushed.

use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "trace-rich")]
use crate::diff::Mutation;
use crate::mounting::MountingTransaction;
use crate::node::SurfaceId;
use crate::time::HostTime;
use crate::uimanager::SurfaceStatus;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the pipeline is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Running the transaction function and commit hooks.
    Commit,
    /// Layout of the candidate root.
    Layout,
    /// Diffing the old and new revisions.
    Diff,
    /// Applying a transaction to a mounting consumer.
    Mount,
}

/// How a commit attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitStatus {
    /// A new revision was swapped in.
    Committed,
    /// The transaction function or a hook declined to produce a root.
    Skipped,
    /// The commit failed and the tree kept its last revision.
    Failed,
}

/// What happened to a transaction in a coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionOp {
    /// Queued after a commit.
    Pushed,
    /// Handed to a consumer.
    Pulled,
    /// Folded into its successor because the queue was full.
    Coalesced,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Surface being worked on.
    pub surface: SurfaceId,
    /// Revision the phase produces or mounts.
    pub revision: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Surface being worked on.
    pub surface: SurfaceId,
    /// Revision the phase produced or mounted.
    pub revision: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted once per commit attempt.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Surface committed to.
    pub surface: SurfaceId,
    /// The new revision, or the unchanged current one when not committed.
    pub revision: u64,
    /// How the attempt ended.
    pub status: CommitStatus,
    /// Host time when the attempt finished.
    pub timestamp: HostTime,
}

/// Emitted when a coordinator queues, delivers, or coalesces a transaction.
#[derive(Clone, Copy, Debug)]
pub struct TransactionEvent {
    /// Owning surface.
    pub surface: SurfaceId,
    /// Transaction number.
    pub number: u64,
    /// What happened.
    pub op: TransactionOp,
    /// Number of mutations carried.
    pub mutation_count: usize,
    /// Transactions still waiting after the operation.
    pub pending: usize,
}

/// Emitted on every surface lifecycle transition.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceEvent {
    /// Surface whose status changed.
    pub surface: SurfaceId,
    /// The new status.
    pub status: SurfaceStatus,
}

/// Per-transaction timing summary, emitted after a mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Owning surface.
    pub surface: SurfaceId,
    /// Transaction number.
    pub number: u64,
    /// Number of mutations applied.
    pub mutation_count: usize,
    /// How many pushed transactions were folded into this one.
    pub merged_count: u32,
    /// Commit phase duration in nanoseconds (0 if not measured).
    pub commit_nanos: u64,
    /// Layout phase duration in nanoseconds (0 if not measured).
    pub layout_nanos: u64,
    /// Diff phase duration in nanoseconds (0 if not measured).
    pub diff_nanos: u64,
    /// Mount phase duration in nanoseconds (0 if not measured).
    pub mount_nanos: u64,
}

impl TransactionSummary {
    /// Summarises a mounted transaction.
    #[must_use]
    pub fn new(tx: &MountingTransaction) -> Self {
        let t = tx.telemetry();
        let nanos = |d: Option<crate::time::Duration>| d.map_or(0, crate::time::Duration::nanos);
        Self {
            surface: tx.surface_id(),
            number: tx.number(),
            mutation_count: tx.mutations().len(),
            merged_count: tx.merged_count(),
            commit_nanos: nanos(t.commit_duration()),
            layout_nanos: nanos(t.layout_duration()),
            diff_nanos: nanos(t.diff_duration()),
            mount_nanos: nanos(t.mount_duration()),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pipeline.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called at the beginning of a pipeline phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pipeline phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called once per commit attempt.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a transaction is queued, delivered, or coalesced.
    fn on_transaction(&mut self, e: &TransactionEvent) {
        _ = e;
    }

    /// Called on surface lifecycle transitions.
    fn on_surface(&mut self, e: &SurfaceEvent) {
        _ = e;
    }

    /// Called with a per-transaction timing summary after a mount.
    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        _ = s;
    }

    /// Called with the mutations of each pushed transaction (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_mutations(&mut self, surface: SurfaceId, number: u64, mutations: &[Mutation]) {
        _ = (surface, number, mutations);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// A sink shared between the threads that emit events.
pub type SharedSink = Arc<Mutex<dyn TraceSink + Send>>;

/// Clonable handle to an optional shared [`TraceSink`].
#[derive(Clone, Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<SharedSink>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: SharedSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionEvent`].
    #[inline]
    pub fn transaction(&self, e: &TransactionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_transaction(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceEvent`].
    #[inline]
    pub fn surface(&self, e: &SurfaceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_surface(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionSummary`].
    #[inline]
    pub fn transaction_summary(&self, summary: &TransactionSummary) {
        #[cfg(feature = "trace")]
        if let Some(s) = &self.sink {
            s.lock().on_transaction_summary(summary);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = summary;
        }
    }

    /// Emits a transaction's mutations (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn mutations(&self, surface: SurfaceId, number: u64, mutations: &[Mutation]) {
        if let Some(s) = &self.sink {
            s.lock().on_mutations(surface, number, mutations);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mounting::TransactionTelemetry;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_commit(&CommitEvent {
            surface: SurfaceId(1),
            revision: 1,
            status: CommitStatus::Committed,
            timestamp: HostTime(0),
        });
        sink.on_surface(&SurfaceEvent {
            surface: SurfaceId(1),
            status: SurfaceStatus::Running,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let tracer = Tracer::none();
        assert!(!tracer.is_enabled());
        tracer.phase_begin(&PhaseBeginEvent {
            surface: SurfaceId(1),
            revision: 0,
            phase: PhaseKind::Commit,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn summary_uses_measured_phases() {
        let telemetry = TransactionTelemetry {
            commit_start: Some(HostTime(1_000)),
            commit_end: Some(HostTime(1_400)),
            diff_start: Some(HostTime(1_400)),
            diff_end: Some(HostTime(1_450)),
            ..TransactionTelemetry::default()
        };
        let tx = MountingTransaction::new(SurfaceId(3), 7, Vec::new(), telemetry);
        let summary = TransactionSummary::new(&tx);
        assert_eq!(summary.surface, SurfaceId(3));
        assert_eq!(summary.number, 7);
        assert_eq!(summary.commit_nanos, 400);
        assert_eq!(summary.diff_nanos, 50);
        assert_eq!(summary.layout_nanos, 0);
        assert_eq!(summary.mount_nanos, 0);
        assert_eq!(summary.merged_count, 1);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        #[derive(Default)]
        struct RecordingSink {
            commits: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_commit(&mut self, e: &CommitEvent) {
                self.commits.push(e.revision);
            }
        }

        let sink = Arc::new(Mutex::new(RecordingSink::default()));
        let tracer = Tracer::new(sink.clone());
        let clone = tracer.clone();
        for revision in [1, 2] {
            clone.commit(&CommitEvent {
                surface: SurfaceId(1),
                revision,
                status: CommitStatus::Committed,
                timestamp: HostTime(revision),
            });
        }
        assert!(tracer.is_enabled());
        assert_eq!(sink.lock().commits, &[1, 2]);
    }
}
