// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Mutation lists ([`on_mutations`](TraceSink::on_mutations)) are stored as
//! per-kind counts only.

use fabric_core::diff::{Mutation, MutationKind};
use fabric_core::node::SurfaceId;
use fabric_core::time::HostTime;
use fabric_core::trace::{
    CommitEvent, CommitStatus, PhaseBeginEvent, PhaseEndEvent, PhaseKind, SurfaceEvent,
    TraceSink, TransactionEvent, TransactionOp, TransactionSummary,
};
use fabric_core::uimanager::SurfaceStatus;

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_COMMIT: u8 = 3;
const TAG_TRANSACTION: u8 = 4;
const TAG_SURFACE: u8 = 5;
const TAG_SUMMARY: u8 = 6;
const TAG_MUTATIONS: u8 = 7;

const KINDS: [MutationKind; 6] = [
    MutationKind::Create,
    MutationKind::Delete,
    MutationKind::Insert,
    MutationKind::Remove,
    MutationKind::Update,
    MutationKind::UpdateState,
];

/// Mutation counts of one pushed transaction, by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationCounts {
    /// `Create` instructions.
    pub create: u32,
    /// `Delete` instructions.
    pub delete: u32,
    /// `Insert` instructions.
    pub insert: u32,
    /// `Remove` instructions.
    pub remove: u32,
    /// `Update` instructions.
    pub update: u32,
    /// `UpdateState` instructions.
    pub update_state: u32,
}

impl MutationCounts {
    /// Counts `mutations` by kind.
    #[must_use]
    pub fn of(mutations: &[Mutation]) -> Self {
        let mut counts = Self::default();
        for m in mutations {
            let slot = counts.slot_mut(m.kind());
            *slot = slot.saturating_add(1);
        }
        counts
    }

    /// Returns the sum over all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        KINDS.iter().map(|&k| u64::from(self.get(k))).sum()
    }

    /// Returns the count for `kind`.
    #[must_use]
    pub fn get(&self, kind: MutationKind) -> u32 {
        match kind {
            MutationKind::Create => self.create,
            MutationKind::Delete => self.delete,
            MutationKind::Insert => self.insert,
            MutationKind::Remove => self.remove,
            MutationKind::Update => self.update,
            MutationKind::UpdateState => self.update_state,
        }
    }

    fn slot_mut(&mut self, kind: MutationKind) -> &mut u32 {
        match kind {
            MutationKind::Create => &mut self.create,
            MutationKind::Delete => &mut self.delete,
            MutationKind::Insert => &mut self.insert,
            MutationKind::Remove => &mut self.remove,
            MutationKind::Update => &mut self.update,
            MutationKind::UpdateState => &mut self.update_state,
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Commit => 0,
            PhaseKind::Layout => 1,
            PhaseKind::Diff => 2,
            PhaseKind::Mount => 3,
        });
    }

    fn write_phase_event(&mut self, surface: SurfaceId, revision: u64, phase: PhaseKind, at: HostTime) {
        self.write_u32(surface.0);
        self.write_u64(revision);
        self.write_phase(phase);
        self.write_u64(at.nanos());
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_phase_event(e.surface, e.revision, e.phase, e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_phase_event(e.surface, e.revision, e.phase, e.timestamp);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u32(e.surface.0);
        self.write_u64(e.revision);
        self.write_u8(match e.status {
            CommitStatus::Committed => 0,
            CommitStatus::Skipped => 1,
            CommitStatus::Failed => 2,
        });
        self.write_u64(e.timestamp.nanos());
    }

    fn on_transaction(&mut self, e: &TransactionEvent) {
        self.write_u8(TAG_TRANSACTION);
        self.write_u32(e.surface.0);
        self.write_u64(e.number);
        self.write_u8(match e.op {
            TransactionOp::Pushed => 0,
            TransactionOp::Pulled => 1,
            TransactionOp::Coalesced => 2,
        });
        self.write_usize(e.mutation_count);
        self.write_usize(e.pending);
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        self.write_u8(TAG_SURFACE);
        self.write_u32(e.surface.0);
        self.write_u8(match e.status {
            SurfaceStatus::NotStarted => 0,
            SurfaceStatus::Running => 1,
            SurfaceStatus::Stopped => 2,
        });
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        self.write_u8(TAG_SUMMARY);
        self.write_u32(s.surface.0);
        self.write_u64(s.number);
        self.write_usize(s.mutation_count);
        self.write_u32(s.merged_count);
        self.write_u64(s.commit_nanos);
        self.write_u64(s.layout_nanos);
        self.write_u64(s.diff_nanos);
        self.write_u64(s.mount_nanos);
    }

    fn on_mutations(&mut self, surface: SurfaceId, number: u64, mutations: &[Mutation]) {
        let counts = MutationCounts::of(mutations);
        self.write_u8(TAG_MUTATIONS);
        self.write_u32(surface.0);
        self.write_u64(number);
        for kind in KINDS {
            self.write_u32(counts.get(kind));
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`TransactionEvent`].
    Transaction(TransactionEvent),
    /// A [`SurfaceEvent`].
    Surface(SurfaceEvent),
    /// A [`TransactionSummary`].
    Summary(TransactionSummary),
    /// Mutation counts of a pushed transaction.
    Mutations {
        /// Owning surface.
        surface: SurfaceId,
        /// Transaction number.
        number: u64,
        /// Counts by kind.
        counts: MutationCounts,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(N)?)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_usize(&mut self) -> Option<usize> {
        self.read_u64().map(|v| usize::try_from(v).unwrap_or(usize::MAX))
    }

    fn read_surface(&mut self) -> Option<SurfaceId> {
        self.read_u32().map(SurfaceId)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Commit,
            1 => PhaseKind::Layout,
            2 => PhaseKind::Diff,
            _ => PhaseKind::Mount,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            surface: self.read_surface()?,
            revision: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            surface: self.read_surface()?,
            revision: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            surface: self.read_surface()?,
            revision: self.read_u64()?,
            status: match self.read_u8()? {
                0 => CommitStatus::Committed,
                1 => CommitStatus::Skipped,
                _ => CommitStatus::Failed,
            },
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_transaction(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Transaction(TransactionEvent {
            surface: self.read_surface()?,
            number: self.read_u64()?,
            op: match self.read_u8()? {
                0 => TransactionOp::Pushed,
                1 => TransactionOp::Pulled,
                _ => TransactionOp::Coalesced,
            },
            mutation_count: self.read_usize()?,
            pending: self.read_usize()?,
        }))
    }

    fn decode_surface(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Surface(SurfaceEvent {
            surface: self.read_surface()?,
            status: match self.read_u8()? {
                0 => SurfaceStatus::NotStarted,
                1 => SurfaceStatus::Running,
                _ => SurfaceStatus::Stopped,
            },
        }))
    }

    fn decode_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Summary(TransactionSummary {
            surface: self.read_surface()?,
            number: self.read_u64()?,
            mutation_count: self.read_usize()?,
            merged_count: self.read_u32()?,
            commit_nanos: self.read_u64()?,
            layout_nanos: self.read_u64()?,
            diff_nanos: self.read_u64()?,
            mount_nanos: self.read_u64()?,
        }))
    }

    fn decode_mutations(&mut self) -> Option<RecordedEvent> {
        let surface = self.read_surface()?;
        let number = self.read_u64()?;
        let counts = MutationCounts {
            create: self.read_u32()?,
            delete: self.read_u32()?,
            insert: self.read_u32()?,
            remove: self.read_u32()?,
            update: self.read_u32()?,
            update_state: self.read_u32()?,
        };
        Some(RecordedEvent::Mutations {
            surface,
            number,
            counts,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMIT => self.decode_commit(),
            TAG_TRANSACTION => self.decode_transaction(),
            TAG_SURFACE => self.decode_surface(),
            TAG_SUMMARY => self.decode_summary(),
            TAG_MUTATIONS => self.decode_mutations(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const S: SurfaceId = SurfaceId(3);

    fn sample_summary() -> TransactionSummary {
        TransactionSummary {
            surface: S,
            number: 12,
            mutation_count: 9,
            merged_count: 2,
            commit_nanos: 1_000,
            layout_nanos: 4_000,
            diff_nanos: 1_500,
            mount_nanos: 700,
        }
    }

    #[test]
    fn phase_events_keep_order_and_fields() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            surface: S,
            revision: 4,
            phase: PhaseKind::Layout,
            timestamp: HostTime(2_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            surface: S,
            revision: 4,
            phase: PhaseKind::Layout,
            timestamp: HostTime(3_000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2, "both events decode");
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.surface, S, "surface survives");
                assert_eq!(e.revision, 4, "revision survives");
                assert_eq!(e.phase, PhaseKind::Layout, "phase survives");
                assert_eq!(e.timestamp, HostTime(2_000), "timestamp survives");
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        assert!(
            matches!(&events[1], RecordedEvent::PhaseEnd(e) if e.timestamp == HostTime(3_000)),
            "end follows begin"
        );
    }

    #[test]
    fn commit_and_lifecycle_events() {
        let mut rec = RecorderSink::new();
        rec.on_surface(&SurfaceEvent {
            surface: S,
            status: SurfaceStatus::Running,
        });
        rec.on_commit(&CommitEvent {
            surface: S,
            revision: 1,
            status: CommitStatus::Skipped,
            timestamp: HostTime(50),
        });
        rec.on_transaction(&TransactionEvent {
            surface: S,
            number: 1,
            op: TransactionOp::Coalesced,
            mutation_count: 3,
            pending: 64,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(
            matches!(&events[0], RecordedEvent::Surface(e) if e.status == SurfaceStatus::Running),
            "surface status decodes"
        );
        assert!(
            matches!(&events[1], RecordedEvent::Commit(e) if e.status == CommitStatus::Skipped),
            "commit status decodes"
        );
        match &events[2] {
            RecordedEvent::Transaction(e) => {
                assert_eq!(e.op, TransactionOp::Coalesced, "op decodes");
                assert_eq!((e.mutation_count, e.pending), (3, 64), "counts decode");
            }
            other => panic!("expected Transaction, got {other:?}"),
        }
    }

    #[test]
    fn summary_decodes_exactly() {
        let mut rec = RecorderSink::new();
        rec.on_transaction_summary(&sample_summary());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(
            matches!(&events[..], [RecordedEvent::Summary(s)] if *s == sample_summary()),
            "summary survives unchanged"
        );
    }

    #[test]
    fn mutations_are_recorded_as_counts() {
        let mut rec = RecorderSink::new();
        rec.on_mutations(S, 7, &[]);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::Mutations { surface, number, counts }] => {
                assert_eq!((*surface, *number), (S, 7), "header decodes");
                assert_eq!(counts.total(), 0, "no mutations counted");
            }
            other => panic!("expected Mutations, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_transaction_summary(&sample_summary());
        rec.on_transaction_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1, "only the complete record decodes");
        assert_eq!(decode(&[]).count(), 0, "empty buffer decodes to nothing");
    }
}
