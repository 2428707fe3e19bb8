// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each surface is a process. Commit, layout, and diff phases nest on the
//! committing track (`tid` 0); mount phases go on the mounting track
//! (`tid` 1).
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use fabric_core::time::HostTime;
use fabric_core::trace::PhaseKind;

use crate::recorder::{RecordedEvent, decode};

const COMMIT_TRACK: u32 = 0;
const MOUNT_TRACK: u32 = 1;

fn track(phase: PhaseKind) -> u32 {
    match phase {
        PhaseKind::Mount => MOUNT_TRACK,
        PhaseKind::Commit | PhaseKind::Layout | PhaseKind::Diff => COMMIT_TRACK,
    }
}

fn us(t: HostTime) -> f64 {
    t.micros_f64()
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Events that carry no timestamp of their own are placed at the most recent
/// timestamp seen before them.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut now = HostTime(0);

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                now = e.timestamp;
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Pipeline",
                    "ts": us(e.timestamp),
                    "pid": e.surface.0,
                    "tid": track(e.phase),
                    "args": { "revision": e.revision },
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                now = e.timestamp;
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Pipeline",
                    "ts": us(e.timestamp),
                    "pid": e.surface.0,
                    "tid": track(e.phase),
                    "args": { "revision": e.revision },
                }));
            }
            RecordedEvent::Commit(e) => {
                now = e.timestamp;
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Tree",
                    "ts": us(e.timestamp),
                    "pid": e.surface.0,
                    "tid": COMMIT_TRACK,
                    "s": "t",
                    "args": {
                        "revision": e.revision,
                        "status": format!("{:?}", e.status),
                    },
                }));
            }
            RecordedEvent::Transaction(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.op),
                    "cat": "Mounting",
                    "ts": us(now),
                    "pid": e.surface.0,
                    "tid": MOUNT_TRACK,
                    "s": "t",
                    "args": {
                        "number": e.number,
                        "mutations": e.mutation_count,
                    },
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "pending",
                    "ts": us(now),
                    "pid": e.surface.0,
                    "args": { "pending": e.pending },
                }));
            }
            RecordedEvent::Surface(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.status),
                    "cat": "Surface",
                    "ts": us(now),
                    "pid": e.surface.0,
                    "tid": COMMIT_TRACK,
                    "s": "p",
                }));
            }
            RecordedEvent::Summary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TransactionSummary",
                    "cat": "Summary",
                    "ts": us(now),
                    "pid": s.surface.0,
                    "tid": MOUNT_TRACK,
                    "s": "t",
                    "args": {
                        "number": s.number,
                        "mutations": s.mutation_count,
                        "merged": s.merged_count,
                        "commit_us": us(HostTime(s.commit_nanos)),
                        "layout_us": us(HostTime(s.layout_nanos)),
                        "diff_us": us(HostTime(s.diff_nanos)),
                        "mount_us": us(HostTime(s.mount_nanos)),
                    },
                }));
            }
            RecordedEvent::Mutations {
                surface,
                number,
                counts,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Mutations",
                    "cat": "Rich",
                    "ts": us(now),
                    "pid": surface.0,
                    "tid": COMMIT_TRACK,
                    "s": "t",
                    "args": {
                        "number": number,
                        "create": counts.create,
                        "delete": counts.delete,
                        "insert": counts.insert,
                        "remove": counts.remove,
                        "update": counts.update,
                        "update_state": counts.update_state,
                    },
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use fabric_core::node::SurfaceId;
    use fabric_core::trace::{
        PhaseBeginEvent, PhaseEndEvent, TraceSink, TransactionEvent, TransactionOp,
    };

    use super::*;
    use crate::recorder::RecorderSink;

    fn exported(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn phases_become_duration_events_on_their_track() {
        let mut rec = RecorderSink::new();
        for (phase, begin, end) in [
            (PhaseKind::Diff, 1_000, 1_500),
            (PhaseKind::Mount, 2_000, 2_250),
        ] {
            rec.on_phase_begin(&PhaseBeginEvent {
                surface: SurfaceId(2),
                revision: 1,
                phase,
                timestamp: HostTime(begin),
            });
            rec.on_phase_end(&PhaseEndEvent {
                surface: SurfaceId(2),
                revision: 1,
                phase,
                timestamp: HostTime(end),
            });
        }

        let parsed = exported(&rec);
        assert_eq!(parsed.len(), 4, "one event per record");
        assert_eq!(parsed[0]["ph"], "B", "begin first");
        assert_eq!(parsed[0]["name"], "Diff", "named after the phase");
        assert_eq!(parsed[1]["ts"], 1.5, "microseconds");
        assert_eq!(parsed[2]["tid"], MOUNT_TRACK, "mount on its own track");
        assert_eq!(parsed[3]["pid"], 2, "surface is the process");
    }

    #[test]
    fn transactions_add_pending_counter() {
        let mut rec = RecorderSink::new();
        rec.on_phase_end(&PhaseEndEvent {
            surface: SurfaceId(1),
            revision: 3,
            phase: PhaseKind::Commit,
            timestamp: HostTime(9_000),
        });
        rec.on_transaction(&TransactionEvent {
            surface: SurfaceId(1),
            number: 3,
            op: TransactionOp::Pushed,
            mutation_count: 5,
            pending: 2,
        });

        let parsed = exported(&rec);
        assert_eq!(parsed.len(), 3, "end, instant, counter");
        assert_eq!(parsed[1]["name"], "Pushed", "op is the name");
        assert_eq!(parsed[1]["ts"], 9.0, "placed at the last timestamp");
        assert_eq!(parsed[2]["ph"], "C", "counter event");
        assert_eq!(parsed[2]["args"]["pending"], 2, "queue depth recorded");
    }

    #[test]
    fn export_empty_recording() {
        let parsed = exported(&RecorderSink::new());
        assert!(parsed.is_empty(), "no events in, no events out");
    }
}
