// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable shadow trees, revision diffing, and mount transactions for
//! declarative UI surfaces.
//!
//! `fabric_core` keeps one immutable tree of shadow nodes per surface. Every
//! change is a commit that swaps in a new revision; the difference between
//! revisions becomes a numbered list of view mutations that a platform
//! consumer applies on its own thread.
//!
//! # Architecture
//!
//! ```text
//!   Command source
//!       │ create_node / clone_node / append_child / complete_surface
//!       ▼
//!   UiManager ──► ShadowTree::commit()
//!                    │ hooks ─► state reconciliation ─► layout ─► diff
//!                    ▼
//!               MountingTransaction (N+1)
//!                    │ push
//!                    ▼
//!   MountingCoordinator ──pull()──► TelemetryController ──► MountingConsumer
//! ```
//!
//! **[`node`]**: Sealed [`ShadowNode`](node::ShadowNode)s, the builder that
//! precedes sealing, families, props and native state.
//!
//! **[`layout`]**: The [`LayoutEngine`](layout::LayoutEngine) seam, layout
//! metrics, a simple stacking engine, and geometry queries.
//!
//! **[`diff`]**: Turns two revisions into an ordered mutation list, plus a
//! [`StubViewTree`](diff::StubViewTree) that mirrors a host hierarchy.
//!
//! **[`tree`]**: [`ShadowTree`](tree::ShadowTree) and its serialized commit
//! pipeline, commit hooks, and the per-surface registry.
//!
//! **[`mounting`]**: The transaction queue between the committing and
//! mounting threads, and per-phase telemetry.
//!
//! **[`uimanager`]**: Surface lifecycle and the node operations exposed to
//! the command source.
//!
//! **[`scheduler`]**: Wires a [`UiManager`](uimanager::UiManager) to a host
//! delegate in push or pull delivery.
//!
//! **[`time`]**: Host timestamps and clocks.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! commit and mount instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `trace-rich` (disabled by default, implies `trace`): Forwards every
//!   pushed mutation list to the sink.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod diff;
pub mod layout;
pub mod mounting;
pub mod node;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod tree;
pub mod uimanager;

#[cfg(test)]
mod testing;
