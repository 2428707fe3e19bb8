// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout metrics, the engine seam, and geometry queries.
//!
//! The production layout algorithm lives outside this crate behind
//! [`LayoutEngine`]. [`StackLayoutEngine`] is a small vertical stacker for
//! tests and demos.

mod engine;
mod metrics;
mod query;
mod stack;

pub use engine::{LayoutEngine, LayoutResults, apply_layout};
pub use metrics::{DisplayType, LayoutConstraints, LayoutDirection, LayoutMetrics};
pub use query::{find_node_at_point, relative_layout_metrics};
pub use stack::StackLayoutEngine;
