// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, tree dumps, and Chrome trace export for
//! fabric diagnostics.
//!
//! This crate provides [`TraceSink`](fabric_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from
//!   recorded bytes.
//!
//! [`tree`] renders shadow trees and mutation lists as text.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod tree;
