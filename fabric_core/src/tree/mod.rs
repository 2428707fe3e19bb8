// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface trees and the commit pipeline.

mod hooks;
mod registry;
mod shadow_tree;

pub use hooks::{CommitHook, CommitHookRegistry};
pub use registry::ShadowTreeRegistry;
pub use shadow_tree::{
    CommitEnvironment, CommitError, CommitOptions, CommitOutcome, ShadowTree, ShadowTreeDelegate,
    ShadowTreeRevision,
};
