// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diffing revisions into mount instructions.

mod differ;
mod mutation;
mod stub;

pub use differ::diff;
pub use mutation::{Mutation, MutationKind};
pub use stub::{StubView, StubViewTree};
