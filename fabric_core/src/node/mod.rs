// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow nodes, their families, and the values they carry.

mod family;
mod id;
mod props;
mod shadow_node;
mod state;

pub use family::{FamilyArena, FamilyFragment, NodeTraits, ShadowNodeFamily};
pub use id::{ComponentName, EventTarget, FamilyId, SurfaceId, Tag};
pub use props::Props;
pub use shadow_node::{ShadowNode, ShadowNodeBuilder, ShadowNodeFragment};
pub use state::State;
