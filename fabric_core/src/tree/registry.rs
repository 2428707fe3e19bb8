// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookup of live trees by surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::shadow_tree::ShadowTree;
use crate::node::SurfaceId;

/// Maps surfaces to their trees.
#[derive(Debug, Default)]
pub struct ShadowTreeRegistry {
    trees: RwLock<BTreeMap<SurfaceId, Arc<ShadowTree>>>,
}

impl ShadowTreeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tree` under its surface id.
    ///
    /// # Panics
    ///
    /// Panics if a tree is already registered for that surface.
    pub fn add(&self, tree: Arc<ShadowTree>) {
        let surface = tree.surface_id();
        let previous = self.trees.write().insert(surface, tree);
        assert!(previous.is_none(), "{surface} registered twice");
    }

    /// Removes and returns the tree of `surface`.
    pub fn remove(&self, surface: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.write().remove(&surface)
    }

    /// Returns the tree of `surface`.
    #[must_use]
    pub fn get(&self, surface: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.read().get(&surface).cloned()
    }

    /// Calls `f` with the tree of `surface`, if registered.
    ///
    /// The registry stays read-locked during `f`; use [`get`](Self::get) to
    /// commit.
    pub fn visit<R>(&self, surface: SurfaceId, f: impl FnOnce(&ShadowTree) -> R) -> Option<R> {
        self.trees.read().get(&surface).map(|tree| f(tree))
    }

    /// Calls `f` for every tree in surface order.
    pub fn enumerate(&self, mut f: impl FnMut(&ShadowTree)) {
        for tree in self.trees.read().values() {
            f(tree);
        }
    }

    /// Returns the registered surfaces in order.
    #[must_use]
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        self.trees.read().keys().copied().collect()
    }

    /// Returns the number of registered trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.read().len()
    }

    /// Returns `true` if no trees are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.read().is_empty()
    }
}
