// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commit hooks.

use core::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::node::{ShadowNode, SurfaceId};

/// Observes, and may rewrite or cancel, every commit.
///
/// Hooks run on the committing thread while the surface's commit lock is
/// held, so they must not commit to the same surface.
pub trait CommitHook: Send + Sync {
    /// Called with the candidate root before layout and diffing.
    ///
    /// Returns the root to commit, or `None` to cancel the commit.
    fn will_commit(
        &self,
        surface: SurfaceId,
        old_root: &Arc<ShadowNode>,
        new_root: Arc<ShadowNode>,
    ) -> Option<Arc<ShadowNode>>;
}

/// The hooks shared by every tree of one UI manager.
#[derive(Default)]
pub struct CommitHookRegistry {
    hooks: RwLock<Vec<Arc<dyn CommitHook>>>,
}

impl CommitHookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `hook`. Hooks run in registration order.
    pub fn register(&self, hook: Arc<dyn CommitHook>) {
        self.hooks.write().push(hook);
    }

    /// Removes `hook`, returning whether it was registered.
    pub fn unregister(&self, hook: &Arc<dyn CommitHook>) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|h| !Arc::ptr_eq(h, hook));
        hooks.len() != before
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Returns `true` if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Runs every hook over `new_root`, stopping at the first cancel.
    pub(crate) fn apply(
        &self,
        surface: SurfaceId,
        old_root: &Arc<ShadowNode>,
        new_root: Arc<ShadowNode>,
    ) -> Option<Arc<ShadowNode>> {
        // Snapshot so hooks may (un)register hooks without deadlocking.
        let hooks = self.hooks.read().clone();
        hooks
            .iter()
            .try_fold(new_root, |root, hook| hook.will_commit(surface, old_root, root))
    }
}

impl fmt::Debug for CommitHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitHookRegistry")
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}
