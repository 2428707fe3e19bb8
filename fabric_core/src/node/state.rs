// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque, revision-stamped component state.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// Opaque state payload attached to a node.
///
/// The core never inspects the payload. Each new state for a family receives
/// a revision one higher than the family's previous one (see
/// [`ShadowNodeFamily::next_state`](super::ShadowNodeFamily::next_state)), so
/// the newer of two states is always identifiable without looking inside.
#[derive(Clone)]
pub struct State {
    revision: u64,
    data: Arc<dyn Any + Send + Sync>,
}

impl State {
    pub(crate) fn new(revision: u64, data: Arc<dyn Any + Send + Sync>) -> Self {
        Self { revision, data }
    }

    /// Returns the revision stamp.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the payload.
    #[must_use]
    pub fn data(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.data
    }

    /// Downcasts the payload.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Returns `true` if `self` was issued after `other`.
    #[inline]
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.revision > other.revision
    }
}

/// States are equal when they carry the same revision of the same payload.
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision && Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
