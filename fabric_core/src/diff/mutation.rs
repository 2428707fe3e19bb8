// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mount instructions.

use core::fmt;
use std::sync::Arc;

use crate::node::{ShadowNode, State, Tag};

/// One instruction for a mounting consumer.
///
/// Node payloads are shared handles, so an in-flight transaction keeps the
/// nodes it references alive after newer revisions replace them.
#[derive(Clone, Debug)]
pub enum Mutation {
    /// Create a detached view for `node`.
    Create {
        /// The node to materialize.
        node: Arc<ShadowNode>,
    },
    /// Destroy a detached view with no children.
    Delete {
        /// The last revision of the node being destroyed.
        node: Arc<ShadowNode>,
    },
    /// Attach `node` to `parent_tag` at `index`.
    Insert {
        /// Parent view.
        parent_tag: Tag,
        /// The child, in its new revision.
        node: Arc<ShadowNode>,
        /// Position among the parent's children after insertion.
        index: usize,
    },
    /// Detach `child_tag` from `parent_tag` at `index`.
    Remove {
        /// Parent view.
        parent_tag: Tag,
        /// Child view.
        child_tag: Tag,
        /// Position among the parent's children before removal.
        index: usize,
    },
    /// Props or layout of a view changed.
    Update {
        /// Previous revision.
        old: Arc<ShadowNode>,
        /// New revision.
        new: Arc<ShadowNode>,
    },
    /// Only the state of a view changed.
    UpdateState {
        /// New revision of the node.
        node: Arc<ShadowNode>,
        /// The state it now carries.
        state: State,
    },
}

/// Discriminant of a [`Mutation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    /// [`Mutation::Create`].
    Create,
    /// [`Mutation::Delete`].
    Delete,
    /// [`Mutation::Insert`].
    Insert,
    /// [`Mutation::Remove`].
    Remove,
    /// [`Mutation::Update`].
    Update,
    /// [`Mutation::UpdateState`].
    UpdateState,
}

impl MutationKind {
    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::UpdateState => "update-state",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Mutation {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Delete { .. } => MutationKind::Delete,
            Self::Insert { .. } => MutationKind::Insert,
            Self::Remove { .. } => MutationKind::Remove,
            Self::Update { .. } => MutationKind::Update,
            Self::UpdateState { .. } => MutationKind::UpdateState,
        }
    }

    /// Returns the tag of the view the instruction acts on.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Create { node }
            | Self::Delete { node }
            | Self::Insert { node, .. }
            | Self::UpdateState { node, .. } => node.tag(),
            Self::Remove { child_tag, .. } => *child_tag,
            Self::Update { new, .. } => new.tag(),
        }
    }

    /// Returns the parent tag for `Insert` and `Remove`.
    #[must_use]
    pub fn parent_tag(&self) -> Option<Tag> {
        match self {
            Self::Insert { parent_tag, .. } | Self::Remove { parent_tag, .. } => Some(*parent_tag),
            _ => None,
        }
    }

    /// Returns the child index for `Insert` and `Remove`.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Insert { index, .. } | Self::Remove { index, .. } => Some(*index),
            _ => None,
        }
    }
}
