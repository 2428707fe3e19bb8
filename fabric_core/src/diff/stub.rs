// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory view tree that mirrors what a platform consumer would build.

use std::collections::BTreeMap;
use std::sync::Arc;

use kurbo::Rect;

use super::mutation::Mutation;
use crate::mounting::{MountingConsumer, MountingTransaction};
use crate::node::{ComponentName, NodeTraits, Props, ShadowNode, Tag};

/// One mirrored host view.
#[derive(Clone, Debug, PartialEq)]
pub struct StubView {
    /// View tag.
    pub tag: Tag,
    /// Component the view renders.
    pub component_name: ComponentName,
    /// Last applied props.
    pub props: Props,
    /// Revision of the last applied state.
    pub state_revision: Option<u64>,
    /// Last applied frame.
    pub frame: Rect,
    /// Parent view, if attached.
    pub parent: Option<Tag>,
    /// Child views in order.
    pub children: Vec<Tag>,
}

impl StubView {
    fn new(node: &ShadowNode) -> Self {
        Self {
            tag: node.tag(),
            component_name: node.component_name().clone(),
            props: node.props().clone(),
            state_revision: node.state().map(|s| s.revision()),
            frame: node.layout_metrics().frame,
            parent: None,
            children: Vec::new(),
        }
    }

    fn update(&mut self, node: &ShadowNode) {
        self.props = node.props().clone();
        self.state_revision = node.state().map(|s| s.revision());
        self.frame = node.layout_metrics().frame;
    }
}

/// A tag-keyed mirror of a host view hierarchy.
///
/// Every instruction's preconditions are asserted, so applying an invalid
/// or misordered mutation list panics at the offending instruction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StubViewTree {
    root: Option<Tag>,
    views: BTreeMap<Tag, StubView>,
}

impl StubViewTree {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mirror a consumer would hold after mounting `root`.
    #[must_use]
    pub fn from_tree(root: &Arc<ShadowNode>) -> Self {
        let mut tree = Self::new();
        tree.root = Some(root.tag());
        tree.mirror(root, None);
        tree
    }

    fn mirror(&mut self, node: &ShadowNode, parent: Option<Tag>) {
        let mut view = StubView::new(node);
        view.parent = parent;
        view.children = node.children().iter().map(|c| c.tag()).collect();
        let previous = self.views.insert(node.tag(), view);
        assert!(previous.is_none(), "tag {} appears twice in the tree", node.tag());
        for child in node.children() {
            self.mirror(child, Some(node.tag()));
        }
    }

    /// Returns the root view's tag, once created.
    #[must_use]
    pub fn root_tag(&self) -> Option<Tag> {
        self.root
    }

    /// Returns the view for `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&StubView> {
        self.views.get(&tag)
    }

    /// Iterates over all views in tag order.
    pub fn views(&self) -> impl Iterator<Item = &StubView> {
        self.views.values()
    }

    /// Returns the number of live views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if no views exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Applies `mutations` in order.
    ///
    /// # Panics
    ///
    /// Panics if any instruction's precondition does not hold.
    pub fn apply_mutations(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            self.apply_one(mutation);
        }
    }

    fn view_mut(&mut self, tag: Tag) -> &mut StubView {
        self.views
            .get_mut(&tag)
            .unwrap_or_else(|| panic!("view {tag} does not exist"))
    }

    fn apply_one(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Create { node } => {
                let tag = node.tag();
                assert!(!self.views.contains_key(&tag), "create of existing view {tag}");
                self.views.insert(tag, StubView::new(node));
                if node.traits().contains(NodeTraits::ROOT_NODE_KIND) {
                    self.root = Some(tag);
                }
            }
            Mutation::Delete { node } => {
                let tag = node.tag();
                let view = self.view_mut(tag);
                assert!(view.parent.is_none(), "delete of attached view {tag}");
                assert!(view.children.is_empty(), "delete of view {tag} that still has children");
                self.views.remove(&tag);
                if self.root == Some(tag) {
                    self.root = None;
                }
            }
            Mutation::Insert {
                parent_tag,
                node,
                index,
            } => {
                let tag = node.tag();
                let child = self.view_mut(tag);
                assert!(
                    child.parent.is_none(),
                    "insert of view {tag} that is already attached"
                );
                child.parent = Some(*parent_tag);
                child.update(node);

                let parent = self.view_mut(*parent_tag);
                assert!(
                    *index <= parent.children.len(),
                    "insert index {index} out of range for parent {parent_tag} ({} children)",
                    parent.children.len()
                );
                parent.children.insert(*index, tag);
            }
            Mutation::Remove {
                parent_tag,
                child_tag,
                index,
            } => {
                let parent = self.view_mut(*parent_tag);
                assert_eq!(
                    parent.children.get(*index),
                    Some(child_tag),
                    "remove of {child_tag} at {index} does not match parent {parent_tag}"
                );
                parent.children.remove(*index);

                let child = self.view_mut(*child_tag);
                child.parent = None;
            }
            Mutation::Update { old, new } => {
                assert_eq!(old.tag(), new.tag(), "update across tags");
                self.view_mut(new.tag()).update(new);
            }
            Mutation::UpdateState { node, state } => {
                self.view_mut(node.tag()).state_revision = Some(state.revision());
            }
        }
    }
}

impl MountingConsumer for StubViewTree {
    fn apply(&mut self, transaction: &MountingTransaction) {
        self.apply_mutations(transaction.mutations());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TreeBuilder;

    #[test]
    fn from_tree_links_parents_and_children() {
        let tb = TreeBuilder::new();
        let root = tb.root([tb.view(2, [tb.view(4, [])]), tb.view(3, [])]);
        let mirror = StubViewTree::from_tree(&root);

        assert_eq!(mirror.len(), 4);
        assert_eq!(mirror.root_tag(), Some(root.tag()));
        let root_view = mirror.get(root.tag()).expect("root mirrored");
        assert_eq!(root_view.children, [Tag(2), Tag(3)]);
        assert_eq!(mirror.get(Tag(4)).and_then(|v| v.parent), Some(Tag(2)));
    }

    #[test]
    #[should_panic(expected = "create of existing view")]
    fn double_create_panics() {
        let tb = TreeBuilder::new();
        let a = tb.view(2, []);
        let mut mirror = StubViewTree::new();
        mirror.apply_mutations(&[
            Mutation::Create { node: a.clone() },
            Mutation::Create { node: a },
        ]);
    }

    #[test]
    #[should_panic(expected = "delete of attached view")]
    fn deleting_attached_view_panics() {
        let tb = TreeBuilder::new();
        let root = tb.root([tb.view(2, [])]);
        let mut mirror = StubViewTree::from_tree(&root);
        let child = Arc::clone(&root.children()[0]);
        mirror.apply_mutations(&[Mutation::Delete { node: child }]);
    }

    #[test]
    #[should_panic(expected = "does not match parent")]
    fn mismatched_remove_panics() {
        let tb = TreeBuilder::new();
        let root = tb.root([tb.view(2, []), tb.view(3, [])]);
        let mut mirror = StubViewTree::from_tree(&root);
        mirror.apply_mutations(&[Mutation::Remove {
            parent_tag: root.tag(),
            child_tag: Tag(3),
            index: 0,
        }]);
    }
}
