// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable, structurally shared tree nodes.
//!
//! A node exists in one of two states, expressed as two types:
//!
//! - **Building**: [`ShadowNodeBuilder`]. Owned by a single thread; props,
//!   state, children, and layout can be changed freely.
//! - **Sealed**: `Arc<ShadowNode>`. Produced by
//!   [`ShadowNodeBuilder::seal`]. A sealed node has no mutators; every change
//!   goes through [`ShadowNode::clone_with`] or [`ShadowNode::clone_builder`],
//!   which produce a new node of the same family and share everything that
//!   was not overridden.

use core::fmt;
use std::sync::Arc;

use super::family::{NodeTraits, ShadowNodeFamily};
use super::id::{ComponentName, FamilyId, SurfaceId, Tag};
use super::props::Props;
use super::state::State;
use crate::layout::LayoutMetrics;

/// Optional overrides applied when cloning a node.
///
/// Every `None` field is shared with the source node.
#[derive(Clone, Debug, Default)]
pub struct ShadowNodeFragment {
    /// Replacement props.
    pub props: Option<Props>,
    /// Replacement children.
    pub children: Option<Vec<Arc<ShadowNode>>>,
    /// Replacement state.
    pub state: Option<State>,
    /// Replacement layout metrics.
    pub layout_metrics: Option<LayoutMetrics>,
}

impl ShadowNodeFragment {
    /// A fragment that only replaces props.
    #[must_use]
    pub fn props(props: Props) -> Self {
        Self {
            props: Some(props),
            ..Self::default()
        }
    }

    /// A fragment that only replaces children.
    #[must_use]
    pub fn children(children: Vec<Arc<ShadowNode>>) -> Self {
        Self {
            children: Some(children),
            ..Self::default()
        }
    }

    /// A fragment that only replaces state.
    #[must_use]
    pub fn state(state: State) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

/// A sealed node: one component instance at one point in time.
pub struct ShadowNode {
    family: Arc<ShadowNodeFamily>,
    props: Props,
    state: Option<State>,
    children: Arc<[Arc<ShadowNode>]>,
    layout_metrics: LayoutMetrics,
}

/// A node that has not been shared yet.
///
/// See the [module docs](self) for the building/sealed split.
pub struct ShadowNodeBuilder {
    family: Arc<ShadowNodeFamily>,
    props: Props,
    state: Option<State>,
    children: Vec<Arc<ShadowNode>>,
    layout_metrics: LayoutMetrics,
}

impl ShadowNodeBuilder {
    /// Starts a fresh node of `family` with empty props and no children.
    #[must_use]
    pub fn new(family: Arc<ShadowNodeFamily>) -> Self {
        Self {
            family,
            props: Props::empty(),
            state: None,
            children: Vec::new(),
            layout_metrics: LayoutMetrics::EMPTY,
        }
    }

    /// Sets the props.
    #[must_use]
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Sets the state.
    #[must_use]
    pub fn state(mut self, state: Option<State>) -> Self {
        self.state = state;
        self
    }

    /// Replaces the children.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Arc<ShadowNode>>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Sets the layout metrics.
    #[must_use]
    pub fn layout_metrics(mut self, metrics: LayoutMetrics) -> Self {
        self.layout_metrics = metrics;
        self
    }

    /// Appends `child` in place.
    pub fn append_child(&mut self, child: Arc<ShadowNode>) {
        self.children.push(child);
    }

    /// Replaces the child at `index` in place.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace_child(&mut self, index: usize, child: Arc<ShadowNode>) {
        assert!(
            index < self.children.len(),
            "child index {index} out of range (len {})",
            self.children.len()
        );
        self.children[index] = child;
    }

    /// Returns the family this builder belongs to.
    #[must_use]
    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        &self.family
    }

    /// Seals the node, making it immutable and shareable.
    ///
    /// # Panics
    ///
    /// Panics if a surface root is among the children.
    #[must_use]
    pub fn seal(self) -> Arc<ShadowNode> {
        assert_children_insertable(&self.children);
        Arc::new(ShadowNode {
            family: self.family,
            props: self.props,
            state: self.state,
            children: Arc::from(self.children),
            layout_metrics: self.layout_metrics,
        })
    }
}

impl fmt::Debug for ShadowNodeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNodeBuilder")
            .field("tag", &self.family.tag())
            .field("family", &self.family.id())
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

fn assert_children_insertable(children: &[Arc<ShadowNode>]) {
    for child in children {
        assert!(
            !child.traits().contains(NodeTraits::ROOT_NODE_KIND),
            "surface root {} cannot be a child",
            child.tag()
        );
    }
}

impl ShadowNode {
    /// Starts building a fresh node of `family`.
    #[must_use]
    pub fn builder(family: Arc<ShadowNodeFamily>) -> ShadowNodeBuilder {
        ShadowNodeBuilder::new(family)
    }

    /// Returns a builder initialised with this node's content.
    ///
    /// The builder shares props, state, and every child with `self`.
    #[must_use]
    pub fn clone_builder(&self) -> ShadowNodeBuilder {
        ShadowNodeBuilder {
            family: Arc::clone(&self.family),
            props: self.props.clone(),
            state: self.state.clone(),
            children: self.children.to_vec(),
            layout_metrics: self.layout_metrics,
        }
    }

    /// Returns a sealed clone with `fragment` applied.
    ///
    /// The clone belongs to the same family. Every part the fragment does
    /// not override is shared with `self`, including the children slice
    /// itself when no children are given.
    ///
    /// # Panics
    ///
    /// Panics if the replacement children contain a surface root.
    #[must_use]
    pub fn clone_with(&self, fragment: ShadowNodeFragment) -> Arc<Self> {
        let children = match fragment.children {
            Some(children) => {
                assert_children_insertable(&children);
                Arc::from(children)
            }
            None => Arc::clone(&self.children),
        };
        Arc::new(Self {
            family: Arc::clone(&self.family),
            props: fragment.props.unwrap_or_else(|| self.props.clone()),
            state: fragment.state.or_else(|| self.state.clone()),
            children,
            layout_metrics: fragment.layout_metrics.unwrap_or(self.layout_metrics),
        })
    }

    /// Returns the family.
    #[must_use]
    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        &self.family
    }

    /// Returns the family id, the key that matches this node across
    /// revisions.
    #[inline]
    #[must_use]
    pub fn family_id(&self) -> FamilyId {
        self.family.id()
    }

    /// Returns `true` if both nodes are clones of the same logical node.
    #[inline]
    #[must_use]
    pub fn same_family(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.family, &other.family)
    }

    /// Returns the host-view tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.family.tag()
    }

    /// Returns the owning surface.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.family.surface_id()
    }

    /// Returns the component name.
    #[must_use]
    pub fn component_name(&self) -> &ComponentName {
        self.family.component_name()
    }

    /// Returns the component traits.
    #[inline]
    #[must_use]
    pub fn traits(&self) -> NodeTraits {
        self.family.traits()
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the state, if any.
    #[must_use]
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    /// Returns the children in order.
    #[must_use]
    pub fn children(&self) -> &[Arc<Self>] {
        &self.children
    }

    /// Returns the layout metrics assigned by the last layout pass.
    #[must_use]
    pub fn layout_metrics(&self) -> &LayoutMetrics {
        &self.layout_metrics
    }

    /// Returns `true` if both nodes share the same children slice.
    #[must_use]
    pub fn shares_children_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
    }

    /// Calls `visit` for every node of the tree rooted at `root`, parents
    /// before children.
    pub fn traverse(root: &Arc<Self>, visit: &mut impl FnMut(&Arc<Self>)) {
        visit(root);
        for child in root.children.iter() {
            Self::traverse(child, visit);
        }
    }

    /// Returns the number of nodes in the tree rooted at `root`.
    #[must_use]
    pub fn count(root: &Arc<Self>) -> usize {
        let mut count = 0;
        Self::traverse(root, &mut |_| count += 1);
        count
    }

    /// Returns the newest clone of `family` reachable from `root`.
    #[must_use]
    pub fn find(root: &Arc<Self>, family: FamilyId) -> Option<Arc<Self>> {
        let path = Self::path_to(root, family)?;
        let mut node = root;
        for index in path {
            node = &node.children[index];
        }
        Some(Arc::clone(node))
    }

    /// Returns the chain of ancestors of `family` in `root`, outermost first,
    /// each paired with the index of the next node in its children.
    ///
    /// Returns `None` if the family is absent. The root itself yields an
    /// empty chain.
    #[must_use]
    pub fn ancestors(root: &Arc<Self>, family: FamilyId) -> Option<Vec<(Arc<Self>, usize)>> {
        let path = Self::path_to(root, family)?;
        let mut chain = Vec::with_capacity(path.len());
        let mut node = root;
        for index in path {
            chain.push((Arc::clone(node), index));
            node = &node.children[index];
        }
        Some(chain)
    }

    /// Clones the path from `root` down to the node of `family`, replacing
    /// that node with the result of `f`.
    ///
    /// Siblings off the path are shared. Returns `None` if `family` is not
    /// in the tree.
    #[must_use]
    pub fn clone_tree(
        root: &Arc<Self>,
        family: FamilyId,
        f: impl FnOnce(&Arc<Self>) -> Arc<Self>,
    ) -> Option<Arc<Self>> {
        let path = Self::path_to(root, family)?;
        Some(Self::clone_along(root, &path, f))
    }

    fn clone_along(node: &Arc<Self>, path: &[usize], f: impl FnOnce(&Arc<Self>) -> Arc<Self>) -> Arc<Self> {
        match path.split_first() {
            None => f(node),
            Some((&index, rest)) => {
                let replaced = Self::clone_along(&node.children[index], rest, f);
                let mut children = node.children.to_vec();
                children[index] = replaced;
                node.clone_with(ShadowNodeFragment::children(children))
            }
        }
    }

    /// Returns child indices leading from `root` to `family`.
    fn path_to(root: &Arc<Self>, family: FamilyId) -> Option<Vec<usize>> {
        fn search(node: &ShadowNode, family: FamilyId, path: &mut Vec<usize>) -> bool {
            if node.family_id() == family {
                return true;
            }
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                if search(child, family, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(root, family, &mut path).then_some(path)
    }

    /// Brings every node's state up to its family's most recent committed
    /// state.
    ///
    /// Returns `None` when no node needed to change, so callers can keep the
    /// original tree and its sharing.
    #[must_use]
    pub fn progress_state(root: &Arc<Self>) -> Option<Arc<Self>> {
        let mut changed_children: Option<Vec<Arc<Self>>> = None;
        for (index, child) in root.children.iter().enumerate() {
            if let Some(progressed) = Self::progress_state(child) {
                changed_children.get_or_insert_with(|| root.children.to_vec())[index] = progressed;
            }
        }

        let newer_state = root.family.most_recent_state().filter(|recent| {
            root.state
                .as_ref()
                .is_none_or(|current| recent.is_newer_than(current))
        });

        if changed_children.is_none() && newer_state.is_none() {
            return None;
        }
        Some(root.clone_with(ShadowNodeFragment {
            children: changed_children,
            state: newer_state,
            ..ShadowNodeFragment::default()
        }))
    }
}

impl fmt::Debug for ShadowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNode")
            .field("tag", &self.family.tag())
            .field("component", self.family.component_name())
            .field("family", &self.family.id())
            .field("props", &self.props)
            .field("state", &self.state)
            .field("frame", &self.layout_metrics.frame)
            .field("children", &self.children.len())
            .finish()
    }
}
