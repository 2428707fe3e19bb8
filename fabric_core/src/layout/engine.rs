// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout engine seam and application of its results to a tree.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use super::metrics::{LayoutConstraints, LayoutMetrics};
use crate::node::{FamilyId, ShadowNode, ShadowNodeFragment};

/// Computes geometry for a tree.
///
/// Engines read props and children of the sealed tree and report metrics per
/// family. They never mutate nodes; [`apply_layout`] turns the results into
/// a new revision.
pub trait LayoutEngine: Send + Sync + fmt::Debug {
    /// Lays out the tree rooted at `root` within `constraints`.
    fn layout(&self, root: &ShadowNode, constraints: &LayoutConstraints) -> LayoutResults;
}

/// Metrics produced by one layout pass, keyed by family.
#[derive(Clone, Debug, Default)]
pub struct LayoutResults {
    metrics: HashMap<FamilyId, LayoutMetrics>,
}

impl LayoutResults {
    /// Creates an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `metrics` for `family`, replacing any earlier entry.
    pub fn insert(&mut self, family: FamilyId, metrics: LayoutMetrics) {
        self.metrics.insert(family, metrics);
    }

    /// Returns the metrics computed for `family`.
    #[must_use]
    pub fn get(&self, family: FamilyId) -> Option<&LayoutMetrics> {
        self.metrics.get(&family)
    }

    /// Returns the number of laid-out families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns `true` if nothing was laid out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Writes `results` into the tree rooted at `root`.
///
/// Only nodes whose metrics differ, and their ancestors, are cloned. Returns
/// `None` when every node already carries its computed metrics.
#[must_use]
pub fn apply_layout(root: &Arc<ShadowNode>, results: &LayoutResults) -> Option<Arc<ShadowNode>> {
    let mut changed_children: Option<Vec<Arc<ShadowNode>>> = None;
    for (index, child) in root.children().iter().enumerate() {
        if let Some(updated) = apply_layout(child, results) {
            changed_children.get_or_insert_with(|| root.children().to_vec())[index] = updated;
        }
    }

    let layout_metrics = results
        .get(root.family_id())
        .filter(|metrics| *metrics != root.layout_metrics())
        .copied();

    if changed_children.is_none() && layout_metrics.is_none() {
        return None;
    }
    Some(root.clone_with(ShadowNodeFragment {
        children: changed_children,
        layout_metrics,
        ..ShadowNodeFragment::default()
    }))
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::testing::TreeBuilder;

    fn framed(rect: Rect) -> LayoutMetrics {
        LayoutMetrics {
            frame: rect,
            ..LayoutMetrics::EMPTY
        }
    }

    #[test]
    fn unchanged_metrics_keep_tree() {
        let tb = TreeBuilder::new();
        let root = tb.root([tb.view(2, [])]);
        let mut results = LayoutResults::new();
        results.insert(root.family_id(), LayoutMetrics::EMPTY);
        assert!(apply_layout(&root, &results).is_none());
    }

    #[test]
    fn only_changed_path_is_cloned() {
        let tb = TreeBuilder::new();
        let a = tb.view(2, [tb.view(4, [])]);
        let b = tb.view(3, []);
        let root = tb.root([a.clone(), b.clone()]);

        let mut results = LayoutResults::new();
        results.insert(b.family_id(), framed(Rect::new(0.0, 10.0, 20.0, 30.0)));
        let laid_out = apply_layout(&root, &results).expect("b moved");

        assert!(Arc::ptr_eq(&laid_out.children()[0], &a));
        let new_b = &laid_out.children()[1];
        assert!(new_b.same_family(&b));
        assert_eq!(new_b.layout_metrics().frame, Rect::new(0.0, 10.0, 20.0, 30.0));
        assert_eq!(root.children()[1].layout_metrics(), &LayoutMetrics::EMPTY);
    }
}
