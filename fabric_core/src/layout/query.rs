// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry queries over a laid-out tree.

use std::sync::Arc;

use kurbo::{Point, Vec2};

use super::metrics::{DisplayType, LayoutMetrics};
use crate::node::{FamilyId, NodeTraits, ShadowNode};

/// Returns the metrics of `descendant` with its frame expressed in the
/// coordinate space of `ancestor`.
///
/// Returns `None` if either family is missing from `root`, `ancestor` does not
/// contain `descendant`, or a node along the way is not displayed.
#[must_use]
pub fn relative_layout_metrics(
    root: &Arc<ShadowNode>,
    ancestor: FamilyId,
    descendant: FamilyId,
) -> Option<LayoutMetrics> {
    let chain = ShadowNode::ancestors(root, descendant)?;
    let target = ShadowNode::find(root, descendant)?;
    if ancestor == descendant {
        let metrics = *target.layout_metrics();
        return Some(LayoutMetrics {
            frame: metrics.frame - metrics.frame.origin().to_vec2(),
            ..metrics
        });
    }

    let start = chain.iter().position(|(node, _)| node.family_id() == ancestor)?;
    let mut offset = Vec2::ZERO;
    for (node, _) in &chain[start + 1..] {
        let metrics = node.layout_metrics();
        if metrics.display == DisplayType::None {
            return None;
        }
        offset += metrics.frame.origin().to_vec2();
    }
    let metrics = *target.layout_metrics();
    if metrics.display == DisplayType::None {
        return None;
    }
    Some(metrics.offset_by(offset.to_point()))
}

/// Returns the deepest view-forming node whose frame contains `point`.
///
/// `point` is in the coordinate space of `root`'s parent. Later siblings are
/// tested first since they draw on top.
#[must_use]
pub fn find_node_at_point(root: &Arc<ShadowNode>, point: Point) -> Option<Arc<ShadowNode>> {
    let metrics = root.layout_metrics();
    if metrics.display == DisplayType::None || !metrics.frame.contains(point) {
        return None;
    }
    let local = point - metrics.frame.origin().to_vec2();
    root.children()
        .iter()
        .rev()
        .find_map(|child| find_node_at_point(child, local))
        .or_else(|| {
            root.traits()
                .contains(NodeTraits::FORMS_VIEW)
                .then(|| Arc::clone(root))
        })
}
