// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal vertical stacking engine.

use kurbo::{Point, Rect, Size};

use super::engine::{LayoutEngine, LayoutResults};
use super::metrics::{DisplayType, LayoutConstraints, LayoutDirection, LayoutMetrics};
use crate::node::{NodeTraits, ShadowNode};

/// Stacks children top to bottom inside their parent's padding box.
///
/// Recognised props, all optional:
///
/// | Prop | Meaning |
/// |---|---|
/// | `width` | Fixed width; otherwise fills the available width, or wraps the widest child when unbounded. |
/// | `height` | Fixed height; otherwise wraps the stacked children. |
/// | `padding` | Inset applied on every edge. |
/// | `display` | `"none"` removes the node and its subtree from layout. |
///
/// Children of [`NodeTraits::LEAF_LAYOUT`] nodes are not visited.
#[derive(Clone, Copy, Debug)]
pub struct StackLayoutEngine {
    /// Scale recorded in every produced [`LayoutMetrics`].
    pub point_scale_factor: f64,
}

impl StackLayoutEngine {
    /// Creates an engine with the given scale factor.
    #[must_use]
    pub const fn new(point_scale_factor: f64) -> Self {
        Self { point_scale_factor }
    }

    fn place(
        &self,
        node: &ShadowNode,
        origin: Point,
        available_width: f64,
        direction: LayoutDirection,
        results: &mut LayoutResults,
    ) -> Size {
        if node.props().string("display") == Some("none") {
            results.insert(
                node.family_id(),
                LayoutMetrics {
                    frame: Rect::ZERO,
                    display: DisplayType::None,
                    direction,
                    point_scale_factor: self.point_scale_factor,
                },
            );
            return Size::ZERO;
        }

        let props = node.props();
        let padding = props.number("padding").unwrap_or(0.0).max(0.0);
        let width = props.number("width").or_else(|| available_width.is_finite().then_some(available_width));
        let inner_width = width.map_or(f64::INFINITY, |w| (w - 2.0 * padding).max(0.0));

        let mut cursor = padding;
        let mut widest: f64 = 0.0;
        if !node.traits().contains(NodeTraits::LEAF_LAYOUT) {
            for child in node.children() {
                let size = self.place(child, Point::new(padding, cursor), inner_width, direction, results);
                cursor += size.height;
                widest = widest.max(size.width);
            }
        }

        let size = Size::new(
            width.unwrap_or(widest + 2.0 * padding),
            props.number("height").unwrap_or(cursor + padding),
        );
        results.insert(
            node.family_id(),
            LayoutMetrics {
                frame: Rect::from_origin_size(origin, size),
                display: DisplayType::Flex,
                direction,
                point_scale_factor: self.point_scale_factor,
            },
        );
        size
    }
}

impl Default for StackLayoutEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LayoutEngine for StackLayoutEngine {
    fn layout(&self, root: &ShadowNode, constraints: &LayoutConstraints) -> LayoutResults {
        let mut results = LayoutResults::new();
        let size = self.place(
            root,
            Point::ZERO,
            constraints.max_size.width,
            constraints.direction,
            &mut results,
        );
        let clamped = constraints.clamp(size);
        if clamped != size
            && let Some(metrics) = results.get(root.family_id()).copied()
        {
            results.insert(
                root.family_id(),
                LayoutMetrics {
                    frame: Rect::from_origin_size(Point::ZERO, clamped),
                    ..metrics
                },
            );
        }
        results
    }
}
