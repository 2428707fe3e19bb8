// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout geometry types.

use kurbo::{Point, Rect, Size};

/// Whether a node participates in layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayType {
    /// Laid out normally.
    #[default]
    Flex,
    /// Skipped by layout and given an empty frame.
    None,
}

/// Writing direction used to resolve start/end edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    /// Inherited from the parent.
    #[default]
    Undefined,
    /// Left to right.
    LeftToRight,
    /// Right to left.
    RightToLeft,
}

/// Computed geometry of one node.
///
/// `frame` is expressed in the parent's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    /// Position and size relative to the parent.
    pub frame: Rect,
    /// Display mode.
    pub display: DisplayType,
    /// Resolved writing direction.
    pub direction: LayoutDirection,
    /// Device pixels per layout unit.
    pub point_scale_factor: f64,
}

impl LayoutMetrics {
    /// Metrics of a node that has never been laid out.
    pub const EMPTY: Self = Self {
        frame: Rect::ZERO,
        display: DisplayType::Flex,
        direction: LayoutDirection::Undefined,
        point_scale_factor: 1.0,
    };

    /// Returns a copy with the frame translated by `origin`.
    #[must_use]
    pub fn offset_by(self, origin: Point) -> Self {
        Self {
            frame: self.frame + origin.to_vec2(),
            ..self
        }
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Size bounds a layout pass must respect for a surface root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConstraints {
    /// Smallest permitted size.
    pub min_size: Size,
    /// Largest permitted size; components may be infinite.
    pub max_size: Size,
    /// Direction for the root.
    pub direction: LayoutDirection,
}

impl LayoutConstraints {
    /// No bounds at all.
    pub const UNBOUNDED: Self = Self {
        min_size: Size::ZERO,
        max_size: Size::new(f64::INFINITY, f64::INFINITY),
        direction: LayoutDirection::LeftToRight,
    };

    /// Constraints that force exactly `size`.
    #[must_use]
    pub const fn fixed(size: Size) -> Self {
        Self {
            min_size: size,
            max_size: size,
            direction: LayoutDirection::LeftToRight,
        }
    }

    /// Clamps `size` into the `[min_size, max_size]` range.
    #[must_use]
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            size.width.max(self.min_size.width).min(self.max_size.width),
            size.height.max(self.min_size.height).min(self.max_size.height),
        )
    }
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_bounds() {
        let constraints = LayoutConstraints {
            min_size: Size::new(10.0, 10.0),
            max_size: Size::new(100.0, 50.0),
            direction: LayoutDirection::LeftToRight,
        };
        assert_eq!(constraints.clamp(Size::new(5.0, 70.0)), Size::new(10.0, 50.0));
        assert_eq!(constraints.clamp(Size::new(40.0, 20.0)), Size::new(40.0, 20.0));
    }

    #[test]
    fn offset_moves_frame_only() {
        let metrics = LayoutMetrics {
            frame: Rect::new(0.0, 0.0, 10.0, 10.0),
            ..LayoutMetrics::EMPTY
        };
        let moved = metrics.offset_by(Point::new(5.0, 7.0));
        assert_eq!(moved.frame, Rect::new(5.0, 7.0, 15.0, 17.0));
        assert_eq!(moved.display, metrics.display);
    }
}
