// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deliberately simple layout strategies for tests.

use alloc::vec::Vec;

use kurbo::Rect;

use trellis_core::layout::Layout;
use trellis_core::widget::{WidgetId, WidgetTree};

/// Sizes every child to fill its container, at the container's origin.
#[derive(Debug, Default)]
pub struct FillLayout;

impl Layout for FillLayout {
    fn run(&mut self, container: WidgetId, tree: &mut WidgetTree) {
        let size = tree.size(container);
        let children: Vec<WidgetId> = tree.children(container).collect();
        for child in children {
            tree.set_bounds(child, Rect::from_origin_size((0.0, 0.0), size));
        }
    }
}

/// Places children left to right, separated by `spacing`.
///
/// A child with an ideal size is resized to it; other children keep their
/// current size. Reads ideal sizes, so preference changes under a container
/// running this layout trigger a fresh pass.
#[derive(Debug)]
pub struct RowLayout {
    /// Horizontal gap between consecutive children.
    pub spacing: f64,
}

impl RowLayout {
    /// Creates a row layout with the given gap between children.
    #[must_use]
    pub fn new(spacing: f64) -> Self {
        Self { spacing }
    }
}

impl Layout for RowLayout {
    fn run(&mut self, container: WidgetId, tree: &mut WidgetTree) {
        let children: Vec<WidgetId> = tree.children(container).collect();
        let mut x = 0.0;
        for child in children {
            let size = tree.ideal_size(child).unwrap_or_else(|| tree.size(child));
            tree.set_bounds(child, Rect::from_origin_size((x, 0.0), size));
            x += size.width + self.spacing;
        }
    }

    fn uses_ideal_size(&self) -> bool {
        true
    }
}
