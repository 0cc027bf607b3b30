// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, WidgetId};
use super::store::WidgetTree;

/// An iterator over the direct children of a widget.
///
/// Created by [`WidgetTree::children`]. Yields children in insertion order,
/// which is independent of z-index; use
/// [`WidgetTree::children_by_z`] for stacking order.
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a WidgetTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a WidgetTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(WidgetId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}
