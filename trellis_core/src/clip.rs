// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip propagation tree.
//!
//! Widgets can opt in to *display-rect tracking*: being told which portion of
//! their own coordinate space is actually visible on screen after every
//! ancestor has clipped it. Rather than recomputing that intersection for the
//! whole tree on every change, the scheduler maintains a sparse mirror of the
//! widget tree containing only opted-in widgets and the ancestor chains
//! leading to them. Ancestors that are not themselves opted in are kept as
//! *relay* nodes purely to propagate clip changes downward.
//!
//! Each node caches its clip rectangle in its widget's coordinate space: the
//! widget's own rectangle when visible (empty when not), intersected with the
//! parent node's clip translated into this widget's space. A change re-derives
//! the node's rectangle and recurses into children only when the rectangle
//! actually changed, so an unchanged interior node cuts off the walk.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use crate::widget::{INVALID, WidgetId, WidgetTree};

/// Returns whether a rectangle has no area.
pub(crate) fn rect_is_empty(r: Rect) -> bool {
    r.width() <= 0.0 || r.height() <= 0.0
}

/// Collapses rectangles without area to [`Rect::ZERO`] so that all empty
/// clips compare equal.
pub(crate) fn normalize(r: Rect) -> Rect {
    if rect_is_empty(r) { Rect::ZERO } else { r }
}

#[derive(Debug)]
struct ClipNode {
    widget: WidgetId,
    parent: u32,
    children: Vec<u32>,
    /// Clip rectangle in `widget`'s coordinate space.
    clip: Rect,
}

/// Sparse mirror of the widget tree for clip propagation.
#[derive(Debug, Default)]
pub(crate) struct ClipTree {
    nodes: Vec<ClipNode>,
    len: u32,
    free: Vec<u32>,
    /// Widget slot index to node index, [`INVALID`] when absent.
    lookup: Vec<u32>,
}

impl ClipTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns whether `widget` currently has a node (opted in or relay).
    pub(crate) fn contains(&self, widget: WidgetId) -> bool {
        self.node_of(widget).is_some()
    }

    /// Ensures `widget` and its ancestor chain have nodes, computing their
    /// clip rectangles top-down.
    pub(crate) fn register(&mut self, tree: &WidgetTree, widget: WidgetId) {
        if self.contains(widget) {
            return;
        }
        let node = self.alloc(widget);
        match tree.parent(widget) {
            None => self.update_clip(tree, node, None),
            Some(parent) => {
                self.register(tree, parent);
                if let Some(parent_node) = self.node_of(parent) {
                    self.update_clip(tree, node, Some(parent_node));
                    self.nodes[parent_node as usize].children.push(node);
                    self.nodes[node as usize].parent = parent_node;
                }
            }
        }
    }

    /// Removes `widget`'s node if it no longer relays to any descendant, then
    /// prunes upward: each ancestor node is removed while it has no remaining
    /// children and its widget is not itself opted in.
    pub(crate) fn unregister(&mut self, tree: &WidgetTree, widget: WidgetId) {
        let Some(node) = self.node_of(widget) else {
            return;
        };
        if !self.nodes[node as usize].children.is_empty() {
            // Still relaying to tracked descendants.
            return;
        }
        let mut current = self.nodes[node as usize].parent;
        self.free_node(node);
        while current != INVALID {
            let keep = !self.nodes[current as usize].children.is_empty()
                || tree.tracks_display_rect(self.nodes[current as usize].widget);
            if keep {
                break;
            }
            let parent = self.nodes[current as usize].parent;
            self.free_node(current);
            current = parent;
        }
    }

    /// Re-derives the clip rectangle of `widget`'s node and, where it changed,
    /// of every node below it. Returns `(widget, old, new)` for each opted-in
    /// widget whose rectangle changed, in top-down order.
    pub(crate) fn check_change(
        &mut self,
        tree: &WidgetTree,
        widget: WidgetId,
    ) -> Vec<(WidgetId, Rect, Rect)> {
        let mut changed = Vec::new();
        if let Some(node) = self.node_of(widget) {
            self.check_node(tree, node, &mut changed);
        }
        changed
    }

    /// Returns the display rectangle of `widget` in its own coordinate space.
    ///
    /// Served from the cached node when one exists; otherwise computed by
    /// walking the ancestor chain.
    pub(crate) fn display_rect(&self, tree: &WidgetTree, widget: WidgetId) -> Rect {
        if let Some(node) = self.node_of(widget) {
            return self.nodes[node as usize].clip;
        }

        let mut clip = own_rect(tree, widget);
        let mut offset = Vec2::ZERO;
        let mut current = widget;
        while let Some(parent) = tree.parent(current) {
            if rect_is_empty(clip) {
                return Rect::ZERO;
            }
            offset += tree.bounds(current).origin().to_vec2();
            clip = normalize(clip.intersect(own_rect(tree, parent) - offset));
            current = parent;
        }
        clip
    }

    // -- Internal helpers --

    fn node_of(&self, widget: WidgetId) -> Option<u32> {
        let node = *self.lookup.get(widget.index() as usize)?;
        if node == INVALID { None } else { Some(node) }
    }

    fn check_node(&mut self, tree: &WidgetTree, node: u32, changed: &mut Vec<(WidgetId, Rect, Rect)>) {
        let old = self.nodes[node as usize].clip;
        let parent = self.nodes[node as usize].parent;
        let parent = if parent == INVALID { None } else { Some(parent) };
        self.update_clip(tree, node, parent);
        let new = self.nodes[node as usize].clip;
        if old == new {
            return;
        }
        let widget = self.nodes[node as usize].widget;
        if tree.tracks_display_rect(widget) {
            changed.push((widget, old, new));
        }
        let kids = self.nodes[node as usize].children.clone();
        for child in kids {
            self.check_node(tree, child, changed);
        }
    }

    fn update_clip(&mut self, tree: &WidgetTree, node: u32, parent: Option<u32>) {
        let widget = self.nodes[node as usize].widget;
        let own = own_rect(tree, widget);
        let clip = match parent {
            None => own,
            Some(parent) => {
                let offset = tree.bounds(widget).origin().to_vec2();
                own.intersect(self.nodes[parent as usize].clip - offset)
            }
        };
        self.nodes[node as usize].clip = normalize(clip);
    }

    fn alloc(&mut self, widget: WidgetId) -> u32 {
        let node = if let Some(node) = self.free.pop() {
            self.nodes[node as usize] = ClipNode {
                widget,
                parent: INVALID,
                children: Vec::new(),
                clip: Rect::ZERO,
            };
            node
        } else {
            let node = self.len;
            self.len += 1;
            self.nodes.push(ClipNode {
                widget,
                parent: INVALID,
                children: Vec::new(),
                clip: Rect::ZERO,
            });
            node
        };
        let slot = widget.index() as usize;
        if self.lookup.len() <= slot {
            self.lookup.resize(slot + 1, INVALID);
        }
        self.lookup[slot] = node;
        node
    }

    fn free_node(&mut self, node: u32) {
        let parent = self.nodes[node as usize].parent;
        if parent != INVALID {
            self.nodes[parent as usize].children.retain(|&c| c != node);
        }
        let widget = self.nodes[node as usize].widget;
        self.lookup[widget.index() as usize] = INVALID;
        self.nodes[node as usize].parent = INVALID;
        self.nodes[node as usize].children.clear();
        self.free.push(node);
    }
}

/// The widget's own rectangle in its own coordinate space; empty when the
/// widget is invisible.
fn own_rect(tree: &WidgetTree, widget: WidgetId) -> Rect {
    if tree.visible(widget) {
        Rect::from_origin_size(Point::ZERO, tree.size(widget))
    } else {
        Rect::ZERO
    }
}
