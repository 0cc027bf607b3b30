// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays widget storage with allocation, topology, and property
//! management.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size};

use crate::layout::Layout;

use super::changes::{ChangeRecord, SizePreference};
use super::id::{INVALID, WidgetId};
use super::traverse::Children;

/// Whether a widget can hold children.
///
/// The kind is fixed at creation time. Leaves never have children; containers
/// may additionally carry a [`Layout`] strategy that positions their children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// A widget with no children of its own.
    Leaf,
    /// A widget that holds an ordered list of children.
    Container,
}

/// Struct-of-arrays storage for all widgets, rooted at a display container.
///
/// Widgets are addressed by [`WidgetId`] handles. Internally, each widget
/// occupies a slot in parallel arrays. Destroyed widgets are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// Construction creates the root container sized to the display; all other
/// widgets are attached somewhere below it (or held detached while being
/// assembled). Mutations append [`ChangeRecord`]s that the scheduler drains.
pub struct WidgetTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) kind: Vec<WidgetKind>,
    pub(crate) origin: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) visible: Vec<bool>,
    pub(crate) z_index: Vec<u32>,
    pub(crate) ideal_size: Vec<Option<Size>>,
    pub(crate) min_size: Vec<Option<Size>>,
    pub(crate) tracks_display_rect: Vec<bool>,
    pub(crate) layout: Vec<Option<Box<dyn Layout>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Change queue --
    pub(crate) changes: Vec<ChangeRecord>,

    root: WidgetId,
}

impl fmt::Debug for WidgetTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetTree")
            .field("len", &self.len)
            .field("root", &self.root)
            .field("queued_changes", &self.changes.len())
            .finish_non_exhaustive()
    }
}

impl WidgetTree {
    /// Creates a tree whose root container has the given display size.
    #[must_use]
    pub fn new(display_size: Size) -> Self {
        let mut tree = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            origin: Vec::new(),
            size: Vec::new(),
            visible: Vec::new(),
            z_index: Vec::new(),
            ideal_size: Vec::new(),
            min_size: Vec::new(),
            tracks_display_rect: Vec::new(),
            layout: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            changes: Vec::new(),
            root: WidgetId {
                idx: 0,
                generation: 0,
            },
        };
        let root = tree.alloc(WidgetKind::Container);
        tree.size[root.idx as usize] = display_size;
        tree.root = root;
        tree
    }

    /// Returns the root container (the display).
    #[inline]
    #[must_use]
    pub const fn root(&self) -> WidgetId {
        self.root
    }

    // -- Allocation API --

    /// Creates a new leaf widget and returns its handle.
    ///
    /// The widget starts detached, visible, at the origin with zero size.
    pub fn create_leaf(&mut self) -> WidgetId {
        self.alloc(WidgetKind::Leaf)
    }

    /// Creates a new container widget and returns its handle.
    ///
    /// The widget starts detached, visible, at the origin with zero size, and
    /// with no layout strategy.
    pub fn create_container(&mut self) -> WidgetId {
        self.alloc(WidgetKind::Container)
    }

    /// Destroys a widget, freeing its slot for reuse.
    ///
    /// The scheduler must have released the widget first; destroying a widget
    /// that still has scheduler state leaves dangling bookkeeping behind.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if the widget is the root, or if it
    /// still has a parent or children.
    pub fn destroy_widget(&mut self, id: WidgetId) {
        self.validate(id);
        assert!(id != self.root, "cannot destroy the root container");
        let idx = id.idx;
        assert!(
            self.parent[idx as usize] == INVALID,
            "cannot destroy an attached widget"
        );
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy widget with children"
        );

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.layout[idx as usize] = None;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live widget.
    #[must_use]
    pub fn is_alive(&self, id: WidgetId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`, recording the change.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `parent` is a leaf, or if `child`
    /// already has a parent.
    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.kind[parent.idx as usize] == WidgetKind::Container,
            "cannot add children to a leaf widget"
        );
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.changes.push(ChangeRecord::ChildAdded {
            container: parent,
            child,
        });
    }

    /// Removes `child` from `parent`, recording the change.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `parent` is not the parent of
    /// `child`.
    pub fn remove_child(&mut self, parent: WidgetId, child: WidgetId) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == parent.idx,
            "widget is not a child of the given container"
        );

        self.unlink_from_parent(c);

        self.changes.push(ChangeRecord::ChildRemoved {
            container: parent,
            child,
        });
    }

    /// Returns the parent of a widget, if any.
    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(WidgetId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a widget.
    #[must_use]
    pub fn children(&self, id: WidgetId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the direct children of a widget sorted by z-index, lowest
    /// first. Children sharing a z-index keep their insertion order.
    #[must_use]
    pub fn children_by_z(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut kids: Vec<WidgetId> = self.children(id).collect();
        kids.sort_by_key(|child| self.z_index[child.idx as usize]);
        kids
    }

    /// Returns whether `id` is reachable from the root by parent links.
    #[must_use]
    pub fn is_attached(&self, id: WidgetId) -> bool {
        self.validate(id);
        let mut current = id.idx;
        loop {
            if current == self.root.idx {
                return true;
            }
            let p = self.parent[current as usize];
            if p == INVALID {
                return false;
            }
            current = p;
        }
    }

    /// Returns whether `ancestor` is a proper ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: WidgetId, descendant: WidgetId) -> bool {
        self.validate(ancestor);
        self.validate(descendant);
        let mut current = self.parent[descendant.idx as usize];
        while current != INVALID {
            if current == ancestor.idx {
                return true;
            }
            current = self.parent[current as usize];
        }
        false
    }

    // -- Property getters --

    /// Returns the kind of a widget.
    #[must_use]
    pub fn kind(&self, id: WidgetId) -> WidgetKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// Returns whether a widget is a container.
    #[must_use]
    pub fn is_container(&self, id: WidgetId) -> bool {
        self.kind(id) == WidgetKind::Container
    }

    /// Returns the bounds of a widget in its parent's coordinate space.
    #[must_use]
    pub fn bounds(&self, id: WidgetId) -> Rect {
        self.validate(id);
        Rect::from_origin_size(self.origin[id.idx as usize], self.size[id.idx as usize])
    }

    /// Returns the size of a widget.
    #[must_use]
    pub fn size(&self, id: WidgetId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns whether a widget is locally visible.
    ///
    /// This is the widget's own flag; an invisible ancestor still suppresses
    /// rendering of a locally visible widget.
    #[must_use]
    pub fn visible(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns whether a widget and every ancestor up to the root are
    /// visible.
    #[must_use]
    pub fn recursively_visible(&self, id: WidgetId) -> bool {
        self.validate(id);
        let mut idx = id.idx;
        loop {
            if !self.visible[idx as usize] {
                return false;
            }
            let parent = self.parent[idx as usize];
            if parent == INVALID {
                return true;
            }
            idx = parent;
        }
    }

    /// Returns the z-index of a widget.
    #[must_use]
    pub fn z_index(&self, id: WidgetId) -> u32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the ideal size preference of a widget, if set.
    #[must_use]
    pub fn ideal_size(&self, id: WidgetId) -> Option<Size> {
        self.validate(id);
        self.ideal_size[id.idx as usize]
    }

    /// Returns the minimum size preference of a widget, if set.
    #[must_use]
    pub fn min_size(&self, id: WidgetId) -> Option<Size> {
        self.validate(id);
        self.min_size[id.idx as usize]
    }

    /// Returns whether a widget wants display-rect change notifications.
    #[must_use]
    pub fn tracks_display_rect(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.tracks_display_rect[id.idx as usize]
    }

    /// Returns whether a container has a layout strategy installed.
    #[must_use]
    pub fn has_layout(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.layout[id.idx as usize].is_some()
    }

    /// Returns whether the container's layout reads child ideal sizes.
    ///
    /// `false` when no layout strategy is installed.
    #[must_use]
    pub fn layout_uses_ideal_size(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.layout[id.idx as usize]
            .as_ref()
            .is_some_and(|layout| layout.uses_ideal_size())
    }

    /// Returns whether the container's layout reads child minimum sizes.
    ///
    /// `false` when no layout strategy is installed.
    #[must_use]
    pub fn layout_uses_min_size(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.layout[id.idx as usize]
            .as_ref()
            .is_some_and(|layout| layout.uses_min_size())
    }

    // -- Mutation API (records changes) --

    /// Sets the bounds of a widget, recording the change if it differs.
    pub fn set_bounds(&mut self, id: WidgetId, bounds: Rect) {
        self.validate(id);
        let old = Rect::from_origin_size(self.origin[id.idx as usize], self.size[id.idx as usize]);
        if old == bounds {
            return;
        }
        self.origin[id.idx as usize] = bounds.origin();
        self.size[id.idx as usize] = bounds.size();
        self.changes.push(ChangeRecord::BoundsChanged {
            widget: id,
            old,
            new: bounds,
        });
    }

    /// Sets the visibility of a widget, recording the change if it toggled.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) {
        self.validate(id);
        if self.visible[id.idx as usize] == visible {
            return;
        }
        self.visible[id.idx as usize] = visible;
        self.changes
            .push(ChangeRecord::VisibilityChanged { widget: id });
    }

    /// Sets the z-index of a widget, recording the change if it differs.
    pub fn set_z_index(&mut self, id: WidgetId, z_index: u32) {
        self.validate(id);
        if self.z_index[id.idx as usize] == z_index {
            return;
        }
        self.z_index[id.idx as usize] = z_index;
        self.changes.push(ChangeRecord::ZIndexChanged {
            widget: id,
            z_index,
        });
    }

    /// Sets the ideal size preference, recording the change if it differs.
    pub fn set_ideal_size(&mut self, id: WidgetId, ideal: Option<Size>) {
        self.validate(id);
        if self.ideal_size[id.idx as usize] == ideal {
            return;
        }
        self.ideal_size[id.idx as usize] = ideal;
        self.changes.push(ChangeRecord::SizePreferenceChanged {
            widget: id,
            preference: SizePreference::Ideal,
        });
    }

    /// Sets the minimum size preference, recording the change if it differs.
    pub fn set_min_size(&mut self, id: WidgetId, min: Option<Size>) {
        self.validate(id);
        if self.min_size[id.idx as usize] == min {
            return;
        }
        self.min_size[id.idx as usize] = min;
        self.changes.push(ChangeRecord::SizePreferenceChanged {
            widget: id,
            preference: SizePreference::Minimum,
        });
    }

    /// Sets whether the widget wants display-rect change notifications,
    /// recording the change if it toggled.
    pub fn set_tracks_display_rect(&mut self, id: WidgetId, tracks: bool) {
        self.validate(id);
        if self.tracks_display_rect[id.idx as usize] == tracks {
            return;
        }
        self.tracks_display_rect[id.idx as usize] = tracks;
        self.changes
            .push(ChangeRecord::DisplayRectTrackingChanged { widget: id });
    }

    /// Installs (or clears) the layout strategy of a container.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the widget is a leaf.
    pub fn set_layout(&mut self, id: WidgetId, layout: Option<Box<dyn Layout>>) {
        self.validate(id);
        assert!(
            self.kind[id.idx as usize] == WidgetKind::Container,
            "cannot install a layout on a leaf widget"
        );
        self.layout[id.idx as usize] = layout;
    }

    /// Runs the container's layout strategy once, if one is installed.
    ///
    /// The strategy is taken out of the tree for the duration of the call, so
    /// a strategy that re-enters `run_layout` for its own container sees no
    /// strategy and returns without effect. Does nothing for leaves or
    /// containers without a strategy.
    pub fn run_layout(&mut self, id: WidgetId) {
        self.validate(id);
        if self.kind[id.idx as usize] != WidgetKind::Container {
            return;
        }
        let Some(mut strategy) = self.layout[id.idx as usize].take() else {
            return;
        };
        strategy.run(id, self);
        let slot = &mut self.layout[id.idx as usize];
        if slot.is_none() {
            *slot = Some(strategy);
        }
    }

    // -- Change queue --

    /// Drains and returns the queued change records in mutation order.
    pub fn take_changes(&mut self) -> Vec<ChangeRecord> {
        core::mem::take(&mut self.changes)
    }

    // -- Internal helpers --

    /// Returns all live widgets, in slot order.
    pub(crate) fn live_widgets(&self) -> Vec<WidgetId> {
        let mut live = Vec::new();
        for idx in 0..self.len {
            if !self.free_list.contains(&idx) {
                live.push(WidgetId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        live
    }

    fn alloc(&mut self, kind: WidgetKind) -> WidgetId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.kind[idx as usize] = kind;
            self.origin[idx as usize] = Point::ZERO;
            self.size[idx as usize] = Size::ZERO;
            self.visible[idx as usize] = true;
            self.z_index[idx as usize] = 0;
            self.ideal_size[idx as usize] = None;
            self.min_size[idx as usize] = None;
            self.tracks_display_rect[idx as usize] = false;
            self.layout[idx as usize] = None;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.origin.push(Point::ZERO);
            self.size.push(Size::ZERO);
            self.visible.push(true);
            self.z_index.push(0);
            self.ideal_size.push(None);
            self.min_size.push(None);
            self.tracks_display_rect.push(false);
            self.layout.push(None);
            self.generation.push(0);
            idx
        };

        WidgetId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: WidgetId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale WidgetId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
