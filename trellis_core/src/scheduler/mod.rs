// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render scheduling for the widget tree.
//!
//! The [`RenderScheduler`] owns all damage-tracking state for one
//! [`WidgetTree`]: which widgets it manages, which are dirty, which containers
//! await layout, and which widgets are queued for the next render walk. It
//! drains the tree's change records (see [`widget::ChangeRecord`]) and folds
//! them into that state, then performs the deferred work when the platform
//! runs the flush task.
//!
//! # Managed set and marks
//!
//! A widget becomes *managed* when it is attached under the root (directly or
//! through a managed container) while visible. Widgets added invisible are
//! parked and join the managed set when first shown. Per-widget state is a
//! bitset over slot indices:
//!
//! - `ACTIVE` — managed by this scheduler.
//! - `DIRTY` — content must repaint.
//! - `NEVER_RENDERED` — has not completed a render since being managed.
//! - `PENDING_BOUNDS` — surface geometry is out of sync with tree bounds.
//! - `VISIBILITY_CHANGED` — surface visibility is out of sync.
//! - `AWAITING_VISIBILITY` — parked; added while invisible.
//!
//! # Pending-render queue
//!
//! The queue holds an *antichain*: no queued widget is an ancestor of another.
//! Requesting a widget already covered by a queued ancestor is dropped;
//! requesting an ancestor of queued widgets replaces them. Rendering a
//! container repaints its subtree anyway, so finer entries are redundant.
//!
//! # Flush
//!
//! [`flush`](RenderScheduler::flush) runs three stages: container layout to a
//! fixed point (bounded by [`SchedulerConfig::max_layout_passes`]), a
//! top-down render walk over the queue, and a geometry sync for moved widgets
//! that did not repaint. Any number of invalidations between flushes arm the
//! [`TaskQueue`](crate::backend::TaskQueue) at most once.
//!
//! [`widget::ChangeRecord`]: crate::widget::ChangeRecord

mod flush;
mod invalidate;

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::backend::{GraphicsDevice, TaskQueue, WidgetHooks};
use crate::clip::ClipTree;
use crate::widget::{WidgetId, WidgetTree};

// Per-widget mark bits, indexed by slot.
pub(crate) const ACTIVE: u8 = 1 << 0;
pub(crate) const DIRTY: u8 = 1 << 1;
pub(crate) const NEVER_RENDERED: u8 = 1 << 2;
pub(crate) const PENDING_BOUNDS: u8 = 1 << 3;
pub(crate) const VISIBILITY_CHANGED: u8 = 1 << 4;
pub(crate) const AWAITING_VISIBILITY: u8 = 1 << 5;

/// Configuration for the [`RenderScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SchedulerConfig {
    /// Upper bound on passes of the layout fixed-point loop in one flush.
    ///
    /// Each pass lays out every container scheduled so far and applies the
    /// changes those layouts produced, which may schedule further containers.
    /// Exceeding the bound indicates a layout cycle and panics with a
    /// diagnostic rather than hanging the flush.
    pub max_layout_passes: u32,
}

impl SchedulerConfig {
    /// Default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_layout_passes: 64,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Children removed from a still-attached container, awaiting that
/// container's next render before their resources are released.
#[derive(Debug)]
pub(crate) struct CleanupEntry {
    pub(crate) container: WidgetId,
    pub(crate) children: Vec<WidgetId>,
}

/// Damage-tracking render scheduler for one [`WidgetTree`].
///
/// Owns the graphics device, widget hooks, task queue, per-widget marks, the
/// layout and render queues, deferred cleanup, and the clip propagation tree.
///
/// `D` and `H` must agree on the canvas type widgets paint into.
pub struct RenderScheduler<D, H, T> {
    pub(crate) device: D,
    pub(crate) hooks: H,
    pub(crate) tasks: T,
    pub(crate) config: SchedulerConfig,

    pub(crate) marks: Vec<u8>,
    pub(crate) pending_layout: Vec<WidgetId>,
    pub(crate) laying_out: Option<WidgetId>,
    pub(crate) pending_render: Vec<WidgetId>,
    pub(crate) pending_cleanup: Vec<CleanupEntry>,
    pub(crate) clip: ClipTree,
}

impl<D, H, T> fmt::Debug for RenderScheduler<D, H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("pending_layout", &self.pending_layout)
            .field("pending_render", &self.pending_render)
            .field("pending_cleanup", &self.pending_cleanup.len())
            .finish_non_exhaustive()
    }
}

impl<D, H, T> RenderScheduler<D, H, T>
where
    D: GraphicsDevice,
    H: WidgetHooks<Canvas = D::Canvas>,
    T: TaskQueue,
{
    /// Creates a scheduler with the default configuration.
    ///
    /// Drains any change records already queued on the tree and adopts the
    /// root's current children, so a tree assembled before the scheduler
    /// exists is picked up in full.
    pub fn new(tree: &mut WidgetTree, device: D, hooks: H, tasks: T) -> Self {
        Self::with_config(tree, device, hooks, tasks, SchedulerConfig::new())
    }

    /// Creates a scheduler with the given configuration.
    pub fn with_config(
        tree: &mut WidgetTree,
        device: D,
        hooks: H,
        tasks: T,
        config: SchedulerConfig,
    ) -> Self {
        let mut scheduler = Self {
            device,
            hooks,
            tasks,
            config,
            marks: Vec::new(),
            pending_layout: Vec::new(),
            laying_out: None,
            pending_render: Vec::new(),
            pending_cleanup: Vec::new(),
            clip: ClipTree::new(),
        };
        scheduler.apply_changes(tree);
        let kids: Vec<WidgetId> = tree.children(tree.root()).collect();
        for child in kids {
            if scheduler.has_mark(child, ACTIVE | AWAITING_VISIBILITY) {
                continue;
            }
            if tree.visible(child) {
                scheduler.record_widget(tree, child);
                scheduler.hooks.revalidate(child);
            } else {
                scheduler.mark(child, AWAITING_VISIBILITY);
            }
        }
        scheduler
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Returns the graphics device.
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Returns the graphics device mutably.
    pub const fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Returns the widget hooks.
    #[must_use]
    pub const fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Returns the widget hooks mutably.
    pub const fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Returns the task queue.
    #[must_use]
    pub const fn tasks(&self) -> &T {
        &self.tasks
    }

    /// Returns the task queue mutably.
    pub const fn tasks_mut(&mut self) -> &mut T {
        &mut self.tasks
    }

    /// Drains the tree's queued change records into scheduler state.
    ///
    /// This may run layouts of containers directly under the root, arm the
    /// task queue, and release resources of removed widgets; it never paints.
    pub fn commit(&mut self, tree: &mut WidgetTree) {
        self.apply_changes(tree);
    }

    /// Requests a deferred repaint of `widget`.
    ///
    /// Commits queued changes first. Ignored for widgets that are not managed
    /// and attached, or whose bounds are empty.
    pub fn render(&mut self, tree: &mut WidgetTree, widget: WidgetId) {
        self.apply_changes(tree);
        self.request_render(tree, widget, false);
    }

    /// Like [`render`](Self::render), but queues widgets whose bounds are
    /// still empty (used for widgets that have not been laid out yet).
    pub fn render_ignoring_empty_bounds(&mut self, tree: &mut WidgetTree, widget: WidgetId) {
        self.apply_changes(tree);
        self.request_render(tree, widget, true);
    }

    /// Returns the visible portion of `widget`'s own coordinate space after
    /// all ancestor clipping.
    #[must_use]
    pub fn display_rect(&self, tree: &WidgetTree, widget: WidgetId) -> Rect {
        self.clip.display_rect(tree, widget)
    }

    // -- Introspection (primarily for tests and diagnostics) --

    /// Returns whether `widget` is currently managed by this scheduler.
    #[must_use]
    pub fn is_active(&self, widget: WidgetId) -> bool {
        self.has_mark(widget, ACTIVE)
    }

    /// Returns whether `widget` is marked for repaint.
    #[must_use]
    pub fn is_dirty(&self, widget: WidgetId) -> bool {
        self.has_mark(widget, DIRTY)
    }

    /// Returns the current pending-render queue.
    #[must_use]
    pub fn pending_render_queue(&self) -> &[WidgetId] {
        &self.pending_render
    }

    /// Returns the containers currently scheduled for layout.
    #[must_use]
    pub fn pending_layout_queue(&self) -> &[WidgetId] {
        &self.pending_layout
    }

    // -- Mark helpers --

    pub(crate) fn mark(&mut self, widget: WidgetId, bits: u8) {
        let slot = widget.index() as usize;
        if self.marks.len() <= slot {
            self.marks.resize(slot + 1, 0);
        }
        self.marks[slot] |= bits;
    }

    pub(crate) fn unmark(&mut self, widget: WidgetId, bits: u8) {
        if let Some(m) = self.marks.get_mut(widget.index() as usize) {
            *m &= !bits;
        }
    }

    /// Returns whether any of `bits` is set for `widget`.
    pub(crate) fn has_mark(&self, widget: WidgetId, bits: u8) -> bool {
        self.marks
            .get(widget.index() as usize)
            .is_some_and(|m| m & bits != 0)
    }

    pub(crate) fn clear_marks(&mut self, widget: WidgetId) {
        if let Some(m) = self.marks.get_mut(widget.index() as usize) {
            *m = 0;
        }
    }

    /// Arms the deferred flush task unless one is already armed.
    pub(crate) fn schedule_flush(&mut self) {
        if !self.tasks.is_scheduled() {
            self.tasks.schedule();
        }
    }
}


#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use kurbo::{Rect, Size};

    use crate::widget::WidgetTree;

    use super::support::scheduler;
    use super::*;

    fn tree() -> WidgetTree {
        WidgetTree::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn construction_adopts_existing_children() {
        let mut tree = tree();
        let root = tree.root();
        let container = tree.create_container();
        let leaf = tree.create_leaf();
        tree.add_child(container, leaf);
        tree.add_child(root, container);
        tree.set_bounds(container, Rect::new(0.0, 0.0, 100.0, 100.0));

        let scheduler = scheduler(&mut tree);
        assert!(scheduler.is_active(container));
        assert!(scheduler.is_active(leaf));
        assert!(scheduler.hooks().attached.contains(&container));
        assert!(scheduler.hooks().attached.contains(&leaf));
    }

    #[test]
    fn invisible_children_are_parked_at_construction() {
        let mut tree = tree();
        let root = tree.root();
        let hidden = tree.create_leaf();
        tree.set_visible(hidden, false);
        tree.add_child(root, hidden);

        let scheduler = scheduler(&mut tree);
        assert!(!scheduler.is_active(hidden));
        assert!(scheduler.has_mark(hidden, AWAITING_VISIBILITY));
        assert!(scheduler.hooks().attached.is_empty());
    }

    #[test]
    fn commit_arms_the_task_queue_once() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_leaf();
        let b = tree.create_leaf();
        tree.add_child(root, a);
        tree.add_child(root, b);
        let mut scheduler = scheduler(&mut tree);
        scheduler.tasks_mut().armed = false;
        scheduler.tasks_mut().arm_count = 0;

        tree.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_bounds(b, Rect::new(20.0, 0.0, 30.0, 10.0));
        scheduler.commit(&mut tree);

        // Two invalidations coalesce into a single armed task.
        assert_eq!(scheduler.tasks().arm_count, 1);
    }

    #[test]
    fn render_requests_for_unmanaged_widgets_are_ignored() {
        let mut tree = tree();
        let loose = tree.create_leaf();
        tree.set_bounds(loose, Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut scheduler = scheduler(&mut tree);

        scheduler.render(&mut tree, loose);
        assert!(scheduler.pending_render_queue().is_empty());
    }

    #[test]
    fn default_config_bounds_layout_passes() {
        assert_eq!(SchedulerConfig::default().max_layout_passes, 64);
    }

    #[test]
    fn debug_output_names_the_queues() {
        let mut tree = tree();
        let scheduler = scheduler(&mut tree);
        let rendered = alloc::format!("{scheduler:?}");
        assert!(rendered.contains("pending_render"), "got: {rendered}");
    }

    #[test]
    fn adopted_subtree_is_queued_for_first_render() {
        let mut tree = tree();
        let root = tree.root();
        let child = tree.create_leaf();
        tree.add_child(root, child);

        let scheduler = scheduler(&mut tree);
        let queue: Vec<_> = scheduler.pending_render_queue().to_vec();
        assert!(queue.contains(&child));
        assert!(scheduler.tasks().armed);
    }
}
