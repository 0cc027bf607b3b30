// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Translation of tree change records into invalidation state.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::backend::{GraphicsDevice, TaskQueue, WidgetHooks};
use crate::clip::rect_is_empty;
use crate::widget::{ChangeRecord, SizePreference, WidgetId, WidgetTree};

use super::{
    ACTIVE, AWAITING_VISIBILITY, CleanupEntry, DIRTY, NEVER_RENDERED, PENDING_BOUNDS,
    RenderScheduler, VISIBILITY_CHANGED,
};

impl<D, H, T> RenderScheduler<D, H, T>
where
    D: GraphicsDevice,
    H: WidgetHooks<Canvas = D::Canvas>,
    T: TaskQueue,
{
    /// Drains and applies change records until the queue is empty.
    ///
    /// Handlers may mutate the tree (the root's layout runs inline when one
    /// of its direct children changes), producing further records; the loop
    /// keeps draining until the tree settles.
    pub(crate) fn apply_changes(&mut self, tree: &mut WidgetTree) {
        loop {
            let batch = tree.take_changes();
            if batch.is_empty() {
                return;
            }
            for record in batch {
                self.apply_change(tree, record);
            }
        }
    }

    fn apply_change(&mut self, tree: &mut WidgetTree, record: ChangeRecord) {
        match record {
            ChangeRecord::BoundsChanged { widget, old, new } => {
                self.bounds_changed(tree, widget, old, new);
            }
            ChangeRecord::VisibilityChanged { widget } => {
                self.visibility_changed(tree, widget);
            }
            ChangeRecord::SizePreferenceChanged { widget, preference } => {
                self.size_preference_changed(tree, widget, preference);
            }
            ChangeRecord::DisplayRectTrackingChanged { widget } => {
                if !self.has_mark(widget, ACTIVE) {
                    return;
                }
                if tree.tracks_display_rect(widget) {
                    self.clip.register(tree, widget);
                } else {
                    self.clip.unregister(tree, widget);
                }
            }
            ChangeRecord::ChildAdded { container, child } => {
                self.child_added(tree, container, child);
            }
            ChangeRecord::ChildRemoved { container, child } => {
                self.child_removed(tree, container, child);
            }
            ChangeRecord::ZIndexChanged { widget, z_index } => {
                if !self.has_mark(widget, ACTIVE) {
                    return;
                }
                // Surfaces are allocated lazily; a widget that has not
                // rendered yet picks its z-index up on first render.
                if self.device.has_surface(widget) {
                    self.device.set_z_index(widget, z_index);
                }
            }
        }
    }

    fn bounds_changed(&mut self, tree: &mut WidgetTree, widget: WidgetId, old: Rect, new: Rect) {
        if widget == tree.root() {
            // Display resize: lay the top level out again and recheck what
            // each tracked subtree can see. The recheck starts at the root's
            // own node so its cached clip picks up the new display size.
            tree.run_layout(widget);
            self.check_display_rect(tree, widget);
            return;
        }
        if !self.has_mark(widget, ACTIVE) || !tree.visible(widget) {
            return;
        }
        let Some(parent) = tree.parent(widget) else {
            return;
        };

        self.mark(widget, PENDING_BOUNDS);
        let resized = old.size() != new.size();
        if resized && tree.is_container(widget) {
            self.schedule_layout(widget);
        }

        if parent == tree.root() {
            // Widgets sitting directly on the display re-run the root layout
            // inline so top-level geometry settles within this commit.
            tree.run_layout(parent);
        } else {
            self.schedule_layout(parent);
        }

        if resized {
            // A collapse to empty bounds must still reach the surface, so
            // the request bypasses the empty-bounds filter.
            self.request_render(tree, widget, true);
        }
        // A pure move needs no repaint, only a geometry sync.
        self.schedule_flush();
        self.check_display_rect(tree, widget);
    }

    fn visibility_changed(&mut self, tree: &mut WidgetTree, widget: WidgetId) {
        if self.has_mark(widget, AWAITING_VISIBILITY) && tree.visible(widget) {
            // Parked on add; joins the managed set on first show.
            self.unmark(widget, AWAITING_VISIBILITY);
            self.record_widget(tree, widget);
            self.hooks.revalidate(widget);
        }
        if !self.has_mark(widget, ACTIVE) {
            return;
        }
        let Some(parent) = tree.parent(widget) else {
            return;
        };

        if parent == tree.root() {
            if tree.visible(widget) {
                self.mark(widget, VISIBILITY_CHANGED | PENDING_BOUNDS);
                self.request_render(tree, widget, false);
            } else {
                // Hiding a top-level widget needs no repaint and no pending
                // geometry sync.
                if self.device.has_surface(widget) {
                    self.device.set_visible(widget, false);
                }
                self.unmark(widget, PENDING_BOUNDS);
            }
        } else {
            self.schedule_layout(parent);
            self.schedule_flush();
            if tree.visible(widget) {
                self.mark(widget, PENDING_BOUNDS);
            }
            self.mark(widget, VISIBILITY_CHANGED);
            self.request_render(tree, parent, false);
        }
        self.check_display_rect(tree, widget);
    }

    fn size_preference_changed(
        &mut self,
        tree: &mut WidgetTree,
        widget: WidgetId,
        preference: SizePreference,
    ) {
        if !self.has_mark(widget, ACTIVE) || !tree.visible(widget) {
            return;
        }
        let Some(parent) = tree.parent(widget) else {
            return;
        };
        let relevant = match preference {
            SizePreference::Ideal => tree.layout_uses_ideal_size(parent),
            SizePreference::Minimum => tree.layout_uses_min_size(parent),
        };
        if !relevant {
            return;
        }
        if parent == tree.root() {
            tree.run_layout(parent);
        } else {
            self.schedule_layout(parent);
            self.schedule_flush();
        }
    }

    fn child_added(&mut self, tree: &mut WidgetTree, container: WidgetId, child: WidgetId) {
        if container != tree.root() && !self.has_mark(container, ACTIVE) {
            // Mutation inside an unmanaged subtree; picked up if and when
            // that subtree is attached.
            return;
        }
        self.cancel_cleanup(tree, container, child);
        if tree.visible(child) {
            self.record_widget(tree, child);
            self.hooks.revalidate(child);
        } else {
            self.mark(child, AWAITING_VISIBILITY);
        }
        if tree.parent(container).is_some() {
            self.hooks.revalidate(container);
        } else {
            tree.run_layout(container);
        }
    }

    fn child_removed(&mut self, tree: &WidgetTree, container: WidgetId, child: WidgetId) {
        if container != tree.root() && !self.has_mark(container, ACTIVE) {
            return;
        }
        if container != tree.root() && tree.is_attached(container) {
            // The container will repaint the vacated region; defer the
            // release so the child's surface survives until then.
            self.defer_cleanup(container, child);
        } else {
            self.release_resources(tree, child);
        }
    }

    /// Brings `widget` (and, for containers, its current subtree) into the
    /// managed set.
    pub(crate) fn record_widget(&mut self, tree: &WidgetTree, widget: WidgetId) {
        if self.has_mark(widget, ACTIVE) {
            return;
        }
        self.hooks.attached(widget);
        self.mark(widget, ACTIVE | DIRTY | NEVER_RENDERED | PENDING_BOUNDS);
        if tree.is_container(widget) {
            let kids: Vec<WidgetId> = tree.children(widget).collect();
            if !kids.is_empty() {
                self.schedule_layout(widget);
            }
            for child in kids {
                self.record_widget(tree, child);
            }
        }
        if tree.tracks_display_rect(widget) {
            self.clip.register(tree, widget);
            let new = self.clip.display_rect(tree, widget);
            if new != Rect::ZERO {
                self.hooks.display_rect_changed(widget, Rect::ZERO, new);
            }
        }
        if tree.is_attached(widget) {
            self.request_render(tree, widget, true);
        }
    }

    /// Releases all scheduler and device state of `widget` and its subtree,
    /// including children still parked in its deferred-cleanup entry.
    pub(crate) fn release_resources(&mut self, tree: &WidgetTree, widget: WidgetId) {
        if !self.has_mark(widget, ACTIVE) {
            // Parked widgets were never attached; just unpark.
            self.unmark(widget, AWAITING_VISIBILITY);
            return;
        }
        self.hooks.detached(widget);

        if let Some(pos) = self
            .pending_cleanup
            .iter()
            .position(|entry| entry.container == widget)
        {
            let entry = self.pending_cleanup.remove(pos);
            for child in entry.children {
                self.release_resources(tree, child);
            }
        }
        let kids: Vec<WidgetId> = tree.children(widget).collect();
        for child in kids {
            self.release_resources(tree, child);
        }

        self.clear_marks(widget);
        self.pending_layout.retain(|&c| c != widget);
        self.pending_render.retain(|&c| c != widget);
        for entry in &mut self.pending_cleanup {
            entry.children.retain(|&c| c != widget);
        }
        self.pending_cleanup.retain(|entry| !entry.children.is_empty());

        self.device.release(widget);
        self.clip.unregister(tree, widget);
    }

    /// Adds `widget` to the pending-render queue, maintaining the antichain.
    ///
    /// No-ops for widgets that are unmanaged, detached, or (unless
    /// `ignore_empty_bounds`) have empty bounds. Arms the flush task when the
    /// queue actually changes.
    pub(crate) fn request_render(
        &mut self,
        tree: &WidgetTree,
        widget: WidgetId,
        ignore_empty_bounds: bool,
    ) {
        if !self.has_mark(widget, ACTIVE) || !tree.is_attached(widget) {
            return;
        }
        if !ignore_empty_bounds && rect_is_empty(tree.bounds(widget)) {
            return;
        }
        self.mark(widget, DIRTY);

        let mut i = 0;
        while i < self.pending_render.len() {
            let queued = self.pending_render[i];
            if queued == widget || tree.is_ancestor_of(queued, widget) {
                // Already covered by a queued entry.
                return;
            }
            if tree.is_ancestor_of(widget, queued) {
                // The new entry subsumes this one.
                self.pending_render.remove(i);
                continue;
            }
            i += 1;
        }
        self.pending_render.push(widget);
        self.schedule_flush();
    }

    /// Schedules `container` for the layout stage of the next flush.
    ///
    /// Skipped while that same container is mid-layout, so a layout that
    /// resizes its own children does not reschedule itself.
    pub(crate) fn schedule_layout(&mut self, container: WidgetId) {
        if self.laying_out == Some(container) {
            return;
        }
        if !self.pending_layout.contains(&container) {
            self.pending_layout.push(container);
        }
    }

    /// Re-derives clip rectangles below `widget` and notifies opted-in
    /// widgets whose display rect changed.
    pub(crate) fn check_display_rect(&mut self, tree: &WidgetTree, widget: WidgetId) {
        for (changed, old, new) in self.clip.check_change(tree, widget) {
            self.hooks.display_rect_changed(changed, old, new);
        }
    }

    /// Removes `child` from any deferred-cleanup entry because it was added
    /// to `new_parent`. Re-adding under the original container cancels the
    /// release entirely; moving to a different container forces the old
    /// binding's release now so the child attaches fresh.
    fn cancel_cleanup(&mut self, tree: &WidgetTree, new_parent: WidgetId, child: WidgetId) {
        for i in 0..self.pending_cleanup.len() {
            let Some(pos) = self.pending_cleanup[i]
                .children
                .iter()
                .position(|&c| c == child)
            else {
                continue;
            };
            let old_parent = self.pending_cleanup[i].container;
            self.pending_cleanup[i].children.remove(pos);
            if self.pending_cleanup[i].children.is_empty() {
                self.pending_cleanup.remove(i);
            }
            if old_parent != new_parent {
                self.release_resources(tree, child);
            }
            return;
        }
    }

    fn defer_cleanup(&mut self, container: WidgetId, child: WidgetId) {
        if let Some(entry) = self
            .pending_cleanup
            .iter_mut()
            .find(|entry| entry.container == container)
        {
            if !entry.children.contains(&child) {
                entry.children.push(child);
            }
        } else {
            self.pending_cleanup.push(CleanupEntry {
                container,
                children: vec![child],
            });
        }
    }

    /// Releases every child parked in `container`'s cleanup entry. Called
    /// when `container` renders.
    pub(crate) fn drain_cleanup(&mut self, tree: &WidgetTree, container: WidgetId) {
        if let Some(pos) = self
            .pending_cleanup
            .iter()
            .position(|entry| entry.container == container)
        {
            let entry = self.pending_cleanup.remove(pos);
            for child in entry.children {
                self.release_resources(tree, child);
            }
        }
    }
}
