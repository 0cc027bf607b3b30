// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flush driver: layout fixed point, render walk, geometry sync.

use alloc::vec::Vec;

use crate::backend::{GraphicsDevice, TaskQueue, WidgetHooks};
use crate::clip::rect_is_empty;
use crate::trace::{FlushBeginEvent, FlushEndEvent, LayoutPassEvent, Tracer};
use crate::widget::{WidgetId, WidgetTree};

use super::{DIRTY, NEVER_RENDERED, PENDING_BOUNDS, RenderScheduler, VISIBILITY_CHANGED};

impl<D, H, T> RenderScheduler<D, H, T>
where
    D: GraphicsDevice,
    H: WidgetHooks<Canvas = D::Canvas>,
    T: TaskQueue,
{
    /// Performs all deferred work: the platform's armed flush task calls
    /// this.
    ///
    /// Runs three stages after committing queued changes:
    ///
    /// 1. **Layout fixed point** — lays out every scheduled container,
    ///    applies the changes those layouts produced, and repeats until no
    ///    container is scheduled, bounded by
    ///    [`SchedulerConfig::max_layout_passes`](super::SchedulerConfig::max_layout_passes).
    /// 2. **Render walk** — renders each queued widget top-down through its
    ///    subtree in reverse z order.
    /// 3. **Geometry sync** — pushes pending bounds of widgets that moved
    ///    without repainting to their surfaces.
    ///
    /// # Panics
    ///
    /// Panics if the layout stage fails to settle within the configured
    /// bound, which indicates mutually re-invalidating layout strategies.
    pub fn flush(&mut self, tree: &mut WidgetTree) {
        let mut tracer = Tracer::none();
        self.flush_traced(tree, &mut tracer);
    }

    /// Like [`flush`](Self::flush), reporting per-stage events to `tracer`.
    pub fn flush_traced(&mut self, tree: &mut WidgetTree, tracer: &mut Tracer<'_>) {
        self.apply_changes(tree);
        tracer.flush_begin(&FlushBeginEvent {
            pending_layout: self.pending_layout.len(),
            pending_render: self.pending_render.len(),
        });

        let mut pass: u32 = 0;
        while !self.pending_layout.is_empty() {
            pass += 1;
            assert!(
                pass <= self.config.max_layout_passes,
                "layout did not settle after {} passes; layout strategies keep re-invalidating each other",
                self.config.max_layout_passes
            );
            let batch = core::mem::take(&mut self.pending_layout);
            let containers = batch.len();
            for container in batch {
                self.perform_layout(tree, container);
            }
            self.laying_out = None;
            tracer.layout_pass(&LayoutPassEvent { pass, containers });
        }

        let queue: Vec<WidgetId> = self.pending_render.clone();
        let mut painted = 0;
        for widget in queue {
            // Entries can be drained by an earlier subtree walk or released
            // by cleanup run from it.
            if self.pending_render.contains(&widget) && tree.is_attached(widget) {
                painted += self.perform_render(tree, widget);
            }
        }

        let synced = self.sync_pending_bounds(tree);
        tracer.flush_end(&FlushEndEvent { painted, synced });
    }

    /// Repaints `widget` synchronously, bypassing the task queue.
    ///
    /// Commits queued changes, runs the widget's own pending layout if any,
    /// and paints. When the widget's container is itself dirty or has never
    /// rendered, the container is rendered instead (which covers the widget).
    pub fn render_now(&mut self, tree: &mut WidgetTree, widget: WidgetId) {
        self.apply_changes(tree);
        self.render_widget_now(tree, widget);
    }

    /// Lays out `container` synchronously, bypassing the task queue.
    ///
    /// Ignored for leaves, unmanaged or detached containers, containers with
    /// empty bounds, and while that container is already mid-layout.
    pub fn layout_now(&mut self, tree: &mut WidgetTree, container: WidgetId) {
        self.apply_changes(tree);
        if self.laying_out == Some(container) || !tree.is_container(container) {
            return;
        }
        let managed = container == tree.root() || self.is_active(container);
        if !managed || !tree.is_attached(container) || rect_is_empty(tree.bounds(container)) {
            return;
        }
        self.pending_layout.retain(|&c| c != container);
        self.perform_layout(tree, container);
        self.laying_out = None;
    }

    fn render_widget_now(&mut self, tree: &mut WidgetTree, widget: WidgetId) {
        if !self.is_active(widget)
            || !tree.is_attached(widget)
            || rect_is_empty(tree.bounds(widget))
        {
            return;
        }
        self.mark(widget, DIRTY);

        if self.pending_layout.contains(&widget) {
            self.pending_layout.retain(|&c| c != widget);
            self.perform_layout(tree, widget);
            self.laying_out = None;
        }

        // A dirty or never-rendered container repaints this widget anyway.
        if let Some(parent) = tree.parent(widget) {
            if self.has_mark(parent, DIRTY | NEVER_RENDERED) {
                self.render_widget_now(tree, parent);
                return;
            }
        }
        let _ = self.perform_render(tree, widget);
    }

    /// Runs one container layout and folds the resulting changes back in,
    /// with the reentrancy marker set so the layout cannot reschedule its own
    /// container.
    pub(crate) fn perform_layout(&mut self, tree: &mut WidgetTree, container: WidgetId) {
        if !tree.is_alive(container) {
            return;
        }
        self.laying_out = Some(container);
        tree.run_layout(container);
        self.apply_changes(tree);
    }

    /// Renders `widget` and its subtree. Returns how many widgets painted.
    fn perform_render(&mut self, tree: &WidgetTree, widget: WidgetId) -> usize {
        self.pending_render.retain(|&w| w != widget);
        self.unmark(widget, NEVER_RENDERED);

        let visibility_changed = self.has_mark(widget, VISIBILITY_CHANGED);
        if !(tree.recursively_visible(widget) || visibility_changed) {
            return 0;
        }
        let first_bind = !self.device.has_surface(widget);
        if !self.device.acquire(widget) {
            return 0;
        }
        if first_bind {
            // A freshly bound surface starts unstacked.
            self.device.set_z_index(widget, tree.z_index(widget));
        }

        if self.has_mark(widget, PENDING_BOUNDS) {
            self.device.set_bounds(widget, tree.bounds(widget));
            self.unmark(widget, PENDING_BOUNDS);
            self.check_display_rect(tree, widget);
        }
        if visibility_changed {
            self.device.set_visible(widget, tree.visible(widget));
            self.unmark(widget, VISIBILITY_CHANGED);
        }

        let mut painted = 0;
        if tree.recursively_visible(widget) && !rect_is_empty(tree.bounds(widget)) {
            // Children removed earlier survive until this repaint.
            self.drain_cleanup(tree, widget);

            if self.has_mark(widget, DIRTY) {
                self.unmark(widget, DIRTY);
                self.device.begin_render(widget);
                {
                    let Self { device, hooks, .. } = self;
                    hooks.draw(widget, device.canvas(widget));
                }
                self.device.end_render(widget);
                painted += 1;
            }

            if tree.is_container(widget) {
                let kids = tree.children_by_z(widget);
                for &child in kids.iter().rev() {
                    painted += self.perform_render(tree, child);
                }
            }
        }
        painted
    }

    /// Pushes pending bounds of widgets that did not repaint to their
    /// surfaces. Returns how many surfaces were synced.
    fn sync_pending_bounds(&mut self, tree: &WidgetTree) -> usize {
        let mut synced = 0;
        for widget in tree.live_widgets() {
            if !self.has_mark(widget, PENDING_BOUNDS) || self.has_mark(widget, NEVER_RENDERED) {
                continue;
            }
            if !self.device.has_surface(widget) {
                continue;
            }
            self.device.set_bounds(widget, tree.bounds(widget));
            self.unmark(widget, PENDING_BOUNDS);
            self.check_display_rect(tree, widget);
            synced += 1;
        }
        synced
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use kurbo::{Rect, Size};

    use crate::backend::GraphicsDevice;
    use crate::layout::Layout;
    use crate::widget::{WidgetId, WidgetTree};

    use super::super::support::{StubScheduler, scheduler};

    fn tree() -> WidgetTree {
        WidgetTree::new(Size::new(800.0, 600.0))
    }

    /// Root -> container -> {low at z 0, high at z 1}, flushed once.
    fn stacked(tree: &mut WidgetTree) -> (StubScheduler, WidgetId, WidgetId, WidgetId) {
        let root = tree.root();
        let container = tree.create_container();
        let low = tree.create_leaf();
        let high = tree.create_leaf();
        tree.add_child(root, container);
        tree.add_child(container, low);
        tree.add_child(container, high);
        tree.set_bounds(container, Rect::new(0.0, 0.0, 200.0, 200.0));
        tree.set_bounds(low, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_bounds(high, Rect::new(50.0, 50.0, 150.0, 150.0));
        tree.set_z_index(high, 1);
        let mut scheduler = scheduler(tree);
        scheduler.flush(tree);
        (scheduler, container, low, high)
    }

    #[test]
    fn render_walk_descends_in_reverse_z_order() {
        let mut tree = tree();
        let (scheduler, container, low, high) = stacked(&mut tree);
        assert_eq!(
            scheduler.device().canvas.drawn,
            alloc::vec![container, high, low]
        );
    }

    #[test]
    fn flush_is_idempotent() {
        let mut tree = tree();
        let (mut scheduler, ..) = stacked(&mut tree);
        let painted_once = scheduler.device().canvas.drawn.len();

        scheduler.flush(&mut tree);
        scheduler.flush(&mut tree);
        assert_eq!(scheduler.device().canvas.drawn.len(), painted_once);
        assert!(scheduler.pending_render_queue().is_empty());
    }

    #[test]
    fn pure_move_syncs_geometry_without_repaint() {
        let mut tree = tree();
        let (mut scheduler, _, low, _) = stacked(&mut tree);
        let painted_once = scheduler.device().canvas.drawn.len();

        tree.set_bounds(low, Rect::new(10.0, 10.0, 110.0, 110.0));
        scheduler.commit(&mut tree);
        assert!(scheduler.pending_render_queue().is_empty());

        scheduler.flush(&mut tree);
        assert_eq!(scheduler.device().canvas.drawn.len(), painted_once);
        assert!(
            scheduler
                .device()
                .bounds_set
                .contains(&(low, Rect::new(10.0, 10.0, 110.0, 110.0)))
        );
    }

    #[test]
    fn hiding_nested_widget_syncs_surface_visibility() {
        let mut tree = tree();
        let (mut scheduler, _, low, _) = stacked(&mut tree);

        tree.set_visible(low, false);
        scheduler.commit(&mut tree);
        scheduler.flush(&mut tree);

        assert!(scheduler.device().visible_set.contains(&(low, false)));
        // The hidden widget's surface survives; only its visibility changed.
        assert!(scheduler.device().has_surface(low));
    }

    #[test]
    fn resize_schedules_container_layout_and_repaint() {
        struct Fill;
        impl Layout for Fill {
            fn run(&mut self, container: WidgetId, tree: &mut WidgetTree) {
                let size = tree.size(container);
                let kids: Vec<WidgetId> = tree.children(container).collect();
                for child in kids {
                    tree.set_bounds(child, Rect::from_origin_size((0.0, 0.0), size));
                }
            }
        }

        let mut tree = tree();
        let root = tree.root();
        let outer = tree.create_container();
        let inner = tree.create_container();
        let leaf = tree.create_leaf();
        tree.add_child(root, outer);
        tree.add_child(outer, inner);
        tree.add_child(inner, leaf);
        tree.set_bounds(outer, Rect::new(0.0, 0.0, 300.0, 300.0));
        tree.set_bounds(inner, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_layout(inner, Some(Box::new(Fill)));
        let mut scheduler = scheduler(&mut tree);
        scheduler.flush(&mut tree);

        tree.set_bounds(inner, Rect::new(0.0, 0.0, 150.0, 150.0));
        scheduler.commit(&mut tree);
        scheduler.flush(&mut tree);

        // The layout ran against the new size and the child repainted.
        assert_eq!(tree.bounds(leaf), Rect::new(0.0, 0.0, 150.0, 150.0));
        assert!(scheduler.pending_layout_queue().is_empty());
    }

    #[test]
    fn render_now_paints_synchronously() {
        let mut tree = tree();
        let (mut scheduler, _, low, _) = stacked(&mut tree);
        let painted_once = scheduler.device().canvas.drawn.len();

        scheduler.render_now(&mut tree, low);
        assert_eq!(scheduler.device().canvas.drawn.len(), painted_once + 1);
        assert_eq!(scheduler.device().canvas.drawn.last(), Some(&low));
    }

    #[test]
    fn render_now_escalates_to_dirty_container() {
        let mut tree = tree();
        let (mut scheduler, container, low, _) = stacked(&mut tree);

        scheduler.render(&mut tree, container);
        scheduler.render_now(&mut tree, low);

        // The container covered the widget; nothing remains queued.
        assert!(scheduler.pending_render_queue().is_empty());
        assert!(scheduler.device().canvas.drawn.ends_with(&[container, low]));
    }

    #[test]
    fn layout_now_runs_synchronously() {
        struct Pin;
        impl Layout for Pin {
            fn run(&mut self, container: WidgetId, tree: &mut WidgetTree) {
                let kids: Vec<WidgetId> = tree.children(container).collect();
                for child in kids {
                    tree.set_bounds(child, Rect::new(7.0, 7.0, 17.0, 17.0));
                }
            }
        }

        let mut tree = tree();
        let (mut scheduler, container, low, _) = stacked(&mut tree);
        tree.set_layout(container, Some(Box::new(Pin)));

        scheduler.layout_now(&mut tree, container);
        assert_eq!(tree.bounds(low), Rect::new(7.0, 7.0, 17.0, 17.0));
    }

    #[test]
    #[should_panic(expected = "layout did not settle")]
    fn feuding_layouts_hit_the_pass_bound() {
        /// Widens a sibling on every run, so two of these keep re-triggering
        /// each other's layout forever.
        struct Feud {
            other: WidgetId,
        }
        impl Layout for Feud {
            fn run(&mut self, _container: WidgetId, tree: &mut WidgetTree) {
                let b = tree.bounds(self.other);
                tree.set_bounds(self.other, Rect::new(b.x0, b.y0, b.x1 + 1.0, b.y1));
            }
        }

        let mut tree = tree();
        let root = tree.root();
        let outer = tree.create_container();
        let c1 = tree.create_container();
        let c2 = tree.create_container();
        tree.add_child(root, outer);
        tree.add_child(outer, c1);
        tree.add_child(outer, c2);
        tree.set_bounds(outer, Rect::new(0.0, 0.0, 500.0, 500.0));
        tree.set_bounds(c1, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_bounds(c2, Rect::new(0.0, 200.0, 100.0, 300.0));
        let mut scheduler = scheduler(&mut tree);
        scheduler.flush(&mut tree);

        tree.set_layout(c1, Some(Box::new(Feud { other: c2 })));
        tree.set_layout(c2, Some(Box::new(Feud { other: c1 })));
        tree.set_bounds(c1, Rect::new(0.0, 0.0, 101.0, 100.0));
        scheduler.commit(&mut tree);
        scheduler.flush(&mut tree);
    }
}
