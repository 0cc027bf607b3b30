// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform integrations.
//!
//! Trellis splits platform-specific work into *backend* crates. Each backend
//! provides the following pieces:
//!
//! - **Graphics device** — Implements [`GraphicsDevice`] to manage one render
//!   surface per on-screen widget (e.g. an OS window region, a canvas
//!   element, a compositor layer) and hand out the canvas the widget paints
//!   into.
//!
//! - **Task queue** — Implements [`TaskQueue`] to defer work to the
//!   platform's event loop. The scheduler coalesces any number of
//!   invalidations into at most one pending flush task at a time.
//!
//! - **Widget hooks** — Implemented by the widget layer above the scheduler
//!   via [`WidgetHooks`], delivering lifecycle and paint callbacks to the
//!   application's widgets.
//!
//! # Crate boundaries
//!
//! `trellis_core` owns the tree model, invalidation engine, flush driver, and
//! this contract module. Backend crates depend on `trellis_core` and provide
//! platform glue. Application code depends on both and wires them together in
//! an event loop.
//!
//! # Event loop pseudocode
//!
//! A typical integration pumps the scheduler like this:
//!
//! ```rust,ignore
//! fn on_event(event: Event) {
//!     // Mutate the tree in response to the event.
//!     tree.set_bounds(widget, new_bounds);
//!
//!     // Fold the mutations into scheduler state. This may arm the task
//!     // queue; it never paints.
//!     scheduler.commit(&mut tree);
//! }
//!
//! fn on_flush_task() {
//!     // The single deferred task: layout to a fixed point, walk the
//!     // pending-render queue, sync surface geometry.
//!     scheduler.flush(&mut tree);
//! }
//! ```

use kurbo::Rect;

use crate::widget::WidgetId;

/// Manages render surfaces and canvases for on-screen widgets.
///
/// Surfaces are allocated lazily: the scheduler calls [`acquire`] only when a
/// widget first actually renders, so widgets that stay invisible never get
/// one.
///
/// [`acquire`]: Self::acquire
pub trait GraphicsDevice {
    /// The canvas type widgets paint into.
    type Canvas;

    /// Ensures `widget` has a surface, allocating one if needed.
    ///
    /// Returns `false` if the platform cannot provide a surface, in which
    /// case the scheduler skips the widget for this flush.
    fn acquire(&mut self, widget: WidgetId) -> bool;

    /// Returns whether `widget` currently has a surface.
    fn has_surface(&self, widget: WidgetId) -> bool;

    /// Releases `widget`'s surface, if it has one.
    fn release(&mut self, widget: WidgetId);

    /// Moves and sizes `widget`'s surface.
    fn set_bounds(&mut self, widget: WidgetId, bounds: Rect);

    /// Shows or hides `widget`'s surface.
    fn set_visible(&mut self, widget: WidgetId, visible: bool);

    /// Restacks `widget`'s surface.
    fn set_z_index(&mut self, widget: WidgetId, z_index: u32);

    /// Begins a paint pass on `widget`'s surface.
    fn begin_render(&mut self, widget: WidgetId);

    /// Ends the paint pass started by [`begin_render`](Self::begin_render).
    fn end_render(&mut self, widget: WidgetId);

    /// Returns the canvas for `widget`'s surface.
    ///
    /// Only called between [`begin_render`](Self::begin_render) and
    /// [`end_render`](Self::end_render).
    fn canvas(&mut self, widget: WidgetId) -> &mut Self::Canvas;
}

/// Lifecycle and paint callbacks delivered to the widget layer.
///
/// The scheduler never calls these while a tree mutation is still being
/// applied; they run from [`commit`](crate::scheduler::RenderScheduler::commit)
/// or [`flush`](crate::scheduler::RenderScheduler::flush).
pub trait WidgetHooks {
    /// The canvas type widgets paint into. Must match the device's.
    type Canvas;

    /// `widget` is now managed by the scheduler.
    fn attached(&mut self, widget: WidgetId);

    /// `widget` is no longer managed; its render resources are released.
    fn detached(&mut self, widget: WidgetId);

    /// Paints `widget` onto `canvas`.
    fn draw(&mut self, widget: WidgetId, canvas: &mut Self::Canvas);

    /// The visible portion of `widget`'s own coordinate space changed.
    ///
    /// Only delivered to widgets that opted in via
    /// [`set_tracks_display_rect`](crate::widget::WidgetTree::set_tracks_display_rect).
    fn display_rect_changed(&mut self, widget: WidgetId, old: Rect, new: Rect);

    /// `widget` should revalidate cached presentation state.
    ///
    /// Delivered when a widget or its container joins the managed tree.
    fn revalidate(&mut self, widget: WidgetId);
}

/// Defers a single coalesced flush to the platform's event loop.
///
/// The scheduler calls [`schedule`](Self::schedule) at most once per pending
/// flush: further invalidations while a task is armed are absorbed into the
/// same flush. The platform must eventually run the task by calling
/// [`RenderScheduler::flush`](crate::scheduler::RenderScheduler::flush) and
/// then clear its armed state.
pub trait TaskQueue {
    /// Arms the deferred flush task.
    fn schedule(&mut self);

    /// Returns whether a flush task is currently armed.
    fn is_scheduled(&self) -> bool;
}
