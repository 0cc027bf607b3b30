// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles and simple layout strategies for exercising the
//! Trellis render scheduler.
//!
//! The doubles implement the [`backend`](trellis_core::backend) traits and
//! log every call, so tests can assert on surface lifecycles, paint order,
//! and hook delivery. [`pump`] mimics a platform event loop turn: commit,
//! then flush if (and only if) the scheduler armed the task queue.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;

use trellis_core::backend::{GraphicsDevice, TaskQueue, WidgetHooks};
use trellis_core::scheduler::RenderScheduler;
use trellis_core::widget::{WidgetId, WidgetTree};

mod layouts;

pub use layouts::{FillLayout, RowLayout};

/// A scheduler wired to the recording doubles.
pub type RecordingScheduler = RenderScheduler<RecordingDevice, RecordingHooks, ManualTasks>;

/// Creates a [`RecordingScheduler`] over `tree` with fresh doubles.
pub fn recording_scheduler(tree: &mut WidgetTree) -> RecordingScheduler {
    RenderScheduler::new(
        tree,
        RecordingDevice::new(),
        RecordingHooks::new(),
        ManualTasks::new(),
    )
}

/// Runs one event-loop turn: commits `tree`'s changes, then flushes if the
/// scheduler armed its task queue. Returns whether a flush ran.
pub fn pump(scheduler: &mut RecordingScheduler, tree: &mut WidgetTree) -> bool {
    scheduler.commit(tree);
    let armed = scheduler.tasks_mut().take();
    if armed {
        scheduler.flush(tree);
    }
    armed
}

// ---------------------------------------------------------------------------
// Device double
// ---------------------------------------------------------------------------

/// One [`GraphicsDevice`] call, in call order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeviceOp {
    /// A surface was allocated for the widget.
    Acquired(WidgetId),
    /// The widget's surface was released.
    Released(WidgetId),
    /// The widget's surface was moved or resized.
    BoundsSet(WidgetId, Rect),
    /// The widget's surface was shown or hidden.
    VisibleSet(WidgetId, bool),
    /// The widget's surface was restacked.
    ZIndexSet(WidgetId, u32),
    /// A paint pass began on the widget's surface.
    RenderBegun(WidgetId),
    /// A paint pass ended on the widget's surface.
    RenderEnded(WidgetId),
}

/// Canvas double that records which widgets drew into it, in order.
#[derive(Debug, Default)]
pub struct PaintLog {
    /// Widgets in paint order.
    pub drawn: Vec<WidgetId>,
}

/// A [`GraphicsDevice`] that tracks surfaces in a `Vec` and logs every call.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    surfaces: Vec<WidgetId>,
    canvas: PaintLog,
    /// Every device call, in order.
    pub ops: Vec<DeviceOp>,
}

impl RecordingDevice {
    /// Creates an empty device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared canvas log.
    #[must_use]
    pub fn paint_log(&self) -> &PaintLog {
        &self.canvas
    }

    /// Returns how many surfaces currently exist.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns how many times `widget`'s surface was released.
    #[must_use]
    pub fn release_count(&self, widget: WidgetId) -> usize {
        self.ops
            .iter()
            .filter(|op| **op == DeviceOp::Released(widget))
            .count()
    }
}

impl GraphicsDevice for RecordingDevice {
    type Canvas = PaintLog;

    fn acquire(&mut self, widget: WidgetId) -> bool {
        if !self.surfaces.contains(&widget) {
            self.surfaces.push(widget);
            self.ops.push(DeviceOp::Acquired(widget));
        }
        true
    }

    fn has_surface(&self, widget: WidgetId) -> bool {
        self.surfaces.contains(&widget)
    }

    fn release(&mut self, widget: WidgetId) {
        if self.surfaces.contains(&widget) {
            self.surfaces.retain(|&w| w != widget);
            self.ops.push(DeviceOp::Released(widget));
        }
    }

    fn set_bounds(&mut self, widget: WidgetId, bounds: Rect) {
        self.ops.push(DeviceOp::BoundsSet(widget, bounds));
    }

    fn set_visible(&mut self, widget: WidgetId, visible: bool) {
        self.ops.push(DeviceOp::VisibleSet(widget, visible));
    }

    fn set_z_index(&mut self, widget: WidgetId, z_index: u32) {
        self.ops.push(DeviceOp::ZIndexSet(widget, z_index));
    }

    fn begin_render(&mut self, widget: WidgetId) {
        self.ops.push(DeviceOp::RenderBegun(widget));
    }

    fn end_render(&mut self, widget: WidgetId) {
        self.ops.push(DeviceOp::RenderEnded(widget));
    }

    fn canvas(&mut self, _widget: WidgetId) -> &mut PaintLog {
        &mut self.canvas
    }
}

// ---------------------------------------------------------------------------
// Hooks double
// ---------------------------------------------------------------------------

/// One [`WidgetHooks`] callback, in delivery order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookEvent {
    /// The widget joined the managed set.
    Attached(WidgetId),
    /// The widget left the managed set.
    Detached(WidgetId),
    /// The widget was asked to revalidate.
    Revalidated(WidgetId),
    /// The widget's visible region changed.
    DisplayRectChanged(WidgetId, Rect, Rect),
}

/// A [`WidgetHooks`] that logs every callback and paints into the shared
/// [`PaintLog`].
#[derive(Debug, Default)]
pub struct RecordingHooks {
    /// Every delivered callback, in order.
    pub events: Vec<HookEvent>,
}

impl RecordingHooks {
    /// Creates an empty hooks double.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times `widget` was detached.
    #[must_use]
    pub fn detach_count(&self, widget: WidgetId) -> usize {
        self.events
            .iter()
            .filter(|event| **event == HookEvent::Detached(widget))
            .count()
    }

    /// Returns the display-rect notifications delivered to `widget`.
    #[must_use]
    pub fn display_rects_for(&self, widget: WidgetId) -> Vec<(Rect, Rect)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                HookEvent::DisplayRectChanged(w, old, new) if w == widget => Some((old, new)),
                _ => None,
            })
            .collect()
    }
}

impl WidgetHooks for RecordingHooks {
    type Canvas = PaintLog;

    fn attached(&mut self, widget: WidgetId) {
        self.events.push(HookEvent::Attached(widget));
    }

    fn detached(&mut self, widget: WidgetId) {
        self.events.push(HookEvent::Detached(widget));
    }

    fn draw(&mut self, widget: WidgetId, canvas: &mut PaintLog) {
        canvas.drawn.push(widget);
    }

    fn display_rect_changed(&mut self, widget: WidgetId, old: Rect, new: Rect) {
        self.events
            .push(HookEvent::DisplayRectChanged(widget, old, new));
    }

    fn revalidate(&mut self, widget: WidgetId) {
        self.events.push(HookEvent::Revalidated(widget));
    }
}

// ---------------------------------------------------------------------------
// Task queue double
// ---------------------------------------------------------------------------

/// A [`TaskQueue`] that must be pumped by hand.
#[derive(Debug, Default)]
pub struct ManualTasks {
    armed: bool,
    /// How many times a flush task was armed.
    pub arm_count: u32,
}

impl ManualTasks {
    /// Creates an unarmed queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the armed state, returning whether a task was pending.
    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.armed)
    }
}

impl TaskQueue for ManualTasks {
    fn schedule(&mut self) {
        self.armed = true;
        self.arm_count += 1;
    }

    fn is_scheduled(&self) -> bool {
        self.armed
    }
}
