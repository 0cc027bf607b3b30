// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change records produced by tree mutation.
//!
//! Every mutating [`WidgetTree`](super::WidgetTree) operation that the
//! scheduler cares about appends a [`ChangeRecord`] to an internal queue
//! instead of invoking callbacks re-entrantly. The scheduler drains the queue
//! with [`take_changes`](super::WidgetTree::take_changes) at well-defined
//! points (commit, flush, and after each container layout), so mutation order
//! is preserved but handler execution is never nested inside a mutation.

use kurbo::Rect;

use super::id::WidgetId;

/// Which size preference of a widget changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizePreference {
    /// The widget's preferred size.
    Ideal,
    /// The widget's minimum acceptable size.
    Minimum,
}

/// A single tree mutation, in the order it occurred.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChangeRecord {
    /// A widget's bounds rectangle changed.
    BoundsChanged {
        /// The widget whose bounds changed.
        widget: WidgetId,
        /// Bounds before the change.
        old: Rect,
        /// Bounds after the change.
        new: Rect,
    },
    /// A widget's visibility flag toggled.
    VisibilityChanged {
        /// The widget whose visibility changed.
        widget: WidgetId,
    },
    /// A widget's ideal or minimum size preference changed.
    SizePreferenceChanged {
        /// The widget whose preference changed.
        widget: WidgetId,
        /// Which preference changed.
        preference: SizePreference,
    },
    /// A widget opted in to or out of display-rect tracking.
    DisplayRectTrackingChanged {
        /// The widget whose tracking flag changed.
        widget: WidgetId,
    },
    /// A child was added to a container.
    ChildAdded {
        /// The container that gained a child.
        container: WidgetId,
        /// The child that was added.
        child: WidgetId,
    },
    /// A child was removed from a container.
    ChildRemoved {
        /// The container that lost a child.
        container: WidgetId,
        /// The child that was removed.
        child: WidgetId,
    },
    /// A widget's z-index changed.
    ZIndexChanged {
        /// The widget whose z-index changed.
        widget: WidgetId,
        /// The new z-index.
        z_index: u32,
    },
}
