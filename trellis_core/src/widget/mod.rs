// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget tree data model.
//!
//! A *widget* is a node in a retained UI tree. Each widget has:
//!
//! - An identity ([`WidgetId`]) — a generational handle that becomes stale
//!   when the widget is destroyed, preventing use-after-free bugs at the API
//!   level.
//! - A fixed [`WidgetKind`] — leaf or container. Containers hold an ordered
//!   child list and may carry a [`Layout`](crate::layout::Layout) strategy.
//! - **Properties** set by the caller: [`bounds`](WidgetTree::set_bounds),
//!   [`visible`](WidgetTree::set_visible), [`z_index`](WidgetTree::set_z_index),
//!   ideal/minimum size preferences, and the display-rect tracking flag.
//!
//! Widgets are stored in struct-of-arrays layout with index-based handles for
//! cache-friendly traversal. The tree is rooted at a display container created
//! by [`WidgetTree::new`].
//!
//! # Change records
//!
//! Mutations do not invoke callbacks. Instead, each relevant mutation appends
//! a [`ChangeRecord`] to an internal queue in mutation order. The render
//! scheduler drains the queue at commit points and translates records into
//! invalidation state, so user code never observes re-entrant notification
//! while it is still mutating the tree.

mod changes;
mod id;
mod store;
mod traverse;

pub use changes::{ChangeRecord, SizePreference};
pub use id::{INVALID, WidgetId};
pub use store::{WidgetKind, WidgetTree};
pub use traverse::Children;
