// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout strategies for containers.

use crate::widget::{WidgetId, WidgetTree};

/// Positions the children of a container.
///
/// A strategy is installed per container via
/// [`WidgetTree::set_layout`] and invoked by the scheduler whenever the
/// container needs laying out. Implementations read child properties and call
/// [`WidgetTree::set_bounds`] on them; the resulting change records feed back
/// into scheduling, so a layout that resizes children triggers the follow-up
/// work (child layouts, repaints) automatically.
///
/// During [`WidgetTree::run_layout`] the strategy is moved out of the tree,
/// which makes re-entrant layout of the same container a no-op.
pub trait Layout {
    /// Positions the children of `container`.
    fn run(&mut self, container: WidgetId, tree: &mut WidgetTree);

    /// Whether this strategy reads child ideal sizes.
    ///
    /// When `false` (the default), changes to a child's ideal size do not
    /// schedule this container for layout.
    fn uses_ideal_size(&self) -> bool {
        false
    }

    /// Whether this strategy reads child minimum sizes.
    ///
    /// When `false` (the default), changes to a child's minimum size do not
    /// schedule this container for layout.
    fn uses_min_size(&self) -> bool {
        false
    }
}
