// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end render pipeline behavior through the recording doubles.

use kurbo::{Rect, Size};

use trellis_core::backend::GraphicsDevice;
use trellis_core::widget::{WidgetId, WidgetTree};
use trellis_harness::{DeviceOp, pump, recording_scheduler};

fn tree() -> WidgetTree {
    WidgetTree::new(Size::new(640.0, 480.0))
}

fn top_level_leaf(tree: &mut WidgetTree, bounds: Rect) -> WidgetId {
    let root = tree.root();
    let leaf = tree.create_leaf();
    tree.add_child(root, leaf);
    tree.set_bounds(leaf, bounds);
    leaf
}

#[test]
fn first_flush_acquires_and_paints() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(10.0, 10.0, 110.0, 60.0));
    let mut scheduler = recording_scheduler(&mut tree);

    assert!(pump(&mut scheduler, &mut tree));

    let device = scheduler.device();
    assert_eq!(device.paint_log().drawn, vec![leaf]);
    assert_eq!(
        device.ops,
        vec![
            DeviceOp::Acquired(leaf),
            DeviceOp::ZIndexSet(leaf, 0),
            DeviceOp::BoundsSet(leaf, Rect::new(10.0, 10.0, 110.0, 60.0)),
            DeviceOp::RenderBegun(leaf),
            DeviceOp::RenderEnded(leaf),
        ]
    );
}

#[test]
fn settled_scheduler_stays_idle() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    // Nothing changed, so the second turn must not flush or repaint.
    assert!(!pump(&mut scheduler, &mut tree));
    assert_eq!(scheduler.device().paint_log().drawn, vec![leaf]);
}

#[test]
fn invalidations_between_flushes_arm_one_task() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);
    let armed_before = scheduler.tasks().arm_count;

    tree.set_bounds(leaf, Rect::new(0.0, 0.0, 60.0, 60.0));
    scheduler.commit(&mut tree);
    tree.set_bounds(leaf, Rect::new(0.0, 0.0, 70.0, 70.0));
    scheduler.commit(&mut tree);

    assert_eq!(scheduler.tasks().arm_count, armed_before + 1);

    // Both resizes collapse into a single repaint.
    pump(&mut scheduler, &mut tree);
    assert_eq!(scheduler.device().paint_log().drawn, vec![leaf, leaf]);
}

#[test]
fn pure_move_syncs_geometry_without_repainting() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    let moved = Rect::new(30.0, 40.0, 80.0, 90.0);
    tree.set_bounds(leaf, moved);
    pump(&mut scheduler, &mut tree);

    let device = scheduler.device();
    assert_eq!(device.paint_log().drawn, vec![leaf]);
    assert!(device.ops.contains(&DeviceOp::BoundsSet(leaf, moved)));
}

#[test]
fn container_paints_before_children_in_stacking_order() {
    let mut tree = tree();
    let root = tree.root();
    let container = tree.create_container();
    let low = tree.create_leaf();
    let high = tree.create_leaf();
    tree.add_child(root, container);
    tree.add_child(container, low);
    tree.add_child(container, high);
    tree.set_bounds(container, Rect::new(0.0, 0.0, 200.0, 200.0));
    tree.set_bounds(low, Rect::new(0.0, 0.0, 50.0, 50.0));
    tree.set_bounds(high, Rect::new(25.0, 25.0, 75.0, 75.0));
    tree.set_z_index(low, 1);
    tree.set_z_index(high, 5);
    let mut scheduler = recording_scheduler(&mut tree);

    pump(&mut scheduler, &mut tree);

    assert_eq!(scheduler.device().paint_log().drawn, vec![container, high, low]);
}

#[test]
fn restacking_a_surfaced_widget_reaches_the_device() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    tree.set_z_index(leaf, 9);
    scheduler.commit(&mut tree);

    assert!(scheduler.device().ops.contains(&DeviceOp::ZIndexSet(leaf, 9)));
}

#[test]
fn z_index_set_before_first_render_arrives_with_the_surface() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);

    // No surface exists yet, so there is nothing to restack at commit time.
    tree.set_z_index(leaf, 9);
    scheduler.commit(&mut tree);
    let restacked_early = scheduler
        .device()
        .ops
        .iter()
        .any(|op| matches!(op, DeviceOp::ZIndexSet(..)));
    assert!(!restacked_early);

    // The stacking order arrives together with the surface instead.
    scheduler.flush(&mut tree);
    assert!(scheduler.device().ops.contains(&DeviceOp::ZIndexSet(leaf, 9)));
}

#[test]
fn each_surface_receives_its_initial_z_index() {
    let mut tree = tree();
    let high = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    tree.set_z_index(high, 5);
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    // A sibling surfacing in a later flush still conveys its stacking.
    let low = top_level_leaf(&mut tree, Rect::new(60.0, 0.0, 110.0, 50.0));
    tree.set_z_index(low, 2);
    pump(&mut scheduler, &mut tree);

    let device = scheduler.device();
    assert!(device.ops.contains(&DeviceOp::ZIndexSet(high, 5)));
    assert!(device.ops.contains(&DeviceOp::ZIndexSet(low, 2)));
}

#[test]
fn resize_to_empty_bounds_still_syncs_the_surface() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    // Collapsing to zero size must still flush and push the empty bounds,
    // or the surface keeps showing stale content at the old geometry.
    tree.set_bounds(leaf, Rect::ZERO);
    assert!(pump(&mut scheduler, &mut tree));

    let device = scheduler.device();
    assert!(device.ops.contains(&DeviceOp::BoundsSet(leaf, Rect::ZERO)));
    assert_eq!(device.paint_log().drawn, vec![leaf]);
}

#[test]
fn render_requests_under_a_hidden_ancestor_do_not_paint() {
    let mut tree = tree();
    let root = tree.root();
    let container = tree.create_container();
    let leaf = tree.create_leaf();
    tree.add_child(root, container);
    tree.add_child(container, leaf);
    tree.set_bounds(container, Rect::new(0.0, 0.0, 100.0, 100.0));
    tree.set_bounds(leaf, Rect::new(0.0, 0.0, 40.0, 40.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);
    assert_eq!(scheduler.device().paint_log().drawn, vec![container, leaf]);

    tree.set_visible(container, false);
    scheduler.commit(&mut tree);
    scheduler.render(&mut tree, leaf);
    scheduler.flush(&mut tree);

    // Still managed, but locally visible is not enough to paint while an
    // ancestor is hidden.
    assert!(scheduler.is_active(leaf));
    assert_eq!(scheduler.device().paint_log().drawn, vec![container, leaf]);
}

#[test]
fn hiding_a_top_level_widget_hides_its_surface_without_repaint() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    tree.set_visible(leaf, false);
    scheduler.commit(&mut tree);

    let device = scheduler.device();
    assert!(device.ops.contains(&DeviceOp::VisibleSet(leaf, false)));
    assert!(device.has_surface(leaf));
    assert_eq!(device.paint_log().drawn, vec![leaf]);
}

#[test]
fn render_now_paints_synchronously() {
    let mut tree = tree();
    let leaf = top_level_leaf(&mut tree, Rect::new(0.0, 0.0, 50.0, 50.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    scheduler.render_now(&mut tree, leaf);

    assert_eq!(scheduler.device().paint_log().drawn, vec![leaf, leaf]);
}
