// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-rect derivation and change notification through ancestor clips.

use kurbo::{Rect, Size};

use trellis_core::widget::{WidgetId, WidgetTree};
use trellis_harness::{RecordingScheduler, pump, recording_scheduler};

fn small_display() -> WidgetTree {
    WidgetTree::new(Size::new(100.0, 100.0))
}

/// A tracked 200x200 widget at (10, 10) directly under a 100x100 display.
fn oversized(tree: &mut WidgetTree) -> (RecordingScheduler, WidgetId) {
    let root = tree.root();
    let child = tree.create_leaf();
    tree.add_child(root, child);
    tree.set_bounds(child, Rect::new(10.0, 10.0, 210.0, 210.0));
    tree.set_tracks_display_rect(child, true);
    let mut scheduler = recording_scheduler(tree);
    pump(&mut scheduler, tree);
    (scheduler, child)
}

#[test]
fn oversized_widget_is_clipped_to_the_display() {
    let mut tree = small_display();
    let (scheduler, child) = oversized(&mut tree);

    // In the widget's own coordinates: 100x100 display minus the (10, 10)
    // offset leaves 90x90 visible.
    assert_eq!(
        scheduler.display_rect(&tree, child),
        Rect::new(0.0, 0.0, 90.0, 90.0)
    );
}

#[test]
fn attach_notifies_the_initial_display_rect() {
    let mut tree = small_display();
    let (scheduler, child) = oversized(&mut tree);

    assert_eq!(
        scheduler.hooks().display_rects_for(child),
        vec![(Rect::ZERO, Rect::new(0.0, 0.0, 90.0, 90.0))]
    );
}

#[test]
fn moving_a_tracked_widget_updates_its_display_rect() {
    let mut tree = small_display();
    let (mut scheduler, child) = oversized(&mut tree);

    tree.set_bounds(child, Rect::new(50.0, 50.0, 250.0, 250.0));
    pump(&mut scheduler, &mut tree);

    assert_eq!(
        scheduler.display_rect(&tree, child),
        Rect::new(0.0, 0.0, 50.0, 50.0)
    );
    let notifications = scheduler.hooks().display_rects_for(child);
    assert_eq!(
        notifications.last(),
        Some(&(
            Rect::new(0.0, 0.0, 90.0, 90.0),
            Rect::new(0.0, 0.0, 50.0, 50.0)
        ))
    );
}

#[test]
fn clips_accumulate_through_nested_containers() {
    let mut tree = small_display();
    let root = tree.root();
    let container = tree.create_container();
    let leaf = tree.create_leaf();
    tree.add_child(root, container);
    tree.add_child(container, leaf);
    tree.set_bounds(container, Rect::new(10.0, 10.0, 70.0, 70.0));
    tree.set_bounds(leaf, Rect::new(30.0, 30.0, 80.0, 80.0));
    tree.set_tracks_display_rect(leaf, true);
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    // The container is 60x60; the leaf starts at (30, 30) inside it, so only
    // a 30x30 corner of the leaf is visible.
    assert_eq!(
        scheduler.display_rect(&tree, leaf),
        Rect::new(0.0, 0.0, 30.0, 30.0)
    );
}

#[test]
fn hidden_widget_has_an_empty_display_rect() {
    let mut tree = small_display();
    let (mut scheduler, child) = oversized(&mut tree);

    tree.set_visible(child, false);
    pump(&mut scheduler, &mut tree);

    assert_eq!(scheduler.display_rect(&tree, child), Rect::ZERO);
}

#[test]
fn untracked_widgets_get_no_notifications() {
    let mut tree = small_display();
    let root = tree.root();
    let child = tree.create_leaf();
    tree.add_child(root, child);
    tree.set_bounds(child, Rect::new(10.0, 10.0, 210.0, 210.0));
    let mut scheduler = recording_scheduler(&mut tree);
    pump(&mut scheduler, &mut tree);

    tree.set_bounds(child, Rect::new(50.0, 50.0, 250.0, 250.0));
    pump(&mut scheduler, &mut tree);

    assert!(scheduler.hooks().display_rects_for(child).is_empty());
}

#[test]
fn display_resize_rechecks_tracked_subtrees() {
    let mut tree = small_display();
    let (mut scheduler, child) = oversized(&mut tree);
    let root = tree.root();

    tree.set_bounds(root, Rect::from_origin_size((0.0, 0.0), Size::new(150.0, 150.0)));
    pump(&mut scheduler, &mut tree);

    assert_eq!(
        scheduler.display_rect(&tree, child),
        Rect::new(0.0, 0.0, 140.0, 140.0)
    );
    let notifications = scheduler.hooks().display_rects_for(child);
    assert_eq!(
        notifications.last(),
        Some(&(
            Rect::new(0.0, 0.0, 90.0, 90.0),
            Rect::new(0.0, 0.0, 140.0, 140.0)
        ))
    );
}
