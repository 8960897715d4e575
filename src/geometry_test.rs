#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::layer::LayerKind;

fn settings(grid: bool, guides: bool) -> EditorSettings {
    EditorSettings { show_grid: true, grid_size: 12, snap_to_grid: grid, show_smart_guides: guides }
}

fn two_layers() -> (LayerStore, LayerId, LayerId) {
    let mut store = LayerStore::new();
    let icon = store.create(LayerKind::Icon, 50.0, 40.0);
    let text = store.create(LayerKind::Text, 30.0, 65.0);
    (store, icon, text)
}

// =============================================================
// Pointer mapping
// =============================================================

#[test]
fn to_percent_maps_rect_corners() {
    let rect = CanvasRect { left: 100.0, top: 50.0, width: 400.0, height: 200.0 };
    assert_eq!(rect.to_percent(100.0, 50.0), (0.0, 0.0));
    assert_eq!(rect.to_percent(300.0, 150.0), (50.0, 50.0));
    assert_eq!(rect.to_percent(500.0, 250.0), (100.0, 100.0));
}

#[test]
fn to_percent_survives_zero_sized_rect() {
    let rect = CanvasRect { left: 0.0, top: 0.0, width: 0.0, height: 0.0 };
    let (x, y) = rect.to_percent(1.0, 1.0);
    assert!(x.is_finite() && y.is_finite());
}

// =============================================================
// Grid snapping
// =============================================================

#[test]
fn grid_snap_only_within_tolerance() {
    // grid 8 -> step 12.5
    assert_eq!(snap_to_grid(26.0, 8), 25.0);
    assert_eq!(snap_to_grid(31.0, 8), 31.0);
    assert_eq!(snap_to_grid(36.0, 8), 37.5);
}

#[test]
fn grid_snap_disabled_leaves_raw() {
    let (store, icon, _) = two_layers();
    let snap = snap_position(26.0, 13.0, &icon, store.layers(), &settings(false, false));
    assert_eq!((snap.x, snap.y), (26.0, 13.0));
    assert!(snap.guides.is_empty());
}

// =============================================================
// Smart guides
// =============================================================

#[test]
fn raw_near_center_snaps_exactly_to_center() {
    let (store, _, text) = two_layers();
    for (rx, ry) in [(49.0, 50.9), (51.4, 48.6), (50.2, 50.0)] {
        let snap = snap_position(rx, ry, &text, store.layers(), &settings(false, true));
        assert_eq!((snap.x, snap.y), (50.0, 50.0), "raw ({rx}, {ry})");
        assert!(snap.guides.contains(&Guide { axis: Axis::X, position: 50.0 }));
        assert!(snap.guides.contains(&Guide { axis: Axis::Y, position: 50.0 }));
    }
}

#[test]
fn raw_near_center_snaps_to_center_with_grid_enabled() {
    let (store, _, text) = two_layers();
    for grid in [8, 12, 16, 32] {
        let mut s = settings(true, true);
        s.grid_size = grid;
        let snap = snap_position(51.3, 48.8, &text, store.layers(), &s);
        assert_eq!((snap.x, snap.y), (50.0, 50.0), "grid {grid}");
    }
}

#[test]
fn center_wins_over_nearby_layer() {
    let mut store = LayerStore::new();
    let other = store.create(LayerKind::Icon, 51.5, 10.0);
    let dragged = store.create(LayerKind::Text, 0.0, 0.0);
    let snap = snap_position(50.8, 80.0, &dragged, store.layers(), &settings(false, true));
    assert_eq!(snap.x, 50.0);
    assert!(store.get(&other).is_some());
}

#[test]
fn snaps_to_other_layer_coordinate() {
    let (store, _, text) = two_layers();
    // icon sits at y = 40
    let snap = snap_position(20.0, 41.0, &text, store.layers(), &settings(false, true));
    assert_eq!(snap.y, 40.0);
    assert_eq!(snap.guides, vec![Guide { axis: Axis::Y, position: 40.0 }]);
}

#[test]
fn hidden_layers_are_not_guide_targets() {
    let (mut store, icon, text) = two_layers();
    store.update(&icon, &LayerPatch { visible: Some(false), ..Default::default() });
    let snap = snap_position(20.0, 41.0, &text, store.layers(), &settings(false, true));
    assert_eq!(snap.y, 41.0);
}

#[test]
fn smart_guide_overrides_grid_snap() {
    let mut store = LayerStore::new();
    // grid 8 -> line at 37.5; another layer at 36.5
    store.create(LayerKind::Icon, 36.5, 90.0);
    let dragged = store.create(LayerKind::Text, 0.0, 0.0);
    let mut s = settings(true, true);
    s.grid_size = 8;
    let snap = snap_position(37.0, 70.0, &dragged, store.layers(), &s);
    assert_eq!(snap.x, 36.5);
}

#[test]
fn snapped_position_is_clamped() {
    let (store, icon, _) = two_layers();
    let snap = snap_position(-20.0, 130.0, &icon, store.layers(), &settings(false, false));
    assert_eq!((snap.x, snap.y), (0.0, 100.0));
}

// =============================================================
// Drag
// =============================================================

#[test]
fn locked_layer_cannot_be_dragged() {
    let (mut store, icon, _) = two_layers();
    store.update(&icon, &LayerPatch { locked: Some(true), ..Default::default() });
    assert!(Drag::begin(&store, &icon).is_none());
    assert!(Drag::begin(&store, &Uuid::new_v4()).is_none());
}

#[test]
fn drag_update_records_guides() {
    let (store, _, text) = two_layers();
    let mut drag = Drag::begin(&store, &text).unwrap();
    let patch = drag.update(49.5, 70.0, &store, &settings(false, true));
    assert_eq!(patch.x, Some(50.0));
    assert_eq!(patch.y, Some(70.0));
    assert_eq!(drag.guides.len(), 1);
    drag.update(20.0, 70.0, &store, &settings(false, true));
    assert!(drag.guides.is_empty());
}

// =============================================================
// Keyboard transforms
// =============================================================

#[test]
fn nudge_clamps_and_respects_lock() {
    let mut layer = Layer::new(LayerKind::Icon, 99.5, 0.5);
    let patch = nudge(&layer, 1.0, -1.0).unwrap();
    assert_eq!(patch.x, Some(100.0));
    assert_eq!(patch.y, Some(0.0));
    layer.locked = true;
    assert!(nudge(&layer, 1.0, 0.0).is_none());
}

#[test]
fn rotate_by_wraps() {
    let layer = Layer::new(LayerKind::Icon, 0.0, 0.0);
    assert_eq!(rotate_by(&layer, -15.0).rotation, Some(345.0));
}

// =============================================================
// Alignment
// =============================================================

#[test]
fn align_center_moves_all_to_midpoint() {
    let (store, icon, text) = two_layers();
    let patches = align(&store, &[icon, text], Alignment::Center);
    assert_eq!(patches.len(), 2);
    assert!(patches.iter().all(|(_, p)| p.x == Some(50.0) && p.y.is_none()));
}

#[test]
fn align_left_and_bottom_use_extremes() {
    let (store, icon, text) = two_layers();
    let left = align(&store, &[icon, text], Alignment::Left);
    assert!(left.iter().all(|(_, p)| p.x == Some(30.0)));
    let bottom = align(&store, &[icon, text], Alignment::Bottom);
    assert!(bottom.iter().all(|(_, p)| p.y == Some(65.0)));
    let top = align(&store, &[icon, text], Alignment::Top);
    assert!(top.iter().all(|(_, p)| p.y == Some(40.0)));
    let right = align(&store, &[icon, text], Alignment::Right);
    assert!(right.iter().all(|(_, p)| p.x == Some(50.0)));
}

#[test]
fn align_empty_selection_is_noop() {
    let (store, _, _) = two_layers();
    assert!(align(&store, &[], Alignment::Middle).is_empty());
    assert!(align(&store, &[Uuid::new_v4()], Alignment::Middle).is_empty());
}
