#![allow(clippy::float_cmp)]

use std::collections::HashSet;

use super::*;

fn store_with(kinds: &[(LayerKind, f64, f64)]) -> (LayerStore, Vec<LayerId>) {
    let mut store = LayerStore::new();
    let ids = kinds
        .iter()
        .map(|(kind, x, y)| store.create(*kind, *x, *y))
        .collect();
    (store, ids)
}

// =============================================================
// LayerKind serde
// =============================================================

#[test]
fn kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&LayerKind::Icon).unwrap(), "\"icon\"");
    assert_eq!(serde_json::to_string(&LayerKind::Slogan).unwrap(), "\"slogan\"");
    let back: LayerKind = serde_json::from_str("\"text\"").unwrap();
    assert_eq!(back, LayerKind::Text);
}

#[test]
fn typographic_kinds() {
    assert!(!LayerKind::Icon.is_typographic());
    assert!(LayerKind::Text.is_typographic());
    assert!(LayerKind::Slogan.is_typographic());
}

// =============================================================
// Layer::apply
// =============================================================

#[test]
fn new_layer_has_identity_transform() {
    let layer = Layer::new(LayerKind::Icon, 50.0, 40.0);
    assert_eq!(layer.scale, 1.0);
    assert_eq!(layer.rotation, 0.0);
    assert_eq!(layer.opacity, 100.0);
    assert!(layer.visible);
    assert!(!layer.locked);
    assert!(layer.locked_by.is_none());
}

#[test]
fn apply_clamps_position_and_wraps_rotation() {
    let mut layer = Layer::new(LayerKind::Icon, 50.0, 50.0);
    layer.apply(&LayerPatch {
        x: Some(-12.0),
        y: Some(140.0),
        rotation: Some(-15.0),
        opacity: Some(180.0),
        scale: Some(-1.0),
        ..Default::default()
    });
    assert_eq!(layer.x, 0.0);
    assert_eq!(layer.y, 100.0);
    assert_eq!(layer.rotation, 345.0);
    assert_eq!(layer.opacity, 100.0);
    assert!(layer.scale > 0.0);
}

#[test]
fn apply_ignores_non_finite_numbers() {
    let mut layer = Layer::new(LayerKind::Text, 30.0, 60.0);
    layer.apply(&LayerPatch {
        x: Some(f64::NAN),
        y: Some(f64::INFINITY),
        rotation: Some(f64::NAN),
        opacity: Some(f64::NEG_INFINITY),
        font_size: Some(f64::NAN),
        ..Default::default()
    });
    assert_eq!(layer.x, 30.0);
    assert_eq!(layer.y, 60.0);
    assert_eq!(layer.rotation, 0.0);
    assert_eq!(layer.opacity, 100.0);
    assert!(layer.font_size.is_none());
}

#[test]
fn apply_leaves_absent_fields_untouched() {
    let mut layer = Layer::new(LayerKind::Text, 10.0, 20.0);
    layer.apply(&LayerPatch { font_family: Some("Inter".into()), ..Default::default() });
    assert_eq!(layer.x, 10.0);
    assert_eq!(layer.y, 20.0);
    assert_eq!(layer.font_family.as_deref(), Some("Inter"));
}

#[test]
fn wrap_degrees_handles_full_turns() {
    assert_eq!(wrap_degrees(360.0), 0.0);
    assert_eq!(wrap_degrees(375.0), 15.0);
    assert_eq!(wrap_degrees(-360.0), 0.0);
    let tiny = wrap_degrees(-1e-20);
    assert!((0.0..360.0).contains(&tiny));
}

#[test]
fn patch_serializes_only_present_fields() {
    let json = serde_json::to_value(LayerPatch::position(1.0, 2.0)).unwrap();
    assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.0 }));
    assert!(LayerPatch::default().is_empty());
}

// =============================================================
// LayerStore
// =============================================================

#[test]
fn create_appends_on_top() {
    let (store, ids) = store_with(&[(LayerKind::Icon, 50.0, 40.0), (LayerKind::Text, 50.0, 65.0)]);
    assert_eq!(store.len(), 2);
    assert_eq!(store.layers()[1].id, ids[1]);
}

#[test]
fn insert_rejects_duplicate_id() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 50.0, 40.0)]);
    let mut dup = Layer::new(LayerKind::Text, 0.0, 0.0);
    dup.id = ids[0];
    let err = store.insert(dup).unwrap_err();
    assert!(matches!(err, LayerError::DuplicateId(id) if id == ids[0]));
    assert_eq!(store.len(), 1);
}

#[test]
fn imported_layers_are_normalized() {
    let mut raw = Layer::new(LayerKind::Icon, 50.0, 50.0);
    raw.x = -20.0;
    raw.y = f64::NAN;
    raw.scale = -3.0;
    raw.rotation = 725.0;
    raw.opacity = 150.0;
    let id = raw.id;

    let store = LayerStore::from_layers(vec![raw]);
    let layer = store.get(&id).unwrap();
    assert_eq!(layer.x, 0.0);
    assert_eq!(layer.y, 50.0);
    assert!(layer.scale > 0.0);
    assert_eq!(layer.rotation, 5.0);
    assert_eq!(layer.opacity, 100.0);
}

#[test]
fn from_layers_drops_repeated_ids() {
    let a = Layer::new(LayerKind::Icon, 1.0, 1.0);
    let mut b = Layer::new(LayerKind::Text, 2.0, 2.0);
    b.id = a.id;
    let store = LayerStore::from_layers(vec![a.clone(), b]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&a.id).unwrap().kind, LayerKind::Icon);
}

#[test]
fn update_unknown_id_is_benign() {
    let (mut store, _) = store_with(&[(LayerKind::Icon, 50.0, 40.0)]);
    let before = store.clone();
    assert!(!store.update(&Uuid::new_v4(), &LayerPatch::position(1.0, 1.0)));
    assert_eq!(store, before);
}

#[test]
fn remove_returns_layer() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 50.0, 40.0)]);
    let removed = store.remove(&ids[0]).unwrap();
    assert_eq!(removed.id, ids[0]);
    assert!(store.is_empty());
    assert!(store.remove(&ids[0]).is_none());
}

#[test]
fn duplicate_offsets_and_never_collides() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 40.0, 30.0)]);
    let mut seen: HashSet<LayerId> = ids.iter().copied().collect();
    for _ in 0..20 {
        let copy = store.duplicate(&ids[0]).unwrap();
        assert!(seen.insert(copy), "duplicate produced a colliding id");
        let layer = store.get(&copy).unwrap();
        assert_eq!(layer.x, 40.0 + DUPLICATE_OFFSET);
        assert_eq!(layer.y, 30.0 + DUPLICATE_OFFSET);
    }
    assert_eq!(store.len(), 21);
}

#[test]
fn duplicate_sits_above_source_and_drops_soft_lock() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 10.0, 10.0), (LayerKind::Text, 20.0, 20.0)]);
    store.get_mut(&ids[0]).unwrap().locked_by = Some(Uuid::new_v4());
    let copy = store.duplicate(&ids[0]).unwrap();
    assert_eq!(store.index_of(&copy), Some(1));
    assert!(store.get(&copy).unwrap().locked_by.is_none());
}

#[test]
fn duplicate_near_edge_stays_on_canvas() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 98.0, 99.0)]);
    let copy = store.duplicate(&ids[0]).unwrap();
    let layer = store.get(&copy).unwrap();
    assert_eq!(layer.x, 100.0);
    assert_eq!(layer.y, 100.0);
}

#[test]
fn reorder_moves_and_clamps_index() {
    let (mut store, ids) = store_with(&[
        (LayerKind::Icon, 0.0, 0.0),
        (LayerKind::Text, 0.0, 0.0),
        (LayerKind::Slogan, 0.0, 0.0),
    ]);
    assert!(store.reorder(&ids[2], 0));
    assert_eq!(store.index_of(&ids[2]), Some(0));
    assert!(store.reorder(&ids[2], 99));
    assert_eq!(store.index_of(&ids[2]), Some(2));
    assert!(!store.reorder(&Uuid::new_v4(), 0));
}

#[test]
fn toggling_visibility_twice_with_same_target_is_idempotent() {
    let (mut store, ids) = store_with(&[(LayerKind::Icon, 50.0, 50.0)]);
    let hide = LayerPatch { visible: Some(false), ..Default::default() };
    store.update(&ids[0], &hide);
    let once = store.clone();
    store.update(&ids[0], &hide);
    assert_eq!(store, once);

    let lock = LayerPatch { locked: Some(true), ..Default::default() };
    store.update(&ids[0], &lock);
    let once = store.clone();
    store.update(&ids[0], &lock);
    assert_eq!(store, once);
}
