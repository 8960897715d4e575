#![allow(clippy::float_cmp)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use super::*;
use crate::layer::{LayerKind, LayerPatch, LayerStore};

fn moved(layers: &[Layer], x: f64) -> Vec<Layer> {
    let mut next = layers.to_vec();
    next[0].x = x;
    next
}

fn base() -> Vec<Layer> {
    vec![Layer::new(LayerKind::Icon, 50.0, 40.0), Layer::new(LayerKind::Text, 50.0, 65.0)]
}

#[test]
fn record_skips_identical_state() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    assert!(!history.record(&layers));
    assert_eq!(history.len(), 1);
}

#[test]
fn record_ignores_soft_lock_marker() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    let mut marked = layers.clone();
    marked[0].locked_by = Some(Uuid::new_v4());
    assert!(!history.record(&marked));
}

#[test]
fn undo_at_oldest_is_noop() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    assert!(history.undo().is_none());
    assert_eq!(history.pointer(), 0);
    assert!(!history.can_undo());
}

#[test]
fn redo_at_newest_is_noop() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    history.record(&moved(&layers, 10.0));
    assert!(history.redo().is_none());
    assert_eq!(history.pointer(), 1);
}

#[test]
fn undo_then_redo_restores_identical_layers() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    let a = moved(&layers, 10.0);
    history.record(&a);

    let undone = history.undo().unwrap().to_vec();
    assert_eq!(undone, layers);
    let redone = history.redo().unwrap().to_vec();
    assert_eq!(redone, a);
}

#[test]
fn record_after_undo_discards_redo_branch() {
    let layers = base();
    let mut history = History::new(&layers, 50);
    history.record(&moved(&layers, 10.0));
    history.record(&moved(&layers, 20.0));
    history.undo();
    history.undo();
    assert!(history.record(&moved(&layers, 30.0)));
    assert_eq!(history.len(), 2);
    assert!(!history.can_redo());
    assert_eq!(history.current().layers[0].x, 30.0);
}

#[test]
fn capacity_evicts_oldest() {
    let layers = base();
    let mut history = History::new(&layers, 3);
    for i in 1..=5 {
        history.record(&moved(&layers, f64::from(i)));
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.pointer(), 2);
    assert_eq!(history.current().layers[0].x, 5.0);
    history.undo();
    history.undo();
    assert!(history.undo().is_none());
    assert_eq!(history.current().layers[0].x, 3.0);
}

#[test]
fn snapshots_follow_store_mutations() {
    let mut store = LayerStore::new();
    let id = store.create(LayerKind::Icon, 50.0, 50.0);
    let mut history = History::new(store.layers(), 50);
    store.update(&id, &LayerPatch { rotation: Some(90.0), ..Default::default() });
    assert!(history.record(store.layers()));
    store.restore(history.undo().unwrap().to_vec());
    assert_eq!(store.get(&id).unwrap().rotation, 0.0);
}

#[test]
fn pointer_stays_in_bounds_under_random_interleaving() {
    let mut rng = StdRng::seed_from_u64(7);
    let layers = base();
    let mut history = History::new(&layers, 8);

    for step in 0..500 {
        match rng.random_range(0..3) {
            0 => {
                history.record(&moved(&layers, f64::from(step)));
            }
            1 => {
                let before = history.current().layers.clone();
                if history.undo().is_some() {
                    let restored = history.redo().map(<[Layer]>::to_vec);
                    assert_eq!(restored.as_deref(), Some(before.as_slice()));
                    history.undo();
                }
            }
            _ => {
                history.redo();
            }
        }
        assert!(history.pointer() < history.len());
        assert!(history.len() <= history.capacity());
    }
}
