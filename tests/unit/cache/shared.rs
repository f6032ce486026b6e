use super::*;
use crate::foundation::core::{IRect, Rect};
use crate::foundation::error::StratumError;
use crate::foundation::ids::TextureId;
use std::cell::Cell;

fn value(ids: &[u32]) -> SharedTextures {
    SharedTextures {
        width: 4,
        height: 4,
        tiles: ids
            .iter()
            .map(|id| SubTexture {
                texture: TextureId(*id),
                bbox: Rect::new(0.0, 0.0, 4.0, 4.0),
                width: 4,
                height: 4,
                tc: None,
            })
            .collect(),
        raster: RasterCache {
            tiles: Vec::new(),
            area: IRect::new(0, 0, 4, 4),
        },
    }
}

#[test]
fn second_acquire_shares_the_first_value() {
    let q = ReleaseQueue::default();
    let table = SharedTable::new(q.clone());
    let key = ResourceKey::Image(7);
    let calls = Cell::new(0);
    let make = || {
        calls.set(calls.get() + 1);
        Ok(Some(value(&[1, 2])))
    };
    let a = table.acquire(key, make).unwrap().unwrap();
    let b = table
        .acquire(key, || {
            calls.set(calls.get() + 1);
            Ok(Some(value(&[9])))
        })
        .unwrap()
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(table.count(key), 2);
    assert_eq!(b.value().tiles[0].texture, TextureId(1));
    assert_eq!(table.stats().handles, 2);

    drop(a);
    assert_eq!(table.count(key), 1);
    assert_eq!(q.len(), 0);
    drop(b);
    assert_eq!(table.count(key), 0);
    assert_eq!(q.drain(), vec![TextureId(1), TextureId(2)]);
    let s = table.stats();
    assert_eq!((s.allocs, s.frees, s.live, s.handles), (1, 1, 0, 0));
}

#[test]
fn freed_key_is_rebuilt_on_next_acquire() {
    let q = ReleaseQueue::default();
    let table = SharedTable::new(q.clone());
    let key = ResourceKey::Frame(3);
    drop(table.acquire(key, || Ok(Some(value(&[1])))).unwrap());
    let h = table.acquire(key, || Ok(Some(value(&[5])))).unwrap().unwrap();
    assert_eq!(h.value().tiles[0].texture, TextureId(5));
    assert_eq!(table.stats().allocs, 2);
    assert_eq!(table.stats().frees, 1);
}

#[test]
fn nothing_to_share_creates_no_entry() {
    let table = SharedTable::new(ReleaseQueue::default());
    let key = ResourceKey::Canvas {
        surface: 1,
        revision: 0,
    };
    assert!(table.acquire(key, || Ok(None)).unwrap().is_none());
    assert!(
        table
            .acquire(key, || Err(StratumError::resource("upload failed")))
            .is_err()
    );
    assert_eq!(table.count(key), 0);
    assert_eq!(table.stats(), SharedStats::default());
}

#[test]
fn keys_are_independent() {
    let q = ReleaseQueue::default();
    let table = SharedTable::new(q.clone());
    let a = table.acquire(ResourceKey::Image(1), || Ok(Some(value(&[1])))).unwrap();
    let b = table.acquire(ResourceKey::Image(2), || Ok(Some(value(&[2])))).unwrap();
    assert_eq!(table.stats().live, 2);
    drop(a);
    assert_eq!(q.drain(), vec![TextureId(1)]);
    drop(b);
    assert_eq!(q.drain(), vec![TextureId(2)]);
}
