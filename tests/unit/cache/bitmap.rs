use super::*;
use crate::foundation::geom::ISize;
use crate::pixels::info::{AlphaType, ColorSpace, ColorType};

fn info_rgba(w: i32, h: i32) -> ImageInfo {
    ImageInfo::new(
        w,
        h,
        ColorType::Rgba8888,
        AlphaType::Premul,
        Some(ColorSpace::Srgb),
    )
}

fn desc_for(id: UniqueId, w: i32, h: i32) -> BitmapDesc {
    BitmapDesc::from_image(id, ISize::new(w, h))
}

#[test]
fn commit_publishes_and_find_hits() {
    let cache = BitmapCache::new(1 << 20);
    let desc = desc_for(UniqueId::next(), 2, 2);
    assert!(cache.find(&desc).is_none());

    let mut alloc = cache.alloc(desc, &info_rgba(2, 2)).unwrap();
    alloc.pixmap().bytes_mut().fill(7);
    let bitmap = cache.commit(alloc);
    assert_eq!(bitmap.bytes()[0], 7);

    let hit = cache.find(&desc).unwrap();
    assert_eq!(hit.bytes(), bitmap.bytes());
}

#[test]
fn dropping_an_uncommitted_alloc_publishes_nothing() {
    let cache = BitmapCache::new(1 << 20);
    let desc = desc_for(UniqueId::next(), 2, 2);
    {
        let mut alloc = cache.alloc(desc, &info_rgba(2, 2)).unwrap();
        alloc.pixmap().bytes_mut().fill(9);
        // Simulated decode failure: the alloc goes out of scope.
    }
    assert!(!cache.contains(&desc));
    assert_eq!(cache.total_bytes(), 0);
}

#[test]
fn first_commit_wins_for_concurrent_decodes() {
    let cache = BitmapCache::new(1 << 20);
    let desc = desc_for(UniqueId::next(), 2, 2);
    let mut first = cache.alloc(desc, &info_rgba(2, 2)).unwrap();
    let mut second = cache.alloc(desc, &info_rgba(2, 2)).unwrap();
    first.pixmap().bytes_mut().fill(1);
    second.pixmap().bytes_mut().fill(2);

    cache.commit(first);
    let loser = cache.commit(second);
    // The loser's work is discarded; everyone sees the first add.
    assert_eq!(loser.bytes()[0], 1);
    assert_eq!(cache.find(&desc).unwrap().bytes()[0], 1);
    assert_eq!(cache.total_bytes(), 16);
}

#[test]
fn purge_by_id_removes_every_record_for_that_image() {
    let cache = BitmapCache::new(1 << 20);
    let id = UniqueId::next();
    let other = UniqueId::next();
    for desc in [desc_for(id, 2, 2), desc_for(other, 2, 2)] {
        let alloc = cache.alloc(desc, &info_rgba(2, 2)).unwrap();
        cache.commit(alloc);
    }
    cache.purge_by_id(id);
    assert!(!cache.contains(&desc_for(id, 2, 2)));
    assert!(cache.contains(&desc_for(other, 2, 2)));
}

#[test]
fn lru_eviction_prefers_stale_entries() {
    // Budget fits two 16-byte bitmaps.
    let cache = BitmapCache::new(32);
    let a = desc_for(UniqueId::next(), 2, 2);
    let b = desc_for(UniqueId::next(), 2, 2);
    let c = desc_for(UniqueId::next(), 2, 2);
    cache.commit(cache.alloc(a, &info_rgba(2, 2)).unwrap());
    cache.commit(cache.alloc(b, &info_rgba(2, 2)).unwrap());
    cache.find(&a).unwrap();
    cache.commit(cache.alloc(c, &info_rgba(2, 2)).unwrap());
    assert!(cache.contains(&a));
    assert!(!cache.contains(&b));
    assert!(cache.contains(&c));
}

#[test]
fn evicted_bitmaps_stay_usable_through_their_refs() {
    let cache = BitmapCache::new(16);
    let a = desc_for(UniqueId::next(), 2, 2);
    let mut alloc = cache.alloc(a, &info_rgba(2, 2)).unwrap();
    alloc.pixmap().bytes_mut().fill(3);
    let bitmap = cache.commit(alloc);
    // A second entry pushes the first out of budget.
    let b = desc_for(UniqueId::next(), 2, 2);
    cache.commit(cache.alloc(b, &info_rgba(2, 2)).unwrap());
    assert!(!cache.contains(&a));
    assert_eq!(bitmap.bytes()[0], 3);
}
