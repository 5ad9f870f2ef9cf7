use super::*;

#[path = "support.rs"]
mod support;

use std::sync::atomic::Ordering;

use support::{i420_flat_planes, i420_size_info, TestGenerator};

use crate::cache::key::BitmapDesc;
use crate::foundation::geom::IRect;
use crate::gpu::context::ContextOptions;
use crate::image::lazy::make_from_generator;
use crate::yuv::YuvColorSpace;

fn new_image(generator: TestGenerator) -> Arc<LazyImage> {
    make_from_generator(Box::new(generator)).unwrap()
}

fn yuv_generator(width: i32, height: i32) -> TestGenerator {
    TestGenerator::checkerboard(width, height).with_yuv(
        i420_size_info(width, height),
        YuvColorSpace::Jpeg,
        i420_flat_planes(width, height, 200),
    )
}

#[test]
fn cascade_prefers_the_native_stage() {
    let image = new_image(TestGenerator::checkerboard(4, 4).with_native_texture());
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let view = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::Native), 1);
    assert_eq!(ctx.proxy_provider().key_count(), 1);
    assert_eq!(view.dimensions(), image.info().dimensions());
}

#[test]
fn cascade_falls_through_to_yuv() {
    let image = new_image(yuv_generator(16, 16));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::Yuv), 1);
    assert_eq!(ctx.stats().total(), 1);

    // A second lock is served by the texture cache.
    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::PreExisting), 1);
}

#[test]
fn cascade_falls_through_to_rgba_and_caches_everywhere() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 1);

    let desc = BitmapDesc::from_image(image.unique_id(), image.info().dimensions());
    assert!(caches.bitmap.contains(&desc));
    assert_eq!(ctx.proxy_provider().key_count(), 1);
}

#[test]
fn cascade_exhaustion_records_failure() {
    let image = new_image(TestGenerator::checkerboard(4, 4).failing_raster(u32::MAX));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let view =
        image.lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No);
    assert!(view.is_none());
    assert_eq!(ctx.stats().count(LockTexturePath::Failure), 1);
    assert_eq!(ctx.stats().total(), 1);
    assert_eq!(ctx.proxy_provider().key_count(), 0);
}

#[test]
fn plane_layout_is_identical_on_miss_and_hit() {
    let image = new_image(yuv_generator(16, 16));
    let caches = Caches::new();

    let miss = image.get_planes(&caches).unwrap();
    let hit = image.get_planes(&caches).unwrap();

    let size_info = miss.info.size_info;
    let mut expected = 0usize;
    for i in 0..MAX_PLANES {
        if size_info.plane_is_empty(i) {
            assert!(miss.plane(i).is_none());
            continue;
        }
        assert_eq!(miss.plane_offset(i), expected);
        assert_eq!(hit.plane_offset(i), expected);
        expected += size_info.planes[i].byte_size();
    }
    assert_eq!(miss.plane(0).unwrap()[0], 200);
    assert_eq!(hit.plane(1).unwrap()[0], 128);
}

#[test]
fn yuv_decode_runs_once_per_identity() {
    let generator = yuv_generator(16, 16);
    let counters = generator.counters();
    let image = new_image(generator);
    let caches = Caches::new();

    image.get_planes(&caches).unwrap();
    image.get_planes(&caches).unwrap();
    assert_eq!(counters.yuv_fetch_calls.load(Ordering::SeqCst), 1);
    assert!(caches.yuv.contains(image.unique_id()));
}

#[test]
fn yuv_stage_is_skipped_when_mipmaps_are_requested() {
    let image = new_image(yuv_generator(16, 16));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let view = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::Yes)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 1);
    assert_eq!(view.mipmapped(), Mipmapped::Yes);
}

#[test]
fn yuv_stage_honors_the_context_opt_out() {
    let image = new_image(yuv_generator(16, 16));
    let mut ctx = RecordingContext::with_options(
        ContextOptions {
            disable_gpu_yuv_conversion: true,
        },
        Default::default(),
    );
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 1);
}

#[test]
fn uncached_policies_never_touch_key_or_bitmap_cache() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let view = image
        .lock_texture_proxy_view(
            &mut ctx,
            &caches,
            TexGenPolicy::NewUncachedUnbudgeted,
            Mipmapped::No,
        )
        .unwrap();
    assert_eq!(view.proxy().budgeted(), Budgeted::No);
    assert_eq!(ctx.proxy_provider().key_count(), 0);
    let desc = BitmapDesc::from_image(image.unique_id(), image.info().dimensions());
    assert!(!caches.bitmap.contains(&desc));
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 1);
}

#[test]
fn mipmap_upgrade_rekeys_the_cached_proxy() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let flat = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(flat.mipmapped(), Mipmapped::No);

    let mipped = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::Yes)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::PreExisting), 1);
    assert_eq!(mipped.mipmapped(), Mipmapped::Yes);

    // The key now points at the mipped proxy; the old binding is gone.
    let key = UniqueKey::from_image_id(image.unique_id(), image.info().bounds());
    let bound = ctx
        .proxy_provider()
        .find_or_create_proxy_by_unique_key(&key)
        .unwrap();
    assert!(Arc::ptr_eq(&bound, mipped.proxy()));
    assert_eq!(flat.proxy().unique_key(), None);
}

#[test]
fn failed_mipmap_upgrade_returns_the_flat_view() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::with_options(
        Default::default(),
        Caps {
            supports_mipmaps: false,
            ..Default::default()
        },
    );
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    let view = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::Yes)
        .unwrap();
    // Best-effort: the non-mipped view is returned and stays keyed.
    assert_eq!(view.mipmapped(), Mipmapped::No);
    assert_eq!(ctx.proxy_provider().key_count(), 1);
}

#[test]
fn eviction_fires_the_listener_and_reruns_the_cascade() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(image.listeners.len(), 1);

    let key = UniqueKey::from_image_id(image.unique_id(), image.info().bounds());
    ctx.proxy_provider().evict(&key);
    assert_eq!(ctx.proxy_provider().key_count(), 0);

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.stats().count(LockTexturePath::PreExisting), 0);
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 2);
    assert_eq!(ctx.proxy_provider().key_count(), 1);
}

#[test]
fn yuv_draw_produces_the_flat_gray_the_planes_encode() {
    // Full-range BT.601 with y=200, u=v=128 is the gray (200, 200, 200).
    let image = new_image(yuv_generator(16, 16));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let view = image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    let px = view.proxy().texel(3, 3);
    for c in &px[..3] {
        assert!((c - 200.0 / 255.0).abs() < 0.01, "got {px:?}");
    }
}

#[test]
fn texture_subset_realizes_through_the_cascade() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    let sub = image
        .clone()
        .make_subset(&caches, Some(&mut ctx), IRect::from_xywh(0, 0, 2, 2))
        .unwrap();
    assert_eq!(sub.info().dimensions(), crate::foundation::geom::ISize::new(2, 2));
    assert_eq!(ctx.stats().count(LockTexturePath::Rgba), 1);
}

#[test]
fn dropping_the_image_detaches_its_texture_keys() {
    let image = new_image(TestGenerator::checkerboard(4, 4));
    let mut ctx = RecordingContext::new();
    let caches = Caches::new();

    image
        .lock_texture_proxy_view(&mut ctx, &caches, TexGenPolicy::Draw, Mipmapped::No)
        .unwrap();
    assert_eq!(ctx.proxy_provider().key_count(), 1);
    drop(image);
    assert_eq!(ctx.proxy_provider().key_count(), 0);
}
