use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use smallvec::SmallVec;

use crate::cache::bitmap::BitmapCacheInner;
use crate::cache::key::BitmapDesc;
use crate::cache::Caches;
use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::geom::IRect;
use crate::foundation::id::UniqueId;
use crate::generator::shared::SharedGenerator;
use crate::generator::{EncodedData, Generator};
use crate::gpu::context::RecordingContext;
use crate::gpu::provider::InvalidationListener;
use crate::image::raster::RasterImage;
use crate::image::{CachingHint, Image};
use crate::pixels::info::{ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::{Bitmap, PixmapMut};

/// Derived construction inputs for one lazy image variant.
///
/// Overlays any requested recoloring on the generator's native info; a
/// reinterpretation is never the same identity, so any surviving override
/// allocates a fresh id.
#[derive(Debug)]
pub(crate) struct Validated {
    pub(crate) shared: Arc<SharedGenerator>,
    pub(crate) info: ImageInfo,
    pub(crate) unique_id: UniqueId,
}

pub(crate) fn validate(
    shared: Option<Arc<SharedGenerator>>,
    color_type: Option<ColorType>,
    color_space: Option<ColorSpace>,
) -> Option<Validated> {
    let shared = shared?;
    let mut info = *shared.info();
    if info.is_empty() {
        return None;
    }
    let mut unique_id = shared.unique_id();

    // A color type matching the native one is no override at all.
    let color_type = color_type.filter(|ct| *ct != info.color_type);

    if color_type.is_some() || color_space.is_some() {
        if let Some(ct) = color_type {
            info = info.with_color_type(ct);
        }
        if let Some(cs) = color_space {
            info = info.with_color_space(Some(cs));
        }
        unique_id = UniqueId::next();
    }

    Some(Validated {
        shared,
        info,
        unique_id,
    })
}

/// Append-only set of single-shot invalidation listeners.
#[derive(Debug, Default)]
pub(crate) struct ListenerSet {
    inner: Mutex<SmallVec<[Arc<InvalidationListener>; 2]>>,
}

impl ListenerSet {
    pub(crate) fn add(&self, listener: Arc<InvalidationListener>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Fire and drop every pending listener.
    pub(crate) fn changed(&self) {
        let drained = std::mem::take(
            &mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        );
        // Fired outside the lock: a listener's action may re-enter caches.
        for listener in drained {
            listener.fire();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// An image whose pixels are produced on demand by a shared generator.
///
/// Immutable except for the recolor memo and the listener set. Several lazy
/// images (recolorings of one source) may share a generator; everything
/// decoded is published through the caches under this image's unique id.
pub struct LazyImage {
    shared: Arc<SharedGenerator>,
    info: ImageInfo,
    unique_id: UniqueId,
    recolor_cache: Mutex<Option<Arc<LazyImage>>>,
    pub(crate) listeners: ListenerSet,
    raster_cache_hook: Mutex<Option<Weak<Mutex<BitmapCacheInner>>>>,
    added_to_raster_cache: AtomicBool,
}

impl std::fmt::Debug for LazyImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyImage")
            .field("unique_id", &self.unique_id)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Wrap a generator in a fresh shared envelope and build the image it
/// describes. Returns `None` for a generator reporting an empty info.
pub fn make_from_generator(generator: Box<dyn Generator>) -> Option<Arc<LazyImage>> {
    let validated = validate(Some(SharedGenerator::new(generator)), None, None)?;
    Some(LazyImage::from_validated(validated))
}

impl LazyImage {
    pub(crate) fn from_validated(validated: Validated) -> Arc<Self> {
        Arc::new(Self {
            shared: validated.shared,
            info: validated.info,
            unique_id: validated.unique_id,
            recolor_cache: Mutex::new(None),
            listeners: ListenerSet::default(),
            raster_cache_hook: Mutex::new(None),
            added_to_raster_cache: AtomicBool::new(false),
        })
    }

    pub(crate) fn shared(&self) -> &Arc<SharedGenerator> {
        &self.shared
    }

    /// Decode the full image to an immutable bitmap.
    ///
    /// `Allow` decodes straight into cache-owned storage and publishes on
    /// success; `Disallow` decodes into private storage and never touches
    /// the cache.
    #[tracing::instrument(skip_all)]
    pub fn read_only_pixels(&self, caches: &Caches, hint: CachingHint) -> LumoResult<Bitmap> {
        let desc = BitmapDesc::from_image(self.unique_id, self.info.dimensions());
        if let Some(hit) = caches.bitmap.find(&desc) {
            return Ok(hit);
        }

        if hint == CachingHint::Allow {
            let mut alloc = caches.bitmap.alloc(desc, &self.info)?;
            {
                let mut pixmap = alloc.pixmap();
                let mut generator = self.shared.scoped();
                generator.get_pixels(&mut pixmap)?;
            }
            // An uncommitted alloc just dropped on the failure path above,
            // releasing the storage without publishing anything.
            let bitmap = caches.bitmap.commit(alloc);
            self.notify_added_to_raster_cache(caches);
            Ok(bitmap)
        } else {
            let row_bytes = self.info.min_row_bytes();
            let mut pixels = vec![0u8; self.info.compute_byte_size(row_bytes)?];
            {
                let mut pixmap = PixmapMut::new(self.info, row_bytes, &mut pixels)?;
                let mut generator = self.shared.scoped();
                generator.get_pixels(&mut pixmap)?;
            }
            Bitmap::from_vec(self.info, row_bytes, pixels)
        }
    }

    /// Record that this image owns records in the bitmap cache, so teardown
    /// can purge them.
    fn notify_added_to_raster_cache(&self, caches: &Caches) {
        self.added_to_raster_cache.store(true, Ordering::Release);
        *self
            .raster_cache_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(caches.bitmap.downgrade());
    }

    /// Degrade to raster, reading the pixels as `new_cs` without conversion.
    ///
    /// The bitmap is allocated with the new space while the generator paints
    /// as if producing its native one; the result is the same bytes under a
    /// different interpretation ("cast, don't convert").
    pub fn reinterpret_color_space(&self, new_cs: ColorSpace) -> LumoResult<Arc<RasterImage>> {
        let new_info = self.info.with_color_space(Some(new_cs));
        let row_bytes = new_info.min_row_bytes();
        let mut pixels = vec![0u8; new_info.compute_byte_size(row_bytes)?];
        {
            let mut pixmap = PixmapMut::new(new_info, row_bytes, &mut pixels)?;
            pixmap.set_color_space(self.info.color_space);
            let mut generator = self.shared.scoped();
            generator.get_pixels(&mut pixmap)?;
        }
        RasterImage::from_bitmap(Bitmap::from_vec(new_info, row_bytes, pixels)?)
    }

    /// Realize this image as an eager raster image.
    pub fn make_raster_image(&self, caches: &Caches) -> LumoResult<Arc<RasterImage>> {
        RasterImage::from_bitmap(self.read_only_pixels(caches, CachingHint::Allow)?)
    }
}

impl Image for LazyImage {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    fn read_only_pixels(&self, caches: &Caches, hint: CachingHint) -> LumoResult<Bitmap> {
        LazyImage::read_only_pixels(self, caches, hint)
    }

    fn make_subset(
        self: Arc<Self>,
        caches: &Caches,
        mut ctx: Option<&mut RecordingContext>,
        subset: IRect,
    ) -> LumoResult<Arc<dyn Image>> {
        if !self.info.bounds().contains(subset) {
            return Err(LumoError::validation(
                "subset must be non-empty and inside the image bounds",
            ));
        }
        // Laziness does not survive subsetting: realize a concrete backing
        // first, then subset that.
        let realized: Arc<dyn Image> = match ctx.as_deref_mut() {
            Some(ctx) => self.make_texture_image(caches, ctx)?,
            None => self.make_raster_image(caches)?,
        };
        realized.make_subset(caches, ctx, subset)
    }

    fn make_color_type_and_color_space(
        self: Arc<Self>,
        target_ct: ColorType,
        target_cs: Option<ColorSpace>,
    ) -> LumoResult<Arc<dyn Image>> {
        let target_cs = target_cs.or(self.info.color_space);
        if target_ct == self.info.color_type && target_cs == self.info.color_space {
            return Ok(self);
        }

        let mut memo = self
            .recolor_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = memo.as_ref()
            && cached.info.color_type == target_ct
            && cached.info.color_space == target_cs
        {
            return Ok(cached.clone());
        }

        let validated = validate(Some(self.shared.clone()), Some(target_ct), target_cs)
            .ok_or_else(|| LumoError::validation("generator does not admit a recoloring"))?;
        let image = LazyImage::from_validated(validated);
        *memo = Some(image.clone());
        Ok(image)
    }

    fn ref_encoded(&self) -> Option<EncodedData> {
        // A recolored view is not bit-identical to the original encoded
        // form; only the unmodified image may alias it.
        if self.shared.unique_id() == self.unique_id {
            let generator = self.shared.scoped();
            return generator.ref_encoded();
        }
        None
    }

    fn is_valid(&self, ctx: Option<&RecordingContext>) -> bool {
        let generator = self.shared.scoped();
        generator.is_valid(ctx)
    }
}

impl Drop for LazyImage {
    fn drop(&mut self) {
        // Detach any cached texture keys still pointing at this identity.
        self.listeners.changed();

        if self.added_to_raster_cache.load(Ordering::Acquire)
            && let Some(hook) = self
                .raster_cache_hook
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            && let Some(cache) = hook.upgrade()
        {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .purge_by_id(self.unique_id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/lazy.rs"]
mod tests;
