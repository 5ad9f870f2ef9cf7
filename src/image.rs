pub mod lazy;
mod lazy_texture;
pub mod raster;
pub mod texture;

use std::sync::Arc;

use crate::cache::Caches;
use crate::foundation::error::LumoResult;
use crate::foundation::geom::IRect;
use crate::foundation::id::UniqueId;
use crate::generator::EncodedData;
use crate::gpu::context::RecordingContext;
use crate::pixels::info::{ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::{Bitmap, PixmapMut};

/// Whether an accessor may populate the shared caches.
///
/// `Disallow` must never touch the cache, not even on the success path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachingHint {
    Allow,
    Disallow,
}

/// Capability interface shared by the image variants (lazy, raster,
/// texture-backed).
///
/// The caches are passed explicitly: an image holds identity and a pixel
/// source, never cache storage.
pub trait Image: Send + Sync {
    fn info(&self) -> &ImageInfo;

    fn unique_id(&self) -> UniqueId;

    /// An immutable bitmap of the full image, decoded on demand.
    fn read_only_pixels(&self, caches: &Caches, hint: CachingHint) -> LumoResult<Bitmap>;

    /// Copy-and-convert a window of the image into `dst`.
    fn read_pixels(
        &self,
        caches: &Caches,
        dst: &mut PixmapMut<'_>,
        src_x: i32,
        src_y: i32,
        hint: CachingHint,
    ) -> LumoResult<()> {
        let bitmap = self.read_only_pixels(caches, hint)?;
        bitmap.read_pixels(dst, src_x, src_y)
    }

    /// A new image restricted to `subset`. Realizes a concrete backing
    /// first when the variant is lazy.
    fn make_subset(
        self: Arc<Self>,
        caches: &Caches,
        ctx: Option<&mut RecordingContext>,
        subset: IRect,
    ) -> LumoResult<Arc<dyn Image>>;

    /// A view of the same content in another color type and/or space.
    /// A `None` space means "no change", not "strip the space".
    fn make_color_type_and_color_space(
        self: Arc<Self>,
        target_ct: ColorType,
        target_cs: Option<ColorSpace>,
    ) -> LumoResult<Arc<dyn Image>>;

    /// The original encoded bytes, when the image still aliases them.
    fn ref_encoded(&self) -> Option<EncodedData> {
        None
    }

    fn is_valid(&self, ctx: Option<&RecordingContext>) -> bool {
        let _ = ctx;
        true
    }
}
