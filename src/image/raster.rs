use std::sync::Arc;

use crate::cache::Caches;
use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::geom::IRect;
use crate::foundation::id::UniqueId;
use crate::gpu::context::RecordingContext;
use crate::image::{CachingHint, Image};
use crate::pixels::info::{ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::{Bitmap, PixmapMut};

/// Eager image: pixels are resident from construction.
///
/// Produced by realizing a lazy image, by subsetting, and by the
/// reinterpret path.
#[derive(Debug)]
pub struct RasterImage {
    bitmap: Bitmap,
    unique_id: UniqueId,
}

impl RasterImage {
    pub fn from_bitmap(bitmap: Bitmap) -> LumoResult<Arc<Self>> {
        if bitmap.info().is_empty() {
            return Err(LumoError::validation("raster image must be non-empty"));
        }
        Ok(Arc::new(Self {
            bitmap,
            unique_id: UniqueId::next(),
        }))
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }
}

impl Image for RasterImage {
    fn info(&self) -> &ImageInfo {
        self.bitmap.info()
    }

    fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    fn read_only_pixels(&self, _caches: &Caches, _hint: CachingHint) -> LumoResult<Bitmap> {
        Ok(self.bitmap.clone())
    }

    fn make_subset(
        self: Arc<Self>,
        _caches: &Caches,
        _ctx: Option<&mut RecordingContext>,
        subset: IRect,
    ) -> LumoResult<Arc<dyn Image>> {
        if subset == self.bitmap.info().bounds() {
            return Ok(self);
        }
        let sub = self.bitmap.extract_subset(subset)?;
        Ok(RasterImage::from_bitmap(sub)?)
    }

    fn make_color_type_and_color_space(
        self: Arc<Self>,
        target_ct: ColorType,
        target_cs: Option<ColorSpace>,
    ) -> LumoResult<Arc<dyn Image>> {
        let src_info = *self.bitmap.info();
        let target_cs = target_cs.or(src_info.color_space);
        if target_ct == src_info.color_type && target_cs == src_info.color_space {
            return Ok(self);
        }
        // Eager conversion: raster images have no generator to re-drive.
        let dst_info = src_info
            .with_color_type(target_ct)
            .with_color_space(target_cs);
        let row_bytes = dst_info.min_row_bytes();
        let mut pixels = vec![0u8; dst_info.compute_byte_size(row_bytes)?];
        {
            let mut dst = PixmapMut::new(dst_info, row_bytes, &mut pixels)?;
            self.bitmap.read_pixels(&mut dst, 0, 0)?;
        }
        Ok(RasterImage::from_bitmap(Bitmap::from_vec(
            dst_info, row_bytes, pixels,
        )?)?)
    }
}
