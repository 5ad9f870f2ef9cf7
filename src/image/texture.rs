use std::sync::Arc;

use crate::cache::Caches;
use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::geom::IRect;
use crate::foundation::id::UniqueId;
use crate::gpu::context::RecordingContext;
use crate::gpu::maker::bitmap_to_texture;
use crate::gpu::texture::{BackendFormat, BackingFit, Mipmapped, TexGenPolicy, TextureView};
use crate::image::{CachingHint, Image};
use crate::pixels::info::{ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::{Bitmap, PixmapMut};
use crate::image::raster::RasterImage;

/// Image backed by a realized texture view.
#[derive(Debug)]
pub struct TextureImage {
    view: TextureView,
    info: ImageInfo,
    unique_id: UniqueId,
}

impl TextureImage {
    pub(crate) fn new(view: TextureView, info: ImageInfo, unique_id: UniqueId) -> Arc<Self> {
        Arc::new(Self {
            view,
            info,
            unique_id,
        })
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Read the texture's texels back into an immutable bitmap matching the
    /// storage format.
    fn readback(&self) -> LumoResult<Bitmap> {
        let proxy = self.view.proxy();
        let dims = proxy.dimensions();
        let ct = match proxy.format() {
            BackendFormat::R8 => ColorType::Alpha8,
            BackendFormat::Rgba8 => ColorType::Rgba8888,
            BackendFormat::Bgra8 => ColorType::Bgra8888,
        };
        let info = ImageInfo::new(
            dims.width,
            dims.height,
            ct,
            self.info.alpha_type,
            self.info.color_space,
        );
        Bitmap::from_vec(info, info.min_row_bytes(), proxy.texels().to_vec())
    }
}

impl Image for TextureImage {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    fn read_only_pixels(&self, _caches: &Caches, _hint: CachingHint) -> LumoResult<Bitmap> {
        let raw = self.readback()?;
        if raw.info().color_type == self.info.color_type {
            return Ok(raw);
        }
        // Storage format differs from the logical color type; convert.
        let row_bytes = self.info.min_row_bytes();
        let mut pixels = vec![0u8; self.info.compute_byte_size(row_bytes)?];
        {
            let mut dst = PixmapMut::new(self.info, row_bytes, &mut pixels)?;
            raw.read_pixels(&mut dst, 0, 0)?;
        }
        Bitmap::from_vec(self.info, row_bytes, pixels)
    }

    fn make_subset(
        self: Arc<Self>,
        caches: &Caches,
        ctx: Option<&mut RecordingContext>,
        subset: IRect,
    ) -> LumoResult<Arc<dyn Image>> {
        if !self.info.bounds().contains(subset) {
            return Err(LumoError::validation(
                "subset must be non-empty and inside the image bounds",
            ));
        }
        if subset == self.info.bounds() {
            return Ok(self);
        }
        let bitmap = self.read_only_pixels(caches, CachingHint::Disallow)?;
        let sub = bitmap.extract_subset(subset)?;
        match ctx {
            Some(ctx) => {
                let view = bitmap_to_texture(
                    ctx,
                    &sub,
                    BackingFit::Exact,
                    TexGenPolicy::NewUncachedBudgeted,
                    Mipmapped::No,
                )
                .ok_or_else(|| LumoError::allocation("subset texture upload failed"))?;
                let info = self.info.with_dimensions(subset.size());
                let image: Arc<dyn Image> = TextureImage::new(view, info, UniqueId::next());
                Ok(image)
            }
            None => {
                let image: Arc<dyn Image> = RasterImage::from_bitmap(sub)?;
                Ok(image)
            }
        }
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
        let src = self.readback()?;
        let dst_info = self
            .info
            .with_color_type(target_ct)
            .with_color_space(target_cs);
        let row_bytes = dst_info.min_row_bytes();
        let mut pixels = vec![0u8; dst_info.compute_byte_size(row_bytes)?];
        {
            let mut dst = PixmapMut::new(dst_info, row_bytes, &mut pixels)?;
            src.read_pixels(&mut dst, 0, 0)?;
        }
        let image: Arc<dyn Image> =
            RasterImage::from_bitmap(Bitmap::from_vec(dst_info, row_bytes, pixels)?)?;
        Ok(image)
    }
}
