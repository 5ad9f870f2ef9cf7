use std::sync::Arc;

use kurbo::Rect;

use crate::cache::key::UniqueKey;
use crate::cache::resource::CachedData;
use crate::cache::Caches;
use crate::foundation::error::{LumoError, LumoResult};
use crate::gpu::context::{Caps, RecordingContext};
use crate::gpu::effects::{color_space_xform, yuv_to_rgb, Filter};
use crate::gpu::maker::bitmap_to_texture;
use crate::gpu::provider::InvalidationListener;
use crate::gpu::surface::{copy_base_to_mipmap, BlendMode, Paint, RenderTargetContext};
use crate::gpu::texture::{
    to_gpu_color_type, BackingFit, Budgeted, GpuColorType, Mipmapped, SurfaceOrigin,
    TexGenPolicy, TextureView,
};
use crate::image::lazy::LazyImage;
use crate::image::texture::TextureImage;
use crate::image::{CachingHint, Image};
use crate::pixels::info::{AlphaType, ImageInfo};
use crate::pixels::pixmap::Bitmap;
use crate::telemetry::LockTexturePath;
use crate::yuv::{plane_offsets, YuvPlanes, YuvSizeInfo, MAX_PLANES};

/// Split a freshly allocated backing buffer into per-plane windows laid out
/// by [`plane_offsets`]. Absent planes get empty slices.
fn split_planes_mut<'a>(buf: &'a mut [u8], info: &YuvSizeInfo) -> [&'a mut [u8]; MAX_PLANES] {
    let (p0, rest) = buf.split_at_mut(info.planes[0].byte_size());
    let (p1, rest) = rest.split_at_mut(info.planes[1].byte_size());
    let (p2, rest) = rest.split_at_mut(info.planes[2].byte_size());
    let (p3, _) = rest.split_at_mut(info.planes[3].byte_size());
    [p0, p1, p2, p3]
}

impl LazyImage {
    /// Fetch (or decode and cache) the planar representation.
    ///
    /// Hit and miss both derive plane windows from [`plane_offsets`], so the
    /// layout can never diverge between the two paths. A failed decode
    /// returns `None` and caches nothing; the next call retries.
    #[tracing::instrument(skip_all)]
    pub fn get_planes(&self, caches: &Caches) -> Option<YuvPlanes> {
        let mut generator = self.shared().scoped();

        if let Some((data, info)) = caches.yuv.find_and_ref(generator.unique_id()) {
            let (offsets, _) = plane_offsets(&info.size_info);
            return Some(YuvPlanes {
                data,
                info,
                offsets,
            });
        }

        let info = generator.query_yuv_planes()?;
        if !info.size_info.is_valid() {
            return None;
        }

        let (offsets, total) = plane_offsets(&info.size_info);
        let mut buf = caches.resource.new_cached_data(total).ok()?;
        let planes = split_planes_mut(&mut buf, &info.size_info);
        if generator
            .get_yuv_planes(&info.size_info, &info.indices, planes)
            .is_err()
        {
            return None;
        }

        let data = CachedData::new(buf);
        caches.yuv.add(self.unique_id(), data.clone(), info);
        Some(YuvPlanes {
            data,
            info,
            offsets,
        })
    }

    /// Assemble the cached planes into an RGB texture via a YUV-to-RGB pass
    /// with color-space correction.
    pub fn texture_view_from_planes(
        &self,
        ctx: &RecordingContext,
        caches: &Caches,
        budgeted: Budgeted,
    ) -> Option<TextureView> {
        let planes = self.get_planes(caches)?;
        let size_info = planes.info.size_info;
        let size0 = size_info.planes[0];

        let mut views: [Option<TextureView>; MAX_PLANES] = [None, None, None, None];
        for i in 0..MAX_PLANES {
            if size_info.plane_is_empty(i) {
                continue;
            }
            let dim = size_info.planes[i];
            // Mismatched plane sizes get exact-fit textures rather than a
            // sampling domain on the draw; matching sizes may share pooled
            // storage.
            let fit = if (dim.width, dim.height) != (size0.width, size0.height) {
                BackingFit::Exact
            } else {
                BackingFit::Approx
            };
            // The plane bitmap holds a ref on the cached backing, so the
            // bytes outlive this draw no matter when the cache evicts.
            let bitmap = Bitmap::from_cached(
                ImageInfo::new_a8(dim.width, dim.height),
                dim.row_bytes,
                planes.data.clone(),
                planes.plane_offset(i),
            )
            .ok()?;
            views[i] = Some(bitmap_to_texture(
                ctx,
                &bitmap,
                fit,
                TexGenPolicy::NewUncachedBudgeted,
                Mipmapped::No,
            )?);
        }

        let mut target = RenderTargetContext::make(
            ctx,
            to_gpu_color_type(self.info().color_type),
            self.info().dimensions(),
            Mipmapped::No,
            SurfaceOrigin::TopLeft,
            budgeted,
            BackingFit::Exact,
        )?;

        let yuv = yuv_to_rgb(
            views,
            planes.info.indices,
            planes.info.color_space,
            Filter::Nearest,
        );
        // The pixels after yuv->rgb are in the generator's color space; when
        // a recoloring changed this image's space, correct for it here and
        // nowhere else.
        let processor = color_space_xform(
            yuv,
            self.shared().info().color_space,
            AlphaType::Opaque,
            self.info().color_space,
            AlphaType::Opaque,
        );
        let paint = Paint {
            processor,
            blend: BlendMode::Src,
        };
        let rect = Rect::new(0.0, 0.0, f64::from(size0.width), f64::from(size0.height));
        let matrix = size_info.origin.to_matrix(size0.width, size0.height);
        target.draw_rect(&paint, matrix, rect);
        Some(target.read_surface_view(ctx))
    }

    /// The four-stage texture acquisition cascade.
    ///
    /// 1. a pre-existing cached texture, 2. the generator's native GPU path,
    /// 3. YUV planes converted on the GPU, 4. decoded RGBA uploaded. The
    /// outcome (or overall failure) is recorded exactly once on the
    /// context's stats.
    #[tracing::instrument(skip_all)]
    pub fn lock_texture_proxy_view(
        self: &Arc<Self>,
        ctx: &mut RecordingContext,
        caches: &Caches,
        policy: TexGenPolicy,
        mipmapped: Mipmapped,
    ) -> Option<TextureView> {
        let key = (policy == TexGenPolicy::Draw)
            .then(|| UniqueKey::from_image_id(self.unique_id(), self.info().bounds()));

        let ct = self.gpu_color_type(ctx.caps());

        // 1. Check the cache for a pre-existing texture.
        if let Some(key) = &key
            && let Some(proxy) = ctx.proxy_provider().find_or_create_proxy_by_unique_key(key)
        {
            ctx.stats().record(LockTexturePath::PreExisting);
            let swizzle = ctx.caps().read_swizzle(proxy.format(), ct);
            let view = TextureView::new(proxy, SurfaceOrigin::TopLeft, swizzle);
            if mipmapped == Mipmapped::No || view.mipmapped() == Mipmapped::Yes {
                return Some(view);
            }
            let Some(mipped) = copy_base_to_mipmap(ctx, &view) else {
                // Could not make the mipped copy; a non-mipped view is a
                // weaker answer than requested but better than none.
                return Some(view);
            };
            ctx.proxy_provider().remove_unique_key(view.proxy());
            self.install_key(ctx, key, &mipped);
            return Some(mipped);
        }

        // 2. Ask the generator to natively create one.
        {
            let info = *self.info();
            let view = {
                let mut generator = self.shared().scoped();
                generator.generate_texture(ctx, &info, (0, 0), mipmapped, policy)
            };
            if let Some(view) = view {
                ctx.stats().record(LockTexturePath::Native);
                if let Some(key) = &key {
                    self.install_key(ctx, key, &view);
                }
                return Some(view);
            }
        }

        // 3. YUV planes the GPU can convert. Skipped when mipping: the
        //    planar pass produces no mip chain, the bitmap path will.
        if mipmapped == Mipmapped::No && !ctx.options().disable_gpu_yuv_conversion {
            let budgeted = if policy == TexGenPolicy::NewUncachedUnbudgeted {
                Budgeted::No
            } else {
                Budgeted::Yes
            };
            if let Some(view) = self.texture_view_from_planes(ctx, caches, budgeted) {
                ctx.stats().record(LockTexturePath::Yuv);
                if let Some(key) = &key {
                    self.install_key(ctx, key, &view);
                }
                return Some(view);
            }
        }

        // 4. Decoded RGBA bitmap the GPU can convert. The maker is always
        //    given an uncached policy: caching happens here via the key.
        let hint = if policy == TexGenPolicy::Draw {
            CachingHint::Allow
        } else {
            CachingHint::Disallow
        };
        if let Ok(bitmap) = self.read_only_pixels(caches, hint) {
            let maker_policy = if policy == TexGenPolicy::NewUncachedUnbudgeted {
                TexGenPolicy::NewUncachedUnbudgeted
            } else {
                TexGenPolicy::NewUncachedBudgeted
            };
            if let Some(view) =
                bitmap_to_texture(ctx, &bitmap, BackingFit::Exact, maker_policy, mipmapped)
            {
                ctx.stats().record(LockTexturePath::Rgba);
                if let Some(key) = &key {
                    self.install_key(ctx, key, &view);
                }
                return Some(view);
            }
        }

        ctx.stats().record(LockTexturePath::Failure);
        None
    }

    /// Realize this image as a texture-backed image.
    pub fn make_texture_image(
        self: &Arc<Self>,
        caches: &Caches,
        ctx: &mut RecordingContext,
    ) -> LumoResult<Arc<TextureImage>> {
        let view = self
            .lock_texture_proxy_view(ctx, caches, TexGenPolicy::Draw, Mipmapped::No)
            .ok_or_else(|| LumoError::decode("no texture path produced a view"))?;
        Ok(TextureImage::new(view, *self.info(), self.unique_id()))
    }

    /// Register a listener fired once when this image's cached texture key
    /// is evicted.
    pub fn add_unique_id_listener(&self, listener: Arc<InvalidationListener>) {
        self.listeners.add(listener);
    }

    /// The color type textures of this image are requested in, falling back
    /// to RGBA when the backend has no format for the native type.
    fn gpu_color_type(&self, caps: &Caps) -> GpuColorType {
        let ct = to_gpu_color_type(self.info().color_type);
        if caps.default_backend_format(ct).is_none() {
            GpuColorType::Rgba8888
        } else {
            ct
        }
    }

    fn install_key(&self, ctx: &RecordingContext, key: &UniqueKey, view: &TextureView) {
        let listener = ctx
            .proxy_provider()
            .make_invalidation_listener(*key, ctx.id());
        self.add_unique_id_listener(listener.clone());
        ctx.proxy_provider()
            .assign_unique_key(*key, view.proxy(), listener);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/lazy_texture.rs"]
mod tests;
