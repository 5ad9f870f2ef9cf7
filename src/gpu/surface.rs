use kurbo::{Affine, Point, Rect};
use rayon::prelude::*;

use crate::foundation::geom::ISize;
use crate::gpu::context::RecordingContext;
use crate::gpu::effects::FragmentProcessor;
use crate::gpu::texture::{
    BackendFormat, BackingFit, Budgeted, GpuColorType, Mipmapped, SurfaceOrigin, TextureProxy,
    TextureView,
};

/// How fragment output combines with the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// Replace the destination.
    Src,
}

/// Color program plus blend state for one draw.
#[derive(Debug)]
pub struct Paint {
    pub processor: FragmentProcessor,
    pub blend: BlendMode,
}

/// A drawable target that becomes a texture view on completion.
///
/// The software stand-in for a deferred GPU render pass: fragment evaluation
/// runs on the CPU, rows in parallel.
#[derive(Debug)]
pub struct RenderTargetContext {
    ct: GpuColorType,
    format: BackendFormat,
    dimensions: ISize,
    mipmapped: Mipmapped,
    origin: SurfaceOrigin,
    budgeted: Budgeted,
    fit: BackingFit,
    texels: Vec<u8>,
}

impl RenderTargetContext {
    pub fn make(
        ctx: &RecordingContext,
        ct: GpuColorType,
        dimensions: ISize,
        mipmapped: Mipmapped,
        origin: SurfaceOrigin,
        budgeted: Budgeted,
        fit: BackingFit,
    ) -> Option<Self> {
        if dimensions.is_empty() {
            return None;
        }
        if mipmapped == Mipmapped::Yes && !ctx.caps().supports_mipmaps {
            return None;
        }
        let format = ctx
            .caps()
            .default_backend_format(ct)
            .unwrap_or(BackendFormat::Rgba8);
        let size = dimensions.width as usize * dimensions.height as usize
            * format.bytes_per_texel();
        Some(Self {
            ct,
            format,
            dimensions,
            mipmapped,
            origin,
            budgeted,
            fit,
            texels: vec![0u8; size],
        })
    }

    pub fn color_type(&self) -> GpuColorType {
        self.ct
    }

    /// Fill `rect` (in source space, mapped through `matrix`) by evaluating
    /// the paint's fragment processor at every covered destination pixel.
    pub fn draw_rect(&mut self, paint: &Paint, matrix: Affine, rect: Rect) {
        let BlendMode::Src = paint.blend;
        let inverse = if matrix.determinant().abs() < f64::EPSILON {
            return;
        } else {
            matrix.inverse()
        };

        let width = self.dimensions.width as usize;
        let draw_size = (rect.width() as f32, rect.height() as f32);
        let bpt = self.format.bytes_per_texel();
        let format = self.format;
        let row_bytes = width * bpt;

        self.texels
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..width {
                    let dst = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    let src = inverse * dst;
                    if src.x < rect.x0 || src.x >= rect.x1 || src.y < rect.y0 || src.y >= rect.y1
                    {
                        continue;
                    }
                    let px = paint
                        .processor
                        .eval(src.x as f32, src.y as f32, draw_size);
                    store_texel(format, px, &mut row[x * bpt..(x + 1) * bpt]);
                }
            });
    }

    /// Freeze the drawn pixels into a texture view.
    pub fn read_surface_view(self, _ctx: &RecordingContext) -> TextureView {
        let proxy = TextureProxy::new(
            self.dimensions,
            self.format,
            self.mipmapped,
            self.budgeted,
            self.fit,
            self.texels,
        );
        TextureView::new(proxy, self.origin, crate::gpu::texture::Swizzle::RGBA)
    }
}

fn store_texel(format: BackendFormat, px: [f32; 4], out: &mut [u8]) {
    let q = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    match format {
        BackendFormat::R8 => out[0] = q(px[0]),
        BackendFormat::Rgba8 => {
            out.copy_from_slice(&[q(px[0]), q(px[1]), q(px[2]), q(px[3])]);
        }
        BackendFormat::Bgra8 => {
            out.copy_from_slice(&[q(px[2]), q(px[1]), q(px[0]), q(px[3])]);
        }
    }
}

/// Copy a view's base level into a fresh mipmapped texture.
///
/// Returns `None` when the backend cannot allocate mip chains; callers fall
/// back to the non-mipmapped view.
pub fn copy_base_to_mipmap(ctx: &RecordingContext, view: &TextureView) -> Option<TextureView> {
    if !ctx.caps().supports_mipmaps {
        return None;
    }
    let proxy = view.proxy();
    let mipped = TextureProxy::new(
        proxy.dimensions(),
        proxy.format(),
        Mipmapped::Yes,
        proxy.budgeted(),
        BackingFit::Exact,
        proxy.texels().to_vec(),
    );
    Some(TextureView::new(mipped, view.origin(), view.swizzle()))
}
