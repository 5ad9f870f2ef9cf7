use crate::gpu::context::RecordingContext;
use crate::gpu::texture::{
    to_gpu_color_type, BackendFormat, BackingFit, Budgeted, Mipmapped, SurfaceOrigin,
    TexGenPolicy, TextureProxy, TextureView,
};
use crate::pixels::info::ColorType;
use crate::pixels::pixmap::Bitmap;

/// Upload a bitmap as a texture view.
///
/// The maker never caches: callers that want a cached texture bind a unique
/// key themselves, which is why the cascade always passes an uncached
/// policy here.
pub fn bitmap_to_texture(
    ctx: &RecordingContext,
    bitmap: &Bitmap,
    fit: BackingFit,
    policy: TexGenPolicy,
    mipmapped: Mipmapped,
) -> Option<TextureView> {
    let info = bitmap.info();
    if info.is_empty() {
        return None;
    }
    let ct = to_gpu_color_type(info.color_type);
    let format = ctx.caps().default_backend_format(ct);

    let width = info.width as usize;
    let height = info.height as usize;
    let (format, texels) = match format {
        Some(format) => {
            let bpt = format.bytes_per_texel();
            debug_assert_eq!(bpt, info.color_type.bytes_per_pixel());
            let mut texels = vec![0u8; width * height * bpt];
            for y in 0..info.height {
                let row = bitmap.row(y);
                texels[y as usize * width * bpt..(y as usize + 1) * width * bpt]
                    .copy_from_slice(row);
            }
            (format, texels)
        }
        // No native format for this color type: upload converted RGBA bytes.
        None => (BackendFormat::Rgba8, to_rgba_texels(bitmap)),
    };

    let mipmapped = match mipmapped {
        Mipmapped::Yes if ctx.caps().supports_mipmaps => Mipmapped::Yes,
        _ => Mipmapped::No,
    };
    let budgeted = if policy == TexGenPolicy::NewUncachedUnbudgeted {
        Budgeted::No
    } else {
        Budgeted::Yes
    };

    let proxy = TextureProxy::new(
        bitmap.info().dimensions(),
        format,
        mipmapped,
        budgeted,
        fit,
        texels,
    );
    let swizzle = ctx.caps().read_swizzle(format, ct);
    Some(TextureView::new(proxy, SurfaceOrigin::TopLeft, swizzle))
}

fn to_rgba_texels(bitmap: &Bitmap) -> Vec<u8> {
    let info = bitmap.info();
    let width = info.width as usize;
    let mut texels = vec![0u8; width * info.height as usize * 4];
    for y in 0..info.height {
        let row = bitmap.row(y);
        let out = &mut texels[y as usize * width * 4..(y as usize + 1) * width * 4];
        match info.color_type {
            ColorType::Bgra8888 => {
                for x in 0..width {
                    let px = &row[x * 4..x * 4 + 4];
                    out[x * 4..x * 4 + 4].copy_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
            ColorType::Rgba8888 => out.copy_from_slice(row),
            ColorType::Alpha8 => {
                for x in 0..width {
                    out[x * 4 + 3] = row[x];
                }
            }
            ColorType::Gray8 => {
                for x in 0..width {
                    let g = row[x];
                    out[x * 4..x * 4 + 4].copy_from_slice(&[g, g, g, 255]);
                }
            }
        }
    }
    texels
}
