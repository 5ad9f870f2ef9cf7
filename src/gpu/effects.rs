use crate::pixels::convert::convert_rgb_f32;
use crate::pixels::info::{AlphaType, ColorSpace};
use crate::gpu::texture::TextureView;
use crate::yuv::{YuvColorSpace, YuvPlaneIndices, MAX_PLANES};

/// Texture sampling mode for the YUV effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Nearest,
}

/// A per-pixel color program, evaluated by the software render target.
///
/// Mirrors a GPU fragment processor chain: leaves sample textures, interior
/// nodes transform their child's output.
#[derive(Debug)]
pub enum FragmentProcessor {
    YuvToRgb {
        views: [Option<TextureView>; MAX_PLANES],
        indices: YuvPlaneIndices,
        color_space: YuvColorSpace,
        filter: Filter,
    },
    ColorSpaceXform {
        child: Box<FragmentProcessor>,
        src: Option<ColorSpace>,
        src_alpha: AlphaType,
        dst: Option<ColorSpace>,
        dst_alpha: AlphaType,
    },
}

/// Assemble sampled YUV planes into RGB.
pub fn yuv_to_rgb(
    views: [Option<TextureView>; MAX_PLANES],
    indices: YuvPlaneIndices,
    color_space: YuvColorSpace,
    filter: Filter,
) -> FragmentProcessor {
    FragmentProcessor::YuvToRgb {
        views,
        indices,
        color_space,
        filter,
    }
}

/// Convert the child's output from one color space to another.
///
/// A missing space on either side disables the conversion, matching the
/// pixel-copy path.
pub fn color_space_xform(
    child: FragmentProcessor,
    src: Option<ColorSpace>,
    src_alpha: AlphaType,
    dst: Option<ColorSpace>,
    dst_alpha: AlphaType,
) -> FragmentProcessor {
    FragmentProcessor::ColorSpaceXform {
        child: Box::new(child),
        src,
        src_alpha,
        dst,
        dst_alpha,
    }
}

impl FragmentProcessor {
    /// Evaluate at a source-space pixel center inside a drawing of logical
    /// size `draw_size` (plane textures smaller than the draw are sampled at
    /// their proportional coordinate).
    pub(crate) fn eval(&self, x: f32, y: f32, draw_size: (f32, f32)) -> [f32; 4] {
        match self {
            Self::YuvToRgb {
                views,
                indices,
                color_space,
                filter: Filter::Nearest,
            } => {
                let sample = |plane: usize| -> f32 {
                    let Some(view) = &views[plane] else { return 0.0 };
                    let dims = view.dimensions();
                    let px = (x / draw_size.0 * dims.width as f32).floor() as i32;
                    let py = (y / draw_size.1 * dims.height as f32).floor() as i32;
                    view.proxy().texel(px, py)[0]
                };
                let rgb = color_space.to_rgb(
                    sample(indices.y),
                    sample(indices.u),
                    sample(indices.v),
                );
                let a = indices.a.map_or(1.0, |plane| sample(plane));
                [rgb[0], rgb[1], rgb[2], a]
            }
            Self::ColorSpaceXform {
                child, src, dst, ..
            } => {
                let px = child.eval(x, y, draw_size);
                match (src, dst) {
                    (Some(s), Some(d)) if s != d => {
                        let rgb = convert_rgb_f32(*s, *d, [px[0], px[1], px[2]]);
                        [rgb[0], rgb[1], rgb[2], px[3]]
                    }
                    _ => px,
                }
            }
        }
    }
}
