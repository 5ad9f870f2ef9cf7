use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::math::mul_div255_u8;
use crate::pixels::info::{AlphaType, ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::PixmapMut;

/// Copy a window of `src` into `dst`, converting color type, alpha type, and
/// color space as the two infos require.
pub(crate) fn copy_pixels(
    src_info: &ImageInfo,
    src_row_bytes: usize,
    src_bytes: &[u8],
    dst: &mut PixmapMut<'_>,
    src_x: i32,
    src_y: i32,
) -> LumoResult<()> {
    let dst_info = *dst.info();
    if src_x < 0
        || src_y < 0
        || src_x.checked_add(dst_info.width).is_none_or(|r| r > src_info.width)
        || src_y.checked_add(dst_info.height).is_none_or(|b| b > src_info.height)
    {
        return Err(LumoError::validation(
            "read window falls outside the source bounds",
        ));
    }

    let src_bpp = src_info.color_type.bytes_per_pixel();
    let dst_bpp = dst_info.color_type.bytes_per_pixel();
    let spaces = match (src_info.color_space, dst_info.color_space) {
        (Some(s), Some(d)) if s != d => Some((s, d)),
        _ => None,
    };
    // Matching alpha types with no space conversion move as raw channel
    // permutations, byte-exact.
    let reinterpret_only = spaces.is_none() && src_info.alpha_type == dst_info.alpha_type;

    for y in 0..dst_info.height {
        let src_row_start = (src_y + y) as usize * src_row_bytes + src_x as usize * src_bpp;
        let src_row = &src_bytes[src_row_start..src_row_start + dst_info.width as usize * src_bpp];
        let dst_row = dst.row_mut(y);
        for x in 0..dst_info.width as usize {
            let px = load_px(src_info.color_type, &src_row[x * src_bpp..(x + 1) * src_bpp]);
            let px = if reinterpret_only {
                px
            } else {
                let mut px = to_unpremul(px, src_info.alpha_type);
                if let Some((s, d)) = spaces {
                    px = convert_space_u8(s, d, px);
                }
                from_unpremul(px, dst_info.alpha_type)
            };
            store_px(dst_info.color_type, px, &mut dst_row[x * dst_bpp..(x + 1) * dst_bpp]);
        }
    }
    Ok(())
}

fn load_px(ct: ColorType, bytes: &[u8]) -> [u8; 4] {
    match ct {
        ColorType::Alpha8 => [0, 0, 0, bytes[0]],
        ColorType::Gray8 => [bytes[0], bytes[0], bytes[0], 255],
        ColorType::Rgba8888 => [bytes[0], bytes[1], bytes[2], bytes[3]],
        ColorType::Bgra8888 => [bytes[2], bytes[1], bytes[0], bytes[3]],
    }
}

fn store_px(ct: ColorType, px: [u8; 4], out: &mut [u8]) {
    match ct {
        ColorType::Alpha8 => out[0] = px[3],
        ColorType::Gray8 => out[0] = luma_bt709(px),
        ColorType::Rgba8888 => out.copy_from_slice(&[px[0], px[1], px[2], px[3]]),
        ColorType::Bgra8888 => out.copy_from_slice(&[px[2], px[1], px[0], px[3]]),
    }
}

fn to_unpremul(px: [u8; 4], at: AlphaType) -> [u8; 4] {
    match at {
        AlphaType::Opaque => [px[0], px[1], px[2], 255],
        AlphaType::Unpremul => px,
        AlphaType::Premul => {
            let a = px[3];
            if a == 0 || a == 255 {
                return px;
            }
            let unpremul = |c: u8| ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)) as u8;
            [unpremul(px[0]), unpremul(px[1]), unpremul(px[2]), a]
        }
    }
}

fn from_unpremul(px: [u8; 4], at: AlphaType) -> [u8; 4] {
    match at {
        AlphaType::Opaque => [px[0], px[1], px[2], 255],
        AlphaType::Unpremul => px,
        AlphaType::Premul => {
            let a = u16::from(px[3]);
            [
                mul_div255_u8(u16::from(px[0]), a),
                mul_div255_u8(u16::from(px[1]), a),
                mul_div255_u8(u16::from(px[2]), a),
                px[3],
            ]
        }
    }
}

fn luma_bt709(px: [u8; 4]) -> u8 {
    let l = 0.2126 * f32::from(px[0]) + 0.7152 * f32::from(px[1]) + 0.0722 * f32::from(px[2]);
    l.round().clamp(0.0, 255.0) as u8
}

fn convert_space_u8(src: ColorSpace, dst: ColorSpace, px: [u8; 4]) -> [u8; 4] {
    let rgb = [
        f32::from(px[0]) / 255.0,
        f32::from(px[1]) / 255.0,
        f32::from(px[2]) / 255.0,
    ];
    let rgb = convert_rgb_f32(src, dst, rgb);
    let q = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    [q(rgb[0]), q(rgb[1]), q(rgb[2]), px[3]]
}

/// Convert linear-light or encoded RGB between the supported spaces.
///
/// All paths go through linear sRGB-gamut light so each space only has to
/// define its decode/encode pair.
pub(crate) fn convert_rgb_f32(src: ColorSpace, dst: ColorSpace, rgb: [f32; 3]) -> [f32; 3] {
    if src == dst {
        return rgb;
    }
    encode_from_linear(dst, decode_to_linear(src, rgb))
}

fn decode_to_linear(cs: ColorSpace, rgb: [f32; 3]) -> [f32; 3] {
    match cs {
        ColorSpace::LinearSrgb => rgb,
        ColorSpace::Srgb => rgb.map(srgb_decode),
        ColorSpace::DisplayP3 => mat_mul(&P3_TO_SRGB_LINEAR, rgb.map(srgb_decode)),
    }
}

fn encode_from_linear(cs: ColorSpace, rgb: [f32; 3]) -> [f32; 3] {
    match cs {
        ColorSpace::LinearSrgb => rgb,
        ColorSpace::Srgb => rgb.map(srgb_encode),
        ColorSpace::DisplayP3 => mat_mul(&SRGB_LINEAR_TO_P3, rgb).map(srgb_encode),
    }
}

fn srgb_decode(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn srgb_encode(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

const SRGB_LINEAR_TO_P3: [[f32; 3]; 3] = [
    [0.822_462, 0.177_538, 0.0],
    [0.033_194, 0.966_806, 0.0],
    [0.017_083, 0.072_397, 0.910_520],
];

const P3_TO_SRGB_LINEAR: [[f32; 3]; 3] = [
    [1.224_940, -0.224_940, 0.0],
    [-0.042_057, 1.042_057, 0.0],
    [-0.019_638, -0.078_636, 1.098_274],
];

fn mat_mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}
