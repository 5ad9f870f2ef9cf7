use crate::cache::resource::CachedData;
use crate::foundation::geom::EncodedOrigin;

/// Maximum number of planes a planar source can report (Y, U, V, A).
pub const MAX_PLANES: usize = 4;

/// Dimensions and row stride of one plane. An absent plane is all zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneDim {
    pub width: i32,
    pub height: i32,
    pub row_bytes: usize,
}

impl PlaneDim {
    pub fn new(width: i32, height: i32, row_bytes: usize) -> Self {
        Self {
            width,
            height,
            row_bytes,
        }
    }

    pub fn byte_size(self) -> usize {
        self.row_bytes * self.height.max(0) as usize
    }
}

/// Per-plane sizes reported by a generator's YUV capability probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct YuvSizeInfo {
    pub planes: [PlaneDim; MAX_PLANES],
    pub origin: EncodedOrigin,
}

impl YuvSizeInfo {
    /// Absent planes report a zero stride.
    pub fn plane_is_empty(&self, i: usize) -> bool {
        self.planes[i].row_bytes == 0
    }

    /// A usable size info has a non-empty first plane and, for every plane,
    /// a zero stride exactly when the height is zero and a stride covering
    /// the width otherwise.
    pub fn is_valid(&self) -> bool {
        if self.plane_is_empty(0) {
            return false;
        }
        self.planes.iter().all(|p| {
            if p.row_bytes == 0 {
                p.height == 0
            } else {
                p.height > 0 && p.width > 0 && p.row_bytes >= p.width as usize
            }
        })
    }
}

/// Which plane carries each of the Y, U, V (and optional alpha) components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YuvPlaneIndices {
    pub y: usize,
    pub u: usize,
    pub v: usize,
    pub a: Option<usize>,
}

impl YuvPlaneIndices {
    /// The common three-plane I420 arrangement.
    pub fn planar() -> Self {
        Self {
            y: 0,
            u: 1,
            v: 2,
            a: None,
        }
    }
}

/// Color matrix used to turn sampled YUV values into RGB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YuvColorSpace {
    /// Full-range BT.601 (the JPEG convention).
    Jpeg,
    /// Limited-range BT.601.
    Rec601Limited,
    /// Limited-range BT.709.
    Rec709Limited,
    /// Planes are already RGB-like; sampled values pass through.
    Identity,
}

impl YuvColorSpace {
    /// Convert one sampled (y, u, v) triple, each in [0, 1], to RGB.
    pub(crate) fn to_rgb(self, y: f32, u: f32, v: f32) -> [f32; 3] {
        let (y, cb, cr, kr_coeffs) = match self {
            Self::Identity => return [y, u, v],
            Self::Jpeg => (y, u - 0.5, v - 0.5, (1.402f32, 0.344_136f32, 0.714_136f32, 1.772f32)),
            Self::Rec601Limited => (
                (y * 255.0 - 16.0) / 219.0,
                (u * 255.0 - 128.0) / 224.0,
                (v * 255.0 - 128.0) / 224.0,
                (1.402, 0.344_136, 0.714_136, 1.772),
            ),
            Self::Rec709Limited => (
                (y * 255.0 - 16.0) / 219.0,
                (u * 255.0 - 128.0) / 224.0,
                (v * 255.0 - 128.0) / 224.0,
                (1.5748, 0.187_324, 0.468_124, 1.8556),
            ),
        };
        let (rv, gu, gv, bu) = kr_coeffs;
        [
            (y + rv * cr).clamp(0.0, 1.0),
            (y - gu * cb - gv * cr).clamp(0.0, 1.0),
            (y + bu * cb).clamp(0.0, 1.0),
        ]
    }
}

/// Everything a generator reports about its planar representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YuvPlanesInfo {
    pub size_info: YuvSizeInfo,
    pub indices: YuvPlaneIndices,
    pub color_space: YuvColorSpace,
}

/// The single source of the plane layout rule.
///
/// Plane 0 starts at offset 0; each following plane starts where the
/// previous one ends (`row_bytes * height`). Absent planes occupy no bytes.
/// Returns the per-plane offsets and the total backing size. Both the
/// cache-hit and cache-miss paths derive their layout from here.
pub fn plane_offsets(info: &YuvSizeInfo) -> ([usize; MAX_PLANES], usize) {
    let mut offsets = [0usize; MAX_PLANES];
    let mut total = 0usize;
    for i in 0..MAX_PLANES {
        offsets[i] = total;
        total += info.planes[i].byte_size();
    }
    (offsets, total)
}

/// Cached planar pixels: one contiguous backing buffer plus the layout to
/// slice it into planes.
#[derive(Clone, Debug)]
pub struct YuvPlanes {
    pub data: CachedData,
    pub info: YuvPlanesInfo,
    pub(crate) offsets: [usize; MAX_PLANES],
}

impl YuvPlanes {
    /// Bytes of plane `i`, or `None` for an absent plane.
    pub fn plane(&self, i: usize) -> Option<&[u8]> {
        if self.info.size_info.plane_is_empty(i) {
            return None;
        }
        let start = self.offsets[i];
        let len = self.info.size_info.planes[i].byte_size();
        Some(&self.data.bytes()[start..start + len])
    }

    pub(crate) fn plane_offset(&self, i: usize) -> usize {
        self.offsets[i]
    }
}
