use crate::foundation::geom::{IRect, ISize};
use crate::foundation::id::UniqueId;
use crate::foundation::math::Fnv1a64;

/// Bitmap cache key: image identity plus the realized geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitmapDesc {
    pub unique_id: UniqueId,
    pub subset: Option<IRect>,
    pub scaled_size: ISize,
}

impl BitmapDesc {
    /// Descriptor for an unscaled, unsubsetted realization of an image.
    pub fn from_image(unique_id: UniqueId, dimensions: ISize) -> Self {
        Self {
            unique_id,
            subset: None,
            scaled_size: dimensions,
        }
    }
}

/// Content-addressed key binding an image identity to a cached GPU texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub unique_id: UniqueId,
    pub bounds: IRect,
    fingerprint: u64,
}

impl UniqueKey {
    pub fn from_image_id(unique_id: UniqueId, bounds: IRect) -> Self {
        let mut h = Fnv1a64::new_default();
        h.write_u32(unique_id.as_u32());
        h.write_i32(bounds.left);
        h.write_i32(bounds.top);
        h.write_i32(bounds.right);
        h.write_i32(bounds.bottom);
        Self {
            unique_id,
            bounds,
            fingerprint: h.finish(),
        }
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}
