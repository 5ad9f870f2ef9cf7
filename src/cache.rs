pub mod bitmap;
pub mod key;
pub mod resource;
pub mod yuv;

use crate::cache::bitmap::BitmapCache;
use crate::cache::resource::ResourceCache;
use crate::cache::yuv::YuvPlanesCache;

/// Byte budgets for the in-memory caches.
#[derive(Clone, Copy, Debug)]
pub struct CacheLimits {
    pub bitmap_bytes: usize,
    pub yuv_bytes: usize,
    /// Largest single backing buffer the resource cache will hand out.
    pub max_data_bytes: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            bitmap_bytes: 64 << 20,
            yuv_bytes: 32 << 20,
            max_data_bytes: 1 << 30,
        }
    }
}

/// The cache container threaded through pixel and texture accessors.
///
/// Passed explicitly rather than living in process globals; callers that
/// want sharing put it behind an `Arc`.
#[derive(Debug)]
pub struct Caches {
    pub bitmap: BitmapCache,
    pub yuv: YuvPlanesCache,
    pub resource: ResourceCache,
}

impl Caches {
    pub fn new() -> Self {
        Self::with_limits(CacheLimits::default())
    }

    pub fn with_limits(limits: CacheLimits) -> Self {
        Self {
            bitmap: BitmapCache::new(limits.bitmap_bytes),
            yuv: YuvPlanesCache::new(limits.yuv_bytes),
            resource: ResourceCache::new(limits.max_data_bytes),
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}
