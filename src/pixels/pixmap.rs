use std::sync::Arc;

use crate::cache::resource::CachedData;
use crate::foundation::error::{LumoError, LumoResult};
use crate::pixels::convert;
use crate::pixels::info::{ColorSpace, ImageInfo};

/// Writable pixel destination handed to a generator.
///
/// The view borrows its storage; the generator fills it in the color type and
/// color space the info declares. `set_color_space` retargets only the
/// declared interpretation, which is how the reinterpret path asks a
/// generator to paint in one space while the pixels are later read as
/// another.
#[derive(Debug)]
pub struct PixmapMut<'a> {
    info: ImageInfo,
    row_bytes: usize,
    bytes: &'a mut [u8],
}

impl<'a> PixmapMut<'a> {
    pub fn new(info: ImageInfo, row_bytes: usize, bytes: &'a mut [u8]) -> LumoResult<Self> {
        let needed = info.compute_byte_size(row_bytes)?;
        if bytes.len() < needed {
            return Err(LumoError::validation(
                "pixmap storage is smaller than its info requires",
            ));
        }
        Ok(Self {
            info,
            row_bytes,
            bytes,
        })
    }

    /// Non-validating constructor for storage the caller already sized for
    /// `info` (cache-owned allocations).
    pub(crate) fn from_parts(info: ImageInfo, row_bytes: usize, bytes: &'a mut [u8]) -> Self {
        debug_assert!(info.compute_byte_size(row_bytes).is_ok_and(|n| bytes.len() >= n));
        Self {
            info,
            row_bytes,
            bytes,
        }
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn set_color_space(&mut self, color_space: Option<ColorSpace>) {
        self.info = self.info.with_color_space(color_space);
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    pub fn row_mut(&mut self, y: i32) -> &mut [u8] {
        let start = y as usize * self.row_bytes;
        &mut self.bytes[start..start + self.info.min_row_bytes()]
    }
}

#[derive(Clone, Debug)]
enum PixelStorage {
    Owned(Arc<Vec<u8>>),
    /// Window into shared cached bytes; the clone held here keeps the
    /// backing alive for as long as this bitmap (or anything derived from
    /// it) lives, regardless of cache eviction order.
    Cached {
        data: CachedData,
        offset: usize,
        len: usize,
    },
}

/// Immutable pixels plus their interpretation.
///
/// A bitmap always has backing storage; there is no unallocated state.
#[derive(Clone, Debug)]
pub struct Bitmap {
    info: ImageInfo,
    row_bytes: usize,
    storage: PixelStorage,
}

impl Bitmap {
    pub fn from_vec(info: ImageInfo, row_bytes: usize, pixels: Vec<u8>) -> LumoResult<Self> {
        let needed = info.compute_byte_size(row_bytes)?;
        if pixels.len() < needed {
            return Err(LumoError::validation(
                "bitmap storage is smaller than its info requires",
            ));
        }
        Ok(Self {
            info,
            row_bytes,
            storage: PixelStorage::Owned(Arc::new(pixels)),
        })
    }

    /// Non-validating variant of [`Bitmap::from_vec`] for storage the caller
    /// already sized for `info`.
    pub(crate) fn from_parts(info: ImageInfo, row_bytes: usize, pixels: Vec<u8>) -> Self {
        debug_assert!(info.compute_byte_size(row_bytes).is_ok_and(|n| pixels.len() >= n));
        Self {
            info,
            row_bytes,
            storage: PixelStorage::Owned(Arc::new(pixels)),
        }
    }

    /// Wrap a window of shared cached bytes (used for YUV plane bitmaps).
    pub(crate) fn from_cached(
        info: ImageInfo,
        row_bytes: usize,
        data: CachedData,
        offset: usize,
    ) -> LumoResult<Self> {
        let len = info.compute_byte_size(row_bytes)?;
        if offset.checked_add(len).is_none_or(|end| end > data.len()) {
            return Err(LumoError::validation(
                "cached window exceeds the backing data",
            ));
        }
        Ok(Self {
            info,
            row_bytes,
            storage: PixelStorage::Cached { data, offset, len },
        })
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.storage {
            PixelStorage::Owned(pixels) => pixels,
            PixelStorage::Cached { data, offset, len } => &data.bytes()[*offset..*offset + *len],
        }
    }

    pub fn row(&self, y: i32) -> &[u8] {
        let start = y as usize * self.row_bytes;
        &self.bytes()[start..start + self.info.min_row_bytes()]
    }

    /// Copy-and-convert a window of this bitmap into `dst`.
    pub fn read_pixels(
        &self,
        dst: &mut PixmapMut<'_>,
        src_x: i32,
        src_y: i32,
    ) -> LumoResult<()> {
        convert::copy_pixels(&self.info, self.row_bytes, self.bytes(), dst, src_x, src_y)
    }

    /// Copy out a sub-rectangle as a new tightly packed bitmap.
    pub fn extract_subset(&self, subset: crate::foundation::geom::IRect) -> LumoResult<Bitmap> {
        if !self.info.bounds().contains(subset) {
            return Err(LumoError::validation(
                "subset must be non-empty and inside the bitmap bounds",
            ));
        }
        let sub_info = self.info.with_dimensions(subset.size());
        let row_bytes = sub_info.min_row_bytes();
        let mut pixels = vec![0u8; sub_info.compute_byte_size(row_bytes)?];
        {
            let mut dst = PixmapMut::new(sub_info, row_bytes, &mut pixels)?;
            self.read_pixels(&mut dst, subset.left, subset.top)?;
        }
        Bitmap::from_vec(sub_info, row_bytes, pixels)
    }
}
