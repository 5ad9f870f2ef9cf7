use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::cache::key::BitmapDesc;
use crate::foundation::error::LumoResult;
use crate::foundation::id::UniqueId;
use crate::pixels::info::ImageInfo;
use crate::pixels::pixmap::{Bitmap, PixmapMut};

/// Cache-owned writable storage handed out by [`BitmapCache::alloc`].
///
/// The caller decodes straight into the cache's storage through `pixmap()`
/// and then commits; dropping an uncommitted alloc releases the storage
/// without publishing anything, so a failed decode never poisons the cache.
#[derive(Debug)]
pub struct BitmapCacheAlloc {
    desc: BitmapDesc,
    info: ImageInfo,
    row_bytes: usize,
    pixels: Vec<u8>,
}

impl BitmapCacheAlloc {
    pub fn pixmap(&mut self) -> PixmapMut<'_> {
        PixmapMut::from_parts(self.info, self.row_bytes, &mut self.pixels)
    }
}

#[derive(Debug)]
struct Entry {
    bitmap: Bitmap,
    bytes: usize,
    last_used: u64,
}

#[derive(Debug)]
pub(crate) struct BitmapCacheInner {
    entries: HashMap<BitmapDesc, Entry>,
    budget_bytes: usize,
    total_bytes: usize,
    tick: u64,
}

impl BitmapCacheInner {
    fn touch(&mut self, desc: &BitmapDesc) -> Option<Bitmap> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(desc)?;
        entry.last_used = tick;
        Some(entry.bitmap.clone())
    }

    fn evict_over_budget(&mut self) {
        while self.total_bytes > self.budget_bytes {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(desc, _)| *desc)
            else {
                return;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.total_bytes -= evicted.bytes;
            }
        }
    }

    pub(crate) fn purge_by_id(&mut self, unique_id: UniqueId) {
        let stale: Vec<BitmapDesc> = self
            .entries
            .keys()
            .filter(|desc| desc.unique_id == unique_id)
            .copied()
            .collect();
        for desc in stale {
            if let Some(removed) = self.entries.remove(&desc) {
                self.total_bytes -= removed.bytes;
            }
        }
    }
}

/// Thread-safe cache of fully decoded immutable bitmaps, keyed by
/// [`BitmapDesc`]. Byte-budgeted with least-recently-used eviction.
#[derive(Debug)]
pub struct BitmapCache {
    inner: Arc<Mutex<BitmapCacheInner>>,
}

impl BitmapCache {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BitmapCacheInner {
                entries: HashMap::new(),
                budget_bytes,
                total_bytes: 0,
                tick: 0,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BitmapCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<BitmapCacheInner>> {
        Arc::downgrade(&self.inner)
    }

    pub fn find(&self, desc: &BitmapDesc) -> Option<Bitmap> {
        self.lock().touch(desc)
    }

    /// Probe without bumping recency; used by tests and diagnostics.
    pub fn contains(&self, desc: &BitmapDesc) -> bool {
        self.lock().entries.contains_key(desc)
    }

    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }

    /// Reserve cache-owned storage for a pending decode.
    pub fn alloc(&self, desc: BitmapDesc, info: &ImageInfo) -> LumoResult<BitmapCacheAlloc> {
        let row_bytes = info.min_row_bytes();
        let size = info.compute_byte_size(row_bytes)?;
        Ok(BitmapCacheAlloc {
            desc,
            info: *info,
            row_bytes,
            pixels: vec![0u8; size],
        })
    }

    /// Freeze a fully decoded alloc into the cache and return the published
    /// immutable bitmap. If a concurrent decode already committed the same
    /// descriptor, the first add wins and its bitmap is returned.
    pub fn commit(&self, alloc: BitmapCacheAlloc) -> Bitmap {
        let BitmapCacheAlloc {
            desc,
            info,
            row_bytes,
            pixels,
        } = alloc;
        let bytes = pixels.len();
        let bitmap = Bitmap::from_parts(info, row_bytes, pixels);

        let mut inner = self.lock();
        if let Some(existing) = inner.touch(&desc) {
            return existing;
        }
        inner.tick += 1;
        let last_used = inner.tick;
        inner.entries.insert(
            desc,
            Entry {
                bitmap: bitmap.clone(),
                bytes,
                last_used,
            },
        );
        inner.total_bytes += bytes;
        inner.evict_over_budget();
        bitmap
    }

    /// Drop every record belonging to an image identity (raster-cache
    /// staleness, fired when a cached image is torn down).
    pub fn purge_by_id(&self, unique_id: UniqueId) {
        self.lock().purge_by_id(unique_id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/bitmap.rs"]
mod tests;
