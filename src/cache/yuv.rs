use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::cache::resource::CachedData;
use crate::foundation::id::UniqueId;
use crate::yuv::YuvPlanesInfo;

#[derive(Debug)]
struct Entry {
    data: CachedData,
    info: YuvPlanesInfo,
    last_used: u64,
}

/// Thread-safe cache of decoded YUV plane buffers keyed by image identity.
///
/// Byte-budgeted with least-recently-used eviction. Eviction only drops the
/// cache's ref on the backing data; plane bitmaps and textures derived from
/// it keep it alive until they drop.
#[derive(Debug)]
pub struct YuvPlanesCache {
    inner: Mutex<YuvInner>,
}

#[derive(Debug)]
struct YuvInner {
    entries: HashMap<UniqueId, Entry>,
    budget_bytes: usize,
    total_bytes: usize,
    tick: u64,
}

impl YuvPlanesCache {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(YuvInner {
                entries: HashMap::new(),
                budget_bytes,
                total_bytes: 0,
                tick: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, YuvInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up cached planes, bumping recency and taking a ref on the
    /// backing data.
    pub fn find_and_ref(&self, unique_id: UniqueId) -> Option<(CachedData, YuvPlanesInfo)> {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        let entry = inner.entries.get_mut(&unique_id)?;
        entry.last_used = tick;
        Some((entry.data.clone(), entry.info))
    }

    /// Publish decoded planes. The first add for an identity wins.
    pub fn add(&self, unique_id: UniqueId, data: CachedData, info: YuvPlanesInfo) {
        let mut inner = self.lock();
        if inner.entries.contains_key(&unique_id) {
            return;
        }
        inner.tick += 1;
        let last_used = inner.tick;
        let bytes = data.len();
        inner.entries.insert(
            unique_id,
            Entry {
                data,
                info,
                last_used,
            },
        );
        inner.total_bytes += bytes;

        while inner.total_bytes > inner.budget_bytes {
            let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(id, _)| *id)
            else {
                return;
            };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                inner.total_bytes -= evicted.data.len();
            }
        }
    }

    pub fn contains(&self, unique_id: UniqueId) -> bool {
        self.lock().entries.contains_key(&unique_id)
    }

    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }

    /// Drop one entry (test hook standing in for external cache pressure).
    pub fn evict(&self, unique_id: UniqueId) {
        let mut inner = self.lock();
        if let Some(evicted) = inner.entries.remove(&unique_id) {
            inner.total_bytes -= evicted.data.len();
        }
    }
}
