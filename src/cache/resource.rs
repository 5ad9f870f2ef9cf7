use std::sync::Arc;

use crate::foundation::error::{LumoError, LumoResult};

/// Frozen, shareable byte buffer backing cached decode output.
///
/// Cloning is the ref; dropping the last clone releases the storage. The
/// writable phase happens before construction: callers fill a plain `Vec`
/// obtained from [`ResourceCache::new_cached_data`] and freeze it here once
/// fully populated, so a failed decode never publishes partial bytes.
#[derive(Clone, Debug)]
pub struct CachedData {
    bytes: Arc<Vec<u8>>,
}

impl CachedData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of live refs, including this one.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.bytes)
    }
}

/// Allocator front for cache-backed byte buffers.
#[derive(Debug)]
pub struct ResourceCache {
    max_data_bytes: usize,
}

impl ResourceCache {
    pub fn new(max_data_bytes: usize) -> Self {
        Self { max_data_bytes }
    }

    /// Allocate zeroed writable storage for one cached buffer.
    pub fn new_cached_data(&self, len: usize) -> LumoResult<Vec<u8>> {
        if len == 0 {
            return Err(LumoError::allocation("cached data must be non-empty"));
        }
        if len > self.max_data_bytes {
            return Err(LumoError::allocation(format!(
                "cached data of {len} bytes exceeds the {} byte limit",
                self.max_data_bytes
            )));
        }
        Ok(vec![0u8; len])
    }
}
