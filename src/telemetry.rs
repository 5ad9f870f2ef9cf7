use std::sync::atomic::{AtomicU64, Ordering};

/// Which stage of the texture acquisition cascade satisfied a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockTexturePath {
    Failure,
    PreExisting,
    Native,
    Yuv,
    Rgba,
}

const PATH_COUNT: usize = 5;

fn index(path: LockTexturePath) -> usize {
    match path {
        LockTexturePath::Failure => 0,
        LockTexturePath::PreExisting => 1,
        LockTexturePath::Native => 2,
        LockTexturePath::Yuv => 3,
        LockTexturePath::Rgba => 4,
    }
}

/// Per-context counters, incremented exactly once per texture lock.
#[derive(Debug, Default)]
pub struct LockTextureStats {
    counters: [AtomicU64; PATH_COUNT],
}

impl LockTextureStats {
    pub(crate) fn record(&self, path: LockTexturePath) {
        self.counters[index(path)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, path: LockTexturePath) -> u64 {
        self.counters[index(path)].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }
}
