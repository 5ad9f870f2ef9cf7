use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::id::UniqueId;
use crate::generator::Generator;
use crate::pixels::info::ImageInfo;

/// Reference-counted envelope sharing one generator among many images.
///
/// A single expensive decoder (often not thread-safe) may back several
/// logical image views; all generator calls flow through the scoped guard so
/// decode state never interleaves. `info` and `unique_id` are snapshotted at
/// construction (the trait documents them constant), keeping identity
/// queries off the lock.
pub struct SharedGenerator {
    generator: Mutex<Box<dyn Generator>>,
    info: ImageInfo,
    unique_id: UniqueId,
}

impl std::fmt::Debug for SharedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedGenerator")
            .field("unique_id", &self.unique_id)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl SharedGenerator {
    pub fn new(generator: Box<dyn Generator>) -> Arc<Self> {
        let info = *generator.info();
        let unique_id = generator.unique_id();
        Arc::new(Self {
            generator: Mutex::new(generator),
            info,
            unique_id,
        })
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    /// Exclusive access for the duration of the returned guard.
    ///
    /// The guard is the only path to the generator, so the serial-access
    /// invariant holds by construction. It is not `Send`; the critical
    /// section is the guard's lifetime.
    pub fn scoped(&self) -> ScopedGenerator<'_> {
        let guard = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug_assert_eq!(guard.info(), &self.info);
        debug_assert_eq!(guard.unique_id(), self.unique_id);
        ScopedGenerator { guard }
    }
}

/// Scoped exclusive access to a shared generator.
pub struct ScopedGenerator<'a> {
    guard: MutexGuard<'a, Box<dyn Generator>>,
}

impl Deref for ScopedGenerator<'_> {
    type Target = dyn Generator;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for ScopedGenerator<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}
