use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use smallvec::SmallVec;

use crate::cache::key::UniqueKey;
use crate::gpu::texture::TextureProxy;

type ListenerAction = Box<dyn FnOnce() + Send>;

/// Single-shot notification fired when a unique key loses its texture.
///
/// Listeners are idempotent, hold no back-reference into the image that
/// registered them (only a weak provider handle and the key), and tolerate
/// firing after the image is gone.
pub struct InvalidationListener {
    key: UniqueKey,
    context_id: u32,
    fired: AtomicBool,
    action: Mutex<Option<ListenerAction>>,
}

impl std::fmt::Debug for InvalidationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationListener")
            .field("key", &self.key)
            .field("context_id", &self.context_id)
            .field("fired", &self.fired.load(Ordering::Relaxed))
            .finish()
    }
}

impl InvalidationListener {
    pub fn key(&self) -> UniqueKey {
        self.key
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Run the action once; later calls are no-ops.
    pub fn fire(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let action = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(action) = action {
            action();
        }
    }
}

#[derive(Debug, Default)]
struct ProviderInner {
    by_key: HashMap<UniqueKey, Arc<TextureProxy>>,
    listeners: HashMap<UniqueKey, SmallVec<[Arc<InvalidationListener>; 2]>>,
}

/// Unique-key bindings from image identities to realized textures.
///
/// The provider owns the key→proxy map and the invalidation listeners
/// attached to each key. Evicting a key fires its listeners exactly once.
#[derive(Debug, Default)]
pub struct ProxyProvider {
    inner: Arc<Mutex<ProviderInner>>,
}

impl ProxyProvider {
    fn lock(&self) -> MutexGuard<'_, ProviderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn find_or_create_proxy_by_unique_key(
        &self,
        key: &UniqueKey,
    ) -> Option<Arc<TextureProxy>> {
        self.lock().by_key.get(key).cloned()
    }

    /// Build a listener whose action detaches `key` from this provider.
    ///
    /// The action holds only a weak handle, so a listener outliving the
    /// provider fires into nothing.
    pub fn make_invalidation_listener(
        &self,
        key: UniqueKey,
        context_id: u32,
    ) -> Arc<InvalidationListener> {
        let weak: Weak<Mutex<ProviderInner>> = Arc::downgrade(&self.inner);
        let action: ListenerAction = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner.by_key.remove(&key);
                inner.listeners.remove(&key);
            }
        });
        Arc::new(InvalidationListener {
            key,
            context_id,
            fired: AtomicBool::new(false),
            action: Mutex::new(Some(action)),
        })
    }

    /// Bind `key` to `proxy` and attach `listener` to the key.
    pub fn assign_unique_key(
        &self,
        key: UniqueKey,
        proxy: &Arc<TextureProxy>,
        listener: Arc<InvalidationListener>,
    ) {
        let mut inner = self.lock();
        proxy.set_unique_key(Some(key));
        inner.by_key.insert(key, proxy.clone());
        inner.listeners.entry(key).or_default().push(listener);
    }

    /// Detach a proxy's key binding without firing listeners (used when a
    /// key moves to an upgraded proxy).
    pub fn remove_unique_key(&self, proxy: &Arc<TextureProxy>) {
        let mut inner = self.lock();
        if let Some(key) = proxy.unique_key() {
            proxy.set_unique_key(None);
            if inner
                .by_key
                .get(&key)
                .is_some_and(|bound| Arc::ptr_eq(bound, proxy))
            {
                inner.by_key.remove(&key);
            }
        }
    }

    /// Drop a key binding and fire its listeners (resource-cache pressure).
    pub fn evict(&self, key: &UniqueKey) {
        let to_fire = {
            let mut inner = self.lock();
            if let Some(proxy) = inner.by_key.remove(key) {
                proxy.set_unique_key(None);
            }
            inner.listeners.remove(key).unwrap_or_default()
        };
        // Fired outside the lock: each action re-enters the provider.
        for listener in to_fire {
            listener.fire();
        }
    }

    pub fn key_count(&self) -> usize {
        self.lock().by_key.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/provider.rs"]
mod tests;
