use super::*;
use crate::foundation::geom::{IRect, ISize};
use crate::foundation::id::UniqueId;
use crate::gpu::texture::{BackendFormat, BackingFit, Budgeted, Mipmapped};

fn proxy_1x1() -> Arc<TextureProxy> {
    TextureProxy::new(
        ISize::new(1, 1),
        BackendFormat::R8,
        Mipmapped::No,
        Budgeted::Yes,
        BackingFit::Exact,
        vec![0],
    )
}

fn key() -> UniqueKey {
    UniqueKey::from_image_id(UniqueId::next(), IRect::from_xywh(0, 0, 1, 1))
}

#[test]
fn assign_binds_and_find_returns_the_proxy() {
    let provider = ProxyProvider::default();
    let key = key();
    let proxy = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &proxy, listener);

    let found = provider.find_or_create_proxy_by_unique_key(&key).unwrap();
    assert!(Arc::ptr_eq(&found, &proxy));
    assert_eq!(proxy.unique_key(), Some(key));
}

#[test]
fn remove_detaches_without_firing_listeners() {
    let provider = ProxyProvider::default();
    let key = key();
    let proxy = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &proxy, listener.clone());

    provider.remove_unique_key(&proxy);
    assert!(provider.find_or_create_proxy_by_unique_key(&key).is_none());
    assert!(!listener.has_fired());
    assert_eq!(proxy.unique_key(), None);
}

#[test]
fn evict_fires_each_listener_exactly_once() {
    let provider = ProxyProvider::default();
    let key = key();
    let proxy = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &proxy, listener.clone());

    provider.evict(&key);
    assert!(listener.has_fired());
    assert!(provider.find_or_create_proxy_by_unique_key(&key).is_none());
    assert_eq!(provider.key_count(), 0);

    // Idempotent: firing again (e.g. from image teardown) is a no-op.
    listener.fire();
    assert!(listener.has_fired());
}

#[test]
fn listener_action_detaches_the_key_from_anywhere() {
    let provider = ProxyProvider::default();
    let key = key();
    let proxy = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &proxy, listener.clone());

    // Fired from outside the provider (image teardown path).
    listener.fire();
    assert!(provider.find_or_create_proxy_by_unique_key(&key).is_none());
}

#[test]
fn listener_survives_its_provider() {
    let key = key();
    let listener = {
        let provider = ProxyProvider::default();
        provider.make_invalidation_listener(key, 1)
    };
    // The weak handle upgrades to nothing; firing must not panic.
    listener.fire();
    assert!(listener.has_fired());
}

#[test]
fn rekeying_moves_the_binding_to_the_new_proxy() {
    let provider = ProxyProvider::default();
    let key = key();
    let old = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &old, listener);

    provider.remove_unique_key(&old);
    let new = proxy_1x1();
    let listener = provider.make_invalidation_listener(key, 1);
    provider.assign_unique_key(key, &new, listener);

    let found = provider.find_or_create_proxy_by_unique_key(&key).unwrap();
    assert!(Arc::ptr_eq(&found, &new));
}
