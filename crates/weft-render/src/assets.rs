//! Image and font loading.
//!
//! Loads are fire-and-forget calls into a host `AssetLoader`. Completions
//! come back through an `AssetInbox` queue and are applied only when the
//! owner drains it, so a loader that completes synchronously (or from
//! inside another callback) never re-enters a render pass. Requests are
//! deduplicated by URL / family; every node that asked while a load was in
//! flight is reported for refresh once it lands.

use peniko::Image;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use thiserror::Error;
use weft_core::id::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("image `{url}` failed to load: {reason}")]
    Image { url: String, reason: String },
    #[error("font `{family}` failed to load: {reason}")]
    Font { family: String, reason: String },
}

/// A decoded image. `data` may be absent when the host only reports size.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    pub data: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Image(String),
    Font(String),
}

#[derive(Debug, Clone)]
pub enum AssetEvent {
    ImageLoaded(String, Result<ImageAsset, String>),
    FontLoaded(String, Result<(), String>),
}

/// Completion queue shared with the loader.
#[derive(Debug, Clone, Default)]
pub struct AssetInbox {
    queue: Rc<RefCell<VecDeque<AssetEvent>>>,
}

impl AssetInbox {
    pub fn complete_image(&self, url: &str, result: Result<ImageAsset, String>) {
        self.queue
            .borrow_mut()
            .push_back(AssetEvent::ImageLoaded(url.to_string(), result));
    }

    pub fn complete_font(&self, family: &str, result: Result<(), String>) {
        self.queue
            .borrow_mut()
            .push_back(AssetEvent::FontLoaded(family.to_string(), result));
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn take(&self) -> Vec<AssetEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

/// Host-side asset loading.
pub trait AssetLoader {
    fn load_image(&self, url: &str, inbox: AssetInbox);
    fn load_font(&self, family: &str, inbox: AssetInbox);
}

/// Loader that never completes (headless use).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl AssetLoader for NoopLoader {
    fn load_image(&self, _url: &str, _inbox: AssetInbox) {}
    fn load_font(&self, _family: &str, _inbox: AssetInbox) {}
}

#[derive(Debug, Clone)]
enum AssetState<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Result of applying queued completions.
#[derive(Debug, Default)]
pub struct AssetDrain {
    /// Scene nodes waiting on something that just finished (either way).
    pub refresh: HashSet<NodeId>,
    pub errors: Vec<AssetError>,
}

#[derive(Debug, Default)]
pub struct AssetCache {
    images: HashMap<String, AssetState<ImageAsset>>,
    fonts: HashMap<String, AssetState<()>>,
    waiters: HashMap<AssetKey, HashSet<NodeId>>,
    inbox: AssetInbox,
    requests: usize,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inbox(&self) -> AssetInbox {
        self.inbox.clone()
    }

    /// Loader calls issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn has_pending_events(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// The image if loaded; otherwise request it (once) and remember
    /// `waiter` for refresh.
    pub fn image(&mut self, url: &str, waiter: NodeId, loader: &dyn AssetLoader) -> Option<&ImageAsset> {
        if !self.images.contains_key(url) {
            self.images.insert(url.to_string(), AssetState::Pending);
            self.requests += 1;
            log::debug!("loading image {url}");
            loader.load_image(url, self.inbox.clone());
        }
        match self.images.get(url) {
            Some(AssetState::Ready(image)) => Some(image),
            Some(AssetState::Pending) => {
                self.waiters
                    .entry(AssetKey::Image(url.to_string()))
                    .or_default()
                    .insert(waiter);
                None
            }
            _ => None,
        }
    }

    /// Already-loaded image data, without requesting.
    pub fn image_data(&self, url: &str) -> Option<&ImageAsset> {
        match self.images.get(url) {
            Some(AssetState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Whether `family` can be used now; requests it (once) when unknown.
    pub fn font_ready(&mut self, family: &str, waiter: NodeId, loader: &dyn AssetLoader) -> bool {
        self.request_font(family, loader);
        match self.fonts.get(family) {
            Some(AssetState::Ready(())) => true,
            Some(AssetState::Pending) => {
                self.waiters
                    .entry(AssetKey::Font(family.to_string()))
                    .or_default()
                    .insert(waiter);
                false
            }
            _ => false,
        }
    }

    pub fn request_font(&mut self, family: &str, loader: &dyn AssetLoader) {
        if !self.fonts.contains_key(family) {
            self.fonts.insert(family.to_string(), AssetState::Pending);
            self.requests += 1;
            log::debug!("loading font {family}");
            loader.load_font(family, self.inbox.clone());
        }
    }

    /// Stop refreshing `id` (its container is gone).
    pub fn forget(&mut self, id: NodeId) {
        for waiting in self.waiters.values_mut() {
            waiting.remove(&id);
        }
    }

    /// Apply every queued completion.
    pub fn drain(&mut self) -> AssetDrain {
        let mut out = AssetDrain::default();
        for event in self.inbox.take() {
            let key = match event {
                AssetEvent::ImageLoaded(url, result) => {
                    let state = match result {
                        Ok(image) => AssetState::Ready(image),
                        Err(reason) => {
                            out.errors.push(AssetError::Image {
                                url: url.clone(),
                                reason,
                            });
                            AssetState::Failed
                        }
                    };
                    self.images.insert(url.clone(), state);
                    AssetKey::Image(url)
                }
                AssetEvent::FontLoaded(family, result) => {
                    let state = match result {
                        Ok(()) => AssetState::Ready(()),
                        Err(reason) => {
                            out.errors.push(AssetError::Font {
                                family: family.clone(),
                                reason,
                            });
                            AssetState::Failed
                        }
                    };
                    self.fonts.insert(family.clone(), state);
                    AssetKey::Font(family)
                }
            };
            if let Some(waiting) = self.waiters.remove(&key) {
                out.refresh.extend(waiting);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Completes every request immediately, from inside the call.
    #[derive(Default)]
    struct InstantLoader {
        calls: Cell<usize>,
    }

    impl AssetLoader for InstantLoader {
        fn load_image(&self, url: &str, inbox: AssetInbox) {
            self.calls.set(self.calls.get() + 1);
            if url.ends_with(".broken") {
                inbox.complete_image(url, Err("404".into()));
            } else {
                inbox.complete_image(
                    url,
                    Ok(ImageAsset {
                        width: 4,
                        height: 2,
                        data: None,
                    }),
                );
            }
        }

        fn load_font(&self, family: &str, inbox: AssetInbox) {
            self.calls.set(self.calls.get() + 1);
            inbox.complete_font(family, Ok(()));
        }
    }

    #[test]
    fn concurrent_requests_share_one_load() {
        let loader = InstantLoader::default();
        let mut cache = AssetCache::new();
        let a = NodeId::intern("img_a");
        let b = NodeId::intern("img_b");

        assert!(cache.image("hero.png", a, &loader).is_none());
        assert!(cache.image("hero.png", b, &loader).is_none());
        assert_eq!(loader.calls.get(), 1);

        let drained = cache.drain();
        assert_eq!(drained.refresh, HashSet::from([a, b]));
        assert!(drained.errors.is_empty());
        assert_eq!(cache.image("hero.png", a, &loader).map(|i| i.width), Some(4));
    }

    #[test]
    fn failure_is_reported_and_cached() {
        let loader = InstantLoader::default();
        let mut cache = AssetCache::new();
        let n = NodeId::intern("img_fail");
        cache.image("x.broken", n, &loader);
        let drained = cache.drain();
        assert_eq!(drained.errors.len(), 1);
        assert!(cache.image("x.broken", n, &loader).is_none());
        assert_eq!(loader.calls.get(), 1);
    }

    #[test]
    fn completions_wait_for_drain() {
        let loader = InstantLoader::default();
        let mut cache = AssetCache::new();
        let n = NodeId::intern("font_user");
        assert!(!cache.font_ready("Inter", n, &loader));
        assert!(cache.has_pending_events());
        assert!(!cache.font_ready("Inter", n, &loader));
        cache.drain();
        assert!(cache.font_ready("Inter", n, &loader));
    }

    #[test]
    fn forgotten_waiters_are_not_refreshed() {
        let mut cache = AssetCache::new();
        let n = NodeId::intern("gone");
        cache.image("later.png", n, &NoopLoader);
        cache.forget(n);
        cache.inbox().complete_image(
            "later.png",
            Ok(ImageAsset {
                width: 1,
                height: 1,
                data: None,
            }),
        );
        assert!(cache.drain().refresh.is_empty());
    }
}
