//! Card and set-logo images with an in-memory cache.
//!
//! # Design
//! `ImageCache` is a least-recently-used map keyed by the exact URL string,
//! bounded by entry count and by the summed size of the stored bytes.
//! `ImageLoader` consults it before issuing a single GET. Failures are soft:
//! they are logged and surface as `None`, never as an error.
//!
//! Concurrent misses for one URL are not coalesced; both fetch and the last
//! insert wins, which is harmless because the bytes are the same.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;

/// Downloaded bytes that decoded as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    /// Decode `bytes`, keeping them as-is when they form a valid image.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }

    pub fn cost(&self) -> usize {
        self.bytes.len()
    }
}

struct Slot {
    image: Arc<LoadedImage>,
    last_used: u64,
}

/// LRU cache bounded by count and total bytes.
pub struct ImageCache {
    max_entries: usize,
    max_bytes: usize,
    total_bytes: usize,
    clock: u64,
    entries: HashMap<String, Slot>,
}

impl ImageCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            max_entries,
            max_bytes,
            total_bytes: 0,
            clock: 0,
            entries: HashMap::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<Arc<LoadedImage>> {
        let now = self.tick();
        let slot = self.entries.get_mut(key)?;
        slot.last_used = now;
        Some(Arc::clone(&slot.image))
    }

    /// Store `image`, evicting least recently used entries until both
    /// ceilings hold. An image bigger than the byte ceiling is not stored.
    pub fn put(&mut self, key: String, image: Arc<LoadedImage>) {
        let cost = image.cost();
        if cost > self.max_bytes || self.max_entries == 0 {
            debug!(url = %key, cost, "image exceeds cache ceiling, not cached");
            return;
        }
        if let Some(old) = self.entries.remove(&key) {
            self.total_bytes -= old.image.cost();
        }
        while self.entries.len() >= self.max_entries || self.total_bytes + cost > self.max_bytes {
            if !self.evict_oldest() {
                break;
            }
        }

        let now = self.tick();
        self.total_bytes += cost;
        self.entries.insert(
            key,
            Slot {
                image,
                last_used: now,
            },
        );
    }

    fn evict_oldest(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(k, _)| k.clone());
        match victim.and_then(|k| self.entries.remove(&k)) {
            Some(slot) => {
                self.total_bytes -= slot.image.cost();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }
}

/// Fetches images over its own transport and memoizes them by URL.
pub struct ImageLoader {
    transport: Arc<dyn Transport>,
    cache: Mutex<ImageCache>,
}

impl ImageLoader {
    pub fn new(transport: Arc<dyn Transport>, max_entries: usize, max_bytes: usize) -> Self {
        Self {
            transport,
            cache: Mutex::new(ImageCache::new(max_entries, max_bytes)),
        }
    }

    /// Return the image at `url`, from cache when possible.
    ///
    /// `None` input, an unparsable URL, a failed download, or bytes that are
    /// not an image all yield `None`.
    pub async fn load_image(&self, url: Option<&str>) -> Option<Arc<LoadedImage>> {
        let url = url?;
        if reqwest::Url::parse(url).is_err() {
            debug!(url, "not a valid image URL");
            return None;
        }

        // The guard is dropped before the fetch; it must never span an await.
        let cached = self.cache.lock().get(url);
        if cached.is_some() {
            return cached;
        }

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        };
        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "failed to load image");
                return None;
            }
        };
        if !response.is_success() {
            warn!(url, status = response.status, "image request was not successful");
            return None;
        }

        let image = match LoadedImage::decode(response.body) {
            Ok(image) => Arc::new(image),
            Err(e) => {
                warn!(url, error = %e, "failed to decode image");
                return None;
            }
        };
        self.cache.lock().put(url.to_string(), Arc::clone(&image));
        Some(image)
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }
}
