//! # Asset Backends
//!
//! Renderers never reach out to the network or a barcode library directly.
//! They go through two capability traits:
//!
//! - [`ImageSource`]: fetch and decode an image by URL (asynchronous)
//! - [`SymbolGenerator`]: encode a value in a barcode symbology
//!
//! [`AssetContext`] bundles the chosen backends with the shared decoded-image
//! cache and is cloned cheaply into every render pass.

mod http;
mod memory;
mod symbols;

pub use http::{DEFAULT_USER_AGENT, HttpImageSource};
pub use memory::MemoryImageSource;
pub use symbols::{BarcodeSymbols, Symbol, SymbolError, SymbolGenerator, Symbology, UnavailableSymbols};

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Image fetch / decode errors.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("Failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to download {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode image {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Unsupported image source: {0}")]
    Unsupported(String),
}

/// Something that can produce a decoded image for a URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, AssetError>;
}

/// Decode raw bytes, attributing failures to `url`.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DynamicImage, AssetError> {
    image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// A decoded image plus bookkeeping for expiry.
#[derive(Debug, Clone)]
struct CachedImage {
    image: Arc<RgbaImage>,
    last_accessed: Instant,
}

/// Shared cache of successfully decoded images, keyed by URL.
///
/// Only successes are cached here: failures belong to the render pass that saw
/// them, so a transient error never poisons later exports.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: Arc<Mutex<HashMap<String, CachedImage>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedImage>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, url: &str) -> Option<Arc<RgbaImage>> {
        let mut entries = self.lock();
        let entry = entries.get_mut(url)?;
        entry.last_accessed = Instant::now();
        Some(entry.image.clone())
    }

    pub fn insert(&self, url: impl Into<String>, image: Arc<RgbaImage>) {
        self.lock().insert(
            url.into(),
            CachedImage {
                image,
                last_accessed: Instant::now(),
            },
        );
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries not accessed within `max_age`. Returns how many were removed.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, v| now.duration_since(v.last_accessed) < max_age);
        before - entries.len()
    }
}

/// The asset backends a render pass draws on.
#[derive(Clone)]
pub struct AssetContext {
    pub images: ImageCache,
    pub source: Arc<dyn ImageSource>,
    pub symbols: Arc<dyn SymbolGenerator>,
}

impl AssetContext {
    pub fn new(source: Arc<dyn ImageSource>, symbols: Arc<dyn SymbolGenerator>) -> Self {
        Self {
            images: ImageCache::new(),
            source,
            symbols,
        }
    }

    /// HTTP images + real barcode encoders.
    pub fn standard(source: HttpImageSource) -> Self {
        Self::new(Arc::new(source), Arc::new(BarcodeSymbols))
    }

    /// Share an existing cache.
    pub fn with_cache(mut self, images: ImageCache) -> Self {
        self.images = images;
        self
    }
}

impl std::fmt::Debug for AssetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetContext")
            .field("cached_images", &self.images.len())
            .finish_non_exhaustive()
    }
}
