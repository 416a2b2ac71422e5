//! In-memory image source.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{AssetError, ImageSource};

/// Serves images registered up front; any other URL is `NotFound`.
///
/// Keeps a log of requested URLs so callers can assert on fetch behaviour.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, DynamicImage>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, image: DynamicImage) -> Self {
        self.images.insert(url.into(), image);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl ImageSource for MemoryImageSource {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, AssetError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
    }
}
