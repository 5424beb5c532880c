//! Asset fetching.
//!
//! Loading an animation means fetching its manifest bytes and decoding every
//! referenced atlas image. The [`AssetFetcher`] trait is the I/O seam:
//! [`FsFetcher`] resolves a filesystem directory (the layout the desktop
//! embedding uses), [`MemoryFetcher`] serves prefetched bytes (the web
//! embedding's model, and the test harness).

use std::collections::HashMap;
use std::path::Path;

use lava_core::{LavaError, LavaResult, PixelSurface};

/// Source of manifest bytes and decoded atlas images.
///
/// `locator` is the animation's root (a directory path, base URL, or bundle
/// key); image `url`s from the manifest are resolved relative to it.
pub trait AssetFetcher {
    /// Fetch the raw manifest bytes for an animation.
    fn fetch_manifest(&self, locator: &str) -> LavaResult<Vec<u8>>;

    /// Fetch and decode one atlas image to RGBA8 pixels.
    fn fetch_image(&self, locator: &str, url: &str) -> LavaResult<PixelSurface>;
}

/// Fetches from a directory on disk: `<locator>/manifest.json` plus image
/// files named by the manifest's `url` entries.
#[derive(Debug, Default)]
pub struct FsFetcher;

impl FsFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl AssetFetcher for FsFetcher {
    fn fetch_manifest(&self, locator: &str) -> LavaResult<Vec<u8>> {
        let path = Path::new(locator).join("manifest.json");
        std::fs::read(&path)
            .map_err(|e| LavaError::asset(format!("failed to read manifest: {}", e), path))
    }

    fn fetch_image(&self, locator: &str, url: &str) -> LavaResult<PixelSurface> {
        let path = Path::new(locator).join(url);
        let img = image::open(&path)
            .map_err(|e| LavaError::asset(format!("failed to decode image: {}", e), &path))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        PixelSurface::from_raw(width, height, rgba.into_raw())
            .ok_or_else(|| LavaError::asset("decoded image has inconsistent size", path))
    }
}

/// Serves an animation from in-memory bytes registered up front.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    manifest: Vec<u8>,
    images: HashMap<String, PixelSurface>,
}

impl MemoryFetcher {
    pub fn new(manifest: impl Into<Vec<u8>>) -> Self {
        Self {
            manifest: manifest.into(),
            images: HashMap::new(),
        }
    }

    /// Register decoded pixels for an image url.
    pub fn with_image(mut self, url: impl Into<String>, image: PixelSurface) -> Self {
        self.images.insert(url.into(), image);
        self
    }

    /// Register encoded image bytes (PNG, JPEG, ...) for an image url.
    pub fn with_image_bytes(self, url: impl Into<String>, bytes: &[u8]) -> LavaResult<Self> {
        let url = url.into();
        let img = image::load_from_memory(bytes)
            .map_err(|e| LavaError::asset(format!("failed to decode image: {}", e), &url))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let surface = PixelSurface::from_raw(width, height, rgba.into_raw())
            .ok_or_else(|| LavaError::asset("decoded image has inconsistent size", &url))?;
        Ok(self.with_image(url, surface))
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch_manifest(&self, _locator: &str) -> LavaResult<Vec<u8>> {
        Ok(self.manifest.clone())
    }

    fn fetch_image(&self, _locator: &str, url: &str) -> LavaResult<PixelSurface> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| LavaError::asset("image not registered", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_fetcher_missing_manifest() {
        let err = FsFetcher::new()
            .fetch_manifest("/nonexistent/animation")
            .unwrap_err();
        assert!(matches!(err, LavaError::AssetLoad { .. }));
    }

    #[test]
    fn test_fs_fetcher_missing_image() {
        let result = FsFetcher::new().fetch_image("/nonexistent/animation", "key_0.png");
        assert!(result.is_err());
    }

    #[test]
    fn test_memory_fetcher_round_trip() {
        let fetcher = MemoryFetcher::new(b"{}".to_vec())
            .with_image("key_0.png", PixelSurface::new(4, 4));
        assert_eq!(fetcher.fetch_manifest("any").unwrap(), b"{}");
        let img = fetcher.fetch_image("any", "key_0.png").unwrap();
        assert_eq!((img.width, img.height), (4, 4));
    }

    #[test]
    fn test_memory_fetcher_unknown_image() {
        let fetcher = MemoryFetcher::new(Vec::new());
        assert!(fetcher.fetch_image("any", "missing.png").is_err());
    }
}
