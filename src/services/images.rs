//! Poster image URL normalization.
//!
//! Letterboxd poster URLs embed their crop dimensions as a
//! `-0-<width>-0-<height>-crop` token. Rewriting that token requests the same
//! poster at a different resolution from the image CDN.

use lazy_static::lazy_static;
use regex::Regex;

/// Default poster width for high-DPI display.
pub const DEFAULT_WIDTH: u32 = 2000;

/// Default poster height for high-DPI display.
pub const DEFAULT_HEIGHT: u32 = 3000;

lazy_static! {
    static ref DIMENSIONS_RE: Regex = Regex::new(r"-0-(\d+)-0-(\d+)-crop").unwrap();
}

/// Rewrites poster URLs to a target resolution.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimizer {
    width: u32,
    height: u32,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ImageOptimizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Normalize a poster URL to the configured dimensions.
    ///
    /// Strips any query string, then rewrites the dimension token. URLs
    /// without the token pass through with only the query string removed.
    pub fn normalize(&self, url: &str) -> String {
        Self::normalize_to(url, self.width, self.height)
    }

    /// Normalize with explicit dimensions, overriding the configured target.
    pub fn normalize_to(url: &str, width: u32, height: u32) -> String {
        if url.is_empty() {
            return String::new();
        }

        let without_query = url.split('?').next().unwrap_or(url);
        let replacement = format!("-0-{}-0-{}-crop", width, height);
        DIMENSIONS_RE
            .replace(without_query, replacement.as_str())
            .into_owned()
    }

    /// Extract the crop dimensions embedded in a URL, or (0, 0) when absent.
    pub fn extract_dimensions(url: &str) -> (u32, u32) {
        DIMENSIONS_RE
            .captures(url)
            .and_then(|caps| {
                let width = caps.get(1)?.as_str().parse().ok()?;
                let height = caps.get(2)?.as_str().parse().ok()?;
                Some((width, height))
            })
            .unwrap_or((0, 0))
    }

    /// Whether a URL already carries the configured target dimensions.
    pub fn is_normalized(&self, url: &str) -> bool {
        Self::extract_dimensions(url) == (self.width, self.height)
    }
}
