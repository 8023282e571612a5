//! Image loader configuration.

use serde::{Deserialize, Serialize};

use crate::cache::ImageCacheConfig;
use crate::error::{ImageError, ImageResult};

/// Settings of an [`ImageProvider`](crate::ImageProvider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLoaderConfig {
    /// Decode tasks allowed to run at the same time.
    pub max_concurrent_decodes: usize,
    /// Limits of the canvas image cache.
    pub cache: ImageCacheConfig,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_decodes: 4,
            cache: ImageCacheConfig::default(),
        }
    }
}

impl ImageLoaderConfig {
    /// Deserialize from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or
    /// `max_concurrent_decodes` is zero.
    pub fn from_json(json: &str) -> ImageResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_concurrent_decodes == 0 {
            return Err(ImageError::InvalidSize(
                "max_concurrent_decodes must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ImageResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImageLoaderConfig::default();
        assert_eq!(config.max_concurrent_decodes, 4);
        assert_eq!(config.cache, ImageCacheConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            ImageLoaderConfig::from_json(r#"{"max_concurrent_decodes": 2, "cache": {"max_entries": 3}}"#)
                .unwrap();
        assert_eq!(config.max_concurrent_decodes, 2);
        assert_eq!(config.cache.max_entries, 3);
        assert_eq!(config.cache.max_age_secs, 300);

        let back = ImageLoaderConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_rejects_zero_workers_and_bad_json() {
        assert!(matches!(
            ImageLoaderConfig::from_json(r#"{"max_concurrent_decodes": 0}"#),
            Err(ImageError::InvalidSize(_))
        ));
        assert!(matches!(
            ImageLoaderConfig::from_json("{"),
            Err(ImageError::Serialization(_))
        ));
    }
}
