use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::domain::ImageId;
use url::Url;

/// An image produced by the service during this session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub id: ImageId,
    pub image_url: Url,
    /// Backend-relative handle passed back for 3D conversion.
    pub image_path: String,
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn download_filename(&self) -> String {
        let stem: String = self
            .id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("ai-generated-{stem}.png")
    }
}

/// Session gallery, newest first.
#[derive(Debug, Default, Clone)]
pub struct Gallery {
    images: Vec<Arc<GeneratedImage>>,
}

impl Gallery {
    pub fn prepend(&mut self, image: Arc<GeneratedImage>) {
        self.images.insert(0, image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn as_slice(&self) -> &[Arc<GeneratedImage>] {
        &self.images
    }

    /// Identity check; entries with equal ids are still distinct images.
    pub fn contains(&self, image: &Arc<GeneratedImage>) -> bool {
        self.images.iter().any(|entry| Arc::ptr_eq(entry, image))
    }

    /// 1-based position as shown to the user.
    pub fn at_position(&self, position: usize) -> Option<&Arc<GeneratedImage>> {
        position
            .checked_sub(1)
            .and_then(|index| self.images.get(index))
    }
}

/// A converted model as offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    /// Service-relative reference exactly as the service returned it.
    pub model_url: String,
    pub download_url: Url,
    pub viewer_url: Url,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversionStatus {
    #[default]
    Idle,
    Loading {
        message: String,
    },
    Success(ModelAsset),
    Error {
        message: String,
    },
}
