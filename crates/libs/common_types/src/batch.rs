use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A set of images submitted together for one analysis cycle.
///
/// Sources are local snapshot files, remote URLs, or a mix. A batch with no
/// loadable source is still admitted; its run records nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageBatch {
    pub image_paths: Vec<String>,
    pub image_urls: Vec<String>,
}

impl ImageBatch {
    #[must_use]
    pub fn new(image_paths: Vec<String>, image_urls: Vec<String>) -> Self {
        Self {
            image_paths,
            image_urls,
        }
    }

    /// True when the batch names no image source at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty() && self.image_urls.is_empty()
    }
}
