//! Value types shared by the catalog, the carousel, and the CLI output.
//!
//! These are serialized as part of the state snapshot (`simulate --json`) and
//! must stay stable across the modules that produce and consume them.

use serde::{Deserialize, Serialize};

/// Width applied to every freshly materialized image.
pub const DEFAULT_IMAGE_WIDTH: u32 = 1200;
/// Height applied to every freshly materialized image.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 675;

/// Display dimensions stamped onto images as they are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

/// An image as displayed by a block.
///
/// Immutable once built. Catalog picks and manual selections both go through
/// [`ImageRef::materialize`], so every displayed image carries the configured
/// dimensions rather than whatever the source happens to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Opaque reference (URI, asset path) identifying the image.
    pub source: String,
    /// Human-readable label, also used as alt text.
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    pub fn materialize(source: &str, label: &str, dimensions: Dimensions) -> Self {
        Self {
            source: source.to_string(),
            label: label.to_string(),
            width: dimensions.width,
            height: dimensions.height,
        }
    }
}
