//! Shared test utilities for the visual-blocks test suite.
//!
//! Builders for small catalogs and for carousels already holding a given
//! history, plus a recorder wired in as the announcer so tests can assert on
//! the exact announcement sequence.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (mut carousel, recorder) = carousel_with(&["a", "b", "c"], 1);
//! recorder.take(); // drop the announcements made while building
//!
//! carousel.navigate_next();
//! assert_eq!(recorder.messages(), vec!["Displaying image 3 of 3"]);
//! ```

use std::sync::Arc;

use crate::announce::Recorder;
use crate::carousel::Carousel;
use crate::catalog::{Catalog, CatalogEntry, Category};
use crate::types::Dimensions;

// =========================================================================
// Catalog fixtures
// =========================================================================

/// Entry whose label is the upper-cased source.
pub fn entry(source: &str) -> CatalogEntry {
    CatalogEntry::new(source, source.to_uppercase())
}

/// Single-category catalog holding `sources` in order. Panics if empty.
pub fn catalog_of(sources: &[&str]) -> Catalog {
    Catalog::new(vec![Category {
        name: "fixture".to_string(),
        entries: sources.iter().map(|s| entry(s)).collect(),
    }])
    .unwrap_or_else(|e| panic!("fixture catalog {sources:?} rejected: {e}"))
}

// =========================================================================
// Carousel fixtures
// =========================================================================

/// Fresh carousel seeded with `seed`, announcing into a recorder.
pub fn recorded_carousel(seed: &CatalogEntry) -> (Carousel, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::new());
    let carousel = Carousel::new(seed, Dimensions::default(), recorder.clone());
    (carousel, recorder)
}

/// Carousel whose history is `sources` (each generated in order) with
/// `index` displayed.
///
/// The recorder still holds the announcements made while building; call
/// `recorder.take()` before asserting on a sequence.
pub fn carousel_with(sources: &[&str], index: usize) -> (Carousel, Arc<Recorder>) {
    assert!(
        index < sources.len().max(1),
        "index {index} out of range for {sources:?}"
    );
    let (mut carousel, recorder) = recorded_carousel(&entry("seed"));
    for source in sources {
        let token = carousel.begin_generation();
        carousel.commit_generation(token, &entry(source));
        carousel.finish_generation(token);
    }
    while carousel.state().current_index() != index {
        carousel.navigate_next();
    }
    (carousel, recorder)
}
