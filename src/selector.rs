//! Uniform random selection over a catalog.
//!
//! Both functions take the catalog and the RNG as arguments so that blocks
//! never share hidden global state, and tests can pin results with a seeded
//! [`StdRng`].
//!
//! [`pick_random_excluding`] never fails: when the exclusion would leave no
//! candidates it falls back to [`pick_random`], which may hand back the
//! excluded entry. Callers treat "regenerated the same image" as valid.

use crate::catalog::{Catalog, CatalogEntry};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Uniform pick over the whole flattened catalog.
pub fn pick_random<'a, R: Rng>(catalog: &'a Catalog, rng: &mut R) -> &'a CatalogEntry {
    let entries = catalog.entries();
    // Catalogs are non-empty by construction.
    &entries[rng.gen_range(0..entries.len())]
}

/// Uniform pick over entries whose source differs from `exclude`.
///
/// An empty `exclude`, or one that matches every entry, behaves exactly like
/// [`pick_random`].
pub fn pick_random_excluding<'a, R: Rng>(
    catalog: &'a Catalog,
    exclude: &str,
    rng: &mut R,
) -> &'a CatalogEntry {
    if exclude.is_empty() {
        return pick_random(catalog, rng);
    }
    let candidates: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|e| e.source != exclude)
        .collect();
    if candidates.is_empty() {
        return pick_random(catalog, rng);
    }
    candidates[rng.gen_range(0..candidates.len())]
}

/// Build the RNG for a block: deterministic when a seed is configured.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
