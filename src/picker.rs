//! Paged browsing of the catalog for manual selection.
//!
//! The picker shows a fixed number of thumbnails per page over the flattened
//! catalog. Paging wraps in both directions. The last page may be short; the
//! presentation pads it with [`CatalogPager::placeholders`] empty slots so the
//! row keeps its width.

use crate::catalog::{Catalog, CatalogEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPager {
    per_page: usize,
    total: usize,
    page: usize,
}

impl CatalogPager {
    /// `per_page` is clamped to at least 1.
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            total,
            page: 0,
        }
    }

    pub fn for_catalog(catalog: &Catalog, per_page: usize) -> Self {
        Self::new(catalog.len(), per_page)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages; zero only for an empty listing.
    pub fn pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    pub fn next(&mut self) {
        let pages = self.pages();
        if pages > 0 {
            self.page = (self.page + 1) % pages;
        }
    }

    pub fn prev(&mut self) {
        let pages = self.pages();
        if pages > 0 {
            self.page = (self.page + pages - 1) % pages;
        }
    }

    /// Jump to `page`. Returns false and stays put if it does not exist.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page >= self.pages() {
            return false;
        }
        self.page = page;
        true
    }

    /// Range of flattened catalog indices on the current page.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page * self.per_page).min(self.total);
        let end = (start + self.per_page).min(self.total);
        start..end
    }

    pub fn page_entries<'a>(&self, catalog: &'a Catalog) -> &'a [CatalogEntry] {
        let range = self.range();
        let end = range.end.min(catalog.len());
        &catalog.entries()[range.start.min(end)..end]
    }

    /// Entry in `slot` (0-based) of the current page.
    pub fn entry_at<'a>(&self, catalog: &'a Catalog, slot: usize) -> Option<&'a CatalogEntry> {
        self.page_entries(catalog).get(slot)
    }

    /// Empty slots needed to pad the current page to a full row.
    pub fn placeholders(&self) -> usize {
        self.per_page - self.range().len()
    }
}
