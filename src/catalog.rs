//! The image catalog: every illustration a block can display.
//!
//! A catalog is an ordered list of named categories, each holding an ordered
//! list of `(source, label)` entries. The categories exist for browsing; random
//! selection and the picker work over the flattened sequence, which preserves
//! category order and entry order within each category.
//!
//! ## Catalog Files
//!
//! The built-in catalog ([`Catalog::builtin`]) can be replaced with a TOML
//! file:
//!
//! ```toml
//! [[category]]
//! name = "brainstorm"
//! entries = [
//!     { source = "infographics/brainstorm-1.png", label = "Brainstorm 1" },
//!     { source = "infographics/brainstorm-2.png", label = "Brainstorm 2" },
//! ]
//!
//! [[category]]
//! name = "special"
//! entries = [{ source = "infographics/the-rock-eyebrow.gif", label = "The Rock" }]
//! ```
//!
//! A catalog is never empty and never holds two entries with the same source:
//! exclusion during random selection is keyed by source, so duplicates would
//! make "pick something different" ambiguous.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("catalog has no entries")]
    Empty,
    #[error("duplicate image source in catalog: {0}")]
    DuplicateSource(String),
}

/// A single selectable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub source: String,
    pub label: String,
}

impl CatalogEntry {
    pub fn new(source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    category: Vec<Category>,
}

/// Immutable, validated image catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
    /// All entries in category order. Built once at construction.
    flat: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from categories, rejecting empty catalogs and
    /// duplicate sources.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let flat: Vec<CatalogEntry> = categories
            .iter()
            .flat_map(|c| c.entries.iter().cloned())
            .collect();
        if flat.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &flat {
            if !seen.insert(entry.source.as_str()) {
                return Err(CatalogError::DuplicateSource(entry.source.clone()));
            }
        }
        Ok(Self { categories, flat })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.category)
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The catalog shipped with the widget.
    pub fn builtin() -> Self {
        let category = |name: &str, entries: &[(&str, &str)]| Category {
            name: name.to_string(),
            entries: entries
                .iter()
                .map(|(file, label)| CatalogEntry::new(format!("infographics/{file}"), *label))
                .collect(),
        };
        let categories = vec![
            category(
                "brainstorm",
                &[
                    ("brainstorm-1.png", "Brainstorm 1"),
                    ("brainstorm-2.png", "Brainstorm 2"),
                    ("brainstorm-3.png", "Brainstorm 3"),
                    ("brainstorm-4.png", "Brainstorm 4"),
                ],
            ),
            category(
                "steps",
                &[
                    ("steps-1.png", "Steps 1"),
                    ("steps-2.png", "Steps 2"),
                    ("steps-3.png", "Steps 3"),
                    ("steps-4.png", "Steps 4"),
                ],
            ),
            category(
                "venn",
                &[
                    ("venn-1.png", "Venn Diagram 1"),
                    ("venn-2.png", "Venn Diagram 2"),
                    ("venn-3.png", "Venn Diagram 3"),
                ],
            ),
            category(
                "mindmap",
                &[
                    ("mindmap-1.png", "Mind Map 1"),
                    ("mindmap-2.png", "Mind Map 2"),
                    ("mindmap-3.png", "Mind Map 3"),
                    ("mindmap-4.png", "Mind Map 4"),
                    ("mindmap-5.png", "Mind Map 5"),
                ],
            ),
            category("special", &[("the-rock-eyebrow.gif", "The Rock")]),
        ];
        let flat = categories
            .iter()
            .flat_map(|c| c.entries.iter().cloned())
            .collect();
        Self { categories, flat }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every entry, flattened in category order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.flat
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.flat.get(index)
    }

    pub fn find(&self, source: &str) -> Option<&CatalogEntry> {
        self.flat.iter().find(|e| e.source == source)
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Always false for a constructed catalog; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}
