//! CLI output formatting for catalogs and block state.
//!
//! # Information-First Display
//!
//! Every entity (category, image, picker slot) leads with its positional
//! index and label; sources and sizes follow as indented context lines. The
//! same helpers format the catalog listing and the carousel history, so an
//! image looks the same wherever it is shown.
//!
//! # Output Format
//!
//! ## Catalog
//!
//! ```text
//! Catalog (17 images)
//! 001 brainstorm (4 images)
//!     001 Brainstorm 1
//!         Source: infographics/brainstorm-1.png
//! ```
//!
//! ## Block state
//!
//! ```text
//! Status: settled
//! Visual mode: on
//! Images (2)
//!     001 Steps 3
//!   * 002 Venn Diagram 1
//! Displayed: Venn Diagram 1
//!     Source: infographics/venn-1.png
//!     Size: 1200x675
//! ```
//!
//! ## Announcements
//!
//! ```text
//! >> Generating a new image. Please wait...
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability; `print_*`
//! wrappers write to stdout. Format functions are pure: no I/O, no side
//! effects.

use crate::block::BlockView;
use crate::carousel::GenerationState;
use crate::catalog::Catalog;
use crate::picker::CatalogPager;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "image" } else { "images" }
}

/// Header for a group of images, e.g. `001 brainstorm (4 images)`.
fn entity_header(index: usize, title: &str, count: usize) -> String {
    format!("{} {} ({} {})", format_index(index), title, count, plural(count))
}

/// Image line; the current image is marked with `*` in the gutter.
fn image_line(index: usize, label: &str, current: bool) -> String {
    let marker = if current { "  * " } else { "    " };
    format!("{}{} {}", marker, format_index(index), label)
}

fn status(state: &GenerationState) -> &'static str {
    if state.is_converting() {
        "generating"
    } else if state.has_image() {
        "settled"
    } else {
        "idle"
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

// ============================================================================
// Catalog
// ============================================================================

pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![format!("Catalog ({} {})", catalog.len(), plural(catalog.len()))];
    for (i, category) in catalog.categories().iter().enumerate() {
        lines.push(entity_header(i + 1, &category.name, category.entries.len()));
        for (j, entry) in category.entries.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), entry.label));
            lines.push(format!("{}Source: {}", indent(2), entry.source));
        }
    }
    lines
}

pub fn print_catalog(catalog: &Catalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Block state
// ============================================================================

/// Format a block's image state, with its presentation flags when known.
pub fn format_state(state: &GenerationState, view: Option<&BlockView>) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", status(state))];

    if let Some(view) = view {
        lines.push(format!("Visual mode: {}", on_off(view.visual_mode)));
        if view.bookmarked {
            lines.push("Bookmarked".to_string());
        }
        if view.lightbox_open {
            lines.push("Lightbox: open".to_string());
        }
    }

    lines.push(format!("Images ({})", state.images().len()));
    for (i, image) in state.images().iter().enumerate() {
        let current = i == state.current_index() && !state.is_detached();
        lines.push(image_line(i + 1, &image.label, current));
    }

    let displayed = state.current_image();
    let detached = if state.is_detached() && state.has_image() {
        " (not in history)"
    } else {
        ""
    };
    lines.push(format!("Displayed: {}{}", displayed.label, detached));
    lines.push(format!("{}Source: {}", indent(1), displayed.source));
    lines.push(format!(
        "{}Size: {}x{}",
        indent(1),
        displayed.width,
        displayed.height
    ));
    lines
}

pub fn print_state(state: &GenerationState, view: Option<&BlockView>) {
    for line in format_state(state, view) {
        println!("{}", line);
    }
}

// ============================================================================
// Picker and announcements
// ============================================================================

/// The current picker page with empty slots shown as `(empty)`.
pub fn format_picker_page(pager: &CatalogPager, catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![format!("Page {} of {}", pager.page() + 1, pager.pages())];
    let entries = pager.page_entries(catalog);
    for (slot, entry) in entries.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), slot, entry.label));
    }
    for slot in entries.len()..entries.len() + pager.placeholders() {
        lines.push(format!("{}{} (empty)", indent(1), slot));
    }
    lines
}

pub fn print_picker_page(pager: &CatalogPager, catalog: &Catalog) {
    for line in format_picker_page(pager, catalog) {
        println!("{}", line);
    }
}

pub fn format_announcement(message: &str) -> String {
    format!(">> {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{carousel_with, catalog_of, entry, recorded_carousel};

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn entity_header_pluralizes() {
        assert_eq!(entity_header(1, "special", 1), "001 special (1 image)");
        assert_eq!(entity_header(2, "venn", 3), "002 venn (3 images)");
    }

    #[test]
    fn image_line_marks_current() {
        assert_eq!(image_line(2, "Steps 2", true), "  * 002 Steps 2");
        assert_eq!(image_line(3, "Steps 3", false), "    003 Steps 3");
    }

    #[test]
    fn catalog_listing() {
        let lines = format_catalog(&catalog_of(&["a.png", "b.png"]));
        assert_eq!(
            lines,
            vec![
                "Catalog (2 images)",
                "001 fixture (2 images)",
                "    001 A.PNG",
                "        Source: a.png",
                "    002 B.PNG",
                "        Source: b.png",
            ]
        );
    }

    #[test]
    fn builtin_catalog_listing_starts_with_brainstorm() {
        let lines = format_catalog(&Catalog::builtin());
        assert_eq!(lines[0], "Catalog (17 images)");
        assert_eq!(lines[1], "001 brainstorm (4 images)");
        assert!(lines.contains(&"005 special (1 image)".to_string()));
    }

    #[test]
    fn idle_state() {
        let (carousel, _) = recorded_carousel(&entry("seed"));
        let lines = format_state(carousel.state(), None);
        assert_eq!(lines[0], "Status: idle");
        assert_eq!(lines[1], "Images (0)");
        assert_eq!(lines[2], "Displayed: SEED");
        assert_eq!(lines[4], "    Size: 1200x675");
    }

    #[test]
    fn settled_state_marks_current_image() {
        let (carousel, _) = carousel_with(&["a", "b"], 1);
        let view = BlockView {
            visual_mode: true,
            ..BlockView::default()
        };
        let lines = format_state(carousel.state(), Some(&view));
        assert_eq!(
            lines,
            vec![
                "Status: settled",
                "Visual mode: on",
                "Images (2)",
                "    001 A",
                "  * 002 B",
                "Displayed: B",
                "    Source: b",
                "    Size: 1200x675",
            ]
        );
    }

    #[test]
    fn detached_selection_is_flagged() {
        let (mut carousel, _) = carousel_with(&["a"], 0);
        carousel.select_image("x", "X");
        let lines = format_state(carousel.state(), None);
        assert!(lines.contains(&"    001 A".to_string()));
        assert!(lines.contains(&"Displayed: X (not in history)".to_string()));
    }

    #[test]
    fn generating_state() {
        let (mut carousel, _) = carousel_with(&["a"], 0);
        carousel.begin_generation();
        assert_eq!(format_state(carousel.state(), None)[0], "Status: generating");
    }

    #[test]
    fn picker_page_pads_short_page() {
        let catalog = catalog_of(&["a", "b", "c", "d"]);
        let mut pager = CatalogPager::for_catalog(&catalog, 3);
        pager.next();
        assert_eq!(
            format_picker_page(&pager, &catalog),
            vec!["Page 2 of 2", "    0 D", "    1 (empty)", "    2 (empty)"]
        );
    }

    #[test]
    fn picker_page_follows_block_paging() {
        use crate::announce::Recorder;
        use crate::block::Block;
        use crate::config::WidgetConfig;
        use std::sync::Arc;

        let mut block = Block::from_config(
            &WidgetConfig::default(),
            Arc::new(Catalog::builtin()),
            Arc::new(Recorder::new()),
        );
        block.toggle_picker();
        block.pager_mut().prev();
        assert_eq!(
            format_picker_page(block.pager(), block.catalog()),
            vec!["Page 6 of 6", "    0 Mind Map 5", "    1 The Rock", "    2 (empty)"]
        );
    }

    #[test]
    fn announcement_prefix() {
        assert_eq!(format_announcement("Bookmark added"), ">> Bookmark added");
    }
}
