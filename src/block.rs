//! Headless controller for one text block.
//!
//! A [`Block`] is the state a presentation layer needs to render a paragraph
//! that can be turned into an illustration: whether the image region is shown
//! ("visual mode"), the overflow menu, the bookmark, the catalog picker and
//! the full-screen lightbox. Image state itself lives in the block's
//! [`Pipeline`]; the block forwards user intents to it and adds the
//! presentation rules around them:
//!
//! - Converting or switching on visual mode only generates when the block has
//!   no image yet.
//! - Deleting the last image leaves visual mode.
//! - The lightbox only opens over a settled image.
//! - Picking from the catalog closes the picker.
//!
//! Every intent announces its outcome through the block's announcer.

use crate::announce::{SharedAnnouncer, messages};
use crate::carousel::GenerationState;
use crate::catalog::Catalog;
use crate::config::WidgetConfig;
use crate::generate::{Pipeline, Timing};
use crate::picker::CatalogPager;
use serde::Serialize;
use std::sync::Arc;

/// Presentation flags of a block, as rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockView {
    pub visual_mode: bool,
    pub menu_open: bool,
    pub bookmarked: bool,
    pub picker_open: bool,
    pub lightbox_open: bool,
}

pub struct Block {
    pipeline: Pipeline,
    catalog: Arc<Catalog>,
    pager: CatalogPager,
    announcer: SharedAnnouncer,
    view: BlockView,
}

impl Block {
    pub fn new(
        pipeline: Pipeline,
        catalog: Arc<Catalog>,
        per_page: usize,
        announcer: SharedAnnouncer,
    ) -> Self {
        let pager = CatalogPager::for_catalog(&catalog, per_page);
        Self {
            pipeline,
            catalog,
            pager,
            announcer,
            view: BlockView::default(),
        }
    }

    /// Block over the catalog-backed generator, wired from configuration.
    pub fn from_config(
        config: &WidgetConfig,
        catalog: Arc<Catalog>,
        announcer: SharedAnnouncer,
    ) -> Self {
        let pipeline = Pipeline::from_catalog(
            Arc::clone(&catalog),
            config.selector.seed,
            config.images.dimensions(),
            Timing::from_config(&config.timing),
            Arc::clone(&announcer),
        );
        Self::new(pipeline, catalog, config.picker.per_page, announcer)
    }

    pub fn view(&self) -> BlockView {
        self.view
    }

    pub fn images(&self) -> GenerationState {
        self.pipeline.snapshot()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pager(&self) -> &CatalogPager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut CatalogPager {
        &mut self.pager
    }

    // =========================================================================
    // Menu
    // =========================================================================

    pub fn toggle_menu(&mut self) {
        self.view.menu_open = !self.view.menu_open;
    }

    /// Close the menu, e.g. on a click outside it.
    pub fn dismiss_menu(&mut self) {
        self.view.menu_open = false;
    }

    pub fn toggle_bookmark(&mut self) {
        let was_bookmarked = self.view.bookmarked;
        self.view.bookmarked = !was_bookmarked;
        self.view.menu_open = false;
        self.announcer.announce(if was_bookmarked {
            messages::BOOKMARK_REMOVED
        } else {
            messages::BOOKMARK_ADDED
        });
    }

    // =========================================================================
    // Visual mode
    // =========================================================================

    /// The "convert to image" action: show the image region, generating the
    /// first image if there is none.
    pub fn convert_to_image(&mut self) {
        self.view.menu_open = false;
        self.view.visual_mode = true;
        if !self.pipeline.snapshot().has_image() {
            self.pipeline.generate();
        }
    }

    pub fn toggle_visual_mode(&mut self) {
        self.view.menu_open = false;
        if self.view.visual_mode {
            self.view.visual_mode = false;
            self.announcer.announce(messages::VISUALS_OFF);
        } else {
            if !self.pipeline.snapshot().has_image() {
                self.pipeline.generate();
            }
            self.view.visual_mode = true;
            self.announcer.announce(messages::VISUALS_ON);
        }
    }

    // =========================================================================
    // Carousel
    // =========================================================================

    /// Generate one more image for the history.
    pub fn regenerate(&mut self) {
        self.pipeline.generate();
    }

    pub fn next_image(&mut self) {
        self.pipeline.navigate_next();
    }

    pub fn prev_image(&mut self) {
        self.pipeline.navigate_prev();
    }

    /// Delete the displayed image; leaves visual mode once none remain.
    pub fn delete_image(&mut self) {
        if !self.pipeline.delete_current() {
            self.view.visual_mode = false;
        }
    }

    pub fn request_download(&self) {
        self.announcer.announce(messages::DOWNLOAD_REQUESTED);
    }

    // =========================================================================
    // Catalog picker
    // =========================================================================

    pub fn toggle_picker(&mut self) {
        let was_open = self.view.picker_open;
        self.view.picker_open = !was_open;
        self.announcer.announce(if was_open {
            messages::PICKER_CLOSED
        } else {
            messages::PICKER_OPENED
        });
    }

    /// Select the entry in `slot` of the current picker page and close the
    /// picker. Returns false if the slot is empty.
    pub fn pick(&mut self, slot: usize) -> bool {
        let Some(entry) = self.pager.entry_at(&self.catalog, slot) else {
            return false;
        };
        self.pipeline.select_image(&entry.source, &entry.label);
        self.view.picker_open = false;
        true
    }

    // =========================================================================
    // Lightbox
    // =========================================================================

    /// Open the full-screen view. Ignored while loading or without an image.
    pub fn open_lightbox(&mut self) -> bool {
        let state = self.pipeline.snapshot();
        if state.is_skeleton_visible() || !state.has_image() {
            return false;
        }
        self.view.lightbox_open = true;
        self.announcer.announce(messages::LIGHTBOX_OPENED);
        true
    }

    pub fn close_lightbox(&mut self) {
        self.view.lightbox_open = false;
        self.announcer.announce(messages::LIGHTBOX_CLOSED);
    }
}
