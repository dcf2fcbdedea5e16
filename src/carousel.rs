//! The per-block generation and carousel state machine.
//!
//! A [`Carousel`] owns one block's [`GenerationState`]: the history of
//! generated images, which of them is displayed, and the three flags that
//! drive the loading skeleton. It is purely synchronous. The timed pipeline in
//! [`crate::generate`] drives generation through three token-checked steps:
//!
//! ```text
//! begin_generation ──2000ms──▶ commit_generation ──300ms──▶ finish_generation
//!   converting = true            image appended               converting = false
//!   skeleton   = true            index = last                 skeleton   = false
//!                                                             has_image  = true
//! ```
//!
//! Every generation gets a fresh [`GenerationToken`]. Starting a new one
//! supersedes whatever was in flight, and the stale token's later commit or
//! finish is rejected. A superseded generation that already committed is
//! rolled back: its image leaves the history and the display returns to what
//! it showed before. Overlapping requests therefore never race each other
//! into the history: only the latest one lands.
//!
//! # Index Laws
//!
//! - Navigation wraps in both directions and is a silent no-op on histories
//!   of length ≤ 1.
//! - Deleting keeps the index where it is unless it fell off the end, in which
//!   case it moves to the new last element.
//! - Deleting the only image empties the history and clears `has_image`; the
//!   caller is told (via the `false` return) to leave visual mode.
//!
//! # Manual Selection
//!
//! [`Carousel::select_image`] displays an image without adding it to the
//! history. The selection is ephemeral: [`GenerationState::is_detached`]
//! reports the divergence, and the next navigation or generation re-syncs the
//! displayed image with the history.
//!
//! # Deferred Announcements
//!
//! A carousel announces as it goes. One shared behind a lock can instead be
//! told to [`defer_announcements`](Carousel::defer_announcements): messages
//! queue up and [`take_outbox`](Carousel::take_outbox) hands them over for
//! delivery once the lock is released, so a sink may read the state back.

use crate::announce::{SharedAnnouncer, messages};
use crate::catalog::CatalogEntry;
use crate::types::{Dimensions, ImageRef};
use serde::Serialize;

/// Identifies one call to [`Carousel::begin_generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Read-only view of one block's image state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationState {
    is_converting: bool,
    is_skeleton_visible: bool,
    has_image: bool,
    images: Vec<ImageRef>,
    current_index: usize,
    current_image: ImageRef,
}

impl GenerationState {
    fn seeded(seed: ImageRef) -> Self {
        Self {
            is_converting: false,
            is_skeleton_visible: false,
            has_image: false,
            images: Vec::new(),
            current_index: 0,
            current_image: seed,
        }
    }

    pub fn is_converting(&self) -> bool {
        self.is_converting
    }

    pub fn is_skeleton_visible(&self) -> bool {
        self.is_skeleton_visible
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Index into [`images`](Self::images). Meaningless (zero) when empty.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_image(&self) -> &ImageRef {
        &self.current_image
    }

    /// True when the displayed image is not `images[current_index]`: before
    /// the first generation (seed image) or after a manual selection.
    pub fn is_detached(&self) -> bool {
        self.images.get(self.current_index) != Some(&self.current_image)
    }
}

/// An image committed by a generation that has not finished yet.
#[derive(Debug)]
struct Landing {
    image: ImageRef,
    prior_index: usize,
    prior_image: ImageRef,
}

/// Announcements queued while the carousel was locked.
#[must_use = "queued announcements are lost unless delivered"]
pub struct Outbox {
    announcer: SharedAnnouncer,
    messages: Vec<String>,
}

impl Outbox {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn deliver(self) {
        for message in &self.messages {
            self.announcer.announce(message);
        }
    }
}

/// State machine for one block. See the module docs for the transitions.
pub struct Carousel {
    state: GenerationState,
    dimensions: Dimensions,
    announcer: SharedAnnouncer,
    last_token: u64,
    pending: Option<GenerationToken>,
    landing: Option<Landing>,
    deferred: Option<Vec<String>>,
}

impl std::fmt::Debug for Carousel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("state", &self.state)
            .field("dimensions", &self.dimensions)
            .field("pending", &self.pending)
            .field("landing", &self.landing)
            .finish()
    }
}

impl Carousel {
    /// Create the state for a fresh block.
    ///
    /// `seed` is displayed as a placeholder so there is always a current
    /// image; it is not part of the history and `has_image` stays false.
    pub fn new(seed: &CatalogEntry, dimensions: Dimensions, announcer: SharedAnnouncer) -> Self {
        Self {
            state: GenerationState::seeded(ImageRef::materialize(
                &seed.source,
                &seed.label,
                dimensions,
            )),
            dimensions,
            announcer,
            last_token: 0,
            pending: None,
            landing: None,
            deferred: None,
        }
    }

    /// Queue announcements until [`take_outbox`](Self::take_outbox) instead
    /// of delivering them immediately.
    pub fn defer_announcements(&mut self) {
        self.deferred.get_or_insert_with(Vec::new);
    }

    /// Hand over the queued announcements. Empty unless deferring.
    pub fn take_outbox(&mut self) -> Outbox {
        Outbox {
            announcer: self.announcer.clone(),
            messages: self.deferred.as_mut().map(std::mem::take).unwrap_or_default(),
        }
    }

    fn announce(&mut self, message: &str) {
        match &mut self.deferred {
            Some(queue) => queue.push(message.to_string()),
            None => self.announcer.announce(message),
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn snapshot(&self) -> GenerationState {
        self.state.clone()
    }

    /// Token of the generation currently in flight, if any.
    pub fn pending(&self) -> Option<GenerationToken> {
        self.pending
    }

    pub fn is_pending(&self, token: GenerationToken) -> bool {
        self.pending == Some(token)
    }

    /// Source to exclude when picking the next image: whatever is on screen.
    pub fn exclusion_key(&self) -> &str {
        &self.state.current_image.source
    }

    /// Enter the generating state. Supersedes any generation in flight.
    pub fn begin_generation(&mut self) -> GenerationToken {
        self.last_token += 1;
        let token = GenerationToken(self.last_token);
        if let Some(stale) = self.pending.replace(token) {
            tracing::debug!(stale = stale.0, token = token.0, "generation superseded");
        }
        if let Some(landing) = self.landing.take() {
            self.roll_back(landing);
        }
        self.state.is_converting = true;
        self.state.is_skeleton_visible = true;
        tracing::debug!(token = token.0, "generation started");
        self.announce(messages::GENERATING);
        token
    }

    /// Undo a commit whose generation never finished.
    ///
    /// Navigation and deletion may have happened since the commit, so the
    /// image is looked up rather than assumed to be last.
    fn roll_back(&mut self, landing: Landing) {
        let Some(position) = self.state.images.iter().rposition(|i| *i == landing.image) else {
            return;
        };
        self.state.images.remove(position);
        if self.state.current_image == landing.image {
            self.state.current_index = landing
                .prior_index
                .min(self.state.images.len().saturating_sub(1));
            self.state.current_image = landing.prior_image;
        } else if position < self.state.current_index {
            self.state.current_index -= 1;
        }
        tracing::debug!(source = %landing.image.source, "rolled back superseded image");
    }

    /// Append the generated image and focus it.
    ///
    /// Returns false (and changes nothing) if `token` is no longer pending.
    pub fn commit_generation(&mut self, token: GenerationToken, entry: &CatalogEntry) -> bool {
        if !self.is_pending(token) {
            tracing::debug!(token = token.0, "discarding stale generation result");
            return false;
        }
        let image = ImageRef::materialize(&entry.source, &entry.label, self.dimensions);
        self.landing = Some(Landing {
            image: image.clone(),
            prior_index: self.state.current_index,
            prior_image: self.state.current_image.clone(),
        });
        self.state.images.push(image.clone());
        self.state.current_index = self.state.images.len() - 1;
        self.state.current_image = image;
        tracing::debug!(
            token = token.0,
            source = %entry.source,
            count = self.state.images.len(),
            "generated image committed"
        );
        true
    }

    /// Leave the generating state after a successful commit.
    ///
    /// Returns false (and changes nothing) if `token` is no longer pending.
    pub fn finish_generation(&mut self, token: GenerationToken) -> bool {
        if !self.is_pending(token) {
            return false;
        }
        self.pending = None;
        self.landing = None;
        self.state.is_converting = false;
        self.state.is_skeleton_visible = false;
        self.state.has_image = true;
        self.announce(messages::GENERATED);
        true
    }

    /// Leave the generating state after the backing call failed.
    ///
    /// History and `has_image` are untouched.
    pub fn fail_generation(&mut self, token: GenerationToken) -> bool {
        if !self.is_pending(token) {
            return false;
        }
        self.pending = None;
        self.state.is_converting = false;
        self.state.is_skeleton_visible = false;
        self.announce(messages::GENERATION_FAILED);
        true
    }

    pub fn navigate_next(&mut self) {
        let len = self.state.images.len();
        if len <= 1 {
            return;
        }
        self.show((self.state.current_index + 1) % len);
    }

    pub fn navigate_prev(&mut self) {
        let len = self.state.images.len();
        if len <= 1 {
            return;
        }
        self.show((self.state.current_index + len - 1) % len);
    }

    fn show(&mut self, index: usize) {
        let len = self.state.images.len();
        self.state.current_index = index;
        self.state.current_image = self.state.images[index].clone();
        self.announce(&messages::displaying(index + 1, len));
    }

    /// Remove the image at the current index.
    ///
    /// Returns whether the block should stay in visual mode: `false` once the
    /// history is empty.
    pub fn delete_current(&mut self) -> bool {
        if self.state.images.len() <= 1 {
            self.state.has_image = false;
            self.state.images.clear();
            self.state.current_index = 0;
            self.announce(messages::REMOVED_LAST);
            return false;
        }
        debug_assert!(self.state.current_index < self.state.images.len());
        let removed = self.state.images.remove(self.state.current_index);
        let index = self.state.current_index.min(self.state.images.len() - 1);
        self.state.current_index = index;
        self.state.current_image = self.state.images[index].clone();
        tracing::debug!(source = %removed.source, index, "image removed");
        self.announce(messages::REMOVED_FROM_CAROUSEL);
        true
    }

    /// Display `source` without adding it to the history.
    pub fn select_image(&mut self, source: &str, label: &str) {
        self.state.current_image = ImageRef::materialize(source, label, self.dimensions);
        self.announce(&messages::selected(label));
    }
}
