//! Non-visual feedback: the announcer sink.
//!
//! Every semantic transition of a block is reported as one short English
//! sentence through [`Announcer::announce`]. The exact wording is part of the
//! accessibility contract, so all of it lives in [`messages`] and tests match
//! it verbatim.
//!
//! The sink is owned by the caller. Implementations provided here:
//!
//! | Type | Use |
//! |------|-----|
//! | any `Fn(&str) + Send + Sync` | ad-hoc callbacks |
//! | [`ChannelAnnouncer`] | forward to a printer thread over `std::sync::mpsc` |
//! | [`LiveRegion`] | hold the latest message, expire it after a timeout |
//! | [`Recorder`] | collect everything, for tests and replays |

use crate::config::AnnouncerConfig;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Write-only notification channel.
///
/// Blocks deliver announcements after releasing their state lock, so a sink
/// may read the state back through a
/// [`StateHandle`](crate::generate::StateHandle). A bare
/// [`Carousel`](crate::carousel::Carousel) announces inline from `&mut self`.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: &str);
}

/// The form in which carousels and blocks hold their announcer.
pub type SharedAnnouncer = Arc<dyn Announcer>;

impl<F> Announcer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn announce(&self, message: &str) {
        self(message)
    }
}

/// Announcement wording.
pub mod messages {
    pub const GENERATING: &str = "Generating a new image. Please wait...";
    pub const GENERATED: &str = "New image has been generated successfully.";
    pub const GENERATION_FAILED: &str = "Image generation failed. Please try again.";
    pub const REMOVED_LAST: &str = "Image has been removed";
    pub const REMOVED_FROM_CAROUSEL: &str = "Image has been removed from the carousel";
    pub const BOOKMARK_ADDED: &str = "Bookmark added";
    pub const BOOKMARK_REMOVED: &str = "Bookmark removed";
    pub const VISUALS_ON: &str = "Content displayed as visuals";
    pub const VISUALS_OFF: &str = "Visual display mode disabled";
    pub const PICKER_OPENED: &str = "Image selector opened";
    pub const PICKER_CLOSED: &str = "Image selector closed";
    pub const DOWNLOAD_REQUESTED: &str = "Image download requested";
    pub const LIGHTBOX_OPENED: &str = "Image opened in full screen mode";
    pub const LIGHTBOX_CLOSED: &str = "Full screen image view closed";

    /// 1-based position announcement after navigation.
    pub fn displaying(position: usize, total: usize) -> String {
        format!("Displaying image {position} of {total}")
    }

    pub fn selected(label: &str) -> String {
        format!("Selected image: {label}")
    }
}

/// Forwards announcements over a channel. A disconnected receiver is ignored.
#[derive(Debug)]
pub struct ChannelAnnouncer {
    tx: Mutex<Sender<String>>,
}

impl ChannelAnnouncer {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl Announcer for ChannelAnnouncer {
    fn announce(&self, message: &str) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(message.to_string());
    }
}

/// An aria-live style region: shows the most recent message until it expires.
#[derive(Debug)]
pub struct LiveRegion {
    clear_after: Duration,
    latest: Mutex<Option<(String, Instant)>>,
}

impl LiveRegion {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            clear_after,
            latest: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AnnouncerConfig) -> Self {
        Self::new(Duration::from_millis(config.clear_after_ms))
    }

    /// The message currently on screen, if it has not expired yet.
    pub fn current(&self) -> Option<String> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest
            .as_ref()
            .filter(|(_, at)| at.elapsed() < self.clear_after)
            .map(|(message, _)| message.clone())
    }
}

impl Announcer for LiveRegion {
    fn announce(&self, message: &str) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest = Some((message.to_string(), Instant::now()));
    }
}

/// Collects every announcement in order.
#[derive(Debug, Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Announcer for Recorder {
    fn announce(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
