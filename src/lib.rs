//! # Visual Blocks
//!
//! Headless core of a content-transformation widget: any block of text can be
//! shown as a generated illustration, with a per-block history of images that
//! can be browsed, regenerated, pruned, and viewed full screen.
//!
//! # Architecture: One State Machine per Block
//!
//! ```text
//! Block (presentation flags: visual mode, menu, picker, lightbox)
//!   └─ Pipeline (tokio task per generation, aborted on drop)
//!        └─ Carousel (history, index, flags; synchronous, token-checked)
//!             ├─ Generator  → picks the next image (catalog stub by default)
//!             └─ Announcer  → one sentence per transition, caller-owned
//! ```
//!
//! The carousel is the only place image state changes. Everything above it
//! forwards intents; everything below it is injected. Blocks never share
//! mutable state: the catalog is an immutable `Arc<Catalog>`, and each block
//! owns its own RNG.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`carousel`] | Generation/carousel state machine and its read-only `GenerationState` |
//! | [`generate`] | Timed two-stage pipeline, `Generator` backend seam, catalog stub |
//! | [`block`] | Headless presentation controller for one text block |
//! | [`catalog`] | Immutable category → image table, built-in or loaded from TOML |
//! | [`selector`] | Uniform random picks with exclusion fallback |
//! | [`picker`] | Paged browsing of the catalog for manual selection |
//! | [`announce`] | Announcer sink trait, wording, live region, recorder |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`types`] | `ImageRef` and display dimensions |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Tokens Over Timers
//!
//! A generation is three steps separated by two delays. Rather than trusting
//! timers to fire in order, each request is tagged with a monotonically
//! increasing [`carousel::GenerationToken`] and each step checks that its
//! token is still the pending one. A second request supersedes the first; the
//! first's late result is discarded instead of overwriting the history, and
//! a result that already landed but had not settled is rolled back.
//!
//! ## Ephemeral Manual Selection
//!
//! Picking an image from the catalog displays it but does not add it to the
//! history. [`carousel::GenerationState::is_detached`] makes the divergence
//! observable, and the next navigation or generation re-syncs.
//!
//! ## Announcements Are the Error Channel
//!
//! Nothing in a block's public surface returns an error. Invalid navigation is
//! a no-op, deleting from an empty history is defined, and a failed backend
//! call is announced and leaves the history intact. Only configuration and
//! catalog loading can fail, and those happen before a block exists.

pub mod announce;
pub mod block;
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod output;
pub mod picker;
pub mod selector;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
