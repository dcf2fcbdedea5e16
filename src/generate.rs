//! The timed generation pipeline.
//!
//! [`Pipeline`] owns one block's [`Carousel`] and runs each generation request
//! as a tokio task:
//!
//! ```text
//! generate()          ─ begin_generation, returns immediately
//!   sleep(generation_delay)
//!   Generator::generate(exclusion key)
//!     Ok  → commit_generation
//!     Err → fail_generation, stop
//!   sleep(settle_delay)
//!   finish_generation → on_complete()
//! ```
//!
//! The first delay stands in for the backing call's round trip, the second
//! lets the presentation fade the skeleton out before the image is trusted.
//!
//! ## Cancellation
//!
//! Each request carries the [`GenerationToken`](crate::carousel::GenerationToken)
//! issued by the carousel, and every step after a sleep re-checks it, so a
//! superseded request can never write into the history. On top of that the
//! pipeline aborts the previous task when a new request starts and aborts the
//! in-flight task when it is dropped: nothing outlives the block.
//!
//! ## Announcements
//!
//! The carousel sits behind a mutex. Its announcements are queued while the
//! lock is held and delivered after it is released, so an announcer may read
//! the state back through a [`StateHandle`].
//!
//! ## Backends
//!
//! [`Generator`] is the seam for the real image service. The only backend
//! shipped is [`CatalogGenerator`], which picks a random catalog entry other
//! than the one on screen. Retrying failures is the backend's business; the
//! pipeline reports a failure once and returns to the settled state.

use crate::announce::SharedAnnouncer;
use crate::carousel::{Carousel, GenerationState};
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::TimingConfig;
use crate::selector::{make_rng, pick_random, pick_random_excluding};
use crate::types::Dimensions;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("image service unavailable: {0}")]
    Unavailable(String),
    #[error("image service rejected the request: {0}")]
    Rejected(String),
}

/// Produces the next image for a block.
pub trait Generator: Send + Sync {
    /// `exclude` is the source currently on screen; backends should avoid
    /// returning it when they can.
    fn generate(&self, exclude: &str) -> Result<CatalogEntry, GenerateError>;
}

/// Stub backend: a random catalog entry different from the displayed one.
#[derive(Debug)]
pub struct CatalogGenerator {
    catalog: Arc<Catalog>,
    rng: Mutex<StdRng>,
}

impl CatalogGenerator {
    pub fn new(catalog: Arc<Catalog>, seed: Option<u64>) -> Self {
        Self {
            catalog,
            rng: Mutex::new(make_rng(seed)),
        }
    }

    /// Any entry, for seeding a new block's placeholder image.
    pub fn seed_entry(&self) -> CatalogEntry {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pick_random(&self.catalog, &mut *rng).clone()
    }
}

impl Generator for CatalogGenerator {
    fn generate(&self, exclude: &str) -> Result<CatalogEntry, GenerateError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pick_random_excluding(&self.catalog, exclude, &mut *rng).clone())
    }
}

/// Delays between the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub generation_delay: Duration,
    pub settle_delay: Duration,
}

impl Timing {
    pub fn from_config(config: &TimingConfig) -> Self {
        Self {
            generation_delay: Duration::from_millis(config.generation_delay_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

fn lock(carousel: &Mutex<Carousel>) -> MutexGuard<'_, Carousel> {
    carousel.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` under the lock, then deliver its announcements unlocked.
fn locked<R>(carousel: &Mutex<Carousel>, f: impl FnOnce(&mut Carousel) -> R) -> R {
    let (result, outbox) = {
        let mut guard = lock(carousel);
        let result = f(&mut *guard);
        (result, guard.take_outbox())
    };
    outbox.deliver();
    result
}

/// Cloneable read access to a pipeline's state, e.g. for an announcer that
/// re-renders on every message.
#[derive(Clone)]
pub struct StateHandle {
    carousel: Arc<Mutex<Carousel>>,
}

impl StateHandle {
    pub fn snapshot(&self) -> GenerationState {
        lock(&self.carousel).snapshot()
    }
}

/// Drives one block's carousel through timed generations.
///
/// `generate` must be called from within a tokio runtime.
pub struct Pipeline {
    carousel: Arc<Mutex<Carousel>>,
    generator: Arc<dyn Generator>,
    timing: Timing,
    task: Option<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(mut carousel: Carousel, generator: Arc<dyn Generator>, timing: Timing) -> Self {
        carousel.defer_announcements();
        Self {
            carousel: Arc::new(Mutex::new(carousel)),
            generator,
            timing,
            task: None,
        }
    }

    /// Pipeline over a catalog-backed stub, seeded with a random entry.
    pub fn from_catalog(
        catalog: Arc<Catalog>,
        seed: Option<u64>,
        dimensions: Dimensions,
        timing: Timing,
        announcer: SharedAnnouncer,
    ) -> Self {
        let generator = CatalogGenerator::new(catalog, seed);
        let carousel = Carousel::new(&generator.seed_entry(), dimensions, announcer);
        Self::new(carousel, Arc::new(generator), timing)
    }

    pub fn snapshot(&self) -> GenerationState {
        lock(&self.carousel).snapshot()
    }

    pub fn state_handle(&self) -> StateHandle {
        StateHandle {
            carousel: Arc::clone(&self.carousel),
        }
    }

    /// Run `f` against the carousel under its lock.
    pub fn with_carousel<R>(&self, f: impl FnOnce(&mut Carousel) -> R) -> R {
        locked(&self.carousel, f)
    }

    pub fn generate(&mut self) {
        self.generate_then(|| {});
    }

    /// Start a generation; `on_complete` runs after the success announcement.
    ///
    /// `on_complete` is dropped without running if the generation fails, is
    /// superseded, or the pipeline is dropped first.
    pub fn generate_then(&mut self, on_complete: impl FnOnce() + Send + 'static) {
        let token = locked(&self.carousel, Carousel::begin_generation);
        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        let carousel = Arc::clone(&self.carousel);
        let generator = Arc::clone(&self.generator);
        let timing = self.timing;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(timing.generation_delay).await;
            let committed = locked(&carousel, |carousel| {
                if !carousel.is_pending(token) {
                    return false;
                }
                let exclude = carousel.exclusion_key().to_string();
                match generator.generate(&exclude) {
                    Ok(entry) => carousel.commit_generation(token, &entry),
                    Err(e) => {
                        tracing::warn!(token = token.value(), error = %e, "image generation failed");
                        carousel.fail_generation(token);
                        false
                    }
                }
            });
            if !committed {
                return;
            }

            tokio::time::sleep(timing.settle_delay).await;
            if locked(&carousel, |carousel| carousel.finish_generation(token)) {
                on_complete();
            }
        }));
    }

    /// Wait for the generation in flight (if any) to run to completion.
    ///
    /// A panic inside the task (in `on_complete` or the announcer) resumes
    /// here.
    pub async fn settle(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }

    pub fn navigate_next(&self) {
        locked(&self.carousel, Carousel::navigate_next);
    }

    pub fn navigate_prev(&self) {
        locked(&self.carousel, Carousel::navigate_prev);
    }

    pub fn delete_current(&self) -> bool {
        locked(&self.carousel, Carousel::delete_current)
    }

    pub fn select_image(&self, source: &str, label: &str) {
        locked(&self.carousel, |carousel| carousel.select_image(source, label));
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{Announcer, Recorder, messages};
    use crate::test_helpers::{catalog_of, entry};
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn pipeline_over(sources: &[&str]) -> (Pipeline, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::new());
        let pipeline = Pipeline::from_catalog(
            Arc::new(catalog_of(sources)),
            Some(17),
            Dimensions::default(),
            Timing::default(),
            recorder.clone(),
        );
        (pipeline, recorder)
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn generate(&self, _exclude: &str) -> Result<CatalogEntry, GenerateError> {
            Err(GenerateError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn default_timing_matches_stock_config() {
        let timing = Timing::default();
        assert_eq!(timing.generation_delay, ms(2000));
        assert_eq!(timing.settle_delay, ms(300));
    }

    #[test]
    fn catalog_generator_avoids_excluded_source() {
        let generator = CatalogGenerator::new(Arc::new(catalog_of(&["a", "b"])), Some(1));
        for _ in 0..10 {
            assert_eq!(generator.generate("a").unwrap().source, "b");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn generate_runs_two_stage_sequence() {
        let (mut pipeline, recorder) = pipeline_over(&["a", "b", "c"]);
        pipeline.generate();

        let state = pipeline.snapshot();
        assert!(state.is_converting());
        assert!(state.is_skeleton_visible());
        assert_eq!(recorder.messages(), vec![messages::GENERATING]);

        tokio::time::sleep(ms(1999)).await;
        assert!(pipeline.snapshot().images().is_empty());

        tokio::time::sleep(ms(101)).await;
        let state = pipeline.snapshot();
        assert_eq!(state.images().len(), 1);
        assert!(state.is_converting(), "skeleton stays until the settle delay passes");
        assert!(!state.has_image());

        tokio::time::sleep(ms(300)).await;
        let state = pipeline.snapshot();
        assert!(!state.is_converting());
        assert!(!state.is_skeleton_visible());
        assert!(state.has_image());
        assert_eq!(
            recorder.messages(),
            vec![messages::GENERATING, messages::GENERATED]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn generated_image_differs_from_displayed() {
        let (mut pipeline, _) = pipeline_over(&["a", "b"]);
        let seed = pipeline.snapshot().current_image().source.clone();
        pipeline.generate();
        pipeline.settle().await;
        assert_ne!(pipeline.snapshot().current_image().source, seed);
    }

    #[tokio::test(start_paused = true)]
    async fn on_complete_runs_once_after_success() {
        let (mut pipeline, recorder) = pipeline_over(&["a", "b"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seen_by_callback = Arc::clone(&recorder);
        pipeline.generate_then(move || {
            assert_eq!(seen_by_callback.last().as_deref(), Some(messages::GENERATED));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pipeline.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_generations_land_once() {
        let (mut pipeline, recorder) = pipeline_over(&["a", "b", "c"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        pipeline.generate_then(move || {
            first.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(ms(1000)).await;
        let second = Arc::clone(&calls);
        pipeline.generate_then(move || {
            second.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(ms(5000)).await;
        let state = pipeline.snapshot();
        assert_eq!(state.images().len(), 1);
        assert!(!state.is_converting());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(
            recorder.messages(),
            vec![messages::GENERATING, messages::GENERATING, messages::GENERATED]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_during_settle_delay_lands_once() {
        let (mut pipeline, recorder) = pipeline_over(&["a", "b", "c"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        pipeline.generate_then(move || {
            first.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(ms(2100)).await;
        assert_eq!(pipeline.snapshot().images().len(), 1, "first result committed");

        let second = Arc::clone(&calls);
        pipeline.generate_then(move || {
            second.fetch_add(10, Ordering::SeqCst);
        });
        assert!(pipeline.snapshot().images().is_empty(), "first result rolled back");
        pipeline.settle().await;

        let state = pipeline.snapshot();
        assert_eq!(state.images().len(), 1);
        assert_eq!(state.current_index(), 0);
        assert!(!state.is_detached());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(
            recorder.messages(),
            vec![messages::GENERATING, messages::GENERATING, messages::GENERATED]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_during_settle_delay_keeps_earlier_history() {
        let (mut pipeline, _) = pipeline_over(&["a", "b", "c"]);
        pipeline.generate();
        pipeline.settle().await;
        let kept = pipeline.snapshot().current_image().clone();

        pipeline.generate();
        tokio::time::sleep(ms(2100)).await;
        pipeline.generate();
        let state = pipeline.snapshot();
        assert_eq!(state.images(), &[kept.clone()]);
        assert_eq!(state.current_image(), &kept);

        pipeline.settle().await;
        let state = pipeline.snapshot();
        assert_eq!(state.images().len(), 2);
        assert_eq!(state.images()[0], kept);
        assert_eq!(state.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "callback failed")]
    async fn settle_resumes_panic_from_callback() {
        let (mut pipeline, _) = pipeline_over(&["a", "b"]);
        pipeline.generate_then(|| panic!("callback failed"));
        pipeline.settle().await;
    }

    /// Re-reads the block state on every announcement, as a renderer would.
    #[derive(Default)]
    struct Rerender {
        handle: OnceLock<StateHandle>,
        seen: Mutex<Vec<(String, bool, usize)>>,
    }

    impl Announcer for Rerender {
        fn announce(&self, message: &str) {
            if let Some(handle) = self.handle.get() {
                let state = handle.snapshot();
                self.seen.lock().unwrap().push((
                    message.to_string(),
                    state.is_converting(),
                    state.images().len(),
                ));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn announcer_can_read_state_back() {
        let sink = Arc::new(Rerender::default());
        let mut pipeline = Pipeline::from_catalog(
            Arc::new(catalog_of(&["a", "b", "c"])),
            Some(5),
            Dimensions::default(),
            Timing::default(),
            sink.clone(),
        );
        assert!(sink.handle.set(pipeline.state_handle()).is_ok());

        pipeline.generate();
        pipeline.settle().await;
        pipeline.generate();
        pipeline.settle().await;
        pipeline.navigate_prev();
        pipeline.delete_current();

        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![
                (messages::GENERATING.to_string(), true, 0),
                (messages::GENERATED.to_string(), false, 1),
                (messages::GENERATING.to_string(), true, 1),
                (messages::GENERATED.to_string(), false, 2),
                ("Displaying image 1 of 2".to_string(), false, 2),
                (messages::REMOVED_FROM_CAROUSEL.to_string(), false, 1),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_pipeline_cancels_in_flight_generation() {
        let (mut pipeline, recorder) = pipeline_over(&["a", "b"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        pipeline.generate_then(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(ms(2100)).await;
        drop(pipeline);

        tokio::time::sleep(ms(5000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.messages(), vec![messages::GENERATING]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_backend_reports_and_keeps_history() {
        let recorder = Arc::new(Recorder::new());
        let carousel = Carousel::new(&entry("seed"), Dimensions::default(), recorder.clone());
        let mut pipeline = Pipeline::new(carousel, Arc::new(FailingGenerator), Timing::default());

        let called = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&called);
        pipeline.generate_then(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pipeline.settle().await;

        let state = pipeline.snapshot();
        assert!(!state.is_converting());
        assert!(!state.is_skeleton_visible());
        assert!(!state.has_image());
        assert!(state.images().is_empty());
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert_eq!(
            recorder.messages(),
            vec![messages::GENERATING, messages::GENERATION_FAILED]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_works_while_generating() {
        let (mut pipeline, _) = pipeline_over(&["a", "b", "c"]);
        pipeline.generate();
        pipeline.settle().await;
        pipeline.generate();
        pipeline.settle().await;

        pipeline.generate();
        pipeline.navigate_prev();
        assert_eq!(pipeline.snapshot().current_index(), 0);
        pipeline.settle().await;

        let state = pipeline.snapshot();
        assert_eq!(state.images().len(), 3);
        assert_eq!(state.current_index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timing_is_honoured() {
        let recorder = Arc::new(Recorder::new());
        let mut pipeline = Pipeline::from_catalog(
            Arc::new(catalog_of(&["a", "b"])),
            None,
            Dimensions::default(),
            Timing {
                generation_delay: ms(10),
                settle_delay: ms(5),
            },
            recorder.clone(),
        );
        pipeline.generate();
        tokio::time::sleep(ms(16)).await;
        assert!(pipeline.snapshot().has_image());
    }
}
