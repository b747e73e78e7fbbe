//! Observer trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionObserver>`] via
//! [`crate::config::ExtractionConfigBuilder::observer`] to follow the
//! orchestrator through its states, watch pages come out of the provider and
//! see which fallback candidate won.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2text::{ExtractionConfig, ExtractionObserver, ExtractionState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StateLog(Mutex<Vec<ExtractionState>>);
//!
//! impl ExtractionObserver for StateLog {
//!     fn on_state_change(&self, state: ExtractionState) {
//!         self.0.lock().unwrap().push(state);
//!     }
//! }
//!
//! let log = Arc::new(StateLog::default());
//! let config = ExtractionConfig::builder()
//!     .observer(log.clone() as Arc<dyn ExtractionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::document::{Diagnostics, ExtractionCandidate, ExtractionState};
use std::sync::Arc;

/// Called by the pipeline as an extraction progresses.
///
/// Page events fire from tokio's blocking pool, so implementations must be
/// `Send + Sync`. Every method defaults to a no-op.
pub trait ExtractionObserver: Send + Sync {
    /// The orchestrator entered `state`.
    fn on_state_change(&self, state: ExtractionState) {
        let _ = state;
    }

    /// A page was read from the provider.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: pages in the document
    /// * `chars`: characters contributed by this page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// The fallback decoder produced a candidate: one per encoding, before ranking.
    fn on_candidate(&self, candidate: &ExtractionCandidate) {
        let _ = candidate;
    }

    /// Extraction finished with accepted text.
    fn on_complete(&self, diagnostics: &Diagnostics) {
        let _ = diagnostics;
    }
}

/// Shared observer handle as stored in the config.
pub type ObserverHandle = Arc<dyn ExtractionObserver>;

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}
