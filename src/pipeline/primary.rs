//! Primary extraction: drive a page text provider and assemble its output.
//!
//! The provider does the real PDF work (font maps, content streams, page
//! trees). This module only asks it for tokens page by page, in order, and
//! stitches them into one string.
//!
//! ## Why a handle instead of a global?
//!
//! Production providers are expensive to start (pdfium has to be located
//! and bound). [`ProviderHandle`] owns that lazily-started resource
//! explicitly: the orchestrator borrows it, initialisation happens at most
//! once per handle, and tests swap in a fake by constructing a handle around
//! a ready value.

use crate::document::PageToken;
use crate::error::{ExtractError, ProviderError};
use crate::progress::ExtractionObserver;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// External collaborator that turns document bytes into per-page text tokens.
///
/// Implementations are driven from tokio's blocking pool; every method may
/// block.
pub trait PageTextProvider: Send + Sync + 'static {
    /// A loaded document. May borrow from the provider and the bytes.
    type Document<'a>
    where
        Self: 'a;

    /// Parse `bytes`. Fails when they are not a valid document.
    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, ProviderError>;

    /// Number of pages in `doc`.
    fn page_count(&self, doc: &Self::Document<'_>) -> usize;

    /// Text tokens of page `page_num` (1-indexed), in reading order.
    fn page_tokens(
        &self,
        doc: &Self::Document<'_>,
        page_num: usize,
    ) -> Result<Vec<PageToken>, ProviderError>;
}

type InitFn<P> = dyn Fn() -> Result<P, ProviderError> + Send + Sync;

/// Lazily initialised, explicitly owned page text provider.
pub struct ProviderHandle<P: PageTextProvider> {
    cell: OnceCell<Arc<P>>,
    init: Option<Arc<InitFn<P>>>,
}

impl<P: PageTextProvider> ProviderHandle<P> {
    /// Wrap a provider that is already usable.
    pub fn ready(provider: P) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(provider))),
            init: None,
        }
    }

    /// Defer construction until the first extraction needs the provider.
    ///
    /// `init` runs on the blocking pool. If it fails or times out the handle
    /// stays uninitialised and the next [`acquire`](Self::acquire) tries again.
    pub fn lazy<F>(init: F) -> Self
    where
        F: Fn() -> Result<P, ProviderError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Some(Arc::new(init)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the provider, waiting at most `timeout` for it to initialise.
    pub async fn acquire(&self, timeout: Duration) -> Result<Arc<P>, ExtractError> {
        let timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        let unavailable = |detail: String| ExtractError::ProviderUnavailable { timeout_ms, detail };

        let init = self.init.clone();
        let pending = self.cell.get_or_try_init(|| async move {
            let init = init.ok_or_else(|| ProviderError::Init("no initialiser".into()))?;
            debug!("Initialising page text provider");
            tokio::task::spawn_blocking(move || init().map(Arc::new))
                .await
                .map_err(|e| ProviderError::Init(format!("initialiser panicked: {e}")))?
        });

        match tokio::time::timeout(timeout, pending).await {
            Ok(Ok(provider)) => Ok(Arc::clone(provider)),
            Ok(Err(e)) => Err(unavailable(e.to_string())),
            Err(_) => Err(unavailable("initialisation timed out".into())),
        }
    }
}

impl<P: PageTextProvider> fmt::Debug for ProviderHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Join one page's tokens: trimmed, empty ones dropped, single spaces between.
pub fn join_page_tokens(tokens: &[PageToken]) -> String {
    tokens
        .iter()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the text of every page, in page order.
///
/// Each page contributes its joined tokens followed by `\n`, so a two-page
/// document with tokens `["Jane", "Doe"]` and `["Engineer"]` yields
/// `"Jane Doe\nEngineer\n"`.
///
/// # Errors
/// - [`ExtractError::Provider`] when the document or a page cannot be read
/// - [`ExtractError::EmptyExtraction`] when no page produced any text
pub fn extract_primary<P: PageTextProvider>(
    provider: &P,
    bytes: &[u8],
    observer: Option<&dyn ExtractionObserver>,
) -> Result<String, ExtractError> {
    let doc = provider.load(bytes)?;
    let total_pages = provider.page_count(&doc);
    info!("Document loaded: {} pages", total_pages);

    let mut text = String::new();
    for page_num in 1..=total_pages {
        let tokens = provider.page_tokens(&doc, page_num)?;
        let page_text = join_page_tokens(&tokens);
        debug!(
            "Page {}: {} tokens, {} chars",
            page_num,
            tokens.len(),
            page_text.len()
        );
        if let Some(obs) = observer {
            obs.on_page_extracted(page_num, total_pages, page_text.chars().count());
        }
        text.push_str(&page_text);
        text.push('\n');
    }

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyExtraction);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pages of plain string tokens; `load` fails on empty bytes.
    #[derive(Debug)]
    struct VecProvider(Vec<Vec<&'static str>>);

    impl PageTextProvider for VecProvider {
        type Document<'a> = &'a [Vec<&'static str>];

        fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, ProviderError> {
            if bytes.is_empty() {
                return Err(ProviderError::Load("empty input".into()));
            }
            Ok(self.0.as_slice())
        }

        fn page_count(&self, doc: &Self::Document<'_>) -> usize {
            doc.len()
        }

        fn page_tokens(
            &self,
            doc: &Self::Document<'_>,
            page_num: usize,
        ) -> Result<Vec<PageToken>, ProviderError> {
            Ok(doc[page_num - 1]
                .iter()
                .map(|s| PageToken::new(page_num, *s))
                .collect())
        }
    }

    #[test]
    fn test_pages_joined_in_order() {
        let p = VecProvider(vec![vec!["Jane", "Doe"], vec!["Engineer"]]);
        assert_eq!(extract_primary(&p, b"%PDF", None).unwrap(), "Jane Doe\nEngineer\n");
    }

    #[test]
    fn test_blank_tokens_dropped_and_trimmed() {
        let p = VecProvider(vec![vec!["  Rust ", "", "   ", "\tdev"]]);
        assert_eq!(extract_primary(&p, b"%PDF", None).unwrap(), "Rust dev\n");
    }

    #[test]
    fn test_blank_page_keeps_its_newline() {
        let p = VecProvider(vec![vec!["one"], vec![" "], vec!["three"]]);
        assert_eq!(extract_primary(&p, b"%PDF", None).unwrap(), "one\n\nthree\n");
    }

    #[test]
    fn test_no_text_is_empty_extraction() {
        let p = VecProvider(vec![vec![" "], vec![]]);
        assert!(matches!(
            extract_primary(&p, b"%PDF", None),
            Err(ExtractError::EmptyExtraction)
        ));
        let p = VecProvider(vec![]);
        assert!(matches!(
            extract_primary(&p, b"%PDF", None),
            Err(ExtractError::EmptyExtraction)
        ));
    }

    #[test]
    fn test_load_failure_propagates() {
        let p = VecProvider(vec![vec!["x"]]);
        assert!(matches!(
            extract_primary(&p, b"", None),
            Err(ExtractError::Provider(ProviderError::Load(_)))
        ));
    }

    #[tokio::test]
    async fn test_ready_handle_acquires_immediately() {
        let handle = ProviderHandle::ready(VecProvider(vec![]));
        assert!(handle.is_initialized());
        assert!(handle.acquire(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_lazy_handle_initialises_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = ProviderHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(VecProvider(vec![vec!["x"]]))
        });
        assert!(!handle.is_initialized());
        handle.acquire(Duration::from_secs(5)).await.unwrap();
        handle.acquire(Duration::from_secs(5)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_initialiser_times_out_then_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = ProviderHandle::lazy(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok(VecProvider(vec![]))
        });

        let err = handle.acquire(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, ExtractError::ProviderUnavailable { timeout_ms: 20, .. }));
        assert!(!handle.is_initialized());

        handle.acquire(Duration::from_secs(5)).await.unwrap();
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_failing_initialiser_is_unavailable() {
        let handle: ProviderHandle<VecProvider> =
            ProviderHandle::lazy(|| Err(ProviderError::Init("libpdfium.so not found".into())));
        let err = handle.acquire(Duration::from_secs(1)).await.unwrap_err();
        assert!(err.to_string().contains("libpdfium.so not found"));
        assert!(err.is_retryable());
    }
}
