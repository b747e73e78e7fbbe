//! pdfium-backed [`PageTextProvider`].
//!
//! pdfium's text layer handles the things a regex never will: font encodings,
//! ToUnicode maps, compressed content streams and page trees. The provider
//! loads a document from memory and returns each page's text split into
//! lines, which become the page's tokens.
//!
//! Binding to the shared library is the slow part (it may sit on a network
//! filesystem or be pulled in by the dynamic loader on first use), so it is
//! done once per [`ProviderHandle`] on the blocking pool rather than at
//! process start.

use crate::document::PageToken;
use crate::error::ProviderError;
use crate::pipeline::primary::{PageTextProvider, ProviderHandle};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an existing pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Page text provider backed by a bound pdfium library.
pub struct PdfiumProvider {
    pdfium: Pdfium,
}

impl PdfiumProvider {
    /// Bind pdfium.
    ///
    /// Resolution order: `library` if given, then `PDFIUM_LIB_PATH`, then the
    /// system library search path.
    pub fn bind(library: Option<&Path>) -> Result<Self, ProviderError> {
        let from_env = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from);
        let path = library.map(Path::to_path_buf).or(from_env);

        let bindings = match path {
            Some(ref p) => {
                info!("Binding pdfium from {}", p.display());
                Pdfium::bind_to_library(p)
            }
            None => {
                info!("Binding system pdfium library");
                Pdfium::bind_to_system_library()
            }
        }
        .map_err(|e| ProviderError::Init(format!("{:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// A handle that binds pdfium on first use.
    pub fn lazy_handle(library: Option<PathBuf>) -> ProviderHandle<Self> {
        ProviderHandle::lazy(move || Self::bind(library.as_deref()))
    }
}

impl PageTextProvider for PdfiumProvider {
    type Document<'a> = PdfDocument<'a>;

    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, ProviderError> {
        self.pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("Password") || detail.contains("password") {
                ProviderError::Load(format!("document is password protected ({detail})"))
            } else {
                ProviderError::Load(detail)
            }
        })
    }

    fn page_count(&self, doc: &Self::Document<'_>) -> usize {
        doc.pages().len() as usize
    }

    fn page_tokens(
        &self,
        doc: &Self::Document<'_>,
        page_num: usize,
    ) -> Result<Vec<PageToken>, ProviderError> {
        let page_err = |detail: String| ProviderError::Page {
            page: page_num,
            detail,
        };

        let index = u16::try_from(page_num.saturating_sub(1))
            .map_err(|_| page_err("page index exceeds pdfium's range".into()))?;
        let page = doc
            .pages()
            .get(index)
            .map_err(|e| page_err(format!("{:?}", e)))?;
        let text = page.text().map_err(|e| page_err(format!("{:?}", e)))?;

        let tokens: Vec<PageToken> = text
            .all()
            .lines()
            .map(|line| PageToken::new(page_num, line))
            .collect();
        debug!("pdfium page {} → {} lines", page_num, tokens.len());
        Ok(tokens)
    }
}
