//! Pipeline stages for document text extraction.
//!
//! Each submodule implements exactly one step; the orchestrator in
//! [`crate::extract`] decides which steps run and in what order.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ primary ──▶ classify ──┬──▶ sanitize
//! (bytes)   (provider)  (verdict)  │
//!                                  └──▶ decode ──▶ classify ──▶ sanitize
//!                                     (fallback)
//! ```
//!
//! 1. [`input`]: load a file into a [`crate::RawDocument`], enforce the
//!    size ceiling, work out the media type
//! 2. [`primary`]: drive a [`primary::PageTextProvider`] page by page
//! 3. [`pdfium`]: the production provider, backed by pdfium
//! 4. [`classify`]: reject leaked PDF syntax and binary garbage
//! 5. [`decode`]: multi-encoding recovery when the provider fails
//! 6. [`sanitize`]: flatten and normalise accepted text

pub mod classify;
pub mod decode;
pub mod input;
pub mod pdfium;
pub mod primary;
pub mod sanitize;
