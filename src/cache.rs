//! Caller-owned cache of extracted text.
//!
//! Extraction itself never caches: every [`crate::Extractor::extract`] call
//! starts from the bytes it is given. Callers that see the same upload many
//! times (a form re-submitted, a retry after a network error) can keep a
//! [`TextCache`] next to their extractor. Entries are keyed by name, length
//! and a SHA-256 of the content, so a changed file under the same name is a
//! different key. Nothing expires on its own.

use crate::document::{RawDocument, SanitizedText};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Identity of one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    name: String,
    len: usize,
    digest: [u8; 32],
}

impl DocumentKey {
    pub fn of(doc: &RawDocument) -> Self {
        Self::from_parts(doc.name(), doc.bytes())
    }

    pub fn from_parts(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            len: bytes.len(),
            digest: Sha256::digest(bytes).into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes, sha256:", self.name, self.len)?;
        for b in &self.digest[..6] {
            write!(f, "{b:02x}")?;
        }
        f.write_str("…)")
    }
}

/// Map from [`DocumentKey`] to the text extracted for it.
#[derive(Debug, Default)]
pub struct TextCache {
    entries: HashMap<DocumentKey, SanitizedText>,
}

impl TextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&SanitizedText> {
        self.entries.get(key)
    }

    /// Cached text for `doc`, if any.
    pub fn get_document(&self, doc: &RawDocument) -> Option<&SanitizedText> {
        self.get(&DocumentKey::of(doc))
    }

    /// Store `text`, returning the previous entry for the key.
    pub fn insert(&mut self, key: DocumentKey, text: SanitizedText) -> Option<SanitizedText> {
        debug!("Caching text for {}", key);
        self.entries.insert(key, text)
    }

    pub fn invalidate(&mut self, key: &DocumentKey) -> Option<SanitizedText> {
        self.entries.remove(key)
    }

    /// Drop every entry whose document had this name.
    pub fn invalidate_name(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.name != name);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
