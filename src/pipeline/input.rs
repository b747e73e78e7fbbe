//! Input loading: turn a path on disk into a [`RawDocument`].
//!
//! This is the calling layer's job in an upload flow (the browser enforces
//! the size limit and supplies the MIME type); the CLI and `extract_file`
//! need the same checks, so they live here. The size ceiling is checked
//! against file metadata before any bytes are read.

use crate::document::{MediaType, RawDocument};
use crate::error::ExtractError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Whether `bytes` begin with the PDF signature.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Decide the media type: an explicit declaration wins, then the extension,
/// then the `%PDF` signature. Anything else is `Other`.
pub fn detect_media_type(path: &Path, declared: Option<MediaType>, bytes: &[u8]) -> MediaType {
    if let Some(media_type) = declared {
        return media_type;
    }
    if let Some(media_type) = MediaType::from_path(path) {
        if media_type == MediaType::Pdf && !has_pdf_magic(bytes) {
            // Handed on anyway: the fallback decoder may still recover text.
            warn!(
                "'{}' has a .pdf extension but no %PDF signature",
                path.display()
            );
        }
        return media_type;
    }
    if has_pdf_magic(bytes) {
        return MediaType::Pdf;
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_ascii_lowercase();
    MediaType::Other(format!("application/x-{ext}"))
}

/// Read `path` into a [`RawDocument`], refusing files above `max_bytes`.
pub async fn load_document(
    path: impl AsRef<Path>,
    declared: Option<MediaType>,
    max_bytes: u64,
) -> Result<RawDocument, ExtractError> {
    let path = path.as_ref().to_path_buf();

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| io_error(&path, e))?;
    if !metadata.is_file() {
        return Err(ExtractError::FileNotFound { path });
    }
    if metadata.len() > max_bytes {
        return Err(ExtractError::FileTooLarge {
            path,
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| io_error(&path, e))?;
    let media_type = detect_media_type(&path, declared, &bytes);
    debug!(
        "Loaded '{}': {} bytes, {}",
        path.display(),
        bytes.len(),
        media_type
    );

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(RawDocument::new(bytes, media_type, name))
}

fn io_error(path: &Path, e: std::io::Error) -> ExtractError {
    let path: PathBuf = path.to_path_buf();
    match e.kind() {
        ErrorKind::PermissionDenied => ExtractError::PermissionDenied { path },
        ErrorKind::NotFound => ExtractError::FileNotFound { path },
        _ => ExtractError::Internal(format!("reading '{}': {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents).unwrap();
        f
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_path(Path::new("cv.PDF")), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_path(Path::new("notes.txt")), Some(MediaType::PlainText));
        assert_eq!(MediaType::from_path(Path::new("photo.png")), None);
        assert_eq!(MediaType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_declared_media_type_wins() {
        let mt = detect_media_type(Path::new("cv.pdf"), Some(MediaType::PlainText), b"%PDF-1.7");
        assert_eq!(mt, MediaType::PlainText);
    }

    #[test]
    fn test_magic_sniffed_without_extension() {
        assert_eq!(detect_media_type(Path::new("upload"), None, b"%PDF-1.4\n"), MediaType::Pdf);
        assert_eq!(
            detect_media_type(Path::new("photo.png"), None, b"\x89PNG"),
            MediaType::Other("application/x-png".into())
        );
    }

    #[test]
    fn test_markdown_loads_as_plain_text() {
        let f = temp_file(".md", b"# Jane Doe");
        let doc = tokio_test::block_on(load_document(f.path(), None, 1024));
        let doc = tokio_test::assert_ok!(doc);
        assert_eq!(doc.media_type(), &MediaType::PlainText);
    }

    #[tokio::test]
    async fn test_load_plain_text() {
        let f = temp_file(".txt", b"hello");
        let doc = load_document(f.path(), None, 1024).await.unwrap();
        assert_eq!(doc.bytes(), b"hello");
        assert_eq!(doc.media_type(), &MediaType::PlainText);
        assert!(doc.name().ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_load_refuses_oversized_file() {
        let f = temp_file(".pdf", &[b'x'; 64]);
        let err = load_document(f.path(), None, 63).await.unwrap_err();
        assert!(matches!(err, ExtractError::FileTooLarge { size: 64, limit: 63, .. }));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_document("/definitely/not/here.pdf", None, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path(), None, 1024).await.unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }
}
