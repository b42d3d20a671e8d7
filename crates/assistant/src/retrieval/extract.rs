//! Plain-text extraction for uploaded knowledge-base files.

use std::path::Path;

use super::error::IngestionError;

/// File types accepted for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Markdown,
}

impl DocumentKind {
    /// Accepted extensions, lower-case.
    pub const EXTENSIONS: [&'static str; 3] = ["pdf", "txt", "md"];

    /// Detect the kind from a filename's extension, case-insensitively.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Extract UTF-8 text from file bytes.
///
/// PDF extraction is CPU-bound; async callers should run this on a blocking
/// thread.
///
/// # Errors
///
/// Returns [`IngestionError::Extraction`] if the PDF cannot be parsed or a
/// text file is not valid UTF-8.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, IngestionError> {
    match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| IngestionError::Extraction(format!("PDF extraction failed: {e}"))),
        DocumentKind::PlainText | DocumentKind::Markdown => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| IngestionError::Extraction(format!("file is not UTF-8: {e}"))),
    }
}

/// Reduce a client-supplied filename to its final path component.
///
/// Returns `None` for names with no usable component (empty, `..`, `/`).
#[must_use]
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(DocumentKind::from_filename("guide.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("notes.txt"), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_filename("README.md"), Some(DocumentKind::Markdown));
        assert_eq!(DocumentKind::from_filename("sheet.xlsx"), None);
        assert_eq!(DocumentKind::from_filename("pdf"), None);
    }

    #[test]
    fn test_extract_plain_text() {
        let text = extract_text(DocumentKind::Markdown, "# Lead time\n\nDays.".as_bytes())
            .expect("utf-8");
        assert_eq!(text, "# Lead time\n\nDays.");
    }

    #[test]
    fn test_extract_rejects_invalid_utf8() {
        assert!(matches!(
            extract_text(DocumentKind::PlainText, &[0xff, 0xfe, 0x00]),
            Err(IngestionError::Extraction(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("guide.pdf").as_deref(), Some("guide.pdf"));
        assert_eq!(
            sanitize_filename("../../etc/passwd.txt").as_deref(),
            Some("passwd.txt")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\stock.md").as_deref(),
            Some("stock.md")
        );
        assert_eq!(sanitize_filename("uploads/"), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
    }
}
