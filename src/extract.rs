// src/extract.rs

use crate::config::{ExtractBackend, ExtractionSection};
use crate::error::ExtractError;
use lopdf::Document;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Text of the PDF at `path`, using the configured backend.
pub fn extract_text(path: &Path, config: &ExtractionSection) -> Result<String, ExtractError> {
    match config.backend {
        ExtractBackend::Pdftotext => run_pdftotext(path, &config.pdftotext_bin),
        ExtractBackend::PdfExtract => {
            let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            extract_in_process(&bytes, config.min_text_chars)
        }
    }
}

/// `pdftotext -layout <path> -`. Column positions survive, which the
/// header scan depends on.
///
/// A non-zero exit is tolerated as long as something was printed.
pub fn run_pdftotext(path: &Path, bin: &str) -> Result<String, ExtractError> {
    debug!(bin, path = %path.display(), "Running pdftotext");
    let output = Command::new(bin)
        .arg("-layout")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|source| ExtractError::Spawn {
            tool: bin.to_string(),
            source,
        })?;

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if text.trim().is_empty() {
        return Err(ExtractError::NoText {
            tool: bin.to_string(),
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    if !output.status.success() {
        warn!(
            status = %output.status,
            stderr = %stderr.trim(),
            "pdftotext exited with an error but produced text"
        );
    }

    info!(chars = text.len(), "Extracted text from PDF");
    Ok(text)
}

/// In-process extraction with `lopdf` + `pdf-extract`. Reading order is
/// kept but column spacing is not.
pub fn extract_in_process(pdf_bytes: &[u8], min_text_chars: usize) -> Result<String, ExtractError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    if looks_like_scanned(&doc) {
        info!("PDF structural check: likely scanned / image-only");
        return Err(ExtractError::Scanned);
    }

    let text = pdf_extract::extract_text_from_mem(pdf_bytes).map_err(|e| {
        warn!(error = %e, "pdf-extract failed");
        ExtractError::Pdf(e.to_string())
    })?;

    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < min_text_chars {
        info!(chars = meaningful, "Extracted text too short, treating as scanned");
        return Err(ExtractError::Scanned);
    }

    info!(chars = meaningful, "Text extracted successfully");
    Ok(text)
}

/// A page with image XObjects but no fonts is a scanned page. The document
/// counts as scanned when at least 80% of its pages are.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false;
    }

    let resource = |page: &lopdf::Dictionary, key: &[u8]| -> bool {
        page.get(b"Resources")
            .ok()
            .and_then(|r| doc.dereference(r).ok())
            .and_then(|(_, resolved)| resolved.as_dict().ok())
            .and_then(|res| res.get(key).ok())
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, resolved)| resolved.as_dict().ok())
            .is_some_and(|dict| !dict.is_empty())
    };

    let image_only_pages = pages
        .values()
        .filter_map(|id| doc.get_object(*id).ok())
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|page| resource(page, b"XObject") && !resource(page, b"Font"))
        .count();

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    ratio >= 0.8
}

/// Hex SHA-256 of the extracted text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_garbage_bytes() {
        let result = extract_in_process(b"this is not a pdf", 30);
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn test_missing_binary() {
        let result = run_pdftotext(Path::new("doc.pdf"), "/nonexistent/pdftotext-bin");
        assert!(matches!(result, Err(ExtractError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_tool_is_no_text() {
        // `true` and `false` ignore their arguments and print nothing.
        for bin in ["true", "false"] {
            let result = run_pdftotext(Path::new("doc.pdf"), bin);
            assert!(matches!(result, Err(ExtractError::NoText { .. })), "{bin}");
        }
    }

    #[test]
    fn test_in_process_backend_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-garbage").unwrap();
        let config = ExtractionSection {
            backend: ExtractBackend::PdfExtract,
            ..ExtractionSection::default()
        };
        let result = extract_text(file.path(), &config);
        assert!(matches!(result, Err(ExtractError::Pdf(_))));

        let missing = extract_text(Path::new("/nonexistent/doc.pdf"), &config);
        assert!(matches!(missing, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
