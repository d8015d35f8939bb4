use crate::shipment::ParserOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::info;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SHIPMENT_PARSER_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub parser: ParserOptions,
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractBackend {
    /// poppler's `pdftotext -layout`
    #[default]
    Pdftotext,
    /// lopdf + pdf-extract, no external binary
    PdfExtract,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSection {
    #[serde(default)]
    pub backend: ExtractBackend,
    #[serde(default = "default_pdftotext_bin")]
    pub pdftotext_bin: String,
    /// Fewer non-whitespace characters than this means a scanned PDF.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

fn default_pdftotext_bin() -> String {
    "pdftotext".to_string()
}

fn default_min_text_chars() -> usize {
    30
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            backend: ExtractBackend::default(),
            pdftotext_bin: default_pdftotext_bin(),
            min_text_chars: default_min_text_chars(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`Config::load`], but a missing file gives the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self {
                log_filter: default_log_filter(),
                ..Self::default()
            });
        }
        info!(path = %path.display(), "Loading config");
        Self::load(path)
    }
}

/// `$SHIPMENT_PARSER_CONFIG`, else `.config/shipment_parser.toml` in the crate root.
pub fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join(".config/shipment_parser.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.extraction.backend, ExtractBackend::Pdftotext);
        assert_eq!(cfg.extraction.pdftotext_bin, "pdftotext");
        assert_eq!(cfg.extraction.min_text_chars, 30);
        assert_eq!(cfg.parser, ParserOptions::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[extraction]
backend = "pdf_extract"

[parser]
vendor_suffixes = ["Hoyer GmbH", "Bertschi AG"]
"#
        )
        .unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.extraction.backend, ExtractBackend::PdfExtract);
        assert_eq!(cfg.extraction.min_text_chars, 30);
        assert_eq!(cfg.parser.column_gap, 2);
        assert_eq!(cfg.parser.vendor_suffixes.len(), 2);
    }

    #[test]
    fn test_bad_backend_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[extraction]\nbackend = \"ocr\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
