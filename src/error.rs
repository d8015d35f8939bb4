// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a document produced no text to parse.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not run {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} produced no text (status {status}): {stderr}")]
    NoText {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    #[error("PDF is scanned / image-only")]
    Scanned,
}
