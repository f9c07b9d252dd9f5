//! Error types for the album2pdf library.
//!
//! Three tiers reflect three distinct failure modes:
//!
//! * [`Album2PdfError`]: **Fatal**: the pipeline cannot produce a document
//!   (malformed id, fetch failure, unwritable output). Returned as
//!   `Err(Album2PdfError)` from [`crate::convert::Pipeline::run`].
//!
//! * [`AssetError`]: **Non-fatal**: a single image could not be probed,
//!   decoded or re-encoded. The page is skipped and the error is stored in
//!   [`crate::output::AssemblyReport`]; only when *every* image fails does
//!   assembly escalate to [`Album2PdfError::EmptyDocument`].
//!
//! * [`CleanupWarning`]: **Informational**: removing the fetched source
//!   directory or a temp file failed. Logged and reported, never escalated.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the album2pdf library.
#[derive(Debug, Error)]
pub enum Album2PdfError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The album id is empty, contains non-digits, or is zero.
    #[error("Invalid album id '{input}': expected a positive decimal number such as 422866")]
    InvalidAlbumId { input: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The external downloader failed after its own retry budget.
    #[error("Failed to fetch album {id}: {reason}")]
    FetchFailed { id: String, reason: String },

    /// The external downloader did not finish in time.
    #[error("Fetching album {id} timed out after {secs}s\nIncrease fetcher.timeoutSecs or --fetch-timeout.")]
    FetchTimeout { id: String, secs: u64 },

    /// The fetch reported success but no result directory exists on disk.
    #[error("Album {id} was fetched but no result directory was found under '{base_dir}' (tried: {tried})")]
    ResultNotFound {
        id: String,
        base_dir: PathBuf,
        tried: String,
    },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// The directory handed to the collector does not exist or is unreadable.
    #[error("Image directory '{path}' cannot be read: {detail}")]
    SourceDirectoryMissing { path: PathBuf, detail: String },

    /// Every image failed (or none were found); there is nothing to write.
    #[error("No pages could be placed: {total} image(s) found, all failed.\nFirst error: {first_error}")]
    EmptyDocument { total: usize, first_error: String },

    /// Serialising the PDF structure failed.
    #[error("Failed to serialise PDF for '{path}': {detail}")]
    PdfWriteFailed { path: PathBuf, detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file exists but could not be read or parsed.
    #[error("Failed to load configuration '{path}': {detail}")]
    ConfigLoad { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Album2PdfError {
    /// True for errors raised while the album was being retrieved.
    pub fn is_fetch_stage(&self) -> bool {
        matches!(
            self,
            Album2PdfError::FetchFailed { .. }
                | Album2PdfError::FetchTimeout { .. }
                | Album2PdfError::ResultNotFound { .. }
        )
    }
}

/// A non-fatal error for a single image.
///
/// Stored in [`crate::output::AssemblyReport::skipped`] when an image is
/// dropped from the document. Assembly continues with the next image.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetError {
    /// The header could not be read (unknown format, truncated file).
    #[error("{path}: cannot read image header: {detail}")]
    Probe { path: PathBuf, detail: String },

    /// Pixel data could not be decoded.
    #[error("{path}: decode failed: {detail}")]
    Decode { path: PathBuf, detail: String },

    /// The normalised raster could not be re-encoded for embedding.
    #[error("{path}: re-encode failed: {detail}")]
    Encode { path: PathBuf, detail: String },
}

impl AssetError {
    /// The image this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            AssetError::Probe { path, .. }
            | AssetError::Decode { path, .. }
            | AssetError::Encode { path, .. } => path,
        }
    }
}

/// A failed best-effort deletion.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("could not remove '{path}': {detail}")]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub detail: String,
}
