//! Result types returned by the pipeline.

use crate::error::{AssetError, CleanupWarning};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one [`crate::pipeline::assemble::DocumentAssembler::assemble`] call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyReport {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Images found by the collector.
    pub total_images: usize,
    /// Pages written to the document.
    pub pages_written: usize,
    /// Images that were dropped, in collection order.
    pub skipped: Vec<AssetError>,
    /// Temp files that could not be removed.
    pub cleanup_warnings: Vec<CleanupWarning>,
    /// Bytes written to `output_path`.
    pub bytes_written: u64,
}

/// Summary of a completed [`crate::convert::Pipeline::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub album_id: String,
    pub title: String,
    pub output_path: PathBuf,
    pub total_images: usize,
    pub pages_written: usize,
    pub skipped: Vec<AssetError>,
    /// Warnings from both temp-file and source-directory cleanup.
    pub cleanup_warnings: Vec<CleanupWarning>,
    pub fetch_duration_ms: u64,
    pub assembly_duration_ms: u64,
    pub total_duration_ms: u64,
}
