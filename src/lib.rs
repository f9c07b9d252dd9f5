//! # album2pdf
//!
//! Download a comic album by its numeric id and bind its images into a
//! single PDF, one A4 page per image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! album id
//!  │
//!  ├─ 1. Validate  ASCII digits only, checked before any I/O
//!  ├─ 2. Fetch     external downloader (jmcomic) → local album directory
//!  ├─ 3. Collect   recursive walk, natural sort (1, 2, 10 rather than 1, 10, 2)
//!  ├─ 4. Assemble  per image: decode → RGB → fit on A4 → append page
//!  ├─ 5. Write     temp file beside the target, then move into place
//!  └─ 6. Clean up  source directory and temp files, success or not
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use album2pdf::{AppConfig, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::builder().output_dir("./PDF").build()?;
//!     let report = Pipeline::new(config).run("422866").await?;
//!     println!("{} pages → {}", report.pages_written, report.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom album sources
//!
//! Fetching is behind the [`AlbumSource`] trait. The default
//! [`CommandAlbumSource`] runs the downloader program named in
//! [`FetcherConfig`]; tests and embedders can supply their own with
//! [`Pipeline::with_source`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `album2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! album2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AppConfig, AppConfigBuilder, FetcherConfig};
pub use convert::{convert, convert_sync, Pipeline, PipelineState};
pub use error::{Album2PdfError, AssetError, CleanupWarning};
pub use output::{AssemblyReport, PipelineReport};
pub use pipeline::fetch::{AlbumRequest, AlbumSource, CommandAlbumSource, DownloadResult, FetchedAlbum};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
