//! Album conversion entry points and the pipeline state machine.
//!
//! ```text
//! Idle ──▶ Fetching ──▶ Assembling ──▶ CleaningUp ──▶ Done
//!   │          │                           │
//!   └──────────┴──────────▶ Failed ◀───────┘ (assembly error)
//! ```
//!
//! Once assembly has started the fetched album directory is removed no
//! matter how assembly ends. A failed fetch leaves nothing to clean up.

use crate::config::AppConfig;
use crate::error::{Album2PdfError, CleanupWarning};
use crate::output::{AssemblyReport, PipelineReport};
use crate::pipeline::assemble::{AssemblerOptions, DocumentAssembler};
use crate::pipeline::collect::collect;
use crate::pipeline::fetch::{AlbumFetcher, AlbumRequest, AlbumSource, CommandAlbumSource};
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Characters kept in a derived file name; everything else is dropped.
static RE_UNSAFE_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 _-]").unwrap());

/// Where a [`Pipeline`] run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Fetching,
    Assembling,
    CleaningUp,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Fetching => "fetching",
            PipelineState::Assembling => "assembling",
            PipelineState::CleaningUp => "cleaning-up",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Fetch → assemble → clean up, for one album at a time.
pub struct Pipeline {
    config: AppConfig,
    fetcher: AlbumFetcher,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// A pipeline that fetches through the configured downloader program.
    pub fn new(config: AppConfig) -> Self {
        let source: Arc<dyn AlbumSource> = Arc::new(CommandAlbumSource::new(&config));
        Self::with_source(config, source)
    }

    /// A pipeline that fetches through a caller-supplied [`AlbumSource`].
    pub fn with_source(config: AppConfig, source: Arc<dyn AlbumSource>) -> Self {
        Self {
            config,
            fetcher: AlbumFetcher::new(source),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Convert album `raw_id` into `outputDirectory/<name>.pdf`.
    ///
    /// # Errors
    /// Any fatal [`Album2PdfError`]. Skipped images and failed deletions are
    /// not errors; they are listed in the returned report.
    pub async fn run(&self, raw_id: &str) -> Result<PipelineReport, Album2PdfError> {
        let total_start = Instant::now();
        let mut state = PipelineState::Idle;

        // ── Step 1: Validate (no I/O before this succeeds) ───────────────
        let request = match AlbumRequest::parse(raw_id) {
            Ok(r) => r,
            Err(e) => {
                self.advance(&mut state, PipelineState::Failed);
                return Err(e);
            }
        };

        // ── Step 2: Fetch ────────────────────────────────────────────────
        self.advance(&mut state, PipelineState::Fetching);
        let fetch_start = Instant::now();
        let download = match self.prepare_and_fetch(&request).await {
            Ok(d) => d,
            Err(e) => {
                warn!("Fetch of album {} failed: {}", request, e);
                self.advance(&mut state, PipelineState::Failed);
                return Err(e);
            }
        };
        let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

        // ── Step 3: Assemble ─────────────────────────────────────────────
        self.advance(&mut state, PipelineState::Assembling);
        let assembly_start = Instant::now();
        let stem = output_stem(&download.title, &request);
        let target = derive_output_path(&self.config.output_directory, &stem, request.id());
        info!("Output file: {}", target.display());
        let assembled = self
            .assemble(download.local_directory.clone(), target, download.title.clone())
            .await;
        let assembly_duration_ms = assembly_start.elapsed().as_millis() as u64;

        // ── Step 4: Clean up, whatever happened above ────────────────────
        self.advance(&mut state, PipelineState::CleaningUp);
        let source_warning = remove_source_dir(&download.local_directory);

        let mut report = match assembled {
            Ok(r) => r,
            Err(e) => {
                warn!("Assembly of album {} failed: {}", request, e);
                self.advance(&mut state, PipelineState::Failed);
                return Err(e);
            }
        };
        report.cleanup_warnings.extend(source_warning);

        self.advance(&mut state, PipelineState::Done);
        let total_duration_ms = total_start.elapsed().as_millis() as u64;
        info!(
            "Album {} → {} ({} pages, {} skipped) in {}ms",
            request,
            report.output_path.display(),
            report.pages_written,
            report.skipped.len(),
            total_duration_ms
        );

        Ok(PipelineReport {
            album_id: request.id().to_string(),
            title: download.title,
            output_path: report.output_path,
            total_images: report.total_images,
            pages_written: report.pages_written,
            skipped: report.skipped,
            cleanup_warnings: report.cleanup_warnings,
            fetch_duration_ms,
            assembly_duration_ms,
            total_duration_ms,
        })
    }

    async fn prepare_and_fetch(
        &self,
        request: &AlbumRequest,
    ) -> Result<crate::pipeline::fetch::DownloadResult, Album2PdfError> {
        let out_dir = &self.config.output_directory;
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| Album2PdfError::OutputWriteFailed {
                path: out_dir.clone(),
                source: e,
            })?;
        self.fetcher.fetch(request, &self.config).await
    }

    /// Collect and assemble on the blocking pool, inside a per-run scratch dir.
    async fn assemble(
        &self,
        source_dir: PathBuf,
        target: PathBuf,
        title: String,
    ) -> Result<AssemblyReport, Album2PdfError> {
        let scratch_root = self
            .config
            .scratch_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&scratch_root).map_err(|e| {
            Album2PdfError::Internal(format!(
                "cannot create scratch directory {}: {e}",
                scratch_root.display()
            ))
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("album2pdf-")
            .tempdir_in(&scratch_root)
            .map_err(|e| {
                Album2PdfError::Internal(format!(
                    "cannot create scratch directory in {}: {e}",
                    scratch_root.display()
                ))
            })?;
        debug!("Scratch directory: {}", scratch.path().display());

        let assembler = DocumentAssembler::new(AssemblerOptions {
            scratch_dir: scratch.path().to_path_buf(),
            jpeg_quality: self.config.jpeg_quality,
            title: Some(title),
        })
        .with_progress(self.progress.clone());

        let joined = tokio::task::spawn_blocking(move || {
            let assets = collect(&source_dir)?;
            assembler.assemble(&assets, &target)
        })
        .await;

        let scratch_path = scratch.path().to_path_buf();
        let scratch_warning = scratch.close().err().map(|e| {
            warn!("Could not remove scratch directory {}: {}", scratch_path.display(), e);
            CleanupWarning {
                path: scratch_path,
                detail: e.to_string(),
            }
        });

        let mut report = joined
            .map_err(|e| Album2PdfError::Internal(format!("assembly task failed: {e}")))??;
        report.cleanup_warnings.extend(scratch_warning);
        Ok(report)
    }

    fn advance(&self, state: &mut PipelineState, next: PipelineState) {
        info!("Pipeline: {} → {}", state, next);
        *state = next;
        if let Some(ref cb) = self.progress {
            cb.on_state_change(next);
        }
    }
}

/// Convert one album with the default downloader.
///
/// Shorthand for `Pipeline::new(config.clone()).run(album_id)`.
pub async fn convert(
    album_id: impl AsRef<str>,
    config: &AppConfig,
) -> Result<PipelineReport, Album2PdfError> {
    Pipeline::new(config.clone()).run(album_id.as_ref()).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    album_id: impl AsRef<str>,
    config: &AppConfig,
) -> Result<PipelineReport, Album2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Album2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(album_id, config))
}

/// File-name stem for an album: the title restricted to `[A-Za-z0-9 _-]`,
/// or `JM<id>` when nothing usable is left.
pub fn output_stem(title: &str, request: &AlbumRequest) -> String {
    let cleaned = RE_UNSAFE_NAME_CHARS.replace_all(title, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        request.synthesized_name()
    } else {
        cleaned.to_string()
    }
}

/// First free path among `<stem>.pdf`, `<stem>_<id>.pdf`, `<stem>_<id>_2.pdf`, …
pub fn derive_output_path(dir: &Path, stem: &str, id: &str) -> PathBuf {
    let plain = dir.join(format!("{stem}.pdf"));
    if !plain.exists() {
        return plain;
    }
    let with_id = dir.join(format!("{stem}_{id}.pdf"));
    if !with_id.exists() {
        return with_id;
    }
    let mut n: u32 = 2;
    loop {
        let candidate = dir.join(format!("{stem}_{id}_{n}.pdf"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn remove_source_dir(dir: &Path) -> Option<CleanupWarning> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("Removed source directory {}", dir.display());
            None
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Could not remove source directory {}: {}", dir.display(), e);
            Some(CleanupWarning {
                path: dir.to_path_buf(),
                detail: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn req(id: &str) -> AlbumRequest {
        AlbumRequest::parse(id).unwrap()
    }

    #[test]
    fn stem_keeps_safe_characters() {
        assert_eq!(output_stem("My Album_01-x", &req("1")), "My Album_01-x");
        assert_eq!(output_stem("  [Circle] Title!  ", &req("1")), "Circle Title");
    }

    #[test]
    fn stem_falls_back_to_synthesized_name() {
        assert_eq!(output_stem("漫画のタイトル", &req("422866")), "JM422866");
        assert_eq!(output_stem("   ", &req("7")), "JM7");
        assert_eq!(output_stem("", &req("7")), "JM7");
    }

    #[test]
    fn free_name_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            derive_output_path(dir.path(), "Foo", "12345"),
            dir.path().join("Foo.pdf")
        );
    }

    #[test]
    fn existing_name_gets_id_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Foo.pdf"), b"x").unwrap();
        assert_eq!(
            derive_output_path(dir.path(), "Foo", "12345"),
            dir.path().join("Foo_12345.pdf")
        );
    }

    #[test]
    fn counter_suffix_after_id_suffix() {
        let dir = TempDir::new().unwrap();
        for n in ["Foo.pdf", "Foo_12345.pdf", "Foo_12345_2.pdf"] {
            std::fs::write(dir.path().join(n), b"x").unwrap();
        }
        assert_eq!(
            derive_output_path(dir.path(), "Foo", "12345"),
            dir.path().join("Foo_12345_3.pdf")
        );
    }

    #[test]
    fn remove_missing_source_is_silent() {
        let dir = TempDir::new().unwrap();
        assert!(remove_source_dir(&dir.path().join("gone")).is_none());
    }

    #[test]
    fn remove_source_deletes_tree() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("JM1").join("1");
        std::fs::create_dir_all(&album).unwrap();
        std::fs::write(album.join("1.jpg"), b"x").unwrap();
        assert!(remove_source_dir(&dir.path().join("JM1")).is_none());
        assert!(!dir.path().join("JM1").exists());
    }

    #[test]
    fn state_display() {
        assert_eq!(PipelineState::CleaningUp.to_string(), "cleaning-up");
        assert_eq!(PipelineState::Done.to_string(), "done");
    }
}
