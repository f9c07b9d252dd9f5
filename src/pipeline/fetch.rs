//! Album retrieval boundary.
//!
//! The wire protocol of the album host is not implemented here. An
//! [`AlbumSource`] does the actual download (the default,
//! [`CommandAlbumSource`], drives an external downloader program); this
//! module owns everything around it:
//!
//! 1. validating the album id before anything touches the network or disk
//! 2. resolving the candidate host list (verified-hosts file overrides config)
//! 3. locating the directory the source materialised, probing
//!    `<title>`, `JM<id>`, `<id>` in that order

use crate::config::{AppConfig, FetcherConfig};
use crate::error::Album2PdfError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

static RE_ALBUM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// A validated album id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumRequest {
    id: String,
}

impl AlbumRequest {
    /// Validate a user-supplied id: ASCII digits only, surrounding whitespace
    /// ignored, and not zero.
    pub fn parse(input: &str) -> Result<Self, Album2PdfError> {
        let id = input.trim();
        if !RE_ALBUM_ID.is_match(id) || id.bytes().all(|b| b == b'0') {
            return Err(Album2PdfError::InvalidAlbumId {
                input: input.to_string(),
            });
        }
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `JM<id>` directory/file name used as a fallback.
    pub fn synthesized_name(&self) -> String {
        format!("JM{}", self.id)
    }
}

impl std::fmt::Display for AlbumRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// What an [`AlbumSource`] reports after a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAlbum {
    /// Album title as reported by the host, if known.
    pub title: Option<String>,
    /// Directory under which the album folder was created.
    pub base_dir: PathBuf,
}

/// A located album download, owned by the pipeline until cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub title: String,
    pub local_directory: PathBuf,
}

/// Something that can download an album to local disk.
///
/// Implementations own their retry and timeout policy and any internal
/// parallelism; the pipeline awaits a single result.
#[async_trait]
pub trait AlbumSource: Send + Sync {
    /// Download `request`, trying `hosts` in order.
    async fn fetch(
        &self,
        request: &AlbumRequest,
        hosts: &[String],
    ) -> Result<FetchedAlbum, Album2PdfError>;
}

/// Resolves hosts, calls the source, and locates the result directory.
pub struct AlbumFetcher {
    source: Arc<dyn AlbumSource>,
}

impl AlbumFetcher {
    pub fn new(source: Arc<dyn AlbumSource>) -> Self {
        Self { source }
    }

    /// Fetch `request` and return the directory holding its images.
    pub async fn fetch(
        &self,
        request: &AlbumRequest,
        config: &AppConfig,
    ) -> Result<DownloadResult, Album2PdfError> {
        let hosts = config.resolve_candidate_hosts();
        let preview: Vec<&str> = hosts.iter().take(3).map(String::as_str).collect();
        info!(
            "Fetching album {} via {} host(s): {}{}",
            request,
            hosts.len(),
            preview.join(", "),
            if hosts.len() > 3 { ", …" } else { "" }
        );

        let fetched = self.source.fetch(request, &hosts).await?;
        let result = locate_album_dir(&fetched, request)?;
        info!(
            "Album {} downloaded to {}",
            request,
            result.local_directory.display()
        );
        Ok(result)
    }
}

/// Probe for the album directory in priority order.
///
/// The first existing directory wins, even if a later candidate also exists.
pub fn locate_album_dir(
    fetched: &FetchedAlbum,
    request: &AlbumRequest,
) -> Result<DownloadResult, Album2PdfError> {
    let mut candidates: Vec<String> = Vec::with_capacity(3);
    if let Some(title) = fetched.title.as_deref().map(str::trim) {
        if is_probeable_name(title) {
            candidates.push(title.to_string());
        } else {
            debug!("Not probing unsafe title as a directory name: {:?}", title);
        }
    }
    candidates.push(request.synthesized_name());
    candidates.push(request.id().to_string());

    for name in &candidates {
        let dir = fetched.base_dir.join(name);
        if dir.is_dir() {
            let title = fetched
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| name.clone());
            return Ok(DownloadResult {
                title,
                local_directory: dir,
            });
        }
    }

    Err(Album2PdfError::ResultNotFound {
        id: request.id().to_string(),
        base_dir: fetched.base_dir.clone(),
        tried: candidates.join(", "),
    })
}

/// A title is only joined onto the base dir when it names a single child.
fn is_probeable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

// ── Command-driven source ────────────────────────────────────────────────────

/// Downloads by running an external downloader program.
///
/// Before each run an option file is written to a private temp directory
/// with the host list, retry budget, proxy, worker count, base directory and
/// directory rule; its path is exported as `JM_OPTION_PATH`. The program is
/// invoked as `program [args…] <id>` with the download directory as working
/// directory.
///
/// The album title is read from the program's stdout with
/// [`FetcherConfig::title_pattern`]; without a match no title is reported.
pub struct CommandAlbumSource {
    fetcher: FetcherConfig,
    retry_budget: u32,
    download_dir: PathBuf,
}

impl CommandAlbumSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            fetcher: config.fetcher.clone(),
            retry_budget: config.retry_budget,
            download_dir: config.download_directory.clone(),
        }
    }

    fn option_file(&self, hosts: &[String], base_dir: &Path) -> DownloaderOptions {
        DownloaderOptions {
            client: ClientOptions {
                domain: hosts.to_vec(),
                client_impl: self.fetcher.client_impl.clone(),
                retry_times: self.retry_budget,
                postman: PostmanOptions {
                    meta_data: MetaData {
                        proxies: self.fetcher.proxy.clone(),
                    },
                },
            },
            dir_rule: DirRule {
                base_dir: base_dir.to_string_lossy().into_owned(),
                rule: self.fetcher.dir_rule.clone(),
            },
            download: DownloadOptions {
                cache: true,
                image: ImageOptions {
                    decode: true,
                    suffix: ".jpg".into(),
                },
                threading: Threading {
                    image: self.fetcher.image_threads,
                },
            },
            // the title line is only printed with logging on
            log: true,
        }
    }

    fn write_option_file(
        &self,
        hosts: &[String],
        base_dir: &Path,
    ) -> Result<(TempDir, PathBuf), Album2PdfError> {
        let dir = tempfile::Builder::new()
            .prefix("album2pdf-opt-")
            .tempdir()
            .map_err(|e| Album2PdfError::Internal(format!("tempdir: {e}")))?;
        let path = dir.path().join("option.yml");
        let yaml = serde_yaml::to_string(&self.option_file(hosts, base_dir))
            .map_err(|e| Album2PdfError::Internal(format!("option file: {e}")))?;
        std::fs::write(&path, yaml)
            .map_err(|e| Album2PdfError::Internal(format!("option file write: {e}")))?;
        Ok((dir, path))
    }
}

#[async_trait]
impl AlbumSource for CommandAlbumSource {
    async fn fetch(
        &self,
        request: &AlbumRequest,
        hosts: &[String],
    ) -> Result<FetchedAlbum, Album2PdfError> {
        let fetch_err = |reason: String| Album2PdfError::FetchFailed {
            id: request.id().to_string(),
            reason,
        };

        let title_re = match self.fetcher.title_pattern.as_deref() {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                Album2PdfError::InvalidConfig(format!("fetcher.titlePattern: {e}"))
            })?),
            None => None,
        };

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| {
                fetch_err(format!(
                    "cannot create download directory {}: {e}",
                    self.download_dir.display()
                ))
            })?;
        let base_dir = tokio::fs::canonicalize(&self.download_dir)
            .await
            .map_err(|e| fetch_err(format!("{}: {e}", self.download_dir.display())))?;

        // `_opt_dir` keeps the option file alive until the child exits.
        let (_opt_dir, opt_path) = self.write_option_file(hosts, &base_dir)?;

        debug!(
            "Running {} {:?} {} (JM_OPTION_PATH={})",
            self.fetcher.program,
            self.fetcher.args,
            request,
            opt_path.display()
        );

        let child = Command::new(&self.fetcher.program)
            .args(&self.fetcher.args)
            .arg(request.id())
            .current_dir(&base_dir)
            .env("JM_OPTION_PATH", &opt_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fetch_err(format!("cannot start '{}': {e}", self.fetcher.program)))?;

        let secs = self.fetcher.timeout_secs;
        let output = match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
            .await
        {
            Ok(res) => res.map_err(|e| fetch_err(e.to_string()))?,
            // Dropping the future drops the child, which kills it.
            Err(_) => {
                return Err(Album2PdfError::FetchTimeout {
                    id: request.id().to_string(),
                    secs,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(target: "album2pdf::downloader", "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = format!(
                "{} exited with {}: {}",
                self.fetcher.program,
                output.status,
                tail(&stderr, 5)
            );
            warn!("{}", reason);
            return Err(fetch_err(reason));
        }

        let title = title_re.as_ref().and_then(|re| extract_title(&stdout, re));
        match title {
            Some(ref t) => debug!("Downloader reported title {:?}", t),
            None => debug!("Downloader reported no title for {}", request),
        }

        Ok(FetchedAlbum { title, base_dir })
    }
}

/// Title from the last stdout line matching `pattern`.
///
/// The first capture group that took part in the match is used, so a pattern
/// may offer alternatives with one group each.
fn extract_title(stdout: &str, pattern: &Regex) -> Option<String> {
    stdout
        .lines()
        .rev()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| m.as_str().trim().to_string())
        .find(|t| !t.is_empty())
}

/// Last `n` non-empty lines of `text`, joined with ` | `.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    let joined = lines[start..].join(" | ");
    if joined.is_empty() {
        "(no output)".to_string()
    } else {
        joined
    }
}

// ── Downloader option file schema ────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct DownloaderOptions {
    client: ClientOptions,
    dir_rule: DirRule,
    download: DownloadOptions,
    log: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ClientOptions {
    domain: Vec<String>,
    #[serde(rename = "impl")]
    client_impl: String,
    retry_times: u32,
    postman: PostmanOptions,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PostmanOptions {
    meta_data: MetaData,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct MetaData {
    proxies: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct DirRule {
    base_dir: String,
    rule: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct DownloadOptions {
    cache: bool,
    image: ImageOptions,
    threading: Threading,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ImageOptions {
    decode: bool,
    suffix: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Threading {
    image: u32,
}
