//! Configuration types for the album-to-PDF pipeline.
//!
//! All pipeline behaviour is controlled through [`AppConfig`], either loaded
//! from a YAML file with [`AppConfig::load`] or built via
//! [`AppConfigBuilder`]. The config is passed into
//! [`crate::convert::Pipeline::new`] at construction time; nothing in the
//! library reads ambient process state.
//!
//! # File format
//!
//! ```yaml
//! candidateHosts:
//!   - 18comic-mygo.vip
//!   - jmcomic-zzz.one
//! outputDirectory: ./PDF
//! retryBudget: 3
//! downloadDirectory: .
//! verifiedHostsFile: checked_api.txt
//! jpegQuality: 95
//! fetcher:
//!   program: jmcomic
//!   timeoutSecs: 1800
//!   imageThreads: 20
//!   proxy: 127.0.0.1:7890
//!   dirRule: Bd_Aid
//!   titlePattern: '^\s*title:\s*(.+?)\s*$'
//! ```
//!
//! Every key is optional. A missing file yields [`AppConfig::default`].

use crate::error::Album2PdfError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Hosts used when no configuration file exists.
pub const DEFAULT_HOSTS: &[&str] = &[
    "18comic-mygo.vip",
    "18comic-mygo.org",
    "18comic-MHWs.CC",
    "jmcomic-zzz.one",
    "jmcomic-zzz.org",
];

/// Matches a title line on the downloader's stdout: either `title: <name>`
/// or a `标题: [<name>]` fragment inside a log line.
pub const DEFAULT_TITLE_PATTERN: &str = r"^\s*title:\s*(.+?)\s*$|标题: \[(.+?)\]";

/// Name of the optional verified-hosts file.
pub const DEFAULT_VERIFIED_HOSTS_FILE: &str = "checked_api.txt";

/// Configuration for one pipeline instance.
///
/// # Example
/// ```rust
/// use album2pdf::AppConfig;
///
/// let config = AppConfig::builder()
///     .output_dir("./PDF")
///     .retry_budget(5)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.retry_budget, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Ranked host list, highest priority first.
    pub candidate_hosts: Vec<String>,

    /// Where finished PDFs are written. Default: `./PDF`.
    pub output_directory: PathBuf,

    /// Retries the external downloader may spend per request. Default: 3.
    pub retry_budget: u32,

    /// Base directory the downloader materialises albums into. Default: `.`.
    pub download_directory: PathBuf,

    /// Plain-text host override, one host per line. Default: `checked_api.txt`.
    ///
    /// When the file exists it replaces `candidate_hosts` before every fetch.
    pub verified_hosts_file: PathBuf,

    /// Directory for re-encoded page images. Default: the OS temp directory.
    pub scratch_directory: Option<PathBuf>,

    /// JPEG quality for re-encoded pages (1–100). Default: 95.
    pub jpeg_quality: u8,

    /// External downloader settings.
    pub fetcher: FetcherConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            candidate_hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            output_directory: PathBuf::from("./PDF"),
            retry_budget: 3,
            download_directory: PathBuf::from("."),
            verified_hosts_file: PathBuf::from(DEFAULT_VERIFIED_HOSTS_FILE),
            scratch_directory: None,
            jpeg_quality: 95,
            fetcher: FetcherConfig::default(),
        }
    }
}

/// Settings for [`crate::pipeline::fetch::CommandAlbumSource`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FetcherConfig {
    /// Downloader executable. Default: `jmcomic`.
    pub program: String,

    /// Extra arguments placed before the album id.
    pub args: Vec<String>,

    /// Wall-clock limit for one download in seconds. Default: 1800.
    pub timeout_secs: u64,

    /// Concurrent image downloads inside the downloader. Default: 20.
    pub image_threads: u32,

    /// Proxy address handed to the downloader verbatim; `None` disables it.
    pub proxy: Option<String>,

    /// Directory naming rule written to the option file. Default: `Bd_Aid`,
    /// which puts each album in `<base_dir>/<id>`.
    pub dir_rule: String,

    /// Client implementation written to the option file. Default: `api`.
    pub client_impl: String,

    /// Regex applied to each stdout line of the downloader; the first
    /// participating capture group of the last matching line is the album
    /// title. `None` disables title detection.
    pub title_pattern: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: "jmcomic".to_string(),
            args: Vec::new(),
            timeout_secs: 1800,
            image_threads: 20,
            proxy: None,
            dir_rule: "Bd_Aid".to_string(),
            client_impl: "api".to_string(),
            title_pattern: Some(DEFAULT_TITLE_PATTERN.to_string()),
        }
    }
}

impl AppConfig {
    /// Create a new builder starting from [`AppConfig::default`].
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }

    /// Continue building from this config, e.g. to apply CLI overrides on
    /// top of a loaded file.
    pub fn into_builder(self) -> AppConfigBuilder {
        AppConfigBuilder { config: self }
    }

    /// Load a YAML config file.
    ///
    /// A missing file is not an error: the defaults are returned. Relative
    /// `verifiedHostsFile` paths are resolved against the file's directory so
    /// the override sits next to the config regardless of the working
    /// directory.
    pub fn load(path: &Path) -> Result<Self, Album2PdfError> {
        if !path.exists() {
            info!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| Album2PdfError::ConfigLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let mut config: AppConfig = if text.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&text).map_err(|e| Album2PdfError::ConfigLoad {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        };

        if config.verified_hosts_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.verified_hosts_file = dir.join(&config.verified_hosts_file);
            }
        }

        debug!("Loaded config from {}: {:?}", path.display(), config);
        config.validate()?;
        Ok(config)
    }

    /// Find the config file to use when none was given explicitly.
    ///
    /// Order: `$ALBUM2PDF_CONFIG`, `./album2pdf.yml`,
    /// `<user config dir>/album2pdf/config.yml`. Returns the first candidate
    /// that exists, or `None`.
    pub fn discover() -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(p) = std::env::var("ALBUM2PDF_CONFIG") {
            if !p.is_empty() {
                candidates.push(PathBuf::from(p));
            }
        }
        candidates.push(PathBuf::from("album2pdf.yml"));
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("album2pdf").join("config.yml"));
        }
        candidates.into_iter().find(|p| p.exists())
    }

    /// Hosts to hand to the downloader for the next fetch.
    ///
    /// The verified-hosts file is re-read on every call; when it exists and
    /// lists at least one host it replaces the configured list entirely.
    /// A file that exists but lists no host is treated like a missing one.
    pub fn resolve_candidate_hosts(&self) -> Vec<String> {
        match read_hosts_file(&self.verified_hosts_file) {
            Some(hosts) if !hosts.is_empty() => {
                debug!(
                    "Using {} verified hosts from {}",
                    hosts.len(),
                    self.verified_hosts_file.display()
                );
                hosts
            }
            _ => self.candidate_hosts.clone(),
        }
    }

    fn validate(&self) -> Result<(), Album2PdfError> {
        if self.candidate_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(Album2PdfError::InvalidConfig(
                "candidateHosts must contain at least one host".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Album2PdfError::InvalidConfig(format!(
                "jpegQuality must be 1–100, got {}",
                self.jpeg_quality
            )));
        }
        if self.fetcher.program.trim().is_empty() {
            return Err(Album2PdfError::InvalidConfig(
                "fetcher.program must not be empty".into(),
            ));
        }
        if self.fetcher.dir_rule.trim().is_empty() {
            return Err(Album2PdfError::InvalidConfig(
                "fetcher.dirRule must not be empty".into(),
            ));
        }
        if let Some(ref pattern) = self.fetcher.title_pattern {
            let re = Regex::new(pattern).map_err(|e| {
                Album2PdfError::InvalidConfig(format!("fetcher.titlePattern: {e}"))
            })?;
            if re.captures_len() < 2 {
                return Err(Album2PdfError::InvalidConfig(
                    "fetcher.titlePattern needs a capture group".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Parse a verified-hosts file: one host per line, blank lines ignored.
///
/// Returns `None` when the file does not exist or cannot be read.
pub fn read_hosts_file(path: &Path) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(path).ok()?;
    Some(parse_hosts(&text))
}

fn parse_hosts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn candidate_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.candidate_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_directory = dir.into();
        self
    }

    pub fn retry_budget(mut self, n: u32) -> Self {
        self.config.retry_budget = n;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_directory = dir.into();
        self
    }

    pub fn verified_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.verified_hosts_file = path.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_directory = Some(dir.into());
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn fetcher_program(mut self, program: impl Into<String>) -> Self {
        self.config.fetcher.program = program.into();
        self
    }

    pub fn fetcher_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fetcher.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetcher.timeout_secs = secs.max(1);
        self
    }

    pub fn image_threads(mut self, n: u32) -> Self {
        self.config.fetcher.image_threads = n.max(1);
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.config.fetcher.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn dir_rule(mut self, rule: impl Into<String>) -> Self {
        self.config.fetcher.dir_rule = rule.into();
        self
    }

    pub fn title_pattern(mut self, pattern: Option<String>) -> Self {
        self.config.fetcher.title_pattern = pattern;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, Album2PdfError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let c = AppConfig::default();
        assert_eq!(c.candidate_hosts.len(), 5);
        assert_eq!(c.candidate_hosts[0], "18comic-mygo.vip");
        assert_eq!(c.output_directory, PathBuf::from("./PDF"));
        assert_eq!(c.retry_budget, 3);
        assert_eq!(c.jpeg_quality, 95);
        assert_eq!(c.fetcher.program, "jmcomic");
        assert_eq!(c.fetcher.dir_rule, "Bd_Aid");
        assert_eq!(c.fetcher.client_impl, "api");
        assert_eq!(
            c.fetcher.title_pattern.as_deref(),
            Some(DEFAULT_TITLE_PATTERN)
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let c = AppConfig::load(&dir.path().join("nope.yml")).unwrap();
        assert_eq!(c, AppConfig::default());
    }

    #[test]
    fn load_partial_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("album2pdf.yml");
        std::fs::write(
            &path,
            "candidateHosts: [a.example, b.example]\nretryBudget: 0\nfetcher:\n  proxy: 127.0.0.1:7890\n",
        )
        .unwrap();

        let c = AppConfig::load(&path).unwrap();
        assert_eq!(c.candidate_hosts, vec!["a.example", "b.example"]);
        assert_eq!(c.retry_budget, 0);
        assert_eq!(c.fetcher.proxy.as_deref(), Some("127.0.0.1:7890"));
        // untouched keys keep their defaults
        assert_eq!(c.output_directory, PathBuf::from("./PDF"));
        assert_eq!(c.fetcher.image_threads, 20);
        // relative override file resolves next to the config
        assert_eq!(c.verified_hosts_file, dir.path().join("checked_api.txt"));
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "retryBudget: [not a number\n").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, Album2PdfError::ConfigLoad { .. }), "got {err:?}");
    }

    #[test]
    fn verified_hosts_replace_configured_list() {
        let dir = TempDir::new().unwrap();
        let hosts = dir.path().join("checked_api.txt");
        std::fs::write(&hosts, "  fast.example \n\n\nslow.example\n").unwrap();

        let c = AppConfig::builder()
            .candidate_hosts(["configured.example"])
            .verified_hosts_file(&hosts)
            .build()
            .unwrap();
        assert_eq!(c.resolve_candidate_hosts(), vec!["fast.example", "slow.example"]);

        std::fs::remove_file(&hosts).unwrap();
        assert_eq!(c.resolve_candidate_hosts(), vec!["configured.example"]);
    }

    #[test]
    fn blank_verified_hosts_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let hosts = dir.path().join("checked_api.txt");
        std::fs::write(&hosts, "\n   \n").unwrap();
        let c = AppConfig::builder()
            .candidate_hosts(["configured.example"])
            .verified_hosts_file(&hosts)
            .build()
            .unwrap();
        assert_eq!(c.resolve_candidate_hosts(), vec!["configured.example"]);
    }

    #[test]
    fn builder_validates() {
        assert!(AppConfig::builder().jpeg_quality(0).build().is_err());
        assert!(AppConfig::builder()
            .candidate_hosts(Vec::<String>::new())
            .build()
            .is_err());
        assert!(AppConfig::builder().fetcher_program("  ").build().is_err());
        assert!(AppConfig::builder().dir_rule("").build().is_err());
        assert!(AppConfig::builder()
            .title_pattern(Some("title: [".into()))
            .build()
            .is_err());
        assert!(AppConfig::builder()
            .title_pattern(Some("title: .+".into()))
            .build()
            .is_err());
        assert!(AppConfig::builder().title_pattern(None).build().is_ok());
        let c = AppConfig::builder().proxy(Some(" ".into())).build().unwrap();
        assert_eq!(c.fetcher.proxy, None);
    }

    #[test]
    fn overrides_apply_on_top_of_loaded_values() {
        let base = AppConfig::builder().retry_budget(7).build().unwrap();
        let c = base
            .into_builder()
            .output_dir("/tmp/out")
            .fetch_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.retry_budget, 7);
        assert_eq!(c.output_directory, PathBuf::from("/tmp/out"));
        assert_eq!(c.fetcher.timeout_secs, 1);
    }
}
