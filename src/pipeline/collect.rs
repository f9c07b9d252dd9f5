//! Image discovery: walk an album directory and order its pages.
//!
//! Downloaders name pages `1.jpg … 10.jpg` (sometimes inside per-chapter
//! sub-directories `1/`, `2/`, … `12/`). Plain lexical order would put
//! `10.jpg` before `2.jpg`, so paths are ordered with [`natural_cmp`], which
//! compares embedded digit runs by numeric value. The walk order returned by
//! the filesystem is never relied on.

use crate::error::Album2PdfError;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions accepted as album pages (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Source container format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Gif,
}

impl SourceFormat {
    /// Map a file extension (any case) to a supported format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "webp" => Some(SourceFormat::WebP),
            "bmp" => Some(SourceFormat::Bmp),
            "gif" => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    /// Formats that cannot be embedded directly and are always re-encoded.
    pub fn requires_reencode(self) -> bool {
        matches!(self, SourceFormat::WebP | SourceFormat::Gif)
    }
}

/// One discovered page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub format: SourceFormat,
}

/// Recursively collect supported images under `root`, in natural order.
///
/// An empty result is returned as `Ok(vec![])`; the caller decides whether
/// that is fatal. Entries that cannot be read during the walk are logged and
/// skipped.
pub fn collect(root: &Path) -> Result<Vec<ImageAsset>, Album2PdfError> {
    let root = std::fs::canonicalize(root).map_err(|e| Album2PdfError::SourceDirectoryMissing {
        path: root.to_path_buf(),
        detail: e.to_string(),
    })?;
    if !root.is_dir() {
        return Err(Album2PdfError::SourceDirectoryMissing {
            path: root,
            detail: "not a directory".into(),
        });
    }

    let mut assets: Vec<ImageAsset> = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let format = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceFormat::from_extension);
        if let Some(format) = format {
            assets.push(ImageAsset {
                path: entry.into_path(),
                format,
            });
        }
    }

    assets.sort_by(|a, b| natural_cmp(&a.path.to_string_lossy(), &b.path.to_string_lossy()));

    if assets.is_empty() {
        info!("No images found under {}", root.display());
    } else {
        info!("Found {} images under {}", assets.len(), root.display());
        debug!(
            "First: {}, last: {}",
            assets[0].path.display(),
            assets[assets.len() - 1].path.display()
        );
    }
    Ok(assets)
}

/// Numeric-aware string comparison.
///
/// The strings are split into alternating digit and non-digit runs. Digit
/// runs compare by value (`"2" < "10"`); equal values with different widths
/// order the shorter run first (`"7" < "07"`). Non-digit runs compare
/// bytewise. A full bytewise comparison breaks any remaining tie, so the
/// order is total and consistent with `Eq`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = Chunks::new(a);
    let mut ys = Chunks::new(b);

    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digit_runs(x, y),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                    (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn cmp_digit_runs(x: &str, y: &str) -> Ordering {
    let xt = x.trim_start_matches('0');
    let yt = y.trim_start_matches('0');
    // Arbitrary-length digit runs: longer significant part is larger.
    xt.len()
        .cmp(&yt.len())
        .then_with(|| xt.cmp(yt))
        .then_with(|| x.len().cmp(&y.len()))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}
