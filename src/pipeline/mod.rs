//! Pipeline stages for album-to-PDF conversion.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ collect ──▶ assemble ──────────────────────────▶ PDF
//! (album)   (walk+sort)   │  for each image, in order:
//!                         ├─ probe/decode
//!                         ├─ layout     (A4 canvas, fit, centre)
//!                         ├─ normalize  (RGB, alpha on white)
//!                         └─ document   (append one page)
//! ```
//!
//! 1. [`fetch`] validates the id, runs the [`fetch::AlbumSource`] and
//!    locates the directory it produced; the only stage with network I/O
//! 2. [`collect`] walks the album, filters by extension, natural-sorts
//! 3. [`assemble`] places one page per image, strictly sequentially; runs in
//!    `spawn_blocking` because decoding and compression are CPU-bound
//! 4. [`layout`] is pure geometry: orientation, scale and offsets
//! 5. [`normalize`] turns any pixel format into opaque 8-bit RGB
//! 6. [`document`] owns the `lopdf` page tree and final serialisation

pub mod assemble;
pub mod collect;
pub mod document;
pub mod fetch;
pub mod layout;
pub mod normalize;
