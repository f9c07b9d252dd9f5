//! Document assembly: ordered images → one PDF file.
//!
//! Pages are processed strictly one at a time in collector order. For each
//! image the header is probed first so layout uses the original pixel size,
//! then the image is decoded, normalised and embedded:
//!
//! | Source (format sniffed from content)          | Embedded as                          |
//! |-----------------------------------------------|--------------------------------------|
//! | WebP, GIF, or anything that needed conversion | temp JPEG (re-encoded) → `DCTDecode` |
//! | JPEG whose frame is not three-component (CMYK) | temp JPEG (re-encoded) → `DCTDecode` |
//! | untouched three-component JPEG                | original file bytes → `DCTDecode`    |
//! | any other untouched RGB image                 | raw RGB, zlib → `FlateDecode`        |
//!
//! The file extension only decides whether a file is collected. A `.jpg`
//! holding PNG data is embedded as PNG pixels, never as JPEG bytes.
//!
//! A failing image is skipped and recorded; it never aborts the document.
//! The finished PDF is written to a temp file beside the target and moved
//! into place only when complete, so the target path never holds a partial
//! document and is never overwritten.

use crate::error::{Album2PdfError, AssetError, CleanupWarning};
use crate::output::AssemblyReport;
use crate::pipeline::collect::ImageAsset;
use crate::pipeline::document::{EmbeddedImage, PdfBuilder};
use crate::pipeline::layout::{layout, PageSpec};
use crate::pipeline::normalize::{normalize, NormalizedImage};
use crate::progress::ProgressCallback;
use flate2::{write::ZlibEncoder, Compression};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Header facts read before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetHeader {
    pub width: u32,
    pub height: u32,
    /// Colour type reported by the decoder.
    pub color: ExtendedColorType,
    /// Container format guessed from the file's leading bytes.
    pub format: Option<ImageFormat>,
}

/// Settings for one [`DocumentAssembler`].
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Where re-encoded page images are written while a page is placed.
    pub scratch_dir: PathBuf,
    /// JPEG quality for re-encoded pages (1–100).
    pub jpeg_quality: u8,
    /// Stored as the PDF `/Title`.
    pub title: Option<String>,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            jpeg_quality: 95,
            title: None,
        }
    }
}

/// Builds a PDF from an ordered list of images.
pub struct DocumentAssembler {
    options: AssemblerOptions,
    progress: Option<ProgressCallback>,
}

impl DocumentAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Place every asset in order and write the document to `target`.
    ///
    /// # Errors
    /// - [`Album2PdfError::EmptyDocument`] if no page could be placed
    /// - [`Album2PdfError::PdfWriteFailed`] / [`Album2PdfError::OutputWriteFailed`]
    ///   if the final write fails
    pub fn assemble(
        &self,
        assets: &[ImageAsset],
        target: &Path,
    ) -> Result<AssemblyReport, Album2PdfError> {
        let total = assets.len();
        info!("Assembling {} images into {}", total, target.display());

        if total == 0 {
            return Err(Album2PdfError::EmptyDocument {
                total: 0,
                first_error: "no supported images were found".into(),
            });
        }

        std::fs::create_dir_all(&self.options.scratch_dir).map_err(|e| {
            Album2PdfError::Internal(format!(
                "cannot create scratch directory {}: {e}",
                self.options.scratch_dir.display()
            ))
        })?;

        if let Some(ref cb) = self.progress {
            cb.on_assembly_start(total);
        }

        let mut builder = PdfBuilder::new();
        let mut report = AssemblyReport {
            output_path: target.to_path_buf(),
            total_images: total,
            ..Default::default()
        };

        for (i, asset) in assets.iter().enumerate() {
            let page_num = i + 1;
            match self.place(asset, &mut builder) {
                Ok(warning) => {
                    debug!("Placed page {}/{}: {}", page_num, total, asset.path.display());
                    report.cleanup_warnings.extend(warning);
                    if let Some(ref cb) = self.progress {
                        cb.on_page_complete(page_num, total);
                    }
                }
                Err(e) => {
                    warn!("Skipping image {}/{}: {}", page_num, total, e);
                    if let Some(ref cb) = self.progress {
                        cb.on_page_error(page_num, total, &e.to_string());
                    }
                    report.skipped.push(e);
                }
            }
        }

        report.pages_written = builder.page_count();
        if let Some(ref cb) = self.progress {
            cb.on_assembly_complete(total, report.pages_written);
        }

        if report.pages_written == 0 {
            let first_error = report
                .skipped
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Album2PdfError::EmptyDocument { total, first_error });
        }

        report.bytes_written = self.finalize(builder, target)?;
        info!(
            "Wrote {} pages ({} skipped, {} bytes) to {}",
            report.pages_written,
            report.skipped.len(),
            report.bytes_written,
            target.display()
        );
        Ok(report)
    }

    /// Place one asset. Returns a warning if its temp file could not be removed.
    fn place(
        &self,
        asset: &ImageAsset,
        builder: &mut PdfBuilder,
    ) -> Result<Option<CleanupWarning>, AssetError> {
        let (header, img) = probe_and_decode(&asset.path)?;
        let spec = layout(header.width, header.height);
        debug!(
            "{}: {}x{} px, {:?}, scale {:.3}",
            asset.path.display(),
            header.width,
            header.height,
            spec.orientation,
            spec.scale(header.width)
        );
        let normalized = normalize(img);

        let needs_reencode = asset.format.requires_reencode()
            || matches!(header.format, Some(ImageFormat::WebP | ImageFormat::Gif))
            || normalized.converted
            || header.color != ExtendedColorType::Rgb8;

        if needs_reencode {
            return self.place_reencoded(asset, &spec, &normalized, builder);
        }

        let embedded = if header.format == Some(ImageFormat::Jpeg) {
            let bytes = std::fs::read(&asset.path).map_err(|e| AssetError::Decode {
                path: asset.path.clone(),
                detail: e.to_string(),
            })?;
            // DeviceRGB only describes three-component frames.
            let components = jpeg_component_count(&bytes);
            if components != Some(3) {
                debug!(
                    "Re-encoding {}: JPEG frame has {:?} components",
                    asset.path.display(),
                    components
                );
                return self.place_reencoded(asset, &spec, &normalized, builder);
            }
            EmbeddedImage::Jpeg {
                bytes,
                width: normalized.raster.width(),
                height: normalized.raster.height(),
            }
        } else {
            flate_rgb(&normalized.raster).map_err(|e| AssetError::Encode {
                path: asset.path.clone(),
                detail: e.to_string(),
            })?
        };

        builder
            .add_page(&spec, embedded)
            .map_err(|e| AssetError::Encode {
                path: asset.path.clone(),
                detail: e.to_string(),
            })?;
        Ok(None)
    }

    /// Re-encode through a scoped temp JPEG.
    ///
    /// The temp file is removed right after the page is placed; on any early
    /// return it is removed when the handle drops.
    fn place_reencoded(
        &self,
        asset: &ImageAsset,
        spec: &PageSpec,
        normalized: &NormalizedImage,
        builder: &mut PdfBuilder,
    ) -> Result<Option<CleanupWarning>, AssetError> {
        let encode_err = |detail: String| AssetError::Encode {
            path: asset.path.clone(),
            detail,
        };

        let tmp = write_temp_jpeg(
            &normalized.raster,
            &self.options.scratch_dir,
            self.options.jpeg_quality,
        )
        .map_err(encode_err)?;
        debug!(
            "Re-encoded {} via {}",
            asset.path.display(),
            tmp.path().display()
        );

        let bytes = std::fs::read(tmp.path()).map_err(|e| encode_err(e.to_string()))?;
        builder
            .add_page(
                spec,
                EmbeddedImage::Jpeg {
                    bytes,
                    width: normalized.raster.width(),
                    height: normalized.raster.height(),
                },
            )
            .map_err(|e| encode_err(e.to_string()))?;

        let tmp_path = tmp.path().to_path_buf();
        match tmp.close() {
            Ok(()) => Ok(None),
            Err(e) => {
                warn!("Could not remove temp file {}: {}", tmp_path.display(), e);
                Ok(Some(CleanupWarning {
                    path: tmp_path,
                    detail: e.to_string(),
                }))
            }
        }
    }

    /// Serialise into a sibling temp file, then move it onto `target`.
    fn finalize(&self, builder: PdfBuilder, target: &Path) -> Result<u64, Album2PdfError> {
        let write_err = |source: std::io::Error| Album2PdfError::OutputWriteFailed {
            path: target.to_path_buf(),
            source,
        };

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut part = tempfile::Builder::new()
            .prefix(".album2pdf-")
            .suffix(".pdf.part")
            .tempfile_in(&parent)
            .map_err(write_err)?;

        {
            let mut out = BufWriter::new(part.as_file_mut());
            builder
                .finish(self.options.title.as_deref(), &mut out)
                .map_err(|e| Album2PdfError::PdfWriteFailed {
                    path: target.to_path_buf(),
                    detail: e.to_string(),
                })?;
            out.flush().map_err(write_err)?;
        }
        part.as_file().sync_all().map_err(write_err)?;

        let file = part
            .persist_noclobber(target)
            .map_err(|e| write_err(e.error))?;
        let bytes = file.metadata().map_err(write_err)?.len();
        Ok(bytes)
    }
}

/// Read the header, then decode the pixels, from a single open handle.
pub fn probe_and_decode(path: &Path) -> Result<(AssetHeader, DynamicImage), AssetError> {
    let probe_err = |detail: String| AssetError::Probe {
        path: path.to_path_buf(),
        detail,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| probe_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| probe_err(e.to_string()))?;
    let format = reader.format();
    let decoder = reader
        .into_decoder()
        .map_err(|e| probe_err(e.to_string()))?;

    let (width, height) = decoder.dimensions();
    if width == 0 || height == 0 {
        return Err(probe_err(format!("empty image ({width}x{height})")));
    }
    let header = AssetHeader {
        width,
        height,
        color: decoder.original_color_type(),
        format,
    };

    let img = DynamicImage::from_decoder(decoder).map_err(|e| AssetError::Decode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok((header, img))
}

/// Number of colour components declared in a JPEG frame header.
///
/// Walks the marker segments up to the first SOF marker. Returns `None` for
/// anything that is not a well-formed JPEG prefix.
pub fn jpeg_component_count(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    loop {
        if *bytes.get(i)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(i + 1)?;
        match marker {
            // fill byte before a marker
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            // SOF0..SOF15, minus DHT, JPG and DAC
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return bytes.get(i + 9).copied();
            }
            _ => {}
        }
        let len = usize::from(u16::from_be_bytes([*bytes.get(i + 2)?, *bytes.get(i + 3)?]));
        if len < 2 {
            return None;
        }
        i += 2 + len;
    }
}

fn write_temp_jpeg(raster: &RgbImage, dir: &Path, quality: u8) -> Result<NamedTempFile, String> {
    let mut tmp = tempfile::Builder::new()
        .prefix("album2pdf-page-")
        .suffix(".jpg")
        .tempfile_in(dir)
        .map_err(|e| format!("cannot create temp file in {}: {e}", dir.display()))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(raster)
            .map_err(|e| e.to_string())?;
        out.flush().map_err(|e| e.to_string())?;
    }
    Ok(tmp)
}

fn flate_rgb(raster: &RgbImage) -> std::io::Result<EmbeddedImage> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(raster.as_raw())?;
    Ok(EmbeddedImage::FlateRgb {
        bytes: enc.finish()?,
        width: raster.width(),
        height: raster.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::collect::SourceFormat;
    use image::{Rgb, Rgba, RgbaImage};
    use lopdf::{Document, Object};
    use tempfile::TempDir;

    fn asset(path: PathBuf) -> ImageAsset {
        let ext = path.extension().unwrap().to_str().unwrap().to_string();
        ImageAsset {
            path,
            format: SourceFormat::from_extension(&ext).unwrap(),
        }
    }

    fn write_rgb(path: &Path, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([30, 60, 90])).save(path).unwrap();
    }

    fn options(scratch: &Path) -> AssemblerOptions {
        AssemblerOptions {
            scratch_dir: scratch.to_path_buf(),
            jpeg_quality: 90,
            title: Some("Unit".into()),
        }
    }

    fn scratch_is_empty(scratch: &Path) -> bool {
        std::fs::read_dir(scratch).unwrap().next().is_none()
    }

    /// `(filter, payload)` of every image XObject in the document.
    fn image_streams(pdf: &Path) -> Vec<(Vec<u8>, Vec<u8>)> {
        let doc = Document::load(pdf).unwrap();
        doc.objects
            .values()
            .filter_map(|obj| match obj {
                Object::Stream(stream)
                    if stream.dict.get(b"Subtype").and_then(Object::as_name).ok()
                        == Some(&b"Image"[..]) =>
                {
                    let filter = stream.dict.get(b"Filter").unwrap().as_name().unwrap();
                    Some((filter.to_vec(), stream.content.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// 8×8 baseline JPEG with four components and no Adobe marker, which
    /// decoders read as CMYK. Every block is DC-only with a zero difference.
    fn cmyk_jpeg() -> Vec<u8> {
        let mut b = vec![0xFF, 0xD8];
        // DQT: table 0, all ones
        b.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
        b.extend_from_slice(&[1u8; 64]);
        // SOF0: 8 bit, 8x8, four components sharing quant table 0
        b.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x08, 0x00, 0x08, 0x04]);
        for id in 1..=4u8 {
            b.extend_from_slice(&[id, 0x11, 0x00]);
        }
        // DHT: one length-1 code per table, symbol 0 (DC category 0 / AC EOB)
        b.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x26]);
        for class in [0x00u8, 0x10] {
            b.push(class);
            let mut counts = [0u8; 16];
            counts[0] = 1;
            b.extend_from_slice(&counts);
            b.push(0x00);
        }
        // SOS: all four components on tables 0/0
        b.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x0E, 0x04]);
        for id in 1..=4u8 {
            b.extend_from_slice(&[id, 0x00]);
        }
        b.extend_from_slice(&[0x00, 0x3F, 0x00]);
        // two zero bits (DC, EOB) per block, four blocks
        b.push(0x00);
        b.extend_from_slice(&[0xFF, 0xD9]);
        b
    }

    #[test]
    fn probe_reports_original_size() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("a.png");
        write_rgb(&p, 13, 7);
        let (header, img) = probe_and_decode(&p).unwrap();
        assert_eq!((header.width, header.height), (13, 7));
        assert_eq!(header.color, ExtendedColorType::Rgb8);
        assert_eq!((img.width(), img.height()), (13, 7));
    }

    #[test]
    fn probe_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("x.jpg");
        std::fs::write(&p, b"definitely not an image").unwrap();
        assert!(matches!(
            probe_and_decode(&p),
            Err(AssetError::Probe { .. })
        ));
    }

    #[test]
    fn mixed_formats_produce_one_page_each() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let jpg = src.path().join("1.jpg");
        write_rgb(&jpg, 40, 80);
        let png = src.path().join("2.png");
        RgbaImage::from_pixel(90, 30, Rgba([0, 0, 0, 0])).save(&png).unwrap();
        let bmp = src.path().join("3.bmp");
        write_rgb(&bmp, 20, 20);

        let assets = vec![asset(jpg), asset(png), asset(bmp)];
        let target = out.path().join("nested").join("album.pdf");
        let report = DocumentAssembler::new(options(scratch.path()))
            .assemble(&assets, &target)
            .unwrap();

        assert_eq!(report.total_images, 3);
        assert_eq!(report.pages_written, 3);
        assert!(report.skipped.is_empty());
        assert!(report.bytes_written > 0);
        assert!(scratch_is_empty(scratch.path()));

        let doc = Document::load(&target).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn bad_image_is_skipped_and_temp_files_removed() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let good = src.path().join("1.png");
        RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 128])).save(&good).unwrap();
        let bad = src.path().join("2.webp");
        std::fs::write(&bad, b"RIFF....WEBPjunk").unwrap();

        let target = out.path().join("a.pdf");
        let report = DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(good), asset(bad.clone())], &target)
            .unwrap();

        assert_eq!(report.pages_written, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path(), bad.as_path());
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn all_failures_is_empty_document_and_nothing_written() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let bad = src.path().join("1.jpg");
        std::fs::write(&bad, b"nope").unwrap();

        let target = out.path().join("a.pdf");
        let err = DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(bad)], &target)
            .unwrap_err();
        assert!(matches!(err, Album2PdfError::EmptyDocument { total: 1, .. }));
        assert!(!target.exists());
        assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[test]
    fn existing_target_is_never_overwritten() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let img = src.path().join("1.png");
        write_rgb(&img, 5, 5);

        let target = out.path().join("a.pdf");
        std::fs::write(&target, b"keep me").unwrap();
        let err = DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(img)], &target)
            .unwrap_err();
        assert!(matches!(err, Album2PdfError::OutputWriteFailed { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"keep me");
        // the .part file is gone too
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[test]
    fn png_data_under_jpeg_name_is_not_embedded_as_jpeg() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let misnamed = src.path().join("1.jpg");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]))
            .save_with_format(&misnamed, ImageFormat::Png)
            .unwrap();

        let (header, _) = probe_and_decode(&misnamed).unwrap();
        assert_eq!(header.format, Some(ImageFormat::Png));

        let target = out.path().join("a.pdf");
        let report = DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(misnamed)], &target)
            .unwrap();
        assert_eq!(report.pages_written, 1);

        let streams = image_streams(&target);
        assert_eq!(streams.len(), 1);
        let (filter, payload) = &streams[0];
        assert_eq!(filter.as_slice(), b"FlateDecode");
        assert!(!payload.starts_with(b"\x89PNG"));
    }

    #[test]
    fn rgb_jpeg_bytes_are_embedded_unchanged() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jpg = src.path().join("1.jpg");
        write_rgb(&jpg, 16, 24);
        let original = std::fs::read(&jpg).unwrap();

        let target = out.path().join("a.pdf");
        DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(jpg)], &target)
            .unwrap();

        let streams = image_streams(&target);
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].0.as_slice(), b"DCTDecode");
        assert_eq!(streams[0].1, original);
    }

    #[test]
    fn cmyk_jpeg_is_reencoded_as_rgb() {
        let src = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jpg = src.path().join("1.jpg");
        let original = cmyk_jpeg();
        std::fs::write(&jpg, &original).unwrap();
        assert_eq!(jpeg_component_count(&original), Some(4));

        let target = out.path().join("a.pdf");
        let report = DocumentAssembler::new(options(scratch.path()))
            .assemble(&[asset(jpg)], &target)
            .unwrap();
        assert_eq!(report.pages_written, 1);
        assert!(report.skipped.is_empty());
        assert!(scratch_is_empty(scratch.path()));

        let streams = image_streams(&target);
        assert_eq!(streams.len(), 1);
        let (filter, payload) = &streams[0];
        assert_eq!(filter.as_slice(), b"DCTDecode");
        assert_ne!(payload, &original);
        assert_eq!(jpeg_component_count(payload), Some(3));
    }

    #[test]
    fn component_count_reads_frame_header() {
        let dir = TempDir::new().unwrap();
        let rgb = dir.path().join("rgb.jpg");
        write_rgb(&rgb, 4, 4);
        assert_eq!(jpeg_component_count(&std::fs::read(&rgb).unwrap()), Some(3));

        let gray = dir.path().join("gray.jpg");
        image::GrayImage::from_pixel(4, 4, image::Luma([7])).save(&gray).unwrap();
        assert_eq!(jpeg_component_count(&std::fs::read(&gray).unwrap()), Some(1));

        assert_eq!(jpeg_component_count(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(jpeg_component_count(&[0xFF, 0xD8, 0xFF]), None);
        assert_eq!(jpeg_component_count(&[]), None);
    }

    #[test]
    fn flate_payload_round_trips() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let raster = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        match flate_rgb(&raster).unwrap() {
            EmbeddedImage::FlateRgb {
                bytes,
                width,
                height,
            } => {
                assert_eq!((width, height), (3, 2));
                let mut raw = Vec::new();
                ZlibDecoder::new(&bytes[..]).read_to_end(&mut raw).unwrap();
                assert_eq!(raw, raster.into_raw());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
