//! Minimal image-only PDF writer on top of `lopdf`.
//!
//! Each page holds exactly one image XObject drawn with a single `cm`/`Do`
//! pair. The page tree is flat: one `/Pages` node whose `Kids` lists every
//! page in insertion order, so page order in the file is exactly append
//! order.

use crate::pipeline::layout::PageSpec;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

/// Encoded pixel data ready to become an image XObject.
#[derive(Debug)]
pub enum EmbeddedImage {
    /// A complete baseline or progressive JPEG file (`/DCTDecode`).
    Jpeg { bytes: Vec<u8>, width: u32, height: u32 },
    /// zlib-compressed 8-bit RGB samples (`/FlateDecode`).
    FlateRgb { bytes: Vec<u8>, width: u32, height: u32 },
}

impl EmbeddedImage {
    fn into_stream(self) -> Stream {
        let (filter, bytes, width, height) = match self {
            EmbeddedImage::Jpeg {
                bytes,
                width,
                height,
            } => ("DCTDecode", bytes, width, height),
            EmbeddedImage::FlateRgb {
                bytes,
                width,
                height,
            } => ("FlateDecode", bytes, width, height),
        };

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => filter,
        };
        // Already compressed; keep lopdf from touching the payload.
        Stream::new(dict, bytes).with_compression(false)
    }
}

/// Append-only PDF under construction.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append one page sized and filled according to `spec`.
    pub fn add_page(&mut self, spec: &PageSpec, image: EmbeddedImage) -> Result<(), lopdf::Error> {
        let image_id = self.doc.add_object(image.into_stream());

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(spec.draw_width),
                        Object::Integer(0),
                        Object::Integer(0),
                        real(spec.draw_height),
                        real(spec.draw_x),
                        real(spec.draw_y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(spec.canvas_width.round() as i64),
                Object::Integer(spec.canvas_height.round() as i64),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Close the page tree, attach metadata and serialise the document.
    ///
    /// Consumes the builder: a document is written at most once.
    pub fn finish<W: Write>(mut self, title: Option<&str>, out: &mut W) -> Result<(), lopdf::Error> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => Object::Integer(count),
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => text_string(concat!("album2pdf ", env!("CARGO_PKG_VERSION"))),
        };
        if let Some(t) = title.filter(|t| !t.trim().is_empty()) {
            info.set("Title", text_string(t));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        self.doc.save_to(out)?;
        Ok(())
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::layout;

    fn tiny_flate(width: u32, height: u32) -> EmbeddedImage {
        use flate2::{write::ZlibEncoder, Compression};
        let raw = vec![200u8; (width * height * 3) as usize];
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw).unwrap();
        EmbeddedImage::FlateRgb {
            bytes: enc.finish().unwrap(),
            width,
            height,
        }
    }

    #[test]
    fn pages_keep_append_order_and_size() {
        let mut b = PdfBuilder::new();
        b.add_page(&layout(10, 20), tiny_flate(10, 20)).unwrap();
        b.add_page(&layout(30, 10), tiny_flate(30, 10)).unwrap();
        assert_eq!(b.page_count(), 2);

        let mut buf = Vec::new();
        b.finish(Some("Test Album"), &mut buf).unwrap();
        assert!(buf.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&buf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let media = |n: u32| -> Vec<i64> {
            let page = doc.get_dictionary(pages[&n]).unwrap();
            page.get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_i64().unwrap())
                .collect()
        };
        assert_eq!(media(1), vec![0, 0, 595, 842]);
        assert_eq!(media(2), vec![0, 0, 842, 595]);
    }

    #[test]
    fn non_ascii_title_is_utf16() {
        match text_string("漫画") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(bytes.len(), 2 + 4);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            text_string("plain"),
            Object::String(_, StringFormat::Literal)
        ));
    }
}
