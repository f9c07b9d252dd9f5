//! Colour normalisation: any decoded image → opaque 8-bit RGB.
//!
//! PDF image XObjects without an `SMask` cannot carry transparency, and a
//! printed page has a white background, so alpha is flattened onto white
//! rather than dropped (which would turn transparent regions black).
//! Palette images arrive here already expanded to RGB/RGBA by the decoder.

use image::{DynamicImage, Rgb, RgbImage};

/// The page-ready raster plus whether any conversion was needed.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub raster: RgbImage,
    /// `true` when the source was not already 8-bit RGB.
    pub converted: bool,
}

/// Flatten `img` onto white (if it has alpha) and convert it to RGB8.
pub fn normalize(img: DynamicImage) -> NormalizedImage {
    let color = img.color();

    if color.has_alpha() {
        return NormalizedImage {
            raster: composite_on_white(&img),
            converted: true,
        };
    }

    match img {
        DynamicImage::ImageRgb8(raster) => NormalizedImage {
            raster,
            converted: false,
        },
        other => NormalizedImage {
            raster: other.to_rgb8(),
            converted: true,
        },
    }
}

fn composite_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);

    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = u16::from(a);
        let blend = |c: u8| -> u8 {
            // c*a + 255*(255-a), rounded, divided by 255
            ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8
        };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    out
}
