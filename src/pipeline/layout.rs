//! Page geometry: fit an image of known pixel size onto an A4 page.
//!
//! Pixels are mapped 1:1 to PDF points, so an image that already fits on the
//! page is drawn at its natural size and centred. Larger images are shrunk
//! uniformly until both edges fit; nothing is ever enlarged.

use serde::{Deserialize, Serialize};

/// A4 short edge in points.
pub const A4_SHORT_PT: f64 = 595.0;
/// A4 long edge in points.
pub const A4_LONG_PT: f64 = 842.0;

/// Page orientation chosen from the image aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Where and how large one image is drawn on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub orientation: Orientation,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub draw_x: f64,
    pub draw_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl PageSpec {
    /// Uniform scale factor that was applied to the source pixels.
    pub fn scale(&self, pixel_width: u32) -> f64 {
        if pixel_width == 0 {
            1.0
        } else {
            self.draw_width / f64::from(pixel_width)
        }
    }
}

/// Compute the page placement for an image of `pixel_width` × `pixel_height`.
///
/// Portrait only when strictly taller than wide; square images go landscape.
pub fn layout(pixel_width: u32, pixel_height: u32) -> PageSpec {
    let orientation = if pixel_height > pixel_width {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    };

    let (canvas_width, canvas_height) = match orientation {
        Orientation::Portrait => (A4_SHORT_PT, A4_LONG_PT),
        Orientation::Landscape => (A4_LONG_PT, A4_SHORT_PT),
    };

    let w = f64::from(pixel_width);
    let h = f64::from(pixel_height);
    let scale = (canvas_width / w).min(canvas_height / h).min(1.0);

    let draw_width = w * scale;
    let draw_height = h * scale;

    PageSpec {
        orientation,
        canvas_width,
        canvas_height,
        draw_x: (canvas_width - draw_width) / 2.0,
        draw_y: (canvas_height - draw_height) / 2.0,
        draw_width,
        draw_height,
    }
}
