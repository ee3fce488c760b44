//! Display ⇄ source coordinate mapping and the zoomed display render.

use image::Rgba;
use rayon::prelude::*;

use crate::canvas::PixelSurface;
use crate::components::tools::MouseCoordinates;
use crate::error::Result;
use crate::util::constrain;

/// Dash length of the selection outline, in display pixels.
const DASH_LEN: u32 = 4;

/// The visible window onto the zoomed image, in display pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: u32,
    pub height: u32,
}

/// Owns the zoom factor and the viewport scroll position.
#[derive(Clone, Debug)]
pub struct CoordinateMapper {
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    viewport: Viewport,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(0.125, 32.0)
    }
}

impl CoordinateMapper {
    /// A mapper at zoom 1 whose `zoom_in`/`zoom_out` steps stay within
    /// `[min_zoom, max_zoom]`.
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            zoom: 1.0,
            min_zoom,
            max_zoom,
            viewport: Viewport::default(),
        }
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    pub fn source_coordinate(&self, display: f64) -> f64 {
        display / self.zoom
    }

    pub fn display_coordinate(&self, source: f64) -> f64 {
        source * self.zoom
    }

    /// Convert a position on the zoomed image into the coordinates tools see.
    pub fn to_source(&self, display_x: f64, display_y: f64) -> MouseCoordinates {
        MouseCoordinates::new(self.source_coordinate(display_x), self.source_coordinate(display_y))
    }

    /// Pixel size of the fully rendered display for a source of the given size.
    pub fn display_size(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.zoom).round() as u32).max(1);
        (scale(source_width), scale(source_height))
    }

    // ---- viewport -----------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Scroll the viewport, clamped to the zoomed image.
    pub fn set_scroll(&mut self, x: f64, y: f64, source_width: u32, source_height: u32) -> Result<()> {
        let (max_x, max_y) = self.scroll_limits(self.zoom, source_width, source_height);
        self.viewport.scroll_x = constrain(x, 0.0, max_x)?;
        self.viewport.scroll_y = constrain(y, 0.0, max_y)?;
        Ok(())
    }

    fn scroll_limits(&self, zoom: f64, source_width: u32, source_height: u32) -> (f64, f64) {
        (
            (source_width as f64 * zoom - self.viewport.width as f64).max(0.0),
            (source_height as f64 * zoom - self.viewport.height as f64).max(0.0),
        )
    }

    // ---- zoom ---------------------------------------------------------------

    /// Change the zoom so the display point `(anchor_x, anchor_y)` stays under
    /// the same viewport position. Non-positive zoom values are ignored.
    pub fn set_zoom_factor(
        &mut self,
        zoom: f64,
        anchor_x: f64,
        anchor_y: f64,
        source_width: u32,
        source_height: u32,
    ) -> Result<()> {
        if !(zoom > 0.0 && zoom.is_finite()) {
            log::warn!("CoordinateMapper: ignoring invalid zoom factor {}", zoom);
            return Ok(());
        }
        let old = self.zoom;

        let distance_x = anchor_x - self.viewport.scroll_x;
        let distance_y = anchor_y - self.viewport.scroll_y;
        let rescaled_x = anchor_x * zoom / old;
        let rescaled_y = anchor_y * zoom / old;
        let (max_x, max_y) = self.scroll_limits(zoom, source_width, source_height);

        self.viewport.scroll_x = constrain(rescaled_x - distance_x, 0.0, max_x)?;
        self.viewport.scroll_y = constrain(rescaled_y - distance_y, 0.0, max_y)?;
        self.zoom = zoom;
        log::debug!("zoom {} -> {}", old, zoom);
        Ok(())
    }

    /// Double the zoom unless that would pass the upper limit.
    pub fn zoom_in(&mut self, anchor: (f64, f64), source_width: u32, source_height: u32) -> Result<bool> {
        let next = self.zoom * 2.0;
        if next > self.max_zoom {
            return Ok(false);
        }
        self.set_zoom_factor(next, anchor.0, anchor.1, source_width, source_height)?;
        Ok(true)
    }

    /// Halve the zoom unless that would pass the lower limit.
    pub fn zoom_out(&mut self, anchor: (f64, f64), source_width: u32, source_height: u32) -> Result<bool> {
        let next = self.zoom * 0.5;
        if next < self.min_zoom {
            return Ok(false);
        }
        self.set_zoom_factor(next, anchor.0, anchor.1, source_width, source_height)?;
        Ok(true)
    }

    /// Back to zoom 1 with the viewport at the origin.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.viewport.scroll_x = 0.0;
        self.viewport.scroll_y = 0.0;
    }

    // ---- rendering ----------------------------------------------------------

    /// Scale the whole source to display size with nearest-neighbor sampling.
    pub fn render_display(&self, source: &PixelSurface) -> Result<PixelSurface> {
        let (w, h) = self.display_size(source.width(), source.height());
        scale_region(source, self.zoom, 0, 0, w, h)
    }

    /// Render only what the viewport shows. Falls back to the full display
    /// when no viewport size has been set.
    pub fn render_viewport(&self, source: &PixelSurface) -> Result<PixelSurface> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return self.render_display(source);
        }
        scale_region(
            source,
            self.zoom,
            self.viewport.scroll_x.floor() as i64,
            self.viewport.scroll_y.floor() as i64,
            self.viewport.width,
            self.viewport.height,
        )
    }
}

/// Nearest-neighbor scale of `source` into a `w × h` display tile whose
/// top-left sits at display position `(left, top)`. Display pixels that fall
/// outside the source come out transparent.
fn scale_region(source: &PixelSurface, zoom: f64, left: i64, top: i64, w: u32, h: u32) -> Result<PixelSurface> {
    let sw = source.width() as i64;
    let sh = source.height() as i64;
    // Sample at display pixel centres.
    let sample = |d: i64, limit: i64| -> Option<u32> {
        let s = ((d as f64 + 0.5) / zoom).floor() as i64;
        (0..limit).contains(&s).then_some(s as u32)
    };
    let x_lut: Vec<Option<u32>> = (0..w as i64).map(|dx| sample(left + dx, sw)).collect();

    let src = source.as_raw();
    let src_row = sw as usize * 4;
    let row_bytes = w as usize * 4;
    let mut buf = vec![0u8; row_bytes * h as usize];

    buf.par_chunks_mut(row_bytes).enumerate().for_each(|(dy, row)| {
        let Some(sy) = sample(top + dy as i64, sh) else {
            return;
        };
        let src_line = &src[sy as usize * src_row..(sy as usize + 1) * src_row];
        for (px, sx) in row.chunks_exact_mut(4).zip(x_lut.iter()) {
            if let Some(sx) = sx {
                let i = *sx as usize * 4;
                px.copy_from_slice(&src_line[i..i + 4]);
            }
        }
    });

    PixelSurface::from_raw_rgba(w, h, buf)
}

/// Draw a 1px dashed black/white rectangle outline. Coordinates are display
/// pixels, inclusive on both ends.
pub fn draw_dashed_outline(display: &mut PixelSurface, x0: i32, y0: i32, x1: i32, y1: i32) {
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    let dash = |i: u32| if (i / DASH_LEN) % 2 == 0 { BLACK } else { WHITE };

    let mut i = 0u32;
    for x in x0..=x1 {
        display.put_pixel(x, y0, dash(i));
        display.put_pixel(x, y1, dash(i));
        i += 1;
    }
    i = 0;
    for y in y0..=y1 {
        display.put_pixel(x0, y, dash(i));
        display.put_pixel(x1, y, dash(i));
        i += 1;
    }
}
