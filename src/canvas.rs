use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Fully transparent black, returned for every out-of-range read.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ============================================================================
// PIXEL SURFACE
// ============================================================================

/// A width×height RGBA8 raster with straight (non-premultiplied) alpha.
///
/// Row-major, origin top-left. Reads outside the surface return
/// [`TRANSPARENT`] and writes outside it are dropped, so callers can feed raw
/// pointer positions straight through during fast drags.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelSurface {
    pixels: RgbaImage,
}

impl PixelSurface {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent surface. Zero dimensions are bumped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = Self::sanitize_dims(width, height);
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Create a surface with every pixel set to `color`.
    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let (width, height) = Self::sanitize_dims(width, height);
        Self {
            pixels: RgbaImage::from_pixel(width, height, color),
        }
    }

    /// Wrap a decoded image. An empty image becomes a 1×1 transparent surface.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        if image.width() == 0 || image.height() == 0 {
            log::warn!("PixelSurface: empty image replaced by 1x1 surface");
            return Self::new(1, 1);
        }
        Self { pixels: image }
    }

    /// Build a surface from a raw RGBA byte buffer of exactly `width * height * 4` bytes.
    pub fn from_raw_rgba(width: u32, height: u32, data: Vec<u8>) -> crate::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(crate::EngineError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        RgbaImage::from_raw(width, height, data)
            .map(|pixels| Self { pixels })
            .ok_or(crate::EngineError::BufferSize {
                expected,
                actual: 0,
            })
    }

    fn sanitize_dims(width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            log::warn!(
                "PixelSurface: dimensions {}x{} invalid, clamped to at least 1x1",
                width,
                height
            );
        }
        (width.max(1), height.max(1))
    }

    // ---- geometry -----------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether `(x, y)` addresses a pixel of this surface.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Intersect a rectangle with the surface bounds.
    /// Returns `(x0, y0, x1, y1)` with exclusive max edges, or `None` if empty.
    fn clip_rect(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(u32, u32, u32, u32)> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + w as i64).min(self.width() as i64);
        let y1 = (y as i64 + h as i64).min(self.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    // ---- pixel access -------------------------------------------------------

    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Rgba<u8> {
        if !self.contains(x, y) {
            return TRANSPARENT;
        }
        *self.pixels.get_pixel(x as u32, y as u32)
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, pixel: Rgba<u8>) {
        if !self.contains(x, y) {
            return;
        }
        self.pixels.put_pixel(x as u32, y as u32, pixel);
    }

    // ---- bulk operations ----------------------------------------------------

    /// Set every pixel of the rectangle (clipped to the surface) to `color`.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.put_pixel(px, py, color);
            }
        }
    }

    /// Make the rectangle (clipped to the surface) fully transparent.
    pub fn clear_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.fill_rect(x, y, w, h, TRANSPARENT);
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    /// True when every pixel has zero alpha.
    pub fn is_blank(&self) -> bool {
        self.pixels.as_raw().chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Copy a rectangle into a new surface of exactly `w × h`.
    /// Parts of the rectangle outside this surface come back transparent.
    pub fn copy_region(&self, x: i32, y: i32, w: u32, h: u32) -> PixelSurface {
        let mut out = PixelSurface::new(w, h);
        for ry in 0..out.height() as i32 {
            for rx in 0..out.width() as i32 {
                out.put_pixel(rx, ry, self.get_pixel(x + rx, y + ry));
            }
        }
        out
    }

    /// Draw `other` with its top-left at `(dst_x, dst_y)` using source-over
    /// blending at full opacity. Pixels falling outside this surface are dropped.
    pub fn draw_surface(&mut self, other: &PixelSurface, dst_x: i32, dst_y: i32) {
        let Some((x0, y0, x1, y1)) =
            self.clip_rect(dst_x, dst_y, other.width() as i32, other.height() as i32)
        else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let top = other.get_pixel(px as i32 - dst_x, py as i32 - dst_y);
                if top[3] == 0 {
                    continue;
                }
                let base = *self.pixels.get_pixel(px, py);
                self.pixels
                    .put_pixel(px, py, blend_pixel(base, top, CompositeMode::Over, 1.0));
            }
        }
    }

    /// Blend a same-sized surface onto this one, pixel for pixel.
    ///
    /// `opacity` scales the layer uniformly; rows are processed in parallel.
    /// Mismatched sizes blend only the overlapping top-left region.
    pub fn composite(&mut self, layer: &PixelSurface, mode: CompositeMode, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        if layer.width() != self.width() || layer.height() != self.height() {
            log::warn!(
                "PixelSurface::composite: size mismatch {}x{} onto {}x{}",
                layer.width(),
                layer.height(),
                self.width(),
                self.height()
            );
            for y in 0..self.height().min(layer.height()) as i32 {
                for x in 0..self.width().min(layer.width()) as i32 {
                    let top = layer.get_pixel(x, y);
                    if top[3] != 0 {
                        let base = self.get_pixel(x, y);
                        self.put_pixel(x, y, blend_pixel(base, top, mode, opacity));
                    }
                }
            }
            return;
        }

        let row_bytes = self.width() as usize * 4;
        let dst: &mut [u8] = &mut self.pixels;
        dst.par_chunks_mut(row_bytes)
            .zip(layer.pixels.as_raw().par_chunks(row_bytes))
            .for_each(|(dst_row, src_row)| {
                for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    if s[3] == 0 {
                        continue;
                    }
                    let out = blend_pixel(
                        Rgba([d[0], d[1], d[2], d[3]]),
                        Rgba([s[0], s[1], s[2], s[3]]),
                        mode,
                        opacity,
                    );
                    d.copy_from_slice(&out.0);
                }
            });
    }

    // ---- raw access ---------------------------------------------------------

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Overwrite every pixel from a raw buffer of matching length.
    /// Buffers of the wrong length are ignored.
    pub fn copy_from_raw(&mut self, data: &[u8]) {
        let dst: &mut [u8] = &mut self.pixels;
        if dst.len() == data.len() {
            dst.copy_from_slice(data);
        } else {
            log::error!(
                "PixelSurface::copy_from_raw: expected {} bytes, got {}",
                dst.len(),
                data.len()
            );
        }
    }
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// How a layer is blended onto a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Standard source-over alpha blending.
    #[default]
    Over,
    /// Destination alpha is reduced by the layer's alpha ("destination-out").
    Erase,
}

/// Blend `top` onto `base` with `top`'s alpha scaled by `opacity`.
///
/// Math runs in f32 on the 0..255 scale. Alpha truncates to 8 bits, which
/// gives the canvas byte sequence 255 → 127 → 63 for repeated 50% erases.
/// Color channels round to nearest.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: CompositeMode, opacity: f32) -> Rgba<u8> {
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    let src_a = top[3] as f32 * opacity.min(1.0);
    let dst_a = base[3] as f32;

    match mode {
        CompositeMode::Erase => {
            let out_a = dst_a * (255.0 - src_a) / 255.0;
            let a = quantize_alpha(out_a);
            if a == 0 {
                return TRANSPARENT;
            }
            Rgba([base[0], base[1], base[2], a])
        }
        CompositeMode::Over => {
            if src_a >= 255.0 {
                return Rgba([top[0], top[1], top[2], 255]);
            }
            let out_a = src_a + dst_a * (255.0 - src_a) / 255.0;
            let a = quantize_alpha(out_a);
            if a == 0 {
                return TRANSPARENT;
            }
            // Straight-alpha lerp: out = dst + (src - dst) * src_a / out_a
            let w = src_a / out_a;
            let mix = |d: u8, s: u8| -> u8 {
                let v = d as f32 + (s as f32 - d as f32) * w;
                v.round().clamp(0.0, 255.0) as u8
            };
            Rgba([mix(base[0], top[0]), mix(base[1], top[1]), mix(base[2], top[2]), a])
        }
    }
}

#[inline]
fn quantize_alpha(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn out_of_range_reads_are_transparent_and_writes_ignored() {
        let mut s = PixelSurface::new_filled(4, 3, RED);
        assert_eq!(s.get_pixel(-1, 0), TRANSPARENT);
        assert_eq!(s.get_pixel(4, 0), TRANSPARENT);
        assert_eq!(s.get_pixel(0, 3), TRANSPARENT);

        let before = s.clone();
        s.put_pixel(-1, -1, TRANSPARENT);
        s.put_pixel(4, 2, TRANSPARENT);
        assert_eq!(s, before);
    }

    #[test]
    fn zero_dimensions_become_one_pixel() {
        let s = PixelSurface::new(0, 5);
        assert_eq!((s.width(), s.height()), (1, 5));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut s = PixelSurface::new(5, 5);
        s.fill_rect(3, 3, 10, 10, RED);
        assert_eq!(s.get_pixel(2, 2), TRANSPARENT);
        assert_eq!(s.get_pixel(3, 3), RED);
        assert_eq!(s.get_pixel(4, 4), RED);

        s.fill_rect(-5, -5, 6, 6, RED);
        assert_eq!(s.get_pixel(0, 0), RED);
        assert_eq!(s.get_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn clear_rect_makes_region_transparent() {
        let mut s = PixelSurface::new_filled(6, 6, RED);
        s.clear_rect(1, 1, 2, 2);
        assert_eq!(s.get_pixel(1, 1), TRANSPARENT);
        assert_eq!(s.get_pixel(2, 2), TRANSPARENT);
        assert_eq!(s.get_pixel(3, 3), RED);
        assert_eq!(s.get_pixel(0, 0), RED);
    }

    #[test]
    fn raw_buffer_length_is_checked() {
        assert!(PixelSurface::from_raw_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(PixelSurface::from_raw_rgba(2, 2, vec![0; 15]).is_err());
        assert!(PixelSurface::from_raw_rgba(0, 2, vec![]).is_err());
    }

    #[test]
    fn copy_region_pads_with_transparent() {
        let s = PixelSurface::new_filled(3, 3, RED);
        let r = s.copy_region(2, 2, 2, 2);
        assert_eq!(r.get_pixel(0, 0), RED);
        assert_eq!(r.get_pixel(1, 0), TRANSPARENT);
        assert_eq!(r.get_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn over_at_half_opacity_accumulates() {
        let first = blend_pixel(TRANSPARENT, RED, CompositeMode::Over, 0.5);
        assert_eq!(first, Rgba([255, 0, 0, 127]));
        let second = blend_pixel(first, RED, CompositeMode::Over, 0.5);
        assert_eq!(second, Rgba([255, 0, 0, 191]));
    }

    #[test]
    fn erase_halves_alpha_with_truncation() {
        let once = blend_pixel(RED, RED, CompositeMode::Erase, 0.5);
        assert_eq!(once[3], 127);
        let twice = blend_pixel(once, RED, CompositeMode::Erase, 0.5);
        assert_eq!(twice[3], 63);
        let quarter = blend_pixel(RED, RED, CompositeMode::Erase, 0.25);
        assert_eq!(quarter[3], 191);
        assert_eq!(blend_pixel(RED, RED, CompositeMode::Erase, 1.0), TRANSPARENT);
    }

    #[test]
    fn transparent_top_leaves_base() {
        let base = Rgba([1, 2, 3, 4]);
        assert_eq!(blend_pixel(base, TRANSPARENT, CompositeMode::Over, 1.0), base);
        assert_eq!(blend_pixel(base, TRANSPARENT, CompositeMode::Erase, 1.0), base);
    }

    #[test]
    fn composite_blends_only_painted_pixels() {
        let mut base = PixelSurface::new_filled(3, 2, Rgba([0, 0, 255, 255]));
        let mut layer = PixelSurface::new(3, 2);
        layer.put_pixel(1, 1, RED);
        base.composite(&layer, CompositeMode::Over, 1.0);
        assert_eq!(base.get_pixel(1, 1), RED);
        assert_eq!(base.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn draw_surface_clips_at_edges() {
        let mut base = PixelSurface::new(4, 4);
        let patch = PixelSurface::new_filled(2, 2, RED);
        base.draw_surface(&patch, 3, 3);
        assert_eq!(base.get_pixel(3, 3), RED);
        assert_eq!(base.get_pixel(2, 2), TRANSPARENT);
        base.draw_surface(&patch, -1, -1);
        assert_eq!(base.get_pixel(0, 0), RED);
        assert_eq!(base.get_pixel(1, 1), TRANSPARENT);
    }
}
