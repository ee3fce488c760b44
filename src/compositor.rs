//! Two-surface drawing model.
//!
//! Freehand tools write into the scratch surface at full strength while the
//! pointer is down; the committed image in the source surface is untouched
//! until [`Compositor::commit`] blends the scratch surface in once at the
//! configured opacity and clears it.

use image::Rgba;

use crate::canvas::{CompositeMode, PixelSurface};
use crate::ops::shapes;

pub struct Compositor {
    source: PixelSurface,
    scratch: PixelSurface,
    /// Whether anything has been drawn into scratch since the last commit/discard.
    pending: bool,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_surface(PixelSurface::new(width, height))
    }

    /// Take ownership of an existing image as the source surface.
    pub fn from_surface(source: PixelSurface) -> Self {
        let scratch = PixelSurface::new(source.width(), source.height());
        Self {
            source,
            scratch,
            pending: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.source.width()
    }

    pub fn height(&self) -> u32 {
        self.source.height()
    }

    pub fn source(&self) -> &PixelSurface {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut PixelSurface {
        &mut self.source
    }

    pub fn scratch(&self) -> &PixelSurface {
        &self.scratch
    }

    pub fn has_pending_stroke(&self) -> bool {
        self.pending
    }

    // ---- scratch rasterizers ------------------------------------------------

    /// Clear then fill a `size × size` square with its top-left at `(x, y)`.
    pub fn stamp_square(&mut self, x: i32, y: i32, size: u32, color: Rgba<u8>) {
        let size = size.max(1) as i32;
        self.scratch.clear_rect(x, y, size, size);
        self.scratch.fill_rect(x, y, size, size, color);
        self.pending = true;
    }

    /// Pencil/eraser segment: walk the Bresenham lattice between the two
    /// positions, shifted by half the square size, stamping a square at every
    /// lattice point so fast drags leave no gaps.
    pub fn pencil_segment(&mut self, from: (f64, f64), to: (f64, f64), size: u32, color: Rgba<u8>) {
        let size = size.max(1);
        let shift = size as f64 / 2.0;
        let lattice = |v: f64| (v - shift).floor() as i32;
        let (x0, y0) = (lattice(from.0), lattice(from.1));
        let (x1, y1) = (lattice(to.0), lattice(to.1));

        shapes::for_each_line_point(x0, y0, x1, y1, |x, y| {
            self.scratch.clear_rect(x, y, size as i32, size as i32);
            self.scratch.fill_rect(x, y, size as i32, size as i32, color);
        });
        self.pending = true;
    }

    /// Brush segment: a disc when both ends coincide, otherwise a round-capped
    /// line of width `size`.
    pub fn brush_segment(&mut self, from: (f64, f64), to: (f64, f64), size: u32, color: Rgba<u8>) {
        let diameter = size.max(1) as f32;
        let a = (from.0 as f32, from.1 as f32);
        let b = (to.0 as f32, to.1 as f32);
        if a == b {
            shapes::fill_disc(&mut self.scratch, a, diameter, color);
        } else {
            shapes::fill_capsule(&mut self.scratch, a, b, diameter, color);
        }
        self.pending = true;
    }

    // ---- commit / discard ---------------------------------------------------

    /// Blend the scratch surface onto the source surface once, then clear it.
    /// Returns whether the source changed; a zero-opacity stroke is dropped.
    pub fn commit(&mut self, mode: CompositeMode, opacity: f32) -> bool {
        if !self.pending {
            return false;
        }
        if opacity <= 0.0 {
            // Invisible stroke: nothing reaches the source.
            self.discard();
            return false;
        }
        self.source.composite(&self.scratch, mode, opacity);
        self.scratch.clear();
        self.pending = false;
        log::debug!("compositor: committed stroke ({:?}, opacity {:.2})", mode, opacity);
        true
    }

    /// Throw the in-progress stroke away without touching the source surface.
    pub fn discard(&mut self) {
        if self.pending {
            self.scratch.clear();
            self.pending = false;
        }
    }

    /// What the source would look like if the pending stroke were committed now.
    pub fn preview(&self, mode: CompositeMode, opacity: f32) -> PixelSurface {
        let mut out = self.source.clone();
        if self.pending {
            out.composite(&self.scratch, mode, opacity);
        }
        out
    }

    // ---- wholesale replacement ----------------------------------------------

    /// Replace the source surface (image load, undo/redo). Any pending stroke
    /// is dropped and the scratch surface is reallocated to match.
    pub fn replace_source(&mut self, source: PixelSurface) {
        if source.width() != self.scratch.width() || source.height() != self.scratch.height() {
            self.scratch = PixelSurface::new(source.width(), source.height());
        } else {
            self.scratch.clear();
        }
        self.source = source;
        self.pending = false;
    }

    /// Resize both surfaces, keeping the source's top-left content.
    pub fn resize(&mut self, width: u32, height: u32) {
        let mut resized = PixelSurface::new(width, height);
        resized.draw_surface(&self.source, 0, 0);
        self.replace_source(resized);
    }
}
