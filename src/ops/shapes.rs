//! Raster primitives the freehand tools stamp into the scratch surface.
//!
//! Everything here writes colors directly ("last write wins"); blending
//! happens later when the compositor commits the scratch layer.

use image::Rgba;

use crate::canvas::PixelSurface;

/// Visit every lattice point of the Bresenham line from `(x0, y0)` to
/// `(x1, y1)`, both endpoints included, in order from start to end.
pub fn for_each_line_point(x0: i32, y0: i32, x1: i32, y1: i32, mut visit: impl FnMut(i32, i32)) {
    let mut x = x0;
    let mut y = y0;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        visit(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Collect the Bresenham lattice points of a line.
pub fn line_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::with_capacity(((x1 - x0).abs().max((y1 - y0).abs()) + 1) as usize);
    for_each_line_point(x0, y0, x1, y1, |x, y| points.push((x, y)));
    points
}

/// Fill every pixel whose lattice position lies within `diameter / 2` of the
/// segment `a`–`b`. A zero-length segment degenerates to a disc, so this is
/// both the round-capped line and the circle stamp.
pub fn fill_capsule(
    surface: &mut PixelSurface,
    a: (f32, f32),
    b: (f32, f32),
    diameter: f32,
    color: Rgba<u8>,
) {
    let radius = (diameter / 2.0).max(0.5);
    let min_x = (a.0.min(b.0) - radius).floor() as i32;
    let max_x = (a.0.max(b.0) + radius).ceil() as i32;
    let min_y = (a.1.min(b.1) - radius).floor() as i32;
    let max_y = (a.1.max(b.1) + radius).ceil() as i32;

    // Clip the scan box to the surface so huge off-canvas strokes stay cheap.
    let min_x = min_x.max(0);
    let min_y = min_y.max(0);
    let max_x = max_x.min(surface.width() as i32 - 1);
    let max_y = max_y.min(surface.height() as i32 - 1);

    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if distance_sq_to_segment((x as f32, y as f32), a, b) <= r2 {
                surface.put_pixel(x, y, color);
            }
        }
    }
}

/// Fill a disc of the given diameter centred on `center`.
pub fn fill_disc(surface: &mut PixelSurface, center: (f32, f32), diameter: f32, color: Rgba<u8>) {
    fill_capsule(surface, center, center, diameter, color);
}

fn distance_sq_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.0 + abx * t - p.0;
    let cy = a.1 + aby * t - p.1;
    cx * cx + cy * cy
}
