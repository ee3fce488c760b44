use image::Rgba;

use crate::canvas::PixelSurface;

/// Axis-aligned bounds of a fill, inclusive on all edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Result of a flood fill: how many pixels changed and where.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FillReport {
    pub filled: usize,
    pub bounds: Option<FillBounds>,
}

/// Per-channel match: every channel of `p` within `tol` of `reference`.
#[inline(always)]
fn matches(p: [u8; 4], reference: [u8; 4], tol: u8) -> bool {
    p.iter()
        .zip(reference.iter())
        .all(|(a, b)| a.abs_diff(*b) <= tol)
}

/// Recolor the 4-connected region around `(seed_x, seed_y)` whose pixels are
/// within `tolerance` of the seed's original color.
///
/// Each pixel is visited at most once (the visited mask bounds the work to
/// the surface size). Surface edges are hard boundaries. A seed outside the
/// surface, or a seed already holding exactly `fill`, changes nothing.
pub fn flood_fill(
    surface: &mut PixelSurface,
    seed_x: i32,
    seed_y: i32,
    fill: Rgba<u8>,
    tolerance: u8,
) -> FillReport {
    if !surface.contains(seed_x, seed_y) {
        return FillReport::default();
    }
    let reference = surface.get_pixel(seed_x, seed_y).0;
    if reference == fill.0 {
        return FillReport::default();
    }

    let w = surface.width();
    let h = surface.height();
    let wu = w as usize;
    let mut visited = vec![false; wu * h as usize];

    let (sx, sy) = (seed_x as u32, seed_y as u32);
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);

    // DFS stack of packed flat indices (y * width + x).
    let mut stack: Vec<usize> = Vec::with_capacity(4096);
    let seed_idx = sy as usize * wu + sx as usize;
    visited[seed_idx] = true;
    stack.push(seed_idx);
    let mut filled = 0usize;

    while let Some(idx) = stack.pop() {
        let x = (idx % wu) as u32;
        let y = (idx / wu) as u32;
        surface.put_pixel(x as i32, y as i32, fill);
        filled += 1;

        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        let mut try_push = |ni: usize, nx: u32, ny: u32| {
            if !visited[ni] && matches(surface.get_pixel(nx as i32, ny as i32).0, reference, tolerance) {
                visited[ni] = true;
                stack.push(ni);
            }
        };

        if x > 0 {
            try_push(idx - 1, x - 1, y);
        }
        if x + 1 < w {
            try_push(idx + 1, x + 1, y);
        }
        if y > 0 {
            try_push(idx - wu, x, y - 1);
        }
        if y + 1 < h {
            try_push(idx + wu, x, y + 1);
        }
    }

    FillReport {
        filled,
        bounds: Some(FillBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn fill_matching_seed_is_noop() {
        let mut s = PixelSurface::new(300, 150);
        s.fill_rect(0, 0, 300, 150, RED);
        let before = s.clone();
        for tol in [0u8, 10, 255] {
            let report = flood_fill(&mut s, 2, 2, RED, tol);
            assert_eq!(report.filled, 0);
            assert_eq!(s, before);
        }
    }

    #[test]
    fn fill_stays_inside_solid_rectangle() {
        let mut s = PixelSurface::new(40, 30);
        s.fill_rect(5, 5, 10, 8, BLACK);
        let report = flood_fill(&mut s, 7, 7, BLUE, 0);
        assert_eq!(report.filled, 80);
        assert_eq!(
            report.bounds,
            Some(FillBounds { min_x: 5, min_y: 5, max_x: 14, max_y: 12 })
        );
        for y in 0..30 {
            for x in 0..40 {
                let inside = (5..15).contains(&x) && (5..13).contains(&y);
                let expected = if inside { BLUE } else { TRANSPARENT };
                assert_eq!(s.get_pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn diagonal_neighbours_are_not_connected() {
        let mut s = PixelSurface::new(4, 4);
        s.put_pixel(0, 0, BLACK);
        s.put_pixel(1, 1, BLACK);
        flood_fill(&mut s, 0, 0, RED, 0);
        assert_eq!(s.get_pixel(0, 0), RED);
        assert_eq!(s.get_pixel(1, 1), BLACK);
    }

    #[test]
    fn tolerance_is_inclusive_per_channel() {
        let mut s = PixelSurface::new(3, 1);
        s.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        s.put_pixel(1, 0, Rgba([110, 90, 100, 255]));
        s.put_pixel(2, 0, Rgba([111, 100, 100, 255]));
        flood_fill(&mut s, 0, 0, RED, 10);
        assert_eq!(s.get_pixel(0, 0), RED);
        assert_eq!(s.get_pixel(1, 0), RED);
        assert_eq!(s.get_pixel(2, 0), Rgba([111, 100, 100, 255]));
    }

    #[test]
    fn tolerance_compares_against_seed_not_neighbour() {
        // A gradient where each step is within tolerance of its neighbour but
        // drifts beyond tolerance of the seed.
        let mut s = PixelSurface::new(5, 1);
        for x in 0..5 {
            s.put_pixel(x, 0, Rgba([(x * 4) as u8, 0, 0, 255]));
        }
        flood_fill(&mut s, 0, 0, BLUE, 5);
        assert_eq!(s.get_pixel(0, 0), BLUE);
        assert_eq!(s.get_pixel(1, 0), BLUE);
        assert_eq!(s.get_pixel(2, 0), Rgba([8, 0, 0, 255]));
    }

    #[test]
    fn whole_transparent_canvas_is_filled_once_per_pixel() {
        let mut s = PixelSurface::new(64, 48);
        let report = flood_fill(&mut s, 63, 47, RED, 0);
        assert_eq!(report.filled, 64 * 48);
        assert!(s.as_raw().chunks_exact(4).all(|p| p == RED.0));
    }

    #[test]
    fn seed_outside_surface_is_ignored() {
        let mut s = PixelSurface::new(4, 4);
        assert_eq!(flood_fill(&mut s, -1, 0, RED, 0).filled, 0);
        assert_eq!(flood_fill(&mut s, 0, 4, RED, 0).filled, 0);
        assert!(s.is_blank());
    }

    #[test]
    fn background_not_touched_when_filling_shapes() {
        let mut s = PixelSurface::new(300, 150);
        s.fill_rect(2, 2, 20, 20, BLACK);
        s.fill_rect(22, 10, 50, 5, BLACK);
        s.fill_rect(40, 15, 5, 50, BLACK);
        let mut expected = PixelSurface::new(300, 150);
        expected.fill_rect(2, 2, 20, 20, RED);
        expected.fill_rect(22, 10, 50, 5, RED);
        expected.fill_rect(40, 15, 5, 50, RED);

        flood_fill(&mut s, 5, 5, RED, 0);
        assert_eq!(s, expected);
    }
}
