use crate::canvas::PixelSurface;
use crate::components::tools::MouseCoordinates;
use crate::error::Result;
use crate::util::constrain;

/// Lifecycle of the floating rectangular selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Empty,
    /// Pointer down, rectangle follows the pointer.
    Drawing,
    /// Contents lifted out of the source and floating at `rect`.
    Selected,
    /// Floating contents being moved by the pointer.
    Dragging,
}

/// Axis-aligned rectangle in source pixels. Width and height are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for SelectionRect {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }
}

impl SelectionRect {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Strictly inside: a point on any edge is outside.
    pub fn contains_strict(&self, px: f64, py: f64) -> bool {
        px > self.x as f64 && px < self.right() as f64 && py > self.y as f64 && py < self.bottom() as f64
    }
}

/// Owns the one floating selection: geometry, lifted pixels and drag state.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    state: SelectionState,
    rect: SelectionRect,
    content: Option<PixelSurface>,
    /// Anchor corner fixed at pointer-down while drawing.
    origin: (i32, i32),
    /// Rectangle position when the current drag started.
    before_drag: (i32, i32),
    /// Pointer position when the current drag started.
    drag_start: (f64, f64),
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn rect(&self) -> SelectionRect {
        self.rect
    }

    /// Lifted pixels, present while floating.
    pub fn content(&self) -> Option<&PixelSurface> {
        self.content.as_ref()
    }

    pub fn is_floating(&self) -> bool {
        self.content.is_some()
    }

    /// True while a rectangle (drawn or floating) should be shown.
    pub fn is_visible(&self) -> bool {
        self.state != SelectionState::Empty
    }

    /// Hit test against the floating rectangle, strict on all four edges.
    pub fn hit_test(&self, pos: MouseCoordinates) -> bool {
        matches!(self.state, SelectionState::Selected | SelectionState::Dragging)
            && self.rect.contains_strict(pos.source_x, pos.source_y)
    }

    // ---- drawing ------------------------------------------------------------

    /// Start a new 1×1 rectangle at the pointer, pulled onto the nearest
    /// surface pixel. Any floating content must have been blitted back first;
    /// it is dropped otherwise.
    pub fn begin_drawing(&mut self, pos: MouseCoordinates, surface_width: u32, surface_height: u32) -> Result<()> {
        if self.content.take().is_some() {
            log::warn!("selection: floating content dropped by a new selection");
        }
        let max_x = surface_width.saturating_sub(1) as f64;
        let max_y = surface_height.saturating_sub(1) as f64;
        let origin = (
            constrain(pos.source_x.floor(), 0.0, max_x)? as i32,
            constrain(pos.source_y.floor(), 0.0, max_y)? as i32,
        );
        self.origin = origin;
        self.set_geometry(origin.0, origin.1, 1, 1);
        self.state = SelectionState::Drawing;
        Ok(())
    }

    /// Grow the rectangle toward the pointer, clamped to the surface.
    pub fn update_drawing(&mut self, pos: MouseCoordinates, surface_width: u32, surface_height: u32) -> Result<()> {
        if self.state != SelectionState::Drawing {
            return Ok(());
        }
        let sx = constrain(pos.source_x.floor(), 0.0, surface_width as f64)? as i32;
        let sy = constrain(pos.source_y.floor(), 0.0, surface_height as f64)? as i32;
        let (ox, oy) = self.origin;
        self.set_geometry(
            sx.min(ox),
            sy.min(oy),
            sx.abs_diff(ox),
            sy.abs_diff(oy),
        );
        Ok(())
    }

    /// Lift the rectangle's pixels out of `source`, leaving transparency
    /// behind, and start floating.
    pub fn finish_drawing(&mut self, source: &mut PixelSurface) {
        if self.state != SelectionState::Drawing {
            return;
        }
        let r = self.rect;
        self.content = Some(source.copy_region(r.x, r.y, r.width, r.height));
        source.clear_rect(r.x, r.y, r.width as i32, r.height as i32);
        self.state = SelectionState::Selected;
        log::debug!("selection: lifted {}x{} at ({}, {})", r.width, r.height, r.x, r.y);
    }

    // ---- dragging -----------------------------------------------------------

    pub fn begin_drag(&mut self, pos: MouseCoordinates) {
        if self.state != SelectionState::Selected {
            return;
        }
        self.drag_start = (pos.source_x, pos.source_y);
        self.state = SelectionState::Dragging;
    }

    /// Move the floating rectangle by the whole-pixel pointer delta.
    pub fn update_drag(&mut self, pos: MouseCoordinates) {
        if self.state != SelectionState::Dragging {
            return;
        }
        let dx = (pos.source_x - self.drag_start.0).floor() as i32;
        let dy = (pos.source_y - self.drag_start.1).floor() as i32;
        self.rect.x = self.before_drag.0 + dx;
        self.rect.y = self.before_drag.1 + dy;
    }

    pub fn end_drag(&mut self) {
        if self.state != SelectionState::Dragging {
            return;
        }
        self.before_drag = (self.rect.x, self.rect.y);
        self.state = SelectionState::Selected;
    }

    /// Place the rectangle at a rounded position without touching its contents.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.rect.x = x.round() as i32;
        self.rect.y = y.round() as i32;
        self.before_drag = (self.rect.x, self.rect.y);
    }

    // ---- commit -------------------------------------------------------------

    /// Draw floating content back onto `source` at its current position and
    /// clear the selection. Returns whether anything was blitted.
    pub fn blit_back(&mut self, source: &mut PixelSurface) -> bool {
        let Some(content) = self.content.take() else {
            return false;
        };
        source.draw_surface(&content, self.rect.x, self.rect.y);
        self.state = SelectionState::Empty;
        log::debug!("selection: blitted back at ({}, {})", self.rect.x, self.rect.y);
        true
    }

    /// Blit back anything floating, then forget the selection entirely.
    pub fn tear_down(&mut self, source: &mut PixelSurface) -> bool {
        let blitted = self.blit_back(source);
        self.reset();
        blitted
    }

    /// Drop the selection and any floating content without blitting.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_geometry(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.rect = SelectionRect {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        };
        self.before_drag = (x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn at(x: f64, y: f64) -> MouseCoordinates {
        MouseCoordinates::new(x, y)
    }

    fn red_square_canvas() -> PixelSurface {
        let mut s = PixelSurface::new(100, 100);
        s.fill_rect(20, 20, 20, 20, RED);
        s
    }

    fn rect(x: i32, y: i32, width: u32, height: u32) -> SelectionRect {
        SelectionRect { x, y, width, height }
    }

    #[test]
    fn drawing_clamps_to_surface_edges() {
        let mut m = SelectionManager::new();
        m.begin_drawing(at(30.0, 10.0), 100, 100).unwrap();
        assert_eq!(m.state(), SelectionState::Drawing);
        assert_eq!(m.rect(), rect(30, 10, 1, 1));

        m.update_drawing(at(101.0, 101.0), 100, 100).unwrap();
        assert_eq!(m.rect(), rect(30, 10, 70, 90));

        m.update_drawing(at(-10.0, -10.0), 100, 100).unwrap();
        assert_eq!(m.rect(), rect(0, 0, 30, 10));

        m.update_drawing(at(60.0, 40.0), 100, 100).unwrap();
        assert_eq!(m.rect(), rect(30, 10, 30, 30));
    }

    #[test]
    fn press_beyond_surface_anchors_on_nearest_pixel() {
        let mut m = SelectionManager::new();
        m.begin_drawing(at(-8.0, 25.0), 20, 20).unwrap();
        assert_eq!(m.rect(), rect(0, 19, 1, 1));

        let mut source = PixelSurface::new_filled(20, 20, RED);
        m.finish_drawing(&mut source);
        assert_eq!(m.content().map(|c| c.get_pixel(0, 0)), Some(RED));
        assert_eq!(source.get_pixel(0, 19), TRANSPARENT);

        m.reset();
        m.begin_drawing(at(3.0, 0.5), 3, 3).unwrap();
        assert_eq!(m.rect(), rect(2, 0, 1, 1));
    }

    #[test]
    fn zero_extent_becomes_one_pixel() {
        let mut m = SelectionManager::new();
        m.begin_drawing(at(5.5, 5.5), 10, 10).unwrap();
        m.update_drawing(at(5.9, 5.2), 10, 10).unwrap();
        assert_eq!(m.rect(), rect(5, 5, 1, 1));
    }

    #[test]
    fn finish_lifts_pixels_and_clears_source() {
        let mut source = red_square_canvas();
        let mut m = SelectionManager::new();
        m.begin_drawing(at(30.0, 10.0), 100, 100).unwrap();
        m.update_drawing(at(60.0, 40.0), 100, 100).unwrap();
        m.finish_drawing(&mut source);
        assert_eq!(m.state(), SelectionState::Selected);

        let mut expected_content = PixelSurface::new(30, 30);
        expected_content.fill_rect(0, 10, 10, 20, RED);
        assert_eq!(m.content(), Some(&expected_content));

        let mut expected_source = red_square_canvas();
        expected_source.clear_rect(30, 10, 30, 30);
        assert_eq!(source, expected_source);
    }

    #[test]
    fn tear_down_blits_at_moved_position() {
        let mut source = red_square_canvas();
        let mut m = SelectionManager::new();
        m.begin_drawing(at(30.0, 10.0), 100, 100).unwrap();
        m.update_drawing(at(60.0, 40.0), 100, 100).unwrap();
        m.finish_drawing(&mut source);

        m.set_position(5.0, 5.0);
        assert!(m.tear_down(&mut source));
        assert_eq!(m.state(), SelectionState::Empty);
        assert!(!m.is_floating());

        let mut expected = red_square_canvas();
        expected.clear_rect(30, 10, 30, 30);
        expected.fill_rect(5, 15, 10, 20, RED);
        assert_eq!(source, expected);
    }

    #[test]
    fn hit_test_is_strict() {
        let mut source = PixelSurface::new(50, 50);
        let mut m = SelectionManager::new();
        assert!(!m.hit_test(at(1.0, 1.0)));
        m.begin_drawing(at(10.0, 10.0), 50, 50).unwrap();
        m.update_drawing(at(20.0, 20.0), 50, 50).unwrap();
        // Not floating yet.
        assert!(!m.hit_test(at(15.0, 15.0)));
        m.finish_drawing(&mut source);

        assert!(m.hit_test(at(15.0, 15.0)));
        assert!(m.hit_test(at(10.01, 19.99)));
        assert!(!m.hit_test(at(10.0, 15.0)));
        assert!(!m.hit_test(at(20.0, 15.0)));
        assert!(!m.hit_test(at(15.0, 10.0)));
        assert!(!m.hit_test(at(15.0, 20.0)));
    }

    #[test]
    fn drag_moves_by_floored_delta() {
        let mut source = PixelSurface::new(50, 50);
        let mut m = SelectionManager::new();
        m.begin_drawing(at(10.0, 10.0), 50, 50).unwrap();
        m.update_drawing(at(20.0, 20.0), 50, 50).unwrap();
        m.finish_drawing(&mut source);

        m.begin_drag(at(12.0, 12.0));
        assert_eq!(m.state(), SelectionState::Dragging);
        m.update_drag(at(15.7, 9.2));
        assert_eq!((m.rect().x, m.rect().y), (13, 7));
        m.end_drag();
        assert_eq!(m.state(), SelectionState::Selected);

        // A second drag starts from where the first ended.
        m.begin_drag(at(14.0, 14.0));
        m.update_drag(at(16.0, 14.0));
        m.end_drag();
        assert_eq!((m.rect().x, m.rect().y), (15, 7));
        assert_eq!((m.rect().width, m.rect().height), (10, 10));
    }

    #[test]
    fn blit_back_uses_source_over() {
        let mut source = PixelSurface::new(4, 4);
        source.put_pixel(0, 0, RED);
        let mut m = SelectionManager::new();
        m.begin_drawing(at(2.0, 2.0), 4, 4).unwrap();
        m.update_drawing(at(4.0, 4.0), 4, 4).unwrap();
        m.finish_drawing(&mut source);
        m.set_position(0.0, 0.0);
        assert!(m.blit_back(&mut source));
        // Transparent lifted pixels leave what was underneath.
        assert_eq!(source.get_pixel(0, 0), RED);
        assert_eq!(source.get_pixel(3, 3), TRANSPARENT);
        assert!(!m.blit_back(&mut source));
    }

    #[test]
    fn reset_discards_without_blitting() {
        let mut source = red_square_canvas();
        let mut m = SelectionManager::new();
        m.begin_drawing(at(20.0, 20.0), 100, 100).unwrap();
        m.update_drawing(at(40.0, 40.0), 100, 100).unwrap();
        m.finish_drawing(&mut source);
        m.reset();
        assert!(source.is_blank());
        assert_eq!(m.state(), SelectionState::Empty);
        assert_eq!(m.rect(), SelectionRect::default());
    }
}
