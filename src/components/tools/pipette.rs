use crate::components::colors::{Color, ColorPalette};
use crate::error::Result;

use super::{CursorPreview, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse, icon_cursor};

/// Color picker. Samples while the pointer is down and writes the color and
/// its alpha (as opacity) back into the palette.
#[derive(Clone, Debug, Default)]
pub struct PipetteTool {
    dragging: bool,
    picked: Option<(Color, f32)>,
}

impl PipetteTool {
    /// Last color sampled during the current or previous drag.
    pub fn picked(&self) -> Option<(Color, f32)> {
        self.picked
    }

    fn sample(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> ToolResponse {
        let (x, y) = pos.pixel();
        let source = ctx.compositor.source();
        if !source.contains(x, y) {
            return ToolResponse::None;
        }
        let pixel = source.get_pixel(x, y);
        let color = Color::from(pixel);
        let opacity = pixel[3] as f32 / 255.0;
        ctx.palette.set_selected_color(color, opacity);
        self.picked = Some((color, opacity));
        ToolResponse::ColorPicked { color, opacity }
    }
}

impl Tool for PipetteTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pipette
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = true;
        self.picked = None;
        Ok(self.sample(ctx, pos))
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        Ok(self.sample(ctx, pos))
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        self.dragging = false;
        Ok(match self.picked {
            Some((color, opacity)) => ToolResponse::ColorPicked { color, opacity },
            None => ToolResponse::None,
        })
    }

    fn on_pointer_leave(&mut self, _ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = false;
        Ok(ToolResponse::None)
    }

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>) -> Result<ToolResponse> {
        self.dragging = false;
        Ok(ToolResponse::None)
    }

    fn cursor_preview(
        &self,
        pos: MouseCoordinates,
        zoom: f64,
        _palette: &ColorPalette,
        _size: u32,
    ) -> Option<CursorPreview> {
        Some(icon_cursor(ToolKind::Pipette, pos, zoom))
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::test_support::{Harness, at};
    use image::Rgba;

    fn harness() -> Harness {
        let mut h = Harness::new(10, 10);
        let s = h.compositor.source_mut();
        s.put_pixel(1, 1, Rgba([255, 102, 0, 255]));
        s.put_pixel(2, 1, Rgba([0, 153, 255, 51]));
        h
    }

    #[test]
    fn down_samples_and_writes_back() {
        let mut h = harness();
        let mut pipette = PipetteTool::default();
        let r = h.with(|ctx| pipette.on_pointer_down(ctx, at(1.5, 1.5))).unwrap();
        let orange = Color::rgb(255, 102, 0);
        assert_eq!(r, ToolResponse::ColorPicked { color: orange, opacity: 1.0 });
        assert_eq!(h.palette.selected_color_with_opacity(), (orange, 1.0));
    }

    #[test]
    fn drag_follows_pointer_and_up_reports_last() {
        let mut h = harness();
        let mut pipette = PipetteTool::default();
        h.with(|ctx| pipette.on_pointer_down(ctx, at(1.0, 1.0))).unwrap();
        h.with(|ctx| pipette.on_pointer_move(ctx, at(2.0, 1.0))).unwrap();
        let r = h.with(|ctx| pipette.on_pointer_up(ctx, at(2.0, 1.0))).unwrap();
        let blue = Color::rgb(0, 153, 255);
        assert_eq!(r, ToolResponse::ColorPicked { color: blue, opacity: 0.2 });
        assert_eq!(h.palette.selected_color(), blue);
        assert_eq!(h.palette.opacity(), 0.2);
    }

    #[test]
    fn samples_beyond_canvas_are_ignored() {
        let mut h = harness();
        let mut pipette = PipetteTool::default();
        h.with(|ctx| pipette.on_pointer_down(ctx, at(1.0, 1.0))).unwrap();
        let r = h.with(|ctx| pipette.on_pointer_move(ctx, at(12.0, 1.0))).unwrap();
        assert_eq!(r, ToolResponse::None);
        assert_eq!(h.palette.selected_color(), Color::rgb(255, 102, 0));
    }

    #[test]
    fn transparent_pixel_sets_zero_opacity() {
        let mut h = harness();
        let mut pipette = PipetteTool::default();
        h.with(|ctx| pipette.on_pointer_down(ctx, at(5.0, 5.0))).unwrap();
        assert_eq!(h.palette.selected_color_with_opacity(), (Color::BLACK, 0.0));
    }

    #[test]
    fn move_without_down_does_not_sample() {
        let mut h = harness();
        let mut pipette = PipetteTool::default();
        let r = h.with(|ctx| pipette.on_pointer_move(ctx, at(1.0, 1.0))).unwrap();
        assert_eq!(r, ToolResponse::None);
        assert_eq!(pipette.picked(), None);
        assert_eq!(h.palette.selected_color(), Color::BLACK);
    }
}
