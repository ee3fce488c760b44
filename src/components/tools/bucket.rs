use crate::components::colors::ColorPalette;
use crate::error::Result;
use crate::ops::flood_fill::flood_fill;

use super::{CursorPreview, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse, icon_cursor};

/// Exact-match flood fill with the selected color at the palette opacity.
#[derive(Clone, Debug, Default)]
pub struct BucketTool {
    dragging: bool,
}

impl Tool for BucketTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Bucket
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = true;
        let (x, y) = pos.pixel();
        let source = ctx.compositor.source_mut();
        if !source.contains(x, y) {
            return Ok(ToolResponse::None);
        }

        let (color, opacity) = ctx.palette.selected_color_with_opacity();
        let fill = color.to_rgba(opacity);
        if source.get_pixel(x, y) == fill {
            return Ok(ToolResponse::None);
        }

        let report = flood_fill(source, x, y, fill, 0);
        log::debug!("bucket: filled {} pixels from ({}, {})", report.filled, x, y);
        ctx.request_redraw();
        Ok(ToolResponse::Committed)
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        Ok(ToolResponse::None)
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = false;
        Ok(ToolResponse::None)
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
        Some(icon_cursor(ToolKind::Bucket, pos, zoom))
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }
}
