use crate::canvas::CompositeMode;
use crate::components::colors::ColorPalette;
use crate::error::Result;

use super::{CursorPreview, CursorShape, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse};

/// Round brush: discs and round-capped segments of diameter `size`.
#[derive(Clone, Debug, Default)]
pub struct BrushTool {
    dragging: bool,
    last: (f64, f64),
}

impl BrushTool {
    fn draw_to(&mut self, ctx: &mut ToolContext<'_>, to: (f64, f64)) {
        let color = ctx.palette.selected_color().opaque();
        ctx.compositor.brush_segment(self.last, to, ctx.brush_size, color);
        self.last = to;
        ctx.request_redraw();
    }
}

impl Tool for BrushTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Brush
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = true;
        self.last = pos.as_tuple();
        self.draw_to(ctx, pos.as_tuple());
        Ok(ToolResponse::Redraw)
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        self.draw_to(ctx, pos.as_tuple());
        Ok(ToolResponse::Redraw)
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        self.dragging = false;
        let committed = ctx.compositor.commit(CompositeMode::Over, ctx.palette.opacity());
        ctx.request_redraw();
        Ok(if committed { ToolResponse::Committed } else { ToolResponse::Redraw })
    }

    fn on_pointer_leave(&mut self, ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        self.dragging = false;
        ctx.compositor.discard();
        ctx.request_redraw();
        Ok(ToolResponse::Redraw)
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> Result<ToolResponse> {
        if !self.dragging {
            return Ok(ToolResponse::None);
        }
        self.dragging = false;
        ctx.compositor.discard();
        ctx.request_redraw();
        Ok(ToolResponse::Redraw)
    }

    fn cursor_preview(
        &self,
        pos: MouseCoordinates,
        zoom: f64,
        _palette: &ColorPalette,
        size: u32,
    ) -> Option<CursorPreview> {
        let size = size.max(1) as f64;
        let shift = size / 2.0;
        Some(CursorPreview {
            left: (pos.source_x - shift) * zoom,
            top: (pos.source_y - shift) * zoom,
            width: size * zoom,
            height: size * zoom,
            shape: CursorShape::Circle,
            fill: None,
        })
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn stroke_mode(&self) -> Option<CompositeMode> {
        Some(CompositeMode::Over)
    }
}
