use crate::canvas::CompositeMode;
use crate::components::colors::ColorPalette;
use crate::error::Result;

use super::{CursorPreview, CursorShape, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse};

/// Pencil and eraser share one implementation; only the commit mode differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PencilKind {
    Pencil,
    Eraser,
}

/// Hard-edged square stamps along a Bresenham line.
#[derive(Clone, Debug)]
pub struct PencilTool {
    kind: PencilKind,
    dragging: bool,
    last: (f64, f64),
}

impl PencilTool {
    pub fn new(kind: PencilKind) -> Self {
        Self {
            kind,
            dragging: false,
            last: (0.0, 0.0),
        }
    }

    fn mode(&self) -> CompositeMode {
        match self.kind {
            PencilKind::Pencil => CompositeMode::Over,
            PencilKind::Eraser => CompositeMode::Erase,
        }
    }

    fn draw_to(&mut self, ctx: &mut ToolContext<'_>, to: (f64, f64)) {
        let color = ctx.palette.selected_color().opaque();
        ctx.compositor.pencil_segment(self.last, to, ctx.brush_size, color);
        self.last = to;
        ctx.request_redraw();
    }
}

impl Tool for PencilTool {
    fn kind(&self) -> ToolKind {
        match self.kind {
            PencilKind::Pencil => ToolKind::Pencil,
            PencilKind::Eraser => ToolKind::Eraser,
        }
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
        let committed = ctx.compositor.commit(self.mode(), ctx.palette.opacity());
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
        if self.dragging {
            self.dragging = false;
            ctx.compositor.discard();
            ctx.request_redraw();
            return Ok(ToolResponse::Redraw);
        }
        Ok(ToolResponse::None)
    }

    fn cursor_preview(
        &self,
        pos: MouseCoordinates,
        zoom: f64,
        palette: &ColorPalette,
        size: u32,
    ) -> Option<CursorPreview> {
        let size = size.max(1) as f64;
        let shift = size / 2.0;
        let fill = match self.kind {
            PencilKind::Pencil => Some(palette.selected_color()),
            PencilKind::Eraser => None,
        };
        Some(CursorPreview {
            left: (pos.source_x - shift).floor() * zoom,
            top: (pos.source_y - shift).floor() * zoom,
            width: size * zoom,
            height: size * zoom,
            shape: CursorShape::Square,
            fill,
        })
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn stroke_mode(&self) -> Option<CompositeMode> {
        Some(self.mode())
    }
}
