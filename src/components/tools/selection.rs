use crate::components::colors::ColorPalette;
use crate::components::selection::SelectionState;
use crate::error::Result;

use super::{CursorPreview, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse};

/// Rectangular select-and-move. Geometry and lifted pixels live in the shared
/// [`SelectionManager`](crate::components::selection::SelectionManager); the
/// tool routes pointer events into it and tracks whether a gesture is open.
#[derive(Clone, Debug, Default)]
pub struct SelectionTool {
    dragging: bool,
}

impl Tool for SelectionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Selection
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = true;
        if ctx.selection.hit_test(pos) {
            ctx.selection.begin_drag(pos);
            ctx.request_redraw();
            return Ok(ToolResponse::Redraw);
        }

        let blitted = ctx.selection.blit_back(ctx.compositor.source_mut());
        let (w, h) = (ctx.compositor.width(), ctx.compositor.height());
        ctx.selection.begin_drawing(pos, w, h)?;
        ctx.request_redraw();
        Ok(if blitted { ToolResponse::Committed } else { ToolResponse::Redraw })
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        match ctx.selection.state() {
            SelectionState::Drawing => {
                let (w, h) = (ctx.compositor.width(), ctx.compositor.height());
                ctx.selection.update_drawing(pos, w, h)?;
            }
            SelectionState::Dragging => ctx.selection.update_drag(pos),
            SelectionState::Empty | SelectionState::Selected => return Ok(ToolResponse::None),
        }
        ctx.request_redraw();
        Ok(ToolResponse::Redraw)
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        self.dragging = false;
        match ctx.selection.state() {
            SelectionState::Drawing => ctx.selection.finish_drawing(ctx.compositor.source_mut()),
            SelectionState::Dragging => ctx.selection.end_drag(),
            SelectionState::Empty | SelectionState::Selected => return Ok(ToolResponse::None),
        }
        ctx.request_redraw();
        Ok(ToolResponse::Redraw)
    }

    /// Leaving the canvas never ends a selection gesture; only pointer-up does.
    fn on_pointer_leave(&mut self, _ctx: &mut ToolContext<'_>, _pos: MouseCoordinates) -> Result<ToolResponse> {
        Ok(ToolResponse::None)
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> Result<ToolResponse> {
        self.dragging = false;
        let blitted = ctx.selection.tear_down(ctx.compositor.source_mut());
        ctx.request_redraw();
        Ok(if blitted { ToolResponse::Committed } else { ToolResponse::Redraw })
    }

    fn cursor_preview(
        &self,
        _pos: MouseCoordinates,
        _zoom: f64,
        _palette: &ColorPalette,
        _size: u32,
    ) -> Option<CursorPreview> {
        None
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }
}
