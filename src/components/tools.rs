//! Pointer-driven tools.
//!
//! Every tool follows the same Idle → Dragging → Idle cycle and is driven
//! through the [`Tool`] trait. Tools only touch what [`ToolContext`] lends
//! them; history is the session's business and is triggered by a
//! [`ToolResponse::Committed`] result.

pub mod brush;
pub mod bucket;
pub mod pencil;
pub mod pipette;
pub mod selection;

use serde::{Deserialize, Serialize};

use crate::canvas::CompositeMode;
use crate::components::colors::{Color, ColorPalette};
use crate::components::selection::SelectionManager;
use crate::compositor::Compositor;
use crate::error::Result;

pub use brush::BrushTool;
pub use bucket::BucketTool;
pub use pencil::{PencilKind, PencilTool};
pub use pipette::PipetteTool;
pub use selection::SelectionTool;

/// Edge length of the bucket/pipette cursor icons, in display pixels.
pub const ICON_CURSOR_SIZE: f64 = 16.0;

// ============================================================================
// SHARED TYPES
// ============================================================================

/// Pointer position in source-surface coordinates. Tools never see display
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MouseCoordinates {
    pub source_x: f64,
    pub source_y: f64,
}

impl MouseCoordinates {
    pub fn new(source_x: f64, source_y: f64) -> Self {
        Self { source_x, source_y }
    }

    /// The pixel under the pointer.
    pub fn pixel(&self) -> (i32, i32) {
        (self.source_x.floor() as i32, self.source_y.floor() as i32)
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.source_x, self.source_y)
    }
}

/// Identifies a tool without carrying its state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Pencil,
    Eraser,
    Brush,
    Bucket,
    Pipette,
    Selection,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Pencil => "Pencil",
            ToolKind::Eraser => "Eraser",
            ToolKind::Brush => "Brush",
            ToolKind::Bucket => "Bucket",
            ToolKind::Pipette => "Pipette",
            ToolKind::Selection => "Selection",
        }
    }

    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Pencil,
            ToolKind::Eraser,
            ToolKind::Brush,
            ToolKind::Bucket,
            ToolKind::Pipette,
            ToolKind::Selection,
        ]
    }
}

/// What a pointer event did, as far as the session is concerned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolResponse {
    /// Nothing changed.
    None,
    /// The display is stale but nothing was committed.
    Redraw,
    /// The source surface changed at an edit boundary.
    Committed,
    /// The pipette wrote a color back to the palette.
    ColorPicked { color: Color, opacity: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorShape {
    Square,
    Circle,
    Icon(ToolKind),
}

/// Cursor overlay in display pixels, relative to the rendered image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorPreview {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub shape: CursorShape,
    /// Swatch shown inside the outline, if any.
    pub fill: Option<Color>,
}

// ============================================================================
// TOOL CONTEXT
// ============================================================================

/// Collaborators a tool borrows for the duration of one event.
pub struct ToolContext<'a> {
    pub compositor: &'a mut Compositor,
    pub selection: &'a mut SelectionManager,
    pub palette: &'a mut ColorPalette,
    pub brush_size: u32,
    redraw: &'a mut dyn FnMut(),
}

impl<'a> ToolContext<'a> {
    pub fn new(
        compositor: &'a mut Compositor,
        selection: &'a mut SelectionManager,
        palette: &'a mut ColorPalette,
        brush_size: u32,
        redraw: &'a mut dyn FnMut(),
    ) -> Self {
        Self {
            compositor,
            selection,
            palette,
            brush_size: brush_size.max(1),
            redraw,
        }
    }

    /// Tell the host the display needs repainting.
    pub fn request_redraw(&mut self) {
        (self.redraw)();
    }
}

// ============================================================================
// TOOL CONTRACT
// ============================================================================

pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse>;

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse>;

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse>;

    fn on_pointer_leave(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse>;

    /// Called before another tool takes over. Must leave nothing half-done.
    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> Result<ToolResponse>;

    fn cursor_preview(
        &self,
        pos: MouseCoordinates,
        zoom: f64,
        palette: &ColorPalette,
        size: u32,
    ) -> Option<CursorPreview>;

    fn is_dragging(&self) -> bool;

    /// How an in-progress scratch stroke should be previewed, for tools that
    /// draw through the compositor.
    fn stroke_mode(&self) -> Option<CompositeMode> {
        None
    }
}

// ============================================================================
// ACTIVE TOOL - closed set of tool implementations
// ============================================================================

#[derive(Clone, Debug)]
pub enum ActiveTool {
    Pencil(PencilTool),
    Brush(BrushTool),
    Bucket(BucketTool),
    Pipette(PipetteTool),
    Selection(SelectionTool),
}

impl Default for ActiveTool {
    fn default() -> Self {
        Self::new(ToolKind::default())
    }
}

impl ActiveTool {
    pub fn new(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Pencil => ActiveTool::Pencil(PencilTool::new(PencilKind::Pencil)),
            ToolKind::Eraser => ActiveTool::Pencil(PencilTool::new(PencilKind::Eraser)),
            ToolKind::Brush => ActiveTool::Brush(BrushTool::default()),
            ToolKind::Bucket => ActiveTool::Bucket(BucketTool::default()),
            ToolKind::Pipette => ActiveTool::Pipette(PipetteTool::default()),
            ToolKind::Selection => ActiveTool::Selection(SelectionTool::default()),
        }
    }

    fn inner(&self) -> &dyn Tool {
        match self {
            ActiveTool::Pencil(t) => t,
            ActiveTool::Brush(t) => t,
            ActiveTool::Bucket(t) => t,
            ActiveTool::Pipette(t) => t,
            ActiveTool::Selection(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Tool {
        match self {
            ActiveTool::Pencil(t) => t,
            ActiveTool::Brush(t) => t,
            ActiveTool::Bucket(t) => t,
            ActiveTool::Pipette(t) => t,
            ActiveTool::Selection(t) => t,
        }
    }
}

impl Tool for ActiveTool {
    fn kind(&self) -> ToolKind {
        self.inner().kind()
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.inner_mut().on_pointer_down(ctx, pos)
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.inner_mut().on_pointer_move(ctx, pos)
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.inner_mut().on_pointer_up(ctx, pos)
    }

    fn on_pointer_leave(&mut self, ctx: &mut ToolContext<'_>, pos: MouseCoordinates) -> Result<ToolResponse> {
        self.inner_mut().on_pointer_leave(ctx, pos)
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) -> Result<ToolResponse> {
        self.inner_mut().on_deactivate(ctx)
    }

    fn cursor_preview(
        &self,
        pos: MouseCoordinates,
        zoom: f64,
        palette: &ColorPalette,
        size: u32,
    ) -> Option<CursorPreview> {
        self.inner().cursor_preview(pos, zoom, palette, size)
    }

    fn is_dragging(&self) -> bool {
        self.inner().is_dragging()
    }

    fn stroke_mode(&self) -> Option<CompositeMode> {
        self.inner().stroke_mode()
    }
}

/// Icon cursor with its bottom-left corner at the pointer.
pub(crate) fn icon_cursor(kind: ToolKind, pos: MouseCoordinates, zoom: f64) -> CursorPreview {
    CursorPreview {
        left: pos.source_x * zoom,
        top: pos.source_y * zoom - ICON_CURSOR_SIZE,
        width: ICON_CURSOR_SIZE,
        height: ICON_CURSOR_SIZE,
        shape: CursorShape::Icon(kind),
        fill: None,
    }
}
