use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

use crate::canvas::PixelSurface;
use crate::compositor::Compositor;
use crate::components::colors::ColorPalette;
use crate::components::history::{HistoryBuffer, SurfaceSnapshot};
use crate::components::selection::SelectionManager;
use crate::components::tools::{ActiveTool, CursorPreview, Tool, ToolContext, ToolKind, ToolResponse};
use crate::error::{EngineError, Result};
use crate::io;
use crate::settings::EditorSettings;
use crate::zoom::{CoordinateMapper, draw_dashed_outline};

static UNTITLED_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Called whenever the display needs repainting.
pub type RedrawCallback = Box<dyn FnMut()>;

/// Single open document: both surfaces, the active tool, undo history and the
/// view onto it.
///
/// Pointer positions are display pixels relative to the top-left of the fully
/// rendered (zoomed) image.
pub struct EditorSession {
    id: Uuid,
    /// Display name (derived from path or "Untitled-N")
    name: String,
    /// `None` for unsaved/untitled documents.
    path: Option<PathBuf>,
    dirty: bool,

    settings: EditorSettings,
    mapper: CoordinateMapper,
    compositor: Compositor,
    selection: SelectionManager,
    palette: ColorPalette,
    brush_size: u32,
    tool: ActiveTool,
    history: HistoryBuffer<SurfaceSnapshot>,
    redraw: Option<RedrawCallback>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Self {
        let (min_zoom, max_zoom) = settings.zoom_limits();
        let compositor = Compositor::new(settings.default_width.max(1), settings.default_height.max(1));
        let mut history = HistoryBuffer::new(settings.max_history);
        history.push(SurfaceSnapshot::capture(compositor.source()));

        let session = Self {
            id: Uuid::new_v4(),
            name: next_untitled_name(),
            path: None,
            dirty: false,
            mapper: CoordinateMapper::new(min_zoom, max_zoom),
            compositor,
            selection: SelectionManager::new(),
            palette: settings.palette(),
            brush_size: settings.brush_size.max(1),
            tool: ActiveTool::default(),
            history,
            redraw: None,
            settings,
        };
        log::info!(
            "session {}: created {} ({}x{})",
            session.id,
            session.name,
            session.compositor.width(),
            session.compositor.height()
        );
        session
    }

    pub fn set_redraw_callback(&mut self, callback: RedrawCallback) {
        self.redraw = Some(callback);
    }

    fn request_redraw(&mut self) {
        if let Some(redraw) = self.redraw.as_mut() {
            redraw();
        }
    }

    // ---- accessors ----------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Name with a trailing `*` while there are unsaved edits.
    pub fn display_title(&self) -> String {
        if self.dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn surface(&self) -> &PixelSurface {
        self.compositor.source()
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn history(&self) -> &HistoryBuffer<SurfaceSnapshot> {
        &self.history
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut ColorPalette {
        &mut self.palette
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.max(1);
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn is_dragging(&self) -> bool {
        self.tool.is_dragging()
    }

    // ---- tools --------------------------------------------------------------

    /// Run one tool callback with a freshly borrowed context, then record any
    /// committed edit.
    fn dispatch<F>(&mut self, f: F) -> Result<ToolResponse>
    where
        F: FnOnce(&mut ActiveTool, &mut ToolContext<'_>) -> Result<ToolResponse>,
    {
        let mut noop = || {};
        let redraw: &mut dyn FnMut() = match self.redraw.as_mut() {
            Some(callback) => callback.as_mut(),
            None => &mut noop,
        };
        let mut ctx = ToolContext::new(
            &mut self.compositor,
            &mut self.selection,
            &mut self.palette,
            self.brush_size,
            redraw,
        );
        let response = f(&mut self.tool, &mut ctx)?;
        if response == ToolResponse::Committed {
            self.record_edit();
        }
        Ok(response)
    }

    /// Deactivate the current tool (finishing anything it left open) and
    /// switch to a fresh instance of `kind`.
    pub fn set_tool(&mut self, kind: ToolKind) -> Result<ToolResponse> {
        let response = self.dispatch(|tool, ctx| tool.on_deactivate(ctx))?;
        log::debug!("session {}: tool {} -> {}", self.id, self.tool.kind().label(), kind.label());
        self.tool = ActiveTool::new(kind);
        Ok(response)
    }

    pub fn pointer_down(&mut self, display_x: f64, display_y: f64) -> Result<ToolResponse> {
        let pos = self.mapper.to_source(display_x, display_y);
        self.dispatch(|tool, ctx| tool.on_pointer_down(ctx, pos))
    }

    pub fn pointer_move(&mut self, display_x: f64, display_y: f64) -> Result<ToolResponse> {
        let pos = self.mapper.to_source(display_x, display_y);
        self.dispatch(|tool, ctx| tool.on_pointer_move(ctx, pos))
    }

    pub fn pointer_up(&mut self, display_x: f64, display_y: f64) -> Result<ToolResponse> {
        let pos = self.mapper.to_source(display_x, display_y);
        self.dispatch(|tool, ctx| tool.on_pointer_up(ctx, pos))
    }

    pub fn pointer_leave(&mut self, display_x: f64, display_y: f64) -> Result<ToolResponse> {
        let pos = self.mapper.to_source(display_x, display_y);
        self.dispatch(|tool, ctx| tool.on_pointer_leave(ctx, pos))
    }

    /// Cursor overlay for the active tool at a display position.
    pub fn cursor_preview(&self, display_x: f64, display_y: f64) -> Option<CursorPreview> {
        let pos = self.mapper.to_source(display_x, display_y);
        self.tool
            .cursor_preview(pos, self.mapper.zoom_factor(), &self.palette, self.brush_size)
    }

    // ---- history ------------------------------------------------------------

    fn record_edit(&mut self) {
        self.history.push(SurfaceSnapshot::capture(self.compositor.source()));
        self.dirty = true;
        log::info!(
            "session {}: edit recorded ({} undo steps)",
            self.id,
            self.history.undo_count()
        );
    }

    fn restore(&mut self, snapshot: &SurfaceSnapshot) {
        self.compositor.replace_source(snapshot.to_surface());
        self.selection.reset();
        self.tool = ActiveTool::new(self.tool.kind());
    }

    /// The baseline snapshot is never undone past.
    pub fn can_undo(&self) -> bool {
        self.selection.is_floating() || self.history.position() > 1
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit. A floating selection is dropped first, which puts
    /// the lifted pixels back where they came from.
    pub fn undo(&mut self) -> bool {
        if self.selection.is_floating() {
            let Some(snapshot) = self.history.current().cloned() else {
                return false;
            };
            self.restore(&snapshot);
            self.request_redraw();
            return true;
        }
        if self.history.position() <= 1 {
            return false;
        }
        self.history.undo();
        let Some(snapshot) = self.history.current().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        self.dirty = true;
        self.request_redraw();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(&snapshot);
        self.dirty = true;
        self.request_redraw();
        true
    }

    // ---- canvas operations --------------------------------------------------

    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let (max_width, max_height) = (self.settings.max_canvas_width, self.settings.max_canvas_height);
        if width == 0 || height == 0 || width > max_width || height > max_height {
            return Err(EngineError::InvalidDimensions {
                width,
                height,
                max_width,
                max_height,
            });
        }
        Ok(())
    }

    /// Blit any floating selection back and end whatever the tool had open.
    fn settle(&mut self) {
        self.compositor.discard();
        self.selection.tear_down(self.compositor.source_mut());
        self.tool = ActiveTool::new(self.tool.kind());
    }

    /// Start over on a blank `width × height` document with fresh history.
    pub fn new_document(&mut self, width: u32, height: u32) -> Result<()> {
        self.check_dimensions(width, height)?;
        self.compositor = Compositor::new(width, height);
        self.selection.reset();
        self.tool = ActiveTool::new(self.tool.kind());
        self.history.clear();
        self.history.push(SurfaceSnapshot::capture(self.compositor.source()));
        self.mapper.reset();
        self.name = next_untitled_name();
        self.path = None;
        self.dirty = false;
        log::info!("session {}: new document {} ({}x{})", self.id, self.name, width, height);
        self.request_redraw();
        Ok(())
    }

    pub fn clear_canvas(&mut self) {
        self.settle();
        self.compositor.source_mut().clear();
        self.record_edit();
        self.request_redraw();
    }

    /// Resize keeping the top-left content. Scroll is re-clamped to the new
    /// extent.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        self.check_dimensions(width, height)?;
        self.settle();
        self.compositor.resize(width, height);
        let viewport = self.mapper.viewport();
        self.mapper.set_scroll(viewport.scroll_x, viewport.scroll_y, width, height)?;
        self.record_edit();
        log::info!("session {}: resized to {}x{}", self.id, width, height);
        self.request_redraw();
        Ok(())
    }

    /// Replace the image wholesale. Zoom goes back to 1.
    pub fn load_surface(&mut self, surface: PixelSurface) {
        self.compositor.discard();
        self.selection.reset();
        self.tool = ActiveTool::new(self.tool.kind());
        log::info!("session {}: loaded {}x{} surface", self.id, surface.width(), surface.height());
        self.compositor.replace_source(surface);
        self.mapper.reset();
        self.record_edit();
        self.request_redraw();
    }

    // ---- view ---------------------------------------------------------------

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.mapper.set_viewport_size(width, height);
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) -> Result<()> {
        let (w, h) = (self.compositor.width(), self.compositor.height());
        self.mapper.set_scroll(x, y, w, h)?;
        self.request_redraw();
        Ok(())
    }

    pub fn zoom_in(&mut self, anchor_x: f64, anchor_y: f64) -> Result<bool> {
        let (w, h) = (self.compositor.width(), self.compositor.height());
        let changed = self.mapper.zoom_in((anchor_x, anchor_y), w, h)?;
        if changed {
            self.request_redraw();
        }
        Ok(changed)
    }

    pub fn zoom_out(&mut self, anchor_x: f64, anchor_y: f64) -> Result<bool> {
        let (w, h) = (self.compositor.width(), self.compositor.height());
        let changed = self.mapper.zoom_out((anchor_x, anchor_y), w, h)?;
        if changed {
            self.request_redraw();
        }
        Ok(changed)
    }

    pub fn set_zoom_factor(&mut self, zoom: f64, anchor_x: f64, anchor_y: f64) -> Result<()> {
        let (w, h) = (self.compositor.width(), self.compositor.height());
        self.mapper.set_zoom_factor(zoom, anchor_x, anchor_y, w, h)?;
        self.request_redraw();
        Ok(())
    }

    /// Source plus the pending stroke and the floating selection, at 1:1.
    pub fn compose(&self) -> PixelSurface {
        let mut composed = match self.tool.stroke_mode() {
            Some(mode) => self.compositor.preview(mode, self.palette.opacity()),
            None => self.compositor.source().clone(),
        };
        if let Some(content) = self.selection.content() {
            let rect = self.selection.rect();
            composed.draw_surface(content, rect.x, rect.y);
        }
        composed
    }

    /// The whole zoomed image, with the selection outline on top.
    pub fn render_display(&self) -> Result<PixelSurface> {
        let mut display = self.mapper.render_display(&self.compose())?;
        self.draw_selection_outline(&mut display, 0.0, 0.0);
        Ok(display)
    }

    /// Only the region the viewport shows.
    pub fn render_viewport(&self) -> Result<PixelSurface> {
        let viewport = self.mapper.viewport();
        let mut display = self.mapper.render_viewport(&self.compose())?;
        if viewport.width > 0 && viewport.height > 0 {
            self.draw_selection_outline(&mut display, viewport.scroll_x.floor(), viewport.scroll_y.floor());
        } else {
            self.draw_selection_outline(&mut display, 0.0, 0.0);
        }
        Ok(display)
    }

    fn draw_selection_outline(&self, display: &mut PixelSurface, offset_x: f64, offset_y: f64) {
        if !self.selection.is_visible() {
            return;
        }
        let rect = self.selection.rect();
        let edge = |v: i32, offset: f64| (self.mapper.display_coordinate(v as f64) - offset).floor() as i32;
        draw_dashed_outline(
            display,
            edge(rect.x, offset_x),
            edge(rect.y, offset_y),
            edge(rect.right(), offset_x) - 1,
            edge(rect.bottom(), offset_y) - 1,
        );
    }

    // ---- files --------------------------------------------------------------

    /// Open an image or `.pxf` document into this session.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        if is_document(path) {
            let (surface, palette) = io::load_document(path)?.into_parts()?;
            self.load_surface(surface);
            self.palette = palette;
        } else {
            let surface = io::load_image(path)?;
            self.load_surface(surface);
        }
        self.set_path(path);
        self.dirty = false;
        Ok(())
    }

    /// Save what the user sees (floating selection included) by extension.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let flattened = self.compose_committed();
        if is_document(path) {
            io::save_document(&flattened, &self.palette, path)?;
        } else {
            io::save_image(&flattened, path)?;
        }
        self.set_path(path);
        self.mark_saved();
        Ok(())
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn compose_committed(&self) -> PixelSurface {
        let mut flattened = self.compositor.source().clone();
        if let Some(content) = self.selection.content() {
            let rect = self.selection.rect();
            flattened.draw_surface(content, rect.x, rect.y);
        }
        flattened
    }

    fn set_path(&mut self, path: &Path) {
        self.name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        self.path = Some(path.to_path_buf());
    }
}

fn next_untitled_name() -> String {
    format!("Untitled-{}", UNTITLED_COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pxf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;
    use crate::components::selection::SelectionState;
    use image::Rgba;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn small() -> EditorSession {
        EditorSession::new(EditorSettings {
            default_width: 20,
            default_height: 20,
            ..Default::default()
        })
    }

    fn stroke(s: &mut EditorSession, from: (f64, f64), to: (f64, f64)) {
        s.pointer_down(from.0, from.1).unwrap();
        s.pointer_move(to.0, to.1).unwrap();
        s.pointer_up(to.0, to.1).unwrap();
    }

    #[test]
    fn starts_clean_with_baseline() {
        let s = small();
        assert!(s.name().starts_with("Untitled-"));
        assert!(!s.is_dirty());
        assert_eq!(s.history().len(), 1);
        assert!(!s.can_undo());
        assert_eq!(s.tool_kind(), ToolKind::Pencil);
    }

    #[test]
    fn stroke_commits_and_marks_dirty() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        assert_eq!(s.surface().get_pixel(4, 2), BLACK);
        assert!(s.is_dirty());
        assert!(s.display_title().ends_with('*'));
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn undo_and_redo_restore_snapshots() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        let painted = s.surface().clone();

        assert!(s.undo());
        assert!(s.surface().is_blank());
        assert!(!s.undo());

        assert!(s.redo());
        assert_eq!(s.surface(), &painted);
        assert!(!s.redo());
    }

    #[test]
    fn new_edit_after_undo_drops_redo() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        s.undo();
        stroke(&mut s, (3.0, 10.0), (8.0, 10.0));
        assert!(!s.can_redo());
        assert_eq!(s.surface().get_pixel(4, 2), TRANSPARENT);
    }

    #[test]
    fn pointer_input_goes_through_zoom() {
        let mut s = small();
        s.set_zoom_factor(4.0, 0.0, 0.0).unwrap();
        s.pointer_down(40.0, 40.0).unwrap();
        s.pointer_up(40.0, 40.0).unwrap();
        // Display (40, 40) at zoom 4 is source (10, 10); size-1 pencil lands on (9, 9).
        assert_eq!(s.surface().get_pixel(9, 9), BLACK);
    }

    #[test]
    fn redraw_callback_fires() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut s = small();
        s.set_redraw_callback(Box::new(move || seen.set(seen.get() + 1)));
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        assert!(count.get() >= 3);
    }

    #[test]
    fn switching_tools_blits_selection_and_records() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        s.set_tool(ToolKind::Selection).unwrap();
        s.pointer_down(0.0, 0.0).unwrap();
        s.pointer_move(10.0, 10.0).unwrap();
        s.pointer_up(10.0, 10.0).unwrap();
        assert!(s.selection().is_floating());
        assert_eq!(s.history().len(), 2);

        let r = s.set_tool(ToolKind::Brush).unwrap();
        assert_eq!(r, ToolResponse::Committed);
        assert_eq!(s.selection().state(), SelectionState::Empty);
        assert_eq!(s.surface().get_pixel(4, 2), BLACK);
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn undo_while_floating_puts_pixels_back() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        let painted = s.surface().clone();
        s.set_tool(ToolKind::Selection).unwrap();
        s.pointer_down(0.0, 0.0).unwrap();
        s.pointer_move(10.0, 10.0).unwrap();
        s.pointer_up(10.0, 10.0).unwrap();
        assert!(s.surface().is_blank());

        assert!(s.undo());
        assert_eq!(s.selection().state(), SelectionState::Empty);
        assert_eq!(s.surface(), &painted);
    }

    #[test]
    fn resize_rejects_bad_dimensions() {
        let mut s = small();
        assert!(matches!(
            s.resize_canvas(0, 10),
            Err(EngineError::InvalidDimensions { width: 0, height: 10, .. })
        ));
        assert!(matches!(s.resize_canvas(10, 1501), Err(EngineError::InvalidDimensions { .. })));
        assert_eq!((s.surface().width(), s.surface().height()), (20, 20));
    }

    #[test]
    fn resize_keeps_top_left_and_is_undoable() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        s.resize_canvas(6, 30).unwrap();
        assert_eq!((s.surface().width(), s.surface().height()), (6, 30));
        assert_eq!(s.surface().get_pixel(4, 2), BLACK);

        s.undo();
        assert_eq!((s.surface().width(), s.surface().height()), (20, 20));
        assert_eq!(s.compositor().scratch().width(), 20);
    }

    #[test]
    fn new_document_resets_everything() {
        let mut s = small();
        stroke(&mut s, (3.0, 3.0), (8.0, 3.0));
        s.set_zoom_factor(2.0, 0.0, 0.0).unwrap();
        s.new_document(40, 30).unwrap();
        assert!(s.surface().is_blank());
        assert_eq!((s.surface().width(), s.surface().height()), (40, 30));
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.mapper().zoom_factor(), 1.0);
        assert!(!s.is_dirty());
    }

    #[test]
    fn render_previews_pending_stroke() {
        let mut s = small();
        s.palette_mut().set_opacity(0.5);
        s.pointer_down(3.0, 3.0).unwrap();
        s.pointer_move(8.0, 3.0).unwrap();
        assert!(s.surface().is_blank());
        let display = s.render_display().unwrap();
        assert_eq!(display.get_pixel(4, 2), Rgba([0, 0, 0, 127]));
    }

    #[test]
    fn render_draws_selection_outline() {
        let mut s = small();
        s.set_tool(ToolKind::Selection).unwrap();
        s.pointer_down(2.0, 2.0).unwrap();
        s.pointer_move(12.0, 12.0).unwrap();
        s.set_zoom_factor(2.0, 0.0, 0.0).unwrap();
        let display = s.render_display().unwrap();
        assert_eq!((display.width(), display.height()), (40, 40));
        assert_eq!(display.get_pixel(4, 4), BLACK);
        assert_eq!(display.get_pixel(23, 23)[3], 255);
        assert_eq!(display.get_pixel(10, 10), TRANSPARENT);
    }

    #[test]
    fn cursor_preview_scales_with_zoom() {
        let mut s = small();
        s.set_brush_size(3);
        s.set_zoom_factor(2.0, 0.0, 0.0).unwrap();
        let c = s.cursor_preview(20.0, 20.0).unwrap();
        // Source (10, 10) with size 3 starts at floor(8.5) = 8.
        assert_eq!((c.left, c.top, c.width), (16.0, 16.0, 6.0));
    }
}
