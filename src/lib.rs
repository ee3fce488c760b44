//! PixelFE: a single-plane raster editing engine.
//!
//! The host feeds pointer events in display coordinates to an
//! [`EditorSession`]; the session maps them through the zoom, routes them to
//! the active tool and records committed edits in a bounded undo history.
//! Rendering, file I/O and settings are exposed for the host to wire up.

pub mod canvas;
pub mod components;
pub mod compositor;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod session;
pub mod settings;
pub mod util;
pub mod zoom;

pub use canvas::{CompositeMode, PixelSurface};
pub use components::colors::{Color, ColorPalette};
pub use components::history::{HistoryBuffer, SurfaceSnapshot};
pub use components::selection::{SelectionManager, SelectionRect, SelectionState};
pub use components::tools::{ActiveTool, CursorPreview, MouseCoordinates, Tool, ToolContext, ToolKind, ToolResponse};
pub use compositor::Compositor;
pub use error::{EngineError, Result};
pub use session::EditorSession;
pub use settings::EditorSettings;
pub use zoom::CoordinateMapper;
