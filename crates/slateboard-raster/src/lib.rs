//! Slateboard Raster Library
//!
//! Raster surfaces for the Slateboard whiteboard: background painting, shape
//! rasterization, text and image compositing, the drawing engine, undo
//! history, and the `Board` facade that ties the engine to a live session.

pub mod background;
pub mod board;
pub mod engine;
pub mod history;
pub mod shapes;
pub mod text;

pub use background::{PATTERN_SPACING, Pattern, Theme};
pub use board::{Board, FONT_SIZE_FACTOR, ToolSettings};
pub use engine::{CanvasSnapshot, DrawingEngine, RasterError};
pub use history::{History, MAX_HISTORY};
