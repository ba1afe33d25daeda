//! The board facade: one participant's whiteboard.
//!
//! Ties the drawing engine, the undo history, and a live session together.
//! Every local gesture follows the same path: rasterize through the engine,
//! broadcast to the room, snapshot on commit. Remote events take the first
//! step only, so undo stays strictly local.

use slateboard_core::{
    Color, DrawEvent, NormalizedPoint, NormalizedSize, PeerId, SessionManager, SessionState,
    ShapeKind, SyncError, ToolKind, Transport,
};

use crate::background::{Pattern, Theme};
use crate::engine::{DrawingEngine, RasterError};
use crate::history::History;

/// Text annotations size themselves off the stroke width.
pub const FONT_SIZE_FACTOR: f32 = 4.0;

/// The locally selected stroke settings, applied to every outgoing gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub color: Color,
    pub width: f32,
    pub filled: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::opaque(0x4f, 0x46, 0xe5),
            width: 5.0,
            filled: false,
        }
    }
}

/// An in-progress shape drag.
#[derive(Debug, Clone, Copy)]
struct ShapeDrag {
    start: NormalizedPoint,
    current: NormalizedPoint,
    kind: ShapeKind,
}

/// One participant's whiteboard: engine, history, and session in one place.
pub struct Board<T: Transport> {
    engine: DrawingEngine,
    history: History,
    session: SessionManager<T>,
    settings: ToolSettings,
    stroke_last: Option<NormalizedPoint>,
    shape_drag: Option<ShapeDrag>,
}

impl<T: Transport> Board<T> {
    /// A blank board over `transport`. The initial surface is pushed as the
    /// undo floor, so undo can never walk past an empty board.
    pub fn new(width: u32, height: u32, transport: T) -> Result<Self, RasterError> {
        let engine = DrawingEngine::new(width, height, Theme::default(), Pattern::default())?;
        let mut history = History::new();
        history.push(engine.snapshot());
        Ok(Self {
            engine,
            history,
            session: SessionManager::new(transport),
            settings: ToolSettings::default(),
            stroke_last: None,
            shape_drag: None,
        })
    }

    pub fn engine(&self) -> &DrawingEngine {
        &self.engine
    }

    pub fn settings(&self) -> ToolSettings {
        self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn peer_id(&self) -> PeerId {
        self.session.peer_id()
    }

    pub fn room_code(&self) -> Option<&str> {
        self.session.room_code()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // --- Rooms ---

    /// Create a fresh room and join it, returning the shareable code.
    pub fn host_room(&mut self) -> Result<String, SyncError> {
        let code = SessionManager::<T>::create_room_code();
        self.session.enter(&code)?;
        Ok(code)
    }

    /// Join an existing room by its code.
    pub fn join_room(&mut self, code: &str) -> Result<(), SyncError> {
        self.session.enter(code)
    }

    pub fn leave_room(&mut self) {
        self.session.leave();
    }

    /// Apply everything the room sent since the last call. Remote events are
    /// rasterized but never snapshotted; undo only covers local gestures.
    pub fn sync(&mut self) {
        for event in self.session.poll_remote() {
            self.engine.apply_event(&event);
        }
    }

    // --- Freehand strokes ---

    /// Anchor a freehand stroke. Nothing is drawn until the first segment.
    pub fn begin_stroke(&mut self, point: NormalizedPoint) {
        self.stroke_last = Some(point);
    }

    /// Extend the current stroke by one segment, rasterizing and broadcasting
    /// it immediately. Without a prior `begin_stroke` this anchors instead.
    pub fn stroke_to(&mut self, point: NormalizedPoint, tool: ToolKind) {
        let Some(last) = self.stroke_last.replace(point) else {
            return;
        };
        let event = DrawEvent::Draw {
            from: last,
            to: point,
            color: self.settings.color,
            width: self.settings.width,
            opacity: 1.0,
            tool,
        };
        self.engine.apply_event(&event);
        self.session.broadcast(&event);
    }

    /// Finish the stroke and snapshot the result.
    pub fn end_stroke(&mut self) {
        if self.stroke_last.take().is_some() {
            self.commit();
        }
    }

    // --- Shapes ---

    /// Anchor a shape drag; the preview lives on the overlay until commit.
    pub fn begin_shape(&mut self, point: NormalizedPoint, kind: ShapeKind) {
        self.shape_drag = Some(ShapeDrag {
            start: point,
            current: point,
            kind,
        });
    }

    /// Update the drag and redraw the preview.
    pub fn drag_shape(&mut self, point: NormalizedPoint) {
        let Some(drag) = self.shape_drag.as_mut() else {
            return;
        };
        drag.current = point;
        let drag = *drag;
        self.engine.preview_shape(
            drag.start,
            drag.current,
            drag.kind,
            self.settings.color,
            self.settings.width,
            self.settings.filled,
        );
    }

    /// Commit the dragged shape to the surface and the room.
    pub fn commit_shape(&mut self) {
        let Some(drag) = self.shape_drag.take() else {
            return;
        };
        self.engine.clear_overlay();
        let event = DrawEvent::Shape {
            kind: drag.kind,
            start: drag.start,
            end: drag.current,
            color: self.settings.color,
            width: self.settings.width,
            filled: self.settings.filled,
        };
        self.engine.apply_event(&event);
        self.session.broadcast(&event);
        self.commit();
    }

    // --- Text, images, clears ---

    /// Place a text annotation. Its size follows the stroke width.
    pub fn commit_text(&mut self, position: NormalizedPoint, value: &str) {
        if value.is_empty() {
            return;
        }
        let event = DrawEvent::Text {
            position,
            value: value.to_string(),
            color: self.settings.color,
            font_size: self.settings.width * FONT_SIZE_FACTOR,
        };
        self.engine.apply_event(&event);
        self.session.broadcast(&event);
        self.commit();
    }

    /// Place an encoded image (PNG or JPEG bytes) on the board.
    pub fn place_image(&mut self, position: NormalizedPoint, size: NormalizedSize, bytes: &[u8]) {
        let event = DrawEvent::image(position, size, bytes);
        self.engine.apply_event(&event);
        self.session.broadcast(&event);
        self.commit();
    }

    /// Wipe the board for everyone in the room.
    pub fn clear(&mut self) {
        let event = DrawEvent::Clear;
        self.engine.apply_event(&event);
        self.session.broadcast(&event);
        self.commit();
    }

    /// Step the local surface back one snapshot. Remote peers are unaffected.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.engine.restore(&snapshot);
        true
    }

    /// Switch theme/pattern. The repaint drops committed ink, so the new
    /// state is snapshotted and the old one stays one undo away.
    pub fn set_style(&mut self, theme: Theme, pattern: Pattern) {
        self.engine.set_style(theme, pattern);
        self.commit();
    }

    /// Stretch the board to a new size. Snapshots keep their own dimensions
    /// and are rescaled on restore.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        self.engine.resize(width, height)
    }

    pub fn export_png(&self) -> Result<Vec<u8>, RasterError> {
        self.engine.export_png()
    }

    // --- Presence ---

    /// Share the local pointer position with the room.
    pub fn move_cursor(&mut self, position: NormalizedPoint) {
        self.session.move_cursor(position);
    }

    /// Add a laser-pointer point locally and share it.
    pub fn point_laser(&mut self, position: NormalizedPoint) {
        self.session.point_laser(position);
    }

    /// Redraw the transient overlay: shape preview, remote cursors, and the
    /// decaying laser trail. Call once per frame.
    pub fn tick_overlay(&mut self) {
        self.engine.clear_overlay();
        if let Some(drag) = self.shape_drag {
            self.engine.preview_shape(
                drag.start,
                drag.current,
                drag.kind,
                self.settings.color,
                self.settings.width,
                self.settings.filled,
            );
        }
        for (_, position) in self.session.live_cursors() {
            self.engine.overlay_cursor(position);
        }
        let trail = self.session.laser_trail();
        self.engine.overlay_laser(&trail);
    }

    fn commit(&mut self) {
        self.history.push(self.engine.snapshot());
    }
}
