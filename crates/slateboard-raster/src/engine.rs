//! The drawing engine: sole writer of the persistent raster surface.
//!
//! `apply_event` is the single rendering path for local and remote events;
//! congruent boards on every peer are a direct consequence of that
//! uniformity. The transient overlay (shape previews, cursor dots, laser
//! trail) is a second pixmap that never enters history and never mixes with
//! committed ink.

use slateboard_core::events::decode_image_data;
use slateboard_core::{
    Color, DrawEvent, NormalizedPoint, NormalizedSize, ShapeKind, ToolKind, Viewport,
};
use thiserror::Error;
use tiny_skia::{
    IntSize, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::background::{self, Pattern, Theme};
use crate::shapes;
use crate::text;

/// Highlighter strokes widen by this factor.
const HIGHLIGHTER_WIDTH_FACTOR: f32 = 3.0;
/// Opacity forced on highlighter strokes.
const HIGHLIGHTER_OPACITY: f32 = 0.3;
/// Radius of remote cursor dots on the overlay.
const CURSOR_RADIUS: f32 = 6.0;
/// Indigo at 40% alpha, the presence accent.
const CURSOR_COLOR: Color = Color::new(79, 70, 229, 102);
/// Laser trail stroke.
const LASER_COLOR: Color = Color::opaque(0xef, 0x44, 0x44);
const LASER_WIDTH: f32 = 4.0;

/// Raster errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("invalid surface size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("png encoding failed: {0}")]
    PngEncode(String),
}

/// A full copy of the persistent surface at one point in time.
///
/// Used only for local undo; snapshots never cross the wire, so a peer who
/// joins a room late starts from a blank board.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSnapshot {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Owns the persistent surface and the transient overlay.
pub struct DrawingEngine {
    surface: Pixmap,
    overlay: Pixmap,
    theme: Theme,
    pattern: Pattern,
}

impl DrawingEngine {
    /// Create both surfaces and paint the base layer. A zero-size viewport
    /// is a precondition violation the host must avoid, not a recoverable
    /// state.
    pub fn new(width: u32, height: u32, theme: Theme, pattern: Pattern) -> Result<Self, RasterError> {
        let mut surface =
            Pixmap::new(width, height).ok_or(RasterError::InvalidSize(width, height))?;
        let overlay = Pixmap::new(width, height).ok_or(RasterError::InvalidSize(width, height))?;
        background::paint(&mut surface, pattern, theme);
        Ok(Self {
            surface,
            overlay,
            theme,
            pattern,
        })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// The committed surface, for display compositing.
    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    /// The transient overlay, composited above the surface by the host.
    pub fn overlay(&self) -> &Pixmap {
        &self.overlay
    }

    fn viewport(&self) -> Viewport {
        Viewport::sized(self.width() as f32, self.height() as f32)
    }

    /// Apply one committed event. Presence events (`cursor`, `laser`) are
    /// transient and deliberately never reach the persistent surface.
    pub fn apply_event(&mut self, event: &DrawEvent) {
        match event {
            DrawEvent::Draw {
                from,
                to,
                color,
                width,
                opacity,
                tool,
            } => self.draw_segment(*from, *to, *color, *width, *opacity, *tool),
            DrawEvent::Shape {
                kind,
                start,
                end,
                color,
                width,
                filled,
            } => {
                let viewport = self.viewport();
                shapes::rasterize(
                    &mut self.surface,
                    viewport.denormalize(*start),
                    viewport.denormalize(*end),
                    *kind,
                    *color,
                    *width,
                    *filled,
                );
            }
            DrawEvent::Text {
                position,
                value,
                color,
                font_size,
            } => {
                let anchor = self.viewport().denormalize(*position);
                text::draw(&mut self.surface, anchor, value, *color, *font_size);
            }
            DrawEvent::Image {
                position,
                size,
                data,
            } => {
                if self.blit_image(*position, *size, data).is_none() {
                    log::warn!("dropping undecodable image event");
                }
            }
            DrawEvent::Clear => self.clear(),
            DrawEvent::Cursor { .. } | DrawEvent::Laser { .. } => {}
        }
    }

    /// One freehand segment. Tool semantics live here so that local and
    /// remote segments come out identical: the eraser strokes in the theme's
    /// base color, the highlighter widens and goes translucent.
    fn draw_segment(
        &mut self,
        from: NormalizedPoint,
        to: NormalizedPoint,
        color: Color,
        width: f32,
        opacity: f32,
        tool: ToolKind,
    ) {
        let (color, width, opacity) = match tool {
            ToolKind::Pen => (color, width, opacity),
            ToolKind::Eraser => {
                let (r, g, b) = self.theme.base_color();
                (Color::opaque(r, g, b), width, 1.0)
            }
            ToolKind::Highlighter => {
                (color, width * HIGHLIGHTER_WIDTH_FACTOR, HIGHLIGHTER_OPACITY)
            }
        };

        let viewport = self.viewport();
        let (x0, y0) = viewport.denormalize(from);
        let (x1, y1) = viewport.denormalize(to);
        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.anti_alias = true;
        let alpha = (color.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        paint.set_color_rgba8(color.r, color.g, color.b, alpha);
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        self.surface
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn blit_image(
        &mut self,
        position: NormalizedPoint,
        size: NormalizedSize,
        data: &str,
    ) -> Option<()> {
        let bytes = decode_image_data(data)?;
        let decoded = image::load_from_memory(&bytes).ok()?.to_rgba8();
        let (img_w, img_h) = decoded.dimensions();
        let mut pixmap = Pixmap::new(img_w, img_h)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(decoded.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        let viewport = self.viewport();
        let (x, y) = viewport.denormalize(position);
        let target_w = size.w * self.width() as f32;
        let target_h = size.h * self.height() as f32;
        if target_w <= 0.0 || target_h <= 0.0 {
            return None;
        }
        let transform = Transform::from_row(
            target_w / img_w as f32,
            0.0,
            0.0,
            target_h / img_h as f32,
            x,
            y,
        );
        self.surface.draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
        Some(())
    }

    /// Wipe committed content back to the bare background.
    pub fn clear(&mut self) {
        background::paint(&mut self.surface, self.pattern, self.theme);
    }

    /// Switch theme/pattern and repaint the base layer. Committed ink is
    /// dropped; the board pushes a snapshot around this so it stays undoable.
    pub fn set_style(&mut self, theme: Theme, pattern: Pattern) {
        self.theme = theme;
        self.pattern = pattern;
        self.clear();
    }

    /// Resize both surfaces, stretching existing content over the new size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        let mut surface =
            Pixmap::new(width, height).ok_or(RasterError::InvalidSize(width, height))?;
        let overlay = Pixmap::new(width, height).ok_or(RasterError::InvalidSize(width, height))?;
        let sx = width as f32 / self.surface.width() as f32;
        let sy = height as f32 / self.surface.height() as f32;
        surface.draw_pixmap(
            0,
            0,
            self.surface.as_ref(),
            &PixmapPaint::default(),
            Transform::from_scale(sx, sy),
            None,
        );
        self.surface = surface;
        self.overlay = overlay;
        Ok(())
    }

    // --- Transient overlay ---

    /// Drop everything on the overlay.
    pub fn clear_overlay(&mut self) {
        self.overlay.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Redraw the in-progress shape preview. The persistent surface is
    /// untouched until the drag commits.
    pub fn preview_shape(
        &mut self,
        start: NormalizedPoint,
        end: NormalizedPoint,
        kind: ShapeKind,
        color: Color,
        width: f32,
        filled: bool,
    ) {
        self.clear_overlay();
        let viewport = self.viewport();
        shapes::rasterize(
            &mut self.overlay,
            viewport.denormalize(start),
            viewport.denormalize(end),
            kind,
            color,
            width,
            filled,
        );
    }

    /// One remote cursor dot.
    pub fn overlay_cursor(&mut self, position: NormalizedPoint) {
        let (x, y) = self.viewport().denormalize(position);
        let Some(path) = PathBuilder::from_circle(x, y, CURSOR_RADIUS) else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(CURSOR_COLOR.r, CURSOR_COLOR.g, CURSOR_COLOR.b, CURSOR_COLOR.a);
        self.overlay.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// The decaying laser trail as one polyline.
    pub fn overlay_laser(&mut self, trail: &[NormalizedPoint]) {
        if trail.len() < 2 {
            return;
        }
        let viewport = self.viewport();
        let mut pb = PathBuilder::new();
        let (x, y) = viewport.denormalize(trail[0]);
        pb.move_to(x, y);
        for point in &trail[1..] {
            let (x, y) = viewport.denormalize(*point);
            pb.line_to(x, y);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(LASER_COLOR.r, LASER_COLOR.g, LASER_COLOR.b, LASER_COLOR.a);
        let stroke = Stroke {
            width: LASER_WIDTH,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        self.overlay
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    // --- Snapshots and export ---

    /// Copy the persistent surface for the undo stack.
    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            width: self.width(),
            height: self.height(),
            data: self.surface.data().to_vec(),
        }
    }

    /// Repaint the persistent surface from a snapshot, stretching when the
    /// surface has been resized since it was taken.
    pub fn restore(&mut self, snapshot: &CanvasSnapshot) {
        if snapshot.width == self.width() && snapshot.height == self.height() {
            self.surface.data_mut().copy_from_slice(&snapshot.data);
            return;
        }
        let Some(size) = IntSize::from_wh(snapshot.width, snapshot.height) else {
            return;
        };
        let Some(pixmap) = Pixmap::from_vec(snapshot.data.clone(), size) else {
            return;
        };
        let sx = self.width() as f32 / snapshot.width as f32;
        let sy = self.height() as f32 / snapshot.height as f32;
        self.surface.draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::from_scale(sx, sy),
            None,
        );
    }

    /// Encode the persistent surface as PNG bytes for download.
    pub fn export_png(&self) -> Result<Vec<u8>, RasterError> {
        self.surface
            .encode_png()
            .map_err(|e| RasterError::PngEncode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DrawingEngine {
        DrawingEngine::new(100, 100, Theme::Plain, Pattern::Plain).unwrap()
    }

    fn red_segment() -> DrawEvent {
        DrawEvent::Draw {
            from: NormalizedPoint::new(0.1, 0.1),
            to: NormalizedPoint::new(0.5, 0.5),
            color: Color::opaque(0xef, 0x44, 0x44),
            width: 4.0,
            opacity: 1.0,
            tool: ToolKind::Pen,
        }
    }

    #[test]
    fn test_zero_size_surface_is_an_error() {
        assert!(matches!(
            DrawingEngine::new(0, 100, Theme::Plain, Pattern::Plain),
            Err(RasterError::InvalidSize(0, 100))
        ));
    }

    #[test]
    fn test_replay_parity_across_surfaces() {
        let events = [
            red_segment(),
            DrawEvent::Shape {
                kind: ShapeKind::Star,
                start: NormalizedPoint::new(0.2, 0.2),
                end: NormalizedPoint::new(0.8, 0.8),
                color: Color::opaque(0x3b, 0x82, 0xf6),
                width: 3.0,
                filled: true,
            },
            DrawEvent::Text {
                position: NormalizedPoint::new(0.1, 0.7),
                value: "hi".to_string(),
                color: Color::black(),
                font_size: 20.0,
            },
        ];

        let mut originator = engine();
        let mut receiver = engine();
        for event in &events {
            originator.apply_event(event);
        }
        for event in &events {
            receiver.apply_event(event);
        }
        assert_eq!(originator.surface().data(), receiver.surface().data());
    }

    #[test]
    fn test_eraser_strokes_the_base_color() {
        let mut engine = DrawingEngine::new(100, 100, Theme::GreenChalk, Pattern::Plain).unwrap();
        engine.apply_event(&DrawEvent::Draw {
            from: NormalizedPoint::new(0.0, 0.5),
            to: NormalizedPoint::new(1.0, 0.5),
            color: Color::white(),
            width: 10.0,
            opacity: 1.0,
            tool: ToolKind::Pen,
        });
        engine.apply_event(&DrawEvent::Draw {
            from: NormalizedPoint::new(0.0, 0.5),
            to: NormalizedPoint::new(1.0, 0.5),
            color: Color::black(), // ignored by the eraser
            width: 14.0,
            opacity: 1.0,
            tool: ToolKind::Eraser,
        });
        let (r, g, b) = Theme::GreenChalk.base_color();
        let px = engine.surface().pixel(50, 50).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (r, g, b));
    }

    #[test]
    fn test_highlighter_is_translucent_and_wide() {
        let mut engine = engine();
        engine.apply_event(&DrawEvent::Draw {
            from: NormalizedPoint::new(0.0, 0.5),
            to: NormalizedPoint::new(1.0, 0.5),
            color: Color::black(),
            width: 4.0,
            opacity: 1.0,
            tool: ToolKind::Highlighter,
        });
        // 30% black over white leaves a light gray, never full black.
        let px = engine.surface().pixel(50, 50).unwrap();
        assert!(px.red() > 0x80 && px.red() < 0xff);
        // 4px at 3x width covers 6px either side of the center line.
        let edge = engine.surface().pixel(50, 46).unwrap();
        assert!(edge.red() < 0xff);
    }

    #[test]
    fn test_presence_events_never_touch_the_surface() {
        let mut engine = engine();
        let before = engine.surface().data().to_vec();
        engine.apply_event(&DrawEvent::Cursor {
            position: NormalizedPoint::new(0.5, 0.5),
        });
        engine.apply_event(&DrawEvent::Laser {
            position: NormalizedPoint::new(0.5, 0.5),
        });
        assert_eq!(engine.surface().data(), &before[..]);
    }

    #[test]
    fn test_clear_restores_the_background() {
        let mut engine = engine();
        let blank = engine.surface().data().to_vec();
        engine.apply_event(&red_segment());
        assert_ne!(engine.surface().data(), &blank[..]);
        engine.apply_event(&DrawEvent::Clear);
        assert_eq!(engine.surface().data(), &blank[..]);
    }

    #[test]
    fn test_image_blit_lands_at_normalized_position() {
        let mut stamp = Pixmap::new(4, 4).unwrap();
        stamp.fill(tiny_skia::Color::from_rgba8(0xef, 0x44, 0x44, 0xff));
        let png = stamp.encode_png().unwrap();

        let mut engine = engine();
        engine.apply_event(&DrawEvent::image(
            NormalizedPoint::new(0.25, 0.25),
            NormalizedSize::new(0.5, 0.5),
            &png,
        ));
        let inside = engine.surface().pixel(50, 50).unwrap();
        assert_eq!(inside.red(), 0xef);
        let outside = engine.surface().pixel(10, 10).unwrap();
        assert_eq!(outside.red(), 0xff);
        assert_eq!(outside.green(), 0xff);
    }

    #[test]
    fn test_garbage_image_payload_is_dropped() {
        let mut engine = engine();
        let before = engine.surface().data().to_vec();
        engine.apply_event(&DrawEvent::Image {
            position: NormalizedPoint::new(0.1, 0.1),
            size: NormalizedSize::new(0.5, 0.5),
            data: "definitely not base64 png!!!".to_string(),
        });
        assert_eq!(engine.surface().data(), &before[..]);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut engine = engine();
        let blank = engine.snapshot();
        engine.apply_event(&red_segment());
        let drawn = engine.snapshot();
        assert_ne!(blank, drawn);

        engine.restore(&blank);
        assert_eq!(engine.snapshot(), blank);
        engine.restore(&drawn);
        assert_eq!(engine.snapshot(), drawn);
    }

    #[test]
    fn test_overlay_is_separate_from_surface() {
        let mut engine = engine();
        let before = engine.surface().data().to_vec();
        engine.preview_shape(
            NormalizedPoint::new(0.1, 0.1),
            NormalizedPoint::new(0.9, 0.9),
            ShapeKind::Rectangle,
            Color::black(),
            3.0,
            false,
        );
        engine.overlay_cursor(NormalizedPoint::new(0.5, 0.5));
        engine.overlay_laser(&[
            NormalizedPoint::new(0.1, 0.9),
            NormalizedPoint::new(0.9, 0.1),
        ]);
        assert_eq!(engine.surface().data(), &before[..]);
        assert!(engine.overlay().pixels().iter().any(|p| p.alpha() > 0));

        engine.clear_overlay();
        assert!(engine.overlay().pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_export_png_roundtrips() {
        let mut engine = engine();
        engine.apply_event(&red_segment());
        let png = engine.export_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 100));
    }
}
