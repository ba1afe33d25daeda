//! Geometric primitives stroked between two anchor points.
//!
//! Construction is deterministic: the same anchors always produce the same
//! path, so a shape committed locally and the same shape replayed remotely
//! rasterize identically.

use std::f32::consts::PI;

use slateboard_core::{Color, ShapeKind};
use tiny_skia::{FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Arrowhead stroke length, in pixels.
const ARROW_HEAD_LEN: f32 = 15.0;
/// Angle between the shaft and each arrowhead stroke.
const ARROW_HEAD_ANGLE: f32 = PI / 6.0;
/// Inset for check/cross glyphs, as a fraction of the smaller box dimension.
const GLYPH_INSET: f32 = 0.2;

/// Build the outline path for `kind` dragged from `start` to `end`.
///
/// Degenerate drags are kept: a zero-area box collapses to a hairline or a
/// dot when stroked, the way free-drag shape tools behave.
pub fn build_path(start: (f32, f32), end: (f32, f32), kind: ShapeKind) -> Option<Path> {
    let (x0, y0) = start;
    let (x1, y1) = end;
    let cx = (x0 + x1) / 2.0;
    let cy = (y0 + y1) / 2.0;

    let mut pb = PathBuilder::new();
    match kind {
        ShapeKind::Rectangle => {
            pb.push_rect(bounding_box(start, end)?);
        }
        ShapeKind::Circle => {
            // Ellipse inscribed in the drag box, as free-drag circle tools do.
            pb.push_oval(bounding_box(start, end)?);
        }
        ShapeKind::Triangle => {
            let rect = bounding_box(start, end)?;
            pb.move_to(cx, rect.top());
            pb.line_to(rect.right(), rect.bottom());
            pb.line_to(rect.left(), rect.bottom());
            pb.close();
        }
        ShapeKind::Line => {
            pb.move_to(x0, y0);
            pb.line_to(x1, y1);
        }
        ShapeKind::Arrow => {
            let theta = (y1 - y0).atan2(x1 - x0);
            pb.move_to(x0, y0);
            pb.line_to(x1, y1);
            for side in [-1.0f32, 1.0] {
                let angle = theta + side * ARROW_HEAD_ANGLE;
                pb.move_to(x1, y1);
                pb.line_to(x1 - ARROW_HEAD_LEN * angle.cos(), y1 - ARROW_HEAD_LEN * angle.sin());
            }
        }
        ShapeKind::Star => {
            let mut vertices = star_vertices(start, end).into_iter();
            let (sx, sy) = vertices.next()?;
            pb.move_to(sx, sy);
            for (x, y) in vertices {
                pb.line_to(x, y);
            }
            pb.close();
        }
        ShapeKind::Check => {
            let pad = glyph_inset(start, end);
            pb.move_to(x0 + pad, cy);
            pb.line_to(cx, y1 - pad);
            pb.line_to(x1 - pad, y0 + pad);
        }
        ShapeKind::Cross => {
            let pad = glyph_inset(start, end);
            pb.move_to(x0 + pad, y0 + pad);
            pb.line_to(x1 - pad, y1 - pad);
            pb.move_to(x1 - pad, y0 + pad);
            pb.line_to(x0 + pad, y1 - pad);
        }
    }
    pb.finish()
}

/// The ten vertices of the five-pointed star for a drag box, starting at the
/// top point and alternating outer and inner radius.
pub fn star_vertices(start: (f32, f32), end: (f32, f32)) -> Vec<(f32, f32)> {
    let (x0, y0) = start;
    let (x1, y1) = end;
    let cx = (x0 + x1) / 2.0;
    let cy = (y0 + y1) / 2.0;
    let outer = (x1 - x0).abs().min((y1 - y0).abs()) / 2.0;
    let inner = outer / 2.0;

    let step = PI / 5.0;
    let mut rot = 3.0 * PI / 2.0; // pointing up
    let mut vertices = Vec::with_capacity(10);
    for _ in 0..5 {
        vertices.push((cx + rot.cos() * outer, cy + rot.sin() * outer));
        rot += step;
        vertices.push((cx + rot.cos() * inner, cy + rot.sin() * inner));
        rot += step;
    }
    vertices
}

/// Stroke `kind` onto `pixmap`, filling first when the outline is closed and
/// the fill flag is set. Open kinds never fill, whatever the flag says.
pub fn rasterize(
    pixmap: &mut Pixmap,
    start: (f32, f32),
    end: (f32, f32),
    kind: ShapeKind,
    color: Color,
    width: f32,
    filled: bool,
) {
    let Some(path) = build_path(start, end, kind) else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);

    if filled && kind.is_closed() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Normalized drag box. Zero-area boxes are valid; `None` only for
/// non-finite anchors.
fn bounding_box(start: (f32, f32), end: (f32, f32)) -> Option<Rect> {
    Rect::from_ltrb(
        start.0.min(end.0),
        start.1.min(end.1),
        start.0.max(end.0),
        start.1.max(end.1),
    )
}

fn glyph_inset(start: (f32, f32), end: (f32, f32)) -> f32 {
    (end.0 - start.0).abs().min((end.1 - start.1).abs()) * GLYPH_INSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds_match_drag_box() {
        let path = build_path((0.0, 0.0), (100.0, 50.0), ShapeKind::Rectangle).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.width(), 100.0);
        assert_eq!(bounds.height(), 50.0);
        assert_eq!(bounds.left(), 0.0);
        assert_eq!(bounds.top(), 0.0);
    }

    #[test]
    fn test_inverted_drag_normalizes() {
        let path = build_path((100.0, 50.0), (0.0, 0.0), ShapeKind::Rectangle).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.width(), 100.0);
        assert_eq!(bounds.height(), 50.0);
    }

    #[test]
    fn test_star_has_ten_vertices() {
        let vertices = star_vertices((0.0, 0.0), (100.0, 100.0));
        assert_eq!(vertices.len(), 10);
        // First vertex points straight up from the center.
        let (x, y) = vertices[0];
        assert!((x - 50.0).abs() < 1e-3);
        assert!((y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn test_star_alternates_radii() {
        let vertices = star_vertices((0.0, 0.0), (100.0, 100.0));
        for (i, (x, y)) in vertices.iter().enumerate() {
            let r = ((x - 50.0).powi(2) + (y - 50.0).powi(2)).sqrt();
            let expected = if i % 2 == 0 { 50.0 } else { 25.0 };
            assert!((r - expected).abs() < 1e-2, "vertex {i} radius {r}");
        }
    }

    #[test]
    fn test_degenerate_drag_strokes_a_hairline() {
        let path = build_path((10.0, 10.0), (10.0, 50.0), ShapeKind::Rectangle).unwrap();
        assert_eq!(path.bounds().width(), 0.0);

        let mut pixmap = Pixmap::new(60, 60).unwrap();
        rasterize(
            &mut pixmap,
            (10.0, 10.0),
            (10.0, 50.0),
            ShapeKind::Rectangle,
            Color::black(),
            2.0,
            true,
        );
        assert!(pixmap.pixel(10, 30).unwrap().alpha() > 0);
        assert_eq!(pixmap.pixel(40, 30).unwrap().alpha(), 0);

        // Point drags build too, for every kind.
        assert!(build_path((10.0, 10.0), (10.0, 10.0), ShapeKind::Circle).is_some());
        assert!(build_path((10.0, 10.0), (10.0, 10.0), ShapeKind::Line).is_some());
    }

    #[test]
    fn test_open_kinds_ignore_fill_flag() {
        for kind in [ShapeKind::Line, ShapeKind::Arrow, ShapeKind::Check, ShapeKind::Cross] {
            let mut with_fill = Pixmap::new(120, 120).unwrap();
            let mut without = Pixmap::new(120, 120).unwrap();
            rasterize(&mut with_fill, (10.0, 10.0), (110.0, 110.0), kind, Color::black(), 3.0, true);
            rasterize(&mut without, (10.0, 10.0), (110.0, 110.0), kind, Color::black(), 3.0, false);
            assert_eq!(with_fill.data(), without.data(), "{kind:?}");
        }
    }

    #[test]
    fn test_filled_rectangle_covers_interior() {
        let mut pixmap = Pixmap::new(120, 120).unwrap();
        rasterize(
            &mut pixmap,
            (10.0, 10.0),
            (110.0, 110.0),
            ShapeKind::Rectangle,
            Color::opaque(0xef, 0x44, 0x44),
            2.0,
            true,
        );
        let center = pixmap.pixel(60, 60).unwrap();
        assert!(center.red() > 0);
        assert_eq!(center.alpha(), 0xff);
    }

    #[test]
    fn test_arrowhead_reaches_back_from_tip() {
        let mut pixmap = Pixmap::new(120, 60).unwrap();
        rasterize(
            &mut pixmap,
            (10.0, 30.0),
            (110.0, 30.0),
            ShapeKind::Arrow,
            Color::black(),
            2.0,
            false,
        );
        // A 15px head at +-30 degrees off a horizontal shaft lands near
        // (97, 22.5) and (97, 37.5).
        assert!(pixmap.pixel(97, 23).unwrap().alpha() > 0);
        assert!(pixmap.pixel(97, 37).unwrap().alpha() > 0);
    }
}
