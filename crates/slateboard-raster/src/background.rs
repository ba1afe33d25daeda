//! Base-layer painting: theme fill, chalk texture, and ruled patterns.
//!
//! `paint` is a pure function of its inputs. The chalk texture is derived
//! from pixel coordinates alone, so two peers painting the same theme at the
//! same size produce identical bytes — replay parity starts at the bottom
//! layer.

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform};

/// Reference spacing of the ruled patterns, in pixels.
pub const PATTERN_SPACING: f32 = 40.0;

/// Dot radius for the dotted pattern.
const DOT_RADIUS: f32 = 1.5;

/// Board surface theme. Selection is local-only and never synchronized;
/// peers in one room may look at different surfaces under the same ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Plain white board.
    #[default]
    Plain,
    /// Green chalkboard with a subtle texture.
    GreenChalk,
    /// Near-black chalkboard with a subtle texture.
    BlackChalk,
}

impl Theme {
    /// The base fill. Also the color the eraser strokes with.
    pub fn base_color(self) -> (u8, u8, u8) {
        match self {
            Theme::Plain => (0xff, 0xff, 0xff),
            Theme::GreenChalk => (0x2a, 0x4d, 0x3e),
            Theme::BlackChalk => (0x18, 0x1a, 0x1b),
        }
    }

    /// Color of ruled lines and grid strokes.
    fn pattern_color(self) -> (u8, u8, u8, u8) {
        match self {
            Theme::Plain => (0xe2, 0xe8, 0xf0, 0xff),
            Theme::GreenChalk | Theme::BlackChalk => (0xff, 0xff, 0xff, 0x26),
        }
    }

    /// Color of the dotted pattern.
    fn dot_color(self) -> (u8, u8, u8, u8) {
        match self {
            Theme::Plain => (0xcb, 0xd5, 0xe1, 0xff),
            Theme::GreenChalk | Theme::BlackChalk => (0xff, 0xff, 0xff, 0x33),
        }
    }

    fn textured(self) -> bool {
        !matches!(self, Theme::Plain)
    }
}

/// Ruled pattern drawn over the base fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pattern {
    #[default]
    Plain,
    Lines,
    Grid,
    Dots,
}

/// Paint the full base layer: fill, optional chalk texture, then pattern.
pub fn paint(pixmap: &mut Pixmap, pattern: Pattern, theme: Theme) {
    let (r, g, b) = theme.base_color();
    pixmap.fill(Color::from_rgba8(r, g, b, 0xff));

    if theme.textured() {
        texture(pixmap);
    }

    let width = pixmap.width() as f32;
    let height = pixmap.height() as f32;
    let mut paint = Paint::default();
    paint.anti_alias = true;

    match pattern {
        Pattern::Plain => {}
        Pattern::Lines => {
            let (r, g, b, a) = theme.pattern_color();
            paint.set_color_rgba8(r, g, b, a);
            stroke_rules(pixmap, &paint, width, height, false);
        }
        Pattern::Grid => {
            let (r, g, b, a) = theme.pattern_color();
            paint.set_color_rgba8(r, g, b, a);
            stroke_rules(pixmap, &paint, width, height, true);
        }
        Pattern::Dots => {
            let (r, g, b, a) = theme.dot_color();
            paint.set_color_rgba8(r, g, b, a);
            fill_dots(pixmap, &paint, width, height);
        }
    }
}

/// Horizontal rules, plus vertical ones when `grid` is set.
fn stroke_rules(pixmap: &mut Pixmap, paint: &Paint, width: f32, height: f32, grid: bool) {
    let mut pb = PathBuilder::new();
    let mut y = PATTERN_SPACING;
    while y < height {
        pb.move_to(0.0, y);
        pb.line_to(width, y);
        y += PATTERN_SPACING;
    }
    if grid {
        let mut x = PATTERN_SPACING;
        while x < width {
            pb.move_to(x, 0.0);
            pb.line_to(x, height);
            x += PATTERN_SPACING;
        }
    }
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }
}

/// A dot at every rule intersection.
fn fill_dots(pixmap: &mut Pixmap, paint: &Paint, width: f32, height: f32) {
    let mut pb = PathBuilder::new();
    let mut x = PATTERN_SPACING;
    while x < width {
        let mut y = PATTERN_SPACING;
        while y < height {
            pb.push_circle(x, y, DOT_RADIUS);
            y += PATTERN_SPACING;
        }
        x += PATTERN_SPACING;
    }
    if let Some(path) = pb.finish() {
        pixmap.fill_path(
            &path,
            paint,
            tiny_skia::FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

/// Deterministic chalk grain: a sparse scattering of lightened pixels keyed
/// on pixel coordinates.
fn texture(pixmap: &mut Pixmap) {
    let width = pixmap.width() as usize;
    for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        let n = mix(x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B));
        if n % 29 == 0 {
            let lift = 8 + (n >> 8) as u8 % 10;
            let r = px.red().saturating_add(lift);
            let g = px.green().saturating_add(lift);
            let b = px.blue().saturating_add(lift);
            if let Some(c) = PremultipliedColorU8::from_rgba(r, g, b, 0xff) {
                *px = c;
            }
        }
    }
}

/// splitmix-style integer mixing.
fn mix(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(width: u32, height: u32, pattern: Pattern, theme: Theme) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        paint(&mut pixmap, pattern, theme);
        pixmap
    }

    #[test]
    fn test_paint_is_deterministic() {
        for theme in [Theme::Plain, Theme::GreenChalk, Theme::BlackChalk] {
            for pattern in [Pattern::Plain, Pattern::Lines, Pattern::Grid, Pattern::Dots] {
                let a = painted(120, 90, pattern, theme);
                let b = painted(120, 90, pattern, theme);
                assert_eq!(a.data(), b.data());
            }
        }
    }

    #[test]
    fn test_plain_white_is_uniform() {
        let pixmap = painted(64, 64, Pattern::Plain, Theme::Plain);
        assert!(pixmap.pixels().iter().all(|p| p.red() == 0xff
            && p.green() == 0xff
            && p.blue() == 0xff
            && p.alpha() == 0xff));
    }

    #[test]
    fn test_lines_darken_rule_rows() {
        let pixmap = painted(200, 200, Pattern::Lines, Theme::Plain);
        let on_rule = pixmap.pixel(100, 40).unwrap();
        let off_rule = pixmap.pixel(100, 20).unwrap();
        assert!(on_rule.red() < off_rule.red());
    }

    #[test]
    fn test_dots_mark_intersections() {
        let pixmap = painted(200, 200, Pattern::Dots, Theme::Plain);
        let dot = pixmap.pixel(40, 40).unwrap();
        let blank = pixmap.pixel(20, 20).unwrap();
        assert!(dot.red() < blank.red());
        assert_eq!(blank.red(), 0xff);
    }

    #[test]
    fn test_chalk_texture_varies() {
        let pixmap = painted(64, 64, Pattern::Plain, Theme::GreenChalk);
        let (r, g, b) = Theme::GreenChalk.base_color();
        let lifted = pixmap
            .pixels()
            .iter()
            .filter(|p| (p.red(), p.green(), p.blue()) != (r, g, b))
            .count();
        assert!(lifted > 0);
    }
}
