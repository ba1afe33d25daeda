//! Text compositing with a fixed bitmap face.
//!
//! The usual text-shaping stacks are welded to GPU renderers and system font
//! lookup; this engine needs glyphs that come out byte-identical on every
//! peer. Text therefore uses an embedded 5x7 face scaled to the requested
//! size. Characters outside printable ASCII render as a hollow box.

use slateboard_core::Color;
use tiny_skia::{Paint, Pixmap, Rect, Transform};

/// Glyph cell: 5x7 ink pixels inside an 8-point line box, 6 points advance.
const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;
const CELL_HEIGHT: f32 = 8.0;
const ADVANCE: f32 = 6.0;

/// Draw `value` top-anchored: `position` is the top-left corner of the first
/// line, with one line per `\n` and a full `font_size` of leading.
pub fn draw(pixmap: &mut Pixmap, position: (f32, f32), value: &str, color: Color, font_size: f32) {
    if font_size <= 0.0 || value.is_empty() {
        return;
    }
    let scale = font_size / CELL_HEIGHT;
    let mut paint = Paint::default();
    // Hard pixel edges keep the face crisp at any scale.
    paint.anti_alias = false;
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);

    for (row, line) in value.split('\n').enumerate() {
        let top = position.1 + row as f32 * font_size;
        for (col, ch) in line.chars().enumerate() {
            let left = position.0 + col as f32 * ADVANCE * scale;
            draw_glyph(pixmap, left, top, ch, scale, &paint);
        }
    }
}

/// Advance width of one character at `font_size`.
pub fn char_advance(font_size: f32) -> f32 {
    ADVANCE * font_size / CELL_HEIGHT
}

fn draw_glyph(pixmap: &mut Pixmap, x: f32, y: f32, ch: char, scale: f32, paint: &Paint) {
    for (row, bits) in glyph_rows(ch).iter().enumerate() {
        for col in 0..GLYPH_COLS {
            if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                continue;
            }
            let rect = Rect::from_xywh(
                x + col as f32 * scale,
                y + row as f32 * scale,
                scale,
                scale,
            );
            if let Some(rect) = rect {
                pixmap.fill_rect(rect, paint, Transform::identity(), None);
            }
        }
    }
}

fn glyph_rows(ch: char) -> [u8; GLYPH_ROWS] {
    let code = ch as usize;
    if (0x20..=0x7e).contains(&code) {
        FONT[code - 0x20]
    } else {
        FALLBACK
    }
}

/// Hollow box for anything the face does not cover.
const FALLBACK: [u8; GLYPH_ROWS] = [
    0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111,
];

/// Printable ASCII, `' '` through `'~'`, one row byte per scanline with the
/// low five bits used (MSB is the left column).
#[rustfmt::skip]
const FONT: [[u8; GLYPH_ROWS]; 95] = [
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000], // ' '
    [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100], // '!'
    [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000], // '"'
    [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010], // '#'
    [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100], // '$'
    [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011], // '%'
    [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101], // '&'
    [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000], // '\''
    [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010], // '('
    [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000], // ')'
    [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000], // '*'
    [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000], // '+'
    [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000], // ','
    [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000], // '-'
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100], // '.'
    [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000], // '/'
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110], // '0'
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // '1'
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111], // '2'
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110], // '3'
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010], // '4'
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110], // '5'
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110], // '6'
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000], // '7'
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110], // '8'
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100], // '9'
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000], // ':'
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000], // ';'
    [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010], // '<'
    [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000], // '='
    [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000], // '>'
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100], // '?'
    [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110], // '@'
    [0b01110, 0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001], // 'A'
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110], // 'B'
    [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110], // 'C'
    [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100], // 'D'
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111], // 'E'
    [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000], // 'F'
    [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111], // 'G'
    [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001], // 'H'
    [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 'I'
    [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100], // 'J'
    [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001], // 'K'
    [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111], // 'L'
    [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001], // 'M'
    [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001], // 'N'
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // 'O'
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000], // 'P'
    [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101], // 'Q'
    [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001], // 'R'
    [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110], // 'S'
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100], // 'T'
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // 'U'
    [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // 'V'
    [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010], // 'W'
    [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001], // 'X'
    [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100], // 'Y'
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111], // 'Z'
    [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110], // '['
    [0b00000, 0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000], // '\\'
    [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110], // ']'
    [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000], // '^'
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111], // '_'
    [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000], // '`'
    [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111], // 'a'
    [0b10000, 0b10000, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110], // 'b'
    [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110], // 'c'
    [0b00001, 0b00001, 0b01111, 0b10001, 0b10001, 0b10001, 0b01111], // 'd'
    [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110], // 'e'
    [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000], // 'f'
    [0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110], // 'g'
    [0b10000, 0b10000, 0b11110, 0b10001, 0b10001, 0b10001, 0b10001], // 'h'
    [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110], // 'i'
    [0b00010, 0b00000, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100], // 'j'
    [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010], // 'k'
    [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 'l'
    [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10101, 0b10101], // 'm'
    [0b00000, 0b00000, 0b11110, 0b10001, 0b10001, 0b10001, 0b10001], // 'n'
    [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // 'o'
    [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000], // 'p'
    [0b00000, 0b00000, 0b01111, 0b10001, 0b01111, 0b00001, 0b00001], // 'q'
    [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000], // 'r'
    [0b00000, 0b00000, 0b01111, 0b10000, 0b01110, 0b00001, 0b11110], // 's'
    [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110], // 't'
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101], // 'u'
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // 'v'
    [0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010], // 'w'
    [0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001], // 'x'
    [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110], // 'y'
    [0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111], // 'z'
    [0b00010, 0b00100, 0b00100, 0b01000, 0b00100, 0b00100, 0b00010], // '{'
    [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100], // '|'
    [0b01000, 0b00100, 0b00100, 0b00010, 0b00100, 0b00100, 0b01000], // '}'
    [0b00000, 0b00000, 0b01000, 0b10101, 0b00010, 0b00000, 0b00000], // '~'
];

#[cfg(test)]
mod tests {
    use super::*;

    fn inked(pixmap: &Pixmap) -> usize {
        pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }

    #[test]
    fn test_draw_marks_pixels() {
        let mut pixmap = Pixmap::new(100, 40).unwrap();
        draw(&mut pixmap, (2.0, 2.0), "Hi", Color::black(), 16.0);
        assert!(inked(&pixmap) > 0);
    }

    #[test]
    fn test_draw_is_deterministic() {
        let mut a = Pixmap::new(120, 60).unwrap();
        let mut b = Pixmap::new(120, 60).unwrap();
        draw(&mut a, (4.0, 4.0), "parity", Color::opaque(0x22, 0xc5, 0x5e), 20.0);
        draw(&mut b, (4.0, 4.0), "parity", Color::opaque(0x22, 0xc5, 0x5e), 20.0);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_second_line_starts_one_font_size_down() {
        let mut one = Pixmap::new(100, 80).unwrap();
        let mut two = Pixmap::new(100, 80).unwrap();
        draw(&mut one, (2.0, 2.0), "a", Color::black(), 16.0);
        draw(&mut two, (2.0, 2.0), "a\na", Color::black(), 16.0);
        // The second line lands below y = 18 where the first draw left nothing.
        let below = |p: &Pixmap| {
            (0..100)
                .flat_map(|x| (20..80).map(move |y| (x, y)))
                .filter(|&(x, y)| p.pixel(x, y).unwrap().alpha() > 0)
                .count()
        };
        assert_eq!(below(&one), 0);
        assert!(below(&two) > 0);
    }

    #[test]
    fn test_char_advance_pins_column_layout() {
        let size = 16.0;
        let mut together = Pixmap::new(120, 40).unwrap();
        draw(&mut together, (4.0, 4.0), "AB", Color::black(), size);

        // Placing the second glyph one advance over reproduces the layout
        // byte for byte.
        let mut separate = Pixmap::new(120, 40).unwrap();
        draw(&mut separate, (4.0, 4.0), "A", Color::black(), size);
        draw(&mut separate, (4.0 + char_advance(size), 4.0), "B", Color::black(), size);
        assert_eq!(together.data(), separate.data());
    }

    #[test]
    fn test_unknown_glyph_falls_back_to_box() {
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        draw(&mut pixmap, (2.0, 2.0), "\u{65e5}", Color::black(), 16.0);
        assert!(inked(&pixmap) > 0);
    }

    #[test]
    fn test_empty_and_degenerate_are_noops() {
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        draw(&mut pixmap, (2.0, 2.0), "", Color::black(), 16.0);
        draw(&mut pixmap, (2.0, 2.0), "x", Color::black(), 0.0);
        assert_eq!(inked(&pixmap), 0);
    }
}
