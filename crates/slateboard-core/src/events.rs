//! The wire protocol: every drawable action as one tagged event.
//!
//! `DrawEvent` is the only type exchanged between peers. Whether an event was
//! produced locally or arrived from the room, it is rendered by the same
//! engine path, which is what keeps every surface in a room congruent.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{NormalizedPoint, NormalizedSize};

/// Identifies one peer in a room.
pub type PeerId = Uuid;

/// RGBA color carried over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::opaque(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::opaque(255, 255, 255)
    }

    /// Parse a `#rrggbb` hex string (the palette format used by the host UI).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::opaque(r, g, b))
    }
}

/// Freehand stroke tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Highlighter,
}

/// The fixed shape catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Line,
    Arrow,
    Star,
    Check,
    Cross,
}

impl ShapeKind {
    /// Closed outlines are the only ones eligible for filling; open glyphs
    /// (line, arrow, check, cross) ignore the fill flag.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Triangle | ShapeKind::Star
        )
    }
}

/// One drawable action, with all geometry normalized to viewport fractions.
///
/// `cursor` and `laser` are transient presence events: they never touch the
/// persistent surface and decay out of the overlay on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawEvent {
    /// One freehand stroke segment. Strokes are never sent whole; they are a
    /// continuous run of these, each independently broadcast.
    Draw {
        from: NormalizedPoint,
        to: NormalizedPoint,
        color: Color,
        width: f32,
        opacity: f32,
        tool: ToolKind,
    },
    /// A committed two-anchor shape.
    Shape {
        kind: ShapeKind,
        start: NormalizedPoint,
        end: NormalizedPoint,
        color: Color,
        width: f32,
        filled: bool,
    },
    /// A committed text annotation, anchored at its top-left corner.
    Text {
        position: NormalizedPoint,
        value: String,
        color: Color,
        font_size: f32,
    },
    /// An image placed on the board. `data` is base64-encoded raster bytes.
    Image {
        position: NormalizedPoint,
        size: NormalizedSize,
        data: String,
    },
    /// Wipe the board back to its background.
    Clear,
    /// The sender's pointer position.
    Cursor { position: NormalizedPoint },
    /// One point of the sender's laser-pointer trail.
    Laser { position: NormalizedPoint },
}

impl DrawEvent {
    /// Build an image event from raw encoded bytes (PNG or JPEG).
    pub fn image(position: NormalizedPoint, size: NormalizedSize, bytes: &[u8]) -> Self {
        DrawEvent::Image {
            position,
            size,
            data: STANDARD.encode(bytes),
        }
    }
}

/// Decode the base64 payload of an image event.
pub fn decode_image_data(data: &str) -> Option<Vec<u8>> {
    STANDARD.decode(data).ok()
}

/// The room message envelope: one event plus its originator.
///
/// The event tag is flattened into the envelope, so the wire shape is
/// `{"sender": "<uuid>", "type": "draw", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: PeerId,
    #[serde(flatten)]
    pub event: DrawEvent,
}

impl Envelope {
    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("failed to encode event: {e}");
                None
            }
        }
    }

    /// Parse a raw room payload. Malformed or unrecognized payloads yield
    /// `None` and are dropped by the caller, never an error.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> DrawEvent {
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
    fn test_envelope_roundtrip() {
        let envelope = Envelope {
            sender: Uuid::new_v4(),
            event: sample_event(),
        };
        let json = envelope.encode().unwrap();
        assert!(json.contains("\"type\":\"draw\""));
        assert_eq!(Envelope::decode(&json).unwrap(), envelope);
    }

    #[test]
    fn test_shape_event_tag() {
        let envelope = Envelope {
            sender: Uuid::new_v4(),
            event: DrawEvent::Shape {
                kind: ShapeKind::Star,
                start: NormalizedPoint::new(0.2, 0.2),
                end: NormalizedPoint::new(0.8, 0.8),
                color: Color::black(),
                width: 5.0,
                filled: true,
            },
        };
        let json = envelope.encode().unwrap();
        assert!(json.contains("\"type\":\"shape\""));
        assert!(json.contains("\"kind\":\"star\""));
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        assert!(Envelope::decode("not json at all").is_none());
        assert!(Envelope::decode("{\"sender\":\"nope\",\"type\":\"draw\"}").is_none());
        // Unknown event tag from a newer peer.
        let unknown = format!(
            "{{\"sender\":\"{}\",\"type\":\"sparkle\",\"x\":1}}",
            Uuid::new_v4()
        );
        assert!(Envelope::decode(&unknown).is_none());
    }

    #[test]
    fn test_image_data_roundtrip() {
        let bytes = [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0xff];
        let event = DrawEvent::image(
            NormalizedPoint::new(0.25, 0.25),
            NormalizedSize::new(0.5, 0.5),
            &bytes,
        );
        match event {
            DrawEvent::Image { data, .. } => {
                assert_eq!(decode_image_data(&data).unwrap(), bytes);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#4f46e5"), Some(Color::opaque(0x4f, 0x46, 0xe5)));
        assert_eq!(Color::from_hex("4f46e5"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_open_shapes_never_fill() {
        for kind in [ShapeKind::Line, ShapeKind::Arrow, ShapeKind::Check, ShapeKind::Cross] {
            assert!(!kind.is_closed());
        }
        for kind in [
            ShapeKind::Rectangle,
            ShapeKind::Circle,
            ShapeKind::Triangle,
            ShapeKind::Star,
        ] {
            assert!(kind.is_closed());
        }
    }
}
