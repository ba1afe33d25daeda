//! Coordinate mapping between device pixels and viewport fractions.
//!
//! All geometry that crosses the wire is normalized to `[0, 1]` fractions of
//! the local viewport, so peers with different canvas pixel sizes render
//! congruent results.

use serde::{Deserialize, Serialize};

/// A point expressed as fractions of the viewport width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub nx: f32,
    pub ny: f32,
}

impl NormalizedPoint {
    pub fn new(nx: f32, ny: f32) -> Self {
        Self { nx, ny }
    }

    /// Clamp both fractions into `[0, 1]`.
    pub fn clamp(self) -> Self {
        Self {
            nx: self.nx.clamp(0.0, 1.0),
            ny: self.ny.clamp(0.0, 1.0),
        }
    }
}

/// A size expressed as fractions of the viewport width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSize {
    pub w: f32,
    pub h: f32,
}

impl NormalizedSize {
    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// A device point together with its normalized counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedPoint {
    /// Viewport-local pixel x.
    pub x: f32,
    /// Viewport-local pixel y.
    pub y: f32,
    pub nx: f32,
    pub ny: f32,
}

impl MappedPoint {
    pub fn normalized(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.nx, self.ny)
    }
}

/// The on-screen rectangle of the drawing area, in device pixels.
///
/// The host layout owns this; the core only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// A viewport anchored at the device origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Map a raw device point into viewport-local pixels and fractions.
    ///
    /// A zero-size viewport yields NaN fractions; callers must not create
    /// one (the host guarantees a laid-out surface before input arrives).
    pub fn normalize(&self, device_x: f32, device_y: f32) -> MappedPoint {
        let x = device_x - self.origin_x;
        let y = device_y - self.origin_y;
        MappedPoint {
            x,
            y,
            nx: x / self.width,
            ny: y / self.height,
        }
    }

    /// Map a normalized point back to viewport-local pixels.
    pub fn denormalize(&self, point: NormalizedPoint) -> (f32, f32) {
        (point.nx * self.width, point.ny * self.height)
    }
}
