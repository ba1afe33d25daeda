//! Slateboard Core Library
//!
//! Wire protocol, coordinate mapping, and session logic for the Slateboard
//! collaborative whiteboard. Rasterization lives in `slateboard-raster`.

pub mod events;
pub mod geometry;
pub mod session;
pub mod sync;

pub use events::{Color, DrawEvent, Envelope, PeerId, ShapeKind, ToolKind};
pub use geometry::{MappedPoint, NormalizedPoint, NormalizedSize, Viewport};
pub use session::{PRESENCE_DECAY, SessionManager, SessionState};
pub use sync::{ConnectionState, LocalBus, Received, SyncChannel, SyncError, Transport};
