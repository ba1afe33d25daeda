//! Room lifecycle and ephemeral presence.
//!
//! A session owns one sync channel and folds presence events (remote cursors,
//! laser-pointer points) into decaying local state. Everything else it
//! receives is handed to the caller for rendering.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::events::{DrawEvent, PeerId};
use crate::geometry::NormalizedPoint;
use crate::sync::{SyncChannel, SyncError, Transport};

/// How long a remote cursor or laser point stays visible.
pub const PRESENCE_DECAY: Duration = Duration::from_millis(800);

/// Length of a generated room code.
const ROOM_CODE_LEN: usize = 9;

/// Session lifecycle. Errors and manual leave both return to `Idle`;
/// there is no automatic reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
}

/// Last known cursor position for one remote peer.
#[derive(Debug, Clone, Copy)]
struct PeerCursor {
    position: NormalizedPoint,
    last_seen: Instant,
}

/// One point on the decaying laser-pointer trail (local or remote).
#[derive(Debug, Clone, Copy)]
struct LaserPoint {
    position: NormalizedPoint,
    at: Instant,
}

/// Owns the room connection and presence state for one participant.
pub struct SessionManager<T: Transport> {
    channel: SyncChannel<T>,
    state: SessionState,
    peers: HashMap<PeerId, PeerCursor>,
    laser: Vec<LaserPoint>,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            channel: SyncChannel::new(transport),
            state: SessionState::Idle,
            peers: HashMap::new(),
            laser: Vec::new(),
        }
    }

    /// Short shareable room code: nine lowercase base-36 characters.
    pub fn create_room_code() -> String {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        Uuid::new_v4()
            .as_bytes()
            .iter()
            .take(ROOM_CODE_LEN)
            .map(|b| DIGITS[*b as usize % DIGITS.len()] as char)
            .collect()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn peer_id(&self) -> PeerId {
        self.channel.peer_id()
    }

    pub fn room_code(&self) -> Option<&str> {
        self.channel.room()
    }

    /// Join `code`. On failure the session drops back to `Idle` and the
    /// caller may call `enter` again; there is no retry loop here.
    pub fn enter(&mut self, code: &str) -> Result<(), SyncError> {
        self.state = SessionState::Connecting;
        match self.channel.connect(code) {
            Ok(()) => {
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// Leave the room and forget all remote presence.
    pub fn leave(&mut self) {
        self.channel.disconnect();
        self.peers.clear();
        self.laser.clear();
        self.state = SessionState::Idle;
    }

    /// Broadcast a local event. A no-op outside a session.
    pub fn broadcast(&self, event: &DrawEvent) {
        if self.state == SessionState::Connected {
            self.channel.publish(event);
        }
    }

    /// Record the local laser position and share it with the room.
    pub fn point_laser(&mut self, position: NormalizedPoint) {
        self.laser.push(LaserPoint {
            position,
            at: Instant::now(),
        });
        self.broadcast(&DrawEvent::Laser { position });
    }

    /// Share the local pointer position with the room.
    pub fn move_cursor(&self, position: NormalizedPoint) {
        self.broadcast(&DrawEvent::Cursor { position });
    }

    /// Drain remote events. Presence (cursor, laser) is folded into session
    /// state; everything returned should be applied to the drawing engine.
    pub fn poll_remote(&mut self) -> Vec<DrawEvent> {
        let now = Instant::now();
        let mut drawable = Vec::new();
        for received in self.channel.poll_events() {
            match received.event {
                DrawEvent::Cursor { position } => {
                    self.peers.insert(
                        received.from,
                        PeerCursor {
                            position,
                            last_seen: now,
                        },
                    );
                }
                DrawEvent::Laser { position } => {
                    self.laser.push(LaserPoint { position, at: now });
                }
                event => drawable.push(event),
            }
        }
        drawable
    }

    /// Remote cursors seen within the decay window. Stale entries are only
    /// filtered, not purged; the map is tiny and rewritten constantly.
    pub fn live_cursors(&self) -> Vec<(PeerId, NormalizedPoint)> {
        self.cursors_at(Instant::now())
    }

    /// Decay filter against an explicit clock.
    pub fn cursors_at(&self, now: Instant) -> Vec<(PeerId, NormalizedPoint)> {
        self.peers
            .iter()
            .filter(|(_, cursor)| now.duration_since(cursor.last_seen) < PRESENCE_DECAY)
            .map(|(id, cursor)| (*id, cursor.position))
            .collect()
    }

    /// Laser points still inside the decay window, oldest first. Expired
    /// points are pruned here, once per tick.
    pub fn laser_trail(&mut self) -> Vec<NormalizedPoint> {
        self.laser_at(Instant::now())
    }

    /// Trail pruning against an explicit clock.
    pub fn laser_at(&mut self, now: Instant) -> Vec<NormalizedPoint> {
        self.laser
            .retain(|point| now.duration_since(point.at) < PRESENCE_DECAY);
        self.laser.iter().map(|point| point.position).collect()
    }
}
