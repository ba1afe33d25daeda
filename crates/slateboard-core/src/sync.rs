//! Event transport: room-keyed broadcast with no local echo.
//!
//! The concrete realtime service belongs to the host application; this module
//! only defines the seam (`Transport`) and the channel object that owns one
//! registration. `LocalBus` is the in-process transport used by tests and by
//! single-machine embedding.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

use crate::events::{DrawEvent, Envelope, PeerId};

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("not connected to a room")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Connection state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// The receive side of one room registration. Dropping it (or the whole
/// channel) releases the registration on the next broadcast.
pub struct Subscription {
    rx: Receiver<String>,
}

impl Subscription {
    /// Wrap the receive side handed out by a transport.
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

/// Room-keyed broadcast primitive.
///
/// Implementations move opaque string payloads between room members and must
/// never deliver a payload back to its sender. Delivery is at-most-once and
/// best-effort; only payloads from a single sender keep their order.
pub trait Transport {
    /// Register `peer` in `room`, returning the receive side.
    fn join(&self, room: &str, peer: PeerId) -> Result<Subscription, SyncError>;

    /// Remove `peer` from `room`.
    fn leave(&self, room: &str, peer: PeerId);

    /// Deliver `payload` to every member of `room` except `sender`.
    fn broadcast(&self, room: &str, sender: PeerId, payload: &str) -> Result<(), SyncError>;
}

/// In-process transport backed by per-peer mpsc channels.
///
/// Clones share one room registry, so every participant in a test or an
/// embedding holds a clone of the same bus.
#[derive(Clone, Default)]
pub struct LocalBus {
    rooms: Arc<Mutex<HashMap<String, Vec<(PeerId, Sender<String>)>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered members in `room`. Zero for unknown rooms.
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms
            .lock()
            .map(|rooms| rooms.get(room).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl Transport for LocalBus {
    fn join(&self, room: &str, peer: PeerId) -> Result<Subscription, SyncError> {
        let (tx, rx) = channel();
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| SyncError::Transport("bus registry poisoned".into()))?;
        rooms.entry(room.to_string()).or_default().push((peer, tx));
        Ok(Subscription { rx })
    }

    fn leave(&self, room: &str, peer: PeerId) {
        if let Ok(mut rooms) = self.rooms.lock() {
            if let Some(members) = rooms.get_mut(room) {
                members.retain(|(id, _)| *id != peer);
                if members.is_empty() {
                    rooms.remove(room);
                }
            }
        }
    }

    fn broadcast(&self, room: &str, sender: PeerId, payload: &str) -> Result<(), SyncError> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| SyncError::Transport("bus registry poisoned".into()))?;
        if let Some(members) = rooms.get_mut(room) {
            // Members whose receive side is gone are dropped here.
            members.retain(|(id, tx)| *id == sender || tx.send(payload.to_string()).is_ok());
        }
        Ok(())
    }
}

/// An event received from another peer.
#[derive(Debug, Clone)]
pub struct Received {
    pub from: PeerId,
    pub event: DrawEvent,
}

/// One peer's handle on a room: publish out, poll in.
pub struct SyncChannel<T: Transport> {
    transport: T,
    peer_id: PeerId,
    room: Option<String>,
    state: ConnectionState,
    subscription: Option<Subscription>,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            peer_id: Uuid::new_v4(),
            room: None,
            state: ConnectionState::Disconnected,
            subscription: None,
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Join `room`. Reconnecting to the current room is a no-op; a different
    /// code moves the registration. A failed join leaves the channel in a
    /// non-connected state and the caller decides whether to try again.
    pub fn connect(&mut self, room: &str) -> Result<(), SyncError> {
        if self.room.as_deref() == Some(room) && self.is_connected() {
            return Ok(());
        }
        self.disconnect();
        self.state = ConnectionState::Connecting;
        match self.transport.join(room, self.peer_id) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.room = Some(room.to_string());
                self.state = ConnectionState::Connected;
                log::info!("joined room {room}");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Error;
                Err(e)
            }
        }
    }

    /// Leave the current room and release the registration.
    pub fn disconnect(&mut self) {
        if let Some(room) = self.room.take() {
            self.transport.leave(&room, self.peer_id);
            log::info!("left room {room}");
        }
        self.subscription = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Fire-and-forget broadcast of one event. Outside a room this is a
    /// silent no-op; a transport failure is logged, never surfaced, so a
    /// flaky network can't abort the local drawing pipeline.
    pub fn publish(&self, event: &DrawEvent) {
        let Some(room) = self.room.as_deref() else {
            return;
        };
        let envelope = Envelope {
            sender: self.peer_id,
            event: event.clone(),
        };
        if let Some(json) = envelope.encode() {
            if let Err(e) = self.transport.broadcast(room, self.peer_id, &json) {
                log::warn!("broadcast to {room} failed: {e}");
            }
        }
    }

    /// Drain everything received since the last poll. Malformed payloads and
    /// any echo of our own events are dropped.
    pub fn poll_events(&mut self) -> Vec<Received> {
        let Some(subscription) = self.subscription.as_ref() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        while let Ok(raw) = subscription.rx.try_recv() {
            match Envelope::decode(&raw) {
                Some(envelope) if envelope.sender != self.peer_id => events.push(Received {
                    from: envelope.sender,
                    event: envelope.event,
                }),
                Some(_) => {}
                None => log::warn!("dropping malformed room payload"),
            }
        }
        events
    }
}

impl<T: Transport> Drop for SyncChannel<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
