//! Room fan-out: one broadcast channel per session.

use crate::events::ServerEvent;
use crate::session::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

/// Events buffered per room before slow receivers start lagging.
const ROOM_CAPACITY: usize = 256;

/// Fire-and-forget delivery of events to a session's members.
pub trait Broadcaster: Send + Sync {
    /// Sends an event to everyone currently in the session's room.
    fn broadcast(&self, session_id: &str, event: ServerEvent);

    /// Drops the room when the session is destroyed.
    fn close(&self, _session_id: &str) {}
}

/// Broadcast channels keyed by session.
#[derive(Debug, Clone, Default)]
pub struct Rooms {
    rooms: Arc<Mutex<HashMap<SessionId, broadcast::Sender<ServerEvent>>>>,
}

impl Rooms {
    /// Creates an empty room registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<SessionId, broadcast::Sender<ServerEvent>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes a connection to a session's room, creating it if needed.
    #[instrument(skip(self))]
    pub fn join_room(&self, session_id: &str) -> broadcast::Receiver<ServerEvent> {
        let mut rooms = self.rooms();
        let sender = rooms
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0);
        debug!(members = sender.receiver_count() + 1, "Joined room");
        sender.subscribe()
    }

    /// Connections currently subscribed to a room.
    #[instrument(skip(self))]
    pub fn member_count(&self, session_id: &str) -> usize {
        self.rooms()
            .get(session_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Broadcaster for Rooms {
    #[instrument(skip(self, event))]
    fn broadcast(&self, session_id: &str, event: ServerEvent) {
        let name = event.name();
        // Sending with no subscribers fails; nobody is listening, so drop it.
        let delivered = self
            .rooms()
            .get(session_id)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0);
        debug!(event = name, delivered, "Broadcast");
    }

    #[instrument(skip(self))]
    fn close(&self, session_id: &str) {
        self.rooms().remove(session_id);
        debug!("Room closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WinNotice;

    fn win() -> ServerEvent {
        ServerEvent::Win(WinNotice {
            player_name: "Ada".into(),
            rule: "Row".into(),
        })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_member() {
        let rooms = Rooms::new();
        let mut first = rooms.join_room("s1");
        let mut second = rooms.join_room("s1");
        let mut other = rooms.join_room("s2");

        rooms.broadcast("s1", win());

        assert_eq!(first.recv().await.unwrap(), win());
        assert_eq!(second.recv().await.unwrap(), win());
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_without_room_is_dropped() {
        let rooms = Rooms::new();
        rooms.broadcast("missing", win());
        assert_eq!(rooms.member_count("missing"), 0);
    }

    #[test]
    fn test_close_drops_room() {
        let rooms = Rooms::new();
        let _rx = rooms.join_room("s1");
        assert_eq!(rooms.member_count("s1"), 1);
        rooms.close("s1");
        assert_eq!(rooms.member_count("s1"), 0);
    }
}
