// ============================
// crates/backend-lib/src/relay.rs
// ============================
//! Presence tracking and room-scoped fan-out for the live connection.
//!
//! The relay owns two in-memory tables: a presence map from user id to the
//! single live connection that currently represents that user, and a room
//! table mapping each trip to its connected members. Neither table is
//! persisted; both are rebuilt from scratch as clients reconnect after a
//! restart.
//!
//! Delivery is best effort. The durable REST record is the system of
//! record; a dropped relay event only costs latency, never correctness.
//! All methods are synchronous: table mutations never suspend, and sends
//! go through `try_send` so a slow consumer cannot stall the relay.
use chrono::Utc;
use dashmap::DashMap;
use hopalong_common::ServerEvent;
use metrics::counter;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics as keys;

pub type ConnectionId = Uuid;

/// Buffered events per connection before the relay starts dropping.
pub const CONNECTION_BUFFER: usize = 32;

struct PresenceEntry {
    conn_id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

struct RoomMember {
    conn_id: ConnectionId,
    user_id: Option<String>,
    tx: mpsc::Sender<ServerEvent>,
}

/// The relay service object. Constructed once at process start and shared
/// through `AppState`; event handlers call into it with plain channel
/// senders, so it is testable without a live transport.
#[derive(Default)]
pub struct Relay {
    presence: DashMap<String, PresenceEntry>,
    rooms: DashMap<String, Vec<RoomMember>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which user owns a connection. A reconnect from the same user
    /// overwrites the previous entry; last connection wins.
    pub fn announce(&self, conn_id: ConnectionId, user_id: &str, tx: mpsc::Sender<ServerEvent>) {
        tracing::debug!(%conn_id, user_id, "user announced");
        self.presence
            .insert(user_id.to_string(), PresenceEntry { conn_id, tx });
    }

    /// Enter a trip room and tell the other members.
    pub fn join_room(
        &self,
        trip_id: &str,
        conn_id: ConnectionId,
        user_id: Option<&str>,
        tx: mpsc::Sender<ServerEvent>,
    ) {
        let mut members = self.rooms.entry(trip_id.to_string()).or_default();
        // A rejoin from the same connection replaces its old membership.
        members.retain(|m| m.conn_id != conn_id);

        let event = ServerEvent::UserJoined {
            user_id: user_id.map(str::to_string),
            timestamp: Utc::now(),
        };
        for member in members.iter() {
            let _ = member.tx.try_send(event.clone());
        }

        members.push(RoomMember {
            conn_id,
            user_id: user_id.map(str::to_string),
            tx,
        });
        counter!(keys::ROOM_JOIN).increment(1);
        tracing::debug!(%conn_id, trip_id, "joined room");
    }

    /// Exit a trip room and tell the remaining members. Leaving a room the
    /// connection never joined still notifies the room, matching the
    /// original behavior; an unknown room is a no-op.
    pub fn leave_room(&self, trip_id: &str, conn_id: ConnectionId, user_id: Option<&str>) {
        let Some(mut members) = self.rooms.get_mut(trip_id) else {
            return;
        };
        members.retain(|m| m.conn_id != conn_id);

        let event = ServerEvent::UserLeft {
            user_id: user_id.map(str::to_string),
            timestamp: Utc::now(),
        };
        for member in members.iter() {
            let _ = member.tx.try_send(event.clone());
        }
        tracing::debug!(%conn_id, trip_id, "left room");
    }

    /// Fan a chat payload out to every member of the trip room, sender
    /// included; clients reconcile the echo by message id. The payload is
    /// decorated with a server timestamp. Broadcasting to an empty or
    /// unknown room is a no-op.
    pub fn broadcast_chat(&self, trip_id: &str, mut message: Value) {
        if let Some(obj) = message.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        let event = ServerEvent::MessageNew(message);

        if let Some(members) = self.rooms.get(trip_id) {
            for member in members.iter() {
                let _ = member.tx.try_send(event.clone());
            }
            counter!(keys::CHAT_BROADCAST).increment(1);
        }
    }

    /// Rebroadcast a typing indicator to the other members of the room.
    pub fn broadcast_typing(&self, trip_id: &str, sender: ConnectionId, event: ServerEvent) {
        if let Some(members) = self.rooms.get(trip_id) {
            for member in members.iter().filter(|m| m.conn_id != sender) {
                let _ = member.tx.try_send(event.clone());
            }
        }
    }

    /// Deliver an event to a specific user's live connection, if any.
    /// Absence is not an error: the caller already has the durable record,
    /// the push is a latency optimization. Returns whether a delivery was
    /// attempted.
    pub fn notify_user(&self, user_id: &str, event: ServerEvent) -> bool {
        match self.presence.get(user_id) {
            Some(entry) => {
                let _ = entry.tx.try_send(event);
                counter!(keys::NOTIFY_DELIVERED).increment(1);
                tracing::debug!(user_id, "notification delivered");
                true
            },
            None => {
                counter!(keys::NOTIFY_DROPPED).increment(1);
                tracing::debug!(user_id, "notification dropped, user offline");
                false
            },
        }
    }

    /// Clean up after a closed connection: drop its room memberships and
    /// clear the presence entry, but only if the entry still points at
    /// this connection. If the user already reconnected, the newer entry
    /// must survive.
    pub fn disconnect(&self, conn_id: ConnectionId, user_id: Option<&str>) {
        for mut members in self.rooms.iter_mut() {
            members.retain(|m| m.conn_id != conn_id);
        }
        if let Some(user_id) = user_id {
            self.presence
                .remove_if(user_id, |_, entry| entry.conn_id == conn_id);
        }
        tracing::debug!(%conn_id, "connection cleaned up");
    }

    /// Number of users with a live connection.
    pub fn online_count(&self) -> usize {
        self.presence.len()
    }

    /// Number of members currently in a trip room.
    pub fn room_size(&self, trip_id: &str) -> usize {
        self.rooms.get(trip_id).map_or(0, |m| m.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn() -> (ConnectionId, mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        (Uuid::new_v4(), tx, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_chat_fans_out_to_room_including_sender() {
        let relay = Relay::new();
        let (a_id, a_tx, mut a_rx) = conn();
        let (b_id, b_tx, mut b_rx) = conn();
        let (_c_id, _c_tx, mut c_rx) = conn();

        relay.join_room("trip-1", a_id, Some("alice"), a_tx);
        relay.join_room("trip-1", b_id, Some("bob"), b_tx);
        // c never joins trip-1.

        drain(&mut a_rx);
        drain(&mut b_rx);

        relay.broadcast_chat("trip-1", json!({"content": "hello", "id": "m1"}));

        let a_events = drain(&mut a_rx);
        let b_events = drain(&mut b_rx);
        assert_eq!(a_events.len(), 1);
        assert_eq!(b_events.len(), 1);
        assert!(drain(&mut c_rx).is_empty());

        match &a_events[0] {
            ServerEvent::MessageNew(payload) => {
                assert_eq!(payload["content"], "hello");
                assert!(payload["timestamp"].is_string());
            },
            other => panic!("expected MessageNew, got {other:?}"),
        }
    }

    #[test]
    fn test_join_notifies_existing_members_only() {
        let relay = Relay::new();
        let (a_id, a_tx, mut a_rx) = conn();
        let (b_id, b_tx, mut b_rx) = conn();

        relay.join_room("trip-1", a_id, Some("alice"), a_tx);
        assert!(drain(&mut a_rx).is_empty()); // empty room, nobody to tell

        relay.join_room("trip-1", b_id, Some("bob"), b_tx);
        let a_events = drain(&mut a_rx);
        assert_eq!(a_events.len(), 1);
        match &a_events[0] {
            ServerEvent::UserJoined { user_id, .. } => {
                assert_eq!(user_id.as_deref(), Some("bob"));
            },
            other => panic!("expected UserJoined, got {other:?}"),
        }
        // The joiner does not hear about its own arrival.
        assert!(drain(&mut b_rx).is_empty());
    }

    #[test]
    fn test_leave_notifies_remaining_members() {
        let relay = Relay::new();
        let (a_id, a_tx, mut a_rx) = conn();
        let (b_id, b_tx, _b_rx) = conn();

        relay.join_room("trip-1", a_id, Some("alice"), a_tx);
        relay.join_room("trip-1", b_id, Some("bob"), b_tx);
        drain(&mut a_rx);

        relay.leave_room("trip-1", b_id, Some("bob"));
        let events = drain(&mut a_rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::UserLeft { .. }));
        assert_eq!(relay.room_size("trip-1"), 1);
    }

    #[test]
    fn test_leave_before_join_is_harmless() {
        let relay = Relay::new();
        let (id, _tx, _rx) = conn();
        // Unknown room, never-joined connection: must not panic.
        relay.leave_room("trip-9", id, Some("ghost"));
        assert_eq!(relay.room_size("trip-9"), 0);
    }

    #[test]
    fn test_broadcast_to_empty_room_is_noop() {
        let relay = Relay::new();
        relay.broadcast_chat("trip-9", json!({"content": "void"}));
    }

    #[test]
    fn test_targeted_notification_requires_presence() {
        let relay = Relay::new();
        let (id, tx, mut rx) = conn();

        // Offline target: accepted, no delivery, no error.
        assert!(!relay.notify_user("olivia", ServerEvent::RequestNotification(json!({"id": "r1"}))));

        relay.announce(id, "olivia", tx);
        assert!(relay.notify_user("olivia", ServerEvent::RequestNotification(json!({"id": "r1"}))));
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_reconnect_overwrites_presence() {
        let relay = Relay::new();
        let (old_id, old_tx, mut old_rx) = conn();
        let (new_id, new_tx, mut new_rx) = conn();

        relay.announce(old_id, "asha", old_tx);
        relay.announce(new_id, "asha", new_tx);
        assert_eq!(relay.online_count(), 1);

        relay.notify_user("asha", ServerEvent::RequestStatusUpdate(json!({"ok": true})));
        assert!(drain(&mut old_rx).is_empty());
        assert_eq!(drain(&mut new_rx).len(), 1);
    }

    #[test]
    fn test_stale_disconnect_keeps_newer_presence() {
        let relay = Relay::new();
        let (old_id, old_tx, _old_rx) = conn();
        let (new_id, new_tx, mut new_rx) = conn();

        relay.announce(old_id, "asha", old_tx);
        relay.announce(new_id, "asha", new_tx);

        // The old connection's disconnect fires after the reconnect; it
        // must not clobber the newer mapping.
        relay.disconnect(old_id, Some("asha"));
        assert_eq!(relay.online_count(), 1);
        assert!(relay.notify_user("asha", ServerEvent::RequestStatusUpdate(json!({}))));
        assert_eq!(drain(&mut new_rx).len(), 1);

        relay.disconnect(new_id, Some("asha"));
        assert_eq!(relay.online_count(), 0);
    }

    #[test]
    fn test_disconnect_removes_room_memberships() {
        let relay = Relay::new();
        let (a_id, a_tx, mut a_rx) = conn();
        let (b_id, b_tx, _b_rx) = conn();

        relay.join_room("trip-1", a_id, Some("alice"), a_tx.clone());
        relay.join_room("trip-2", a_id, Some("alice"), a_tx);
        relay.join_room("trip-1", b_id, Some("bob"), b_tx);
        drain(&mut a_rx);

        relay.disconnect(a_id, Some("alice"));
        assert_eq!(relay.room_size("trip-1"), 1);
        assert_eq!(relay.room_size("trip-2"), 0);
    }

    #[test]
    fn test_typing_excludes_sender() {
        let relay = Relay::new();
        let (a_id, a_tx, mut a_rx) = conn();
        let (b_id, b_tx, mut b_rx) = conn();

        relay.join_room("trip-1", a_id, Some("alice"), a_tx);
        relay.join_room("trip-1", b_id, Some("bob"), b_tx);
        drain(&mut a_rx);
        drain(&mut b_rx);

        relay.broadcast_typing(
            "trip-1",
            a_id,
            ServerEvent::UserTyping {
                user_id: "alice".into(),
                user_name: Some("Alice".into()),
            },
        );
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(drain(&mut b_rx).len(), 1);
    }
}
