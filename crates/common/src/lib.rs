// ================
// crates/common/src/lib.rs
// ================
//! Wire protocol shared between the HopAlong server and its clients.
//!
//! The live connection speaks named events over a single WebSocket. Each
//! frame is a JSON object of the shape `{"event": "...", "data": {...}}`,
//! mirroring the event names the web client already uses (`user:join`,
//! `trip:join`, `message:send`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent from client to server over the live connection.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// A connection declares which user owns it. The server records the
    /// mapping, overwriting any previous connection for the same user.
    #[serde(rename = "user:join")]
    UserJoin {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Enter a trip-scoped chat room.
    #[serde(rename = "trip:join")]
    TripJoin {
        #[serde(rename = "tripId")]
        trip_id: String,
    },
    /// Exit a trip-scoped chat room.
    #[serde(rename = "trip:leave")]
    TripLeave {
        #[serde(rename = "tripId")]
        trip_id: String,
    },
    /// Send a chat payload to a trip room. The payload is the message the
    /// client just persisted via REST; the server rebroadcasts it verbatim,
    /// decorated with a server timestamp.
    #[serde(rename = "message:send")]
    MessageSend {
        #[serde(rename = "tripId")]
        trip_id: String,
        message: Value,
    },
    /// Typing indicator, purely ephemeral.
    #[serde(rename = "typing:start")]
    TypingStart {
        #[serde(rename = "tripId")]
        trip_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    #[serde(rename = "typing:stop")]
    TypingStop {
        #[serde(rename = "tripId")]
        trip_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Tell the trip organizer about a freshly submitted join request, if
    /// they are connected.
    #[serde(rename = "request:new")]
    RequestNew {
        #[serde(rename = "organizerId")]
        organizer_id: String,
        request: Value,
    },
    /// Tell a requester about the organizer's decision, if they are
    /// connected.
    #[serde(rename = "request:response")]
    RequestResponse {
        #[serde(rename = "userId")]
        user_id: String,
        response: Value,
    },
}

/// Events sent from server to client over the live connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "user:joined")]
    UserJoined {
        #[serde(rename = "userId")]
        user_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "user:left")]
    UserLeft {
        #[serde(rename = "userId")]
        user_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Chat payload fanned out to every member of the room, sender
    /// included. The object carries a server-assigned `timestamp` field.
    #[serde(rename = "message:new")]
    MessageNew(Value),
    #[serde(rename = "user:typing")]
    UserTyping {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    #[serde(rename = "user:stopped-typing")]
    UserStoppedTyping {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Targeted delivery of a new join request to its trip's organizer.
    #[serde(rename = "request:notification")]
    RequestNotification(Value),
    /// Targeted delivery of an approve/reject decision to the requester.
    #[serde(rename = "request:status-update")]
    RequestStatusUpdate(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_serialization() {
        let event = ClientEvent::TripJoin {
            trip_id: "abc-123".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "trip:join");
        assert_eq!(json["data"]["tripId"], "abc-123");

        let parsed: ClientEvent = serde_json::from_value(json).unwrap();
        match parsed {
            ClientEvent::TripJoin { trip_id } => assert_eq!(trip_id, "abc-123"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_message_send_round_trip() {
        let raw = json!({
            "event": "message:send",
            "data": {
                "tripId": "t1",
                "message": {"content": "hello", "sender": "u1"}
            }
        });

        let parsed: ClientEvent = serde_json::from_value(raw).unwrap();
        match parsed {
            ClientEvent::MessageSend { trip_id, message } => {
                assert_eq!(trip_id, "t1");
                assert_eq!(message["content"], "hello");
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_server_event_names() {
        let event = ServerEvent::UserStoppedTyping {
            user_id: "u9".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "user:stopped-typing");
        assert_eq!(json["data"]["userId"], "u9");

        let notification = ServerEvent::RequestNotification(json!({"id": "r1"}));
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["event"], "request:notification");
        assert_eq!(json["data"]["id"], "r1");
    }
}
