// ============================
// crates/backend-lib/src/chat.rs
// ============================
//! Trip chat persistence. Fan-out to connected members lives in
//! [`crate::relay`]; this module only stores and lists messages.
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ChatMessage, UserSummary};
use crate::store::Store;
use crate::validation;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedMessage {
    pub id: Uuid,
    pub trip: Uuid,
    pub sender: Option<UserSummary>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

async fn populate<S: Store>(store: &S, message: &ChatMessage) -> PopulatedMessage {
    let sender = store
        .get_user(message.sender)
        .await
        .ok()
        .map(|u| UserSummary::from(&u));
    PopulatedMessage {
        id: message.id,
        trip: message.trip,
        sender,
        content: message.content.clone(),
        created_at: message.created_at,
    }
}

/// Messages for a trip, oldest first. An unknown trip or an unavailable
/// store degrades to an empty list rather than an error.
pub async fn list_for_trip<S: Store>(
    store: &S,
    trip_id: Uuid,
) -> Result<Vec<PopulatedMessage>, AppError> {
    if let Err(err) = store.get_trip(trip_id).await {
        return if err.swallow_to_empty() { Ok(vec![]) } else { Err(err) };
    }
    let messages = match store.messages_by_trip(trip_id).await {
        Ok(messages) => messages,
        Err(err) if err.swallow_to_empty() => return Ok(vec![]),
        Err(err) => return Err(err),
    };
    let mut views = Vec::with_capacity(messages.len());
    for message in &messages {
        views.push(populate(store, message).await);
    }
    Ok(views)
}

/// Persist a message from `sender` in a trip's room.
///
/// There is deliberately no participant-membership check here; any
/// authenticated user may post to any trip, matching the relay's open
/// room membership.
pub async fn send<S: Store>(
    store: &S,
    sender: Uuid,
    trip_id: Uuid,
    content: &str,
) -> Result<PopulatedMessage, AppError> {
    validation::validate_chat_content(content)?;

    let message = ChatMessage {
        id: Uuid::new_v4(),
        trip: trip_id,
        sender,
        content: content.trim().to_string(),
        created_at: Utc::now(),
    };
    store.insert_message(message.clone()).await?;

    // Link the message into the trip document; a missing trip is
    // tolerated so the message still exists on its own.
    if let Ok(mut trip) = store.get_trip(trip_id).await {
        trip.messages.push(message.id);
        trip.updated_at = Utc::now();
        store.update_trip(trip).await?;
    }

    Ok(populate(store, &message).await)
}

/// Delete a message; only its sender may do so.
pub async fn delete<S: Store>(
    store: &S,
    message_id: Uuid,
    caller: Uuid,
) -> Result<(), AppError> {
    let message = store.get_message(message_id).await?;
    if message.sender != caller {
        return Err(AppError::Forbidden(
            "Not authorized to delete this message".into(),
        ));
    }

    if let Ok(mut trip) = store.get_trip(message.trip).await {
        trip.messages.retain(|id| *id != message_id);
        trip.updated_at = Utc::now();
        store.update_trip(trip).await?;
    }
    store.delete_message(message_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Trip, TripStatus, User};
    use crate::store::MemoryStore;
    use chrono::Duration;

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{name}@iitr.ac.in"),
            password_hash: "hash".into(),
            avatar: None,
            branch: None,
            year: None,
            bio: None,
            created_at: Utc::now(),
        };
        store.insert_user(user.clone()).await.unwrap();
        user
    }

    async fn seed_trip(store: &MemoryStore, organizer: Uuid) -> Trip {
        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4(),
            title: "Trek".into(),
            description: "desc".into(),
            destination: "Manali".into(),
            start_date: now + Duration::days(3),
            end_date: now + Duration::days(5),
            max_participants: 4,
            current_participants: 1,
            estimated_cost: 0.0,
            mode: "Bus".into(),
            trip_type: "Leisure".into(),
            status: TripStatus::Upcoming,
            organizer,
            participants: vec![organizer],
            join_requests: vec![],
            messages: vec![],
            created_at: now,
            updated_at: now,
        };
        store.insert_trip(trip.clone()).await.unwrap();
        trip
    }

    #[tokio::test]
    async fn test_send_and_list_ascending() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "asha").await;
        let trip = seed_trip(&store, user.id).await;

        send(&store, user.id, trip.id, "first").await.unwrap();
        send(&store, user.id, trip.id, "second").await.unwrap();

        let messages = list_for_trip(&store, trip.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[0].sender.as_ref().unwrap().id, user.id);

        let trip = store.get_trip(trip.id).await.unwrap();
        assert_eq!(trip.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_non_participant_may_send() {
        let store = MemoryStore::new();
        let organizer = seed_user(&store, "org").await;
        let outsider = seed_user(&store, "outsider").await;
        let trip = seed_trip(&store, organizer.id).await;

        // No membership requirement on posting.
        let message = send(&store, outsider.id, trip.id, "hello").await.unwrap();
        assert_eq!(message.sender.unwrap().id, outsider.id);
    }

    #[tokio::test]
    async fn test_list_unknown_trip_is_empty() {
        let store = MemoryStore::new();
        let messages = list_for_trip(&store, Uuid::new_v4()).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_send_rejects_empty_and_oversize() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "asha").await;
        let trip = seed_trip(&store, user.id).await;

        let err = send(&store, user.id, trip.id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));

        let long = "x".repeat(1001);
        let err = send(&store, user.id, trip.id, &long).await.unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_is_sender_only() {
        let store = MemoryStore::new();
        let sender = seed_user(&store, "sender").await;
        let other = seed_user(&store, "other").await;
        let trip = seed_trip(&store, sender.id).await;

        let message = send(&store, sender.id, trip.id, "hello").await.unwrap();

        let err = delete(&store, message.id, other.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        delete(&store, message.id, sender.id).await.unwrap();
        assert!(list_for_trip(&store, trip.id).await.unwrap().is_empty());
        let trip = store.get_trip(trip.id).await.unwrap();
        assert!(trip.messages.is_empty());
    }
}
