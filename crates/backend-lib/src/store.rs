// ============================
// crates/backend-lib/src/store.rs
// ============================
//! Document store abstraction with an in-memory implementation.
//!
//! The REST layer only talks to the [`Store`] trait; the bundled
//! [`MemoryStore`] backs tests and single-process deployment. A backend
//! over a real document database implements the same contract, including
//! the (trip, user) uniqueness constraint on join requests.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{derive_status, ChatMessage, JoinRequest, Trip, TripStatus, User};

/// Filters and pagination for the trip listing.
#[derive(Debug, Clone, Default)]
pub struct TripQuery {
    pub destination: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub mode: Option<String>,
    pub trip_type: Option<String>,
    pub status: Option<TripStatus>,
    pub search: Option<String>,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
}

/// Aggregate numbers for the landing page.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    pub total_trips: usize,
    pub total_participants: usize,
    pub average_cost_per_person: u64,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    // Users
    async fn insert_user(&self, user: User) -> Result<(), AppError>;
    async fn get_user(&self, id: Uuid) -> Result<User, AppError>;
    async fn update_user(&self, user: User) -> Result<(), AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    // Trips
    async fn insert_trip(&self, trip: Trip) -> Result<(), AppError>;
    async fn get_trip(&self, id: Uuid) -> Result<Trip, AppError>;
    /// Replace the whole trip document in one write. Callers that mutate
    /// the participant list and the seat counter together rely on the two
    /// never being observable half-applied.
    async fn update_trip(&self, trip: Trip) -> Result<(), AppError>;
    async fn delete_trip(&self, id: Uuid) -> Result<(), AppError>;
    /// Returns the requested page (newest first) and the total match count.
    async fn query_trips(&self, query: &TripQuery) -> Result<(Vec<Trip>, usize), AppError>;
    async fn trips_by_organizer(&self, organizer: Uuid) -> Result<Vec<Trip>, AppError>;
    /// Trips the user participates in without organizing them.
    async fn trips_by_participant(&self, user: Uuid) -> Result<Vec<Trip>, AppError>;
    async fn trip_stats(&self) -> Result<TripStats, AppError>;

    // Join requests
    /// Fails with `Conflict` if a request for the same (trip, user) pair
    /// already exists, whatever its status.
    async fn insert_request(&self, request: JoinRequest) -> Result<(), AppError>;
    async fn get_request(&self, id: Uuid) -> Result<JoinRequest, AppError>;
    async fn update_request(&self, request: JoinRequest) -> Result<(), AppError>;
    async fn delete_request(&self, id: Uuid) -> Result<(), AppError>;
    async fn find_request(&self, trip: Uuid, user: Uuid)
        -> Result<Option<JoinRequest>, AppError>;
    async fn requests_by_trip(&self, trip: Uuid) -> Result<Vec<JoinRequest>, AppError>;
    async fn requests_by_user(&self, user: Uuid) -> Result<Vec<JoinRequest>, AppError>;

    // Messages
    async fn insert_message(&self, message: ChatMessage) -> Result<(), AppError>;
    async fn get_message(&self, id: Uuid) -> Result<ChatMessage, AppError>;
    async fn delete_message(&self, id: Uuid) -> Result<(), AppError>;
    /// Messages for a trip in `created_at` ascending order.
    async fn messages_by_trip(&self, trip: Uuid) -> Result<Vec<ChatMessage>, AppError>;
}

/// In-memory implementation of the [`Store`] trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: std::sync::Arc<DashMap<Uuid, User>>,
    trips: std::sync::Arc<DashMap<Uuid, Trip>>,
    requests: std::sync::Arc<DashMap<Uuid, JoinRequest>>,
    /// (trip, user) -> request id, the uniqueness constraint.
    request_index: std::sync::Arc<DashMap<(Uuid, Uuid), Uuid>>,
    messages: std::sync::Arc<DashMap<Uuid, ChatMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<(), AppError> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn update_user(&self, user: User) -> Result<(), AppError> {
        if !self.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User not found".into()));
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_ascii_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(&email))
            .map(|u| u.clone()))
    }

    async fn insert_trip(&self, trip: Trip) -> Result<(), AppError> {
        self.trips.insert(trip.id, trip);
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> Result<Trip, AppError> {
        self.trips
            .get(&id)
            .map(|t| t.clone())
            .ok_or_else(|| AppError::NotFound("Trip not found".into()))
    }

    async fn update_trip(&self, trip: Trip) -> Result<(), AppError> {
        if !self.trips.contains_key(&trip.id) {
            return Err(AppError::NotFound("Trip not found".into()));
        }
        self.trips.insert(trip.id, trip);
        Ok(())
    }

    async fn delete_trip(&self, id: Uuid) -> Result<(), AppError> {
        self.trips
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Trip not found".into()))
    }

    async fn query_trips(&self, query: &TripQuery) -> Result<(Vec<Trip>, usize), AppError> {
        let now = Utc::now();
        let mut matches: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| {
                if let Some(dest) = &query.destination {
                    if !t.destination.to_lowercase().contains(&dest.to_lowercase()) {
                        return false;
                    }
                }
                if let Some(start) = query.start_date {
                    if t.start_date < start {
                        return false;
                    }
                }
                if let Some(end) = query.end_date {
                    if t.end_date > end {
                        return false;
                    }
                }
                if let Some(mode) = &query.mode {
                    if &t.mode != mode {
                        return false;
                    }
                }
                if let Some(trip_type) = &query.trip_type {
                    if &t.trip_type != trip_type {
                        return false;
                    }
                }
                if let Some(status) = query.status {
                    if derive_status(now, t) != status {
                        return false;
                    }
                }
                if let Some(search) = &query.search {
                    let needle = search.to_lowercase();
                    let hit = t.title.to_lowercase().contains(&needle)
                        || t.description.to_lowercase().contains(&needle)
                        || t.destination.to_lowercase().contains(&needle);
                    if !hit {
                        return false;
                    }
                }
                true
            })
            .map(|t| t.clone())
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matches.len();

        let limit = if query.limit == 0 { 10 } else { query.limit };
        let page = query.page.max(1);
        let start = (page - 1) * limit;
        let page_items = matches.into_iter().skip(start).take(limit).collect();

        Ok((page_items, total))
    }

    async fn trips_by_organizer(&self, organizer: Uuid) -> Result<Vec<Trip>, AppError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| t.organizer == organizer)
            .map(|t| t.clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    async fn trips_by_participant(&self, user: Uuid) -> Result<Vec<Trip>, AppError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| t.organizer != user && t.participants.contains(&user))
            .map(|t| t.clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    async fn trip_stats(&self) -> Result<TripStats, AppError> {
        let now = Utc::now();
        let mut total_trips = 0usize;
        let mut total_participants = 0usize;
        let mut total_cost = 0f64;

        for trip in self.trips.iter() {
            if derive_status(now, &trip) == TripStatus::Upcoming && trip.start_date >= now {
                total_trips += 1;
                total_participants += trip.participants.len();
                total_cost += trip.estimated_cost;
            }
        }

        let average_cost_per_person = if total_participants > 0 {
            (total_cost / total_participants as f64).round() as u64
        } else {
            0
        };

        Ok(TripStats {
            total_trips,
            total_participants,
            average_cost_per_person,
        })
    }

    async fn insert_request(&self, request: JoinRequest) -> Result<(), AppError> {
        use dashmap::mapref::entry::Entry;
        match self.request_index.entry((request.trip, request.user)) {
            Entry::Occupied(existing) => {
                let status = self
                    .requests
                    .get(existing.get())
                    .map(|r| r.status.to_string())
                    .unwrap_or_else(|| "pending".into());
                Err(AppError::Conflict(format!(
                    "You have already sent a request for this trip (Status: {status})"
                )))
            },
            Entry::Vacant(slot) => {
                slot.insert(request.id);
                self.requests.insert(request.id, request);
                Ok(())
            },
        }
    }

    async fn get_request(&self, id: Uuid) -> Result<JoinRequest, AppError> {
        self.requests
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| AppError::NotFound("Request not found".into()))
    }

    async fn update_request(&self, request: JoinRequest) -> Result<(), AppError> {
        if !self.requests.contains_key(&request.id) {
            return Err(AppError::NotFound("Request not found".into()));
        }
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn delete_request(&self, id: Uuid) -> Result<(), AppError> {
        let (_, removed) = self
            .requests
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Request not found".into()))?;
        self.request_index.remove(&(removed.trip, removed.user));
        Ok(())
    }

    async fn find_request(
        &self,
        trip: Uuid,
        user: Uuid,
    ) -> Result<Option<JoinRequest>, AppError> {
        let id = self.request_index.get(&(trip, user)).map(|r| *r);
        Ok(id.and_then(|id| self.requests.get(&id).map(|r| r.clone())))
    }

    async fn requests_by_trip(&self, trip: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        let mut requests: Vec<JoinRequest> = self
            .requests
            .iter()
            .filter(|r| r.trip == trip)
            .map(|r| r.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn requests_by_user(&self, user: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        let mut requests: Vec<JoinRequest> = self
            .requests
            .iter()
            .filter(|r| r.user == user)
            .map(|r| r.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_message(&self, message: ChatMessage) -> Result<(), AppError> {
        self.messages.insert(message.id, message);
        Ok(())
    }

    async fn get_message(&self, id: Uuid) -> Result<ChatMessage, AppError> {
        self.messages
            .get(&id)
            .map(|m| m.clone())
            .ok_or_else(|| AppError::NotFound("Message not found".into()))
    }

    async fn delete_message(&self, id: Uuid) -> Result<(), AppError> {
        self.messages
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Message not found".into()))
    }

    async fn messages_by_trip(&self, trip: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.trip == trip)
            .map(|m| m.clone())
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}
