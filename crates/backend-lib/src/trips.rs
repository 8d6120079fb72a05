// ============================
// crates/backend-lib/src/trips.rs
// ============================
//! Trip CRUD and query surface. Status is derived at read time; the
//! persisted field only changes through an explicit cancel/update.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{derive_status, Trip, TripStatus, User, UserSummary};
use crate::store::{Store, TripQuery, TripStats};
use crate::validation;

/// A trip as presented to clients: populated organizer/participants,
/// derived status, and the capacity helpers the UI shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    pub current_participants: u32,
    pub estimated_cost: f64,
    pub mode: String,
    #[serde(rename = "type")]
    pub trip_type: String,
    pub status: TripStatus,
    pub organizer: Option<UserSummary>,
    pub participants: Vec<UserSummary>,
    pub join_requests: Vec<Uuid>,
    pub is_full: bool,
    pub available_seats: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub title: String,
    pub description: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "type", default = "default_type")]
    pub trip_type: String,
}

fn default_mode() -> String {
    "Bus".to_string()
}

fn default_type() -> String {
    "Leisure".to_string()
}

/// Partial update; organizer and participants are not editable here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_participants: Option<u32>,
    pub estimated_cost: Option<f64>,
    pub mode: Option<String>,
    #[serde(rename = "type")]
    pub trip_type: Option<String>,
    pub status: Option<TripStatus>,
}

pub async fn view<S: Store>(store: &S, trip: &Trip) -> TripView {
    let organizer = store
        .get_user(trip.organizer)
        .await
        .ok()
        .map(|u| UserSummary::from(&u));
    let mut participants = Vec::with_capacity(trip.participants.len());
    for id in &trip.participants {
        if let Ok(user) = store.get_user(*id).await {
            participants.push(UserSummary::from(&user));
        }
    }
    TripView {
        id: trip.id,
        title: trip.title.clone(),
        description: trip.description.clone(),
        destination: trip.destination.clone(),
        start_date: trip.start_date,
        end_date: trip.end_date,
        max_participants: trip.max_participants,
        current_participants: trip.current_participants,
        estimated_cost: trip.estimated_cost,
        mode: trip.mode.clone(),
        trip_type: trip.trip_type.clone(),
        status: derive_status(Utc::now(), trip),
        organizer,
        participants,
        join_requests: trip.join_requests.clone(),
        is_full: trip.is_full(),
        available_seats: trip.available_seats(),
        created_at: trip.created_at,
        updated_at: trip.updated_at,
    }
}

/// Create a trip. The creator becomes the organizer and the sole initial
/// participant.
pub async fn create<S: Store>(
    store: &S,
    organizer: &User,
    input: NewTrip,
) -> Result<TripView, AppError> {
    validation::validate_trip_fields(
        &input.title,
        &input.description,
        &input.destination,
        input.start_date,
        input.end_date,
        input.max_participants,
        input.estimated_cost,
    )?;

    let now = Utc::now();
    let trip = Trip {
        id: Uuid::new_v4(),
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        destination: input.destination.trim().to_string(),
        start_date: input.start_date,
        end_date: input.end_date,
        max_participants: input.max_participants,
        current_participants: 1,
        estimated_cost: input.estimated_cost,
        mode: input.mode,
        trip_type: input.trip_type,
        status: TripStatus::Upcoming,
        organizer: organizer.id,
        participants: vec![organizer.id],
        join_requests: vec![],
        messages: vec![],
        created_at: now,
        updated_at: now,
    };
    store.insert_trip(trip.clone()).await?;
    tracing::info!(trip = %trip.id, organizer = %organizer.id, "trip created");
    Ok(view(store, &trip).await)
}

pub async fn get<S: Store>(store: &S, trip_id: Uuid) -> Result<TripView, AppError> {
    let trip = store.get_trip(trip_id).await?;
    Ok(view(store, &trip).await)
}

pub async fn list<S: Store>(
    store: &S,
    query: &TripQuery,
) -> Result<(Vec<TripView>, usize), AppError> {
    let (trips, total) = store.query_trips(query).await?;
    let mut views = Vec::with_capacity(trips.len());
    for trip in &trips {
        views.push(view(store, trip).await);
    }
    Ok((views, total))
}

pub async fn by_organizer<S: Store>(
    store: &S,
    organizer: Uuid,
) -> Result<Vec<TripView>, AppError> {
    let trips = store.trips_by_organizer(organizer).await?;
    let mut views = Vec::with_capacity(trips.len());
    for trip in &trips {
        views.push(view(store, trip).await);
    }
    Ok(views)
}

pub async fn stats<S: Store>(store: &S) -> Result<TripStats, AppError> {
    store.trip_stats().await
}

/// Field edits by the organizer. Organizer and participants cannot be
/// changed here; seats only move through the join-request lifecycle.
pub async fn update<S: Store>(
    store: &S,
    trip_id: Uuid,
    caller: Uuid,
    patch: TripPatch,
) -> Result<TripView, AppError> {
    let mut trip = store.get_trip(trip_id).await?;
    if trip.organizer != caller {
        return Err(AppError::Forbidden("Not authorized to update this trip".into()));
    }
    // Cancellation is terminal.
    if trip.status == TripStatus::Cancelled
        && patch.status.is_some_and(|s| s != TripStatus::Cancelled)
    {
        return Err(AppError::Conflict(
            "Cancelled trips cannot be reactivated".into(),
        ));
    }

    if let Some(title) = patch.title {
        trip.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        trip.description = description.trim().to_string();
    }
    if let Some(destination) = patch.destination {
        trip.destination = destination.trim().to_string();
    }
    if let Some(start_date) = patch.start_date {
        trip.start_date = start_date;
    }
    if let Some(end_date) = patch.end_date {
        trip.end_date = end_date;
    }
    if let Some(max_participants) = patch.max_participants {
        trip.max_participants = max_participants;
    }
    if let Some(estimated_cost) = patch.estimated_cost {
        trip.estimated_cost = estimated_cost;
    }
    if let Some(mode) = patch.mode {
        trip.mode = mode;
    }
    if let Some(trip_type) = patch.trip_type {
        trip.trip_type = trip_type;
    }
    if let Some(status) = patch.status {
        trip.status = status;
    }

    validation::validate_trip_fields(
        &trip.title,
        &trip.description,
        &trip.destination,
        trip.start_date,
        trip.end_date,
        trip.max_participants,
        trip.estimated_cost,
    )?;
    if trip.max_participants < trip.current_participants {
        return Err(AppError::Conflict(
            "Maximum participants cannot be below the current participant count".into(),
        ));
    }

    trip.updated_at = Utc::now();
    store.update_trip(trip.clone()).await?;
    Ok(view(store, &trip).await)
}

pub async fn delete<S: Store>(store: &S, trip_id: Uuid, caller: Uuid) -> Result<(), AppError> {
    let trip = store.get_trip(trip_id).await?;
    if trip.organizer != caller {
        return Err(AppError::Forbidden("Not authorized to delete this trip".into()));
    }
    store.delete_trip(trip_id).await?;
    tracing::info!(trip = %trip_id, "trip deleted");
    Ok(())
}
