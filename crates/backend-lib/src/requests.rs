// ============================
// crates/backend-lib/src/requests.rs
// ============================
//! Join-request lifecycle: pending -> approved | rejected | cancelled.
//!
//! All decisions are made against the store's current state at call time.
//! Approval is the one place that mutates two things on the trip record
//! (participant list and seat counter); both go through a single trip
//! write so readers never observe one without the other.
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics as keys;
use crate::models::{derive_status, JoinRequest, RequestStatus, Trip, TripStatus, UserSummary};
use crate::store::Store;
use crate::validation;

/// Trip fields exposed alongside a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: Uuid,
    pub title: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
        }
    }
}

/// A request populated with requester profile and trip summary, the shape
/// returned by submit/approve/reject and the per-trip listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedRequest {
    pub id: Uuid,
    pub trip: Option<TripSummary>,
    pub user: Option<UserSummary>,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

/// Trip view used by the self-service listing: summary plus derived status
/// and the organizer's profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripWithOrganizer {
    #[serde(flatten)]
    pub summary: TripSummary,
    pub status: TripStatus,
    pub organizer: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequestView {
    pub id: Uuid,
    pub trip: Option<TripWithOrganizer>,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

async fn populate<S: Store>(store: &S, request: &JoinRequest) -> PopulatedRequest {
    let user = store
        .get_user(request.user)
        .await
        .ok()
        .map(|u| UserSummary::from(&u));
    let trip = store
        .get_trip(request.trip)
        .await
        .ok()
        .map(|t| TripSummary::from(&t));
    PopulatedRequest {
        id: request.id,
        trip,
        user,
        message: request.message.clone(),
        status: request.status,
        created_at: request.created_at,
        responded_at: request.responded_at,
    }
}

/// Submit a join request for a trip.
pub async fn submit<S: Store>(
    store: &S,
    trip_id: Uuid,
    requester: Uuid,
    message: &str,
) -> Result<PopulatedRequest, AppError> {
    validation::validate_request_message(message)?;

    let mut trip = store.get_trip(trip_id).await?;

    if trip.is_full() {
        return Err(AppError::Conflict("Trip is already full".into()));
    }
    // The organizer is always a participant, so this check has to come
    // first for its message to be reachable.
    if trip.organizer == requester {
        return Err(AppError::Conflict(
            "You cannot request to join your own trip".into(),
        ));
    }
    if trip.participants.contains(&requester) {
        return Err(AppError::Conflict(
            "You are already a participant in this trip".into(),
        ));
    }
    if let Some(existing) = store.find_request(trip_id, requester).await? {
        return Err(AppError::Conflict(format!(
            "You have already sent a request for this trip (Status: {})",
            existing.status
        )));
    }

    let request = JoinRequest {
        id: Uuid::new_v4(),
        trip: trip_id,
        user: requester,
        message: message.trim().to_string(),
        status: RequestStatus::Pending,
        created_at: Utc::now(),
        responded_at: None,
    };
    // The store's uniqueness constraint backstops the check above.
    store.insert_request(request.clone()).await?;

    trip.join_requests.push(request.id);
    trip.updated_at = Utc::now();
    store.update_trip(trip).await?;

    counter!(keys::REQUEST_SUBMITTED).increment(1);
    tracing::info!(request = %request.id, trip = %trip_id, user = %requester, "join request submitted");
    Ok(populate(store, &request).await)
}

/// All requests for a trip, newest first. A trip that cannot be resolved
/// yields an empty list rather than an error; the requests panel stays
/// usable even when the trip record is momentarily inconsistent.
pub async fn list_for_trip<S: Store>(
    store: &S,
    trip_id: Uuid,
) -> Result<Vec<PopulatedRequest>, AppError> {
    let requests = match store.requests_by_trip(trip_id).await {
        Ok(requests) => requests,
        Err(err) if err.swallow_to_empty() => Vec::new(),
        Err(err) => return Err(err),
    };

    let mut populated = Vec::with_capacity(requests.len());
    for request in &requests {
        populated.push(populate(store, request).await);
    }
    Ok(populated)
}

/// A user's own requests, newest first, with trip + organizer populated.
/// Self-service only.
pub async fn list_for_user<S: Store>(
    store: &S,
    user_id: Uuid,
    caller: Uuid,
) -> Result<Vec<UserRequestView>, AppError> {
    if user_id != caller {
        return Err(AppError::Forbidden(
            "Not authorized to view these requests".into(),
        ));
    }

    let requests = store.requests_by_user(user_id).await?;
    let mut views = Vec::with_capacity(requests.len());
    for request in requests {
        let trip = match store.get_trip(request.trip).await {
            Ok(trip) => {
                let organizer = store
                    .get_user(trip.organizer)
                    .await
                    .ok()
                    .map(|u| UserSummary::from(&u));
                Some(TripWithOrganizer {
                    summary: TripSummary::from(&trip),
                    status: derive_status(Utc::now(), &trip),
                    organizer,
                })
            },
            Err(_) => None,
        };
        views.push(UserRequestView {
            id: request.id,
            trip,
            message: request.message,
            status: request.status,
            created_at: request.created_at,
            responded_at: request.responded_at,
        });
    }
    Ok(views)
}

/// Approve a pending request. Organizer only. Adds the requester to the
/// trip and bumps the seat counter in one trip write.
pub async fn approve<S: Store>(
    store: &S,
    request_id: Uuid,
    caller: Uuid,
) -> Result<PopulatedRequest, AppError> {
    let mut request = store.get_request(request_id).await?;
    let mut trip = store.get_trip(request.trip).await?;

    if trip.organizer != caller {
        return Err(AppError::Forbidden(
            "Not authorized to approve this request".into(),
        ));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Request has already been {}",
            request.status
        )));
    }
    if trip.is_full() {
        return Err(AppError::Conflict("Trip is already full".into()));
    }

    request.status = RequestStatus::Approved;
    request.responded_at = Some(Utc::now());
    store.update_request(request.clone()).await?;

    trip.participants.push(request.user);
    trip.current_participants += 1;
    trip.updated_at = Utc::now();
    store.update_trip(trip).await?;

    counter!(keys::REQUEST_APPROVED).increment(1);
    tracing::info!(request = %request_id, user = %request.user, "join request approved");
    Ok(populate(store, &request).await)
}

/// Reject a pending request. Organizer only. Never touches the trip's
/// participant list or seat counter.
pub async fn reject<S: Store>(
    store: &S,
    request_id: Uuid,
    caller: Uuid,
) -> Result<PopulatedRequest, AppError> {
    let mut request = store.get_request(request_id).await?;
    let trip = store.get_trip(request.trip).await?;

    if trip.organizer != caller {
        return Err(AppError::Forbidden(
            "Not authorized to reject this request".into(),
        ));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Request has already been {}",
            request.status
        )));
    }

    request.status = RequestStatus::Rejected;
    request.responded_at = Some(Utc::now());
    store.update_request(request.clone()).await?;

    counter!(keys::REQUEST_REJECTED).increment(1);
    tracing::info!(request = %request_id, user = %request.user, "join request rejected");
    Ok(populate(store, &request).await)
}

/// Withdraw one's own request while still pending. Deletes the record and
/// unlinks it from the trip.
pub async fn cancel<S: Store>(
    store: &S,
    request_id: Uuid,
    caller: Uuid,
) -> Result<(), AppError> {
    let request = store.get_request(request_id).await?;

    if request.user != caller {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this request".into(),
        ));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict("Can only cancel pending requests".into()));
    }

    // Unlink from the trip first; a missing trip is tolerated.
    if let Ok(mut trip) = store.get_trip(request.trip).await {
        trip.join_requests.retain(|id| *id != request_id);
        trip.updated_at = Utc::now();
        store.update_trip(trip).await?;
    }
    store.delete_request(request_id).await?;

    tracing::info!(request = %request_id, "join request cancelled");
    Ok(())
}
