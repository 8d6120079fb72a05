// ============================
// crates/backend-lib/src/models.rs
// ============================
//! Domain records stored in the document store, plus the pure status
//! derivation for trips.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields exposed when a user appears inside another record
/// (organizer, participant, requester, message sender).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub bio: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            branch: user.branch.clone(),
            year: user.year.clone(),
            bio: user.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TripStatus::Upcoming => "upcoming",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A planned journey with a seat capacity, owned by its organizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
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
    /// Authoritative only for the sticky `cancelled` case; read paths
    /// present [`derive_status`] instead of this field.
    pub status: TripStatus,
    pub organizer: Uuid,
    pub participants: Vec<Uuid>,
    pub join_requests: Vec<Uuid>,
    pub messages: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn available_seats(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }
}

/// Date-driven trip status, computed at read time.
///
/// `cancelled` is terminal and never overwritten by date logic. Nothing is
/// written back to the store; the persisted `status` field only changes
/// through an explicit cancel.
pub fn derive_status(now: DateTime<Utc>, trip: &Trip) -> TripStatus {
    if trip.status == TripStatus::Cancelled {
        return TripStatus::Cancelled;
    }
    if now >= trip.start_date && now <= trip.end_date {
        TripStatus::Ongoing
    } else if now > trip.end_date {
        TripStatus::Completed
    } else {
        TripStatus::Upcoming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A prospective participant's request to be admitted to a trip.
///
/// At most one exists per (trip, user) pair, across all statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: Uuid,
    pub trip: Uuid,
    pub user: Uuid,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when status leaves `pending`.
    pub responded_at: Option<DateTime<Utc>>,
}

/// A chat message in a trip room. Immutable once created except for
/// deletion by its sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub trip: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn trip(start_offset_days: i64, end_offset_days: i64, status: TripStatus) -> Trip {
        let now = Utc::now();
        Trip {
            id: Uuid::new_v4(),
            title: "Trek".into(),
            description: "desc".into(),
            destination: "Manali".into(),
            start_date: now + Duration::days(start_offset_days),
            end_date: now + Duration::days(end_offset_days),
            max_participants: 4,
            current_participants: 1,
            estimated_cost: 0.0,
            mode: "Bus".into(),
            trip_type: "Leisure".into(),
            status,
            organizer: Uuid::new_v4(),
            participants: vec![],
            join_requests: vec![],
            messages: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_derive_status_by_dates() {
        let now = Utc::now();
        assert_eq!(
            derive_status(now, &trip(1, 3, TripStatus::Upcoming)),
            TripStatus::Upcoming
        );
        assert_eq!(
            derive_status(now, &trip(-1, 1, TripStatus::Upcoming)),
            TripStatus::Ongoing
        );
        assert_eq!(
            derive_status(now, &trip(-3, -1, TripStatus::Upcoming)),
            TripStatus::Completed
        );
    }

    #[test]
    fn test_cancelled_is_sticky() {
        let now = Utc::now();
        // Dates say "ongoing", but cancellation wins.
        assert_eq!(
            derive_status(now, &trip(-1, 1, TripStatus::Cancelled)),
            TripStatus::Cancelled
        );
    }

    #[test]
    fn test_capacity_helpers() {
        let mut t = trip(1, 3, TripStatus::Upcoming);
        assert!(!t.is_full());
        assert_eq!(t.available_seats(), 3);
        t.current_participants = 4;
        assert!(t.is_full());
        assert_eq!(t.available_seats(), 0);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@iitr.ac.in".into(),
            password_hash: "secret-hash".into(),
            avatar: None,
            branch: None,
            year: None,
            bio: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
