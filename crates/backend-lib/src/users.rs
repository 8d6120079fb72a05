// ============================
// crates/backend-lib/src/users.rs
// ============================
//! Public user profiles: lookup, self-service edits, and per-user trip
//! aggregates.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{derive_status, Trip, TripStatus, User};
use crate::store::Store;
use crate::trips::{self, TripView};
use crate::validation;

/// Compact trip line shown on a profile page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTrip {
    pub id: Uuid,
    pub title: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: TripStatus,
    pub current_participants: u32,
    pub max_participants: u32,
}

impl From<&Trip> for ProfileTrip {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            status: derive_status(Utc::now(), trip),
            current_participants: trip.current_participants,
            max_participants: trip.max_participants,
        }
    }
}

/// A user as shown on their public profile, with the trips they organize
/// and the ones they joined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub trips_created: Vec<ProfileTrip>,
    pub trips_joined: Vec<ProfileTrip>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Per-user trip counts for the profile header.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub trips_created: usize,
    pub trips_joined: usize,
    pub trips_completed: usize,
    pub total_trips: usize,
}

pub async fn get<S: Store>(store: &S, user_id: Uuid) -> Result<Profile, AppError> {
    let user = store.get_user(user_id).await?;
    let created = store.trips_by_organizer(user_id).await?;
    let joined = store.trips_by_participant(user_id).await?;
    Ok(Profile {
        user,
        trips_created: created.iter().map(ProfileTrip::from).collect(),
        trips_joined: joined.iter().map(ProfileTrip::from).collect(),
    })
}

/// Edit one's own profile fields. Email and password change through the
/// auth endpoints, never here.
pub async fn update<S: Store>(
    store: &S,
    user_id: Uuid,
    caller: Uuid,
    patch: UserPatch,
) -> Result<User, AppError> {
    if user_id != caller {
        return Err(AppError::Forbidden(
            "Not authorized to update this profile".into(),
        ));
    }

    let mut user = store.get_user(user_id).await?;
    if let Some(name) = patch.name {
        validation::validate_name(&name)?;
        user.name = name.trim().to_string();
    }
    if let Some(branch) = patch.branch {
        user.branch = Some(branch);
    }
    if let Some(year) = patch.year {
        user.year = Some(year);
    }
    if let Some(bio) = patch.bio {
        user.bio = Some(bio);
    }
    if let Some(avatar) = patch.avatar {
        user.avatar = Some(avatar);
    }
    store.update_user(user.clone()).await?;
    tracing::info!(user = %user_id, "profile updated");
    Ok(user)
}

pub async fn trips_created<S: Store>(
    store: &S,
    user_id: Uuid,
) -> Result<Vec<TripView>, AppError> {
    trips::by_organizer(store, user_id).await
}

/// Trips the user joined through an approved request, organizer excluded.
pub async fn participations<S: Store>(
    store: &S,
    user_id: Uuid,
) -> Result<Vec<TripView>, AppError> {
    let joined = store.trips_by_participant(user_id).await?;
    let mut views = Vec::with_capacity(joined.len());
    for trip in &joined {
        views.push(trips::view(store, trip).await);
    }
    Ok(views)
}

pub async fn stats<S: Store>(store: &S, user_id: Uuid) -> Result<UserStats, AppError> {
    // 404 for an unknown user, not an all-zero answer.
    store.get_user(user_id).await?;

    let now = Utc::now();
    let created = store.trips_by_organizer(user_id).await?;
    let joined = store.trips_by_participant(user_id).await?;
    let trips_completed = created
        .iter()
        .chain(joined.iter())
        .filter(|t| derive_status(now, t) == TripStatus::Completed)
        .count();

    Ok(UserStats {
        trips_created: created.len(),
        trips_joined: joined.len(),
        trips_completed,
        total_trips: created.len() + joined.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
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

    async fn seed_trip(
        store: &MemoryStore,
        organizer: Uuid,
        extra_participants: &[Uuid],
        days_out: i64,
    ) -> Trip {
        let now = Utc::now();
        let mut participants = vec![organizer];
        participants.extend_from_slice(extra_participants);
        let trip = Trip {
            id: Uuid::new_v4(),
            title: "Trek".into(),
            description: "desc".into(),
            destination: "Manali".into(),
            start_date: now + Duration::days(days_out),
            end_date: now + Duration::days(days_out + 2),
            max_participants: 4,
            current_participants: participants.len() as u32,
            estimated_cost: 0.0,
            mode: "Bus".into(),
            trip_type: "Leisure".into(),
            status: TripStatus::Upcoming,
            organizer,
            participants,
            join_requests: vec![],
            messages: vec![],
            created_at: now,
            updated_at: now,
        };
        store.insert_trip(trip.clone()).await.unwrap();
        trip
    }

    #[tokio::test]
    async fn test_profile_separates_created_and_joined() {
        let store = MemoryStore::new();
        let organizer = seed_user(&store, "org").await;
        let member = seed_user(&store, "member").await;

        seed_trip(&store, organizer.id, &[member.id], 5).await;
        seed_trip(&store, member.id, &[], 8).await;

        let profile = get(&store, member.id).await.unwrap();
        assert_eq!(profile.trips_created.len(), 1);
        assert_eq!(profile.trips_joined.len(), 1);

        // Organized trips never show up as participations.
        let organizer_profile = get(&store, organizer.id).await.unwrap();
        assert_eq!(organizer_profile.trips_created.len(), 1);
        assert!(organizer_profile.trips_joined.is_empty());
    }

    #[tokio::test]
    async fn test_update_is_self_service_only() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "asha").await;
        let other = seed_user(&store, "other").await;

        let err = update(
            &store,
            user.id,
            other.id,
            UserPatch {
                name: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = update(
            &store,
            user.id,
            user.id,
            UserPatch {
                name: Some("Asha R".into()),
                bio: Some("Trek enthusiast".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Asha R");
        assert_eq!(updated.bio.as_deref(), Some("Trek enthusiast"));
        // Untouched fields survive.
        assert_eq!(updated.email, user.email);
    }

    #[tokio::test]
    async fn test_update_validates_name() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "asha").await;

        let err = update(
            &store,
            user.id,
            user.id,
            UserPatch {
                name: Some("X".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_stats_counts_by_derived_status() {
        let store = MemoryStore::new();
        let organizer = seed_user(&store, "org").await;
        let member = seed_user(&store, "member").await;

        // One finished trip the member joined, one upcoming they organize.
        seed_trip(&store, organizer.id, &[member.id], -10).await;
        seed_trip(&store, member.id, &[], 5).await;

        let stats = stats(&store, member.id).await.unwrap();
        assert_eq!(stats.trips_created, 1);
        assert_eq!(stats.trips_joined, 1);
        assert_eq!(stats.trips_completed, 1);
        assert_eq!(stats.total_trips, 2);
    }

    #[tokio::test]
    async fn test_stats_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = stats(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
