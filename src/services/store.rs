use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        participant::Participant,
        trip::{NewTrip, Trip},
    },
};

#[async_trait]
pub trait TripStore: Send + Sync {
    /// Inserts the trip and every participant, or nothing at all.
    async fn create_trip(&self, trip: NewTrip) -> Result<String, AppError>;
    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, AppError>;
    async fn mark_confirmed(&self, id: &str) -> Result<(), AppError>;
    async fn list_trips(&self) -> Result<Vec<Trip>, AppError>;
}

#[derive(Clone)]
pub struct SqliteTripStore {
    db: DbPool,
}

impl SqliteTripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn load_participants(
        conn: &mut SqliteConnection,
        trip_id: &str,
    ) -> Result<Vec<Participant>, AppError> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT id, trip_id, name, email, is_confirmed, is_owner
             FROM participants WHERE trip_id = ? ORDER BY position",
        )
        .bind(trip_id)
        .fetch_all(conn)
        .await?;
        Ok(participants)
    }
}

#[async_trait]
impl TripStore for SqliteTripStore {
    async fn create_trip(&self, trip: NewTrip) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO trips (id, destination, starts_at, ends_at, is_confirmed, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(&trip.destination)
        .bind(trip.starts_at)
        .bind(trip.ends_at)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        for (position, participant) in trip.participants.iter().enumerate() {
            sqlx::query(
                "INSERT INTO participants (id, trip_id, position, name, email, is_confirmed, is_owner)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(position as i64)
            .bind(participant.name.as_deref())
            .bind(&participant.email)
            .bind(participant.is_confirmed)
            .bind(participant.is_owner)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(trip_id = %id, participants = trip.participants.len(), "trip stored");
        Ok(id)
    }

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, AppError> {
        let mut conn = self.db.acquire().await?;
        let trip = sqlx::query_as::<_, Trip>(
            "SELECT id, destination, starts_at, ends_at, is_confirmed, created_at
             FROM trips WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(mut trip) = trip else {
            return Ok(None);
        };
        trip.participants = Self::load_participants(&mut conn, &trip.id).await?;
        Ok(Some(trip))
    }

    async fn mark_confirmed(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE trips SET is_confirmed = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        let mut conn = self.db.acquire().await?;
        let mut trips = sqlx::query_as::<_, Trip>(
            "SELECT id, destination, starts_at, ends_at, is_confirmed, created_at
             FROM trips ORDER BY created_at, id",
        )
        .fetch_all(&mut *conn)
        .await?;

        for trip in &mut trips {
            trip.participants = Self::load_participants(&mut conn, &trip.id).await?;
        }
        Ok(trips)
    }
}
