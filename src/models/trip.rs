use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidateEmail};

use crate::{
    error::AppError,
    models::participant::{NewParticipant, Participant},
};

/// Body of `POST /trips`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TripRequest {
    #[validate(length(min = 4, message = "destination must have at least 4 characters"))]
    pub destination: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub starts_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ends_at: DateTime<Utc>,
    pub owner_name: String,
    #[validate(email(message = "owner_email must be a valid email"))]
    pub owner_email: String,
    pub emails_to_invite: Vec<String>,
}

impl TripRequest {
    /// Structural checks done at the boundary, before any business rule runs.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::BadRequest(errors.to_string()))?;

        if let Some(bad) = self
            .emails_to_invite
            .iter()
            .find(|email| !email.validate_email())
        {
            return Err(AppError::BadRequest(format!(
                "emails_to_invite: invalid email {bad:?}"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub participants: Vec<NewParticipant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: String,
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Accepts RFC 3339, naive date-times and plain dates (both read as UTC),
/// or milliseconds since the epoch.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(raw) => parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {raw:?}"))),
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
