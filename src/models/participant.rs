use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A participant as it will be written alongside a new trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: Option<String>,
    pub email: String,
    pub is_confirmed: bool,
    pub is_owner: bool,
}

impl NewParticipant {
    pub fn owner(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
            is_confirmed: true,
            is_owner: true,
        }
    }

    pub fn invitee(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
            is_confirmed: false,
            is_owner: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: String,
    pub trip_id: String,
    pub name: Option<String>,
    pub email: String,
    pub is_confirmed: bool,
    pub is_owner: bool,
}
