use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::url_with_path,
    error::{AppError, TripWindowError},
    models::{
        participant::NewParticipant,
        trip::{NewTrip, Trip, TripRequest},
    },
    services::{
        mail::{render_trip_confirmation, MailLocale, MailMessage, Mailbox, Mailer},
        store::TripStore,
    },
};

/// Rejects trips that start in the past or end before they start.
/// The start check wins when both are violated; equal instants pass.
pub fn validate_trip_window(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TripWindowError> {
    if starts_at < now {
        return Err(TripWindowError::InvalidStartDate);
    }
    if ends_at < starts_at {
        return Err(TripWindowError::InvalidEndDate);
    }
    Ok(())
}

/// Owner first (confirmed), then one unconfirmed invitee per address in input order.
/// Duplicates are kept as-is.
pub fn build_participants(
    owner_name: &str,
    owner_email: &str,
    emails_to_invite: &[String],
) -> Vec<NewParticipant> {
    let mut participants = Vec::with_capacity(emails_to_invite.len() + 1);
    participants.push(NewParticipant::owner(owner_name, owner_email));
    participants.extend(emails_to_invite.iter().map(NewParticipant::invitee));
    participants
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub sender: Mailbox,
    pub public_base_url: Url,
    pub locale: MailLocale,
}

impl MailSettings {
    pub fn confirmation_link(&self, trip_id: &str) -> String {
        url_with_path(&self.public_base_url, &format!("trips/{trip_id}/confirm"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

#[derive(Clone)]
pub struct TripPlanner {
    store: Arc<dyn TripStore>,
    mailer: Arc<dyn Mailer>,
    mail: MailSettings,
}

impl TripPlanner {
    pub fn new(store: Arc<dyn TripStore>, mailer: Arc<dyn Mailer>, mail: MailSettings) -> Self {
        Self {
            store,
            mailer,
            mail,
        }
    }

    pub async fn create_trip(
        &self,
        request: TripRequest,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        if let Err(err) = validate_trip_window(request.starts_at, request.ends_at, now) {
            debug!(destination = %request.destination, "rejected trip: {err}");
            return Err(err.into());
        }

        let participants = build_participants(
            &request.owner_name,
            &request.owner_email,
            &request.emails_to_invite,
        );

        let trip_id = self
            .store
            .create_trip(NewTrip {
                destination: request.destination.clone(),
                starts_at: request.starts_at,
                ends_at: request.ends_at,
                participants,
            })
            .await?;

        // No rollback if delivery fails; the trip stays persisted.
        let content = render_trip_confirmation(
            self.mail.locale,
            &request.destination,
            request.starts_at,
            request.ends_at,
            &self.mail.confirmation_link(&trip_id),
        )?;
        let handle = self
            .mailer
            .send(MailMessage {
                from: self.mail.sender.clone(),
                to: Mailbox::new(request.owner_name, request.owner_email),
                subject: content.subject,
                html: content.html,
            })
            .await?;

        info!(trip_id = %trip_id, delivery = %handle.0, "trip created");
        Ok(trip_id)
    }

    pub async fn confirm_trip(&self, trip_id: &str) -> Result<ConfirmOutcome, AppError> {
        let trip = self
            .store
            .find_trip(trip_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if trip.is_confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        self.store.mark_confirmed(trip_id).await?;
        info!(trip_id = %trip_id, "trip confirmed");
        Ok(ConfirmOutcome::Confirmed)
    }

    pub async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        self.store.list_trips().await
    }
}
