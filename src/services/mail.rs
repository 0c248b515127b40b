use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Locale, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailLocale {
    #[default]
    PtBr,
    EnUs,
}

impl MailLocale {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailLocale::PtBr => "pt-BR",
            MailLocale::EnUs => "en-US",
        }
    }

    fn long_date_format(&self) -> &'static str {
        match self {
            MailLocale::PtBr => "%-d de %B de %Y",
            MailLocale::EnUs => "%B %-d, %Y",
        }
    }

    fn chrono_locale(&self) -> Locale {
        match self {
            MailLocale::PtBr => Locale::pt_BR,
            MailLocale::EnUs => Locale::en_US,
        }
    }
}

impl fmt::Display for MailLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MailLocale {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" | "pt" => Ok(MailLocale::PtBr),
            "en-us" | "en" => Ok(MailLocale::EnUs),
            other => Err(AppError::Config(format!("unsupported mail locale: {other}"))),
        }
    }
}

/// Long-form dates for the confirmation mail, rendered in UTC.
pub fn format_trip_dates(
    locale: MailLocale,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> (String, String) {
    let pattern = locale.long_date_format();
    let chrono_locale = locale.chrono_locale();
    (
        starts_at.format_localized(pattern, chrono_locale).to_string(),
        ends_at.format_localized(pattern, chrono_locale).to_string(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub html: String,
}

/// Opaque reference returned by a transport for a handed-off message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHandle(pub String);

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<DeliveryHandle, AppError>;
}

#[derive(Template)]
#[template(path = "mail/confirm_trip.html")]
struct ConfirmTripTemplate<'a> {
    intro: &'a str,
    destination: &'a str,
    dates_label: &'a str,
    starts_on: &'a str,
    until_label: &'a str,
    ends_on: &'a str,
    call_to_action: &'a str,
    confirmation_link: &'a str,
    link_label: &'a str,
    disclaimer: &'a str,
}

pub struct ConfirmationContent {
    pub subject: String,
    pub html: String,
}

pub fn render_trip_confirmation(
    locale: MailLocale,
    destination: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    confirmation_link: &str,
) -> Result<ConfirmationContent, AppError> {
    let (starts_on, ends_on) = format_trip_dates(locale, starts_at, ends_at);
    let (subject, template) = match locale {
        MailLocale::PtBr => (
            format!("Confirme sua viagem para {destination}"),
            ConfirmTripTemplate {
                intro: "Você solicitou a criação de uma viagem para",
                destination,
                dates_label: "nas datas de",
                starts_on: &starts_on,
                until_label: "até",
                ends_on: &ends_on,
                call_to_action: "Para confirmar sua viagem, clique no link abaixo:",
                confirmation_link,
                link_label: "Confirmar viagem",
                disclaimer: "Caso você não saiba do que se trata esse e-mail, apenas ignore esse e-mail.",
            },
        ),
        MailLocale::EnUs => (
            format!("Confirm your trip to {destination}"),
            ConfirmTripTemplate {
                intro: "You asked to create a trip to",
                destination,
                dates_label: "from",
                starts_on: &starts_on,
                until_label: "to",
                ends_on: &ends_on,
                call_to_action: "To confirm your trip, click the link below:",
                confirmation_link,
                link_label: "Confirm trip",
                disclaimer: "If you don't know what this email is about, just ignore it.",
            },
        ),
    };

    Ok(ConfirmationContent {
        subject,
        html: template.render()?.trim().to_string(),
    })
}

/// Development transport: nothing leaves the process, the message is logged.
#[derive(Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryHandle, AppError> {
        let id = format!("<{}@planner.local>", Uuid::new_v4());
        info!(
            message_id = %id,
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "mail accepted"
        );
        Ok(DeliveryHandle(id))
    }
}

/// Writes every message as a JSON file under `root`.
#[derive(Clone)]
pub struct OutboxMailer {
    root: Arc<PathBuf>,
}

impl OutboxMailer {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root()).await?;
        Ok(())
    }

    pub async fn load_messages(&self) -> Result<Vec<MailMessage>, AppError> {
        let mut entries = fs::read_dir(self.root()).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = fs::read(&path).await?;
            let message: MailMessage =
                serde_json::from_slice(&raw).map_err(|err| AppError::Other(err.into()))?;
            messages.push(message);
        }
        Ok(messages)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: MailMessage) -> Result<DeliveryHandle, AppError> {
        self.ensure_structure().await?;
        let filename = format!(
            "{}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            Uuid::new_v4()
        );
        let path = self.root().join(filename);
        let data =
            serde_json::to_vec_pretty(&message).map_err(|err| AppError::Mail(err.to_string()))?;
        fs::write(&path, data).await?;
        info!(path = %path.display(), to = %message.to, "mail written to outbox");
        Ok(DeliveryHandle(path.display().to_string()))
    }
}
