use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        mail::{LogMailer, Mailbox, Mailer, OutboxMailer},
        store::{SqliteTripStore, TripStore},
        trips::{MailSettings, TripPlanner},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub planner: TripPlanner,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mail_outbox {
            Some(dir) => Arc::new(OutboxMailer::new(dir.clone())),
            None => Arc::new(LogMailer::new()),
        };
        let store = Arc::new(SqliteTripStore::new(db));
        Self::with_collaborators(config, store, mailer)
    }

    pub fn with_collaborators(
        config: AppConfig,
        store: Arc<dyn TripStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let settings = MailSettings {
            sender: Mailbox::new(&config.mail_from_name, &config.mail_from_address),
            public_base_url: config.public_base_url.clone(),
            locale: config.mail_locale,
        };
        let planner = TripPlanner::new(store, mailer, settings);
        Self { config, planner }
    }
}
