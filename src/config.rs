use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use url::Url;

use crate::{error::AppError, services::mail::MailLocale};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Base used for links sent by mail, e.g. the confirmation link.
    pub public_base_url: Url,
    /// Front-end origin; allowed by CORS and target of post-confirmation redirects.
    pub web_origin: Url,
    pub mail_from_name: String,
    pub mail_from_address: String,
    pub mail_locale: MailLocale,
    pub mail_outbox: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://planner.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let public_base_url = parse_url("PUBLIC_BASE_URL", "http://localhost:5000")?;
        let web_origin = parse_url("WEB_ORIGIN", "http://localhost:3000")?;

        let mail_from_name =
            env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Equipe Plann.er".to_string());
        let mail_from_address =
            env::var("MAIL_FROM_ADDRESS").unwrap_or_else(|_| "oi@planner.org".to_string());
        let mail_locale = MailLocale::from_str(
            &env::var("MAIL_LOCALE").unwrap_or_else(|_| "pt-BR".to_string()),
        )?;
        let mail_outbox = env::var("MAIL_OUTBOX")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            listen_addr,
            public_base_url,
            web_origin,
            mail_from_name,
            mail_from_address,
            mail_locale,
            mail_outbox,
        })
    }
}

/// Appends `path` to `base`, keeping any path `base` already carries.
pub fn url_with_path(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parse_url(key: &str, default: &str) -> Result<Url, AppError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
}
