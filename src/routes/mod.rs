pub mod trips;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{error::AppError, state::AppState};

pub fn create_router(state: AppState) -> Result<Router, AppError> {
    let origin = state.config.web_origin.origin().ascii_serialization();
    let origin = HeaderValue::from_str(&origin)
        .map_err(|err| AppError::Config(format!("invalid WEB_ORIGIN: {err}")))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .merge(trips::router())
        .layer(cors)
        .with_state(state))
}
