use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, main_lib::AppState};
use ledgerfolio_core::constants::DEFAULT_WINDOW_DAYS;

mod analytics;
mod portfolio;
mod transactions;

pub async fn healthz() -> &'static str {
    "ok"
}

/// `?days=` of the history and analytics endpoints.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    days: Option<i64>,
}

impl WindowQuery {
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_WINDOW_DAYS)
    }
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_allow
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(transactions::router())
        .merge(portfolio::router())
        .merge(analytics::router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
