use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::WindowQuery;
use crate::{error::ApiResult, main_lib::AppState};
use ledgerfolio_core::portfolio::{
    snapshot::{PortfolioSnapshot, SnapshotSource},
    AssetPosition,
};

async fn get_positions(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HashMap<String, AssetPosition>>> {
    let positions = state
        .portfolio_service
        .get_current_positions(&user_id)
        .await?;
    Ok(Json(positions))
}

async fn create_snapshot(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<PortfolioSnapshot>)> {
    let snapshot = state
        .portfolio_service
        .create_snapshot(&user_id, SnapshotSource::OnDemand)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_history(
    Path(user_id): Path<String>,
    Query(window): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PortfolioSnapshot>>> {
    let history = state
        .portfolio_service
        .get_portfolio_history(&user_id, window.days())
        .await?;
    Ok(Json(history))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{user_id}/positions", get(get_positions))
        .route("/users/{user_id}/snapshots", post(create_snapshot))
        .route("/users/{user_id}/history", get(get_history))
}
