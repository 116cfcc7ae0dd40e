use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::WindowQuery;
use crate::{error::ApiResult, main_lib::AppState};
use ledgerfolio_core::portfolio::{
    benchmark::BenchmarkComparison, performance::PerformanceMetrics, risk::RiskMetrics,
};

async fn get_performance(
    Path(user_id): Path<String>,
    Query(window): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PerformanceMetrics>> {
    let metrics = state
        .portfolio_service
        .calculate_performance_metrics(&user_id, window.days())
        .await?;
    Ok(Json(metrics))
}

async fn get_risk(
    Path(user_id): Path<String>,
    Query(window): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RiskMetrics>> {
    let metrics = state
        .portfolio_service
        .calculate_risk_metrics(&user_id, window.days())
        .await?;
    Ok(Json(metrics))
}

async fn compare_to_benchmark(
    Path((user_id, symbol)): Path<(String, String)>,
    Query(window): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BenchmarkComparison>> {
    let comparison = state
        .portfolio_service
        .compare_to_benchmark(&user_id, &symbol, window.days())
        .await?;
    Ok(Json(comparison))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{user_id}/performance", get(get_performance))
        .route("/users/{user_id}/risk", get(get_risk))
        .route("/users/{user_id}/benchmark/{symbol}", get(compare_to_benchmark))
}
