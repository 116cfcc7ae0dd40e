use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};
use ledgerfolio_core::transactions::{NewTransaction, Transaction};

#[derive(Debug, Deserialize)]
struct TransactionsQuery {
    limit: Option<i64>,
}

async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let recorded = state.portfolio_service.record_transaction(payload).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn get_transactions(
    Path(user_id): Path<String>,
    Query(query): Query<TransactionsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = state
        .portfolio_service
        .get_transactions(&user_id, query.limit)
        .await?;
    Ok(Json(transactions))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", post(record_transaction))
        .route("/users/{user_id}/transactions", get(get_transactions))
}
