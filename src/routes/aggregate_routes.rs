// src/routes/aggregate_routes.rs

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::{
    error::ApiError,
    models::AppState,
    pipeline::TableSummary,
    trigger::Origin,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/process/cron-job", get(run_aggregation))
}

#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub data: AggregateData,
}

#[derive(Debug, Serialize)]
pub struct AggregateData {
    pub message: String,
    pub tables: Vec<TableSummary>,
}

/* ============================================================
   GET /aggregate/process/cron-job
   ============================================================ */

// Runs to completion before answering. Failure detail is logged by the trigger.
pub async fn run_aggregation(
    State(state): State<AppState>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let report = state.trigger.fire(Origin::Manual).await?;

    Ok(Json(AggregateResponse {
        data: AggregateData {
            message: "Data aggregation process completed.".to_string(),
            tables: report.tables,
        },
    }))
}
