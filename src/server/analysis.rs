use std::sync::Arc;

use crate::core::analysis::{AiAnalysis, PortfolioData};
use crate::server::{
    AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

async fn analyze_portfolio(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PortfolioData>, JsonRejection>,
) -> ApiResult<Json<AiAnalysis>> {
    let Json(data) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.analysis.analyze_portfolio(&data).await))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analysis", post(analyze_portfolio))
}
