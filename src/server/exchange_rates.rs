use std::sync::Arc;

use crate::core::currency::{CurrencyCode, ExchangeRateSet, convert};
use crate::server::{
    AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};

async fn get_exchange_rates(State(state): State<Arc<AppState>>) -> Json<ExchangeRateSet> {
    Json(state.rates.get_rates().await)
}

#[derive(Deserialize)]
struct ConvertParams {
    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,
}

#[derive(Serialize)]
struct Conversion {
    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,
    result: f64,
    rates: ExchangeRateSet,
}

async fn convert_amount(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ConvertParams>, QueryRejection>,
) -> ApiResult<Json<Conversion>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let rates = state.rates.get_rates().await;
    let result = convert(params.amount, &params.from, &params.to, &rates);
    Ok(Json(Conversion {
        amount: params.amount,
        from: params.from,
        to: params.to,
        result,
        rates,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exchange-rates", get(get_exchange_rates))
        .route("/exchange-rates/convert", get(convert_amount))
}
