use std::sync::Arc;

use crate::core::clock::Clock;
use crate::server::{
    AppState,
    error::{ApiError, ApiResult},
};
use axum::{Json, Router, body::Bytes, extract::State, http::StatusCode, routing::get};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

pub const REQUIRED_FIELDS: [&str; 10] = [
    "date",
    "platform",
    "assetType",
    "operationType",
    "currency",
    "ticker",
    "assetName",
    "price",
    "quantity",
    "total",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: &'static str,
    pub date: &'static str,
    pub platform: &'static str,
    pub asset_type: &'static str,
    pub operation_type: &'static str,
    pub currency: &'static str,
    pub ticker: &'static str,
    pub asset_name: &'static str,
    pub price: f64,
    pub quantity: f64,
    pub commissions: f64,
    pub total: f64,
    pub description: &'static str,
}

pub fn sample_operations() -> Vec<Operation> {
    vec![
        Operation {
            id: "op_1",
            date: "2024-01-15T10:30:00Z",
            platform: "balanz",
            asset_type: "CEDEARS",
            operation_type: "COMPRA",
            currency: "USD",
            ticker: "AAPL",
            asset_name: "Apple Inc.",
            price: 185.50,
            quantity: 10.0,
            commissions: 5.00,
            total: 1860.00,
            description: "Compra de CEDEARs de Apple",
        },
        Operation {
            id: "op_2",
            date: "2024-01-14T14:20:00Z",
            platform: "belo",
            asset_type: "CRYPTO",
            operation_type: "COMPRA",
            currency: "USD",
            ticker: "BTC",
            asset_name: "Bitcoin",
            price: 42500.00,
            quantity: 0.05,
            commissions: 2.50,
            total: 2127.50,
            description: "Compra de Bitcoin",
        },
    ]
}

/// Absent, `null`, `false`, `""` and `0` all count as not provided.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// Returns the first required field the payload lacks, in declaration order.
pub fn first_missing_field(payload: &Map<String, Value>) -> Option<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .find(|field| is_blank(payload.get(*field)))
}

/// `op_<epoch millis>_<9 random characters>`
pub fn generate_operation_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("op_{}_{}", now.timestamp_millis(), &suffix[..9])
}

/// Reads the request body as an operation payload. JSON that is not an
/// object carries no fields, so it is validated as an empty payload.
fn parse_payload(body: &[u8]) -> ApiResult<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => {
            error!("Operation payload is null");
            Err(ApiError::Internal("Error saving operation".to_string()))
        }
        Ok(_) => Ok(Map::new()),
        Err(e) => {
            error!(error = %e, "Operation payload is not valid JSON");
            Err(ApiError::Internal("Error saving operation".to_string()))
        }
    }
}

async fn create_operation(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Map<String, Value>>)> {
    let mut operation = parse_payload(&body)?;

    if let Some(field) = first_missing_field(&operation) {
        return Err(ApiError::MissingField(field));
    }

    let now = state.clock.now();
    // A client-supplied id is kept
    let id = operation
        .entry("id")
        .or_insert_with(|| Value::String(generate_operation_id(now)))
        .clone();
    info!(%id, ticker = ?operation.get("ticker"), "Saving operation");

    operation.insert(
        "createdAt".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    Ok((StatusCode::CREATED, Json(operation)))
}

async fn list_operations() -> Json<Vec<Operation>> {
    Json(sample_operations())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/operations", get(list_operations).post(create_operation))
}
