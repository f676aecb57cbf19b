//! Dashboard aggregates. These serve fixed sample figures until holdings are
//! tracked.

use std::sync::Arc;

use crate::server::AppState;
use axum::{Json, Router, routing::get};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOverview {
    pub total_value: u64,
    pub invested_value: u64,
    pub daily_change: f64,
    pub daily_change_amount: u64,
    pub wallet_change: f64,
    pub alyc_change: f64,
    pub crypto_change: f64,
    pub total_assets: u32,
    pub total_platforms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAsset {
    pub ticker: &'static str,
    pub name: &'static str,
    pub change: f64,
    pub value: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

pub fn sample_overview() -> PortfolioOverview {
    PortfolioOverview {
        total_value: 12_500_000,
        invested_value: 10_000_000,
        daily_change: 2.5,
        daily_change_amount: 312_500,
        wallet_change: 1.2,
        alyc_change: 3.8,
        crypto_change: -0.5,
        total_assets: 24,
        total_platforms: 8,
    }
}

fn asset(
    ticker: &'static str,
    name: &'static str,
    change: f64,
    value: u64,
    kind: &'static str,
) -> TopAsset {
    TopAsset {
        ticker,
        name,
        change,
        value,
        kind,
    }
}

pub fn sample_top_assets() -> Vec<TopAsset> {
    vec![
        asset("AAPL", "Apple Inc.", 5.2, 2_500_000, "CEDEAR"),
        asset("GGAL", "Grupo Galicia", 3.1, 1_800_000, "ACCION"),
        asset("BTC", "Bitcoin", -2.3, 1_500_000, "CRYPTO"),
        asset("YPFD", "YPF", 4.7, 1_200_000, "ACCION"),
        asset("TS", "Ternium", 1.8, 900_000, "CEDEAR"),
        asset("PAMP", "Pampa Energía", -1.5, 750_000, "ACCION"),
        asset("ETH", "Ethereum", -3.2, 600_000, "CRYPTO"),
        asset("AL30", "Bonar 2030", 0.8, 500_000, "BONO"),
    ]
}

async fn get_portfolio() -> Json<PortfolioOverview> {
    Json(sample_overview())
}

async fn get_top_assets() -> Json<Vec<TopAsset>> {
    Json(sample_top_assets())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard/portfolio", get(get_portfolio))
        .route("/dashboard/assets", get(get_top_assets))
}
