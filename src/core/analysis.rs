//! Portfolio analysis types and the normalization of model output.
//!
//! Completion output is untrusted: every field is read individually from a
//! `serde_json::Value`, and anything missing, falsy or malformed is replaced
//! with the defaults below. List entries that do not decode are dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_LIST_ITEMS: usize = 5;
pub const MAX_KEY_FACTORS: usize = 4;

const DEFAULT_SCORE: f64 = 75.0;
const DEFAULT_DIVERSIFICATION: f64 = 70.0;
const DEFAULT_PERFORMANCE: f64 = 80.0;
const DEFAULT_RISK_LEVEL: &str = "Moderado";
const DEFAULT_TREND: &str = "neutral";
const DEFAULT_OUTLOOK: &str = "neutral";
const DEFAULT_KEY_FACTORS: [&str; 4] = [
    "Estabilidad económica",
    "Tasas de interés",
    "Inflación",
    "Mercado global",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAsset {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub asset_type: String,
    pub quantity: f64,
    pub current_price: f64,
    pub avg_price: f64,
    pub daily_change: f64,
}

impl PortfolioAsset {
    pub fn market_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Gain over the average purchase price, in percent. Zero when the
    /// average price is zero.
    pub fn return_pct(&self) -> f64 {
        if self.avg_price == 0.0 {
            return 0.0;
        }
        (self.current_price - self.avg_price) / self.avg_price * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioData {
    pub total_value: f64,
    pub invested_value: f64,
    pub assets: Vec<PortfolioAsset>,
}

impl PortfolioData {
    pub fn total_return_pct(&self) -> f64 {
        if self.invested_value == 0.0 {
            return 0.0;
        }
        (self.total_value - self.invested_value) / self.invested_value * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Warning,
    Opportunity,
    Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHealth {
    pub score: f64,
    pub diversification: f64,
    pub risk_level: String,
    pub performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub title: String,
    pub description: String,
    pub severity: Level,
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Level,
    pub title: String,
    pub description: String,
    pub expected_impact: String,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub trend: String,
    pub key_factors: Vec<String>,
    pub outlook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub portfolio_health: PortfolioHealth,
    pub alerts: Vec<Alert>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub market_analysis: MarketAnalysis,
}

impl Default for AiAnalysis {
    fn default() -> Self {
        AiAnalysis {
            portfolio_health: PortfolioHealth {
                score: DEFAULT_SCORE,
                diversification: DEFAULT_DIVERSIFICATION,
                risk_level: DEFAULT_RISK_LEVEL.to_string(),
                performance: DEFAULT_PERFORMANCE,
            },
            alerts: default_alerts(),
            insights: default_insights(),
            recommendations: default_recommendations(),
            market_analysis: MarketAnalysis {
                trend: DEFAULT_TREND.to_string(),
                key_factors: default_key_factors(),
                outlook: DEFAULT_OUTLOOK.to_string(),
            },
        }
    }
}

fn default_alerts() -> Vec<Alert> {
    vec![Alert {
        kind: AlertType::Warning,
        title: "Mantente informado".to_string(),
        description: "Revisa regularmente el rendimiento de tu portfolio.".to_string(),
        severity: Level::Medium,
        suggested_action: "Establecer alertas de precio para activos clave".to_string(),
    }]
}

fn default_insights() -> Vec<Insight> {
    vec![Insight {
        category: "General".to_string(),
        title: "Portfolio balanceado".to_string(),
        description: "Tu portfolio muestra una diversificación razonable.".to_string(),
        impact: Impact::Neutral,
    }]
}

fn default_recommendations() -> Vec<Recommendation> {
    vec![Recommendation {
        priority: Level::Medium,
        title: "Revisión periódica".to_string(),
        description: "Considera revisar tu portfolio trimestralmente.".to_string(),
        expected_impact: "Mejora del rendimiento a largo plazo".to_string(),
        timeframe: "3 meses".to_string(),
    }]
}

fn default_key_factors() -> Vec<String> {
    DEFAULT_KEY_FACTORS.iter().map(|f| f.to_string()).collect()
}

/// Reads a model response into a complete [`AiAnalysis`].
pub fn normalize_analysis(raw: &Value) -> AiAnalysis {
    let health = raw.get("portfolioHealth");
    let market = raw.get("marketAnalysis");

    AiAnalysis {
        portfolio_health: PortfolioHealth {
            score: percentage_or(field(health, "score"), DEFAULT_SCORE),
            diversification: percentage_or(
                field(health, "diversification"),
                DEFAULT_DIVERSIFICATION,
            ),
            risk_level: text_or(field(health, "riskLevel"), DEFAULT_RISK_LEVEL),
            performance: percentage_or(field(health, "performance"), DEFAULT_PERFORMANCE),
        },
        alerts: list_or(raw.get("alerts"), MAX_LIST_ITEMS, default_alerts),
        insights: list_or(raw.get("insights"), MAX_LIST_ITEMS, default_insights),
        recommendations: list_or(
            raw.get("recommendations"),
            MAX_LIST_ITEMS,
            default_recommendations,
        ),
        market_analysis: MarketAnalysis {
            trend: text_or(field(market, "trend"), DEFAULT_TREND),
            key_factors: list_or(
                field(market, "keyFactors"),
                MAX_KEY_FACTORS,
                default_key_factors,
            ),
            outlook: text_or(field(market, "outlook"), DEFAULT_OUTLOOK),
        },
    }
}

fn field<'a>(parent: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    parent.and_then(|p| p.get(name))
}

fn percentage_or(value: Option<&Value>, default: f64) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0)
        .unwrap_or(default)
        .clamp(0.0, 100.0)
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn list_or<T: DeserializeOwned>(
    value: Option<&Value>,
    limit: usize,
    default: fn() -> Vec<T>,
) -> Vec<T> {
    match value.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .take(limit)
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        None => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_yields_default_analysis() {
        assert_eq!(normalize_analysis(&json!({})), AiAnalysis::default());
        assert_eq!(normalize_analysis(&json!(42)), AiAnalysis::default());
    }

    #[test]
    fn test_health_scores_are_clamped_and_defaulted() {
        let raw = json!({
            "portfolioHealth": {
                "score": 140,
                "diversification": -5,
                "riskLevel": "Alto",
                "performance": 0
            }
        });
        let health = normalize_analysis(&raw).portfolio_health;
        assert_eq!(health.score, 100.0);
        assert_eq!(health.diversification, 0.0);
        assert_eq!(health.risk_level, "Alto");
        // Zero is falsy and falls back to the default
        assert_eq!(health.performance, 80.0);
    }

    #[test]
    fn test_lists_are_truncated() {
        let alert = json!({
            "type": "risk",
            "title": "Volatilidad",
            "description": "Bitcoin cayó 15%",
            "severity": "high",
            "suggestedAction": "Evaluar rebalanceo"
        });
        let raw = json!({
            "alerts": vec![alert.clone(); 7],
            "marketAnalysis": {
                "trend": "alcista",
                "keyFactors": ["a", "b", "c", "d", "e", "f"]
            }
        });

        let analysis = normalize_analysis(&raw);
        assert_eq!(analysis.alerts.len(), 5);
        assert_eq!(analysis.alerts[0].kind, AlertType::Risk);
        assert_eq!(analysis.alerts[0].severity, Level::High);
        assert_eq!(analysis.market_analysis.trend, "alcista");
        assert_eq!(analysis.market_analysis.key_factors, vec!["a", "b", "c", "d"]);
        assert_eq!(analysis.market_analysis.outlook, "neutral");
        // Missing lists use the defaults
        assert_eq!(analysis.insights.len(), 1);
        assert_eq!(analysis.recommendations[0].timeframe, "3 meses");
    }

    #[test]
    fn test_malformed_list_entries_are_dropped() {
        let raw = json!({
            "insights": [
                {"category": "Riesgo", "title": "Beta 1.2", "description": "Volátil", "impact": "neutral"},
                {"category": "Riesgo", "title": "Sin impacto"},
                "texto suelto"
            ],
            "recommendations": []
        });

        let analysis = normalize_analysis(&raw);
        assert_eq!(analysis.insights.len(), 1);
        assert_eq!(analysis.insights[0].title, "Beta 1.2");
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_analysis_wire_format() {
        let json = serde_json::to_value(AiAnalysis::default()).unwrap();
        assert_eq!(json["portfolioHealth"]["riskLevel"], "Moderado");
        assert_eq!(json["alerts"][0]["type"], "warning");
        assert_eq!(json["alerts"][0]["suggestedAction"], "Establecer alertas de precio para activos clave");
        assert_eq!(json["recommendations"][0]["expectedImpact"], "Mejora del rendimiento a largo plazo");
        assert_eq!(json["marketAnalysis"]["keyFactors"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_asset_returns() {
        let asset = PortfolioAsset {
            ticker: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            sector: "Tecnología".to_string(),
            asset_type: "CEDEAR".to_string(),
            quantity: 10.0,
            current_price: 185.5,
            avg_price: 165.2,
            daily_change: 2.3,
        };
        assert!((asset.market_value() - 1855.0).abs() < 1e-9);
        assert!((asset.return_pct() - 12.288).abs() < 0.001);

        let free = PortfolioAsset {
            avg_price: 0.0,
            ..asset
        };
        assert_eq!(free.return_pct(), 0.0);
    }
}
