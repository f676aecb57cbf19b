//! Prompt construction for portfolio analysis.

use crate::core::analysis::{PortfolioAsset, PortfolioData};
use std::cmp::Ordering;

const HIGHLIGHT_COUNT: usize = 3;

pub const SYSTEM_PROMPT: &str = "Eres un asesor financiero experto especializado en mercados argentinos.
Analiza portfolios de inversión y proporciona recomendaciones personalizadas basadas en:
- Análisis de riesgo y diversificación
- Tendencias del mercado actual
- Perfil de inversor conservador/moderado
- Contexto económico de Argentina

Responde en formato JSON estructurado con las siguientes claves:
- portfolioHealth (con score, diversification, riskLevel, performance)
- alerts (array de alertas con type, title, description, severity, suggestedAction)
- insights (array de insights con category, title, description, impact)
- recommendations (array de recomendaciones con priority, title, description, expectedImpact, timeframe)
- marketAnalysis (con trend, keyFactors, outlook)";

/// Formats a number the way `es-AR` locales do: `.` groups thousands, `,`
/// separates up to three decimals.
pub fn format_es_ar(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    let is_zero = int_part.trim_start_matches('0').is_empty() && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// Share of total market value per group, in first-seen order. Empty when
/// the portfolio has no market value.
pub fn distribution_by<F>(assets: &[PortfolioAsset], key: F) -> Vec<(String, f64)>
where
    F: Fn(&PortfolioAsset) -> &str,
{
    let total: f64 = assets.iter().map(PortfolioAsset::market_value).sum();
    if total == 0.0 {
        return Vec::new();
    }

    let mut distribution: Vec<(String, f64)> = Vec::new();
    for asset in assets {
        let share = asset.market_value() / total * 100.0;
        match distribution.iter().position(|(group, _)| group == key(asset)) {
            Some(index) => distribution[index].1 += share,
            None => distribution.push((key(asset).to_string(), share)),
        }
    }
    distribution
}

fn ranked_by<F>(assets: &[PortfolioAsset], compare: F) -> Vec<&PortfolioAsset>
where
    F: Fn(&PortfolioAsset, &PortfolioAsset) -> Ordering,
{
    let mut ranked: Vec<&PortfolioAsset> = assets.iter().collect();
    ranked.sort_by(|a, b| compare(a, b));
    ranked.truncate(HIGHLIGHT_COUNT);
    ranked
}

fn by_value(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn performer_line(asset: &PortfolioAsset) -> String {
    format!("- {} ({}): {:.2}%", asset.ticker, asset.name, asset.return_pct())
}

fn distribution_lines(distribution: Vec<(String, f64)>) -> impl Iterator<Item = String> {
    distribution
        .into_iter()
        .map(|(group, pct)| format!("- {group}: {pct:.1}%"))
}

pub fn build_analysis_prompt(data: &PortfolioData) -> String {
    let assets = &data.assets;
    let mut lines = vec![
        "Por favor, analiza el siguiente portfolio de inversión:".to_string(),
        String::new(),
        "RESUMEN DEL PORTFOLIO:".to_string(),
        format!("- Valor total: ${}", format_es_ar(data.total_value)),
        format!("- Valor invertido: ${}", format_es_ar(data.invested_value)),
        format!("- Retorno total: {:.2}%", data.total_return_pct()),
        format!("- Número de activos: {}", assets.len()),
    ];

    lines.extend(["".to_string(), "DISTRIBUCIÓN POR SECTOR:".to_string()]);
    lines.extend(distribution_lines(distribution_by(assets, |a| &a.sector)));

    lines.extend(["".to_string(), "DISTRIBUCIÓN POR TIPO DE ACTIVO:".to_string()]);
    lines.extend(distribution_lines(distribution_by(assets, |a| &a.asset_type)));

    lines.extend(["".to_string(), "TOP PERFORMERS:".to_string()]);
    lines.extend(
        ranked_by(assets, |a, b| by_value(b.return_pct(), a.return_pct()))
            .into_iter()
            .map(performer_line),
    );

    lines.extend(["".to_string(), "PEORES PERFORMERS:".to_string()]);
    lines.extend(
        ranked_by(assets, |a, b| by_value(a.return_pct(), b.return_pct()))
            .into_iter()
            .map(performer_line),
    );

    lines.extend([
        "".to_string(),
        "ACTIVOS CON MAYOR VOLATILIDAD (variación diaria):".to_string(),
    ]);
    lines.extend(
        ranked_by(assets, |a, b| by_value(b.daily_change.abs(), a.daily_change.abs()))
            .into_iter()
            .map(|asset| format!("- {}: {:.2}%", asset.ticker, asset.daily_change)),
    );

    lines.extend([
        "".to_string(),
        "Por favor, proporciona un análisis completo considerando el contexto actual del mercado argentino,
incluyendo inflación, tipos de cambio, y tendencias sectoriales. Enfócate en riesgos específicos
del mercado local y oportunidades disponibles."
            .to_string(),
    ]);

    lines.join("\n")
}
