//! Live ARS/USD rates read out of web search results.

use crate::core::clock::Clock;
use crate::core::currency::{ExchangeRateSet, RateSource};
use crate::core::search::{SearchProvider, SearchResult};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const RATE_QUERY: &str = "cotización dólar hoy banco nación Argentina oficial blue CCL";
pub const RATE_RESULT_COUNT: usize = 5;

/// How far past a keyword a figure may appear and still belong to it.
const KEYWORD_WINDOW: usize = 32;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ExtractedRates {
    pub official: Option<f64>,
    pub ccl: Option<f64>,
    pub blue: Option<f64>,
}

impl ExtractedRates {
    pub fn into_rate_set(self, retrieved_at: DateTime<Utc>) -> Option<ExchangeRateSet> {
        let official = self.official?;
        Some(ExchangeRateSet::from_official(
            official,
            self.ccl,
            self.blue,
            retrieved_at,
        ))
    }
}

/// Parses `1.234,56`, `1.234`, `365,50` and `365.50` style figures.
///
/// A lone `.` followed by exactly three digits is read as a thousands
/// separator, as Argentine sources write it.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim_end_matches(['.', ',']);
    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else if raw.matches('.').count() > 1 {
        raw.replace('.', "")
    } else {
        match raw.split_once('.') {
            Some((_, decimals)) if decimals.len() == 3 => raw.replace('.', ""),
            _ => raw.to_string(),
        }
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// No ARS/USD quote is ever below this; smaller figures are counts or days.
const MIN_PLAUSIBLE_RATE: f64 = 10.0;

/// Runs of digits and `.`/`,`/`/`/`-` separators found within the keyword window.
fn tokens_within_window(rest: &str) -> impl Iterator<Item = &str> {
    let window_end = rest
        .char_indices()
        .nth(KEYWORD_WINDOW)
        .map_or(rest.len(), |(i, _)| i);
    let is_token_char = |c: char| c.is_ascii_digit() || matches!(c, '.' | ',' | '/' | '-');

    let mut pos = 0;
    std::iter::from_fn(move || {
        let start = pos + rest.get(pos..window_end)?.find(|c: char| c.is_ascii_digit())?;
        let len = rest[start..]
            .find(|c: char| !is_token_char(c))
            .unwrap_or(rest.len() - start);
        pos = start + len;
        Some(&rest[start..pos])
    })
}

fn amount_after(text: &str, keyword: &str) -> Option<f64> {
    text.match_indices(keyword).find_map(|(index, _)| {
        tokens_within_window(&text[index + keyword.len()..]).find_map(|token| {
            let figure = token.trim_end_matches(['.', ',', '/', '-']);
            // 15/03/2024, 2024-03-15
            if figure.contains(['/', '-']) {
                return None;
            }
            parse_amount(figure).filter(|v| *v >= MIN_PLAUSIBLE_RATE)
        })
    })
}

/// Picks the first figure quoted after each market keyword.
pub fn extract_rates(results: &[SearchResult]) -> ExtractedRates {
    let mut extracted = ExtractedRates::default();

    for result in results {
        for text in [&result.name, &result.snippet] {
            let text = text.to_lowercase();
            for (keyword, slot) in [
                ("oficial", &mut extracted.official),
                ("ccl", &mut extracted.ccl),
                ("blue", &mut extracted.blue),
            ] {
                if slot.is_none() {
                    *slot = amount_after(&text, keyword);
                }
            }
        }
    }

    extracted
}

/// Looks up current rates and never fails: any error, including a lookup
/// that overruns its timeout, yields [`ExchangeRateSet::fallback`].
pub struct RateFetcher {
    search: Arc<dyn SearchProvider>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl RateFetcher {
    pub fn new(search: Arc<dyn SearchProvider>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            search,
            clock,
            timeout,
        }
    }

    async fn try_fetch(&self) -> Result<ExchangeRateSet> {
        let results = tokio::time::timeout(
            self.timeout,
            self.search.search(RATE_QUERY, RATE_RESULT_COUNT),
        )
        .await
        .map_err(|_| anyhow!("Rate lookup timed out after {:?}", self.timeout))??;

        let extracted = extract_rates(&results);
        debug!(?extracted, "Extracted rates from search results");

        extracted
            .into_rate_set(self.clock.now())
            .ok_or_else(|| anyhow!("No official rate found in {} search results", results.len()))
    }
}

#[async_trait]
impl RateSource for RateFetcher {
    #[instrument(name = "RateFetch", skip(self))]
    async fn fetch_rates(&self) -> ExchangeRateSet {
        match self.try_fetch().await {
            Ok(rates) => rates,
            Err(e) => {
                warn!(error = %e, "Using fallback exchange rates");
                ExchangeRateSet::fallback(self.clock.now())
            }
        }
    }
}
