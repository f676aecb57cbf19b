//! Exchange rate snapshots and conversion through the ARS pivot.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

pub const FALLBACK_USD_OFFICIAL: f64 = 365.50;
pub const FALLBACK_USD_CCL: f64 = 720.80;
pub const FALLBACK_USD_BLUE: f64 = 735.20;

/// Approximate CCL premium over the official rate, used when no CCL quote is known.
pub const CCL_OVER_OFFICIAL: f64 = 1.95;
/// Approximate blue premium over the official rate, used when no blue quote is known.
pub const BLUE_OVER_OFFICIAL: f64 = 2.00;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CurrencyCode {
    Ars,
    Usd,
    UsdOfficial,
    UsdCcl,
    UsdBlue,
    Other(String),
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CurrencyCode::Ars => "ARS",
                CurrencyCode::Usd => "USD",
                CurrencyCode::UsdOfficial => "USD_OFICIAL",
                CurrencyCode::UsdCcl => "USD_CCL",
                CurrencyCode::UsdBlue => "USD_BLUE",
                CurrencyCode::Other(code) => code,
            }
        )
    }
}

impl FromStr for CurrencyCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ARS" => CurrencyCode::Ars,
            "USD" => CurrencyCode::Usd,
            "USD_OFICIAL" => CurrencyCode::UsdOfficial,
            "USD_CCL" => CurrencyCode::UsdCcl,
            "USD_BLUE" => CurrencyCode::UsdBlue,
            other => CurrencyCode::Other(other.to_string()),
        })
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        match code.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(CurrencyCode::from)
    }
}

/// ARS-per-USD quotes under the three Argentine market mechanisms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSet {
    #[serde(rename = "ARS")]
    pub ars: f64,
    #[serde(rename = "USD_OFICIAL")]
    pub usd_official: f64,
    #[serde(rename = "USD_CCL")]
    pub usd_ccl: f64,
    #[serde(rename = "USD_BLUE")]
    pub usd_blue: f64,
    #[serde(rename = "lastUpdated", serialize_with = "serialize_millis")]
    pub retrieved_at: DateTime<Utc>,
}

fn serialize_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl ExchangeRateSet {
    /// Fixed rates served whenever the live lookup fails.
    pub fn fallback(retrieved_at: DateTime<Utc>) -> Self {
        ExchangeRateSet {
            ars: 1.0,
            usd_official: FALLBACK_USD_OFFICIAL,
            usd_ccl: FALLBACK_USD_CCL,
            usd_blue: FALLBACK_USD_BLUE,
            retrieved_at,
        }
    }

    /// Builds a set from an official quote, filling CCL and blue from the
    /// fixed premiums when they are not known.
    pub fn from_official(
        usd_official: f64,
        usd_ccl: Option<f64>,
        usd_blue: Option<f64>,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        ExchangeRateSet {
            ars: 1.0,
            usd_official,
            usd_ccl: usd_ccl.unwrap_or(usd_official * CCL_OVER_OFFICIAL),
            usd_blue: usd_blue.unwrap_or(usd_official * BLUE_OVER_OFFICIAL),
            retrieved_at,
        }
    }

    /// ARS per unit of `code`, or `None` for ARS itself and unknown codes.
    pub fn rate_for(&self, code: &CurrencyCode) -> Option<f64> {
        match code {
            CurrencyCode::Usd | CurrencyCode::UsdOfficial => Some(self.usd_official),
            CurrencyCode::UsdCcl => Some(self.usd_ccl),
            CurrencyCode::UsdBlue => Some(self.usd_blue),
            CurrencyCode::Ars | CurrencyCode::Other(_) => None,
        }
    }
}

/// Converts `amount` from one currency to another by way of ARS.
///
/// Unknown codes carry no rate: an unknown `from` is read as ARS and an
/// unknown `to` yields the ARS amount. No rounding is applied.
pub fn convert(
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &ExchangeRateSet,
) -> f64 {
    if from == to {
        return amount;
    }

    let amount_in_ars = match rates.rate_for(from) {
        Some(rate) => amount * rate,
        None => amount,
    };

    match rates.rate_for(to) {
        Some(rate) => amount_in_ars / rate,
        None => amount_in_ars,
    }
}

/// Something that can produce a complete rate set. Implementations absorb
/// their own failures.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> ExchangeRateSet;
}
