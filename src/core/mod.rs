//! Core business logic abstractions

pub mod analysis;
pub mod cache;
pub mod clock;
pub mod completion;
pub mod config;
pub mod currency;
pub mod log;
pub mod prompt;
pub mod search;

// Re-export main types for cleaner imports
pub use analysis::{AiAnalysis, PortfolioData};
pub use cache::RateCache;
pub use clock::{Clock, SystemClock};
pub use completion::CompletionProvider;
pub use currency::{CurrencyCode, ExchangeRateSet, RateSource, convert};
pub use search::SearchProvider;
