//! Web search abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>>;
}
