use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::core::completion::{CompletionProvider, CompletionRequest};
use crate::core::search::{SearchProvider, SearchResult};

/// Stands in for a provider that has no configuration. Every call fails,
/// which sends callers down their fallback path.
#[derive(Debug, Clone, Copy)]
pub struct DisabledProvider {
    name: &'static str,
}

impl DisabledProvider {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl SearchProvider for DisabledProvider {
    async fn search(&self, _query: &str, _num: usize) -> Result<Vec<SearchResult>> {
        bail!("{} provider is not configured", self.name)
    }
}

#[async_trait]
impl CompletionProvider for DisabledProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        bail!("{} provider is not configured", self.name)
    }
}
