use crate::ContentQueryClient;
use async_trait::async_trait;
use flow_pages_core::{QueryResponse, Result};
use std::path::Path;
use tracing::debug;

/// Answers every query with a recorded response
#[derive(Debug, Clone)]
pub struct FixtureClient {
    response: QueryResponse,
}

impl FixtureClient {
    pub fn new(response: QueryResponse) -> Self {
        Self { response }
    }

    /// Load a recorded `{ "data": ..., "errors": ... }` document
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let response: QueryResponse = serde_json::from_str(&content)?;
        Ok(Self::new(response))
    }
}

#[async_trait]
impl ContentQueryClient for FixtureClient {
    async fn execute(&self, document: &str) -> Result<QueryResponse> {
        debug!(bytes = document.len(), "answering query from fixture");
        Ok(self.response.clone())
    }
}
