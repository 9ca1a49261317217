// Content sources the combined page query is submitted to

pub mod fixture;
pub mod graphql;

pub use fixture::FixtureClient;
pub use graphql::GraphQlClient;

use async_trait::async_trait;
use flow_pages_core::{QueryResponse, Result};

/// Submits a query document and returns the engine's raw response.
///
/// Query-level errors reported by the engine come back inside the
/// [`QueryResponse`]; `Err` is reserved for failing to get a response at all.
#[async_trait]
pub trait ContentQueryClient: Send + Sync {
    async fn execute(&self, document: &str) -> Result<QueryResponse>;
}
